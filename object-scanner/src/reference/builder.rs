use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task, TaskPool, block_on, futures_lite::future};

use crate::error::ScanError;
use crate::manipulation::{BoundingBox, ObjectOrigin};
use crate::tracking::{ReferenceCapture, TrackingError, TrackingFuture, TrackingSession};

type CaptureTask = Task<Result<ReferenceCapture, TrackingError>>;

/// Which capture to keep after a merge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeChoice {
    KeepNew,
    KeepPrevious,
}

/// Both valid captures of a failed merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConflict {
    pub new: ReferenceCapture,
    pub previous: ReferenceCapture,
    pub error: TrackingError,
}

/// Completed background work, returned by [`ReferenceObjectBuilder::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderUpdate {
    /// Incremental build for the point cloud, in the requested volume's frame.
    Incremental(ReferenceCapture),
    IncrementalFailed(TrackingError),
    MergeStarted,
    /// Final capture, merged with the previous scan when one was queued.
    Finalized { capture: ReferenceCapture, merged: bool },
    /// Extraction failed. The capture that was queued for merging is handed
    /// back so a retry can still merge it.
    FinalizeFailed {
        error: TrackingError,
        merge_with: Option<ReferenceCapture>,
    },
    /// Merge failed and a [`MergeChoice`] is needed.
    MergeFailed(TrackingError),
}

struct PendingBuild {
    generation: u64,
    task: CaptureTask,
}

struct PendingFinalize {
    task: CaptureTask,
    origin: Transform,
    name: String,
    merge_with: Option<ReferenceCapture>,
}

struct PendingMerge {
    task: CaptureTask,
    new: ReferenceCapture,
    previous: ReferenceCapture,
}

/// Turns the scanned volume into reference objects through the tracking session.
///
/// Extraction and merging run on the [`AsyncComputeTaskPool`]. Each kind of work
/// has at most one task in flight, and every task is polled from the control
/// thread, so results are only ever applied there. Incremental builds started
/// before [`ReferenceObjectBuilder::invalidate`] are ignored when they complete.
pub struct ReferenceObjectBuilder {
    tracking: Arc<dyn TrackingSession>,
    interval: f64,
    last_build_time: Option<f64>,
    generation: u64,
    build: Option<PendingBuild>,
    finalize: Option<PendingFinalize>,
    merge: Option<PendingMerge>,
    conflict: Option<MergeConflict>,
}

impl ReferenceObjectBuilder {
    pub fn new(tracking: Arc<dyn TrackingSession>, interval: f64) -> Self {
        Self {
            tracking,
            interval,
            last_build_time: None,
            generation: 0,
            build: None,
            finalize: None,
            merge: None,
            conflict: None,
        }
    }

    fn spawn(future: TrackingFuture<Result<ReferenceCapture, TrackingError>>) -> CaptureTask {
        AsyncComputeTaskPool::get_or_init(TaskPool::default).spawn(future)
    }

    /// An incremental build is in flight.
    pub fn is_building(&self) -> bool {
        self.build.is_some()
    }

    /// Final extraction or merge is in flight.
    pub fn is_finalizing(&self) -> bool {
        self.finalize.is_some() || self.merge.is_some()
    }

    /// Failed merge waiting for a [`MergeChoice`].
    pub fn merge_conflict(&self) -> Option<&MergeConflict> {
        self.conflict.as_ref()
    }

    /// Start an incremental build of `volume` when the interval has passed and
    /// nothing is in flight. The first call only starts the interval clock.
    pub fn request_incremental_build(&mut self, now: f64, volume: &BoundingBox) -> bool {
        if self.build.is_some() {
            return false;
        }
        let Some(last) = self.last_build_time else {
            self.last_build_time = Some(now);
            return false;
        };
        if now - last <= self.interval {
            return false;
        }
        self.last_build_time = Some(now);
        let future = self
            .tracking
            .create_reference_object(volume.transform(), volume.extent);
        self.build = Some(PendingBuild {
            generation: self.generation,
            task: Self::spawn(future),
        });
        debug!("Incremental reference object build started at {now:.3}");
        true
    }

    /// Ignore in-flight incremental results and restart the interval clock.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.last_build_time = None;
    }

    /// Extract the final reference object for `volume`, re-expressed in the
    /// origin's frame and named `name`. When `merge_with` is given the result is
    /// merged with it afterwards.
    pub fn finalize(
        &mut self,
        volume: Option<&BoundingBox>,
        origin: Option<&ObjectOrigin>,
        name: &str,
        merge_with: Option<ReferenceCapture>,
    ) -> Result<(), ScanError> {
        let (Some(volume), Some(origin)) = (volume, origin) else {
            return Err(ScanError::MissingVolumeOrOrigin);
        };
        if self.is_finalizing() {
            return Err(ScanError::FinalizeInProgress);
        }
        if self.conflict.is_some() {
            return Err(ScanError::MergeConflictPending);
        }
        let future = self
            .tracking
            .create_reference_object(volume.transform(), volume.extent);
        self.finalize = Some(PendingFinalize {
            task: Self::spawn(future),
            origin: origin.local_transform(),
            name: name.to_string(),
            merge_with,
        });
        info!("Creating reference object '{name}'");
        Ok(())
    }

    /// Collect finished background work.
    pub fn poll(&mut self) -> Vec<BuilderUpdate> {
        let mut updates = Vec::new();

        if let Some(pending) = self.build.as_mut() {
            if let Some(result) = block_on(future::poll_once(&mut pending.task)) {
                let current = pending.generation == self.generation;
                self.build = None;
                match result {
                    Ok(capture) if current => updates.push(BuilderUpdate::Incremental(capture)),
                    Ok(_) => debug!("Dropped superseded incremental build"),
                    Err(err) if current => {
                        warn!("Incremental reference object build failed: {err}");
                        updates.push(BuilderUpdate::IncrementalFailed(err));
                    }
                    Err(_) => {}
                }
            }
        }

        if let Some(pending) = self.finalize.as_mut() {
            if let Some(result) = block_on(future::poll_once(&mut pending.task)) {
                if let Some(pending) = self.finalize.take() {
                    updates.push(self.finish_extraction(pending, result));
                }
            }
        }

        if let Some(pending) = self.merge.as_mut() {
            if let Some(result) = block_on(future::poll_once(&mut pending.task)) {
                if let Some(pending) = self.merge.take() {
                    updates.push(self.finish_merge(pending, result));
                }
            }
        }

        updates
    }

    fn finish_extraction(
        &mut self,
        pending: PendingFinalize,
        result: Result<ReferenceCapture, TrackingError>,
    ) -> BuilderUpdate {
        let capture = match result {
            Ok(capture) => capture.applying_transform(pending.origin).with_name(pending.name),
            Err(err) => {
                error!("Failed to create reference object: {err}");
                return BuilderUpdate::FinalizeFailed {
                    error: err,
                    merge_with: pending.merge_with,
                };
            }
        };
        let Some(previous) = pending.merge_with else {
            info!("Reference object '{}' created", capture.name.as_deref().unwrap_or_default());
            return BuilderUpdate::Finalized {
                capture,
                merged: false,
            };
        };
        info!("Merging previous scan into this scan");
        let future = self
            .tracking
            .merge_reference_objects(capture.clone(), previous.clone());
        self.merge = Some(PendingMerge {
            task: Self::spawn(future),
            new: capture,
            previous,
        });
        BuilderUpdate::MergeStarted
    }

    fn finish_merge(
        &mut self,
        pending: PendingMerge,
        result: Result<ReferenceCapture, TrackingError>,
    ) -> BuilderUpdate {
        match result {
            Ok(merged) => {
                info!("The previous scan has been merged into this scan");
                let merged = match pending.new.name {
                    Some(name) if merged.name.is_none() => merged.with_name(name),
                    _ => merged,
                };
                BuilderUpdate::Finalized {
                    capture: merged,
                    merged: true,
                }
            }
            Err(err) => {
                error!("Failed to merge scans: {err}");
                self.conflict = Some(MergeConflict {
                    new: pending.new,
                    previous: pending.previous,
                    error: err.clone(),
                });
                BuilderUpdate::MergeFailed(err)
            }
        }
    }

    /// Settle a failed merge with one of the two unmerged captures.
    pub fn resolve_merge(&mut self, choice: MergeChoice) -> Result<ReferenceCapture, ScanError> {
        let conflict = self.conflict.take().ok_or(ScanError::NoMergeConflict)?;
        info!("Merge conflict resolved with {choice:?}");
        Ok(match choice {
            MergeChoice::KeepNew => conflict.new,
            MergeChoice::KeepPrevious => conflict.previous,
        })
    }
}
