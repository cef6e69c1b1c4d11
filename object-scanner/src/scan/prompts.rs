use std::collections::VecDeque;

use super::state::ScanState;

/// Warning that has to be confirmed before a transition is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanPrompt {
    UnreasonableSize { min_extent: f32, max_extent: f32, min_volume: f32 },
    LowQuality { feature_count: usize, required: usize },
    IncompleteCoverage { progress: u32 },
}

impl ScanPrompt {
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnreasonableSize { .. } => "Scanned object too big or small",
            Self::LowQuality { .. } => "Not enough detail",
            Self::IncompleteCoverage { .. } => "Scan not complete",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::UnreasonableSize {
                min_extent,
                max_extent,
                min_volume,
            } => format!(
                "Each side of the bounding box should be between {min_extent} m and {max_extent} m, \
                 and its volume at least {min_volume} m³. Continue anyway?"
            ),
            Self::LowQuality {
                feature_count,
                required,
            } => format!(
                "This scan has not enough detail (it contains {feature_count} features - aim for at least {required}). \
                 It is unlikely that a good reference object can be generated. Continue anyway?"
            ),
            Self::IncompleteCoverage { progress } => format!(
                "The object was not scanned from all sides, scanning progress is {progress}%. \
                 It is likely that it won't be detected from all angles. Continue anyway?"
            ),
        }
    }
}

/// Operator decision on the prompt currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Continue anyway.
    Proceed,
    /// Go back and keep the current state.
    GoBack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptResolution {
    /// Another warning has to be confirmed first.
    Next(ScanPrompt),
    Commit(ScanState),
    Abandon,
}

/// Transition held back until every queued warning is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    target: ScanState,
    prompts: VecDeque<ScanPrompt>,
}

impl PendingTransition {
    pub fn new(target: ScanState, prompts: impl IntoIterator<Item = ScanPrompt>) -> Self {
        Self {
            target,
            prompts: prompts.into_iter().collect(),
        }
    }

    pub fn target(&self) -> ScanState {
        self.target
    }

    pub fn current(&self) -> Option<&ScanPrompt> {
        self.prompts.front()
    }

    pub fn respond(&mut self, choice: PromptChoice) -> PromptResolution {
        if choice == PromptChoice::GoBack {
            self.prompts.clear();
            return PromptResolution::Abandon;
        }
        self.prompts.pop_front();
        match self.prompts.front() {
            Some(next) => PromptResolution::Next(*next),
            None => PromptResolution::Commit(self.target),
        }
    }
}
