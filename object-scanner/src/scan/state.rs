use std::fmt;

/// Stage of the scanning workflow. Stages are only ever entered in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScanState {
    #[default]
    Ready,
    DefineBoundingBox,
    Scanning,
    AdjustingOrigin,
}

impl ScanState {
    /// The only state this one may advance to.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Ready => Some(Self::DefineBoundingBox),
            Self::DefineBoundingBox => Some(Self::Scanning),
            Self::Scanning => Some(Self::AdjustingOrigin),
            Self::AdjustingOrigin => None,
        }
    }

    pub fn can_advance_to(&self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// Volume gestures are handled in these states; the origin takes over after.
    pub fn manipulates_volume(&self) -> bool {
        matches!(self, Self::DefineBoundingBox | Self::Scanning)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::DefineBoundingBox => "defineBoundingBox",
            Self::Scanning => "scanning",
            Self::AdjustingOrigin => "adjustingOrigin",
        };
        f.write_str(name)
    }
}
