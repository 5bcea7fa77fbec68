//! Error types for the hue tracker

use thiserror::Error;

use crate::geometry::Rect;

/// Result type alias for the tracker library
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while processing a frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("frame has no pixels")]
    EmptyFrame,

    #[error("roi {roi:?} does not overlap the frame")]
    InvalidRoi { roi: Rect },

    #[error("box array length {len} is not a positive multiple of 4")]
    InvalidBoxCount { len: usize },

    #[error("no boxes to track")]
    EmptyBoxes,

    #[error("calibration patch has {found} usable pixels, need {required}")]
    CalibrationInsufficientSamples { found: usize, required: usize },
}

impl TrackError {
    /// True for errors that reject a request before any state is touched.
    pub fn is_validation(&self) -> bool {
        !matches!(self, TrackError::CalibrationInsufficientSamples { .. })
    }
}
