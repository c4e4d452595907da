//! The ways the search, alignment and scaling routines can reject their input.
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Serialize;

/// All the ways an operation over one or two spectra can fail.
///
/// These are deterministic input validation failures, so nothing in this
/// crate retries on them.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SignalError {
    /// A correlation input has no variance, or a scaling denominator is zero
    #[error("Degenerate input: {0}")]
    DegenerateInput(&'static str),
    /// The requested ppm window selects no data points from the spectrum
    #[error("The ppm window {low}..{high} does not overlap the spectrum extent {start}..{end}")]
    OutOfRange {
        low: f64,
        high: f64,
        start: f64,
        end: f64,
    },
    /// Two sequences which must be paired have different lengths
    #[error("Sequence lengths do not match: {left} != {right}")]
    ShapeMismatch { left: usize, right: usize },
    /// The ppm array is neither ascending nor descending
    #[error("The ppm array is not monotonic")]
    NotMonotonic,
}

pub type Result<T> = std::result::Result<T, SignalError>;
