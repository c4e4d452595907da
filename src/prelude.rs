pub use crate::align::{AlignConfig, ReferencePeak};
pub use crate::multiplet::{MatchResult, MultipletWindow, SearchConfig, SearchResults};
pub use crate::scaling::Aggregate;
pub use crate::spectrum::{AxisOrder, Spectrum};
pub use crate::error::SignalError;
