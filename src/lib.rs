//! `nmrmatch` is a library for locating known multiplet patterns in 1D NMR
//! spectra by template matching, and for the chemical shift referencing and
//! intensity scaling steps that usually surround that search.
//!
//! A reference ("query") spectrum supplies each multiplet as the points inside
//! a ppm window. [`do_1d_std_search`] slides every multiplet across a padded
//! region of the target spectrum, scoring each offset with a normalized
//! cross-correlation ([`norm_xcorr`]), and reports the best aligned positions
//! as a [`MatchResult`] per multiplet.
//!
//! Before searching, [`adjust_to_ref_peak`] can remove a uniform chemical shift
//! drift by moving a reference peak back onto its expected position, and
//! [`get_scaling_factor`] estimates the relative intensity scale of two spectra
//! over a shared region.
//!
//! Spectra are plain index-aligned `ppm` and `intensity` columns, see
//! [`Spectrum`]. The ppm axis may run in either direction.
//!
//! # Usage
//! ```
//! use std::collections::HashMap;
//! use nmrmatch::{adjust_to_ref_peak, do_1d_std_search, Spectrum};
//!
//! // High ppm first, a reference peak at 0.1 ppm and a multiplet around 1.0 ppm
//! let ppm: Vec<f64> = (0..40).rev().map(|i| -1.0 + i as f64 * 0.1).collect();
//! let mut intensity = vec![1.0; 40];
//! intensity[28] = 20.0;
//! intensity[18] = 3.0;
//! intensity[19] = 6.0;
//! intensity[20] = 2.0;
//! let query = Spectrum::try_from((ppm, intensity)).unwrap();
//!
//! // A drifted copy of the same sample
//! let target = query.with_ppm_offset(0.3);
//! let target = adjust_to_ref_peak(&target, [-0.5, 0.5], [0.0, 0.0]).unwrap();
//!
//! let results = do_1d_std_search(&query, &target, &[[0.65, 1.35]], &HashMap::new(), 0.2, false);
//! let found = results.get("multiplet_0").unwrap().as_ref().unwrap();
//! assert!(found.best_rho().unwrap() > 0.999);
//! ```
//!
//! # Features
//! - `parallelism` (default): search the multiplets of a batch on the `rayon` thread pool.
//! - `serde`: `Serialize`/`Deserialize` for spectra, configurations and results.
pub mod align;
pub mod arrayops;
pub mod correlation;
pub mod error;
pub mod multiplet;
pub mod prelude;
pub mod scaling;
pub mod search;
pub mod spectrum;

pub use crate::align::{
    adjust_to_ref_peak, adjust_to_ref_peak_with_anchor, find_reference_peak, AlignConfig,
    ReferencePeak,
};
pub use crate::correlation::{norm_xcorr, norm_xcorr_or_nan};
pub use crate::error::{Result, SignalError};
pub use crate::multiplet::{
    do_1d_std_search, search_all, search_multiplet, search_multiplet_with, search_template,
    MatchResult, MultipletWindow, SearchConfig, SearchConfigBuilder, SearchResults,
};
pub use crate::scaling::{get_scaling_factor, get_scaling_factor_with, Aggregate};
pub use crate::search::{multiplet_match_trimming, ppm_to_index};
pub use crate::spectrum::{AxisOrder, Spectrum};
