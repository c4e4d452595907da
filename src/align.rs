//! Reference a spectrum's chemical shift axis against a known peak.
//!
//! A reference compound (e.g. TSP or DSS at 0 ppm) drifts slightly between
//! acquisitions. The strongest point inside a search window is taken as the
//! observed reference peak, and the whole ppm axis is shifted so that peak
//! lands on its expected position.
use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::argmax;
use crate::error::{Result, SignalError};
use crate::search::find_between;
use crate::spectrum::Spectrum;

/// The observed reference peak and its offset from where it was expected
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferencePeak {
    /// The index of the peak apex in the spectrum
    pub index: usize,
    pub ppm: f64,
    pub intensity: f64,
    /// The ppm the peak was expected at
    pub anchor: f64,
    /// `ppm - anchor`
    pub shift: f64,
}

/// Where to look for the reference peak and how much drift to tolerate
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignConfig {
    /// The ppm bounds searched for the reference peak, inclusive and in either order
    pub search_window: [f64; 2],
    /// A shift lying within these bounds (inclusive, either order) is left uncorrected
    pub tolerance_window: [f64; 2],
    /// The expected peak position. Defaults to the center of `search_window`.
    pub anchor: Option<f64>,
}

impl AlignConfig {
    pub fn new(search_window: [f64; 2], tolerance_window: [f64; 2]) -> Self {
        Self {
            search_window,
            tolerance_window,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: f64) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// The expected reference position
    pub fn anchor_ppm(&self) -> f64 {
        self.anchor
            .unwrap_or((self.search_window[0] + self.search_window[1]) / 2.0)
    }

    fn tolerates(&self, shift: f64) -> bool {
        let [a, b] = self.tolerance_window;
        a.min(b) <= shift && shift <= a.max(b)
    }

    /// Locate the reference peak of `spectrum` according to this configuration
    pub fn find_peak(&self, spectrum: &Spectrum<'_>) -> Result<ReferencePeak> {
        find_reference_peak(spectrum, self.search_window, self.anchor_ppm())
    }

    /// Shift the ppm axis of `spectrum` so its reference peak sits on the anchor,
    /// unless the observed shift is within the tolerance window.
    ///
    /// The returned spectrum has the same rows, in the same order, with the same
    /// intensities. Only the ppm column changes, by a single additive offset.
    pub fn align(&self, spectrum: &Spectrum<'_>) -> Result<Spectrum<'static>> {
        let peak = self.find_peak(spectrum)?;
        if self.tolerates(peak.shift) {
            debug!(
                "Reference peak at {:0.4} ppm is within tolerance of {:0.4}, leaving axis unchanged",
                peak.ppm, peak.anchor
            );
            return Ok(spectrum.clone().into_owned());
        }
        info!(
            "Shifting ppm axis by {:0.5} to move reference peak at {:0.4} onto {:0.4}",
            -peak.shift, peak.ppm, peak.anchor
        );
        Ok(spectrum.with_ppm_offset(-peak.shift))
    }
}

/// Find the most intense point of `spectrum` inside `search_window` and measure
/// its offset from `anchor`.
///
/// Ties resolve to the first maximum in array order.
///
/// # Errors
/// - [`SignalError::OutOfRange`] if the window contains no points.
/// - [`SignalError::DegenerateInput`] if every intensity in the window is `NaN`.
pub fn find_reference_peak(
    spectrum: &Spectrum<'_>,
    search_window: [f64; 2],
    anchor: f64,
) -> Result<ReferencePeak> {
    let span = find_between(spectrum.ppm(), search_window[0], search_window[1])?;
    let offset = argmax(&spectrum.intensity()[span.clone()]).ok_or(
        SignalError::DegenerateInput("no finite intensity inside the reference window"),
    )?;
    let index = span.start + offset;
    let (ppm, intensity) = spectrum
        .get(index)
        .ok_or(SignalError::DegenerateInput("the spectrum is empty"))?;
    Ok(ReferencePeak {
        index,
        ppm,
        intensity,
        anchor,
        shift: ppm - anchor,
    })
}

/// Re-reference `spectrum` so the strongest peak in `search_window` sits at the
/// center of that window, unless its shift lies within `tolerance_window`.
///
/// See [`AlignConfig::align`].
pub fn adjust_to_ref_peak(
    spectrum: &Spectrum<'_>,
    search_window: [f64; 2],
    tolerance_window: [f64; 2],
) -> Result<Spectrum<'static>> {
    AlignConfig::new(search_window, tolerance_window).align(spectrum)
}

/// As [`adjust_to_ref_peak`], with an explicit expected peak position
pub fn adjust_to_ref_peak_with_anchor(
    spectrum: &Spectrum<'_>,
    search_window: [f64; 2],
    tolerance_window: [f64; 2],
    anchor: f64,
) -> Result<Spectrum<'static>> {
    AlignConfig::new(search_window, tolerance_window)
        .with_anchor(anchor)
        .align(spectrum)
}
