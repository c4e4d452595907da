//! Estimate the relative intensity scale of two spectra over a shared region.
use std::ops::Range;

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::trapz;
use crate::error::{Result, SignalError};
use crate::search::ppm_to_index;
use crate::spectrum::Spectrum;

/// How the intensities inside the shared region are reduced to one number
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregate {
    /// The total intensity
    #[default]
    Sum,
    /// The most intense point, for comparing peak heights
    Max,
    /// The trapezoid-rule area under the curve, for unevenly spaced axes
    Area,
}

impl Aggregate {
    pub fn reduce(&self, ppm: &[f64], intensity: &[f64]) -> f64 {
        match self {
            Self::Sum => intensity.iter().sum(),
            Self::Max => intensity
                .iter()
                .copied()
                .filter(|y| !y.is_nan())
                .reduce(f64::max)
                .unwrap_or(f64::NAN),
            Self::Area => trapz(ppm, intensity),
        }
    }
}

/// The inclusive index range between the points nearest `ppm_low` and `ppm_high`
fn shared_region(spectrum: &Spectrum<'_>, ppm_low: f64, ppm_high: f64) -> Result<Range<usize>> {
    let (low, high) = if ppm_low <= ppm_high {
        (ppm_low, ppm_high)
    } else {
        (ppm_high, ppm_low)
    };
    let (start, end) = spectrum
        .ppm_extent()
        .ok_or(SignalError::DegenerateInput("the spectrum is empty"))?;
    if high < start || low > end {
        return Err(SignalError::OutOfRange {
            low,
            high,
            start,
            end,
        });
    }
    let a = ppm_to_index(spectrum, low)?;
    let b = ppm_to_index(spectrum, high)?;
    Ok(a.min(b)..a.max(b) + 1)
}

/// The factor which, multiplied into `reference`, reproduces the intensity
/// scale of `sample` between `ppm_low` and `ppm_high`, comparing the aggregate
/// chosen by `aggregate`.
///
/// Each spectrum is restricted to its own points nearest the two bounds, so
/// the two need not share an axis.
///
/// # Errors
/// - [`SignalError::OutOfRange`] if the region misses either spectrum.
/// - [`SignalError::DegenerateInput`] if the reference aggregate is zero or not finite.
pub fn get_scaling_factor_with(
    reference: &Spectrum<'_>,
    sample: &Spectrum<'_>,
    ppm_low: f64,
    ppm_high: f64,
    aggregate: Aggregate,
) -> Result<f64> {
    let reference_view = reference.slice(shared_region(reference, ppm_low, ppm_high)?);
    let sample_view = sample.slice(shared_region(sample, ppm_low, ppm_high)?);

    let reference_value = aggregate.reduce(reference_view.ppm(), reference_view.intensity());
    let sample_value = aggregate.reduce(sample_view.ppm(), sample_view.intensity());
    debug!(
        "{aggregate:?} between {ppm_low} and {ppm_high}: reference {reference_value}, sample {sample_value}"
    );

    if reference_value == 0.0 || !reference_value.is_finite() {
        return Err(SignalError::DegenerateInput(
            "the reference intensity aggregate is zero",
        ));
    }
    Ok(sample_value / reference_value)
}

/// The ratio of the summed intensity of `sample` to that of `reference`
/// between `ppm_low` and `ppm_high`.
///
/// See [`get_scaling_factor_with`].
pub fn get_scaling_factor(
    reference: &Spectrum<'_>,
    sample: &Spectrum<'_>,
    ppm_low: f64,
    ppm_high: f64,
) -> Result<f64> {
    get_scaling_factor_with(reference, sample, ppm_low, ppm_high, Aggregate::Sum)
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    fn sine_spectrum() -> Spectrum<'static> {
        let ppm: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let intensity: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        Spectrum::try_from((ppm, intensity)).unwrap()
    }

    #[rstest]
    #[case(Aggregate::Sum)]
    #[case(Aggregate::Max)]
    #[case(Aggregate::Area)]
    fn test_get_scaling_factor(#[case] aggregate: Aggregate) {
        let reference = sine_spectrum();
        let sample = reference.scaled(1.5);
        let factor = get_scaling_factor_with(&reference, &sample, 0.0, 9.9, aggregate).unwrap();
        assert!((factor - 1.5).abs() < 1e-6, "{factor}");
    }

    #[test]
    fn test_independent_axes() {
        let reference = sine_spectrum();
        let rows: Vec<_> = reference.scaled(0.25).iter().rev().collect();
        let sample = Spectrum::from_pairs(rows).unwrap();
        let factor = get_scaling_factor(&reference, &sample, 9.9, 0.0).unwrap();
        assert!((factor - 0.25).abs() < 1e-6, "{factor}");
    }

    #[test]
    fn test_zero_reference() {
        let reference = sine_spectrum().scaled(0.0);
        let sample = sine_spectrum();
        assert!(matches!(
            get_scaling_factor(&reference, &sample, 0.0, 9.9),
            Err(SignalError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_region_outside() {
        let reference = sine_spectrum();
        assert!(matches!(
            get_scaling_factor(&reference, &reference, 20.0, 30.0),
            Err(SignalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_partial_region() {
        let ppm = [0.0, 1.0, 2.0, 3.0, 4.0];
        let reference = Spectrum::wrap(&ppm, &[1.0, 1.0, 2.0, 2.0, 1.0]).unwrap();
        let sample = Spectrum::wrap(&ppm, &[9.0, 9.0, 4.0, 6.0, 9.0]).unwrap();
        let factor = get_scaling_factor(&reference, &sample, 1.9, 3.1).unwrap();
        assert!((factor - 2.5).abs() < 1e-12);
    }
}
