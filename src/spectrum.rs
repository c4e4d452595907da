//! Paired chemical shift and intensity arrays describing a 1D NMR spectrum.
//!
//! A [`Spectrum`] keeps its two columns index-aligned: position `i` of the ppm
//! array describes position `i` of the intensity array. The ppm column must be
//! monotonic but may run in either direction, and every routine in this crate
//! derives the direction from the data rather than assuming one.
use std::borrow::Cow;
use std::iter::FusedIterator;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// The direction the ppm axis runs along the array
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisOrder {
    /// Low ppm first. Constant and single point axes are treated as ascending.
    #[default]
    Ascending,
    /// High ppm first, the customary NMR orientation
    Descending,
}

impl AxisOrder {
    /// Infer the axis direction from its end points
    pub fn of(ppm: &[f64]) -> Self {
        match (ppm.first(), ppm.last()) {
            (Some(first), Some(last)) if last < first => Self::Descending,
            _ => Self::Ascending,
        }
    }

}

/// Check if the values in `it` are monotonically ascending or flat
pub fn is_increasing(it: &[f64]) -> bool {
    it.windows(2).all(|w| w[0] <= w[1])
}

/// Check if the values in `it` are monotonically descending or flat
pub fn is_decreasing(it: &[f64]) -> bool {
    it.windows(2).all(|w| w[0] >= w[1])
}

/// A 1D spectrum as a pair of index-aligned ppm and intensity columns.
///
/// The columns are either borrowed from the caller or owned, so a search over
/// existing buffers never has to copy them.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSpectrum"))]
pub struct Spectrum<'a> {
    ppm: Cow<'a, [f64]>,
    intensity: Cow<'a, [f64]>,
}

impl<'a> Spectrum<'a> {
    /// Pair `ppm` and `intensity`, checking their lengths match and that the
    /// ppm column is monotonic.
    pub fn new(ppm: Cow<'a, [f64]>, intensity: Cow<'a, [f64]>) -> Result<Self> {
        if ppm.len() != intensity.len() {
            return Err(SignalError::ShapeMismatch {
                left: ppm.len(),
                right: intensity.len(),
            });
        }
        if !(is_increasing(&ppm) || is_decreasing(&ppm)) {
            return Err(SignalError::NotMonotonic);
        }
        Ok(Self { ppm, intensity })
    }

    /// Borrow existing arrays without copying them
    pub fn wrap(ppm: &'a [f64], intensity: &'a [f64]) -> Result<Self> {
        Self::new(Cow::Borrowed(ppm), Cow::Borrowed(intensity))
    }

    /// Build an owned spectrum from a sequence of `(ppm, intensity)` rows
    pub fn from_pairs<I: IntoIterator<Item = (f64, f64)>>(rows: I) -> Result<Spectrum<'static>> {
        let (ppm, intensity): (Vec<f64>, Vec<f64>) = rows.into_iter().unzip();
        Spectrum::new(Cow::Owned(ppm), Cow::Owned(intensity))
    }

    pub fn len(&self) -> usize {
        self.ppm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ppm.is_empty()
    }

    pub fn ppm(&self) -> &[f64] {
        &self.ppm
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn order(&self) -> AxisOrder {
        AxisOrder::of(&self.ppm)
    }

    /// The lowest and highest ppm covered, regardless of axis direction
    pub fn ppm_extent(&self) -> Option<(f64, f64)> {
        let first = *self.ppm.first()?;
        let last = *self.ppm.last()?;
        Some((first.min(last), first.max(last)))
    }

    /// The `(ppm, intensity)` row at `index`
    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.ppm.get(index)?, *self.intensity.get(index)?))
    }

    pub fn iter(&self) -> SpectrumIter<'_> {
        SpectrumIter::new(self.ppm.iter().copied().zip(self.intensity.iter().copied()))
    }

    /// A borrowed view over the rows in `range`
    pub fn slice(&self, range: Range<usize>) -> Spectrum<'_> {
        Spectrum {
            ppm: Cow::Borrowed(&self.ppm[range.clone()]),
            intensity: Cow::Borrowed(&self.intensity[range]),
        }
    }

    /// A copy of this spectrum with `delta` added to every ppm value.
    ///
    /// The intensity column and row order are untouched.
    pub fn with_ppm_offset(&self, delta: f64) -> Spectrum<'static> {
        Spectrum {
            ppm: Cow::Owned(self.ppm.iter().map(|p| p + delta).collect()),
            intensity: Cow::Owned(self.intensity.to_vec()),
        }
    }

    /// A copy of this spectrum with every intensity multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Spectrum<'static> {
        Spectrum {
            ppm: Cow::Owned(self.ppm.to_vec()),
            intensity: Cow::Owned(self.intensity.iter().map(|y| y * factor).collect()),
        }
    }

    pub fn into_owned(self) -> Spectrum<'static> {
        Spectrum {
            ppm: Cow::Owned(self.ppm.into_owned()),
            intensity: Cow::Owned(self.intensity.into_owned()),
        }
    }
}

impl TryFrom<(Vec<f64>, Vec<f64>)> for Spectrum<'static> {
    type Error = SignalError;

    fn try_from((ppm, intensity): (Vec<f64>, Vec<f64>)) -> Result<Self> {
        Spectrum::new(Cow::Owned(ppm), Cow::Owned(intensity))
    }
}

/// The unchecked columns of a serialized [`Spectrum`], validated by [`Spectrum::new`]
/// before use
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSpectrum {
    ppm: Vec<f64>,
    intensity: Vec<f64>,
}

#[cfg(feature = "serde")]
impl<'a> TryFrom<RawSpectrum> for Spectrum<'a> {
    type Error = SignalError;

    fn try_from(value: RawSpectrum) -> Result<Self> {
        Spectrum::new(Cow::Owned(value.ppm), Cow::Owned(value.intensity))
    }
}

/// An iterator over the `(ppm, intensity)` rows of a [`Spectrum`]
pub struct SpectrumIter<'a> {
    inner: std::iter::Zip<
        std::iter::Copied<std::slice::Iter<'a, f64>>,
        std::iter::Copied<std::slice::Iter<'a, f64>>,
    >,
}

impl<'a> SpectrumIter<'a> {
    fn new(
        inner: std::iter::Zip<
            std::iter::Copied<std::slice::Iter<'a, f64>>,
            std::iter::Copied<std::slice::Iter<'a, f64>>,
        >,
    ) -> Self {
        Self { inner }
    }
}

impl<'a> Iterator for SpectrumIter<'a> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> DoubleEndedIterator for SpectrumIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a> FusedIterator for SpectrumIter<'a> {}

impl<'a> ExactSizeIterator for SpectrumIter<'a> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}
