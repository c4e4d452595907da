//! Length-normalized cross-correlation between two equal length signals.
use num_traits::Float;

use crate::error::{Result, SignalError};

#[inline]
fn is_flat<T: Float>(values: &[T]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

#[inline]
fn mean<T: Float>(values: &[T]) -> f64 {
    values.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).sum::<f64>() / values.len() as f64
}

/// The Pearson correlation coefficient between `a` and `b`.
///
/// Each sequence has its own mean subtracted, then the dot product of the
/// centered sequences is divided by the product of their L2 norms. The score
/// is insensitive to the absolute scale and offset of either signal and lies
/// in `[-1, 1]`. Correlating a sequence with itself gives exactly `1.0`.
///
/// # Errors
/// - [`SignalError::ShapeMismatch`] if the lengths differ.
/// - [`SignalError::DegenerateInput`] if either sequence is empty or constant,
///   as its norm would be zero.
pub fn norm_xcorr<T: Float>(a: &[T], b: &[T]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(SignalError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if is_flat(a) || is_flat(b) {
        return Err(SignalError::DegenerateInput(
            "cannot correlate a sequence with zero variance",
        ));
    }

    let mean_a = mean(a);
    let mean_b = mean(b);

    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let x = x.to_f64().unwrap_or(f64::NAN) - mean_a;
        let y = y.to_f64().unwrap_or(f64::NAN) - mean_b;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return Err(SignalError::DegenerateInput(
            "cannot correlate a sequence with zero variance",
        ));
    }
    Ok((dot / denominator).clamp(-1.0, 1.0))
}

/// As [`norm_xcorr`], but report any failure as `NaN`, leaving the caller to
/// decide what an undefined correlation means.
pub fn norm_xcorr_or_nan<T: Float>(a: &[T], b: &[T]) -> f64 {
    norm_xcorr(a, b).unwrap_or(f64::NAN)
}
