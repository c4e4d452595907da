//! Conversion between chemical shift coordinates and array indices.
//!
//! All lookups work on either axis direction. The direction is read from the
//! array itself with [`AxisOrder::of`] rather than assumed.
use std::ops::Range;

use crate::error::{Result, SignalError};
use crate::spectrum::{AxisOrder, Spectrum};

/// The number of leading elements of `vec` which come strictly before
/// `target_val` when walking the axis in `order`.
pub fn binsearch(vec: &[f64], target_val: f64, order: AxisOrder) -> usize {
    match order {
        AxisOrder::Ascending => vec.partition_point(|x| *x < target_val),
        AxisOrder::Descending => vec.partition_point(|x| *x > target_val),
    }
}

/// Find the index of the value in `vec` closest to `target_val`.
///
/// Equidistant neighbors resolve to the earlier index. Returns [`None`]
/// only when `vec` is empty.
pub fn nearest(vec: &[f64], target_val: f64) -> Option<usize> {
    let n = vec.len();
    if n == 0 {
        return None;
    }
    let i = binsearch(vec, target_val, AxisOrder::of(vec));
    if i == 0 {
        return Some(0);
    }
    if i == n {
        return Some(n - 1);
    }
    let before = (vec[i - 1] - target_val).abs();
    let after = (vec[i] - target_val).abs();
    if after < before {
        Some(i)
    } else {
        Some(i - 1)
    }
}

/// The index of the point in `spectrum` whose ppm is closest to `ppm_value`
pub fn ppm_to_index(spectrum: &Spectrum<'_>, ppm_value: f64) -> Result<usize> {
    nearest(spectrum.ppm(), ppm_value).ok_or(SignalError::DegenerateInput("the spectrum is empty"))
}

/// The continuous index position of `target_val` along `vec`, found by linear
/// interpolation between the two neighboring points and clamped to `[0, n - 1]`.
pub fn fractional_index(vec: &[f64], target_val: f64) -> Option<f64> {
    let n = vec.len();
    if n == 0 {
        return None;
    }
    let i = binsearch(vec, target_val, AxisOrder::of(vec));
    if i == 0 {
        return Some(0.0);
    }
    if i == n {
        return Some((n - 1) as f64);
    }
    let (lo, hi) = (vec[i - 1], vec[i]);
    let step = hi - lo;
    if step == 0.0 {
        return Some((i - 1) as f64);
    }
    Some((i - 1) as f64 + (target_val - lo) / step)
}

/// Resolve the ppm window between `low` and `high` into a range of indices of `vec`.
///
/// The bounds may be given in either order. By default the range covers the
/// points lying strictly inside the window. When `floor_window` is set, the
/// fractional index of each bound is rounded down instead and the range runs
/// inclusively between the two rounded positions.
///
/// A window which misses the axis, or which selects no points, is an
/// [`SignalError::OutOfRange`] error. A window which only partially overlaps
/// the axis is clipped to it.
pub fn window_range(vec: &[f64], low: f64, high: f64, floor_window: bool) -> Result<Range<usize>> {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let (first, last) = match (vec.first(), vec.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(SignalError::DegenerateInput("the spectrum is empty")),
    };
    let (start_ppm, end_ppm) = (first.min(last), first.max(last));
    let out_of_range = SignalError::OutOfRange {
        low,
        high,
        start: start_ppm,
        end: end_ppm,
    };
    if high < start_ppm || low > end_ppm {
        return Err(out_of_range);
    }

    let (start, end) = if floor_window {
        let (a, b) = match (fractional_index(vec, low), fractional_index(vec, high)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(out_of_range),
        };
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        (a.floor() as usize, b.floor() as usize + 1)
    } else {
        match AxisOrder::of(vec) {
            AxisOrder::Ascending => (
                vec.partition_point(|x| *x <= low),
                vec.partition_point(|x| *x < high),
            ),
            AxisOrder::Descending => (
                vec.partition_point(|x| *x >= high),
                vec.partition_point(|x| *x > low),
            ),
        }
    };

    if start >= end {
        return Err(out_of_range);
    }
    Ok(start..end)
}

/// The range of indices of `vec` whose values lie within `[low, high]`, bounds included
/// and given in either order.
///
/// Returns [`SignalError::OutOfRange`] if no value falls inside.
pub fn find_between(vec: &[f64], low: f64, high: f64) -> Result<Range<usize>> {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let (start, end) = match AxisOrder::of(vec) {
        AxisOrder::Ascending => (
            vec.partition_point(|x| *x < low),
            vec.partition_point(|x| *x <= high),
        ),
        AxisOrder::Descending => (
            vec.partition_point(|x| *x > high),
            vec.partition_point(|x| *x >= low),
        ),
    };
    if start >= end {
        let (first, last) = match (vec.first(), vec.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (f64::NAN, f64::NAN),
        };
        return Err(SignalError::OutOfRange {
            low,
            high,
            start: first.min(last),
            end: first.max(last),
        });
    }
    Ok(start..end)
}

/// Collapse runs of closely spaced candidate indices onto their first member.
///
/// `indices` is expected in ascending order. Scanning left to right, an index
/// is dropped when it lies closer than `min_separation` to the index just
/// before it in the input, so every run of candidates whose successive gaps are
/// all below `min_separation` is represented by its *earliest* member. This is
/// a greedy single pass, not an optimal clustering: when several candidates in
/// one neighborhood are equally good, the leftmost one always wins.
///
/// The output is an order-preserving subsequence of the input which always
/// contains the first index, and whose neighbors are at least `min_separation`
/// apart. A `min_separation` of zero disables trimming.
pub fn multiplet_match_trimming(indices: &[usize], min_separation: usize) -> Vec<usize> {
    let mut kept = Vec::with_capacity(indices.len());
    let mut previous: Option<usize> = None;
    for &index in indices {
        match previous {
            Some(prev) if index.saturating_sub(prev) < min_separation => {}
            _ => kept.push(index),
        }
        previous = Some(index);
    }
    kept
}
