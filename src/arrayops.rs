use num_traits::{Float, FromPrimitive};

pub(crate) fn _isclose<T>(x: T, y: T, rtol: T, atol: T) -> bool
where
    T: Float,
{
    (x - y).abs() <= (atol + rtol * y.abs())
}

/// Compare two values with a relative tolerance of `1e-5` and an absolute
/// tolerance of `1e-8`
pub fn isclose<T>(x: T, y: T) -> bool
where
    T: Float + FromPrimitive,
{
    _isclose(x, y, T::from_f64(1e-5).unwrap(), T::from_f64(1e-8).unwrap())
}

/// The index of the first maximum of `values`, ignoring `NaN`
pub fn argmax<T: Float>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Integrate `y` over `x` with the trapezoid rule.
///
/// The magnitude of each step is used, so the area is the same whichever
/// direction `x` runs in.
pub fn trapz<T: Float>(x: &[T], y: &[T]) -> T {
    let n = x.len().min(y.len());
    if n < 2 {
        return T::zero();
    }
    let half = T::from(0.5).unwrap();
    (0..n - 1).fold(T::zero(), |acc, i| {
        let delta = (x[i + 1] - x[i]).abs();
        acc + delta * half * (y[i + 1] + y[i])
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_isclose() {
        assert!(isclose(1.0, 1.0 + 1e-9));
        assert!(!isclose(1.0, 1.001));
        assert!(isclose(0.0f32, 1e-9));
        assert!(_isclose(1.0, 1.05, 0.1, 0.0));
        assert!(!_isclose(1.0, 1.05, 0.0, 0.01));
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[1.0, 5.0, 3.0, 5.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, -2.0, -1.0]), Some(2));
        assert_eq!(argmax::<f64>(&[]), None);
        assert_eq!(argmax(&[f64::NAN]), None);
    }

    #[test]
    fn test_trapz() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(trapz(&x, &y), 3.0);
        let x_rev = [3.0, 2.0, 1.0, 0.0];
        let ramp = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(trapz(&x_rev, &ramp), 4.5);
        assert_eq!(trapz(&[1.0], &[2.0]), 0.0);
    }
}
