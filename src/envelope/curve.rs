//! Segment maths
//!
//! A segment runs from `v0` to `v1`. Its curve shape `c` bends the line
//! between them: 0 is a straight line, positive shapes start slowly and end
//! steep, negative shapes do the opposite. At progress `p` in `0..=1` the
//! value is
//!
//! ```text
//! v0 + (v1 - v0) * (exp(c * p) - 1) / (exp(c) - 1)
//! ```
//!
//! which converges to linear interpolation as `c` approaches 0.

/// Shapes closer to zero than this are treated as straight lines
const LINEAR_SHAPE_TOLERANCE: f64 = 1e-12;

fn is_linear(curve_shape: f64) -> bool {
    curve_shape.abs() < LINEAR_SHAPE_TOLERANCE
}

/// Value at `progress` along a segment
pub fn interpolate(v0: f64, v1: f64, curve_shape: f64, progress: f64) -> f64 {
    if is_linear(curve_shape) {
        return v0 + (v1 - v0) * progress;
    }
    v0 + (v1 - v0) * ((curve_shape * progress).exp_m1() / curve_shape.exp_m1())
}

/// Closed-form integral over a whole segment of the given length
pub fn integrate_segment(v0: f64, v1: f64, curve_shape: f64, length: f64) -> f64 {
    if is_linear(curve_shape) {
        return length * (v0 + v1) / 2.0;
    }
    // Mean of the normalised curve over 0..=1 is 1/c - 1/(exp(c) - 1)
    let mean = 1.0 / curve_shape - 1.0 / curve_shape.exp_m1();
    length * (v0 + (v1 - v0) * mean)
}

/// The part of a segment between progress `qa` and `qb` as a segment of its own
///
/// Returns `(va, vb, shape)`. Evaluating the returned segment reproduces the
/// original curve exactly because the shape scales with the covered share.
pub fn sub_segment(v0: f64, v1: f64, curve_shape: f64, qa: f64, qb: f64) -> (f64, f64, f64) {
    (
        interpolate(v0, v1, curve_shape, qa),
        interpolate(v0, v1, curve_shape, qb),
        curve_shape * (qb - qa),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_linear_interpolation() {
        assert_close(interpolate(0.0, 1.0, 0.0, 0.5), 0.5);
        assert_close(interpolate(2.0, 4.0, 0.0, 0.25), 2.5);
        assert_close(interpolate(3.0, 3.0, 5.0, 0.7), 3.0);
    }

    #[test]
    fn test_curved_interpolation() {
        assert_close(interpolate(0.0, 1.0, 10.0, 0.0), 0.0);
        assert_close(interpolate(0.0, 1.0, 10.0, 1.0), 1.0);
        assert!(interpolate(0.0, 1.0, 10.0, 0.5) < 0.5);
        assert!(interpolate(0.0, 1.0, -10.0, 0.5) > 0.5);
        // Tiny shapes behave like straight lines
        assert!((interpolate(0.0, 1.0, 1e-6, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_linear_segment() {
        assert_close(integrate_segment(0.0, 1.0, 0.0, 10.0), 5.0);
        assert_close(integrate_segment(2.0, 2.0, 0.0, 3.0), 6.0);
    }

    #[test]
    fn test_integrate_curved_segment_matches_riemann_sum() {
        let (v0, v1, shape, length) = (1.0, 3.0, 4.0, 2.0);
        let steps = 100_000;
        let width = length / steps as f64;
        let sum: f64 = (0..steps)
            .map(|step| {
                let progress = (step as f64 + 0.5) / steps as f64;
                interpolate(v0, v1, shape, progress) * width
            })
            .sum();
        assert!((integrate_segment(v0, v1, shape, length) - sum).abs() < 1e-6);
    }

    #[test]
    fn test_sub_segment_reproduces_curve() {
        let (v0, v1, shape) = (0.0, 1.0, 3.0);
        let (qa, qb) = (0.2, 0.7);
        let (va, vb, sub_shape) = sub_segment(v0, v1, shape, qa, qb);
        for step in 0..=10 {
            let local = step as f64 / 10.0;
            let global = qa + local * (qb - qa);
            assert_close(
                interpolate(va, vb, sub_shape, local),
                interpolate(v0, v1, shape, global),
            );
        }
    }
}
