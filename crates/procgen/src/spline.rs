//! Spline sampling for terrain profiles and closed outlines.
//!
//! Open curves use a natural cubic spline through the control points (Y as
//! a function of X, zero curvature at both ends). Closed curves use
//! Catmull-Rom over wrap-around neighbour windows.

use glam::Vec2;

/// Default spacing between samples on terrain curves, in world units.
pub const TERRAIN_SAMPLE_SPACING: f32 = 0.25;
/// Default parameter step for closed outlines.
pub const OUTLINE_SAMPLE_SPACING: f32 = 0.1;

/// Number of uniform steps for a span of `length`. Every span gets at
/// least two samples.
fn span_steps(length: f32, spacing: f32) -> usize {
    if spacing > 0.0 {
        ((length / spacing).ceil() as usize).max(2)
    } else {
        2
    }
}

/// Upper bound on `interpolate` output size for a domain of
/// `domain_length` split into `spans` spans.
pub fn max_sample_count(domain_length: f32, spacing: f32, spans: usize) -> usize {
    let per_length = if spacing > 0.0 {
        (domain_length / spacing).ceil() as usize
    } else {
        0
    };
    per_length + 2 * spans + 1
}

/// Densely sample an open curve through `points` (strictly increasing X).
///
/// Fewer than 2 points are returned unchanged; 2 points are joined by a
/// straight line. The output starts with the first control point, ends
/// with the last, contains every control point exactly, and has no
/// repeated points.
pub fn interpolate(points: &[Vec2], spacing: f32) -> Vec<Vec2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    if !points.windows(2).all(|w| w[1].x > w[0].x) {
        log::warn!("spline control points are not strictly increasing in x; leaving unsampled");
        return points.to_vec();
    }

    if points.len() == 2 {
        let (a, b) = (points[0], points[1]);
        return sample_spans(points, spacing, |_, x| {
            let t = (x - a.x) / (b.x - a.x);
            a.y + t * (b.y - a.y)
        });
    }

    let m = natural_second_derivatives(points);
    sample_spans(points, spacing, |i, x| {
        let (p0, p1) = (points[i], points[i + 1]);
        let h = p1.x - p0.x;
        let a = (p1.x - x) / h;
        let b = (x - p0.x) / h;
        a * p0.y + b * p1.y + ((a * a * a - a) * m[i] + (b * b * b - b) * m[i + 1]) * h * h / 6.0
    })
}

/// Walk each span at uniform X steps. `eval(span, x)` gives the height.
fn sample_spans(points: &[Vec2], spacing: f32, eval: impl Fn(usize, f32) -> f32) -> Vec<Vec2> {
    let mut out = Vec::new();
    for (i, span) in points.windows(2).enumerate() {
        let (x0, x1) = (span[0].x, span[1].x);
        let steps = span_steps(x1 - x0, spacing);
        out.push(span[0]);
        for j in 1..steps {
            let x = x0 + (x1 - x0) * j as f32 / steps as f32;
            out.push(Vec2::new(x, eval(i, x)));
        }
    }
    if let Some(&last) = points.last() {
        out.push(last);
    }
    out
}

/// Second derivatives of the natural cubic spline through `points`.
fn natural_second_derivatives(points: &[Vec2]) -> Vec<f32> {
    let n = points.len();
    let h: Vec<f32> = points.windows(2).map(|w| w[1].x - w[0].x).collect();

    let mut lower = vec![0.0; n];
    let mut diag = vec![1.0; n];
    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        lower[i] = h[i - 1];
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        upper[i] = h[i];
        rhs[i] = 6.0
            * ((points[i + 1].y - points[i].y) / h[i] - (points[i].y - points[i - 1].y) / h[i - 1]);
    }

    solve_tridiagonal(&lower, &diag, &upper, &rhs)
}

/// Thomas algorithm. `lower[0]` and `upper[n - 1]` are ignored.
fn solve_tridiagonal(lower: &[f32], diag: &[f32], upper: &[f32], rhs: &[f32]) -> Vec<f32> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let m = diag[i] - lower[i] * c[i - 1];
        c[i] = if i < n - 1 { upper[i] / m } else { 0.0 };
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / m;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}

/// Smooth closed curve through `points` using Catmull-Rom. Each span
/// between consecutive points gets `max(2, 1 / spacing)` samples, the
/// first of which is the control point itself. Fewer than 3 points are
/// returned unchanged.
pub fn interpolate_closed(points: &[Vec2], spacing: f32) -> Vec<Vec2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let samples = if spacing > 0.0 {
        ((1.0 / spacing) as usize).max(2)
    } else {
        2
    };

    let mut out = Vec::with_capacity(n * samples);
    for i in 0..n {
        let p0 = points[(i + n - 1) % n];
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];

        out.push(p1);
        for j in 1..samples {
            let t = j as f32 / samples as f32;
            out.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }
    out
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy_points() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 1.5),
            Vec2::new(3.0, -0.5),
            Vec2::new(6.5, 2.0),
            Vec2::new(8.0, 0.25),
        ]
    }

    #[test]
    fn fewer_than_two_points_unchanged() {
        assert!(interpolate(&[], 0.25).is_empty());
        let one = [Vec2::new(1.0, 2.0)];
        assert_eq!(interpolate(&one, 0.25), one.to_vec());
    }

    #[test]
    fn two_points_are_linear() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(2.0, 1.0)];
        let out = interpolate(&pts, 0.25);
        assert_eq!(out.len(), 9);
        assert_eq!(out[0], pts[0]);
        assert_eq!(*out.last().unwrap(), pts[1]);
        for p in &out {
            assert!((p.y - p.x * 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn passes_through_every_control_point() {
        let pts = wavy_points();
        let out = interpolate(&pts, 0.25);
        let mut index = 0;
        for (i, span) in pts.windows(2).enumerate() {
            assert_eq!(out[index], pts[i], "control point {i} at sample {index}");
            index += span_steps(span[1].x - span[0].x, 0.25);
        }
        assert_eq!(index, out.len() - 1);
        assert_eq!(out[index], *pts.last().unwrap());
    }

    #[test]
    fn samples_strictly_increase_in_x() {
        let out = interpolate(&wavy_points(), 0.25);
        assert!(out.windows(2).all(|w| w[1].x > w[0].x));
    }

    #[test]
    fn short_spans_get_two_samples() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(0.1, 1.0), Vec2::new(0.2, 0.0)];
        let out = interpolate(&pts, 0.25);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn sample_count_is_bounded() {
        let pts = wavy_points();
        for spacing in [0.1, 0.25, 0.7] {
            let out = interpolate(&pts, spacing);
            assert!(out.len() <= max_sample_count(8.0, spacing, pts.len() - 1));
        }
    }

    #[test]
    fn natural_ends_have_zero_curvature() {
        let m = natural_second_derivatives(&wavy_points());
        assert_eq!(m[0], 0.0);
        assert_eq!(*m.last().unwrap(), 0.0);
    }

    #[test]
    fn collinear_points_stay_on_line() {
        let pts: Vec<Vec2> = (0..5).map(|i| Vec2::new(i as f32, i as f32 * -0.3)).collect();
        for p in interpolate(&pts, 0.2) {
            assert!((p.y + p.x * 0.3).abs() < 1e-4);
        }
    }

    #[test]
    fn non_increasing_x_left_unsampled() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        assert_eq!(interpolate(&pts, 0.25), pts.to_vec());
    }

    #[test]
    fn closed_passes_through_points_and_wraps() {
        let square = [
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, -1.0),
        ];
        let out = interpolate_closed(&square, 0.1);
        assert_eq!(out.len(), 40);
        for (i, p) in square.iter().enumerate() {
            assert_eq!(out[i * 10], *p);
        }
        // Symmetric input gives a curve that bulges outward between points.
        let mid = out[5];
        assert!(mid.length() > std::f32::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn closed_needs_three_points() {
        let two = [Vec2::ZERO, Vec2::ONE];
        assert_eq!(interpolate_closed(&two, 0.1), two.to_vec());
    }
}
