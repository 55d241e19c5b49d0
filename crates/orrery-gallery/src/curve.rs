//! 2D Catmull-Rom spline through a fixed point list.
//!
//! Used as a drive path: [`SplineCurve::point_at`] is arc-length
//! parameterized, so a constant parameter speed gives constant travel speed
//! along the curve regardless of how unevenly the control points are spaced.

use glam::Vec2;

const LENGTH_DIVISIONS: usize = 200;

pub struct SplineCurve {
    points: Vec<Vec2>,
    /// Cumulative chord lengths at `LENGTH_DIVISIONS + 1` uniform samples.
    lengths: Vec<f32>,
}

impl SplineCurve {
    /// Spline through `points` in order. Repeat the first point at the end
    /// to close the loop. Needs at least two points.
    pub fn new(points: Vec<Vec2>) -> Self {
        assert!(points.len() >= 2, "spline needs at least two points");
        let mut curve = Self {
            points,
            lengths: Vec::new(),
        };
        curve.lengths = curve.measure();
        curve
    }

    /// Point at uniform parameter `t` in [0, 1] (segment-indexed, not
    /// arc-length).
    pub fn point(&self, t: f32) -> Vec2 {
        let n = self.points.len();
        let p = (n - 1) as f32 * t.clamp(0.0, 1.0);
        let i = (p.floor() as usize).min(n - 2);
        let weight = p - i as f32;

        let p0 = self.points[i.saturating_sub(1)];
        let p1 = self.points[i];
        let p2 = self.points[(i + 1).min(n - 1)];
        let p3 = self.points[(i + 2).min(n - 1)];
        catmull_rom(weight, p0, p1, p2, p3)
    }

    /// Point at arc-length fraction `u` in [0, 1].
    pub fn point_at(&self, u: f32) -> Vec2 {
        self.point(self.to_uniform(u))
    }

    /// `divisions + 1` points sampled at uniform parameters, e.g. for a
    /// polyline rendering of the path.
    pub fn points(&self, divisions: usize) -> Vec<Vec2> {
        (0..=divisions)
            .map(|i| self.point(i as f32 / divisions as f32))
            .collect()
    }

    pub fn length(&self) -> f32 {
        *self.lengths.last().unwrap_or(&0.0)
    }

    fn measure(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(LENGTH_DIVISIONS + 1);
        let mut sum = 0.0;
        let mut last = self.point(0.0);
        lengths.push(0.0);
        for i in 1..=LENGTH_DIVISIONS {
            let current = self.point(i as f32 / LENGTH_DIVISIONS as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Maps an arc-length fraction to the uniform parameter by binary search
    /// in the cumulative length table.
    fn to_uniform(&self, u: f32) -> f32 {
        let target = u.clamp(0.0, 1.0) * self.length();
        let i = self
            .lengths
            .partition_point(|len| *len < target)
            .clamp(1, LENGTH_DIVISIONS);
        let before = self.lengths[i - 1];
        let segment = self.lengths[i] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f32 - 1.0 + fraction) / LENGTH_DIVISIONS as f32
    }
}

/// Uniform Catmull-Rom basis, per component.
fn catmull_rom(t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 - p2) * (2.0 * t3 - 3.0 * t2)
        + p1
        + v0 * (t3 - 2.0 * t2 + t)
        + v1 * (t3 - t2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SplineCurve {
        SplineCurve::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 0.0),
        ])
    }

    #[test]
    fn curve_passes_through_control_points() {
        let curve = square();
        assert!(curve.point(0.0).abs_diff_eq(Vec2::ZERO, 1e-5));
        assert!(curve.point(0.25).abs_diff_eq(Vec2::new(10.0, 0.0), 1e-5));
        assert!(curve.point(1.0).abs_diff_eq(Vec2::ZERO, 1e-5));
    }

    #[test]
    fn arc_length_samples_are_evenly_spaced() {
        let curve = square();
        let step = 1.0 / 64.0;
        let mut last = curve.point_at(0.0);
        let mut distances = Vec::new();
        for i in 1..=64 {
            let p = curve.point_at(i as f32 * step);
            distances.push(p.distance(last));
            last = p;
        }
        let mean: f32 = distances.iter().sum::<f32>() / distances.len() as f32;
        for d in distances {
            assert!((d - mean).abs() < mean * 0.2, "uneven spacing: {d} vs {mean}");
        }
    }

    #[test]
    fn length_is_plausible_for_a_square_loop() {
        let curve = square();
        // Rounded square: longer than nothing, in the ballpark of the
        // 40-unit perimeter.
        assert!(curve.length() > 30.0 && curve.length() < 60.0);
    }
}
