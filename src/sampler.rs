use itertools::Itertools;
use thiserror::Error;

use crate::geometry::Point;
use crate::path::ParametricCurve;

/// Density of the arc-length lookup table built before resampling.
const TABLE_STEPS_PER_SEGMENT: usize = 256;
const LENGTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve definition has no segments")]
    Empty,
    #[error("curve has zero length")]
    Degenerate,
    #[error("resolution must be at least 1")]
    ZeroResolution,
    #[error("curve produced a non-finite coordinate")]
    NonFinite,
}

/// Immutable track samples taken at equal arc-length steps.
///
/// Holds `resolution + 1` points: index 0 is the start of the curve and
/// index `resolution` is its end.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    points: Vec<Point>,
    arc_length: f64,
}

impl Curve {
    /// Walk `definition` in `resolution` equal arc-length steps.
    pub fn sample(
        definition: &impl ParametricCurve,
        resolution: usize,
    ) -> Result<Self, CurveError> {
        if resolution == 0 {
            return Err(CurveError::ZeroResolution);
        }
        let segments = definition.segment_count();
        if segments == 0 {
            return Err(CurveError::Empty);
        }

        let steps = segments * TABLE_STEPS_PER_SEGMENT;
        let params: Vec<f64> = (0..=steps).map(|i| i as f64 / steps as f64).collect();
        let table: Vec<Point> = params.iter().map(|&t| definition.point_at(t)).collect();
        if table.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFinite);
        }

        let cumulative: Vec<f64> = std::iter::once(0.0)
            .chain(
                table
                    .iter()
                    .tuple_windows()
                    .scan(0.0, |acc, (a, b)| {
                        *acc += a.distance(*b);
                        Some(*acc)
                    }),
            )
            .collect();
        let total = cumulative[steps];
        if total <= LENGTH_EPSILON {
            return Err(CurveError::Degenerate);
        }

        let mut points = Vec::with_capacity(resolution + 1);
        points.push(definition.point_at(0.0));
        for k in 1..resolution {
            let target = total * k as f64 / resolution as f64;
            let j = cumulative.partition_point(|&len| len < target).clamp(1, steps);
            let span = cumulative[j] - cumulative[j - 1];
            let frac = if span > 0.0 {
                (target - cumulative[j - 1]) / span
            } else {
                0.0
            };
            let t = params[j - 1] + frac * (params[j] - params[j - 1]);
            points.push(definition.point_at(t));
        }
        points.push(definition.point_at(1.0));

        log::debug!(
            "sampled curve: {} segments, resolution {}, arc length {:.2}",
            segments,
            resolution,
            total
        );

        Ok(Self {
            points,
            arc_length: total,
        })
    }

    pub fn point_at(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Total number of samples (`resolution + 1`).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of arc-length steps; also the index of the last sample.
    pub fn resolution(&self) -> usize {
        self.points.len() - 1
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn arc_length(&self) -> f64 {
        self.arc_length
    }

    /// Distance between consecutive samples.
    pub fn step_length(&self) -> f64 {
        self.arc_length / self.resolution() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{PathDefinition, DEFAULT_TRACK};
    use assert_matches::assert_matches;

    fn line(data: &str) -> PathDefinition {
        PathDefinition::parse(data).unwrap()
    }

    #[test]
    fn test_sample_count_and_endpoints() {
        let def = line(DEFAULT_TRACK);
        let curve = Curve::sample(&def, 1000).unwrap();
        assert_eq!(curve.len(), 1001);
        assert_eq!(curve.resolution(), 1000);
        assert_eq!(curve.start(), Point::new(175.0, 450.0));
        assert_eq!(curve.end(), Point::new(175.0, 50.0));
        assert_eq!(curve.point_at(0), Some(curve.start()));
        assert_eq!(curve.point_at(1000), Some(curve.end()));
        assert_eq!(curve.point_at(1001), None);
    }

    #[test]
    fn test_straight_line_is_evenly_spaced() {
        let curve = Curve::sample(&line("M 0 0 L 100 0"), 10).unwrap();
        assert!((curve.arc_length() - 100.0).abs() < 1e-9);
        for (i, p) in curve.points().iter().enumerate() {
            assert!((p.x - 10.0 * i as f64).abs() < 1e-6, "sample {i} at {p:?}");
            assert!(p.y.abs() < 1e-12);
        }
    }

    #[test]
    fn test_polyline_spacing_follows_arc_length_not_segments() {
        // short first leg, long second leg; equal parameter steps would
        // crowd samples onto the short leg
        let curve = Curve::sample(&line("M 0 0 L 10 0 L 10 90"), 10).unwrap();
        assert!((curve.arc_length() - 100.0).abs() < 1e-9);
        let expected_step = 10.0;
        for (a, b) in curve.points().iter().tuple_windows() {
            let d = a.distance(*b);
            // the step crossing the corner is a chord, so it is slightly shorter
            assert!(d <= expected_step + 1e-6 && d > 7.0, "step {d}");
        }
        assert!((curve.point_at(1).unwrap().x - 10.0).abs() < 1e-6);
        assert!((curve.point_at(5).unwrap().y - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_track_samples_are_close_and_ordered() {
        let curve = Curve::sample(&line(DEFAULT_TRACK), 1000).unwrap();
        let step = curve.step_length();
        for (a, b) in curve.points().iter().tuple_windows() {
            let d = a.distance(*b);
            assert!(d <= step * 1.01, "consecutive samples {d} apart, step {step}");
            assert!(d > 0.0);
        }
        // far below the containment radius so no excursion can slip between samples
        assert!(step < 2.0);
    }

    #[test]
    fn test_invalid_definitions() {
        assert_matches!(
            Curve::sample(&PathDefinition::default(), 1000),
            Err(CurveError::Empty)
        );
        assert_matches!(
            Curve::sample(&line("M 5 5 L 5 5"), 1000),
            Err(CurveError::Degenerate)
        );
        assert_matches!(
            Curve::sample(&line("M 0 0 L 1 1"), 0),
            Err(CurveError::ZeroResolution)
        );
        assert_matches!(
            Curve::sample(&line("M 0 0 L 1e400 1"), 10),
            Err(CurveError::NonFinite)
        );
    }

    #[test]
    fn test_resolution_one() {
        let curve = Curve::sample(&line("M 0 0 L 3 4"), 1).unwrap();
        assert_eq!(curve.points(), &[Point::new(0.0, 0.0), Point::new(3.0, 4.0)]);
        assert!((curve.step_length() - 5.0).abs() < 1e-9);
    }
}
