//! Distance-indexed shot table.

use serde::{Deserialize, Serialize};

/// One measured shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimPoint {
    pub distance_m: f64,
    pub pivot_deg: f64,
    pub flywheel_rpm: f64,
}

impl AimPoint {
    pub const fn new(distance_m: f64, pivot_deg: f64, flywheel_rpm: f64) -> Self {
        Self {
            distance_m,
            pivot_deg,
            flywheel_rpm,
        }
    }
}

/// Shot parameters by distance to the speaker, linearly interpolated and
/// clamped to the measured range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimTable {
    points: Vec<AimPoint>,
}

impl Default for AimTable {
    fn default() -> Self {
        Self::new(vec![
            AimPoint::new(1.3, 52.0, 2500.0),
            AimPoint::new(2.0, 42.0, 2800.0),
            AimPoint::new(2.5, 36.0, 3000.0),
            AimPoint::new(3.0, 32.0, 3300.0),
            AimPoint::new(3.5, 28.0, 3600.0),
            AimPoint::new(4.0, 26.0, 3800.0),
        ])
    }
}

impl AimTable {
    /// Build from points in any order
    pub fn new(mut points: Vec<AimPoint>) -> Self {
        points.retain(|p| p.distance_m.is_finite());
        points.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Self { points }
    }

    pub fn points(&self) -> &[AimPoint] {
        &self.points
    }

    fn interpolate(&self, distance_m: f64, value: impl Fn(&AimPoint) -> f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if distance_m.is_nan() || distance_m <= first.distance_m {
            return value(first);
        }
        if distance_m >= last.distance_m {
            return value(last);
        }
        let upper = self.points.partition_point(|p| p.distance_m < distance_m);
        let (lo, hi) = (&self.points[upper - 1], &self.points[upper]);
        let t = (distance_m - lo.distance_m) / (hi.distance_m - lo.distance_m);
        value(lo) + t * (value(hi) - value(lo))
    }

    pub fn interpolate_pivot_angle(&self, distance_m: f64) -> f64 {
        self.interpolate(distance_m, |p| p.pivot_deg)
    }

    pub fn interpolate_flywheel_rpm(&self, distance_m: f64) -> f64 {
        self.interpolate(distance_m, |p| p.flywheel_rpm)
    }
}
