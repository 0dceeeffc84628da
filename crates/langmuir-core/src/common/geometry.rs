//! Cylindrical probe geometry and its derived collection area.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default probe diameter in meters.
pub const DEFAULT_PROBE_DIAMETER: f64 = 2.5e-3;
/// Default probe length in meters.
pub const DEFAULT_PROBE_LENGTH: f64 = 2.75e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeGeometry {
    pub diameter_m: f64,
    pub length_m: f64,
}

impl ProbeGeometry {
    pub fn new(diameter_m: f64, length_m: f64) -> Self {
        Self {
            diameter_m,
            length_m,
        }
    }

    pub fn radius_m(&self) -> f64 {
        self.diameter_m / 2.0
    }

    /// Collection area: lateral cylinder surface plus the end disc.
    pub fn area_m2(&self) -> f64 {
        let radius = self.radius_m();
        2.0 * PI * radius * self.length_m + PI * radius * radius
    }
}

impl Default for ProbeGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_DIAMETER, DEFAULT_PROBE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::ProbeGeometry;
    use std::f64::consts::PI;

    #[test]
    fn area_combines_lateral_surface_and_end_disc() {
        let geometry = ProbeGeometry::new(2.5e-3, 2.75e-4);
        let radius = 1.25e-3;
        let expected = 2.0 * PI * radius * 2.75e-4 + PI * radius * radius;

        assert!((geometry.area_m2() - expected).abs() <= 1.0e-18);
        assert!((geometry.area_m2() - 7.068_583_470_577_034e-6).abs() <= 1.0e-12);
    }

    #[test]
    fn default_geometry_matches_reference_probe() {
        let geometry = ProbeGeometry::default();
        assert_eq!(geometry.diameter_m, 2.5e-3);
        assert_eq!(geometry.length_m, 2.75e-4);
        assert!(geometry.area_m2() > 0.0);
    }
}
