//! Physical constants shared across the probe kernels.
//!
//! Values are bundled into an explicit [`PhysicalConstants`] value that is
//! passed into every component, so tests can substitute a different ion
//! species without touching process-wide state.

use serde::{Deserialize, Serialize};

/// Elementary charge in coulombs.
pub const ELEMENTARY_CHARGE: f64 = 1.602e-19;
/// Boltzmann constant in joules per kelvin.
pub const BOLTZMANN: f64 = 1.38e-23;
/// Electron mass in kilograms.
pub const ELECTRON_MASS: f64 = 9.11e-31;
/// Proton mass in kilograms, the default ion species.
pub const PROTON_MASS: f64 = 1.67e-27;
/// Conversion factor from electron-volts to kelvin.
pub const EV_TO_KELVIN: f64 = 11_600.0;
/// Positivity floor applied to electron temperature in kelvin before it
/// enters a square root.
pub const TEMPERATURE_KELVIN_FLOOR: f64 = 1.0e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    pub elementary_charge: f64,
    pub boltzmann: f64,
    pub electron_mass: f64,
    pub ion_mass: f64,
}

impl PhysicalConstants {
    /// Electron temperature in kelvin, floored to stay strictly positive.
    pub fn temperature_kelvin(&self, te_ev: f64) -> f64 {
        (te_ev * EV_TO_KELVIN).max(TEMPERATURE_KELVIN_FLOOR)
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            elementary_charge: ELEMENTARY_CHARGE,
            boltzmann: BOLTZMANN,
            electron_mass: ELECTRON_MASS,
            ion_mass: PROTON_MASS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BOLTZMANN, ELECTRON_MASS, ELEMENTARY_CHARGE, EV_TO_KELVIN, PROTON_MASS, PhysicalConstants,
        TEMPERATURE_KELVIN_FLOOR,
    };

    #[test]
    fn constants_remain_finite_and_positive() {
        for value in [
            ELEMENTARY_CHARGE,
            BOLTZMANN,
            ELECTRON_MASS,
            PROTON_MASS,
            EV_TO_KELVIN,
            TEMPERATURE_KELVIN_FLOOR,
        ] {
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
    }

    #[test]
    fn default_constants_match_reference_values() {
        let constants = PhysicalConstants::default();
        assert_eq!(constants.elementary_charge, 1.602e-19);
        assert_eq!(constants.boltzmann, 1.38e-23);
        assert_eq!(constants.electron_mass, 9.11e-31);
        assert_eq!(constants.ion_mass, 1.67e-27);
    }

    #[test]
    fn temperature_conversion_applies_positivity_floor() {
        let constants = PhysicalConstants::default();
        assert_eq!(constants.temperature_kelvin(1.0), 11_600.0);
        assert_eq!(constants.temperature_kelvin(0.0), TEMPERATURE_KELVIN_FLOOR);
        assert_eq!(constants.temperature_kelvin(-2.0), TEMPERATURE_KELVIN_FLOOR);
    }
}
