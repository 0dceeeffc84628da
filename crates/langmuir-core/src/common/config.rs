//! Policy parameters for the analysis pipeline and the forward model.
//!
//! The voltage thresholds below are hand-tuned defaults inherited from the
//! reference probe setup, not physical constants. They are exposed as plain
//! configuration so boundary sensitivity can be probed in tests.

use crate::numerics::fitting::DEFAULT_MAX_ITERATIONS;
use serde::{Deserialize, Serialize};

/// Closed voltage interval, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageWindow {
    pub lo: f64,
    pub hi: f64,
}

impl VoltageWindow {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, voltage: f64) -> bool {
        voltage >= self.lo && voltage <= self.hi
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Window for the ion-saturation linear fit.
    pub ion_saturation_window: VoltageWindow,
    /// Width of the electron-retardation fit window below Vp.
    pub retardation_span: f64,
    /// Offset above Vp where the electron-saturation fit begins.
    pub saturation_offset: f64,
    /// Mid-transition window for the tanh fit; the leakage tails are fitted
    /// outside of it.
    pub eedf_mid_window: VoltageWindow,
    /// Lower edge of the EEDF analysis window, expressed as volts below Vp.
    pub eedf_analysis_below_vp: f64,
    /// Upper edge of the EEDF analysis window in volts.
    pub eedf_analysis_hi: f64,
    /// Savitzky-Golay window applied to the derivative before peak search.
    pub derivative_filter_window: usize,
    /// Savitzky-Golay polynomial order.
    pub derivative_filter_order: usize,
    /// Moving-average window applied before the tanh fit.
    pub eedf_smoothing_window: usize,
    /// Strictly positive floor applied to current before any logarithm.
    pub log_current_floor: f64,
    /// Empirical magnitude correction applied to the Druyvesteyn formula.
    pub eedf_scale: f64,
    /// Initial guess for the tanh fit: [amplitude, rate, center, offset].
    pub tanh_initial_guess: [f64; 4],
    /// Iteration cap for the nonlinear fitter.
    pub max_fit_iterations: usize,
    /// Relative tolerance beyond which the Simpson and trapezoid results are
    /// flagged as disagreeing.
    pub quadrature_disagreement_tol: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ion_saturation_window: VoltageWindow::new(-20.0, -5.0),
            retardation_span: 5.0,
            saturation_offset: 1.0,
            eedf_mid_window: VoltageWindow::new(-15.0, 15.0),
            eedf_analysis_below_vp: 2.0,
            eedf_analysis_hi: 20.0,
            derivative_filter_window: 21,
            derivative_filter_order: 3,
            eedf_smoothing_window: 5,
            log_current_floor: 1.0e-15,
            eedf_scale: 5.5e19,
            tanh_initial_guess: [1.0, 0.5, 0.0, 0.0],
            max_fit_iterations: DEFAULT_MAX_ITERATIONS,
            quadrature_disagreement_tol: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub v_min: f64,
    pub v_max: f64,
    pub points: usize,
    /// Electron density in m^-3.
    pub electron_density: f64,
    /// Ion density in m^-3.
    pub ion_density: f64,
    /// Ion temperature in eV.
    pub ion_temperature_ev: f64,
    /// Fraction of the theoretical electron saturation retained by the
    /// simulated knee.
    pub height_modifier: f64,
    /// Horizontal spread of the knee-smoothing artifact, in samples per volt
    /// of nominal transition width.
    pub stretch_modifier: f64,
    /// Leakage slope below Vp in A/V.
    pub ion_leakage_slope: f64,
    /// Leakage slope above Vp in A/V.
    pub electron_leakage_slope: f64,
    /// Number of Gaussian-perturbed samples averaged into the noisy variant.
    pub noise_samples: usize,
    /// Peak amplitude of the Gaussian noise in amperes.
    pub noise_amplitude: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            v_min: -20.0,
            v_max: 20.0,
            points: 1000,
            electron_density: 1.0e16,
            ion_density: 1.0e16,
            ion_temperature_ev: 0.03,
            height_modifier: 0.9,
            stretch_modifier: 10.5,
            ion_leakage_slope: 0.5e-5,
            electron_leakage_slope: 0.2e-4,
            noise_samples: 2,
            noise_amplitude: 1.8e-4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisConfig, SimulationConfig, VoltageWindow};

    #[test]
    fn voltage_window_is_inclusive_at_both_ends() {
        let window = VoltageWindow::new(-20.0, -5.0);
        assert!(window.contains(-20.0));
        assert!(window.contains(-5.0));
        assert!(window.contains(-12.5));
        assert!(!window.contains(-20.000001));
        assert!(!window.contains(-4.999999));
    }

    #[test]
    fn default_analysis_config_matches_documented_policy() {
        let config = AnalysisConfig::default();
        assert_eq!(config.ion_saturation_window, VoltageWindow::new(-20.0, -5.0));
        assert_eq!(config.retardation_span, 5.0);
        assert_eq!(config.saturation_offset, 1.0);
        assert_eq!(config.derivative_filter_window, 21);
        assert_eq!(config.derivative_filter_order, 3);
        assert_eq!(config.eedf_smoothing_window, 5);
        assert_eq!(config.log_current_floor, 1.0e-15);
        assert_eq!(config.tanh_initial_guess, [1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn default_simulation_config_spans_the_reference_sweep() {
        let config = SimulationConfig::default();
        assert_eq!(config.v_min, -20.0);
        assert_eq!(config.v_max, 20.0);
        assert_eq!(config.points, 1000);
        assert_eq!(config.noise_samples, 2);
        assert!(config.noise_amplitude > 0.0);
    }

    #[test]
    fn configs_round_trip_through_json() {
        let analysis = AnalysisConfig::default();
        let encoded = serde_json::to_string(&analysis).expect("serialize analysis config");
        let decoded: AnalysisConfig = serde_json::from_str(&encoded).expect("parse analysis config");
        assert_eq!(analysis, decoded);

        let simulation = SimulationConfig::default();
        let encoded = serde_json::to_string(&simulation).expect("serialize simulation config");
        let decoded: SimulationConfig =
            serde_json::from_str(&encoded).expect("parse simulation config");
        assert_eq!(simulation, decoded);
    }
}
