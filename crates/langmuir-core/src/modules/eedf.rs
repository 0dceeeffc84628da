//! Druyvesteyn EEDF estimation from the second voltage-derivative of a
//! leakage-corrected I-V curve.
//!
//! The leakage correction is an empirical artifact-removal step inherited
//! from the reference analysis, not a physically derived law: 50% of the raw
//! current is removed below the left crossing point and 50% of the
//! fit-minus-leakage difference is blended in from the right crossing point
//! on. The arithmetic is preserved exactly.

use crate::common::{AnalysisConfig, PhysicalConstants, ProbeGeometry};
use crate::domain::{EedfCurve, FitResult, Trace};
use crate::modules::regions::{self, RegionError};
use crate::numerics::fitting::{self, FitError};
use crate::numerics::integration::{QuadratureError, simpson, trapezoid};
use crate::numerics::relative_difference;
use crate::numerics::smoothing::{self, SmoothingError};
use serde::{Deserialize, Serialize};

const DENSITY_RELATIVE_FLOOR: f64 = 1.0e-30;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EedfError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
    #[error("no samples with positive energy above Vp={vp} inside the window [{lo}, {hi}]")]
    NoValidEnergyRange { vp: f64, lo: f64, hi: f64 },
    #[error("numerically unstable {quantity}: {value:.6e} is too close to zero")]
    NumericallyUnstable { quantity: &'static str, value: f64 },
}

/// One value per integration rule; the pair is always reported so a
/// disagreement is visible instead of suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraturePair {
    pub simpson: f64,
    pub trapezoid: f64,
}

impl QuadraturePair {
    pub fn disagreement(&self) -> f64 {
        relative_difference(self.simpson, self.trapezoid, DENSITY_RELATIVE_FLOOR)
    }
}

/// Output of the leakage-correction heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageCorrection {
    pub corrected_current: Vec<f64>,
    pub leakage_model: Vec<f64>,
    pub difference: Vec<f64>,
    pub crossing_left: usize,
    pub crossing_right: usize,
    pub smoothed_tanh_fit: FitResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EedfEstimate {
    pub curve: EedfCurve,
    pub electron_density: QuadraturePair,
    pub temperature_ev: QuadraturePair,
    /// Set when the two integration rules disagree beyond the configured
    /// tolerance; evidence of a poor estimate, not an error.
    pub rules_disagree: bool,
    pub corrected_fit: FitResult,
    pub correction: LeakageCorrection,
}

/// Fits the mid-range tanh model and the two tail leakage trends, then
/// blends them into the raw current.
pub fn leakage_correction(
    trace: &Trace,
    vp: f64,
    config: &AnalysisConfig,
) -> Result<LeakageCorrection, EedfError> {
    let voltage = trace.voltage();
    let current = trace.current();

    let smoothed = smoothing::moving_average(current, config.eedf_smoothing_window)?;
    let mid = regions::select(trace, config.eedf_mid_window.lo, config.eedf_mid_window.hi)?;

    let smoothed_tanh_fit = fitting::fit_tanh(
        mid.slice(voltage),
        mid.slice(&smoothed),
        config.tanh_initial_guess,
        config.max_fit_iterations,
    )?;

    let low_fit = fitting::fit_linear(&voltage[..mid.start()], &smoothed[..mid.start()])?;
    let high_fit = fitting::fit_linear(&voltage[mid.end() + 1..], &smoothed[mid.end() + 1..])?;

    let leakage_model: Vec<f64> = voltage
        .iter()
        .enumerate()
        .map(|(index, v)| {
            if index < mid.start() {
                low_fit.evaluate(*v)
            } else if index > mid.end() {
                high_fit.evaluate(*v)
            } else {
                0.0
            }
        })
        .collect();

    let difference: Vec<f64> = voltage
        .iter()
        .zip(&leakage_model)
        .map(|(v, leakage)| smoothed_tanh_fit.evaluate(*v) - leakage)
        .collect();

    let crossing_left = voltage
        .iter()
        .zip(&difference)
        .position(|(v, diff)| *v >= 0.0 && *diff > 0.0)
        .unwrap_or(0);
    let crossing_right = voltage
        .iter()
        .zip(&difference)
        .position(|(v, diff)| *v > vp && *diff < 0.0)
        .unwrap_or(0);

    let mut corrected_current = current.to_vec();
    for index in 0..crossing_left {
        corrected_current[index] -= 0.5 * current[index];
    }
    for index in crossing_right..corrected_current.len() {
        corrected_current[index] += 0.5 * difference[index];
    }

    Ok(LeakageCorrection {
        corrected_current,
        leakage_model,
        difference,
        crossing_left,
        crossing_right,
        smoothed_tanh_fit,
    })
}

/// Full EEDF pipeline: leakage correction, tanh refit, finite-difference
/// second derivative, Druyvesteyn conversion, and the dual-rule integral
/// cross-check of density and temperature.
pub fn estimate(
    trace: &Trace,
    vp: f64,
    config: &AnalysisConfig,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> Result<EedfEstimate, EedfError> {
    let voltage = trace.voltage();

    let correction = leakage_correction(trace, vp, config)?;
    let mid = regions::select(trace, config.eedf_mid_window.lo, config.eedf_mid_window.hi)?;

    let corrected_fit = fitting::fit_tanh(
        mid.slice(voltage),
        mid.slice(&correction.corrected_current),
        config.tanh_initial_guess,
        config.max_fit_iterations,
    )?;

    let fitted: Vec<f64> = voltage.iter().map(|v| corrected_fit.evaluate(*v)).collect();
    let second_derivative = smoothing::second_gradient(&fitted, voltage)?;

    let window_lo = (vp - config.eedf_analysis_below_vp).max(config.eedf_mid_window.lo);
    let window_hi = config.eedf_analysis_hi.min(config.eedf_mid_window.hi);
    let analysis = regions::select(trace, window_lo, window_hi)?;

    // Druyvesteyn is undefined at or below the plasma potential.
    let scale = config.eedf_scale * 2.0 / (geometry.area_m2() * constants.elementary_charge);
    let mut energy_ev = Vec::with_capacity(analysis.len());
    let mut density = Vec::with_capacity(analysis.len());
    for index in analysis.start()..=analysis.end() {
        let energy = voltage[index] - vp;
        if energy <= 0.0 {
            continue;
        }

        let speed_term =
            (2.0 * constants.electron_mass * energy * constants.elementary_charge).sqrt();
        energy_ev.push(energy);
        density.push((scale * speed_term * second_derivative[index]).abs());
    }

    if energy_ev.is_empty() {
        return Err(EedfError::NoValidEnergyRange {
            vp,
            lo: window_lo,
            hi: window_hi,
        });
    }

    let density_integrand: Vec<f64> = energy_ev
        .iter()
        .zip(&density)
        .map(|(energy, f)| f / energy.sqrt())
        .collect();
    let electron_density = QuadraturePair {
        simpson: simpson(&energy_ev, &density_integrand)?,
        trapezoid: trapezoid(&energy_ev, &density_integrand)?,
    };

    for (label, value) in [
        ("simpson electron density", electron_density.simpson),
        ("trapezoid electron density", electron_density.trapezoid),
    ] {
        if value.abs() <= DENSITY_RELATIVE_FLOOR {
            return Err(EedfError::NumericallyUnstable {
                quantity: label,
                value,
            });
        }
    }

    let temperature_integrand: Vec<f64> = energy_ev
        .iter()
        .zip(&density)
        .map(|(energy, f)| energy.powf(1.5) * f)
        .collect();
    let temperature_ev = QuadraturePair {
        simpson: 2.0 / (3.0 * electron_density.simpson)
            * simpson(&energy_ev, &temperature_integrand)?,
        trapezoid: 2.0 / (3.0 * electron_density.trapezoid)
            * trapezoid(&energy_ev, &temperature_integrand)?,
    };

    let rules_disagree = electron_density.disagreement() > config.quadrature_disagreement_tol
        || temperature_ev.disagreement() > config.quadrature_disagreement_tol;

    Ok(EedfEstimate {
        curve: EedfCurve { energy_ev, density },
        electron_density,
        temperature_ev,
        rules_disagree,
        corrected_fit,
        correction,
    })
}

#[cfg(test)]
mod tests {
    use super::{EedfError, estimate, leakage_correction};
    use crate::common::{AnalysisConfig, PhysicalConstants, ProbeGeometry};
    use crate::domain::Trace;
    use crate::numerics::linear_grid;

    /// Mid-range tanh transition with small linear leakage trends on both
    /// tails, mirroring the shape the correction heuristic expects.
    fn leaky_tanh_trace() -> Trace {
        let voltage = linear_grid(-20.0, 20.0, 1000).expect("grid");
        let current: Vec<f64> = voltage
            .iter()
            .map(|v| {
                let base = 0.9 * (0.4 * (v - 1.2)).tanh() + 0.1;
                let leakage = if *v < -15.0 {
                    2.0e-3 * (v + 15.0)
                } else if *v > 15.0 {
                    4.0e-3 * (v - 15.0)
                } else {
                    0.0
                };
                base + leakage
            })
            .collect();
        Trace::from_rows(voltage, current).expect("trace")
    }

    #[test]
    fn correction_halves_current_below_the_left_crossing() {
        let trace = leaky_tanh_trace();
        let correction =
            leakage_correction(&trace, 1.2, &AnalysisConfig::default()).expect("correction");

        assert!(correction.crossing_left > 0);
        for index in 0..correction.crossing_left {
            let expected = 0.5 * trace.current()[index];
            assert!(
                (correction.corrected_current[index] - expected).abs() <= 1.0e-12,
                "index {index} was not halved"
            );
        }
    }

    #[test]
    fn leakage_model_is_zero_across_the_mid_range() {
        let trace = leaky_tanh_trace();
        let correction =
            leakage_correction(&trace, 1.2, &AnalysisConfig::default()).expect("correction");

        for (voltage, leakage) in trace.voltage().iter().zip(&correction.leakage_model) {
            if *voltage >= -15.0 && *voltage <= 15.0 {
                assert_eq!(*leakage, 0.0, "mid-range leakage at {voltage} V");
            }
        }
    }

    #[test]
    fn estimate_produces_a_positive_distribution_above_vp() {
        let trace = leaky_tanh_trace();
        let vp = 1.2;
        let output = estimate(
            &trace,
            vp,
            &AnalysisConfig::default(),
            &ProbeGeometry::default(),
            &PhysicalConstants::default(),
        )
        .expect("estimate");

        assert!(!output.curve.is_empty());
        assert!(output.curve.energy_ev.iter().all(|energy| *energy > 0.0));
        assert!(output.curve.density.iter().all(|value| *value >= 0.0));
        assert!(output.electron_density.simpson > 0.0);
        assert!(output.electron_density.trapezoid > 0.0);
        assert!(output.temperature_ev.simpson > 0.0);
        assert!(output.temperature_ev.trapezoid > 0.0);
    }

    #[test]
    fn dense_grids_keep_the_integration_rules_in_agreement() {
        let trace = leaky_tanh_trace();
        let output = estimate(
            &trace,
            1.2,
            &AnalysisConfig::default(),
            &ProbeGeometry::default(),
            &PhysicalConstants::default(),
        )
        .expect("estimate");

        assert!(
            !output.rules_disagree,
            "simpson/trapezoid split: ne {:.3e} vs {:.3e}, Te {:.3e} vs {:.3e}",
            output.electron_density.simpson,
            output.electron_density.trapezoid,
            output.temperature_ev.simpson,
            output.temperature_ev.trapezoid
        );
    }

    #[test]
    fn vp_beyond_the_analysis_window_leaves_no_valid_energies() {
        let trace = leaky_tanh_trace();
        let error = estimate(
            &trace,
            16.0,
            &AnalysisConfig::default(),
            &ProbeGeometry::default(),
            &PhysicalConstants::default(),
        )
        .expect_err("vp above the window should fail");

        assert!(matches!(error, EedfError::NoValidEnergyRange { .. }));
    }
}
