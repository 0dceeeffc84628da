//! Plasma-parameter extraction from fitted I-V regions.
//!
//! Two independent plasma-potential strategies are exposed behind the
//! [`VpEstimator`] capability so they can be tested, compared, and swapped
//! without touching the closed-form parameter formulas.

use crate::common::{AnalysisConfig, PhysicalConstants, ProbeGeometry};
use crate::domain::{FitResult, PlasmaParameters, Trace};
use crate::modules::regions::{self, RegionError};
use crate::numerics::fitting::{self, FitError};
use crate::numerics::smoothing::{self, SmoothingError, savitzky_golay};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const NEAR_ZERO_DENOMINATOR: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
    #[error(
        "log-linear fits are parallel: retardation slope {retardation_slope:.6e}, saturation slope {saturation_slope:.6e}"
    )]
    DegenerateIntersection {
        retardation_slope: f64,
        saturation_slope: f64,
    },
    #[error("numerically unstable {quantity}: {value:.6e} is too close to zero")]
    NumericallyUnstable { quantity: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VpStrategy {
    DerivativePeak,
    LineIntersection,
}

impl VpStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DerivativePeak => "derivative-peak",
            Self::LineIntersection => "line-intersection",
        }
    }
}

/// A named plasma-potential estimation strategy.
pub trait VpEstimator {
    fn strategy(&self) -> VpStrategy;
    fn estimate_vp(&self) -> Result<f64, ExtractError>;
}

/// Vp from the voltage of the primary peak of the smoothed derivative.
#[derive(Debug, Clone, Copy)]
pub struct DerivativePeakEstimator<'a> {
    pub voltage: &'a [f64],
    pub smoothed_derivative: &'a [f64],
}

impl VpEstimator for DerivativePeakEstimator<'_> {
    fn strategy(&self) -> VpStrategy {
        VpStrategy::DerivativePeak
    }

    fn estimate_vp(&self) -> Result<f64, ExtractError> {
        let index = regions::find_primary_peak(self.smoothed_derivative)?;
        Ok(self.voltage[index])
    }
}

/// Vp from the crossing of the retardation and saturation log-linear fits.
#[derive(Debug, Clone, Copy)]
pub struct LineIntersectionEstimator<'a> {
    pub retardation: &'a FitResult,
    pub saturation: &'a FitResult,
}

impl VpEstimator for LineIntersectionEstimator<'_> {
    fn strategy(&self) -> VpStrategy {
        VpStrategy::LineIntersection
    }

    fn estimate_vp(&self) -> Result<f64, ExtractError> {
        let retardation_slope = self.retardation.slope();
        let saturation_slope = self.saturation.slope();

        let denominator = retardation_slope - saturation_slope;
        let scale = retardation_slope.abs().max(saturation_slope.abs()).max(1.0);
        if denominator.abs() <= NEAR_ZERO_DENOMINATOR * scale {
            return Err(ExtractError::DegenerateIntersection {
                retardation_slope,
                saturation_slope,
            });
        }

        Ok((self.saturation.intercept() - self.retardation.intercept()) / denominator)
    }
}

/// Everything one extraction run produces: the scalar bundle plus the fits
/// and both Vp estimates for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub parameters: PlasmaParameters,
    pub vp_derivative_peak: f64,
    pub vp_intersection: f64,
    pub ion_fit: FitResult,
    pub retardation_fit: FitResult,
    pub saturation_fit: FitResult,
}

/// First derivative of the current, Savitzky-Golay filtered so noise does not
/// split the transition peak into spurious local maxima.
pub fn conditioned_derivative(
    trace: &Trace,
    config: &AnalysisConfig,
) -> Result<Vec<f64>, ExtractError> {
    let derivative = smoothing::gradient(trace.current(), trace.voltage())?;
    Ok(savitzky_golay(
        &derivative,
        config.derivative_filter_window,
        config.derivative_filter_order,
    )?)
}

/// Runs the fit pipeline around a known plasma-potential candidate and
/// derives the full parameter bundle.
pub fn extract_with_vp(
    trace: &Trace,
    vp_peak: f64,
    config: &AnalysisConfig,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> Result<Extraction, ExtractError> {
    let voltage = trace.voltage();
    let current = trace.current();

    let ion_region = regions::select(
        trace,
        config.ion_saturation_window.lo,
        config.ion_saturation_window.hi,
    )?;
    let ion_fit = fitting::fit_linear(ion_region.slice(voltage), ion_region.slice(current))?;

    // Remove the ion contribution so the retardation fit sees only the
    // electron current.
    let subtracted: Vec<f64> = voltage
        .iter()
        .zip(current)
        .map(|(v, i)| i - ion_fit.evaluate(*v))
        .collect();
    let ln_subtracted = fitting::ln_clipped(&subtracted, config.log_current_floor);

    let retardation_region = regions::select(trace, vp_peak - config.retardation_span, vp_peak)?;
    let retardation_fit = fitting::fit_linear(
        retardation_region.slice(voltage),
        retardation_region.slice(&ln_subtracted),
    )?;

    let last_voltage = voltage[voltage.len() - 1];
    let saturation_region =
        regions::select(trace, vp_peak + config.saturation_offset, last_voltage)?;
    let ln_current = fitting::ln_clipped(current, config.log_current_floor);
    let saturation_fit = fitting::fit_linear(
        saturation_region.slice(voltage),
        saturation_region.slice(&ln_current),
    )?;

    let (parameters, vp_intersection) = derive_parameters(
        &ion_fit,
        &retardation_fit,
        &saturation_fit,
        vp_peak,
        geometry,
        constants,
    )?;

    Ok(Extraction {
        parameters,
        vp_derivative_peak: vp_peak,
        vp_intersection,
        ion_fit,
        retardation_fit,
        saturation_fit,
    })
}

/// Combines the three regional fits with the physical constants into the
/// scalar parameter bundle. Returns the bundle together with the
/// line-intersection Vp estimate.
pub fn derive_parameters(
    ion_fit: &FitResult,
    retardation_fit: &FitResult,
    saturation_fit: &FitResult,
    vp_peak: f64,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> Result<(PlasmaParameters, f64), ExtractError> {
    let vp_intersection = LineIntersectionEstimator {
        retardation: retardation_fit,
        saturation: saturation_fit,
    }
    .estimate_vp()?;
    let intersection_current = saturation_fit.evaluate(vp_intersection);
    let ie_sat = intersection_current.exp();

    // Collected ion current is negative in the electron-positive sign
    // convention; the saturation magnitude is its negation.
    let ii_sat = -ion_fit.evaluate(vp_peak);

    let retardation_slope = retardation_fit.slope();
    if retardation_slope.abs() <= NEAR_ZERO_DENOMINATOR {
        return Err(ExtractError::NumericallyUnstable {
            quantity: "retardation slope",
            value: retardation_slope,
        });
    }
    let te_ev = 1.0 / retardation_slope.abs();

    let te_kelvin = constants.temperature_kelvin(te_ev);
    let area = geometry.area_m2();

    let thermal_velocity =
        (8.0 * constants.boltzmann * te_kelvin / (PI * constants.electron_mass)).sqrt();
    let electron_denominator =
        0.25 * constants.elementary_charge * thermal_velocity * area;
    if electron_denominator.abs() <= NEAR_ZERO_DENOMINATOR {
        return Err(ExtractError::NumericallyUnstable {
            quantity: "electron density denominator",
            value: electron_denominator,
        });
    }
    let electron_density = ie_sat / electron_denominator;

    let bohm_speed = (constants.boltzmann * te_kelvin / constants.ion_mass)
        .max(1.0e-10)
        .sqrt();
    let ion_denominator = 0.6 * constants.elementary_charge * area * bohm_speed;
    if ion_denominator.abs() <= NEAR_ZERO_DENOMINATOR {
        return Err(ExtractError::NumericallyUnstable {
            quantity: "ion density denominator",
            value: ion_denominator,
        });
    }
    let ion_density = ii_sat / ion_denominator;

    let parameters = PlasmaParameters {
        vp: vp_peak,
        te_ev,
        ie_sat,
        ii_sat,
        electron_density,
        ion_density,
    };

    Ok((parameters, vp_intersection))
}
