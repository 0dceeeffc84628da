//! Forward model: synthesizes I-V sweeps for a given electron temperature.
//!
//! Two variants are produced per run: the noiseless "theoretical" curve
//! (electron plus ion collection only) and an "averaged noisy" curve that
//! adds the knee-smoothing artifact, tail leakage, and the mean of repeated
//! Gaussian-perturbed samples whose amplitude peaks at the plasma potential.

use crate::common::{PhysicalConstants, ProbeGeometry, SimulationConfig};
use crate::domain::{Trace, TraceError};
use crate::numerics::linear_grid;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Exponent clamp preventing overflow in the exponential branches.
const EXPONENT_LIMIT: f64 = 700.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("simulation grid requires at least 2 points, got {points}")]
    InvalidGrid { points: usize },
    #[error("electron temperature must be positive and finite, got {te_ev}")]
    NonPositiveTemperature { te_ev: f64 },
    #[error("noise amplitude must be finite and non-negative, got {amplitude}")]
    InvalidNoiseAmplitude { amplitude: f64 },
    #[error(transparent)]
    Trace(#[from] TraceError),
}

/// One simulated sweep: the closed-form scalars plus both trace variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTraces {
    pub te_ev: f64,
    pub vp: f64,
    pub ie_sat: f64,
    pub ii_sat: f64,
    /// First zero crossing of the total current, when one exists.
    pub floating_potential: Option<f64>,
    pub theoretical: Trace,
    pub averaged_noisy: Trace,
}

/// `Vp = Te * ln(sqrt(mi / (2 pi me)))`, linear in Te with a positive
/// species-dependent coefficient.
pub fn plasma_potential(te_ev: f64, constants: &PhysicalConstants) -> f64 {
    te_ev * (constants.ion_mass / (2.0 * PI * constants.electron_mass)).sqrt().ln()
}

/// Thermal electron flux to the probe: `0.25 e ne v_th A`.
pub fn electron_saturation_current(
    te_ev: f64,
    electron_density: f64,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> f64 {
    let te_kelvin = constants.temperature_kelvin(te_ev);
    let thermal_velocity =
        (8.0 * constants.boltzmann * te_kelvin / (PI * constants.electron_mass)).sqrt();
    0.25 * constants.elementary_charge * electron_density * thermal_velocity * geometry.area_m2()
}

/// Bohm ion flux to the probe: `0.61 e ni sqrt(kb Te_K / mi) A`.
pub fn ion_saturation_current(
    te_ev: f64,
    ion_density: f64,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> f64 {
    let te_kelvin = constants.temperature_kelvin(te_ev);
    let bohm_speed = (constants.boltzmann * te_kelvin / constants.ion_mass).sqrt();
    0.61 * constants.elementary_charge * ion_density * bohm_speed * geometry.area_m2()
}

/// Electron collection: exponential retardation below Vp, saturated above.
pub fn electron_current(voltage: f64, vp: f64, ie_sat: f64, te_ev: f64) -> f64 {
    if voltage < vp {
        let exponent = ((voltage - vp) / te_ev).clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT);
        ie_sat * exponent.exp()
    } else {
        ie_sat
    }
}

/// Ion collection: saturated below Vp, exponentially repelled above.
pub fn ion_current(voltage: f64, vp: f64, ii_sat: f64, ion_temperature_ev: f64) -> f64 {
    if voltage > vp {
        let exponent = ((vp - voltage) / ion_temperature_ev).clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT);
        -ii_sat * exponent.exp()
    } else {
        -ii_sat
    }
}

/// Voltage of the first sign change of the total current.
pub fn floating_potential(voltage: &[f64], current: &[f64]) -> Option<f64> {
    let sign = |value: f64| {
        if value > 0.0 {
            1
        } else if value < 0.0 {
            -1
        } else {
            0
        }
    };

    (0..current.len().saturating_sub(1))
        .find(|&index| sign(current[index]) != sign(current[index + 1]))
        .map(|index| voltage[index])
}

pub fn simulate(
    te_ev: f64,
    config: &SimulationConfig,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
    seed: u64,
) -> Result<SimulatedTraces, SimulationError> {
    if !te_ev.is_finite() || te_ev <= 0.0 {
        return Err(SimulationError::NonPositiveTemperature { te_ev });
    }
    if !config.noise_amplitude.is_finite() || config.noise_amplitude < 0.0 {
        return Err(SimulationError::InvalidNoiseAmplitude {
            amplitude: config.noise_amplitude,
        });
    }

    let voltage = linear_grid(config.v_min, config.v_max, config.points).ok_or(
        SimulationError::InvalidGrid {
            points: config.points,
        },
    )?;

    let vp = plasma_potential(te_ev, constants);
    let ie_sat = electron_saturation_current(te_ev, config.electron_density, geometry, constants);
    let ii_sat = ion_saturation_current(te_ev, config.ion_density, geometry, constants);

    let electron: Vec<f64> = voltage
        .iter()
        .map(|v| electron_current(*v, vp, ie_sat, te_ev))
        .collect();
    let ion: Vec<f64> = voltage
        .iter()
        .map(|v| ion_current(*v, vp, ii_sat, config.ion_temperature_ev))
        .collect();

    let theoretical_current: Vec<f64> = electron
        .iter()
        .zip(&ion)
        .map(|(e, i)| e + i)
        .collect();

    let vp_index = voltage.partition_point(|v| *v < vp);
    let smoothed_electron = knee_smoothed(&electron, vp_index, config);

    let total: Vec<f64> = voltage
        .iter()
        .enumerate()
        .map(|(index, v)| {
            let electron_leakage = if *v > vp {
                (v - vp) * config.electron_leakage_slope
            } else {
                0.0
            };
            let ion_leakage = if *v < vp {
                (v - vp) * config.ion_leakage_slope
            } else {
                0.0
            };
            smoothed_electron[index] + electron_leakage + ion[index] + ion_leakage
        })
        .collect();

    let vf = floating_potential(&voltage, &total);
    let averaged_noisy = averaged_noisy_current(&total, &voltage, vp, config, seed)?;

    Ok(SimulatedTraces {
        te_ev,
        vp,
        ie_sat,
        ii_sat,
        floating_potential: vf,
        theoretical: Trace::from_rows(voltage.clone(), theoretical_current)?,
        averaged_noisy: Trace::from_rows(voltage, averaged_noisy)?,
    })
}

/// Experimental rounding of the transition "knee": the electron current is
/// scaled by the height modifier, then a sliding in-place mean is applied
/// over a window around the Vp sample. The sequential in-place update (later
/// samples read already-smoothed neighbors) is part of the legacy artifact
/// and is kept as-is.
fn knee_smoothed(electron: &[f64], vp_index: usize, config: &SimulationConfig) -> Vec<f64> {
    let mut scaled: Vec<f64> = electron
        .iter()
        .map(|value| config.height_modifier * value)
        .collect();

    let reach_below = (5.0 * config.stretch_modifier) as usize;
    let reach_above = (10.0 * config.stretch_modifier) as usize;
    let window = (3.0 * config.stretch_modifier) as usize;
    if window == 0 {
        return scaled;
    }

    let start = vp_index.saturating_sub(reach_below);
    let end = (vp_index + reach_above).min(scaled.len());
    for index in start..end {
        if index >= window && index + window < scaled.len() {
            let sum: f64 = scaled[index - window..index + window].iter().sum();
            scaled[index] = sum / (2 * window) as f64;
        }
    }

    scaled
}

fn averaged_noisy_current(
    total: &[f64],
    voltage: &[f64],
    vp: f64,
    config: &SimulationConfig,
    seed: u64,
) -> Result<Vec<f64>, SimulationError> {
    if config.noise_samples == 0 || config.noise_amplitude == 0.0 {
        return Ok(total.to_vec());
    }

    let max_distance = voltage
        .iter()
        .map(|v| (v - vp).abs())
        .fold(0.0_f64, f64::max);
    let noise_factor: Vec<f64> = voltage
        .iter()
        .map(|v| 1.0 - (v - vp).abs() / max_distance)
        .collect();

    let normal = Normal::new(0.0, config.noise_amplitude).map_err(|_| {
        SimulationError::InvalidNoiseAmplitude {
            amplitude: config.noise_amplitude,
        }
    })?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut accumulated = vec![0.0; total.len()];
    for _ in 0..config.noise_samples {
        for (index, value) in total.iter().enumerate() {
            accumulated[index] += value + noise_factor[index] * normal.sample(&mut rng);
        }
    }

    let samples = config.noise_samples as f64;
    Ok(accumulated.into_iter().map(|sum| sum / samples).collect())
}
