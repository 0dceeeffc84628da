//! Top-level analysis run: drives the conditioning, peak-detection,
//! extraction, and EEDF stages and aggregates their outcomes into one
//! report.
//!
//! Stages are independent except where one's output feeds another, so a
//! failed EEDF never blocks Te/Vp extraction and vice versa. No stage ever
//! substitutes a silent default for a failed result; the report names every
//! parameter that could not be determined and why.

use crate::common::{AnalysisConfig, PhysicalConstants, ProbeGeometry};
use crate::domain::{PlasmaParameters, ProbeResult, Trace};
use crate::modules::eedf::{self, EedfEstimate};
use crate::modules::extract::{self, DerivativePeakEstimator, Extraction, VpEstimator};
use crate::numerics::smoothing::{self, SmoothingMethod};
use serde::{Deserialize, Serialize};

/// Smoothed copy of a trace: same voltage axis, filtered current.
pub fn smooth_trace(
    trace: &Trace,
    method: SmoothingMethod,
    window: usize,
) -> ProbeResult<Trace> {
    let current = smoothing::smooth(trace.current(), method, window)?;
    Ok(trace.with_current(current)?)
}

/// First-derivative trace: same voltage axis, dI/dV as the current row.
pub fn derivative_trace(trace: &Trace) -> ProbeResult<Trace> {
    let derivative = smoothing::gradient(trace.current(), trace.voltage())?;
    Ok(trace.with_current(derivative)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStage {
    Conditioning,
    PeakDetection,
    Extraction,
    Eedf,
}

impl AnalysisStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conditioning => "conditioning",
            Self::PeakDetection => "peak-detection",
            Self::Extraction => "extraction",
            Self::Eedf => "eedf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: AnalysisStage,
    pub message: String,
}

/// Aggregated output of one analysis run: every recovered quantity plus the
/// diagnostic arrays and the list of stages that could not complete.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub parameters: Option<PlasmaParameters>,
    pub vp_derivative_peak: Option<f64>,
    pub vp_line_intersection: Option<f64>,
    pub extraction: Option<Extraction>,
    pub eedf: Option<EedfEstimate>,
    pub smoothed_derivative: Option<Vec<f64>>,
    pub failures: Vec<StageFailure>,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_for(&self, stage: AnalysisStage) -> Option<&StageFailure> {
        self.failures.iter().find(|failure| failure.stage == stage)
    }

    fn record(&mut self, stage: AnalysisStage, message: impl Into<String>) {
        self.failures.push(StageFailure {
            stage,
            message: message.into(),
        });
    }
}

pub fn run_analysis(
    trace: &Trace,
    config: &AnalysisConfig,
    geometry: &ProbeGeometry,
    constants: &PhysicalConstants,
) -> AnalysisReport {
    let mut report = AnalysisReport::default();

    match extract::conditioned_derivative(trace, config) {
        Ok(derivative) => report.smoothed_derivative = Some(derivative),
        Err(error) => report.record(AnalysisStage::Conditioning, error.to_string()),
    }

    if let Some(derivative) = &report.smoothed_derivative {
        let estimator = DerivativePeakEstimator {
            voltage: trace.voltage(),
            smoothed_derivative: derivative,
        };
        match estimator.estimate_vp() {
            Ok(vp) => report.vp_derivative_peak = Some(vp),
            Err(error) => report.record(AnalysisStage::PeakDetection, error.to_string()),
        }
    }

    let Some(vp) = report.vp_derivative_peak else {
        return report;
    };

    match extract::extract_with_vp(trace, vp, config, geometry, constants) {
        Ok(extraction) => {
            report.vp_line_intersection = Some(extraction.vp_intersection);
            report.parameters = Some(extraction.parameters);
            if !extraction.parameters.is_physical() {
                report.record(
                    AnalysisStage::Extraction,
                    format!(
                        "non-physical parameter bundle (Te={:.4e} eV, Ie_sat={:.4e} A, Ii_sat={:.4e} A) indicates an upstream fit failure",
                        extraction.parameters.te_ev,
                        extraction.parameters.ie_sat,
                        extraction.parameters.ii_sat
                    ),
                );
            }
            report.extraction = Some(extraction);
        }
        Err(error) => report.record(AnalysisStage::Extraction, error.to_string()),
    }

    match eedf::estimate(trace, vp, config, geometry, constants) {
        Ok(estimate) => report.eedf = Some(estimate),
        Err(error) => report.record(AnalysisStage::Eedf, error.to_string()),
    }

    report
}
