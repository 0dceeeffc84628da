//! Top-level error type unifying the per-stage failure enums.
//!
//! Every stage keeps its own structured error next to its routine; this
//! wrapper exists for callers that drive several stages and want one
//! `Result` type. All variants are recoverable-by-caller conditions, never
//! process-fatal states.

use crate::domain::TraceError;
use crate::modules::eedf::EedfError;
use crate::modules::extract::ExtractError;
use crate::modules::regions::RegionError;
use crate::modules::simulate::SimulationError;
use crate::numerics::fitting::FitError;
use crate::numerics::integration::QuadratureError;
use crate::numerics::smoothing::SmoothingError;

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Eedf(#[from] EedfError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::ProbeError;
    use crate::domain::TraceError;
    use crate::numerics::smoothing::SmoothingError;

    #[test]
    fn stage_errors_convert_and_render_transparently() {
        let error: ProbeError = TraceError::MalformedInput { rows: 3 }.into();
        assert_eq!(
            error.to_string(),
            "malformed input: expected 2 rows (voltage, current), got 3"
        );

        let error: ProbeError = SmoothingError::InvalidWindow {
            window: 4,
            len: 100,
            constraint: "window must be odd",
        }
        .into();
        assert_eq!(
            error.to_string(),
            "invalid smoothing window 4 for 100 samples: window must be odd"
        );
    }
}
