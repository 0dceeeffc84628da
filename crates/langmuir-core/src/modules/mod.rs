pub mod analysis;
pub mod eedf;
pub mod extract;
pub mod regions;
pub mod serialization;
pub mod simulate;

pub use analysis::{
    AnalysisReport, AnalysisStage, StageFailure, derivative_trace, run_analysis, smooth_trace,
};
pub use eedf::{EedfError, EedfEstimate, LeakageCorrection, QuadraturePair};
pub use extract::{
    DerivativePeakEstimator, ExtractError, Extraction, LineIntersectionEstimator, VpEstimator,
    VpStrategy, extract_with_vp,
};
pub use regions::{RegionError, find_primary_peak, select};
pub use serialization::{
    ArtifactError, EXPORT_HEADER, ExportOutcome, export_directory, export_trace_csv, read_trace,
    write_report_json, write_trace,
};
pub use simulate::{SimulatedTraces, SimulationError, simulate};
