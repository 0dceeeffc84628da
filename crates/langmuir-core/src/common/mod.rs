pub mod config;
pub mod constants;
pub mod geometry;

pub use config::{AnalysisConfig, SimulationConfig, VoltageWindow};
pub use constants::PhysicalConstants;
pub use geometry::ProbeGeometry;
