//! Voltage-interval selection and derivative peak detection.

use crate::domain::{Region, Trace};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("no samples fall inside the voltage interval [{lo}, {hi}]")]
    EmptyRegion { lo: f64, hi: f64 },
    #[error("no interior local maximum in a derivative trace of {samples} samples")]
    NoPrimaryPeak { samples: usize },
}

/// Contiguous index range where `lo <= voltage <= hi`, inclusive at both
/// ends.
pub fn select(trace: &Trace, lo: f64, hi: f64) -> Result<Region, RegionError> {
    let voltage = trace.voltage();
    let start = voltage.partition_point(|value| *value < lo);
    let end = voltage.partition_point(|value| *value <= hi);

    if start >= end {
        return Err(RegionError::EmptyRegion { lo, hi });
    }

    Ok(Region::new(start, end - 1))
}

/// Index of the globally largest strict local maximum; ties break toward the
/// first occurrence, i.e. the lowest voltage.
pub fn find_primary_peak(derivative: &[f64]) -> Result<usize, RegionError> {
    let mut best: Option<(usize, f64)> = None;
    for index in 1..derivative.len().saturating_sub(1) {
        let value = derivative[index];
        if value > derivative[index - 1] && value > derivative[index + 1] {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((index, value)),
            }
        }
    }

    best.map(|(index, _)| index)
        .ok_or(RegionError::NoPrimaryPeak {
            samples: derivative.len(),
        })
}
