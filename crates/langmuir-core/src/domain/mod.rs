pub mod errors;

pub use errors::{ProbeError, ProbeResult};

pub use crate::numerics::fitting::{FitResult, ModelFamily};

use serde::{Deserialize, Serialize};

/// Minimum number of samples a trace must carry to be analyzable.
pub const MIN_TRACE_SAMPLES: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraceError {
    #[error("malformed input: expected 2 rows (voltage, current), got {rows}")]
    MalformedInput { rows: usize },
    #[error("malformed input: row lengths differ (voltage={voltage}, current={current})")]
    RowLengthMismatch { voltage: usize, current: usize },
    #[error("trace requires at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },
    #[error("trace sample must be finite: {row} row index {index} is {value}")]
    NonFiniteSample {
        row: &'static str,
        index: usize,
        value: f64,
    },
    #[error("trace voltage must be strictly increasing: index {index} has {current} after {previous}")]
    NonIncreasingVoltage {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// One measured or simulated I-V sweep: equal-length voltage and current
/// rows with strictly increasing voltage. Immutable once constructed; the
/// sole input to the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    voltage: Vec<f64>,
    current: Vec<f64>,
}

impl Trace {
    pub fn from_rows(voltage: Vec<f64>, current: Vec<f64>) -> Result<Self, TraceError> {
        if voltage.len() != current.len() {
            return Err(TraceError::RowLengthMismatch {
                voltage: voltage.len(),
                current: current.len(),
            });
        }
        if voltage.len() < MIN_TRACE_SAMPLES {
            return Err(TraceError::InsufficientSamples {
                required: MIN_TRACE_SAMPLES,
                actual: voltage.len(),
            });
        }

        for (index, value) in voltage.iter().copied().enumerate() {
            if !value.is_finite() {
                return Err(TraceError::NonFiniteSample {
                    row: "voltage",
                    index,
                    value,
                });
            }
            if index > 0 && value <= voltage[index - 1] {
                return Err(TraceError::NonIncreasingVoltage {
                    index,
                    previous: voltage[index - 1],
                    current: value,
                });
            }
        }
        for (index, value) in current.iter().copied().enumerate() {
            if !value.is_finite() {
                return Err(TraceError::NonFiniteSample {
                    row: "current",
                    index,
                    value,
                });
            }
        }

        Ok(Self { voltage, current })
    }

    /// Builds a trace from the persisted two-row layout: row 0 is voltage in
    /// ascending volts, row 1 is current in amperes.
    pub fn from_two_row(mut rows: Vec<Vec<f64>>) -> Result<Self, TraceError> {
        if rows.len() != 2 {
            return Err(TraceError::MalformedInput { rows: rows.len() });
        }

        let current = rows.pop().unwrap_or_default();
        let voltage = rows.pop().unwrap_or_default();
        Self::from_rows(voltage, current)
    }

    /// The same voltage axis with a replacement current row, for derived
    /// traces produced by the signal conditioner.
    pub fn with_current(&self, current: Vec<f64>) -> Result<Self, TraceError> {
        if current.len() != self.voltage.len() {
            return Err(TraceError::RowLengthMismatch {
                voltage: self.voltage.len(),
                current: current.len(),
            });
        }
        for (index, value) in current.iter().copied().enumerate() {
            if !value.is_finite() {
                return Err(TraceError::NonFiniteSample {
                    row: "current",
                    index,
                    value,
                });
            }
        }

        Ok(Self {
            voltage: self.voltage.clone(),
            current,
        })
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    pub fn into_rows(self) -> (Vec<f64>, Vec<f64>) {
        (self.voltage, self.current)
    }
}

/// Contiguous index range of a trace, inclusive at both ends. Derived from a
/// voltage interval and recomputed on demand, never stored with the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    start: usize,
    end: usize,
}

impl Region {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// A region always holds at least one sample; empty selections are
    /// rejected at construction time by the region selector.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    pub fn slice<'a>(&self, values: &'a [f64]) -> &'a [f64] {
        &values[self.start..=self.end]
    }
}

/// Final scalar bundle recovered from one analysis run.
///
/// Te is in eV, currents in amperes, densities in m^-3. Te, Ie_sat, and
/// Ii_sat are strictly positive for any physically valid input; a violation
/// flags an upstream fit failure, not a valid plasma state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaParameters {
    pub vp: f64,
    pub te_ev: f64,
    pub ie_sat: f64,
    pub ii_sat: f64,
    pub electron_density: f64,
    pub ion_density: f64,
}

impl PlasmaParameters {
    pub fn is_physical(&self) -> bool {
        let values = [
            self.vp,
            self.te_ev,
            self.ie_sat,
            self.ii_sat,
            self.electron_density,
            self.ion_density,
        ];
        values.iter().all(|value| value.is_finite())
            && self.te_ev > 0.0
            && self.ie_sat > 0.0
            && self.ii_sat > 0.0
    }
}

/// Electron energy distribution: paired energies (eV, all > 0) and
/// distribution values (all >= 0), defined only above the plasma potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EedfCurve {
    pub energy_ev: Vec<f64>,
    pub density: Vec<f64>,
}

impl EedfCurve {
    pub fn len(&self) -> usize {
        self.energy_ev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy_ev.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{PlasmaParameters, Region, Trace, TraceError};

    fn valid_parameters() -> PlasmaParameters {
        PlasmaParameters {
            vp: 2.8,
            te_ev: 1.0,
            ie_sat: 7.5e-4,
            ii_sat: 1.1e-5,
            electron_density: 1.0e16,
            ion_density: 1.0e16,
        }
    }

    #[test]
    fn trace_rejects_wrong_row_count() {
        let error = Trace::from_two_row(vec![vec![0.0, 1.0]]).expect_err("1 row should fail");
        assert_eq!(error, TraceError::MalformedInput { rows: 1 });

        let error = Trace::from_two_row(vec![vec![0.0], vec![0.0], vec![0.0]])
            .expect_err("3 rows should fail");
        assert_eq!(error, TraceError::MalformedInput { rows: 3 });
    }

    #[test]
    fn trace_rejects_mismatched_row_lengths() {
        let error = Trace::from_rows(vec![0.0, 1.0, 2.0], vec![0.0, 1.0])
            .expect_err("length mismatch should fail");
        assert_eq!(
            error,
            TraceError::RowLengthMismatch {
                voltage: 3,
                current: 2
            }
        );
    }

    #[test]
    fn trace_rejects_non_monotonic_voltage() {
        let error = Trace::from_rows(vec![0.0, 2.0, 1.0], vec![0.0, 0.0, 0.0])
            .expect_err("descending voltage should fail");
        assert_eq!(
            error,
            TraceError::NonIncreasingVoltage {
                index: 2,
                previous: 2.0,
                current: 1.0,
            }
        );
    }

    #[test]
    fn trace_rejects_non_finite_samples() {
        let error = Trace::from_rows(vec![0.0, 1.0], vec![0.0, f64::NAN])
            .expect_err("NaN current should fail");
        assert!(matches!(
            error,
            TraceError::NonFiniteSample { row: "current", index: 1, .. }
        ));
    }

    #[test]
    fn with_current_keeps_the_voltage_axis() {
        let trace = Trace::from_rows(vec![0.0, 1.0, 2.0], vec![5.0, 6.0, 7.0]).expect("trace");
        let derived = trace.with_current(vec![1.0, 2.0, 3.0]).expect("derived");

        assert_eq!(derived.voltage(), trace.voltage());
        assert_eq!(derived.current(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn region_is_inclusive_at_both_ends() {
        let region = Region::new(3, 7);
        assert_eq!(region.len(), 5);
        assert!(region.contains(3));
        assert!(region.contains(7));
        assert!(!region.contains(8));

        let values: Vec<f64> = (0..10).map(|index| index as f64).collect();
        assert_eq!(region.slice(&values), &[3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn physicality_check_flags_non_positive_saturation_currents() {
        assert!(valid_parameters().is_physical());

        let mut broken = valid_parameters();
        broken.ii_sat = -1.1e-5;
        assert!(!broken.is_physical());

        let mut broken = valid_parameters();
        broken.te_ev = 0.0;
        assert!(!broken.is_physical());

        let mut broken = valid_parameters();
        broken.electron_density = f64::NAN;
        assert!(!broken.is_physical());
    }
}
