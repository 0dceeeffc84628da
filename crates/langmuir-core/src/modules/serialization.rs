//! Two-row trace artifacts, report serialization, and the tabular export
//! collaborator.
//!
//! A persisted trace is a JSON array of two equal-length rows: row 0 is
//! voltage in ascending volts, row 1 is current in amperes. The export
//! routines translate that layout into a spreadsheet-style CSV with named
//! columns and never overwrite an existing target.

use crate::domain::{Trace, TraceError};
use globset::Glob;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_HEADER: &str = "Voltage (V),Current (A)";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write artifact '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse two-row artifact '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode artifact: {source}")]
    Encode { source: serde_json::Error },
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("invalid filename pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("failed to scan directory '{}': {source}", dir.display())]
    Scan {
        dir: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written,
    SkippedExisting,
}

pub fn trace_to_two_row_json(trace: &Trace) -> Result<String, ArtifactError> {
    serde_json::to_string(&[trace.voltage(), trace.current()])
        .map_err(|source| ArtifactError::Encode { source })
}

pub fn parse_two_row_json(source: &str, path: &Path) -> Result<Trace, ArtifactError> {
    let rows: Vec<Vec<f64>> =
        serde_json::from_str(source).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Trace::from_two_row(rows)?)
}

pub fn read_trace(path: &Path) -> Result<Trace, ArtifactError> {
    let source = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_two_row_json(&source, path)
}

pub fn write_trace(path: &Path, trace: &Trace) -> Result<(), ArtifactError> {
    let encoded = trace_to_two_row_json(trace)?;
    write_text_artifact(path, &encoded)
}

pub fn write_report_json(path: &Path, report: &impl Serialize) -> Result<(), ArtifactError> {
    let encoded = serde_json::to_string_pretty(report)
        .map_err(|source| ArtifactError::Encode { source })?;
    write_text_artifact(path, &encoded)
}

/// Converts one stored two-row artifact into a CSV table; skips the
/// conversion when the target already exists.
pub fn export_trace_csv(input: &Path, output: &Path) -> Result<ExportOutcome, ArtifactError> {
    if output.exists() {
        return Ok(ExportOutcome::SkippedExisting);
    }

    let trace = read_trace(input)?;
    let mut lines = Vec::with_capacity(trace.len() + 1);
    lines.push(EXPORT_HEADER.to_string());
    for (voltage, current) in trace.voltage().iter().zip(trace.current()) {
        lines.push(format!("{voltage},{current}"));
    }

    write_text_artifact(output, &lines.join("\n"))?;
    Ok(ExportOutcome::Written)
}

/// Batch export: converts every file in `input_dir` whose name matches
/// `pattern`, writing `<stem>.csv` files into `output_dir`.
pub fn export_directory(
    input_dir: &Path,
    output_dir: &Path,
    pattern: &str,
) -> Result<Vec<(PathBuf, ExportOutcome)>, ArtifactError> {
    let matcher = Glob::new(pattern)
        .map_err(|source| ArtifactError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    fs::create_dir_all(output_dir).map_err(|source| ArtifactError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<PathBuf> = fs::read_dir(input_dir)
        .map_err(|source| ArtifactError::Scan {
            dir: input_dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| matcher.is_match(name))
                .unwrap_or(false)
        })
        .collect();
    entries.sort();

    let mut outcomes = Vec::with_capacity(entries.len());
    for input in entries {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trace".to_string());
        let output = output_dir.join(format!("{stem}.csv"));
        let outcome = export_trace_csv(&input, &output)?;
        outcomes.push((input, outcome));
    }

    Ok(outcomes)
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> Result<(), ArtifactError> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}
