use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn langmuir_rs(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_langmuir-rs"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("binary should run")
}

#[test]
fn simulate_writes_both_trace_variants_per_temperature() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("sweeps");
    let data_dir_arg = data_dir.to_string_lossy().into_owned();

    let output = langmuir_rs(
        &[
            "simulate",
            "--te",
            "0.5,1",
            "--output-dir",
            &data_dir_arg,
            "--seed",
            "7",
        ],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    for name in [
        "langmuir-sim_ev0.5_theory.json",
        "langmuir-sim_ev0.5_averaged_noisy.json",
        "langmuir-sim_ev1_theory.json",
        "langmuir-sim_ev1_averaged_noisy.json",
    ] {
        assert!(data_dir.join(name).exists(), "missing artifact {name}");
    }
}

#[test]
fn analyze_recovers_parameters_from_a_simulated_theory_sweep() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("sweeps");
    let data_dir_arg = data_dir.to_string_lossy().into_owned();

    let output = langmuir_rs(
        &["simulate", "--te", "1", "--output-dir", &data_dir_arg],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let theory = data_dir.join("langmuir-sim_ev1_theory.json");
    let report = temp.path().join("report.json");
    let output = langmuir_rs(
        &[
            "analyze",
            &theory.to_string_lossy(),
            "--report",
            &report.to_string_lossy(),
        ],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    assert!(
        stdout.contains("Estimated Electron Temperature (Te)"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("Estimated Plasma Potential (Vp)"));
    assert!(report.exists());

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report"))
            .expect("report is valid JSON");
    assert!(parsed.get("parameters").is_some());
}

#[test]
fn export_translates_artifacts_and_skips_on_rerun() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("sweeps");
    let data_dir_arg = data_dir.to_string_lossy().into_owned();

    let output = langmuir_rs(
        &["simulate", "--te", "1", "--output-dir", &data_dir_arg],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let output = langmuir_rs(&["export", &data_dir_arg], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let exported = data_dir.join("output").join("langmuir-sim_ev1_theory.csv");
    let table = fs::read_to_string(&exported).expect("exported table");
    assert!(table.starts_with("Voltage (V),Current (A)"));

    let rerun = langmuir_rs(&["export", &data_dir_arg], temp.path());
    assert!(rerun.status.success(), "stderr: {}", stderr_of(&rerun));
}

#[test]
fn malformed_artifacts_are_reported_not_crashed() {
    let temp = TempDir::new().expect("tempdir");
    let broken = temp.path().join("broken.json");
    fs::write(&broken, "[[0.0, 1.0], [0.0, 1.0], [0.0, 1.0]]").expect("write");

    let output = langmuir_rs(&["analyze", &broken.to_string_lossy()], temp.path());
    assert!(!output.status.success());
    assert!(
        stderr_of(&output).contains("malformed input"),
        "stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn unknown_flags_surface_as_usage_errors() {
    let temp = TempDir::new().expect("tempdir");
    let output = langmuir_rs(&["simulate", "--bogus"], temp.path());
    assert_eq!(output.status.code(), Some(2));
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
