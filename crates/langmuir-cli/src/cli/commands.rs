use super::CliError;
use langmuir_core::common::{AnalysisConfig, PhysicalConstants, ProbeGeometry, SimulationConfig};
use langmuir_core::modules::analysis::run_analysis;
use langmuir_core::modules::serialization::{
    export_directory, read_trace, write_report_json, write_trace,
};
use langmuir_core::modules::simulate::simulate;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(clap::Args)]
pub(super) struct SimulateArgs {
    /// Electron temperatures in eV, comma separated
    #[arg(long = "te", value_delimiter = ',', default_value = "0.1,0.25,0.5,1,2")]
    te_values: Vec<f64>,

    /// Directory receiving the two-row artifacts
    #[arg(long, default_value = "lmsim-data")]
    output_dir: PathBuf,

    /// Seed for the Gaussian noise stream
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the number of noisy samples averaged per sweep
    #[arg(long)]
    samples: Option<usize>,
}

pub(super) fn run_simulate(args: SimulateArgs) -> Result<i32, CliError> {
    let mut config = SimulationConfig::default();
    if let Some(samples) = args.samples {
        config.noise_samples = samples;
    }
    let geometry = ProbeGeometry::default();
    let constants = PhysicalConstants::default();

    std::fs::create_dir_all(&args.output_dir).map_err(|source| {
        CliError::Internal(anyhow::Error::new(source).context(format!(
            "failed to create output directory '{}'",
            args.output_dir.display()
        )))
    })?;

    for (index, te) in args.te_values.iter().copied().enumerate() {
        let run = simulate(te, &config, &geometry, &constants, args.seed + index as u64)?;

        let theory_path = args.output_dir.join(format!("langmuir-sim_ev{te}_theory.json"));
        let noisy_path = args
            .output_dir
            .join(format!("langmuir-sim_ev{te}_averaged_noisy.json"));
        write_trace(&theory_path, &run.theoretical)?;
        write_trace(&noisy_path, &run.averaged_noisy)?;

        info!(
            te_ev = te,
            vp = run.vp,
            ie_sat = run.ie_sat,
            ii_sat = run.ii_sat,
            floating_potential = run.floating_potential,
            "simulated sweep written to {}",
            args.output_dir.display()
        );
    }

    Ok(0)
}

#[derive(clap::Args)]
pub(super) struct AnalyzeArgs {
    /// Two-row I-V artifact to analyze
    input: PathBuf,

    /// Write the full JSON report here
    #[arg(long)]
    report: Option<PathBuf>,
}

pub(super) fn run_analyze(args: AnalyzeArgs) -> Result<i32, CliError> {
    let trace = read_trace(&args.input)?;
    info!(samples = trace.len(), "loaded trace '{}'", args.input.display());

    let report = run_analysis(
        &trace,
        &AnalysisConfig::default(),
        &ProbeGeometry::default(),
        &PhysicalConstants::default(),
    );

    for failure in &report.failures {
        warn!(stage = failure.stage.as_str(), "{}", failure.message);
    }

    if let Some(parameters) = &report.parameters {
        println!(
            "Estimated Electron Temperature (Te) = {:.2} eV",
            parameters.te_ev
        );
        println!(
            "Estimated Plasma Potential (Vp) = {:.2} V (from derivative peak)",
            parameters.vp
        );
        if let Some(vp) = report.vp_line_intersection {
            println!("Estimated Plasma Potential (Vp) = {vp:.2} V (from line crossing)");
        }
        println!(
            "Estimated Electron Saturation Current (Ie_sat) = {:.2e} A",
            parameters.ie_sat
        );
        println!(
            "Estimated Ion Saturation Current (Ii_sat) = {:.2e} A",
            parameters.ii_sat
        );
        println!(
            "Estimated Electron Density (ne) = {:.2e} m^-3",
            parameters.electron_density
        );
        println!(
            "Estimated Ion Density (ni) = {:.2e} m^-3",
            parameters.ion_density
        );
    }

    if let Some(eedf) = &report.eedf {
        println!(
            "EEDF Electron Density (n_e) [Simpson] = {:.4e}",
            eedf.electron_density.simpson
        );
        println!(
            "EEDF Electron Density (n_e) [Trapz] = {:.4e}",
            eedf.electron_density.trapezoid
        );
        println!(
            "EEDF Electron Temperature (T_e) [Simpson] = {:.4} eV",
            eedf.temperature_ev.simpson
        );
        println!(
            "EEDF Electron Temperature (T_e) [Trapz] = {:.4} eV",
            eedf.temperature_ev.trapezoid
        );
        if eedf.rules_disagree {
            warn!(
                "integration rules disagree beyond tolerance; treat the EEDF estimate as unreliable"
            );
        }
    }

    if let Some(report_path) = &args.report {
        write_report_json(report_path, &report)?;
        info!("report written to '{}'", report_path.display());
    }

    Ok(if report.parameters.is_some() || report.eedf.is_some() {
        0
    } else {
        1
    })
}

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    /// Directory holding two-row artifacts
    input_dir: PathBuf,

    /// Directory receiving the CSV tables; defaults to `<input>/output`
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Filename pattern selecting the artifacts to convert
    #[arg(long, default_value = "*.json")]
    pattern: String,
}

pub(super) fn run_export(args: ExportArgs) -> Result<i32, CliError> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| args.input_dir.join("output"));

    let outcomes = export_directory(&args.input_dir, &output_dir, &args.pattern)?;
    for (path, outcome) in &outcomes {
        info!(outcome = ?outcome, "processed '{}'", path.display());
    }

    println!(
        "Converted {} artifact(s) into '{}'",
        outcomes.len(),
        output_dir.display()
    );
    Ok(0)
}
