mod commands;

use clap::Parser;
use langmuir_core::modules::serialization::ArtifactError;
use langmuir_core::modules::simulate::SimulationError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    init_tracing();

    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args: Vec<String> = std::iter::once("langmuir-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(name = "langmuir-rs", about = "Langmuir-probe I-V analysis and simulation")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Synthesize theoretical and averaged-noisy I-V sweeps per Te
    Simulate(commands::SimulateArgs),
    /// Recover plasma parameters and the EEDF from a two-row I-V artifact
    Analyze(commands::AnalyzeArgs),
    /// Convert stored two-row artifacts into CSV tables
    Export(commands::ExportArgs),
}

fn dispatch(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Simulate(args) => commands::run_simulate(args),
        CliCommand::Analyze(args) => commands::run_analyze(args),
        CliCommand::Export(args) => commands::run_export(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Artifact(_) => 3,
            Self::Simulation(_) => 4,
            Self::Internal(_) => 1,
        }
    }
}
