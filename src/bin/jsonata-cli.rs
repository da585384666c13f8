//! jsonata-cli - Command-line interface for jsonata-bridge
//!
//! Evaluates an expression against a JSON document, or replays fuzz corpus
//! files through the fuzzing harness.

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use jsonata_bridge::fuzz::{FuzzHarness, FuzzSide};
use jsonata_bridge::{Bridge, BridgeConfig, EvaluationOutcome, Interpolation};
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "jsonata")]
#[command(about = "Evaluate JSONata expressions against JSON documents", long_about = None)]
struct Cli {
    /// Bridge configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Eval {
        /// JSONata expression
        expression: String,

        /// Input JSON file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Override the configured interpolation mode
        #[arg(long, value_enum)]
        interpolation: Option<InterpolationArg>,
    },

    /// Replay fuzz corpus files through the fuzzing harness
    Replay {
        /// Which argument the corpus files supply
        #[arg(long, value_enum)]
        side: SideArg,

        /// File holding the fixed counterpart argument
        #[arg(long)]
        fixed: PathBuf,

        /// Corpus files
        #[arg(required = true)]
        corpus: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InterpolationArg {
    Legacy,
    Escaped,
    Bound,
}

impl From<InterpolationArg> for Interpolation {
    fn from(arg: InterpolationArg) -> Self {
        match arg {
            InterpolationArg::Legacy => Interpolation::Legacy,
            InterpolationArg::Escaped => Interpolation::Escaped,
            InterpolationArg::Bound => Interpolation::Bound,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Expression,
    Json,
}

impl From<SideArg> for FuzzSide {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Expression => FuzzSide::Expression,
            SideArg::Json => FuzzSide::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Eval {
            expression,
            input,
            timeout_ms,
            interpolation,
        } => {
            if let Some(mode) = interpolation {
                config.interpolation = mode.into();
            }
            let json = read_input(&input)?;
            let bridge = Bridge::new(config);

            let outcome = match timeout_ms {
                Some(ms) => bridge
                    .evaluate_with_deadline(expression, json, Duration::from_millis(ms))
                    .await?,
                None => bridge.evaluate(&expression, &json),
            };
            Ok(report(&outcome))
        }

        Commands::Replay {
            side,
            fixed,
            corpus,
        } => {
            let harness = FuzzHarness::load_with(Bridge::new(config), side.into(), &fixed)?;
            let mut failures = 0usize;
            for path in &corpus {
                let data = std::fs::read(path)
                    .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
                let outcome = harness.test_one_input(&data);
                if !outcome.is_success() {
                    failures += 1;
                }
                match &outcome {
                    EvaluationOutcome::Success(text) => println!("{}: {text}", path.display()),
                    EvaluationOutcome::Failure(err) => println!(
                        "{}: Error[{}]: {err}",
                        path.display(),
                        err.classification().code()
                    ),
                }
            }
            println!("Replayed {} inputs, {} failed", corpus.len(), failures);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read input JSON from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input JSON {}", path.display()))
    }
}

fn report(outcome: &EvaluationOutcome) -> ExitCode {
    match outcome {
        EvaluationOutcome::Success(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        EvaluationOutcome::Failure(err) => {
            eprintln!("{err}");
            ExitCode::from(err.classification().code() as u8)
        }
    }
}
