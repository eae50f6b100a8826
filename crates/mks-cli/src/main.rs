// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

mod input;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use mks_core::{MakespanConfig, MetricValue, MksError, RunDiagnostics, ScanConfig};
use mks_eval::{
    ConfusionRates, DEFAULT_SWEEP_POINTS, MeanTimes, OutcomeProbabilities, RecordMakespan,
    ResultRecord, ResultStore, SweepPoint, SweepVariable, reactive_makespan, sensitivity_sweep,
};
use mks_sim::{
    ReactiveBaseline, bootstrap_makespan, evaluate_predictions, reactive_baseline,
    simulate_reactive,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MKS_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "mks",
    version,
    about = "Expected-makespan estimation for monitored task execution"
)]
struct Cli {
    /// TOML configuration file; flags override its values.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Unmonitored statistics and reactive makespan of an episode pool.
    Reactive(ReactiveArgs),
    /// Decision pass over saved predictions plus a bootstrap makespan.
    Evaluate(EvaluateArgs),
    /// Monitored makespan while one input varies.
    Sweep(SweepArgs),
    /// Summary of stored records for several models.
    Report(ReportArgs),
}

#[derive(Debug, Args)]
struct ReactiveArgs {
    /// Episode CSV files with rows `time, channel..., label`.
    #[arg(long, required = true, num_args = 1.., value_name = "PATH")]
    episodes: Vec<PathBuf>,
    #[arg(long)]
    trials: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    /// JSON array of `{truth, probabilities}` per episode.
    #[arg(long, value_name = "FILE")]
    predictions: PathBuf,
    #[arg(long)]
    model: String,
    /// Decision threshold in [0, 1].
    #[arg(long)]
    confidence: Option<f64>,
    #[arg(long)]
    trials: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Result store root; the record is printed when omitted.
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SweepArgs {
    #[arg(long, value_name = "FILE")]
    record: PathBuf,
    /// One of p_tp, p_tn, mtf, mts.
    #[arg(long)]
    variable: SweepVariable,
    #[arg(long, default_value_t = DEFAULT_SWEEP_POINTS)]
    points: usize,
    /// Reactive makespan to compare against; derived from the record when omitted.
    #[arg(long, value_name = "EMS")]
    reactive: Option<f64>,
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ReportArgs {
    #[arg(long, value_name = "DIR")]
    store: PathBuf,
    #[arg(long)]
    confidence: f64,
    #[arg(long = "model", required = true, num_args = 1.., value_name = "NAME")]
    models: Vec<String>,
}

#[derive(Debug)]
enum CliError {
    Core(MksError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    Toml {
        context: String,
        source: toml::de::Error,
    },
    Context {
        context: String,
        source: Box<CliError>,
    },
    InvalidInput(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn toml(context: impl Into<String>, source: toml::de::Error) -> Self {
        Self::Toml {
            context: context.into(),
            source,
        }
    }

    fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Toml { .. } => "toml_error",
            Self::Context { source, .. } => source.code(),
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::Toml { context, source } => write!(f, "{context}: {source}"),
            Self::Context { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Toml { source, .. } => Some(source),
            Self::Context { source, .. } => Some(source.as_ref()),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<MksError> for CliError {
    fn from(value: MksError) -> Self {
        Self::Core(value)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ReactiveOutput {
    baseline: ReactiveBaseline,
    simulation_makespan: MetricValue,
    simulation_makespan_std: MetricValue,
    simulation_makespan_list: Vec<f64>,
    diagnostics: RunDiagnostics,
}

#[derive(Debug, Serialize)]
struct SavedRecord {
    model: String,
    confidence_percent: u32,
    path: PathBuf,
    predicted_makespan: MetricValue,
    simulation_makespan: MetricValue,
}

#[derive(Debug, Serialize)]
struct SweepOutput {
    variable: SweepVariable,
    reactive: MetricValue,
    points: Vec<SweepPoint>,
}

#[derive(Debug, Serialize)]
struct ReportRow {
    model: String,
    equation_makespan: MetricValue,
    simulation_makespan: Option<MetricValue>,
    conf_mat: ConfusionRates,
}

#[derive(Debug, Serialize)]
struct MissingModel {
    model: String,
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ReportOutput {
    confidence_percent: u32,
    rows: Vec<ReportRow>,
    missing: Vec<MissingModel>,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(CliError::invalid_input(err.to_string().trim_end())),
    };

    let config = input::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Reactive(args) => handle_reactive(config, args),
        Command::Evaluate(args) => handle_evaluate(config, args),
        Command::Sweep(args) => handle_sweep(args),
        Command::Report(args) => handle_report(args),
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn apply_simulation_overrides(
    config: &mut MakespanConfig,
    trials: Option<usize>,
    seed: Option<u64>,
) -> Result<(), CliError> {
    if let Some(trials) = trials {
        config.simulation.trials = trials;
    }
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    config.validate()?;
    Ok(())
}

fn handle_reactive(mut config: MakespanConfig, args: ReactiveArgs) -> Result<(), CliError> {
    apply_simulation_overrides(&mut config, args.trials, args.seed)?;
    let output = reactive_output(&config, &args.episodes)?;
    write_json_output(&output, args.output.as_deref())
}

fn reactive_output(config: &MakespanConfig, paths: &[PathBuf]) -> Result<ReactiveOutput, CliError> {
    let episodes = paths
        .iter()
        .map(|path| input::load_episode(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!(episodes = episodes.len(), "loaded episode pool");

    let baseline = reactive_baseline(&episodes, &config.timing)?;
    let mut rng = seeded_rng(config.simulation.seed);
    let simulation = simulate_reactive(&episodes, &config.timing, &config.simulation, &mut rng)?;
    Ok(ReactiveOutput {
        baseline,
        simulation_makespan: simulation.distribution.mean,
        simulation_makespan_std: simulation.distribution.std,
        simulation_makespan_list: simulation.distribution.makespans,
        diagnostics: simulation.diagnostics,
    })
}

fn handle_evaluate(mut config: MakespanConfig, args: EvaluateArgs) -> Result<(), CliError> {
    if let Some(confidence) = args.confidence {
        config.scan.confidence = confidence;
    }
    apply_simulation_overrides(&mut config, args.trials, args.seed)?;
    let record = evaluate_record(&config, &args.predictions)?;

    let Some(root) = args.store else {
        return write_json_output(&record, None);
    };
    let confidence_percent = config.scan.confidence_percent();
    let path = ResultStore::new(root).save(confidence_percent, &args.model, &record)?;
    let saved = SavedRecord {
        model: args.model,
        confidence_percent,
        path,
        predicted_makespan: record.makespan.equation(),
        simulation_makespan: record.makespan.simulated().unwrap_or_default(),
    };
    write_json_output(&saved, None)
}

fn evaluate_record(config: &MakespanConfig, predictions: &Path) -> Result<ResultRecord, CliError> {
    let predictions = input::load_predictions(predictions)?;
    let evaluation = evaluate_predictions(&predictions, &config.timing, config.scan.confidence)?;
    let mut rng = seeded_rng(config.simulation.seed);
    let bootstrap = bootstrap_makespan(&evaluation.results, &config.simulation, &mut rng)?;
    Ok(ResultRecord::from_accumulator(
        &evaluation.performance,
        RecordMakespan::Simulated {
            equation_predicted_makespan: evaluation.predicted_makespan(),
            simulation_makespan: bootstrap.distribution.mean,
            simulation_makespan_list: bootstrap.distribution.makespans,
            simulation_makespan_std: bootstrap.distribution.std,
        },
    ))
}

fn handle_sweep(args: SweepArgs) -> Result<(), CliError> {
    let record = input::load_record(&args.record)?;
    let output = sweep_output(&record, args.variable, args.points, args.reactive)?;
    write_json_output(&output, args.output.as_deref())
}

fn sweep_output(
    record: &ResultRecord,
    variable: SweepVariable,
    points: usize,
    reactive: Option<f64>,
) -> Result<SweepOutput, CliError> {
    if points == 0 {
        return Err(CliError::invalid_input("--points must be >= 1"));
    }
    let times = MeanTimes::from_metrics(&record.metrics)?;
    let probabilities = OutcomeProbabilities::from_metrics(&record.metrics)?;
    let reactive = match reactive {
        Some(value) if value.is_finite() => MetricValue::Defined(value),
        Some(value) => {
            return Err(CliError::invalid_input(format!(
                "--reactive must be finite; got {value}"
            )));
        }
        None => {
            let p_success = probabilities.p_tp + probabilities.p_fn + probabilities.p_ncs;
            reactive_makespan(times.mts, times.mtf, p_success, 1.0 - p_success)
        }
    };
    let grid = variable.default_grid(&times, &probabilities, points);
    let points = sensitivity_sweep(&times, &probabilities, variable, &grid, reactive)?;
    Ok(SweepOutput {
        variable,
        reactive,
        points,
    })
}

fn handle_report(args: ReportArgs) -> Result<(), CliError> {
    let output = report_output(&args)?;
    write_json_output(&output, None)
}

fn report_output(args: &ReportArgs) -> Result<ReportOutput, CliError> {
    let scan = ScanConfig {
        confidence: args.confidence,
        ..ScanConfig::default()
    };
    scan.validate()?;
    let confidence_percent = scan.confidence_percent();
    let batch = ResultStore::new(&args.store).load_many(confidence_percent, &args.models);
    if batch.is_empty() {
        return Err(MksError::missing_artifact(format!(
            "no records found under '{}' at confidence {confidence_percent}% for models: {}",
            args.store.display(),
            args.models.join(", ")
        ))
        .into());
    }

    let rows = batch
        .loaded
        .into_iter()
        .map(|(model, record)| ReportRow {
            model,
            equation_makespan: record.makespan.equation(),
            simulation_makespan: record.makespan.simulated(),
            conf_mat: record.conf_mat,
        })
        .collect();
    let missing = batch
        .failed
        .into_iter()
        .map(|(model, err)| MissingModel {
            model,
            code: err.code(),
            message: err.to_string(),
        })
        .collect();
    Ok(ReportOutput {
        confidence_percent,
        rows,
        missing,
    })
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        std::fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err.to_string().replace('"', "'")
        ),
    }
}
