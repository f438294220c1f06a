use anyhow::Context;
use clap::{Parser, Subcommand};
use historian_anomaly::analytics::parse_methods;
use historian_anomaly::logging::{init_logging, LogConfig};
use historian_anomaly::{AnomalyEngine, EngineConfig, FlagReport, TimeSeriesPoint};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "historian-anomaly", version, about = "Historian time-series anomaly detection")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "ANOMALY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Flag anomalies in one or more JSON sample files
    Analyze {
        /// JSON array of time-series points; repeat for several tags
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Run individual statistical tests side by side
    Compare {
        #[arg(short, long)]
        input: PathBuf,
        /// zscore, modified-zscore, grubbs or dixon
        #[arg(short, long = "method", required = true)]
        methods: Vec<String>,
    },
    /// Write an annotated example configuration
    SampleConfig {
        #[arg(default_value = "historian-anomaly.toml.example")]
        output: PathBuf,
    },
}

/// Per-file outcome; short series are reported rather than aborting the batch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisOutput {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<FlagReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn load_points(path: &Path) -> anyhow::Result<Vec<TimeSeriesPoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let points = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse samples in {}", path.display()))?;
    Ok(points)
}

async fn analyze(engine: Arc<AnomalyEngine>, inputs: Vec<PathBuf>) -> anyhow::Result<()> {
    let tasks: Vec<_> = inputs
        .into_iter()
        .map(|path| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || {
                let input = path.display().to_string();
                let result = load_points(&path)
                    .and_then(|points| engine.flag(&points).map_err(anyhow::Error::from));
                match result {
                    Ok(report) => AnalysisOutput {
                        input,
                        report: Some(report),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!(input = %input, error = %e, "analysis failed");
                        AnalysisOutput {
                            input,
                            report: None,
                            error: Some(format!("{:#}", e)),
                        }
                    }
                }
            })
        })
        .collect();

    let mut outputs = Vec::with_capacity(tasks.len());
    for task in tasks {
        outputs.push(task.await.context("analysis task panicked")?);
    }

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let mut log_config = LogConfig::from_settings(&config.log);
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    let _guard = init_logging(&log_config)?;

    match EngineConfig::resolve_path(cli.config.as_deref()) {
        Some(path) => tracing::info!(path = %path.display(), "configuration loaded"),
        None => tracing::info!("no configuration file found, using defaults"),
    }

    match cli.command {
        Command::Analyze { inputs } => {
            let engine = Arc::new(AnomalyEngine::new(&config)?);
            analyze(engine, inputs).await?;
        }
        Command::Compare { input, methods } => {
            let engine = AnomalyEngine::new(&config)?;
            let methods = parse_methods(&methods)?;
            let points = load_points(&input)?;
            let results = engine.compare(&points, &methods)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::SampleConfig { output } => {
            EngineConfig::generate_sample_config(&output)?;
            println!("Sample configuration written to {}", output.display());
        }
    }

    Ok(())
}
