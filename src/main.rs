use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use costsight::{
    config::{ConfigError, CostsightConfig},
    db::{Dataset, DbError, MemoryStore},
    observability::init_tracing,
    services::{AnalyticsError, AnalyticsService},
};
use serde::Serialize;
use uuid::Uuid;

/// CLI arguments for costsight
#[derive(Parser, Debug)]
#[command(version, about = "Cost analytics for AI usage records", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (built-in defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Full executive report: metrics, trends, forecasts, patterns,
    /// optimizations and insights
    Report(DataArgs),
    /// Forecast daily cost
    Forecast {
        #[command(flatten)]
        data: DataArgs,
        /// Days to forecast (defaults to analytics.forecast.default_horizon_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Detect usage patterns
    Patterns {
        #[command(flatten)]
        data: DataArgs,
        /// List anomalous days instead of patterns
        #[arg(long)]
        anomalies: bool,
    },
    /// Rank cost optimization opportunities
    Optimize(DataArgs),
    /// Compute executive scores
    Metrics(DataArgs),
    /// Initialize a new configuration file
    Init {
        /// Path to create the config file
        #[arg(short, long, default_value = "costsight.toml")]
        output: PathBuf,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Export the JSON schema for the configuration file
    Schema {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// JSON dataset describing the organization
    #[arg(short, long)]
    data: PathBuf,

    /// CSV file of usage records replacing the dataset's records
    #[cfg(feature = "csv")]
    #[arg(long)]
    records_csv: Option<PathBuf>,

    /// Organization to analyze (defaults to the dataset's org_id)
    #[arg(long)]
    org: Option<Uuid>,

    /// Last day of the analysis window, YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load dataset: {0}")]
    Dataset(#[from] DbError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Failed to write {1}: {0}")]
    Write(std::io::Error, PathBuf),

    #[error("{0}")]
    Usage(String),
}

/// Everything an analysis command needs.
struct Context {
    service: AnalyticsService,
    org_id: Uuid,
    as_of: NaiveDate,
}

impl Context {
    fn open(config_path: Option<&Path>, args: &DataArgs) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => CostsightConfig::from_file(path)?,
            None => CostsightConfig::default(),
        };
        if let Err(e) = init_tracing(&config.observability) {
            eprintln!("Warning: {}", e);
        }

        let dataset = Dataset::from_json_file(&args.data)?;
        #[cfg(feature = "csv")]
        let dataset = match &args.records_csv {
            Some(path) => dataset.with_csv_records(path)?,
            None => dataset,
        };

        let org_id = args.org.unwrap_or(dataset.org_id);
        let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
        tracing::info!(
            %org_id,
            %as_of,
            records = dataset.records.len(),
            budgets = dataset.budgets.len(),
            "Dataset loaded"
        );

        let store = Arc::new(MemoryStore::new().with_dataset(dataset));
        let service = AnalyticsService::new(store.clone(), store, Arc::new(config));

        Ok(Self {
            service,
            org_id,
            as_of,
        })
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config_path = args.config.as_deref();

    match &args.command {
        Command::Report(data) => {
            let ctx = Context::open(config_path, data)?;
            let report = ctx.service.executive_report(ctx.org_id, ctx.as_of).await?;
            print_json(&report)
        }
        Command::Forecast { data, days } => {
            let ctx = Context::open(config_path, data)?;
            let forecasts = ctx.service.forecast(ctx.org_id, ctx.as_of, *days).await?;
            print_json(&forecasts)
        }
        Command::Patterns { data, anomalies } => {
            let ctx = Context::open(config_path, data)?;
            if *anomalies {
                print_json(&ctx.service.anomalies(ctx.org_id, ctx.as_of).await?)
            } else {
                print_json(&ctx.service.detect_patterns(ctx.org_id, ctx.as_of).await?)
            }
        }
        Command::Optimize(data) => {
            let ctx = Context::open(config_path, data)?;
            let recommendations = ctx
                .service
                .recommend_optimizations(ctx.org_id, ctx.as_of)
                .await?;
            print_json(&recommendations)
        }
        Command::Metrics(data) => {
            let ctx = Context::open(config_path, data)?;
            let metrics = ctx.service.executive_metrics(ctx.org_id, ctx.as_of).await?;
            print_json(&metrics)
        }
        Command::Init { output, force } => run_init(output, *force),
        Command::Schema { output } => run_schema_export(output.as_deref()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write a config file holding every setting at its default value.
fn run_init(output: &Path, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        return Err(CliError::Usage(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            output.display()
        )));
    }

    let body = toml::to_string_pretty(&CostsightConfig::default())?;
    let content = format!(
        "# costsight configuration\n\
         # Values may reference environment variables as ${{VAR_NAME}}.\n\n{}",
        body
    );

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| CliError::Write(e, parent.to_path_buf()))?;
    }
    std::fs::write(output, content).map_err(|e| CliError::Write(e, output.to_path_buf()))?;

    eprintln!("Created config file: {}", output.display());
    Ok(())
}

/// Export JSON schema for the configuration file to file or stdout
#[cfg(feature = "json-schema")]
fn run_schema_export(output: Option<&Path>) -> Result<(), CliError> {
    let content = CostsightConfig::json_schema_string()?;

    match output {
        Some(path) => {
            std::fs::write(path, &content).map_err(|e| CliError::Write(e, path.to_path_buf()))?;
            eprintln!("Config JSON schema written to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

#[cfg(not(feature = "json-schema"))]
fn run_schema_export(_output: Option<&Path>) -> Result<(), CliError> {
    Err(CliError::Usage(
        "JSON schema export requires the 'json-schema' feature".to_string(),
    ))
}
