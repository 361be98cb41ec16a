//! Mortality Stats CLI
//!
//! Loads a statistical series through its reactive resource client and
//! renders the result:
//! - total deaths, excess mortality, ICD-10 cases, PCR-positive deaths
//! - registry listing
//! - default config generation

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mortality_stats::{
    config::generate_default_config, Config, FilterParams, HttpFetcher, LoggingConfig, Record,
    ResourceClient, ResourceKind,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mortality-stats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Public-health time series: deaths, excess mortality and ICD-10 cases")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Print the request URL instead of loading
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load total deaths
    TotalDeaths {
        #[command(flatten)]
        range: YearRange,
        /// Age-group codes, comma-separated (e.g. 0-4,5-9)
        #[arg(long, value_delimiter = ',')]
        age_groups: Vec<String>,
    },

    /// Load excess mortality
    ExcessMortality {
        #[command(flatten)]
        range: YearRange,
        /// Age-group codes, comma-separated (e.g. 0-4,5-9)
        #[arg(long, value_delimiter = ',')]
        age_groups: Vec<String>,
    },

    /// Load cases for an ICD-10 code
    Icd10Cases {
        /// ICD-10 code (e.g. A00)
        code: String,
        #[command(flatten)]
        range: YearRange,
        /// Pass the nocode flag to the service (true or false)
        #[arg(long)]
        nocode: Option<bool>,
    },

    /// Load PCR-positive deaths
    PcrPlusDeaths {
        #[command(flatten)]
        range: YearRange,
    },

    /// List the known resources and their effective endpoints
    Resources,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Clone, Copy, Debug)]
pub struct YearRange {
    /// First year (clamped to the resource's earliest year)
    #[arg(long)]
    pub from: Option<i32>,
    /// Last year (ignored when before the resource's earliest year)
    #[arg(long)]
    pub to: Option<i32>,
}

impl Commands {
    /// Resource and filters for a load command
    fn load_request(&self) -> Option<(ResourceKind, FilterParams)> {
        let non_empty = |groups: &Vec<String>| Some(groups.clone()).filter(|g| !g.is_empty());

        match self {
            Commands::TotalDeaths { range, age_groups } => Some((
                ResourceKind::TotalDeaths,
                FilterParams {
                    from: range.from,
                    to: range.to,
                    age_groups: non_empty(age_groups),
                    ..FilterParams::default()
                },
            )),
            Commands::ExcessMortality { range, age_groups } => Some((
                ResourceKind::ExcessMortality,
                FilterParams {
                    from: range.from,
                    to: range.to,
                    age_groups: non_empty(age_groups),
                    ..FilterParams::default()
                },
            )),
            Commands::Icd10Cases {
                code,
                range,
                nocode,
            } => Some((
                ResourceKind::Icd10Cases,
                FilterParams {
                    code: Some(code.clone()),
                    from: range.from,
                    to: range.to,
                    nocode: *nocode,
                    ..FilterParams::default()
                },
            )),
            Commands::PcrPlusDeaths { range } => Some((
                ResourceKind::PcrPlusDeaths,
                FilterParams {
                    from: range.from,
                    to: range.to,
                    ..FilterParams::default()
                },
            )),
            Commands::Resources | Commands::Config { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match &cli.command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(path, &content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }

        Commands::Resources => {
            println!(
                "{:<18} {:<8} {:<24} {}",
                "Resource", "Min year", "Parameters", "Endpoint"
            );
            println!("{}", "-".repeat(90));
            for kind in ResourceKind::ALL {
                let descriptor = kind.descriptor();
                let params = descriptor
                    .identity
                    .iter()
                    .chain(descriptor.filters)
                    .map(|p| p.query_name())
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{:<18} {:<8} {:<24} {}{}",
                    kind,
                    descriptor.min_year,
                    params,
                    config.resources.endpoint(kind).trim_end_matches('/'),
                    config.resources.path(kind)
                );
            }
        }

        command => {
            if let Some((kind, params)) = command.load_request() {
                load_and_print(&cli, &config, kind, &params).await?;
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mortality_stats={}", logging.level)));

    // Logs go to stderr so stdout stays clean for data
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn load_and_print(
    cli: &Cli,
    config: &Config,
    kind: ResourceKind,
    params: &FilterParams,
) -> anyhow::Result<()> {
    let client = build_client(config, kind)?;

    if cli.dry_run {
        println!("{}", client.url_for(params));
        return Ok(());
    }

    run_load(&client, params, |slug| eprintln!("Loading {}...", slug)).await;

    if let Some(message) = client.error().get() {
        eprintln!("{}", message);
        std::process::exit(1);
    }

    let records = client.result().get().unwrap_or_default();
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*records)?),
        OutputFormat::Csv => print_csv(&records)?,
        OutputFormat::Table => print_table(&records),
    }

    Ok(())
}

/// Client for the one resource a command loads
///
/// Endpoints of the other resources are not touched, so a bad override for
/// one of them does not affect this command.
fn build_client(config: &Config, kind: ResourceKind) -> anyhow::Result<ResourceClient> {
    let fetcher = HttpFetcher::new(config.http.request_timeout())?;
    Ok(ResourceClient::from_config(kind, config, Arc::new(fetcher))?)
}

/// Run a load, calling `announce` once the loading cell has been raised
async fn run_load(client: &ResourceClient, params: &FilterParams, announce: impl FnOnce(&str)) {
    let mut loading = client.loading().subscribe();
    let slug = client.kind().slug();

    // Polled in the same task as the load, after `begin` has published
    let indicator = async move {
        let raised = *loading.borrow();
        if raised || loading.changed().await.is_ok() {
            announce(slug);
        }
    };

    tokio::join!(client.load(params), indicator);
}

/// Column names in first-seen order across all records
fn columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Some(object) = record.as_object() {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "-".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn print_table(records: &[Record]) {
    if records.is_empty() {
        println!("No data for the selected range");
        return;
    }

    let columns = columns(records);
    if columns.is_empty() {
        for record in records {
            println!("{}", record);
        }
        return;
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| cell_text(record.get(column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", line(&columns));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len() - 1)));
    for row in &rows {
        println!("{}", line(row));
    }
    println!();
    println!("{} records", records.len());
}

fn print_csv(records: &[Record]) -> anyhow::Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(std::io::stdout());

    writer.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match record.get(column) {
                None | Some(serde_json::Value::Null) => String::new(),
                value => cell_text(value),
            })
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    std::io::stdout().flush()?;
    Ok(())
}
