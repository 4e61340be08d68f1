//! CLI tool for running the medallion transaction pipeline.

mod error;

use std::path::{Path, PathBuf};

use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use medallion_core::{
    config::PipelineConfig,
    pipeline::Pipeline,
    silver::{DatePolicy, DiscountPolicy},
    storage::read_parquet_file,
};
use snafu::ResultExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{
    CheckInputSnafu, CliResult, LoadConfigSnafu, ReadInputSnafu, RenderSnafu, RunPipelineSnafu,
    ValidationFailedSnafu,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MEDALLION_LOG";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiscountPolicyArg {
    Report,
    PassThrough,
    Clamp,
}

impl From<DiscountPolicyArg> for DiscountPolicy {
    fn from(v: DiscountPolicyArg) -> Self {
        match v {
            DiscountPolicyArg::Report => DiscountPolicy::Report,
            DiscountPolicyArg::PassThrough => DiscountPolicy::PassThrough,
            DiscountPolicyArg::Clamp => DiscountPolicy::Clamp,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run bronze, silver and gold over a raw Parquet file
    Run {
        /// Raw transactions Parquet file
        #[arg(long)]
        input: PathBuf,

        /// Lakehouse root directory (zones are created underneath)
        #[arg(long)]
        root: PathBuf,

        /// Optional TOML config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tag stamped into `_source_system`
        #[arg(long = "source-system")]
        source_system: Option<String>,

        /// Handling of discounts outside [0, 100]
        #[arg(long = "discount-policy", value_enum)]
        discount_policy: Option<DiscountPolicyArg>,

        /// Parse transaction dates into a date column
        #[arg(long = "normalize-dates", default_value_t = false)]
        normalize_dates: bool,

        /// Skip the raw and silver quality checks
        #[arg(long = "no-quality-gate", default_value_t = false)]
        no_quality_gate: bool,
    },

    /// Run the raw quality checks and list every violation
    Validate {
        #[arg(long)]
        input: PathBuf,

        /// Optional TOML config (for the valid status list)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Pretty-print the first rows of a Parquet file
    Show {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value_t = 10)]
        max_rows: usize,
    },
}

#[derive(Debug, Parser)]
#[command(name = "medallion", version, about = "Bronze/silver/gold transaction pipeline")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

struct RunArgs {
    input: PathBuf,
    root: PathBuf,
    config: Option<PathBuf>,
    source_system: Option<String>,
    discount_policy: Option<DiscountPolicyArg>,
    normalize_dates: bool,
    no_quality_gate: bool,
}

fn init_logging() {
    // A second init (for example in tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn load_config(path: Option<&Path>) -> CliResult<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .await
            .context(LoadConfigSnafu { path }),
        None => Ok(PipelineConfig::default()),
    }
}

async fn cmd_run(args: RunArgs) -> CliResult<()> {
    let mut config = load_config(args.config.as_deref())
        .await?
        .with_lakehouse_root(args.root);

    if let Some(source_system) = args.source_system {
        config.source_system = source_system;
    }
    if let Some(policy) = args.discount_policy {
        config.silver.discount_policy = policy.into();
    }
    if args.normalize_dates {
        config.silver.date_policy = DatePolicy::Normalize;
    }
    if args.no_quality_gate {
        config.quality_gate = false;
    }
    debug!("cli: effective config {config:?}");

    let report = Pipeline::new(config)
        .run(&args.input)
        .await
        .context(RunPipelineSnafu {
            input: args.input.clone(),
        })?;

    print!("{report}");
    Ok(())
}

async fn cmd_validate(input: &Path, config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config).await?;
    let raw = read_parquet_file(input)
        .await
        .context(ReadInputSnafu { path: input })?;

    let report = Pipeline::new(config)
        .check_raw(&raw)
        .context(CheckInputSnafu { input })?;

    if report.is_clean() {
        println!("{}: all checks passed ({} rows)", input.display(), raw.num_rows());
        return Ok(());
    }

    for violation in report.violations() {
        println!("FAIL {violation}");
    }
    ValidationFailedSnafu {
        input,
        count: report.violations().len(),
    }
    .fail()
}

async fn cmd_show(input: &Path, max_rows: usize) -> CliResult<()> {
    let batch = read_parquet_file(input)
        .await
        .context(ReadInputSnafu { path: input })?;

    let shown = batch.slice(0, max_rows.min(batch.num_rows()));
    let table = pretty_format_batches(&[shown]).context(RenderSnafu)?;
    println!("{table}");
    println!(
        "({} of {} rows, {} columns)",
        max_rows.min(batch.num_rows()),
        batch.num_rows(),
        batch.num_columns()
    );
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run {
            input,
            root,
            config,
            source_system,
            discount_policy,
            normalize_dates,
            no_quality_gate,
        } => {
            cmd_run(RunArgs {
                input,
                root,
                config,
                source_system,
                discount_policy,
                normalize_dates,
                no_quality_gate,
            })
            .await
        }
        Command::Validate { input, config } => cmd_validate(&input, config.as_deref()).await,
        Command::Show { input, max_rows } => cmd_show(&input, max_rows).await,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
