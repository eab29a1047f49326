use clap::{Parser, Subcommand};
use roaslens::cli::{self, OutputFormat};
use roaslens::types::ComparisonMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roaslens")]
#[command(about = "Explain why ROAS moved, straight from an ad-platform export.")]
#[command(long_about = "RoasLens - ROAS change analysis for ad-platform exports
Reads .xlsx, .xls or .csv daily reports from Naver, Kakao, Google or Meta

COMMANDS:
  analyze   - Compare the latest day/week against the one before it
  columns   - Show which header feeds each canonical field

EXAMPLES:
  roaslens analyze report.xlsx                  # Day over day
  roaslens analyze report.csv --mode week       # Week over week
  roaslens analyze report.xlsx -o summary.xlsx  # Export the report
  roaslens columns report.xlsx                  # Inspect the column mapping

Set RUST_LOG=roaslens=debug for column, period and totals diagnostics.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Compare ROAS between the most recent period and the one before it.

Rows are grouped by date. In day mode the latest date is compared with the
date before it; in week mode the latest 7 distinct dates are compared with
the 7 dates before those.

The report lists ad spend, revenue, ROAS, conversions, CVR, clicks, CPC, AOV,
CTR and CPA for both periods, followed by the main reason for the change,
contributing factors and recommendations.

OUTPUT:
  --format table|json|yaml   Print to the terminal (default: table)
  --output report.xlsx       Write the report instead (.xlsx, .yaml, .json)")]
    /// Analyze the ROAS change in a report
    Analyze {
        /// Path to the report (.xlsx, .xls or .csv)
        file: PathBuf,

        /// Comparison window: day (dod) or week (wow)
        #[arg(short, long, default_value = "day")]
        mode: ComparisonMode,

        /// Terminal output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the report to a file (.xlsx, .yaml, .yml or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show ingestion details and debug logs
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the resolved column mapping of a report
    Columns {
        /// Path to the report (.xlsx, .xls or .csv)
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("roaslens=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roaslens=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            mode,
            format,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            cli::analyze(file, mode, format, output, verbose).await?
        }

        Commands::Columns { file } => {
            init_tracing(false);
            cli::columns(file).await?
        }
    }

    Ok(())
}
