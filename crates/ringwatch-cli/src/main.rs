//! Ringwatch CLI tool.
//!
//! Runs fraud-ring analysis over a JSON ledger and inspects the kernel
//! catalogue and effective configuration.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ringwatch::catalog::{self, DomainInfo};
use ringwatch::pipeline::Pipeline;
use ringwatch_core::{
    config::AnalysisConfig, observability::LogLevel, registry::KernelRegistry,
    transaction::Transaction,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ringwatch")]
#[command(version, about = "Transaction-graph fraud-ring detection", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a JSON array of transactions and emit the report
    Analyze {
        /// Transactions file (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML); environment variables are used otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// List registered kernels
    Kernels {
        /// Filter by domain (e.g. Compliance, patterns, ml)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Show kernel information
    Info {
        /// Kernel ID (e.g. compliance/shell-detection)
        kernel_id: String,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Start from the production preset
        #[arg(long)]
        production: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            pretty,
        } => {
            cmd_analyze(&input, config.as_deref(), output.as_deref(), pretty, cli.verbose).await?;
        }

        Commands::Kernels { domain } => {
            cmd_kernels(domain.as_deref())?;
        }

        Commands::Info { kernel_id } => {
            cmd_info(&kernel_id)?;
        }

        Commands::Config { production } => {
            cmd_config(production)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let config = match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::from_env().context("reading config from environment")?,
    };
    Ok(config)
}

fn load_transactions(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading transactions from {}", path.display()))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&content)
        .with_context(|| format!("parsing transactions in {}", path.display()))?;
    Ok(transactions)
}

async fn cmd_analyze(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    pretty: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    if verbose {
        config.logging.level = LogLevel::Debug;
    }
    config.logging.init()?;

    let transactions = load_transactions(input)?;
    tracing::info!(
        transactions = transactions.len(),
        input = %input.display(),
        "Loaded ledger"
    );

    let report = Pipeline::new(config).analyze(transactions).await?;
    let json = report.to_json(pretty)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(
                output = %path.display(),
                suspicious = report.summary.suspicious_accounts_flagged,
                rings = report.summary.fraud_rings_detected,
                "Report written"
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn cmd_kernels(domain_filter: Option<&str>) -> anyhow::Result<()> {
    let registry = KernelRegistry::new();
    ringwatch::register_all(&registry)?;

    let selected: Vec<DomainInfo> = match domain_filter {
        Some(name) => match catalog::find(name) {
            Some(info) => vec![info],
            None => {
                println!("Unknown domain '{name}'. Available domains:");
                for d in catalog::domains() {
                    println!("  - {} ({})", d.domain, d.crate_name);
                }
                return Ok(());
            }
        },
        None => catalog::domains(),
    };

    for info in &selected {
        println!("{} ({} kernels, {})", info.name, info.kernel_count, info.crate_name);
        println!("  {}", info.description);
        for kernel in registry.by_domain(info.domain) {
            println!("  [Batch] {:<34} - {}", kernel.id, kernel.description);
        }
        println!();
    }

    println!(
        "Total: {} kernels across {} domains",
        registry.total_count(),
        catalog::domains().len()
    );
    Ok(())
}

fn cmd_info(kernel_id: &str) -> anyhow::Result<()> {
    let registry = KernelRegistry::new();
    ringwatch::register_all(&registry)?;

    let Some(kernel) = registry.get(kernel_id) else {
        println!("Kernel '{kernel_id}' not found. Known kernels:");
        for id in registry.all_kernel_ids() {
            println!("  - {id}");
        }
        return Ok(());
    };

    println!("Kernel ID:    {}", kernel.id);
    println!("Domain:       {}", kernel.domain);
    println!("Description:  {}", kernel.description);
    println!("Throughput:   {} items/s", kernel.expected_throughput);
    println!("Latency:      {} us", kernel.target_latency_us);
    println!("Version:      {}", kernel.version);
    Ok(())
}

fn cmd_config(production: bool) -> anyhow::Result<()> {
    let config = if production {
        AnalysisConfig::production()
    } else {
        AnalysisConfig::from_env()?
    };
    config.validate()?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
