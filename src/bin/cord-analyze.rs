use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cord_explorer::charts::{overview_charts, write_charts};
use cord_explorer::config::Config;
use cord_explorer::data::aggregate::{journal_diversity, yearly_stats};
use cord_explorer::data::clean::clean;
use cord_explorer::data::loader::{load, FallbackPolicy};
use cord_explorer::data::snapshot::write_snapshot;
use cord_explorer::report;

/// Analyze CORD-19 paper metadata and write the cleaned snapshot for the dashboard.
#[derive(Parser, Debug)]
#[command(name = "cord-analyze", version)]
struct Args {
    /// Metadata file (.csv, .json or .parquet)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Cleaned snapshot to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chart series JSON to write
    #[arg(long)]
    charts: Option<PathBuf>,

    /// Seed for the synthetic sample
    #[arg(long)]
    seed: Option<u64>,

    /// Number of papers in the synthetic sample
    #[arg(long)]
    sample_size: Option<usize>,

    /// When to substitute a synthetic sample for the input
    #[arg(long, value_enum)]
    fallback: Option<FallbackPolicy>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?.analysis;
    if let Some(v) = args.input {
        config.input = v;
    }
    if let Some(v) = args.output {
        config.output = v;
    }
    if let Some(v) = args.charts {
        config.charts = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    if let Some(v) = args.sample_size {
        config.sample_size = v;
    }
    if let Some(v) = args.fallback {
        config.fallback = v;
    }

    println!("{}", report::heading("CORD-19 RESEARCH DATASET ANALYSIS"));

    // ---- Part 1: loading and exploration ----
    let loaded = load(&config.input, &config.load_options())
        .with_context(|| format!("loading {}", config.input.display()))?;
    println!("{}", report::heading("DATA LOADING AND BASIC EXPLORATION"));
    println!("{}", report::overview(&loaded.table, &loaded.origin, 5));

    // ---- Part 2: cleaning ----
    let cleaned = clean(&loaded.table);
    println!("{}", report::heading("MISSING VALUES"));
    println!("{}", report::missing_values(&cleaned.missing));
    println!("{}", report::heading("DATA CLEANING"));
    println!("{}", report::cleaning_summary(&loaded.table, &cleaned));

    // ---- Part 3: analysis ----
    let table = &cleaned.table;
    let chart_options = config.chart_options();
    println!("{}", report::heading("DATA ANALYSIS"));
    println!(
        "{}",
        report::highlights(table, &chart_options.trend_years, config.top_words)
    );
    if let Some(div) = journal_diversity(table, 5) {
        println!(
            "Top 5 journals hold {:.1}% of journal papers ({} journals in total)",
            div.top_share, div.unique_journals
        );
    }
    println!("{}", report::heading("TEMPORAL ANALYSIS"));
    println!("{}", report::yearly_table(&yearly_stats(table)));

    // ---- Export ----
    let charts = overview_charts(table, &chart_options);
    write_charts(&config.charts, &charts)
        .with_context(|| format!("writing {}", config.charts.display()))?;
    println!("\nChart series saved as '{}'", config.charts.display());

    write_snapshot(table, &config.output)
        .with_context(|| format!("writing {}", config.output.display()))?;
    println!("Cleaned dataset saved as '{}'", config.output.display());

    println!("{}", report::heading("FINAL DATASET SUMMARY"));
    println!("{}", report::table_summary(table));

    Ok(())
}
