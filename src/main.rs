//! Sales Pipeline CLI
//!
//! Reads a pipe-delimited sales log, writes the enriched file, and prints a
//! short summary to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- data/sales_data.txt --region North --report output/report.json
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use clap::Parser;
use sales_pipeline::{
    CatalogConfig, CatalogSource, FilterCriteria, HttpCatalog, NoCatalog, PipelineOutput, Result,
    SalesPipeline,
};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sales-pipeline", version, about = "Validate, aggregate and enrich a sales log")]
struct Cli {
    /// Pipe-delimited sales log
    input: PathBuf,

    /// Keep only transactions from this region
    #[arg(long)]
    region: Option<String>,

    /// Minimum line total (inclusive); ignored if not a number
    #[arg(long)]
    min_amount: Option<String>,

    /// Maximum line total (inclusive); ignored if not a number
    #[arg(long)]
    max_amount: Option<String>,

    /// Enriched output file
    #[arg(long, default_value = "data/enriched_sales_data.txt")]
    output: PathBuf,

    /// Also write the aggregate report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Product catalog endpoint
    #[arg(long, default_value = sales_pipeline::catalog::DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Catalog request timeout in seconds
    #[arg(long, default_value_t = 10)]
    catalog_timeout_secs: u64,

    /// Skip the catalog fetch
    #[arg(long)]
    offline: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let criteria = FilterCriteria::from_raw(
        cli.region.as_deref(),
        cli.min_amount.as_deref(),
        cli.max_amount.as_deref(),
    );
    for warning in &criteria.warnings {
        eprintln!("Warning: {}", warning);
    }

    let output = if cli.offline {
        execute(&cli, criteria, NoCatalog)?
    } else {
        let config = CatalogConfig {
            url: cli.catalog_url.clone(),
            timeout: Duration::from_secs(cli.catalog_timeout_secs),
        };
        execute(&cli, criteria, HttpCatalog::new(config))?
    };

    print_summary(&cli, &output);
    Ok(())
}

fn execute<C: CatalogSource>(cli: &Cli, criteria: FilterCriteria, source: C) -> Result<PipelineOutput> {
    let output = SalesPipeline::new(criteria, source).run_file(&cli.input)?;

    output.save_enriched(&cli.output)?;
    if let Some(report) = &cli.report {
        output.save_report(report)?;
    }
    Ok(output)
}

fn print_summary(cli: &Cli, output: &PipelineOutput) {
    let stats = &output.validation;
    let revenue = &output.report.revenue;
    let matches = &output.match_stats;

    println!("Encoding: {}", output.encoding);
    println!(
        "Records: {} valid, {} rejected, {} filtered out, {} analysed",
        stats.valid,
        stats.rejected,
        stats.filtered_out(),
        stats.final_count
    );
    println!("Total revenue: {}", revenue.total);
    println!("Average order value: {}", revenue.average_order_value);
    println!("Peak sales day: {}", output.report.peak_day);
    println!(
        "Catalog matches: {}/{} ({:.1}%)",
        matches.matched, matches.total, matches.match_rate
    );
    println!("Enriched data: {}", cli.output.display());
    if let Some(report) = &cli.report {
        println!("Report: {}", report.display());
    }
}
