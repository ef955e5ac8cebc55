mod dataset;
mod extract;
mod fetch;
mod normalize;
mod report;
mod stats;
mod store;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use dataset::{Artifact, MergeOutcome};
use fetch::{Fetcher, LISTINGS};

#[derive(Parser)]
#[command(name = "dlwatcher", about = "DLsite discount ranking watcher")]
struct Cli {
    /// Dataset CSV path
    #[arg(long, default_value = "data.csv")]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the ranking pages, merge into the dataset, write the report
    Run {
        /// Skip report generation
        #[arg(long)]
        no_report: bool,
        /// Report template containing one {DATA} placeholder
        #[arg(long, default_value = "data_tmpl.html")]
        template: PathBuf,
        /// Report output path
        #[arg(long, default_value = "data.html")]
        out: PathBuf,
    },
    /// Price overview and discount distribution for the stored dataset
    Stats,
    /// Rebuild the HTML report from the stored dataset
    Report {
        #[arg(long, default_value = "data_tmpl.html")]
        template: PathBuf,
        #[arg(long, default_value = "data.html")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            no_report,
            template,
            out,
        } => run(&cli.data, no_report, &template, &out).await,
        Commands::Stats => print_stats(&cli.data),
        Commands::Report { template, out } => rebuild_report(&cli.data, &template, &out),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    result
}

/// One full watch cycle: fetch every planned page sequentially, merge, then
/// persist once. Any fatal condition aborts before the save, so a failed run
/// never touches the stored dataset.
async fn run(data: &Path, no_report: bool, template: &Path, out: &Path) -> Result<()> {
    let mut dataset = store::load(data)?;
    let fetcher = Fetcher::new()?;
    let today = Local::now().date_naive();

    let total_pages: u32 = LISTINGS.iter().map(|l| l.pages).sum();
    let pb = ProgressBar::new(u64::from(total_pages));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages")?
            .progress_chars("=> "),
    );

    let mut outcome = MergeOutcome::default();
    for listing in LISTINGS {
        for page in 1..=listing.pages {
            let url = listing.url(page);
            let html = fetcher.page(&url).await?;

            let mut batch = Vec::new();
            for raw in extract::entries(&html) {
                let raw = raw.with_context(|| format!("extracting {url}"))?;
                let artifact = normalize::normalize(raw, today)
                    .with_context(|| format!("normalizing a record of {url}"))?;
                batch.push(artifact);
            }
            info!(%url, records = batch.len(), "page extracted");
            outcome.absorb(dataset.merge(batch));
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    info!(
        inserted = outcome.inserted,
        replaced = outcome.replaced,
        unchanged = outcome.unchanged,
        "merge complete"
    );
    println!("record counts: {}", dataset.len());

    let sorted = dataset.sorted();
    print_summary(&sorted)?;
    store::save(data, &dataset)?;

    if !no_report {
        report::generate(&sorted, template, out)?;
    }
    Ok(())
}

fn print_stats(data: &Path) -> Result<()> {
    let dataset = store::load(data)?;
    if dataset.is_empty() {
        println!("No records yet. Run 'run' first.");
        return Ok(());
    }
    println!("records: {}", dataset.len());
    print_summary(&dataset.sorted())
}

fn print_summary(sorted: &[&Artifact]) -> Result<()> {
    let overview = stats::price_overview(sorted)?;
    println!(
        "prices: p25={} p50={} p75={} avg={}",
        overview.p25, overview.p50, overview.p75, overview.avg
    );
    println!("top discounts:");
    for (discount, share) in stats::discount_frequency(sorted) {
        println!("  {discount:>3}% off: {:.1}% of records", share * 100.0);
    }
    Ok(())
}

fn rebuild_report(data: &Path, template: &Path, out: &Path) -> Result<()> {
    let dataset = store::load(data)?;
    if dataset.is_empty() {
        println!("No records yet. Run 'run' first.");
        return Ok(());
    }
    if !report::generate(&dataset.sorted(), template, out)? {
        println!("Template {} not found; nothing written.", template.display());
    }
    Ok(())
}
