//! Run command - enrich a sheet of proposal links.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use propsig_core::io::{load_descriptors, save_records};
use propsig_core::{
    BatchContext, BatchProcessor, BatchSummary, DirectoryPageFetcher, HttpPageFetcher,
    ItemOutcome, PageFetcher,
};

use super::load_config;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Input CSV file or Google Sheets URL
    #[arg(required = true)]
    input: String,

    /// Output CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of rows to process
    #[arg(short, long)]
    limit: Option<usize>,

    /// Read pages from saved HTML files in this directory instead of the web
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Use pattern rules only, without calling the semantic service
    #[arg(long)]
    offline: bool,

    /// Do not pause between documents
    #[arg(long)]
    no_delay: bool,
}

pub fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.no_delay {
        config.batch.delay_ms = 0;
    }

    let descriptors = load_descriptors(&args.input, &config.columns)?;
    if descriptors.is_empty() {
        anyhow::bail!("No rows found in {}", args.input);
    }

    let limit = args.limit.unwrap_or(config.batch.limit);
    let total = descriptors.len().min(limit);
    println!(
        "{} Found {} rows, processing {}",
        style("ℹ").blue(),
        descriptors.len(),
        total
    );

    let fetcher: Box<dyn PageFetcher> = match args.pages_dir {
        Some(dir) => {
            debug!("Reading pages from {}", dir.display());
            Box::new(DirectoryPageFetcher::new(dir))
        }
        None => Box::new(HttpPageFetcher::new(
            config.fetch.clone(),
            config.session_cookie(),
        )?),
    };

    let api_key = if args.offline { None } else { config.api_key() };
    let context = BatchContext::from_config(&config, api_key, fetcher)?;
    let processor = BatchProcessor::new(context);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let result = processor.run_with_progress(&descriptors, limit, |_, descriptor, outcome| {
        if let ItemOutcome::Failed(failure) = outcome {
            pb.println(format!(
                "{} {}: {}",
                style("✗").red(),
                descriptor.company,
                failure
            ));
        }
        pb.set_message(descriptor.company.clone());
        pb.inc(1);
    });
    pb.finish_with_message("Complete");

    let output = args.output.unwrap_or_else(|| config.output.path.clone());
    save_records(&output, &result.header, &result.records)?;

    print_summary(&result.summary);
    println!(
        "{} Results saved to {}",
        style("✓").green(),
        output.display()
    );

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        summary.processed,
        Duration::from_millis(summary.elapsed_ms)
    );
    println!("  Semantic:   {}", style(summary.semantic).green());
    println!("  Pattern:    {}", style(summary.pattern).yellow());
    if summary.unresolved > 0 {
        println!("  Unresolved: {}", style(summary.unresolved).red());
    }
    if summary.failed > 0 {
        println!("  Failed:     {}", style(summary.failed).red());
    }
}
