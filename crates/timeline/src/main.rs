//! Timeline CLI - X/Twitter home timeline crawler.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timeline::auth::{CredentialProvider, FileCredentials};
use timeline::config::CrawlerConfig;
use timeline::pipeline::DailyRun;
use timeline::storage::PersistedCorpus;
use timeline::twitter::{HttpTransport, TimelineEndpoint};
use timeline::validate::{GoldenBaseline, HttpProbe, QualityValidator, ValidationReport};

/// Timeline CLI - Crawl the home timeline and score extraction quality.
#[derive(Parser)]
#[command(name = "timeline")]
#[command(about = "X/Twitter home timeline crawler")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the timeline, merge into today's corpus and validate it
    Crawl {
        /// Unique posts to collect
        #[arg(long)]
        count: Option<usize>,

        /// Maximum pages to fetch
        #[arg(long)]
        max_pages: Option<usize>,

        /// Timeline to crawl (recommended or following)
        #[arg(long)]
        timeline: Option<TimelineEndpoint>,

        /// Data directory for corpora and reports
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// JSON configuration file
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// Golden baseline to compare against
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Saved session file (falls back to X_* environment variables)
        #[arg(long, default_value = ".x-session.json")]
        session: PathBuf,
    },

    /// Score a saved corpus file
    Validate {
        /// Corpus file written by `crawl`
        #[arg(long)]
        input: PathBuf,

        /// Golden baseline to compare against
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Probe a sample of media URLs over HTTP
        #[arg(long)]
        probe: bool,

        /// Directory to write the report under
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Build a golden baseline from captured raw pages
    Baseline {
        /// Raw timeline page JSON files
        #[arg(long, num_args = 1.., required = true)]
        pages: Vec<PathBuf>,

        /// Output baseline file
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("timeline=debug,info")
    } else {
        EnvFilter::new("timeline=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Crawl {
            count,
            max_pages,
            timeline,
            data_dir,
            config,
            baseline,
            session,
        } => {
            let mut config = CrawlerConfig::load(Some(config.as_path()))?;
            if let Some(count) = count {
                config.targets.daily_tweet_count = count;
            }
            if max_pages.is_some() {
                config.targets.max_pages = max_pages;
            }
            if let Some(timeline) = timeline {
                config.targets.timeline = timeline;
            }
            config.validate()?;

            tracing::info!(
                timeline = %config.targets.timeline,
                count = config.targets.daily_tweet_count,
                data_dir = %data_dir.display(),
                "Starting crawl"
            );
            run_crawl(config, data_dir, baseline.as_deref(), &session).await
        }
        Commands::Validate {
            input,
            baseline,
            probe,
            data_dir,
        } => run_validate(&input, baseline.as_deref(), probe, &data_dir).await,
        Commands::Baseline { pages, output } => run_baseline(&pages, &output),
    }
}

async fn run_crawl(
    config: CrawlerConfig,
    data_dir: PathBuf,
    baseline: Option<&Path>,
    session_path: &Path,
) -> Result<()> {
    let session = FileCredentials::new(session_path)
        .session()
        .await
        .context("Failed to load session credentials")?;
    tracing::debug!("Loaded session");

    let transport = HttpTransport::new(&session, config.settings.timeout(), config.proxy.url())?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            signal_token.cancel();
        }
    });

    let mut run = DailyRun::new(transport, config, data_dir).with_cancellation(cancel);
    if let Some(path) = baseline {
        let golden = GoldenBaseline::load(path)
            .with_context(|| format!("Failed to load baseline {}", path.display()))?;
        run = run.with_baseline(golden);
    }

    let summary = run.run().await?;

    println!("\nCrawl Summary");
    println!("   Stopped: {}", summary.termination);
    println!("   Pages: {}", summary.pages_fetched);
    println!("   Posts this run: {}", summary.posts_crawled);
    println!("   Unique today: {}", summary.unique_total);
    println!("   Duplicates removed: {}", summary.duplicates_removed);
    println!("   Corpus: {}", summary.corpus_path.display());
    println!(
        "   Quality: {:.1} ({})",
        summary.overall_score,
        if summary.passed { "PASS" } else { "FAIL" }
    );
    println!("   Report: {}", summary.report_path.display());
    println!("   Daily report: {}", summary.daily_report_path.display());
    println!("   Daily digest: {}", summary.daily_markdown_path.display());

    Ok(())
}

async fn run_validate(
    input: &Path,
    baseline: Option<&Path>,
    probe: bool,
    data_dir: &Path,
) -> Result<()> {
    let corpus = PersistedCorpus::load(input)
        .with_context(|| format!("Failed to read corpus {}", input.display()))?;
    let golden = baseline
        .map(|path| {
            GoldenBaseline::load(path)
                .with_context(|| format!("Failed to load baseline {}", path.display()))
        })
        .transpose()?;

    let config = CrawlerConfig::from_env()?;
    let mut validator = QualityValidator::new(config.validation.clone());
    if probe {
        let timeout = std::time::Duration::from_secs(config.validation.probe_timeout_secs);
        validator = validator.with_probe(Box::new(HttpProbe::new(timeout)?));
    }

    let report = validator.validate(&corpus.tweets, golden.as_ref()).await;
    let path = report.save(data_dir)?;
    print_report(&report);
    println!("\nReport: {}", path.display());

    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("\nValidation Report ({} posts)", report.tweet_count);
    for (name, result) in &report.category_results {
        println!(
            "   {name}: {:.1} {}",
            result.score,
            if result.passed { "ok" } else { "issues" }
        );
    }
    println!(
        "   Overall: {:.1} ({:?})",
        report.overall_score, report.overall_status
    );
    for issue in &report.all_issues {
        println!("   - {issue}");
    }
    for recommendation in &report.recommendations {
        println!("   > {recommendation}");
    }
}

fn run_baseline(pages: &[PathBuf], output: &Path) -> Result<()> {
    let raw = pages
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid page JSON in {}", path.display()))
        })
        .collect::<Result<Vec<serde_json::Value>>>()?;

    let baseline = GoldenBaseline::from_pages(&raw);
    baseline.save(output)?;
    println!(
        "Baseline with {} posts written to {}",
        baseline.len(),
        output.display()
    );

    Ok(())
}
