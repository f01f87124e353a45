//! regscout command-line interface.
//!
//! Two-stage harvest of a prefix-searchable registry: `discover` walks the
//! search space collecting registration IDs, `extract` fetches and parses
//! the detail page for each discovered ID. Both stages checkpoint
//! continuously and resume by default.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use regscout_checkpoint::CheckpointStore;
use regscout_client::{
    DetailFetcher, DetailPageParser, HttpQueryDriver, HttpRegistryClient, RecordParser,
};
use regscout_core::{AppConfig, RegId};
use regscout_engine::{CsvSink, DiscoveryEngine, ExtractionEngine, JsonlBackup};
use regscout_frontier::{
    AdaptiveStrategy, ComprehensiveStrategy, MultiDimensionalStrategy, SearchStrategy,
};
use regscout_throttle::ThrottleController;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Checkpoint name shared by both stages.
const CHECKPOINT_NAME: &str = "registry";

#[derive(Parser)]
#[command(name = "regscout", version, about = "Registry harvester: discovery and extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover registration IDs by walking the search space
    Discover {
        /// Comprehensive search: every prefix at every depth
        #[arg(long, short = 'c')]
        comprehensive: bool,

        /// Multi-dimensional search: profession × state × prefix
        #[arg(long, short = 'm')]
        multi_dimensional: bool,

        /// Add suburb-level searches for high-volume states
        /// (multi-dimensional only)
        #[arg(long)]
        include_suburbs: bool,

        /// Maximum prefix depth (1 = A-Z, 2 = AA-ZZ, ...)
        #[arg(long, short = 'd', default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=4))]
        depth: u8,

        /// Search a single prefix only (testing)
        #[arg(long)]
        test_prefix: Option<String>,

        /// Start fresh instead of resuming from the checkpoint
        #[arg(long = "no-resume", action = ArgAction::SetFalse)]
        resume: bool,
    },

    /// Fetch and parse detail pages for discovered IDs
    Extract {
        /// Limit the number of IDs to extract this run
        #[arg(long)]
        limit: Option<usize>,

        /// Re-attempt previously failed IDs instead of the pending set
        #[arg(long)]
        retry_failed: bool,

        /// Start fresh instead of resuming from the checkpoint
        #[arg(long = "no-resume", action = ArgAction::SetFalse)]
        resume: bool,
    },

    /// Show harvest progress
    Status,

    /// Delete all progress data
    Reset {
        /// Actually perform the reset
        #[arg(long)]
        confirm: bool,
    },

    /// Fetch and print a single record (testing)
    TestId {
        /// Registration ID to fetch
        reg_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load_with_env().context("load configuration")?;

    match cli.command {
        Commands::Discover {
            comprehensive,
            multi_dimensional,
            include_suburbs,
            depth,
            test_prefix,
            resume,
        } => {
            cmd_discover(
                &config,
                comprehensive,
                multi_dimensional,
                include_suburbs,
                usize::from(depth),
                test_prefix,
                resume,
            )
            .await
        }
        Commands::Extract {
            limit,
            retry_failed,
            resume,
        } => cmd_extract(&config, limit, retry_failed, resume).await,
        Commands::Status => cmd_status(&config),
        Commands::Reset { confirm } => cmd_reset(&config, confirm),
        Commands::TestId { reg_id } => cmd_test_id(&config, &reg_id).await,
    }
}

/// Arm a flag that goes high on ctrl-c so the engines can stop at the next
/// unit boundary and save.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current unit then saving");
            handler_flag.store(true, Ordering::SeqCst);
        }
    });
    flag
}

#[allow(clippy::fn_params_excessive_bools)]
async fn cmd_discover(
    config: &AppConfig,
    comprehensive: bool,
    multi_dimensional: bool,
    include_suburbs: bool,
    depth: usize,
    test_prefix: Option<String>,
    resume: bool,
) -> Result<ExitCode> {
    let test_prefix = test_prefix.map(|p| p.to_uppercase());

    let strategy = if multi_dimensional {
        let strategy = MultiDimensionalStrategy::new(include_suburbs, test_prefix);
        tracing::info!(
            combinations = strategy.total_combinations(),
            include_suburbs,
            "multi-dimensional search"
        );
        SearchStrategy::MultiDimensional(strategy)
    } else if comprehensive {
        tracing::info!(depth, "comprehensive search");
        SearchStrategy::Comprehensive(ComprehensiveStrategy::new(depth))
    } else {
        tracing::info!(depth, "adaptive search");
        SearchStrategy::Adaptive(AdaptiveStrategy::new(
            depth,
            config.search.page_result_limit,
        ))
    };

    let mut store = CheckpointStore::open(CHECKPOINT_NAME, &config.paths, &config.search)
        .context("open checkpoint store")?;
    let driver = HttpQueryDriver::new(
        HttpRegistryClient::new(config.client.clone()).context("build registry client")?,
    );
    let throttle = ThrottleController::new(config.throttle.discovery.clone());

    let mut engine = DiscoveryEngine::new(
        driver,
        strategy,
        throttle,
        config.search.clone(),
        &mut store,
    )
    .with_interrupt(interrupt_flag());

    let outcome = engine.run(resume).await.context("discovery run")?;
    drop(engine);

    let summary = store.progress_summary();
    println!("Discovery complete.");
    println!("  New IDs this run:    {}", outcome.new_discoveries);
    println!("  Total discovered:    {}", summary.total_discovered);
    println!("  Units completed:     {}", outcome.units_completed);
    println!("  Units abandoned:     {}", outcome.units_abandoned);
    println!("  Errors this run:     {}", outcome.errors);

    if outcome.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn cmd_extract(
    config: &AppConfig,
    limit: Option<usize>,
    retry_failed: bool,
    resume: bool,
) -> Result<ExitCode> {
    let mut store = CheckpointStore::open(CHECKPOINT_NAME, &config.paths, &config.search)
        .context("open checkpoint store")?;
    let fetcher = HttpRegistryClient::new(config.client.clone()).context("build registry client")?;
    let throttle = ThrottleController::new(config.throttle.extraction.clone());
    let backup = JsonlBackup::open(&config.paths.backup_dir()?).context("open JSONL backup")?;
    let csv = CsvSink::open(&config.paths.extracted_dir()?).context("open CSV output")?;

    let mut engine = ExtractionEngine::new(
        fetcher,
        DetailPageParser::new(),
        throttle,
        config.search.clone(),
        &mut store,
        backup,
        csv,
    )
    .with_interrupt(interrupt_flag());

    let outcome = engine
        .run(resume, limit, retry_failed)
        .await
        .context("extraction run")?;
    let csv_path = engine.csv_path().to_path_buf();
    drop(engine);

    let summary = store.progress_summary();
    println!("Extraction complete.");
    println!("  Extracted this run:  {}", outcome.extracted);
    println!("  Failed this run:     {}", outcome.failed);
    println!("  Total extracted:     {}", summary.total_extracted);
    println!("  Still pending:       {}", summary.pending_extraction);
    println!("  CSV output:          {}", csv_path.display());

    if outcome.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_status(config: &AppConfig) -> Result<ExitCode> {
    let mut store = CheckpointStore::open(CHECKPOINT_NAME, &config.paths, &config.search)
        .context("open checkpoint store")?;

    if !store.load().context("load checkpoint")? {
        println!("No checkpoint found. Start with: regscout discover");
        return Ok(ExitCode::SUCCESS);
    }

    let summary = store.progress_summary();
    println!("Harvest status");
    println!("==============");
    if let Some(started) = &summary.discovery_started_at {
        println!("Discovery started:   {started}");
    }
    if let Some(updated) = &summary.discovery_last_updated {
        println!("Last updated:        {updated}");
    }
    println!();
    println!("Discovery");
    println!("  IDs discovered:      {}", summary.total_discovered);
    println!("  Prefixes completed:  {}", summary.prefixes_completed);
    if summary.prefixes_completed > 0 {
        for (depth, label) in [(1u32, "A-Z"), (2, "AA-ZZ"), (3, "AAA-ZZZ")] {
            let total = 26usize.pow(depth);
            let done = store
                .completed_prefixes()
                .iter()
                .filter(|p| p.chars().count() == depth as usize)
                .count();
            if done > 0 {
                let pct = done as f64 / total as f64 * 100.0;
                println!("    depth {depth} ({label}): {done}/{total} ({pct:.1}%)");
            }
        }
    }
    if summary.combinations_completed > 0 {
        println!(
            "  Combinations done:   {}",
            summary.combinations_completed
        );
    }
    if let Some(current) = &summary.current_prefix {
        println!(
            "  Current prefix:      '{current}' (page {})",
            summary.current_page
        );
    }
    if let Some(current) = &summary.current_combination {
        println!("  Current combination: {current}");
    }
    println!();
    println!("Extraction");
    println!("  Extracted:           {}", summary.total_extracted);
    println!("  Pending:             {}", summary.pending_extraction);
    println!("  Failed (retryable):  {}", summary.failed_extraction);
    if summary.total_discovered > 0 {
        let pct = summary.total_extracted as f64 / summary.total_discovered as f64 * 100.0;
        println!("  Progress:            {pct:.1}%");
    }
    println!();
    println!("Abandoned units:       {}", summary.abandoned_units);
    println!("Errors:                {}", summary.errors);

    Ok(ExitCode::SUCCESS)
}

fn cmd_reset(config: &AppConfig, confirm: bool) -> Result<ExitCode> {
    if !confirm {
        println!("This deletes all progress data. Re-run with --confirm to proceed.");
        return Ok(ExitCode::FAILURE);
    }

    let mut store = CheckpointStore::open(CHECKPOINT_NAME, &config.paths, &config.search)
        .context("open checkpoint store")?;
    store.load().context("load checkpoint")?;
    store.reset().context("reset checkpoint")?;
    println!("Reset complete. Start fresh with: regscout discover");
    Ok(ExitCode::SUCCESS)
}

async fn cmd_test_id(config: &AppConfig, reg_id: &str) -> Result<ExitCode> {
    let reg_id = RegId::new(reg_id.to_uppercase()).context("parse registration ID")?;

    let mut fetcher =
        HttpRegistryClient::new(config.client.clone()).context("build registry client")?;
    let Some(html) = fetcher.fetch(&reg_id).await.context("fetch detail page")? else {
        println!("No detail page found for {reg_id}");
        return Ok(ExitCode::FAILURE);
    };

    let mut record = DetailPageParser::new().parse(&html);
    if record.reg_id.is_none() {
        record.reg_id = Some(reg_id.as_str().to_string());
    }

    println!("Extracted record:");
    for (name, value) in regscout_client::PractitionerRecord::FIELD_NAMES
        .iter()
        .zip(record.field_values())
    {
        if let Some(value) = value {
            println!("  {name}: {value}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
