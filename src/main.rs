//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet feed collector.

use clap::Parser;
use driftnet::adapter::ReplayFeed;
use driftnet::campaign::{print_statistics, CampaignResult, CampaignRunner};
use driftnet::config::load_config_with_hash;
use driftnet::CancelFlag;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: an adaptive rate-limited feed collector
///
/// Driftnet drives a paginated search feed across a list of keyword targets,
/// collecting unique items while staying inside the source's rate limits.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "0.1.0")]
#[command(about = "An adaptive rate-limited feed collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be collected without collecting
    #[arg(long, conflicts_with = "replay")]
    dry_run: bool,

    /// Run the campaign against a captured JSON archive instead of a live feed
    #[arg(long, value_name = "ARCHIVE", conflicts_with = "dry_run")]
    replay: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(archive) = cli.replay {
        handle_replay(config, &archive).await?;
    } else {
        anyhow::bail!(
            "no live feed driver is bundled; run with --replay <ARCHIVE> or --dry-run"
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be collected
fn handle_dry_run(config: &driftnet::config::Config) {
    println!("=== Driftnet Dry Run ===\n");

    println!("Campaign:");
    println!("  Items per target: {}", config.campaign.items_per_target);
    println!("  Targets ({}):", config.campaign.targets.len());
    for target in &config.campaign.targets {
        println!("    - {}", target);
    }

    println!("\nBudgets:");
    println!("  Global limit: {} per window", config.limits.global_limit);
    println!("  Target limit: {} per window", config.limits.target_limit);
    println!("  Window: {}s", config.limits.window_seconds);

    println!("\nBackoff:");
    println!(
        "  Base {}s, ceiling {}s, multiplier {}, jitter {}",
        config.backoff.base_seconds,
        config.backoff.ceiling_seconds,
        config.backoff.multiplier,
        config.backoff.jitter
    );

    println!("\nRetry:");
    println!("  Attempts per target: {}", config.retry.max_target_retries);
    println!("  Login attempts: {}", config.retry.login_attempts);

    println!("\nCollection:");
    println!("  Scroll ceiling: {}", config.collection.scroll_ceiling);
    println!(
        "  Patience schedule: {}/{}/{}/{}",
        config.collection.patience_early,
        config.collection.patience_mid,
        config.collection.patience_late,
        config.collection.patience_final
    );

    println!("\nOutput:");
    println!("  Items: {}", config.output.items_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would collect up to {} items across {} targets",
        config.campaign.items_per_target * config.campaign.targets.len(),
        config.campaign.targets.len()
    );
}

/// Handles the --replay mode: runs the full campaign against an archive
async fn handle_replay(
    config: driftnet::config::Config,
    archive: &std::path::Path,
) -> anyhow::Result<()> {
    tracing::info!("Replaying archive: {}", archive.display());
    let adapter = ReplayFeed::from_path(archive)?;

    let cancel = CancelFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current step and stopping");
            ctrl_c_flag.cancel();
        }
    });

    let items_path = config.output.items_path.clone();
    let total_targets = config.campaign.targets.len();
    let runner = CampaignRunner::new(adapter, config, cancel);
    let CampaignResult { items, stats } = runner.run().await?;

    let json = serde_json::to_string_pretty(&items)?;
    std::fs::write(&items_path, json)?;
    tracing::info!("Wrote {} items to {}", items.len(), items_path);

    print_statistics(&stats, items.len(), total_targets);
    Ok(())
}
