use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use lphedge_core::{HedgeRatioPolicy, TokenSymbolMap};
use tokio::time;

use lphedge_keeper::{
    create_example_config, CycleSummary, DryRunExecutor, HedgeEngine, InMemoryConfigStore, KeeperConfig,
    PersistedStates, SnapshotMarket,
};

#[derive(Parser, Debug)]
#[command(name = "lphedge-keeper")]
#[command(about = "Values concentrated liquidity positions and rebalances their hedges")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: String,

    /// Market snapshot JSON; overrides snapshot_path from the config
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Evaluation interval in seconds; overrides interval_secs from the config
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run a single cycle and exit (for cron); requires state_path in the config
    #[arg(long)]
    once: bool,

    /// Write an example configuration to --config and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.init_config {
        create_example_config(&args.config)?;
        log::info!("Wrote example configuration to {}", args.config);
        return Ok(());
    }

    let config = KeeperConfig::load(&args.config)?;
    log::info!("Loaded configuration for {} positions", config.enabled_positions().len());

    let symbols = match &config.token_map_path {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("Failed to read token map {}", path))?;
            let map = TokenSymbolMap::from_json(&json).with_context(|| format!("Failed to parse token map {}", path))?;
            log::info!("Loaded {} token symbol aliases", map.len());
            map
        }
        None => TokenSymbolMap::new(),
    };

    let snapshot_path = args
        .snapshot
        .clone()
        .or_else(|| config.snapshot_path.clone())
        .ok_or_else(|| anyhow!("no market snapshot configured; pass --snapshot or set snapshot_path"))?;

    if args.once && config.state_path.is_none() {
        bail!("--once needs state_path in the config so hedge ratios and cooldowns carry over between runs");
    }

    let interval_secs = args.interval.unwrap_or(config.interval_secs);
    log::info!("Market snapshot: {}", snapshot_path);
    log::info!("Evaluation interval: {}s", interval_secs);
    log::warn!("Running in DRY RUN mode - hedge instructions are logged, not traded");

    let engine = HedgeEngine::new(
        Arc::new(InMemoryConfigStore::from_config(&config)),
        Arc::new(DryRunExecutor::new()),
        HedgeRatioPolicy::with_profiles(config.profiles.clone()),
        Duration::from_millis(config.execution_timeout_ms),
    );

    if let Some(path) = &config.state_path {
        let saved = PersistedStates::load(path)?;
        let restored = engine.restore_states(saved.positions).await;
        log::info!("Restored hedge state for {} positions from {}", restored, path);
    }

    // Start main evaluation loop
    let mut interval_timer = time::interval(Duration::from_secs(interval_secs));
    let mut iteration = 0u64;

    loop {
        interval_timer.tick().await;
        iteration += 1;

        log::debug!("Starting keeper iteration {}", iteration);

        let mut market = SnapshotMarket::from_config(&config, symbols.clone());
        match market.load_snapshot(&snapshot_path) {
            Ok(()) => {
                let now = chrono::Utc::now().timestamp();
                let results = engine.run_cycle(&market, now).await;
                let summary = CycleSummary::from_results(&results);
                if summary.executed > 0 || summary.failed > 0 {
                    log::info!("Iteration {}: {:?}", iteration, summary);
                } else {
                    log::debug!("Iteration {}: {:?}", iteration, summary);
                }

                if let Some(path) = &config.state_path {
                    let states = PersistedStates::new(engine.export_states().await);
                    if let Err(e) = states.save(path) {
                        if args.once {
                            return Err(e).context("Failed to save hedge state");
                        }
                        log::error!("Failed to save hedge state after iteration {}: {}", iteration, e);
                    }
                }
            }
            Err(e) => {
                log::error!("Error in keeper iteration {}: {}", iteration, e);
                // Continue running even if individual iterations fail
            }
        }

        if args.once {
            break;
        }
    }

    Ok(())
}
