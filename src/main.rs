use std::process;
use std::sync::Arc;

use dotenv::dotenv;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

mod analysis;
mod cli;
mod context;
mod db_access;
mod error;
mod models;
mod opt;

use analysis::{AnalysisEngine, BatchReport};
use cli::CliArgs;
use context::{EngineConfig, LAST_RUN_AT_KEY, LAST_RUN_MODE_KEY, LAST_RUN_SUMMARY_KEY};
use db_access::{DeckStore, MemoryStore, SurrealStore};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let args = CliArgs::parse();
    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(err) = run(&args).await {
        log::error!("deck analysis failed: {:#}", err);
        process::exit(1);
    }
}

async fn run(args: &CliArgs) -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env()?;
    args.apply(&mut config);
    log_previous_run();

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Received shutdown signal, cancelling analysis pass");
            shutdown.cancel();
        }
    });

    let report = match &args.dry_run {
        Some(fixture) => {
            log::info!("Dry run against fixture {:?}", fixture);
            let store = Arc::new(MemoryStore::load_fixture(fixture)?);
            run_with_store(store, config.clone(), &cancel).await?
        }
        None => {
            let store = Arc::new(SurrealStore::connect(&config.store).await?);
            run_with_store(store, config.clone(), &cancel).await?
        }
    };

    if args.dry_run.is_none() {
        record_last_run(&config, &report);
    }
    Ok(())
}

async fn run_with_store<S: DeckStore>(
    store: Arc<S>,
    config: EngineConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<BatchReport> {
    let engine = AnalysisEngine::new(store, config);
    Ok(engine.run(cancel).await?)
}

fn log_previous_run() {
    match context::create_context() {
        Ok(context) => match (
            context.read_data(LAST_RUN_AT_KEY),
            context.read_data(LAST_RUN_MODE_KEY),
            context.read_data(LAST_RUN_SUMMARY_KEY),
        ) {
            (Some(at), Some(mode), Some(summary)) => {
                log::info!("Previous run at {} ({}): {}", at, mode, summary)
            }
            _ => log::info!("No previous run recorded"),
        },
        Err(err) => log::debug!("No runtime data available: {:#}", err),
    }
}

fn record_last_run(config: &EngineConfig, report: &BatchReport) {
    let result = context::create_context().and_then(|context| {
        context.write_data(LAST_RUN_AT_KEY, &chrono::Utc::now().to_rfc3339())?;
        context.write_data(LAST_RUN_MODE_KEY, &config.mode.to_string())?;
        context.write_data(LAST_RUN_SUMMARY_KEY, &report.to_string())
    });
    if let Err(err) = result {
        log::warn!("Unable to save run summary: {:#}", err);
    }
}
