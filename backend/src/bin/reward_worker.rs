//! Reward worker: consumes `reward-events` and appends points to the ledger.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use engagement::config::ServiceSettings;
use ortho_config::OrthoConfig as _;
use engagement::domain::{RewardWorker, Subscription, SubscriptionConfig};
use engagement::outbound::persistence::{DbPool, DieselRewardLedgerRepository, PoolConfig};
use engagement::outbound::queue::{PostgresBrokerConfig, PostgresMessageBroker};
use engagement::telemetry::init_tracing;
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::{info, warn};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build reward worker runtime")?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let settings = ServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let database_url = settings.require_database_url()?;

    let pool = DbPool::new(PoolConfig::for_worker(database_url))
        .await
        .wrap_err("failed to create database pool")?;
    let broker = PostgresMessageBroker::from_pool(
        pool.clone(),
        PostgresBrokerConfig {
            lease: settings.lease(),
            requeue_delay: settings.requeue_delay(),
        },
    );

    let mut worker = RewardWorker::new(
        Arc::new(DieselRewardLedgerRepository::new(pool)),
        Arc::new(DefaultClock),
    );
    if let Some(max_attempts) = settings.reward_max_attempts {
        worker = worker.with_max_attempts(max_attempts);
    }
    let subscription = Subscription::new(
        Arc::new(broker.clone()),
        Arc::new(worker),
        SubscriptionConfig {
            poll_interval: settings.poll_interval(),
        },
    );

    info!("reward worker starting");
    subscription.run(shutdown_signal()).await;
    broker.close();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}
