//! API server entry-point: wires the engagement REST endpoints and health probes.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;

use engagement::config::ServiceSettings;
use ortho_config::OrthoConfig as _;
use engagement::inbound::http::health::HealthState;
use engagement::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use engagement::outbound::queue::PostgresBrokerConfig;
use engagement::telemetry::init_tracing;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = ServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(bind_addr).with_broker_config(PostgresBrokerConfig {
        lease: settings.lease(),
        requeue_delay: settings.requeue_delay(),
    });
    let mut health = HealthState::new();

    if let Some(url) = settings.database_url.as_deref() {
        if settings.run_migrations {
            run_pending_migrations(url)
                .await
                .wrap_err("failed to apply database migrations")?;
        }
        let pool = DbPool::new(PoolConfig::new(url))
            .await
            .wrap_err("failed to create database pool")?;
        health = health.with_database(pool.clone());
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(health);
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "engagement API listening");

    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("HTTP server terminated with an error")
}
