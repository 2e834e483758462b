//! Notification worker: consumes `email-events` and hands each message to
//! the mail relay, or to the log when no relay is configured.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use engagement::config::ServiceSettings;
use ortho_config::OrthoConfig as _;
use engagement::domain::ports::MailTransport;
use engagement::domain::{NotificationWorker, Subscription, SubscriptionConfig};
use engagement::outbound::mail::{HttpMailTransport, LogMailTransport, MailRelayIdentity};
use engagement::outbound::persistence::PoolConfig;
use engagement::outbound::queue::{PostgresBrokerConfig, PostgresMessageBroker};
use engagement::telemetry::init_tracing;
use tokio::runtime::Builder;
use tracing::{info, warn};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build notification worker runtime")?;
    runtime.block_on(async_main())
}

fn build_transport(settings: &ServiceSettings) -> Result<Arc<dyn MailTransport>> {
    let Some(endpoint) = settings.mail_endpoint()? else {
        warn!("no mail relay configured; emails will only be logged");
        return Ok(Arc::new(LogMailTransport));
    };
    let transport = HttpMailTransport::new(
        endpoint,
        settings.mail_timeout(),
        MailRelayIdentity {
            sender: settings.mail_sender().to_owned(),
            api_key: settings.mail_api_key.clone(),
        },
    )
    .wrap_err("failed to build mail relay client")?;
    Ok(Arc::new(transport))
}

async fn async_main() -> Result<()> {
    let settings = ServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let database_url = settings.require_database_url()?;
    let transport = build_transport(&settings)?;

    let broker = PostgresMessageBroker::connect(
        PoolConfig::for_worker(database_url),
        PostgresBrokerConfig {
            lease: settings.lease(),
            requeue_delay: settings.requeue_delay(),
        },
    )
    .await
    .wrap_err("failed to connect to the message broker")?;

    let subscription = Subscription::new(
        Arc::new(broker.clone()),
        Arc::new(NotificationWorker::new(transport)),
        SubscriptionConfig {
            poll_interval: settings.poll_interval(),
        },
    );

    info!("notification worker starting");
    subscription.run(shutdown_signal()).await;
    broker.close();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}
