use anyhow::Context;
use message_relay::impls::amqp::AmqpBroker;
use message_relay::impls::http::HttpForwarder;
use message_relay::{config, logging, Relay};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = config::load_config().context("failed to load configuration")?;
    logging::init(&settings.log.level);
    log::info!("Starting message relay: api={}", settings.api.base_url);

    let broker = AmqpBroker::connect(&settings.broker).await?;
    let source = broker.subscribe().await?;
    let acknowledger = broker.acknowledger();

    let shutdown = CancellationToken::new();
    let watcher = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Shutdown signal received");
                watcher.cancel();
            }
            Err(err) => log::error!("Failed to listen for shutdown signal: error={err}"),
        }
    });

    let relay = Relay::new(Arc::new(HttpForwarder::new(settings.api.base_url)));
    let run_result = relay
        .run(Box::new(source), Box::new(acknowledger), shutdown)
        .await;

    if let Err(err) = broker.close().await {
        log::warn!("Broker close failed: error={err}");
    }

    Ok(run_result?)
}
