mod config;
mod decode;
mod http;
mod mqtt;
mod sparkplug;
mod store;
mod topic;

use crate::config::Config;
use crate::store::SensorStore;
use anyhow::Result;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,spb_ingestor=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    tracing::info!(
        broker = %format!("{}:{}", config.mqtt_host, config.mqtt_port),
        store = %format!("{}:{}", config.store_host, config.store_port),
        table = %config.table,
        "starting sparkplug ingestor"
    );
    if !config.enable_spb {
        tracing::warn!("sparkplug decode disabled; expecting JSON or text payloads");
    }

    let listener = tokio::net::TcpListener::bind(config.health_bind()).await?;
    tracing::info!(bind = %config.health_bind(), "health endpoint listening");
    let health_handle = tokio::spawn(async move {
        axum::serve(listener, http::router()).await.ok();
    });

    let mut store = SensorStore::new(config.store_url(), config.table.clone());

    tokio::select! {
        res = mqtt::run_ingestor(&config, &mut store) => {
            if let Err(err) = res {
                tracing::error!(error=%err, "ingest loop exited");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    health_handle.abort();
    store.close().await;

    Ok(())
}
