//! Demo wiring for the MCP bus.
//!
//! Starts one broker and three clients standing in for real components:
//! - `camera-manager` publishes `devices/<id>/events` on a timer
//! - `motion-rule` turns motion events into `command/recorder/start`
//! - `recorder` logs the commands it receives
//!
//! Runs until Ctrl-C, then closes every client.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use mcp_bus::broker::{Broker, Payload};
use mcp_bus::client::Client;
use mcp_bus::config::load_config;
use mcp_bus::utils::logging;
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("mcp-bus demo failed: {e}");
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let settings = load_config()?;
    logging::init(&settings.logging);

    let broker = Arc::new(Broker::with_settings(settings.broker.clone()));
    let client_settings = settings.client.clone();

    let recorder = Client::with_settings(
        Arc::clone(&broker),
        Some("recorder"),
        client_settings.clone(),
    )?;
    recorder.subscribe("command/recorder/+", |topic: &str, payload: &Payload| {
        info!(%topic, %payload, "recorder command");
        Ok(())
    })?;

    let rule = Arc::new(Client::with_settings(
        Arc::clone(&broker),
        Some("motion-rule"),
        client_settings.clone(),
    )?);
    let bus = Arc::downgrade(&rule);
    rule.subscribe("devices/+/events", move |topic: &str, payload: &Payload| {
        if payload["motion"] != json!(true) {
            return Ok(());
        }
        let Some(bus) = bus.upgrade() else {
            return Ok(());
        };
        let camera = topic.split('/').nth(1).unwrap_or_default();
        bus.publish("command/recorder/start", &json!({ "camera": camera }))?;
        Ok(())
    })?;

    let cameras = Client::with_settings(
        Arc::clone(&broker),
        Some("camera-manager"),
        client_settings,
    )?;
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    let mut tick: u64 = 0;

    info!("MCP bus demo running, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick += 1;
                let camera = format!("cam{}", tick % 3 + 1);
                cameras.publish(
                    &format!("devices/{camera}/events"),
                    &json!({ "motion": tick % 2 == 0, "tick": tick }),
                )?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Closing clients.");
                break;
            }
        }
    }

    cameras.close().await;
    rule.close().await;
    recorder.close().await;

    Ok(())
}
