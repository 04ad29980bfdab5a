use bump::{logging, BumpConfig, BumpModule, LoopbackConnector, ModuleEvent, PeerDisconnect};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const EVENT_WAIT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BumpConfig::from_env()?;
    logging::init(config.log_format);

    let connector = LoopbackConnector::new("loopback-peer").with_echo();
    let peer = connector.peer();
    let (module, mut events) = BumpModule::new(Arc::new(connector));

    module
        .connect(json!({
            "apikey": config.api_key,
            "username": config.username,
            "message": config.message,
        }))
        .await;
    print_until(&mut events, &["connected", "error", "cancel"]).await?;

    module.send_message("hello from bump-loopback").await;
    print_until(&mut events, &["data", "error"]).await?;

    peer.deliver(vec![0xc3, 0x28]).await?;
    print_until(&mut events, &["error"]).await?;

    peer.hang_up(PeerDisconnect::OtherUserQuit).await?;
    print_until(&mut events, &["disconnected"]).await?;

    // Already disconnected: no event
    module.disconnect().await;

    Ok(())
}

/// Print events as JSON until one of `names` arrives
async fn print_until(events: &mut mpsc::UnboundedReceiver<ModuleEvent>, names: &[&str]) -> anyhow::Result<()> {
    loop {
        let event = timeout(EVENT_WAIT, events.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("event stream closed"))?;

        println!("{}", serde_json::to_string(&event)?);

        if names.contains(&event.name.as_str()) {
            if event.name == "error" && names[0] != "error" {
                anyhow::bail!("session failed: {}", event.data["message"]);
            }
            return Ok(());
        }
    }
}
