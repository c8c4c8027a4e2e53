// Keyboard client: G=go, E=enc, Q quit
//
// Usage: cargo run --example rpc_client -- [key_expr]
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::{info, warn};

use axis_zenoh_runtime::config::KEY_RPC;
use axis_zenoh_runtime::messages::Reply;

// A go blocks for the whole move, so allow well past the longest strategy timeout
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let key = std::env::args().nth(1).unwrap_or_else(|| KEY_RPC.to_string());

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Controls: G=go, E=enc, Q=quit ({})", key);

    enable_raw_mode()?;
    let result = run_client(&session, &key).await;
    disable_raw_mode()?;

    result
}

async fn run_client(
    session: &zenoh::Session,
    key: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Char('g') => request(session, key, "go").await?,
            KeyCode::Char('e') => request(session, key, "enc").await?,
            // Anything the runtime does not know gets a nack
            KeyCode::Char('x') => request(session, key, "stop").await?,
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => {}
        }
    }

    Ok(())
}

async fn request(
    session: &zenoh::Session,
    key: &str,
    cmd: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("-> {}", cmd);
    let replies = session
        .get(key)
        .payload(cmd)
        .timeout(QUERY_TIMEOUT)
        .await?;

    while let Ok(reply) = replies.recv_async().await {
        match reply.result() {
            Ok(sample) => {
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<Reply>(&payload) {
                    Ok(Reply::Ack { position: Some(p) }) => info!("<- ack {:.2} deg", p),
                    Ok(Reply::Ack { position: None }) => info!("<- ack"),
                    Ok(Reply::Nack) => warn!("<- nack"),
                    Err(e) => warn!("Unreadable reply: {}", e),
                }
            }
            Err(err) => warn!("Query failed: {:?}", err),
        }
    }
    Ok(())
}
