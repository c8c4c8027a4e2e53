// 50 Hz control loop plus the zenoh command endpoint
//
// Requests arrive on a queryable and are served on the blocking pool, since
// `go` sleeps until the loop below finishes the move. The loop itself
// never waits on a request.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use zenoh::query::Query;

use crate::config::{CONTROL_PERIOD, KEY_RPC, TOPIC_STATUS};
use crate::control::AxisController;
use crate::messages::{Command, Reply};
use crate::motor::{Actuator, SimAxis};

/// Where the runtime listens and publishes, and how fast it ticks
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub rpc_key: String,
    pub status_topic: String,
    pub period: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            rpc_key: KEY_RPC.to_string(),
            status_topic: TOPIC_STATUS.to_string(),
            period: CONTROL_PERIOD,
        }
    }
}

/// Decode a query into a command: the payload if any, else the selector
/// parameters (`axis/rpc?enc`).
fn query_command(query: &Query) -> Command {
    let text = match query.payload() {
        Some(payload) => String::from_utf8_lossy(&payload.to_bytes()).into_owned(),
        None => query.parameters().as_str().to_string(),
    };
    Command::parse(&text)
}

async fn serve<A: Actuator + 'static>(controller: Arc<AxisController<A>>, query: Query) {
    let command = query_command(&query);
    info!("Received command: {:?}", command);

    let reply = match tokio::task::spawn_blocking(move || controller.handle(&command)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Command handler failed: {}", e);
            Reply::Nack
        }
    };

    let reply_json = match serde_json::to_string(&reply) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode reply: {}", e);
            return;
        }
    };
    if let Err(e) = query.reply(query.key_expr().clone(), reply_json).await {
        warn!("Failed to send reply: {}", e);
    }
}

/// Serve commands and drive `controller` until Ctrl+C.
///
/// With `sim`, the simulated joint is advanced by one period before each tick.
/// Needs the multi-threaded tokio runtime.
pub async fn run<A: Actuator + 'static>(
    controller: AxisController<A>,
    sim: Option<SimAxis>,
    options: RuntimeOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let controller = Arc::new(controller);

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up queryable and publisher...");
    let queryable = session.declare_queryable(options.rpc_key.as_str()).await?;
    let pub_status = session
        .declare_publisher(options.status_topic.as_str())
        .await?;

    let mut tick = interval(options.period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Runtime started: {}ms period, {:?} strategy{}",
        options.period.as_millis(),
        controller.config().strategy,
        if sim.is_some() { ", simulated joint" } else { "" }
    );
    info!("Serving commands on: {}", options.rpc_key);
    info!("Publishing to: {}", options.status_topic);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Some(sim) = &sim {
                    sim.advance(options.period);
                }
                // Serial I/O on hardware
                tokio::task::block_in_place(|| controller.tick());

                let status_json = serde_json::to_string(&controller.status())?;
                pub_status.put(status_json).await?;
            }
            query = queryable.recv_async() => {
                let query = query?;
                tokio::spawn(serve(Arc::clone(&controller), query));
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                // Releases any `go` parked on the blocking pool
                controller.shutdown();
                break;
            }
        }
    }

    Ok(())
}
