//! # Example: relay
//!
//! A background service scans in a loop and relays its log to two surfaces:
//! an in-memory [`LogView`] and the built-in [`LogWriter`].
//!
//! Shows how to:
//! - Implement background [`Work`] with [`WorkFn`].
//! - Attach and detach listeners while the producer keeps running.
//! - Toggle the service and read its [`RunState`].
//!
//! ## Flow
//! ```text
//! Service::toggle() ─► start() ─► WorkFn("scanner") ─► Emitter.message / error
//!                                                        │
//!                                      EventChannel ◄────┘
//!                                        ├─► LogView   (attached for a while)
//!                                        └─► LogWriter (attached throughout)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example relay --features logging
//! ```

use std::{sync::Arc, time::Duration};

use logrelay::{
    Config, Emitter, Listen, LogView, LogWriter, RunState, Service, WorkError, WorkFn,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
#[error("share unreachable")]
struct ShareUnreachable {
    #[source]
    source: std::io::Error,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let scanner = WorkFn::arc("scanner", |log: Emitter, ctx: CancellationToken| async move {
        let mut round = 0u32;
        while !ctx.is_cancelled() {
            round += 1;
            if round % 3 == 0 {
                let cause = ShareUnreachable {
                    source: std::io::Error::other("connection refused"),
                };
                log.error(format!("scan round {round} failed"), &cause);
            } else {
                log.message(format!("scan round {round} ok"));
            }
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            }
        }
        Ok::<_, WorkError>(())
    });

    let service = Service::with_work(Config::default(), scanner);
    service.channel().attach(Arc::new(LogWriter::new()));

    // The surface is only "on screen" for part of the run.
    let view = Arc::new(LogView::with_limit("surface", 100));
    let view_dyn: Arc<dyn Listen> = view.clone();
    service.channel().attach(view_dyn.clone());

    service.toggle()?;
    assert_eq!(service.status(), RunState::Running);
    tokio::time::sleep(Duration::from_millis(900)).await;

    service.channel().detach(&view_dyn);
    tokio::time::sleep(Duration::from_millis(500)).await;

    service.toggle()?;
    service.shutdown().await;

    println!();
    println!("Surface log ({} lines):", view.len());
    for line in view.lines() {
        println!(" │ {line}");
    }
    Ok(())
}
