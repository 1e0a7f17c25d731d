//! Echo bot.
//!
//! Demonstrates:
//! - Handling pushed messages
//! - Sending replies from a handler through a channel
//! - Cancelling outstanding commands on shutdown
//!
//! Usage:
//!   cargo run --example 002_echo_bot
//!   cargo run --example 002_echo_bot -- --url=ws://host:7777 --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use common::Args;
use padchat_client::{CancellationToken, Error, Message, SendMsgRequest, Session};
use tokio::sync::mpsc;

// ============================================================================
// Constants
// ============================================================================

/// Text messages only.
const SUB_TYPE_TEXT: i64 = 1;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== 002: Echo Bot ===\n");

    let session = Session::builder()
        .url(&args.url)
        .command_timeout(Duration::from_secs(10))
        .connect()
        .await
        .with_context(|| format!("connecting to {}", args.url))?;

    // Handlers run on blocking threads; hand messages to an async task
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    session.on_qrcode(|qr| println!("[QR] Scan to log in: {}", qr.url));
    session.on_message(move |msg| {
        if msg.sub_type == SUB_TYPE_TEXT {
            let _ = tx.send(msg);
        }
    });

    session.qr_login().await.context("starting login")?;

    let shutdown = CancellationToken::new();
    let worker = tokio::spawn({
        let session = session.clone();
        let shutdown = shutdown.clone();
        async move {
            loop {
                let msg = tokio::select! {
                    () = shutdown.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(msg) => msg,
                        None => break,
                    },
                };
                let reply = SendMsgRequest::text(&msg.from_user, format!("echo: {}", msg.content));
                match session
                    .invoke_with_cancel("sendMsg", &reply, session.command_timeout(), &shutdown)
                    .await
                {
                    Ok(_) => println!("[Echo] -> {}", msg.from_user),
                    Err(Error::Cancelled { .. }) => break,
                    Err(e) => eprintln!("[Echo] failed: {e}"),
                }
            }
        }
    });

    common::wait_for_exit(args.no_wait).await;

    shutdown.cancel();
    session.close().await.context("closing session")?;
    worker.await.context("echo worker")?;
    Ok(())
}
