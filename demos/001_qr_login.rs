//! QR code login and account info.
//!
//! Demonstrates:
//! - Connecting a session with handlers registered up front
//! - Starting QR code login and following scan progress
//! - Reading account data once logged in
//!
//! Usage:
//!   cargo run --example 001_qr_login
//!   cargo run --example 001_qr_login -- --url=ws://host:7777
//!   cargo run --example 001_qr_login -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use common::Args;
use padchat_client::{CallbackTable, Event, EventKind, Result, Session};
use tokio::sync::Notify;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: QR Login ===\n");

    // ========================================================================
    // Handlers
    // ========================================================================

    // The QR code can be the very first frame, so handlers go in before connect
    let callbacks = Arc::new(CallbackTable::new());
    let logged_in = Arc::new(Notify::new());

    callbacks.set(
        EventKind::QrCode,
        Arc::new(|event: Event| {
            if let Event::QrCode(qr) = event {
                println!("[QR] Scan to log in: {}", qr.url);
            }
        }),
    );
    callbacks.set(
        EventKind::Scan,
        Arc::new(|event: Event| {
            if let Event::Scan(scan) = event {
                println!("[Scan] status={} user={}", scan.status, scan.nick_name);
            }
        }),
    );

    let notify = Arc::clone(&logged_in);
    callbacks.set(
        EventKind::Login,
        Arc::new(move |_: Event| notify.notify_one()),
    );

    // ========================================================================
    // Connect and log in
    // ========================================================================

    println!("[1] Connecting to {}...", args.url);
    let session = Session::builder()
        .url(&args.url)
        .callbacks(callbacks)
        .connect()
        .await?;
    println!("    ✓ Session {}\n", session.state());

    println!("[2] Requesting QR code...");
    session.qr_login().await?;

    logged_in.notified().await;
    println!("    ✓ Logged in\n");

    // ========================================================================
    // Account data
    // ========================================================================

    println!("[3] Reading account data...");
    let me = session.get_my_info().await?;
    println!("    user_name: {}", me.user_name);
    println!("    uin:       {}", me.uin);

    let token = session.get_login_token().await?;
    println!("    token:     {}", token.token);

    common::wait_for_exit(args.no_wait).await;
    session.close().await
}
