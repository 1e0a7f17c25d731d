//! Padchat client - async command/response correlation over WebSocket.
//!
//! This library drives a padchat automation service: it sends named commands,
//! matches each reply back to its caller by correlation id, and fans
//! unsolicited events out to user callbacks.
//!
//! # Architecture
//!
//! The client follows a request/notify model over one WebSocket:
//!
//! - **Commands**: `{"type":"user","cmd":...,"cmdId":...,"data":...}` out,
//!   `cmdRet` frames carrying the same `cmdId` back
//! - **Events**: `userEvent` frames (`qrcode`, `scan`, `login`, `loaded`,
//!   `push`) delivered to per-kind handler slots
//!
//! Key design principles:
//!
//! - Each [`Session`] owns: transport + pending-call registry + reader task
//! - Any number of tasks may have commands in flight at once
//! - Every call ends exactly once: reply, timeout, cancellation or disconnect
//! - Handlers run off the reader task and never stall reply routing
//!
//! # Quick Start
//!
//! ```no_run
//! use padchat_client::{Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .url("ws://127.0.0.1:7777")
//!         .connect()
//!         .await?;
//!
//!     session.on_qrcode(|qr| println!("scan to log in: {}", qr.url));
//!     session.on_message(|msg| println!("{} says {}", msg.from_user, msg.content));
//!
//!     session.qr_login().await?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     session.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], builder, registry, callback table |
//! | [`commands`] | Typed wrappers for service commands |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`CommandId`] correlation id |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Frame transport traits and implementations |

// ============================================================================
// Modules
// ============================================================================

/// Typed wrappers for service commands.
///
/// Adds methods such as [`Session::get_my_info`] and [`Session::send_msg`].
pub mod commands;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Correlation identifiers.
pub mod identifiers;

/// WebSocket protocol message types.
///
/// Envelopes, replies, inbound frames and event payloads.
pub mod protocol;

/// Session lifecycle, command correlation and event dispatch.
pub mod session;

/// Frame transport layer.
///
/// [`FrameSink`]/[`FrameSource`] traits with WebSocket and in-memory
/// implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{
    CallbackTable, DEFAULT_COMMAND_TIMEOUT, EventHandler, PendingCalls, Session, SessionBuilder,
    SessionConfig, SessionState,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::CommandId;

// Protocol types
pub use protocol::{
    AddContactSource, ChatMember, ChatroomInfo, CommandReply, Contact, CreateRoomResponse, Event,
    EventKind, LoginRequest, LoginToken, LoginType, MediaResponse, Message, MsgAndStatus, MyInfo,
    QrCode, ScanStatus, SendMsgRequest, SendMsgResponse, mk_at_content,
};

// Transport types
pub use transport::{FrameSink, FrameSource};

// Cancellation
pub use tokio_util::sync::CancellationToken;
