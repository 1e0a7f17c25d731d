//! Message-framed duplex transport.
//!
//! The session never touches sockets directly. It writes through a
//! [`FrameSink`] and reads through a [`FrameSource`], the two halves of one
//! connection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │         WebSocket            │  Automation     │
//! │                 │                              │  Service        │
//! │  FrameSink   ───┼─────── envelopes ──────────► │                 │
//! │  FrameSource ◄──┼─────── cmdRet / userEvent ── │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `memory` | In-process channel transport for tests and embedding |
//! | `websocket` | `tokio-tungstenite` client transport |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// In-process channel transport.
pub mod memory;

/// WebSocket client transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemorySink, MemorySource, RemoteEnd};
pub use websocket::{WsSink, WsSource};

// ============================================================================
// Traits
// ============================================================================

/// Write half of a transport.
///
/// Each call writes exactly one whole frame. Callers serialize access.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Writes one text frame.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Closes the write half.
    async fn close(&mut self) -> Result<()>;
}

/// Read half of a transport.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Waits for the next text frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn receive(&mut self) -> Result<Option<String>>;
}
