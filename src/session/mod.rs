//! Session lifecycle, command correlation and event dispatch.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Session`] handle and command invoker |
//! | `config` | [`SessionConfig`] and [`SessionBuilder`] |
//! | `state` | [`SessionState`] machine |
//! | `registry` | [`PendingCalls`], outstanding commands by id |
//! | `callbacks` | [`CallbackTable`], one handler slot per event kind |
//! | `dispatcher` | Reader loop routing replies and events |
//!
//! # Data Flow
//!
//! ```text
//! caller ── invoke ──► PendingCalls::register ──► FrameSink
//!   ▲                                               │
//!   │                                            service
//!   │                                               │
//!   └── oneshot ◄── PendingCalls::resolve ◄── Dispatcher ◄── FrameSource
//!                                                   │
//!                     CallbackTable::dispatch ◄─────┘ (userEvent)
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod callbacks;
mod config;
mod core;
mod dispatcher;
mod registry;
mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use callbacks::{CallbackTable, EventHandler};
pub use config::{DEFAULT_COMMAND_TIMEOUT, SessionBuilder, SessionConfig};
pub use self::core::Session;
pub use registry::PendingCalls;
pub use state::SessionState;
