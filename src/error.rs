//! Error types for the padchat client.
//!
//! One enum covers transport, session, call outcome and decoding failures.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use padchat_client::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     let me = session.get_my_info().await?;
//!     println!("logged in as {}", me.user_name);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |
//! | Session | [`Error::NotReady`], [`Error::Protocol`], [`Error::DuplicateCommandId`] |
//! | Call outcome | [`Error::RequestTimeout`], [`Error::Cancelled`], [`Error::Application`] |
//! | Decoding | [`Error::Decode`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;
use crate::session::SessionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Every failure a session operation can report.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the settings.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport send or receive failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// What the transport reported.
        message: String,
    },

    /// Connection closed, locally or by the remote service.
    ///
    /// Delivered to every call still outstanding when the reader stops.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Session is not in the `Ready` state.
    #[error("Session not ready (state: {state})")]
    NotReady {
        /// State the session was in when the call was attempted.
        state: SessionState,
    },

    /// Protocol violation or local limit exceeded.
    #[error("Protocol error: {message}")]
    Protocol {
        /// What rule was broken.
        message: String,
    },

    /// A correlation id was registered twice.
    #[error("Command id already pending: {command_id}")]
    DuplicateCommandId {
        /// The colliding id.
        command_id: CommandId,
    },

    // ========================================================================
    // Call Outcome Errors
    // ========================================================================
    /// No reply within the configured window.
    #[error("Command {command} ({command_id}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Command name.
        command: String,
        /// The command id that timed out.
        command_id: CommandId,
        /// How long the caller waited.
        timeout_ms: u64,
    },

    /// The caller abandoned the call before a reply arrived.
    #[error("Command {command_id} cancelled")]
    Cancelled {
        /// The cancelled command id.
        command_id: CommandId,
    },

    /// Remote side replied with `success=false`.
    #[error("Command {command} failed: {message}")]
    Application {
        /// Command name.
        command: String,
        /// Message text supplied by the remote service.
        message: String,
    },

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// A reply or event payload did not match the expected shape.
    #[error("Failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Payload could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a not-ready error.
    #[inline]
    pub fn not_ready(state: SessionState) -> Self {
        Self::NotReady { state }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(
        command: impl Into<String>,
        command_id: CommandId,
        timeout_ms: u64,
    ) -> Self {
        Self::RequestTimeout {
            command: command.into(),
            command_id,
            timeout_ms,
        }
    }

    /// Creates an application error.
    #[inline]
    pub fn application(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Application {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if no reply arrived in time.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote service rejected the command.
    #[inline]
    #[must_use]
    pub fn is_application_error(&self) -> bool {
        matches!(self, Self::Application { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed if the caller issues a new call on the
    /// same session.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. } | Self::Cancelled { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("socket reset");
        assert_eq!(err.to_string(), "Connection failed: socket reset");
    }

    #[test]
    fn test_application_error_keeps_message() {
        let err = Error::application("sendMsg", "user not found");
        assert_eq!(err.to_string(), "Command sendMsg failed: user not found");
        assert!(err.is_application_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout("getMyInfo", CommandId::generate(), 2000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(timeout_err.is_recoverable());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_not_ready_display() {
        let err = Error::not_ready(SessionState::Closed);
        assert_eq!(err.to_string(), "Session not ready (state: closed)");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
