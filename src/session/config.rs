//! Session configuration and builder.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use padchat_client::Session;
//!
//! # async fn example() -> padchat_client::Result<()> {
//! let session = Session::builder()
//!     .url("ws://127.0.0.1:7777")
//!     .command_timeout(Duration::from_secs(10))
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::{FrameSink, FrameSource, websocket};

use super::Session;
use super::callbacks::CallbackTable;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SessionConfig
// ============================================================================

/// Validated session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Service URL, required by [`SessionBuilder::connect`].
    pub url: Option<Url>,
    /// Default per-command timeout.
    pub command_timeout: Duration,
    /// Cap on outstanding commands, unbounded when `None`.
    pub max_pending: Option<usize>,
    /// Whether to send the `init` envelope when the transport opens.
    pub send_init: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_pending: None,
            send_init: true,
        }
    }
}

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// Raw URL, parsed in [`SessionBuilder::build`].
    url: Option<String>,
    command_timeout: Duration,
    max_pending: Option<usize>,
    send_init: bool,
    callbacks: Option<Arc<CallbackTable>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            url: None,
            command_timeout: defaults.command_timeout,
            max_pending: defaults.max_pending,
            send_init: defaults.send_init,
            callbacks: None,
        }
    }
}

impl SessionBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service WebSocket URL (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the default per-command timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Caps the number of outstanding commands.
    #[inline]
    #[must_use]
    pub fn max_pending(mut self, max: usize) -> Self {
        self.max_pending = Some(max);
        self
    }

    /// Skips the `init` envelope on open.
    #[inline]
    #[must_use]
    pub fn no_init(mut self) -> Self {
        self.send_init = false;
        self
    }

    /// Uses a pre-populated callback table.
    ///
    /// Events can arrive as soon as the session opens, so handlers set here
    /// see the login QR code even if it is the first frame.
    #[inline]
    #[must_use]
    pub fn callbacks(mut self, table: Arc<CallbackTable>) -> Self {
        self.callbacks = Some(table);
        self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse or is not a
    /// WebSocket URL, the timeout is zero, or `max_pending` is zero.
    pub fn build(&self) -> Result<SessionConfig> {
        let url = self.url.as_deref().map(parse_ws_url).transpose()?;

        if self.command_timeout.is_zero() {
            return Err(Error::config("command timeout must be greater than zero"));
        }

        if self.max_pending == Some(0) {
            return Err(Error::config("max pending must be greater than zero"));
        }

        Ok(SessionConfig {
            url,
            command_timeout: self.command_timeout,
            max_pending: self.max_pending,
            send_init: self.send_init,
        })
    }

    /// Opens a WebSocket to the configured URL and starts a session.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no URL was set or settings are invalid
    /// - [`Error::Connection`] if the socket cannot be opened
    pub async fn connect(self) -> Result<Session> {
        let config = self.build()?;
        let url = config.url.clone().ok_or_else(|| {
            Error::config(
                "Service URL is required. Use .url() to set it.\n\
                 Example: Session::builder().url(\"ws://127.0.0.1:7777\")",
            )
        })?;

        let (sink, source) = websocket::connect(&url).await?;
        Session::start(sink, source, config, self.callbacks.unwrap_or_default()).await
    }

    /// Starts a session over an already open transport.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if settings are invalid
    /// - transport errors from sending the `init` envelope
    pub async fn open<W, R>(self, sink: W, source: R) -> Result<Session>
    where
        W: FrameSink,
        R: FrameSource,
    {
        let config = self.build()?;
        Session::start(sink, source, config, self.callbacks.unwrap_or_default()).await
    }
}

/// Parses and checks a WebSocket URL.
fn parse_ws_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("invalid URL {raw:?}: {e}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        scheme => Err(Error::config(format!(
            "unsupported URL scheme {scheme:?}, expected ws or wss"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
