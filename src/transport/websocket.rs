//! WebSocket client transport.
//!
//! Opens a connection with `tokio-tungstenite` and splits it into a
//! [`WsSink`] and a [`WsSource`].

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace};
use url::Url;

use crate::error::{Error, Result};

use super::{FrameSink, FrameSource};

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connect
// ============================================================================

/// Opens a WebSocket connection to `url`.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the TCP connect or the WebSocket
/// handshake fails.
pub async fn connect(url: &Url) -> Result<(WsSink, WsSource)> {
    debug!(url = %url, "Opening WebSocket");

    let (stream, response) = connect_async(url.as_str())
        .await
        .map_err(|e| Error::connection(format!("WebSocket connect to {url} failed: {e}")))?;

    info!(url = %url, status = %response.status(), "WebSocket connection established");

    let (write, read) = stream.split();
    Ok((WsSink { inner: write }, WsSource { inner: read }))
}

// ============================================================================
// WsSink
// ============================================================================

/// Write half of a WebSocket connection.
pub struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<()> {
        trace!(len = frame.len(), "Sending frame");
        self.inner.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

// ============================================================================
// WsSource
// ============================================================================

/// Read half of a WebSocket connection.
pub struct WsSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn receive(&mut self) -> Result<Option<String>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),

                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(e) => {
                        debug!(error = %e, "Skipping non UTF-8 binary frame");
                    }
                },

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return Ok(None);
                }

                Some(Err(e)) => return Err(Error::WebSocket(e)),

                None => {
                    debug!("WebSocket stream ended");
                    return Ok(None);
                }

                // Ignore Ping, Pong, raw frames
                Some(Ok(_)) => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
