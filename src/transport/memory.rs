//! In-process channel transport.
//!
//! [`pair`] returns the client halves plus a [`RemoteEnd`] that plays the
//! service: it sees every envelope the client writes and can inject replies
//! and events.
//!
//! # Example
//!
//! ```ignore
//! let (sink, source, mut remote) = memory::pair();
//! let session = Session::builder().no_init().open(sink, source).await?;
//!
//! let call = tokio::spawn(async move { session.invoke("getMyInfo", Value::Null).await });
//! let envelope = remote.next_envelope().await.expect("envelope");
//! remote.reply(&envelope, json!({ "success": true, "data": {} }));
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

use super::{FrameSink, FrameSource};

// ============================================================================
// Constructor
// ============================================================================

/// Creates a connected client/remote pair.
#[must_use]
pub fn pair() -> (MemorySink, MemorySource, RemoteEnd) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    (
        MemorySink {
            tx: Some(outbound_tx),
        },
        MemorySource { rx: inbound_rx },
        RemoteEnd {
            outbound: outbound_rx,
            inbound: Some(inbound_tx),
        },
    )
}

// ============================================================================
// MemorySink / MemorySource
// ============================================================================

/// Client write half. Closing it ends the remote's outbound stream.
pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: String) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Err(Error::ConnectionClosed);
        };
        tx.send(frame)
            .map_err(|_| Error::connection("remote end stopped reading"))
    }

    async fn close(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }
}

/// Client read half.
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn receive(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// The service side of an in-memory connection.
pub struct RemoteEnd {
    outbound: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<String>>,
}

impl RemoteEnd {
    /// Waits for the next frame written by the client.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Waits for the next frame written by the client, parsed as JSON.
    ///
    /// Frames that are not JSON are skipped.
    pub async fn next_envelope(&mut self) -> Option<Value> {
        while let Some(frame) = self.outbound.recv().await {
            if let Ok(value) = serde_json::from_str(&frame) {
                return Some(value);
            }
        }
        None
    }

    /// Injects a raw frame. Returns `false` once disconnected.
    pub fn send_frame(&self, frame: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(frame.into()).is_ok())
    }

    /// Injects a `cmdRet` frame answering `envelope`.
    pub fn reply(&self, envelope: &Value, reply: Value) -> bool {
        let cmd_id = envelope.get("cmdId").cloned().unwrap_or(Value::Null);
        self.send_frame(
            json!({
                "type": "cmdRet",
                "cmdId": cmd_id,
                "data": reply,
            })
            .to_string(),
        )
    }

    /// Injects a `userEvent` frame.
    pub fn event(&self, name: &str, data: Value) -> bool {
        self.send_frame(
            json!({
                "type": "userEvent",
                "event": name,
                "data": data,
            })
            .to_string(),
        )
    }

    /// Makes further client writes fail while reads keep working.
    pub fn stop_reading(&mut self) {
        self.outbound.close();
    }

    /// Closes the connection from the service side.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut sink, mut source, mut remote) = pair();

        sink.send("{\"cmd\":\"init\"}".into()).await.expect("send");
        let envelope = remote.next_envelope().await.expect("envelope");
        assert_eq!(envelope["cmd"], "init");

        assert!(remote.event("login", Value::Null));
        let frame = source.receive().await.expect("receive").expect("frame");
        assert!(frame.contains("\"event\":\"login\""));
    }

    #[tokio::test]
    async fn test_disconnect_ends_source() {
        let (_sink, mut source, mut remote) = pair();
        remote.disconnect();
        assert_eq!(source.receive().await.expect("receive"), None);
        assert!(!remote.send_frame("late"));
    }

    #[tokio::test]
    async fn test_sink_close_ends_remote_stream() {
        let (mut sink, _source, mut remote) = pair();
        sink.close().await.expect("close");

        assert_eq!(remote.next_frame().await, None);
        assert!(matches!(
            sink.send("x".into()).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_stop_reading_fails_sink() {
        let (mut sink, _source, mut remote) = pair();
        remote.stop_reading();
        let result = sink.send("x".into()).await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
