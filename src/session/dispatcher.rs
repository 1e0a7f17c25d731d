//! Inbound dispatcher.
//!
//! A single sequential loop per session reads frames in arrival order and
//! routes each one:
//!
//! - `cmdRet` → [`PendingCalls::resolve`]
//! - `userEvent` → [`CallbackTable::dispatch`], one blocking-pool task per
//!   event or push item
//! - anything else → logged and dropped
//!
//! A bad frame never stops the loop. Only a transport read failure or a
//! clean close does, after which every pending call fails with
//! [`Error::ConnectionClosed`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::error::Error;
use crate::protocol::{
    CommandReply, Event, FrameKind, PushItem, ServerFrame, UserEvent,
};
use crate::transport::FrameSource;

use super::callbacks::CallbackTable;
use super::registry::PendingCalls;
use super::state::StateCell;

// ============================================================================
// Dispatcher
// ============================================================================

/// Reader loop state. Owns the read half of the transport.
pub(crate) struct Dispatcher {
    source: Box<dyn FrameSource>,
    pending: Arc<PendingCalls>,
    callbacks: Arc<CallbackTable>,
    state: Arc<StateCell>,
}

impl Dispatcher {
    pub(crate) fn new(
        source: Box<dyn FrameSource>,
        pending: Arc<PendingCalls>,
        callbacks: Arc<CallbackTable>,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            source,
            pending,
            callbacks,
            state,
        }
    }

    /// Runs until the transport closes or fails.
    pub(crate) async fn run(mut self) {
        loop {
            match self.source.receive().await {
                Ok(Some(text)) => self.handle_frame(&text),

                Ok(None) => {
                    info!("Connection closed by remote");
                    break;
                }

                Err(e) => {
                    error!(error = %e, "Transport read failed");
                    break;
                }
            }
        }

        self.state.close();
        self.pending.fail_all(|| Error::ConnectionClosed);

        debug!("Dispatcher terminated");
    }

    /// Classifies and routes one frame.
    fn handle_frame(&self, text: &str) {
        trace!(len = text.len(), "Frame received");

        let frame = match ServerFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming frame");
                return;
            }
        };

        match frame.kind() {
            FrameKind::CommandReply => self.handle_reply(frame),
            FrameKind::UserEvent => self.handle_event(&frame),
            FrameKind::Other => {
                warn!(
                    frame_type = %frame.frame_type,
                    event = %frame.event,
                    "Unhandled frame type"
                );
            }
        }
    }

    /// Resolves the pending call a `cmdRet` frame answers.
    fn handle_reply(&self, frame: ServerFrame) {
        let Some(id) = frame.command_id() else {
            warn!(cmd_id = %frame.cmd_id, "Reply with malformed command id");
            return;
        };

        let result = CommandReply::from_value(frame.data);
        if let Err(e) = &result {
            warn!(command_id = %id, error = %e, "Undecodable command reply");
        }
        self.pending.resolve(id, result);
    }

    /// Routes a `userEvent` frame to its callback slot.
    fn handle_event(&self, frame: &ServerFrame) {
        let event = match frame.user_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(event = %frame.event, error = %e, "Dropping undecodable event");
                return;
            }
        };

        match event {
            UserEvent::QrCode(qr) => self.deliver(Event::QrCode(qr)),
            UserEvent::Scan(scan) => self.deliver(Event::Scan(scan)),
            UserEvent::Login => self.deliver(Event::Login),
            UserEvent::Loaded => self.deliver(Event::Loaded),
            UserEvent::Push(items) => self.handle_push(items),
            UserEvent::Unknown(name) => {
                warn!(event = %name, data = %frame.data, "Unhandled event");
            }
        }
    }

    /// Decodes each push item independently and delivers it.
    fn handle_push(&self, items: Vec<serde_json::Value>) {
        trace!(count = items.len(), "Push received");

        for item in items {
            match PushItem::decode(item) {
                Ok(PushItem::Message(message)) => self.deliver(Event::Message(Box::new(message))),
                Ok(PushItem::ContactSync(contact)) => {
                    self.deliver(Event::ContactSync(Box::new(contact)));
                }
                Ok(PushItem::Ignored(msg_type)) => {
                    trace!(msg_type, "Ignoring push item");
                }
                Ok(PushItem::Unknown(raw)) => {
                    warn!(item = %raw, "Unknown push item");
                }
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable push item");
                }
            }
        }
    }

    /// Hands an event to its slot without waiting for the handler.
    fn deliver(&self, event: Event) {
        let kind = event.kind();
        if self.callbacks.dispatch(event).is_none() {
            trace!(event = %kind, "No handler registered");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
