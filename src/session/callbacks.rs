//! Per-session callback table.
//!
//! One replaceable slot per [`EventKind`]. Empty slots behave as no-ops.
//! Handlers are snapshotted under a read lock and invoked with no lock
//! held, so a slow handler never blocks `set` or `fire` on any slot.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::protocol::{Event, EventKind};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called with each event delivered to the slot it is registered on.
pub type EventHandler = Arc<dyn Fn(Event) + Send + Sync>;

/// Number of slots, one per [`EventKind`].
const SLOT_COUNT: usize = EventKind::ALL.len();

// ============================================================================
// CallbackTable
// ============================================================================

/// Named handler slots for unsolicited events.
pub struct CallbackTable {
    slots: [RwLock<Option<EventHandler>>; SLOT_COUNT],
}

impl Default for CallbackTable {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| RwLock::new(None)),
        }
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<_> = EventKind::ALL
            .iter()
            .filter(|kind| self.slots[kind.index()].read().is_some())
            .collect();
        f.debug_struct("CallbackTable")
            .field("registered", &registered)
            .finish()
    }
}

impl CallbackTable {
    /// Creates a table with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the handler in `kind`'s slot.
    ///
    /// Only events dispatched after this call see the new handler.
    pub fn set(&self, kind: EventKind, handler: EventHandler) {
        *self.slots[kind.index()].write() = Some(handler);
        trace!(event = %kind, "Handler set");
    }

    /// Resets `kind`'s slot to a no-op.
    pub fn clear(&self, kind: EventKind) {
        *self.slots[kind.index()].write() = None;
    }

    /// Returns the handler currently in `kind`'s slot.
    #[must_use]
    pub fn handler(&self, kind: EventKind) -> Option<EventHandler> {
        self.slots[kind.index()].read().clone()
    }

    /// Invokes the current handler for `event` on the calling thread.
    ///
    /// Returns `false` if the slot was empty.
    pub fn fire(&self, event: Event) -> bool {
        match self.handler(event.kind()) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Snapshots the current handler for `event` and runs it on the
    /// blocking pool.
    ///
    /// Returns `None` if the slot was empty. Handlers for different events
    /// may complete in any order.
    pub fn dispatch(&self, event: Event) -> Option<JoinHandle<()>> {
        let kind = event.kind();
        let handler = self.handler(kind)?;

        trace!(event = %kind, "Dispatching event");
        Some(tokio::task::spawn_blocking(move || {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(event = %kind, "Event handler panicked");
            }
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
