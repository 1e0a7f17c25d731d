//! Session lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle of a session.
///
/// `Connecting → HandshakeSent → Ready → Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Transport is being opened.
    Connecting = 0,
    /// `init` envelope written, reader not yet running.
    HandshakeSent = 1,
    /// Reader running; commands and events flow.
    Ready = 2,
    /// Transport gone or session closed.
    Closed = 3,
}

impl SessionState {
    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::HandshakeSent,
            2 => Self::Ready,
            _ => Self::Closed,
        }
    }

    /// Returns `true` for the terminal state.
    #[inline]
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::HandshakeSent => "handshake-sent",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// StateCell
// ============================================================================

/// Shared, lock-free holder for a [`SessionState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves forward to `next` unless already closed.
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != SessionState::Closed as u8).then_some(next as u8)
            })
            .is_ok()
    }

    /// Moves to `Closed`. Returns the previous state.
    pub(crate) fn close(&self) -> SessionState {
        SessionState::from_u8(self.0.swap(SessionState::Closed as u8, Ordering::AcqRel))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let cell = StateCell::new(SessionState::Connecting);
        assert!(cell.advance(SessionState::HandshakeSent));
        assert!(cell.advance(SessionState::Ready));
        assert_eq!(cell.get(), SessionState::Ready);

        assert_eq!(cell.close(), SessionState::Ready);
        assert!(cell.get().is_closed());
    }

    #[test]
    fn test_closed_is_terminal() {
        let cell = StateCell::new(SessionState::Connecting);
        cell.close();
        assert!(!cell.advance(SessionState::Ready));
        assert_eq!(cell.get(), SessionState::Closed);
        assert_eq!(cell.close(), SessionState::Closed);
    }
}
