//! Pending-call registry.
//!
//! Maps each outstanding [`CommandId`] to the channel its caller is waiting
//! on. Entries are removed exactly once, by whichever of reply, timeout,
//! cancellation or connection loss gets there first.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::CommandReply;

// ============================================================================
// Types
// ============================================================================

/// Outcome delivered to a waiting caller.
pub(crate) type CallResult = Result<CommandReply>;

/// Receiving side handed to the caller on registration.
pub(crate) type WaitHandle = oneshot::Receiver<CallResult>;

/// An outstanding command.
#[derive(Debug)]
struct PendingCall {
    /// Command name, for logs.
    command: String,
    /// Where the outcome goes.
    sink: oneshot::Sender<CallResult>,
    /// Registration time.
    created_at: Instant,
    /// When the caller stops waiting.
    deadline: Instant,
}

/// Lock-protected registry contents.
#[derive(Debug, Default)]
struct Calls {
    entries: FxHashMap<CommandId, PendingCall>,
    /// Set by [`PendingCalls::fail_all`]; no call registers afterwards.
    closed: bool,
}

// ============================================================================
// PendingCalls
// ============================================================================

/// Concurrent map of outstanding calls.
///
/// Registration happens from any number of caller tasks; resolution from the
/// single reader task. All access goes through one short-held lock.
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: Mutex<Calls>,
    max_pending: Option<usize>,
}

impl PendingCalls {
    /// Creates an empty, unbounded registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry holding at most `max_pending` calls.
    #[must_use]
    pub fn with_limit(max_pending: Option<usize>) -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            max_pending,
        }
    }

    /// Inserts a new pending call.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] once [`fail_all`](Self::fail_all) has run
    /// - [`Error::DuplicateCommandId`] if `id` is already pending
    /// - [`Error::Protocol`] if the registry is full
    pub(crate) fn register(
        &self,
        id: CommandId,
        command: &str,
        timeout: Duration,
    ) -> Result<WaitHandle> {
        let mut calls = self.calls.lock();

        if calls.closed {
            return Err(Error::ConnectionClosed);
        }

        if calls.entries.contains_key(&id) {
            return Err(Error::DuplicateCommandId { command_id: id });
        }

        if let Some(max) = self.max_pending
            && calls.entries.len() >= max
        {
            warn!(pending = calls.entries.len(), max, "Too many pending commands");
            return Err(Error::protocol(format!(
                "Too many pending commands: {}/{}",
                calls.entries.len(),
                max
            )));
        }

        let (sink, handle) = oneshot::channel();
        let created_at = Instant::now();
        calls.entries.insert(
            id,
            PendingCall {
                command: command.to_string(),
                sink,
                created_at,
                deadline: created_at + timeout,
            },
        );

        trace!(command_id = %id, command, "Registered pending command");
        Ok(handle)
    }

    /// Delivers `result` to the caller waiting on `id`.
    ///
    /// Returns `false` if nothing was waiting (late or duplicate reply); the
    /// result is dropped.
    pub(crate) fn resolve(&self, id: CommandId, result: CallResult) -> bool {
        let Some(call) = self.calls.lock().entries.remove(&id) else {
            warn!(command_id = %id, "Reply for unknown command");
            return false;
        };

        let elapsed = call.created_at.elapsed();
        if Instant::now() > call.deadline {
            debug!(command_id = %id, command = %call.command, ?elapsed, "Reply arrived after deadline");
        } else {
            trace!(command_id = %id, command = %call.command, ?elapsed, "Resolved command");
        }

        // Caller may already have given up
        let _ = call.sink.send(result);
        true
    }

    /// Removes `id` if it is still pending.
    ///
    /// Dropping the entry closes the caller's channel. Returns whether an
    /// entry was removed; `false` means a reply won the race.
    pub(crate) fn evict(&self, id: CommandId) -> bool {
        match self.calls.lock().entries.remove(&id) {
            Some(call) => {
                debug!(command_id = %id, command = %call.command, "Evicted pending command");
                true
            }
            None => false,
        }
    }

    /// Fails every pending call with the error produced by `make_error` and
    /// closes the registry to new calls.
    ///
    /// Returns the number of calls failed.
    pub(crate) fn fail_all(&self, make_error: impl Fn() -> Error) -> usize {
        let drained: Vec<_> = {
            let mut calls = self.calls.lock();
            calls.closed = true;
            calls.entries.drain().collect()
        };
        let count = drained.len();

        for (_, call) in drained {
            let _ = call.sink.send(Err(make_error()));
        }

        if count > 0 {
            debug!(count, "Failed pending commands");
        }
        count
    }

    /// Returns the number of pending calls.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().entries.len()
    }

    /// Returns `true` if no calls are pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().entries.is_empty()
    }

    /// Returns `true` if `id` is pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: CommandId) -> bool {
        self.calls.lock().entries.contains_key(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn reply(data: i64) -> CommandReply {
        CommandReply {
            success: true,
            data: data.into(),
            msg: String::new(),
        }
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let registry = PendingCalls::new();
        let id = CommandId::generate();

        let handle = registry.register(id, "getMyInfo", TIMEOUT).expect("register");
        assert!(registry.contains(id));

        assert!(registry.resolve(id, Ok(reply(1))));
        assert!(registry.is_empty());

        let delivered = handle.await.expect("delivered").expect("ok");
        assert_eq!(delivered.data, 1);
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let registry = PendingCalls::new();
        let id = CommandId::generate();

        let _handle = assert_ok!(registry.register(id, "a", TIMEOUT));
        let err = assert_err!(registry.register(id, "b", TIMEOUT));
        assert!(matches!(err, Error::DuplicateCommandId { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_is_dropped() {
        let registry = PendingCalls::new();
        assert!(!registry.resolve(CommandId::generate(), Ok(reply(1))));
    }

    #[test]
    fn test_resolve_once() {
        let registry = PendingCalls::new();
        let id = CommandId::generate();
        let _handle = registry.register(id, "a", TIMEOUT).expect("register");

        assert!(registry.resolve(id, Ok(reply(1))));
        assert!(!registry.resolve(id, Ok(reply(2))));
    }

    #[tokio::test]
    async fn test_evict_closes_handle() {
        let registry = PendingCalls::new();
        let id = CommandId::generate();
        let handle = registry.register(id, "a", TIMEOUT).expect("register");

        assert!(registry.evict(id));
        assert!(!registry.evict(id));
        assert!(handle.await.is_err());
    }

    #[test]
    fn test_evict_after_resolve_reports_race() {
        let registry = PendingCalls::new();
        let id = CommandId::generate();
        let mut handle = registry.register(id, "a", TIMEOUT).expect("register");

        registry.resolve(id, Ok(reply(7)));
        assert!(!registry.evict(id));

        let delivered = handle.try_recv().expect("reply waiting").expect("ok");
        assert_eq!(delivered.data, 7);
    }

    #[tokio::test]
    async fn test_fail_all() {
        let registry = PendingCalls::new();
        let a = registry
            .register(CommandId::generate(), "a", TIMEOUT)
            .expect("register");
        let b = registry
            .register(CommandId::generate(), "b", TIMEOUT)
            .expect("register");

        assert_eq!(registry.fail_all(|| Error::ConnectionClosed), 2);
        assert!(registry.is_empty());

        assert!(matches!(a.await.expect("sent"), Err(Error::ConnectionClosed)));
        assert!(matches!(b.await.expect("sent"), Err(Error::ConnectionClosed)));
    }

    #[test]
    fn test_register_after_fail_all_rejected() {
        let registry = PendingCalls::new();
        assert_eq!(registry.fail_all(|| Error::ConnectionClosed), 0);

        let err = assert_err!(registry.register(CommandId::generate(), "getMyInfo", TIMEOUT));
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_limit() {
        let registry = PendingCalls::with_limit(Some(1));
        let _a = registry
            .register(CommandId::generate(), "a", TIMEOUT)
            .expect("register");
        let err = assert_err!(registry.register(CommandId::generate(), "b", TIMEOUT));
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
