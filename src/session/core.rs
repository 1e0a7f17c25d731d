//! Session handle and command invoker.
//!
//! A [`Session`] owns one transport, one [`PendingCalls`] registry, one
//! [`CallbackTable`] and the reader task. Cloning a session is cheap and all
//! clones share that state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::{
    CommandReply, Contact, Envelope, Event, EventKind, Message, QrCode, ScanStatus,
};
use crate::transport::{FrameSink, FrameSource};

use super::callbacks::CallbackTable;
use super::config::{SessionBuilder, SessionConfig};
use super::dispatcher::Dispatcher;
use super::registry::{PendingCalls, WaitHandle};
use super::state::{SessionState, StateCell};

// ============================================================================
// Types
// ============================================================================

/// Shared state behind every [`Session`] clone.
struct SessionInner {
    /// Write half, taken on close; the lock keeps frames from interleaving.
    writer: AsyncMutex<Option<Box<dyn FrameSink>>>,
    /// Outstanding commands (shared with the reader).
    pending: Arc<PendingCalls>,
    /// Event handlers (shared with the reader).
    callbacks: Arc<CallbackTable>,
    /// Lifecycle state (shared with the reader).
    state: Arc<StateCell>,
    /// Settings the session was opened with.
    config: SessionConfig,
    /// Reader task, taken on close.
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.abort();
        }
    }
}

/// Which side of the reply/timeout/cancel race finished first.
enum Outcome {
    Reply(std::result::Result<Result<CommandReply>, tokio::sync::oneshot::error::RecvError>),
    TimedOut,
    Cancelled,
}

// ============================================================================
// Session
// ============================================================================

/// A connection to the automation service.
///
/// # Example
///
/// ```no_run
/// use padchat_client::Session;
///
/// # async fn example() -> padchat_client::Result<()> {
/// let session = Session::builder().url("ws://127.0.0.1:7777").connect().await?;
///
/// session.on_qrcode(|qr| println!("scan: {}", qr.url));
/// session.on_message(|msg| println!("{}: {}", msg.from_user, msg.content));
///
/// session.qr_login().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .field("url", &self.inner.config.url.as_ref().map(|u| u.as_str()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructor
// ============================================================================

impl Session {
    /// Creates a new session builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Starts a session over an already open transport.
    ///
    /// Equivalent to [`SessionBuilder::open`] with a fresh callback table.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the `init` envelope cannot be sent.
    pub async fn with_transport<W, R>(sink: W, source: R, config: SessionConfig) -> Result<Self>
    where
        W: FrameSink,
        R: FrameSource,
    {
        Self::start(sink, source, config, Arc::default()).await
    }

    /// Runs the handshake and starts the reader task.
    pub(crate) async fn start<W, R>(
        sink: W,
        source: R,
        config: SessionConfig,
        callbacks: Arc<CallbackTable>,
    ) -> Result<Self>
    where
        W: FrameSink,
        R: FrameSource,
    {
        let state = Arc::new(StateCell::new(SessionState::Connecting));
        let mut writer: Box<dyn FrameSink> = Box::new(sink);

        if config.send_init {
            let init = Envelope::init();
            writer.send(init.to_text()?).await?;
            debug!(command_id = %init.cmd_id, "Init envelope sent");
        }
        state.advance(SessionState::HandshakeSent);

        let pending = Arc::new(PendingCalls::with_limit(config.max_pending));
        let dispatcher = Dispatcher::new(
            Box::new(source),
            Arc::clone(&pending),
            Arc::clone(&callbacks),
            Arc::clone(&state),
        );

        state.advance(SessionState::Ready);
        let reader = tokio::spawn(dispatcher.run());

        info!(
            timeout_ms = config.command_timeout.as_millis() as u64,
            "Session ready"
        );

        Ok(Self {
            inner: Arc::new(SessionInner {
                writer: AsyncMutex::new(Some(writer)),
                pending,
                callbacks,
                state,
                config,
                reader: parking_lot::Mutex::new(Some(reader)),
            }),
        })
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.get()
    }

    /// Returns `true` while commands and events flow.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Returns the number of outstanding commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Returns the default per-command timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        self.inner.config.command_timeout
    }

    /// Returns the settings this session was opened with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

// ============================================================================
// Session - Invoke
// ============================================================================

impl Session {
    /// Sends a command and returns the reply data.
    ///
    /// Uses the session's default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`] if the session is not `Ready`
    /// - [`Error::RequestTimeout`] if no reply arrives in time
    /// - [`Error::Application`] if the service replies `success=false`
    /// - [`Error::ConnectionClosed`] / [`Error::Connection`] on transport loss
    pub async fn invoke(&self, command: &str, payload: impl Serialize) -> Result<Value> {
        self.invoke_with_timeout(command, payload, self.command_timeout())
            .await
    }

    /// Sends a command with a custom timeout and returns the reply data.
    ///
    /// # Errors
    ///
    /// See [`Session::invoke`].
    pub async fn invoke_with_timeout(
        &self,
        command: &str,
        payload: impl Serialize,
        timeout: Duration,
    ) -> Result<Value> {
        let payload = serde_json::to_value(payload)?;
        self.execute(command, payload, timeout, None)
            .await?
            .into_result(command)
    }

    /// Sends a command that the caller may abandon through `cancel`.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] once `cancel` fires, otherwise see
    /// [`Session::invoke`].
    pub async fn invoke_with_cancel(
        &self,
        command: &str,
        payload: impl Serialize,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let payload = serde_json::to_value(payload)?;
        self.execute(command, payload, timeout, Some(cancel))
            .await?
            .into_result(command)
    }

    /// Sends a command and returns the generic reply as-is.
    ///
    /// `success=false` is not turned into an error.
    ///
    /// # Errors
    ///
    /// Transport, timeout and readiness errors as for [`Session::invoke`].
    pub async fn invoke_raw(&self, command: &str, payload: impl Serialize) -> Result<CommandReply> {
        let payload = serde_json::to_value(payload)?;
        self.execute(command, payload, self.command_timeout(), None)
            .await
    }

    /// Sends a command and decodes the reply data into `T`.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if the data does not match `T`, otherwise see
    /// [`Session::invoke`].
    pub async fn call<T: DeserializeOwned>(
        &self,
        command: &str,
        payload: impl Serialize,
    ) -> Result<T> {
        let payload = serde_json::to_value(payload)?;
        self.execute(command, payload, self.command_timeout(), None)
            .await?
            .decode(command)
    }

    /// Registers, sends and waits for one command.
    async fn execute(
        &self,
        command: &str,
        payload: Value,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<CommandReply> {
        let state = self.state();
        if state != SessionState::Ready {
            return Err(Error::not_ready(state));
        }

        let envelope = Envelope::new(command, payload);
        let id = envelope.cmd_id;
        let text = envelope.to_text()?;

        let mut handle = self.inner.pending.register(id, command, timeout)?;

        let sent = match self.inner.writer.lock().await.as_mut() {
            Some(writer) => writer.send(text).await,
            None => Err(Error::ConnectionClosed),
        };
        if let Err(e) = sent {
            self.inner.pending.evict(id);
            warn!(command_id = %id, command, error = %e, "Command send failed");
            self.shutdown_transport().await;
            return Err(e);
        }
        trace!(command_id = %id, command, "Command sent");

        let outcome = tokio::select! {
            result = &mut handle => Outcome::Reply(result),
            () = sleep(timeout) => Outcome::TimedOut,
            () = wait_cancelled(cancel) => Outcome::Cancelled,
        };

        match outcome {
            Outcome::Reply(Ok(result)) => result,
            // Sender dropped without a result: the entry was torn down
            Outcome::Reply(Err(_)) => Err(Error::ConnectionClosed),
            Outcome::TimedOut => self.settle(id, handle, || {
                debug!(command_id = %id, command, "Command timed out");
                Error::request_timeout(command, id, timeout.as_millis() as u64)
            }),
            Outcome::Cancelled => self.settle(id, handle, || {
                debug!(command_id = %id, command, "Command cancelled");
                Error::Cancelled { command_id: id }
            }),
        }
    }

    /// Removes a call that lost the race to a timeout or cancellation.
    ///
    /// If the reader resolved it in the meantime, that result wins.
    fn settle(
        &self,
        id: CommandId,
        mut handle: WaitHandle,
        make_error: impl FnOnce() -> Error,
    ) -> Result<CommandReply> {
        if self.inner.pending.evict(id) {
            return Err(make_error());
        }
        match handle.try_recv() {
            Ok(result) => result,
            Err(_) => Err(make_error()),
        }
    }
}

/// Resolves when `cancel` fires, never if there is no token.
async fn wait_cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Session - Events
// ============================================================================

impl Session {
    /// Replaces the handler for one event category.
    ///
    /// Events already dispatched keep the handler they were dispatched to.
    /// Handlers run on the blocking pool and may block.
    pub fn on_event<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.inner.callbacks.set(kind, Arc::new(handler));
    }

    /// Resets one event category to a no-op.
    pub fn clear_event(&self, kind: EventKind) {
        self.inner.callbacks.clear(kind);
    }

    /// Sets the login QR code handler.
    pub fn on_qrcode<F>(&self, handler: F)
    where
        F: Fn(QrCode) + Send + Sync + 'static,
    {
        self.on_event(EventKind::QrCode, move |event| {
            if let Event::QrCode(qr) = event {
                handler(qr);
            }
        });
    }

    /// Sets the scan status handler.
    pub fn on_scan<F>(&self, handler: F)
    where
        F: Fn(ScanStatus) + Send + Sync + 'static,
    {
        self.on_event(EventKind::Scan, move |event| {
            if let Event::Scan(scan) = event {
                handler(scan);
            }
        });
    }

    /// Sets the login handler.
    pub fn on_login<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_event(EventKind::Login, move |_| handler());
    }

    /// Sets the data-loaded handler.
    pub fn on_loaded<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_event(EventKind::Loaded, move |_| handler());
    }

    /// Sets the chat message handler.
    ///
    /// Messages from one push may reach the handler in any order.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.on_event(EventKind::Message, move |event| {
            if let Event::Message(message) = event {
                handler(*message);
            }
        });
    }

    /// Sets the contact synchronization handler.
    pub fn on_contact_sync<F>(&self, handler: F)
    where
        F: Fn(Contact) + Send + Sync + 'static,
    {
        self.on_event(EventKind::ContactSync, move |event| {
            if let Event::ContactSync(contact) = event {
                handler(*contact);
            }
        });
    }
}

// ============================================================================
// Session - Shutdown
// ============================================================================

impl Session {
    /// Closes the session.
    ///
    /// Stops the reader, fails every outstanding command with
    /// [`Error::ConnectionClosed`] and closes the transport. After the remote
    /// side hung up this still releases the write half. Closing twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if closing the write half fails.
    pub async fn close(&self) -> Result<()> {
        let previous = self.inner.state.close();
        self.stop_reader();
        self.inner.pending.fail_all(|| Error::ConnectionClosed);

        let Some(mut writer) = self.take_writer().await else {
            return Ok(());
        };
        let result = writer.close().await;

        if previous.is_closed() {
            debug!("Write half released after connection loss");
        } else {
            info!("Session closed");
        }
        result
    }

    /// Tears the session down after a failed write.
    async fn shutdown_transport(&self) {
        self.inner.state.close();
        self.stop_reader();
        self.inner.pending.fail_all(|| Error::ConnectionClosed);

        if let Some(mut writer) = self.take_writer().await
            && let Err(e) = writer.close().await
        {
            debug!(error = %e, "Failed to close transport after send error");
        }
    }

    async fn take_writer(&self) -> Option<Box<dyn FrameSink>> {
        self.inner.writer.lock().await.take()
    }

    fn stop_reader(&self) {
        if let Some(reader) = self.inner.reader.lock().take() {
            reader.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::protocol::MyInfo;
    use crate::transport::memory::{self, RemoteEnd};

    async fn open() -> (Session, RemoteEnd) {
        let (sink, source, remote) = memory::pair();
        let session = Session::builder()
            .no_init()
            .open(sink, source)
            .await
            .expect("session");
        (session, remote)
    }

    fn ok(data: Value) -> Value {
        json!({ "success": true, "data": data, "msg": "" })
    }

    #[tokio::test]
    async fn test_init_envelope_sent_on_open() {
        let (sink, source, mut remote) = memory::pair();
        let session = Session::builder().open(sink, source).await.expect("session");

        let init = remote.next_envelope().await.expect("init");
        assert_eq!(init["type"], "user");
        assert_eq!(init["cmd"], "init");
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_get_my_info_roundtrip() {
        let (session, mut remote) = open().await;

        let call = tokio::spawn({
            let session = session.clone();
            async move { session.call::<MyInfo>("getMyInfo", ()).await }
        });

        let envelope = remote.next_envelope().await.expect("envelope");
        assert_eq!(envelope["cmd"], "getMyInfo");
        assert!(envelope["data"].is_null());
        remote.reply(&envelope, ok(json!({ "userName": "abc", "uin": 42 })));

        let info = call.await.expect("task").expect("reply");
        assert_eq!(info.user_name, "abc");
        assert_eq!(info.uin, 42);
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_service_is_silent() {
        let (session, mut remote) = open().await;
        let started = tokio::time::Instant::now();

        let call = tokio::spawn({
            let session = session.clone();
            async move {
                session
                    .invoke_with_timeout("getMyInfo", (), Duration::from_secs(2))
                    .await
            }
        });

        let _envelope = remote.next_envelope().await.expect("envelope");
        let result = call.await.expect("task");

        match result {
            Err(Error::RequestTimeout {
                command,
                timeout_ms,
                ..
            }) => {
                assert_eq!(command, "getMyInfo");
                assert_eq!(timeout_ms, 2000);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(session.pending_count(), 0);
        assert!(session.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_dropped() {
        let (session, mut remote) = open().await;

        let result = {
            let session = session.clone();
            let call = tokio::spawn(async move {
                session
                    .invoke_with_timeout("syncMsg", (), Duration::from_millis(100))
                    .await
            });
            let envelope = remote.next_envelope().await.expect("envelope");
            let result = call.await.expect("task");
            remote.reply(&envelope, ok(Value::Null));
            result
        };
        assert!(result.is_err_and(|e| e.is_timeout()));

        // Session still serves new calls
        let call = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("syncMsg", ()).await }
        });
        let envelope = remote.next_envelope().await.expect("envelope");
        remote.reply(&envelope, ok(json!(true)));
        assert_eq!(call.await.expect("task").expect("reply"), json!(true));
    }

    #[tokio::test]
    async fn test_application_error() {
        let (session, mut remote) = open().await;

        let call = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("getWxData", ()).await }
        });
        let envelope = remote.next_envelope().await.expect("envelope");
        remote.reply(&envelope, json!({ "success": false, "msg": "not logged in" }));

        match call.await.expect("task") {
            Err(Error::Application { message, .. }) => assert_eq!(message, "not logged in"),
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_raw_keeps_failure_reply() {
        let (session, mut remote) = open().await;

        let call = tokio::spawn({
            let session = session.clone();
            async move { session.invoke_raw("logout", ()).await }
        });
        let envelope = remote.next_envelope().await.expect("envelope");
        remote.reply(&envelope, json!({ "success": false, "msg": "already" }));

        let reply = call.await.expect("task").expect("reply");
        assert!(!reply.success);
        assert_eq!(reply.msg, "already");
    }

    #[tokio::test]
    async fn test_concurrent_calls_get_their_own_replies() {
        let (session, mut remote) = open().await;

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("getContact", json!({ "userId": "a" })).await }
        });
        let a = remote.next_envelope().await.expect("envelope");

        let second = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("getContact", json!({ "userId": "b" })).await }
        });
        let b = remote.next_envelope().await.expect("envelope");

        remote.reply(&b, ok(json!({ "user_name": "b" })));
        remote.reply(&a, ok(json!({ "user_name": "a" })));

        assert_eq!(first.await.expect("task").expect("reply")["user_name"], "a");
        assert_eq!(second.await.expect("task").expect("reply")["user_name"], "b");
    }

    #[tokio::test]
    async fn test_send_failure_closes_session() {
        let (session, mut remote) = open().await;
        remote.stop_reading();

        let result = session.invoke("syncContact", ()).await;
        assert!(result.is_err_and(|e| e.is_connection_error()));
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_disconnect_fails_outstanding_call() {
        let (session, mut remote) = open().await;

        let call = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("syncContact", ()).await }
        });
        let _envelope = remote.next_envelope().await.expect("envelope");
        remote.disconnect();

        assert!(matches!(
            call.await.expect("task"),
            Err(Error::ConnectionClosed)
        ));
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_not_ready_after_close() {
        let (session, _remote) = open().await;
        session.close().await.expect("close");
        session.close().await.expect("second close is a no-op");

        let result = session.invoke("getMyInfo", ()).await;
        assert!(matches!(
            result,
            Err(Error::NotReady {
                state: SessionState::Closed
            })
        ));
    }

    #[tokio::test]
    async fn test_close_after_remote_hangup_releases_writer() {
        let (session, mut remote) = open().await;
        remote.disconnect();
        while session.state() != SessionState::Closed {
            tokio::task::yield_now().await;
        }

        session.close().await.expect("close");

        let next = tokio::time::timeout(Duration::from_secs(5), remote.next_frame())
            .await
            .expect("write half released");
        assert_eq!(next, None);
    }

    #[tokio::test]
    async fn test_close_fails_outstanding_call() {
        let (session, mut remote) = open().await;

        let call = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("logout", ()).await }
        });
        let _envelope = remote.next_envelope().await.expect("envelope");
        session.close().await.expect("close");

        assert!(matches!(
            call.await.expect("task"),
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_cancel_before_reply() {
        let (session, mut remote) = open().await;
        let cancel = CancellationToken::new();

        let call = tokio::spawn({
            let session = session.clone();
            let cancel = cancel.clone();
            async move {
                session
                    .invoke_with_cancel("snsTimeline", (), Duration::from_secs(60), &cancel)
                    .await
            }
        });
        let _envelope = remote.next_envelope().await.expect("envelope");
        cancel.cancel();

        assert!(matches!(
            call.await.expect("task"),
            Err(Error::Cancelled { .. })
        ));
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_message_handler_via_session() {
        let (session, remote) = open().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        session.on_message(move |msg| {
            let _ = tx.send(msg);
        });
        session.on_contact_sync(|_| panic!("no contact expected"));

        remote.event(
            "push",
            json!({ "list": [
                { "msg_type": 5, "from_user": "wxid_a", "content": "hello" },
                { "msg_type": 2048 }
            ]}),
        );

        let msg = rx.recv().await.expect("message");
        assert_eq!(msg.from_user, "wxid_a");
        assert_eq!(msg.content, "hello");
    }

    #[tokio::test]
    async fn test_qrcode_and_login_handlers() {
        let (session, remote) = open().await;
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let qr_tx = tx.clone();
        session.on_qrcode(move |qr| {
            let _ = qr_tx.send(qr.url);
        });
        session.on_login(move || {
            let _ = tx.send("login".into());
        });

        remote.event("qrcode", json!({ "url": "http://qr/1" }));
        assert_eq!(rx.recv().await.expect("qr"), "http://qr/1");

        remote.event("login", Value::Null);
        assert_eq!(rx.recv().await.expect("login"), "login");
    }

    #[tokio::test]
    async fn test_max_pending() {
        let (sink, source, mut remote) = memory::pair();
        let session = Session::builder()
            .no_init()
            .max_pending(1)
            .open(sink, source)
            .await
            .expect("session");

        let _held = tokio::spawn({
            let session = session.clone();
            async move { session.invoke("syncContact", ()).await }
        });
        let _envelope = remote.next_envelope().await.expect("envelope");

        let result = session.invoke("syncMsg", ()).await;
        assert!(matches!(result, Err(Error::Protocol { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_replies_route_by_id(order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            runtime.block_on(async {
                let (session, mut remote) = open().await;

                let mut calls = Vec::new();
                let mut envelopes = Vec::new();
                for n in 0..order.len() {
                    let session = session.clone();
                    calls.push(tokio::spawn(async move {
                        session.invoke("echo", json!({ "n": n })).await
                    }));
                    envelopes.push(remote.next_envelope().await.expect("envelope"));
                }

                for &i in &order {
                    let envelope = &envelopes[i];
                    remote.reply(envelope, ok(envelope["data"]["n"].clone()));
                }

                for (n, call) in calls.into_iter().enumerate() {
                    let reply = call.await.expect("task").expect("reply");
                    assert_eq!(reply, json!(n));
                }
                assert_eq!(session.pending_count(), 0);
            });
        }
    }
}
