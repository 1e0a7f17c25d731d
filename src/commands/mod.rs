//! Typed command wrappers.
//!
//! Thin `impl Session` blocks over [`Session::invoke`] and [`Session::call`].
//! Each fixes a command name and payload shape and decodes the reply.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `login` | Instance lifecycle, login methods, account data |
//! | `message` | Sending messages, fetching media |
//! | `contact` | Contact lookup and friend requests |
//! | `room` | Chatroom membership and settings |
//!
//! # Example
//!
//! ```no_run
//! use padchat_client::{SendMsgRequest, Session};
//!
//! # async fn example(session: Session) -> padchat_client::Result<()> {
//! let me = session.get_my_info().await?;
//! session
//!     .send_msg(SendMsgRequest::text("filehelper", format!("logged in as {}", me.user_name)))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Session::invoke`]: crate::Session::invoke
//! [`Session::call`]: crate::Session::call

// ============================================================================
// Submodules
// ============================================================================

mod contact;
mod login;
mod message;
mod room;

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use std::future::Future;

    use serde_json::{Value, json};

    use crate::session::Session;
    use crate::transport::memory;

    /// A successful generic reply carrying `data`.
    pub(crate) fn ok(data: Value) -> Value {
        json!({ "success": true, "data": data, "msg": "" })
    }

    /// Runs `call` on a fresh session, answers its one command with
    /// `reply`, and returns the call's output with the envelope it sent.
    pub(crate) async fn exchange<F, Fut, T>(call: F, reply: Value) -> (T, Value)
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (sink, source, mut remote) = memory::pair();
        let session = Session::builder()
            .no_init()
            .open(sink, source)
            .await
            .expect("session");

        let task = tokio::spawn(call(session));
        let envelope = remote.next_envelope().await.expect("envelope");
        remote.reply(&envelope, reply);

        (task.await.expect("task"), envelope)
    }
}
