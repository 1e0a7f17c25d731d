//! Contact lookup and friend requests.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::protocol::{AddContactSource, Contact, MsgAndStatus};
use crate::session::Session;

// ============================================================================
// Session - Contacts
// ============================================================================

impl Session {
    /// Returns a contact or chatroom record.
    pub async fn get_contact(&self, user_id: &str) -> Result<Contact> {
        self.call("getContact", json!({ "userId": user_id })).await
    }

    /// Searches for an account by id or phone number.
    ///
    /// For non-friends the returned record carries the `stranger` value
    /// used by [`Session::add_contact`].
    pub async fn search_contact(&self, user_id: &str) -> Result<Contact> {
        self.call("searchContact", json!({ "userId": user_id })).await
    }

    /// Removes a friend.
    pub async fn delete_contact(&self, user_id: &str) -> Result<MsgAndStatus> {
        debug!(user_id, "Deleting contact");
        self.call("deleteContact", json!({ "userId": user_id })).await
    }

    /// Sets the remark shown for a contact.
    pub async fn set_remark(&self, user_id: &str, remark: &str) -> Result<MsgAndStatus> {
        self.call("setRemark", json!({ "userId": user_id, "remark": remark }))
            .await
    }
}

// ============================================================================
// Session - Friend Requests
// ============================================================================

impl Session {
    /// Accepts a friend request.
    pub async fn accept_user(&self, stranger: &str, ticket: &str) -> Result<MsgAndStatus> {
        debug!(stranger, "Accepting friend request");
        self.call("acceptUser", json!({ "stranger": stranger, "ticket": ticket }))
            .await
    }

    /// Sends a friend request.
    pub async fn add_contact(
        &self,
        stranger: &str,
        ticket: &str,
        content: &str,
        source: AddContactSource,
    ) -> Result<MsgAndStatus> {
        debug!(stranger, ?source, "Adding contact");
        self.call(
            "addContact",
            json!({
                "stranger": stranger,
                "ticket": ticket,
                "type": source as i64,
                "content": content,
            }),
        )
        .await
    }

    /// Greets a stranger.
    ///
    /// If they are already a friend the service answers with an automatic
    /// text message from them instead.
    pub async fn say_hello(
        &self,
        stranger: &str,
        ticket: &str,
        content: &str,
    ) -> Result<MsgAndStatus> {
        self.call(
            "sayHello",
            json!({ "stranger": stranger, "ticket": ticket, "content": content }),
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::commands::test_support::{exchange, ok};
    use crate::error::Error;
    use crate::protocol::AddContactSource;

    #[tokio::test]
    async fn test_get_contact() {
        let (result, envelope) = exchange(
            |s| async move { s.get_contact("wxid_a").await },
            ok(json!({ "user_name": "wxid_a", "nick_name": "Alice" })),
        )
        .await;

        assert_eq!(envelope["cmd"], "getContact");
        assert_eq!(envelope["data"]["userId"], "wxid_a");
        assert_eq!(result.expect("contact").nick_name, "Alice");
    }

    #[tokio::test]
    async fn test_add_contact_source_code() {
        let (result, envelope) = exchange(
            |s| async move {
                s.add_contact("v1_x", "v2_y", "hi", AddContactSource::Phone)
                    .await
            },
            ok(json!({ "message": "", "status": 0 })),
        )
        .await;

        assert_eq!(envelope["data"]["type"], 15);
        assert_eq!(envelope["data"]["stranger"], "v1_x");
        assert_eq!(result.expect("status").status, 0);
    }

    #[tokio::test]
    async fn test_contact_reply_with_wrong_shape() {
        let (result, _) = exchange(
            |s| async move { s.get_contact("wxid_a").await },
            ok(json!("not a record")),
        )
        .await;

        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
