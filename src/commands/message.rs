//! Sending messages and fetching message media.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::protocol::command::RawMsgRequest;
use crate::protocol::{MediaResponse, Message, SendMsgRequest, SendMsgResponse, mk_at_content};
use crate::session::Session;

// ============================================================================
// Session - Sending
// ============================================================================

impl Session {
    /// Sends a text message.
    ///
    /// Missing `@` markers for `at_list` are prepended to the content, see
    /// [`mk_at_content`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use padchat_client::{SendMsgRequest, Session};
    /// # async fn example(session: Session) -> padchat_client::Result<()> {
    /// let req = SendMsgRequest::text("12345@chatroom", "meeting at 3")
    ///     .with_at_list(vec!["wxid_a".into(), "wxid_b".into()]);
    /// session.send_msg(req).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_msg(&self, mut req: SendMsgRequest) -> Result<SendMsgResponse> {
        mk_at_content(&mut req);
        debug!(to = %req.to_user_name, mentions = req.at_list.len(), "Sending message");
        self.call("sendMsg", req).await
    }

    /// Sends an image message. Build the request with
    /// [`SendMsgRequest::image`].
    pub async fn send_image(&self, req: SendMsgRequest) -> Result<SendMsgResponse> {
        debug!(to = %req.to_user_name, size = req.file.len(), "Sending image");
        self.call("sendImage", req).await
    }

    /// Shares `user_id`'s contact card with `to_user_name`.
    pub async fn share_card(
        &self,
        to_user_name: &str,
        content: &str,
        user_id: &str,
    ) -> Result<SendMsgResponse> {
        self.call(
            "shareCard",
            json!({ "toUserName": to_user_name, "content": content, "userId": user_id }),
        )
        .await
    }
}

// ============================================================================
// Session - Media
// ============================================================================

impl Session {
    /// Fetches the full image for an image message (`sub_type` 3).
    pub async fn get_msg_image(&self, message: Message) -> Result<MediaResponse> {
        self.fetch_media("getMsgImage", message).await
    }

    /// Fetches the video for a video message (`sub_type` 43).
    pub async fn get_msg_video(&self, message: Message) -> Result<MediaResponse> {
        self.fetch_media("getMsgVideo", message).await
    }

    /// Fetches the audio for a voice message (`sub_type` 34).
    pub async fn get_msg_voice(&self, message: Message) -> Result<MediaResponse> {
        self.fetch_media("getMsgVoice", message).await
    }

    async fn fetch_media(&self, command: &str, message: Message) -> Result<MediaResponse> {
        debug!(command, msg_id = %message.msg_id, "Fetching message media");
        self.call(command, RawMsgRequest::new(message)).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::commands::test_support::{exchange, ok};
    use crate::protocol::{Message, SendMsgRequest};

    #[tokio::test]
    async fn test_send_msg_applies_mentions() {
        let req = SendMsgRequest::text("room@chatroom", "test")
            .with_at_list(vec!["a".into(), "b".into()]);

        let (result, envelope) = exchange(
            |s| async move { s.send_msg(req).await },
            ok(json!({ "msg_id": "99", "status": 0 })),
        )
        .await;

        assert_eq!(envelope["cmd"], "sendMsg");
        assert_eq!(envelope["data"]["toUserName"], "room@chatroom");
        assert_eq!(envelope["data"]["content"], "@@\ntest");
        assert_eq!(envelope["data"]["atList"], json!(["a", "b"]));
        assert_eq!(result.expect("sent").msg_id, "99");
    }

    #[tokio::test]
    async fn test_share_card_payload() {
        let (_, envelope) = exchange(
            |s| async move { s.share_card("wxid_to", "card", "wxid_card").await },
            ok(json!({})),
        )
        .await;

        assert_eq!(envelope["cmd"], "shareCard");
        assert_eq!(envelope["data"]["toUserName"], "wxid_to");
        assert_eq!(envelope["data"]["userId"], "wxid_card");
    }

    #[tokio::test]
    async fn test_get_msg_image_strips_inline_data() {
        let message = Message {
            data: "thumbnail".into(),
            msg_id: "123".into(),
            sub_type: 3,
            ..Default::default()
        };

        let (result, envelope) = exchange(
            |s| async move { s.get_msg_image(message).await },
            ok(json!({ "data": "cG5n", "size": 3 })),
        )
        .await;

        assert_eq!(envelope["cmd"], "getMsgImage");
        assert_eq!(envelope["data"]["rawMsgData"]["msg_id"], "123");
        assert_eq!(envelope["data"]["rawMsgData"]["data"], "");

        let media = result.expect("media");
        assert_eq!(media.size, 3);
        assert_eq!(media.bytes().expect("base64"), b"png");
    }
}
