//! Command names and payload shapes.
//!
//! The core only needs a command name and an opaque payload; these types
//! give the typed wrappers in [`crate::commands`] something concrete to
//! serialize and decode.
//!
//! # Command Groups
//!
//! | Group | Commands |
//! |-------|----------|
//! | Lifecycle | `init`, `close`, `login`, `logout`, `getWxData`, `getLoginToken`, `getMyInfo`, `syncMsg`, `syncContact` |
//! | Message | `sendMsg`, `sendImage`, `shareCard`, `getMsgImage`, `getMsgVideo`, `getMsgVoice` |
//! | Contact | `getContact`, `searchContact`, `deleteContact`, `acceptUser`, `addContact`, `sayHello`, `setRemark` |
//! | Room | `getRoomMembers`, `createRoom`, `addRoomMember`, `inviteRoomMember`, `deleteRoomMember`, `setRoomAnnouncement`, `setRoomName`, `quitRoom` |

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::event::Message;
use super::null_as_default;

// ============================================================================
// Login
// ============================================================================

/// Login method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    /// Scan a QR code with the phone.
    #[default]
    Qrcode,
    /// Re-login confirmed on the phone.
    Request,
    /// Short-lived reconnect with a stored token.
    Token,
    /// Account and password.
    User,
    /// Phone number and verification code.
    Phone,
}

/// Payload of the `login` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Login method.
    #[serde(rename = "loginType")]
    pub login_type: LoginType,
    /// Device data from a previous session.
    #[serde(rename = "wxData")]
    pub wx_data: String,
    /// Re-login token.
    pub token: String,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Phone number.
    pub phone: String,
    /// Verification code.
    pub code: String,
}

impl LoginRequest {
    /// Creates a request for the given method with all credentials empty.
    #[inline]
    #[must_use]
    pub fn new(login_type: LoginType) -> Self {
        Self {
            login_type,
            ..Default::default()
        }
    }
}

/// Reply of `getLoginToken`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginToken {
    /// Re-login token.
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    /// Numeric account id.
    #[serde(deserialize_with = "null_as_default")]
    pub uin: i64,
}

/// Reply of `getMyInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MyInfo {
    /// Account id.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Numeric account id.
    #[serde(deserialize_with = "null_as_default")]
    pub uin: i64,
}

/// Reply of `getWxData`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WxData {
    #[serde(deserialize_with = "null_as_default")]
    pub wx_data: String,
}

// ============================================================================
// Message
// ============================================================================

/// Payload of `sendMsg` and `sendImage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendMsgRequest {
    /// Recipient id.
    #[serde(rename = "toUserName")]
    pub to_user_name: String,
    /// Text content.
    pub content: String,
    /// Members to mention in a room.
    #[serde(rename = "atList")]
    pub at_list: Vec<String>,
    /// Base64 encoded file for image messages.
    pub file: String,
}

impl SendMsgRequest {
    /// Creates a text message request.
    #[must_use]
    pub fn text(to_user_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to_user_name: to_user_name.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Creates an image message request from raw image bytes.
    #[must_use]
    pub fn image(to_user_name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            to_user_name: to_user_name.into(),
            file: BASE64.encode(bytes),
            ..Default::default()
        }
    }

    /// Adds mentions.
    #[must_use]
    pub fn with_at_list(mut self, at_list: Vec<String>) -> Self {
        self.at_list = at_list;
        self
    }
}

/// Prefixes `content` with enough `@` markers for every mention.
///
/// The service pairs each entry of `at_list` with one `@` in the text. When
/// the text has fewer, the missing markers are prepended on their own line.
pub fn mk_at_content(req: &mut SendMsgRequest) {
    if req.at_list.is_empty() {
        return;
    }
    let present = req.content.matches('@').count();
    if let Some(missing) = req.at_list.len().checked_sub(present)
        && missing > 0
    {
        req.content = format!("{}\n{}", "@".repeat(missing), req.content);
    }
}

/// Reply of message-sending commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendMsgResponse {
    /// Status text.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Id of the sent message.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_id: String,
    /// Status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
}

/// Payload of the media fetch commands.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RawMsgRequest {
    #[serde(rename = "rawMsgData")]
    pub raw_msg_data: Message,
}

impl RawMsgRequest {
    /// Wraps a message, dropping its inline data which the service rejects.
    pub(crate) fn new(mut message: Message) -> Self {
        message.data.clear();
        Self {
            raw_msg_data: message,
        }
    }
}

/// Reply of `getMsgImage`, `getMsgVideo` and `getMsgVoice`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaResponse {
    /// Base64 encoded media.
    #[serde(deserialize_with = "null_as_default")]
    pub data: String,
    /// Media size in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub size: i64,
    /// Voice duration in milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub voice_length: i64,
    /// Status text.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
}

impl MediaResponse {
    /// Decodes the base64 media payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.data.as_bytes())
    }
}

// ============================================================================
// Contact / Room
// ============================================================================

/// Generic status reply of contact and room operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MsgAndStatus {
    /// Status text.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
}

/// Reply of `createRoom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateRoomResponse {
    /// Status text.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// New room id, empty on failure.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
}

/// One member of a chatroom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatMember {
    /// Member id.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub nick_name: String,
    /// Nickname inside the room.
    #[serde(deserialize_with = "null_as_default")]
    pub chatroom_nick_name: String,
    /// Inviter id.
    #[serde(deserialize_with = "null_as_default")]
    pub invited_by: String,
    /// Avatar URL.
    #[serde(deserialize_with = "null_as_default")]
    pub big_head: String,
    /// Avatar URL.
    #[serde(deserialize_with = "null_as_default")]
    pub small_head: String,
}

/// Reply of `getRoomMembers`.
///
/// The service sends the member list as a JSON string in `member`; it is
/// decoded into `members`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatroomInfo {
    /// Room id.
    #[serde(deserialize_with = "null_as_default")]
    pub chatroom_id: i64,
    /// Number of members.
    #[serde(deserialize_with = "null_as_default")]
    pub count: i64,
    /// Raw member list text.
    #[serde(deserialize_with = "null_as_default")]
    pub member: String,
    /// Decoded member list.
    #[serde(skip)]
    pub members: Vec<ChatMember>,
    /// Status text.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// Room id string.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
}

/// Add-contact source codes accepted by `addContact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum AddContactSource {
    /// Searched by account id.
    Search = 3,
    /// From a QQ friend.
    QqFriend = 4,
    /// From a group chat.
    Chatroom = 8,
    /// Searched by phone number.
    Phone = 15,
    /// From a shared card.
    Card = 17,
    /// From a QR code.
    QrCode = 30,
}

// ============================================================================
// Tests
// ============================================================================
