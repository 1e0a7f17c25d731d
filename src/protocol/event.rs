//! Inbound frames and event payloads.
//!
//! Everything the service sends arrives as a [`ServerFrame`]. The `type`
//! field separates command replies (`cmdRet`) from unsolicited events
//! (`userEvent`); events are further split by name.
//!
//! # Event Types
//!
//! | Event | Payload |
//! |-------|---------|
//! | `qrcode` | [`QrCode`] |
//! | `scan` | [`ScanStatus`] |
//! | `login` | none |
//! | `loaded` | none |
//! | `push` | list of [`PushItem`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::null_as_default;

// ============================================================================
// Constants
// ============================================================================

/// Frame `type` of a command reply.
pub const FRAME_COMMAND_REPLY: &str = "cmdRet";

/// Frame `type` of an unsolicited event.
pub const FRAME_USER_EVENT: &str = "userEvent";

/// Push item discriminant for chat messages.
pub const PUSH_MESSAGE: i64 = 5;

/// Push item discriminant for contact synchronization.
pub const PUSH_CONTACT: i64 = 2;

/// Push item discriminants that carry no useful data.
pub const PUSH_IGNORED: [i64; 2] = [2048, 32768];

/// Field holding the push item discriminant.
const PUSH_DISCRIMINANT: &str = "msg_type";

// ============================================================================
// ServerFrame
// ============================================================================

/// A frame from service to client.
///
/// # Format
///
/// ```json
/// {
///   "type": "userEvent",
///   "event": "push",
///   "cmdId": "uuid",
///   "data": { ... },
///   "msg": ""
/// }
/// ```
///
/// Every field is optional on the wire so that partial frames still classify.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerFrame {
    /// Frame type discriminator.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub frame_type: String,

    /// Event name (for `userEvent` frames).
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,

    /// Correlation id (for `cmdRet` frames).
    #[serde(rename = "cmdId", default, deserialize_with = "null_as_default")]
    pub cmd_id: String,

    /// Raw payload.
    #[serde(default)]
    pub data: Value,

    /// Status text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
}

impl ServerFrame {
    /// Parses a frame from wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text is not a JSON object.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::decode("server frame", e))
    }

    /// Returns the frame kind.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        match self.frame_type.as_str() {
            FRAME_COMMAND_REPLY => FrameKind::CommandReply,
            FRAME_USER_EVENT => FrameKind::UserEvent,
            _ => FrameKind::Other,
        }
    }

    /// Returns the correlation id, if it is well formed.
    #[inline]
    #[must_use]
    pub fn command_id(&self) -> Option<CommandId> {
        CommandId::parse(&self.cmd_id)
    }

    /// Decodes the event carried by a `userEvent` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a known event's payload has the wrong
    /// shape. Unknown event names are not errors.
    pub fn user_event(&self) -> Result<UserEvent> {
        let event = match self.event.as_str() {
            "qrcode" => UserEvent::QrCode(decode_payload("qrcode event", &self.data)?),
            "scan" => UserEvent::Scan(decode_payload("scan event", &self.data)?),
            "login" => UserEvent::Login,
            "loaded" => UserEvent::Loaded,
            "push" => {
                let list = match self.data.get("list") {
                    Some(Value::Array(items)) => items.clone(),
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(Error::decode(
                            "push event",
                            serde::de::Error::custom(format!("list is not an array: {other}")),
                        ));
                    }
                };
                UserEvent::Push(list)
            }
            other => UserEvent::Unknown(other.to_string()),
        };
        Ok(event)
    }
}

/// Decodes a payload, treating `null` as an empty object.
fn decode_payload<T>(context: &str, data: &Value) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    T::deserialize(data).map_err(|e| Error::decode(context, e))
}

// ============================================================================
// FrameKind
// ============================================================================

/// Classification of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Reply to a pending command.
    CommandReply,
    /// Unsolicited event.
    UserEvent,
    /// Anything else.
    Other,
}

// ============================================================================
// UserEvent
// ============================================================================

/// A decoded `userEvent` frame.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// Login QR code is available.
    QrCode(QrCode),
    /// QR code scan status changed.
    Scan(ScanStatus),
    /// Login completed.
    Login,
    /// Initial data finished loading.
    Loaded,
    /// Batch of undecoded push items.
    Push(Vec<Value>),
    /// Unrecognized event name.
    Unknown(String),
}

// ============================================================================
// PushItem
// ============================================================================

/// A single item of a `push` event, decoded by its `msg_type` discriminant.
#[derive(Debug, Clone)]
pub enum PushItem {
    /// Chat message.
    Message(Message),
    /// Contact added or updated.
    ContactSync(Contact),
    /// Known noise category.
    Ignored(i64),
    /// Unrecognized or missing discriminant.
    Unknown(Value),
}

impl PushItem {
    /// Peeks the discriminant, then decodes the matching variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a message or contact item has the wrong
    /// shape.
    pub fn decode(item: Value) -> Result<Self> {
        let Some(discriminant) = item.get(PUSH_DISCRIMINANT).and_then(Value::as_i64) else {
            return Ok(Self::Unknown(item));
        };

        match discriminant {
            PUSH_MESSAGE => serde_json::from_value(item)
                .map(Self::Message)
                .map_err(|e| Error::decode("push message", e)),
            PUSH_CONTACT => serde_json::from_value(item)
                .map(Self::ContactSync)
                .map_err(|e| Error::decode("push contact", e)),
            value if PUSH_IGNORED.contains(&value) => Ok(Self::Ignored(value)),
            _ => Ok(Self::Unknown(item)),
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// Login QR code notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrCode {
    /// URL encoded in the QR code.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

/// QR code scan progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanStatus {
    /// Device type of the scanning phone.
    #[serde(deserialize_with = "null_as_default")]
    pub device_type: String,
    /// Seconds until the QR code expires.
    #[serde(deserialize_with = "null_as_default")]
    pub expired_time: i64,
    /// Avatar URL of the scanning account.
    #[serde(deserialize_with = "null_as_default")]
    pub head_url: String,
    /// Nickname of the scanning account.
    #[serde(deserialize_with = "null_as_default")]
    pub nick_name: String,
    /// Password hint returned after confirmation.
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    /// Scan status code.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// Secondary status code.
    #[serde(deserialize_with = "null_as_default")]
    pub sub_status: i64,
    /// Account id.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// External data.
    #[serde(deserialize_with = "null_as_default")]
    pub external: String,
    /// Bound email.
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// Numeric account id.
    #[serde(deserialize_with = "null_as_default")]
    pub uin: i64,
    /// Bound phone number.
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
}

/// A chat message pushed by the service.
///
/// Also sent back verbatim (minus `data`) when fetching media for a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Inline payload, e.g. thumbnail data.
    #[serde(deserialize_with = "null_as_default")]
    pub data: String,
    /// Message body.
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    /// Notification text.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// Sender id.
    #[serde(deserialize_with = "null_as_default")]
    pub from_user: String,
    /// Recipient id.
    #[serde(deserialize_with = "null_as_default")]
    pub to_user: String,
    /// Service-side message id.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_id: String,
    /// Raw source XML.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_source: String,
    /// Content type (1 text, 3 image, 34 voice, 43 video, 49 app message).
    #[serde(deserialize_with = "null_as_default")]
    pub sub_type: i64,
    /// Unix timestamp in seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
    /// Push discriminant.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_type: i64,
    /// Delivery status.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// Receiving account.
    #[serde(deserialize_with = "null_as_default")]
    pub uin: i64,
    /// Set when more items follow.
    #[serde(rename = "continue", deserialize_with = "null_as_default")]
    pub continue_flag: i64,
}

/// A contact or chatroom record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// Contact id (`...@chatroom` for rooms).
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub nick_name: String,
    /// Remark set by the bot account.
    #[serde(deserialize_with = "null_as_default")]
    pub remark: String,
    /// Large avatar URL.
    #[serde(deserialize_with = "null_as_default")]
    pub big_head: String,
    /// Small avatar URL.
    #[serde(deserialize_with = "null_as_default")]
    pub small_head: String,
    /// Gender code.
    #[serde(deserialize_with = "null_as_default")]
    pub sex: i64,
    /// Profile signature.
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
    /// City.
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    /// Province.
    #[serde(deserialize_with = "null_as_default")]
    pub provincia: String,
    /// Country code.
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    /// Label ids, comma separated.
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    /// Chatroom numeric id.
    #[serde(deserialize_with = "null_as_default")]
    pub chatroom_id: i64,
    /// Chatroom owner id.
    #[serde(deserialize_with = "null_as_default")]
    pub chatroom_owner: String,
    /// Current member count.
    #[serde(deserialize_with = "null_as_default")]
    pub member_count: i64,
    /// Maximum member count.
    #[serde(deserialize_with = "null_as_default")]
    pub max_member_count: i64,
    /// Pinyin initials of the nickname.
    #[serde(deserialize_with = "null_as_default")]
    pub py_initial: String,
    /// Full pinyin of the nickname.
    #[serde(deserialize_with = "null_as_default")]
    pub quan_pin: String,
    /// Stranger ticket, set for non-friends.
    #[serde(deserialize_with = "null_as_default")]
    pub stranger: String,
    /// Self introduction.
    #[serde(deserialize_with = "null_as_default")]
    pub intro: String,
    /// Source of the friendship.
    #[serde(deserialize_with = "null_as_default")]
    pub source: i64,
    /// Push discriminant.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_type: i64,
    /// Record status.
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// Receiving account.
    #[serde(deserialize_with = "null_as_default")]
    pub uin: i64,
    /// Set when more items follow.
    #[serde(rename = "continue", deserialize_with = "null_as_default")]
    pub continue_flag: i64,
}

// ============================================================================
// EventKind / Event
// ============================================================================

/// Named callback slot categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Login QR code available.
    QrCode,
    /// QR code scanned.
    Scan,
    /// Login completed.
    Login,
    /// Initial data loaded.
    Loaded,
    /// Chat message received.
    Message,
    /// Contact added or updated.
    ContactSync,
}

impl EventKind {
    /// All slot categories, in slot order.
    pub const ALL: [Self; 6] = [
        Self::QrCode,
        Self::Scan,
        Self::Login,
        Self::Loaded,
        Self::Message,
        Self::ContactSync,
    ];

    /// Returns the slot index of this category.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the wire name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QrCode => "qrcode",
            Self::Scan => "scan",
            Self::Login => "login",
            Self::Loaded => "loaded",
            Self::Message => "message",
            Self::ContactSync => "contactSync",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded event delivered to a callback slot.
#[derive(Debug, Clone)]
pub enum Event {
    /// Login QR code available.
    QrCode(QrCode),
    /// QR code scanned.
    Scan(ScanStatus),
    /// Login completed.
    Login,
    /// Initial data loaded.
    Loaded,
    /// Chat message received.
    Message(Box<Message>),
    /// Contact added or updated.
    ContactSync(Box<Contact>),
}

impl Event {
    /// Returns the slot this event is delivered to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::QrCode(_) => EventKind::QrCode,
            Self::Scan(_) => EventKind::Scan,
            Self::Login => EventKind::Login,
            Self::Loaded => EventKind::Loaded,
            Self::Message(_) => EventKind::Message,
            Self::ContactSync(_) => EventKind::ContactSync,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
