//! WebSocket protocol message types.
//!
//! This module defines the message format exchanged with the automation
//! service.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Envelope` | Client → Service | Command request (`type: "user"`) |
//! | `ServerFrame` (`cmdRet`) | Service → Client | Command reply, wraps a `CommandReply` |
//! | `ServerFrame` (`userEvent`) | Service → Client | Unsolicited notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed command payloads and replies |
//! | `event` | Inbound frames, events, push items |
//! | `request` | Envelope and generic reply |

// ============================================================================
// Submodules
// ============================================================================

/// Typed command payloads and replies.
pub mod command;

/// Inbound frames and event payloads.
pub mod event;

/// Envelope and generic reply.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    AddContactSource, ChatMember, ChatroomInfo, CreateRoomResponse, LoginRequest, LoginToken,
    LoginType, MediaResponse, MsgAndStatus, MyInfo, SendMsgRequest, SendMsgResponse,
    mk_at_content,
};
pub use event::{
    Contact, Event, EventKind, FrameKind, Message, PushItem, QrCode, ScanStatus, ServerFrame,
    UserEvent,
};
pub use request::{CommandReply, Envelope};

// ============================================================================
// Lenient Decoding
// ============================================================================

/// Reads an explicit `null` as the field's default, same as a missing field.
///
/// The service emits `null` for empty strings and counters.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    Ok(<Option<T> as serde::Deserialize>::deserialize(deserializer)?.unwrap_or_default())
}
