//! Outbound envelope and generic command reply.
//!
//! Every command travels in the same envelope; the remote service answers
//! with a `cmdRet` frame whose `data` is a [`CommandReply`].

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::null_as_default;

// ============================================================================
// Constants
// ============================================================================

/// Envelope `type` for client-issued commands.
pub const USER_ENVELOPE: &str = "user";

/// Command sent as the connection handshake.
pub const INIT_COMMAND: &str = "init";

// ============================================================================
// Envelope
// ============================================================================

/// A command envelope from client to service.
///
/// # Format
///
/// ```json
/// {
///   "type": "user",
///   "cmd": "getMyInfo",
///   "cmdId": "uuid",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Envelope kind (always `"user"`).
    #[serde(rename = "type")]
    pub kind: &'static str,

    /// Command name.
    pub cmd: String,

    /// Correlation id echoed back in the reply.
    #[serde(rename = "cmdId")]
    pub cmd_id: CommandId,

    /// Command payload, `null` when the command takes none.
    pub data: Value,
}

impl Envelope {
    /// Creates a new envelope with auto-generated id.
    #[inline]
    #[must_use]
    pub fn new(cmd: impl Into<String>, data: Value) -> Self {
        Self::with_id(CommandId::generate(), cmd, data)
    }

    /// Creates a new envelope with a specific id.
    #[inline]
    #[must_use]
    pub fn with_id(cmd_id: CommandId, cmd: impl Into<String>, data: Value) -> Self {
        Self {
            kind: USER_ENVELOPE,
            cmd: cmd.into(),
            cmd_id,
            data,
        }
    }

    /// Creates the handshake envelope sent right after the socket opens.
    #[inline]
    #[must_use]
    pub fn init() -> Self {
        Self::new(INIT_COMMAND, Value::Null)
    }

    /// Serializes the envelope to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// CommandReply
// ============================================================================

/// Generic reply carried in the `data` of a `cmdRet` frame.
///
/// # Format
///
/// ```json
/// { "success": true, "data": { ... }, "msg": "" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    /// Whether the service executed the command.
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,

    /// Command-specific result.
    #[serde(default)]
    pub data: Value,

    /// Human-readable status text, set on failure.
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
}

impl CommandReply {
    /// Decodes a reply from the raw `data` of a `cmdRet` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the value is not a reply object.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::decode("command reply", e))
    }

    /// Returns the result data, or [`Error::Application`] for `success=false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Application`] carrying `msg` verbatim.
    pub fn into_result(self, command: &str) -> Result<Value> {
        if self.success {
            Ok(self.data)
        } else {
            Err(Error::application(command, self.msg))
        }
    }

    /// Decodes the result data into `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::Application`] for `success=false`
    /// - [`Error::Decode`] if `data` does not match `T`
    pub fn decode<T: serde::de::DeserializeOwned>(self, command: &str) -> Result<T> {
        let data = self.into_result(command)?;
        serde_json::from_value(data).map_err(|e| Error::decode(format!("{command} reply"), e))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let envelope = Envelope::new("getContact", json!({ "userId": "wxid_1" }));
        let value: Value = serde_json::from_str(&envelope.to_text().expect("serialize"))
            .expect("valid json");

        assert_eq!(value["type"], "user");
        assert_eq!(value["cmd"], "getContact");
        assert_eq!(value["cmdId"], envelope.cmd_id.to_string());
        assert_eq!(value["data"]["userId"], "wxid_1");
    }

    #[test]
    fn test_init_envelope_has_null_data() {
        let envelope = Envelope::init();
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["cmd"], "init");
        assert!(value["data"].is_null());
    }

    #[test]
    fn test_reply_success_decode() {
        let reply = CommandReply::from_value(json!({
            "success": true,
            "data": { "userName": "abc", "uin": 42 }
        }))
        .expect("reply");

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Info {
            user_name: String,
            uin: i64,
        }

        let info: Info = reply.decode("getMyInfo").expect("decode");
        assert_eq!(info.user_name, "abc");
        assert_eq!(info.uin, 42);
    }

    #[test]
    fn test_reply_failure_surfaces_message() {
        let reply = CommandReply::from_value(json!({ "success": false, "msg": "not logged in" }))
            .expect("reply");

        match reply.into_result("getMyInfo") {
            Err(Error::Application { command, message }) => {
                assert_eq!(command, "getMyInfo");
                assert_eq!(message, "not logged in");
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn test_reply_null_msg_is_success() {
        let reply = CommandReply::from_value(json!({
            "success": true,
            "data": { "uin": 42 },
            "msg": null
        }))
        .expect("reply");

        assert!(reply.msg.is_empty());
        let data = reply.into_result("getMyInfo").expect("success");
        assert_eq!(data["uin"], 42);
    }

    #[test]
    fn test_reply_null_success_is_failure() {
        let reply = CommandReply::from_value(json!({ "success": null, "msg": "busy" }))
            .expect("reply");
        assert!(matches!(
            reply.into_result("logout"),
            Err(Error::Application { .. })
        ));
    }

    #[test]
    fn test_reply_rejects_non_object() {
        let result = CommandReply::from_value(json!("oops"));
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_reply_decode_shape_mismatch() {
        let reply = CommandReply::from_value(json!({ "success": true, "data": [1, 2] }))
            .expect("reply");
        let result: Result<std::collections::HashMap<String, i64>> = reply.decode("getFav");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
