//! Chatroom membership and settings.

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{ChatMember, ChatroomInfo, CreateRoomResponse, MsgAndStatus};
use crate::session::Session;

// ============================================================================
// Session - Rooms
// ============================================================================

impl Session {
    /// Returns a room's details with its member list decoded.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if the nested member list is not valid JSON.
    pub async fn get_room_members(&self, group_id: &str) -> Result<ChatroomInfo> {
        let mut info: ChatroomInfo = self
            .call("getRoomMembers", json!({ "groupId": group_id }))
            .await?;

        if !info.member.trim().is_empty() {
            info.members = serde_json::from_str::<Vec<ChatMember>>(&info.member)
                .map_err(|e| Error::decode("getRoomMembers member list", e))?;
        }

        debug!(group_id, count = info.members.len(), "Got room members");
        Ok(info)
    }

    /// Creates a room with the given members.
    ///
    /// # Errors
    ///
    /// [`Error::Application`] carrying the service's message when no room
    /// id comes back.
    pub async fn create_room(&self, user_list: &[String]) -> Result<CreateRoomResponse> {
        debug!(members = user_list.len(), "Creating room");

        let resp: CreateRoomResponse = self
            .call("createRoom", json!({ "userList": user_list }))
            .await?;

        if resp.user_name.is_empty() {
            return Err(Error::application("createRoom", resp.message));
        }
        Ok(resp)
    }

    /// Adds a member directly. Only works for small rooms.
    pub async fn add_room_member(&self, group_id: &str, user_id: &str) -> Result<MsgAndStatus> {
        self.room_member_op("addRoomMember", group_id, user_id).await
    }

    /// Sends a room invitation. Delivery cannot be confirmed.
    pub async fn invite_room_member(&self, group_id: &str, user_id: &str) -> Result<MsgAndStatus> {
        self.room_member_op("inviteRoomMember", group_id, user_id).await
    }

    /// Removes a member.
    pub async fn delete_room_member(&self, group_id: &str, user_id: &str) -> Result<MsgAndStatus> {
        self.room_member_op("deleteRoomMember", group_id, user_id).await
    }

    /// Sets the room announcement.
    pub async fn set_room_announcement(
        &self,
        group_id: &str,
        content: &str,
    ) -> Result<MsgAndStatus> {
        self.call(
            "setRoomAnnouncement",
            json!({ "groupId": group_id, "content": content }),
        )
        .await
    }

    /// Renames the room.
    pub async fn set_room_name(&self, group_id: &str, content: &str) -> Result<MsgAndStatus> {
        self.call("setRoomName", json!({ "groupId": group_id, "content": content }))
            .await
    }

    /// Leaves the room.
    pub async fn quit_room(&self, group_id: &str) -> Result<MsgAndStatus> {
        debug!(group_id, "Quitting room");
        self.call("quitRoom", json!({ "groupId": group_id })).await
    }

    async fn room_member_op(
        &self,
        command: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<MsgAndStatus> {
        debug!(command, group_id, user_id, "Room member operation");
        self.call(command, json!({ "groupId": group_id, "userId": user_id }))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
