//! Instance lifecycle and login methods.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::protocol::{LoginRequest, LoginToken, LoginType, MyInfo};
use crate::protocol::command::WxData;
use crate::session::Session;

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Re-initializes the remote instance.
    ///
    /// The session already sends `init` on open unless built with
    /// [`no_init`](crate::SessionBuilder::no_init).
    pub async fn init(&self) -> Result<()> {
        self.invoke("init", ()).await?;
        Ok(())
    }

    /// Closes the remote instance without logging out.
    ///
    /// The session itself stays open; see [`Session::close`].
    pub async fn close_instance(&self) -> Result<()> {
        debug!("Closing remote instance");
        self.invoke("close", ()).await?;
        Ok(())
    }

    /// Logs the account out.
    pub async fn logout(&self) -> Result<()> {
        debug!("Logging out");
        self.invoke("logout", ()).await?;
        Ok(())
    }

    /// Starts message synchronization right away instead of on the next
    /// incoming message.
    pub async fn sync_msg(&self) -> Result<()> {
        self.invoke("syncMsg", ()).await?;
        Ok(())
    }

    /// Starts contact synchronization. Contacts arrive as
    /// [`Event::ContactSync`](crate::Event::ContactSync).
    pub async fn sync_contact(&self) -> Result<()> {
        self.invoke("syncContact", ()).await?;
        Ok(())
    }
}

// ============================================================================
// Session - Login
// ============================================================================

impl Session {
    /// Sends a `login` command with an arbitrary request.
    pub async fn login(&self, request: LoginRequest) -> Result<Value> {
        debug!(login_type = ?request.login_type, "Logging in");
        self.invoke("login", request).await
    }

    /// Starts QR code login. The code arrives through
    /// [`on_qrcode`](Session::on_qrcode).
    pub async fn qr_login(&self) -> Result<Value> {
        self.login(LoginRequest::new(LoginType::Qrcode)).await
    }

    /// Re-login confirmed on the phone.
    pub async fn request_login(&self, wx_data: &str, token: &str) -> Result<Value> {
        self.login(LoginRequest {
            wx_data: wx_data.to_string(),
            token: token.to_string(),
            ..LoginRequest::new(LoginType::Request)
        })
        .await
    }

    /// Reconnects with a recent token.
    ///
    /// Tokens expire quickly; fall back to [`Session::request_login`] when
    /// this fails.
    pub async fn token_login(&self, wx_data: &str, token: &str) -> Result<Value> {
        self.login(LoginRequest {
            wx_data: wx_data.to_string(),
            token: token.to_string(),
            ..LoginRequest::new(LoginType::Token)
        })
        .await
    }

    /// Logs in with account and password.
    pub async fn user_login(&self, wx_data: &str, username: &str, password: &str) -> Result<Value> {
        self.login(LoginRequest {
            wx_data: wx_data.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..LoginRequest::new(LoginType::User)
        })
        .await
    }

    /// Logs in with a phone verification code.
    pub async fn phone_login(&self, wx_data: &str, phone: &str, code: &str) -> Result<Value> {
        self.login(LoginRequest {
            wx_data: wx_data.to_string(),
            phone: phone.to_string(),
            code: code.to_string(),
            ..LoginRequest::new(LoginType::Phone)
        })
        .await
    }
}

// ============================================================================
// Session - Account Data
// ============================================================================

impl Session {
    /// Returns the device data used for later logins.
    pub async fn get_wx_data(&self) -> Result<String> {
        let data: WxData = self.call("getWxData", ()).await?;
        Ok(data.wx_data)
    }

    /// Returns the token for [`Session::request_login`] and
    /// [`Session::token_login`].
    pub async fn get_login_token(&self) -> Result<LoginToken> {
        self.call("getLoginToken", ()).await
    }

    /// Returns the logged-in account.
    pub async fn get_my_info(&self) -> Result<MyInfo> {
        self.call("getMyInfo", ()).await
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

    #[tokio::test]
    async fn test_get_my_info() {
        let (result, envelope) = exchange(
            |s| async move { s.get_my_info().await },
            ok(json!({ "userName": "abc", "uin": 42 })),
        )
        .await;

        assert_eq!(envelope["cmd"], "getMyInfo");
        let info = result.expect("info");
        assert_eq!(info.user_name, "abc");
        assert_eq!(info.uin, 42);
    }

    #[tokio::test]
    async fn test_qr_login_payload() {
        let (result, envelope) =
            exchange(|s| async move { s.qr_login().await }, ok(json!({}))).await;

        assert!(result.is_ok());
        assert_eq!(envelope["cmd"], "login");
        assert_eq!(envelope["data"]["loginType"], "qrcode");
    }

    #[tokio::test]
    async fn test_phone_login_payload() {
        let (_, envelope) = exchange(
            |s| async move { s.phone_login("62data", "13800000000", "1234").await },
            ok(json!({})),
        )
        .await;

        let data = &envelope["data"];
        assert_eq!(data["loginType"], "phone");
        assert_eq!(data["wxData"], "62data");
        assert_eq!(data["phone"], "13800000000");
        assert_eq!(data["code"], "1234");
    }

    #[tokio::test]
    async fn test_get_wx_data() {
        let (result, _) = exchange(
            |s| async move { s.get_wx_data().await },
            ok(json!({ "wx_data": "62abcdef" })),
        )
        .await;

        assert_eq!(result.expect("wx data"), "62abcdef");
    }

    #[tokio::test]
    async fn test_get_login_token_failure() {
        let (result, _) = exchange(
            |s| async move { s.get_login_token().await },
            json!({ "success": false, "msg": "not logged in" }),
        )
        .await;

        match result {
            Err(Error::Application { command, message }) => {
                assert_eq!(command, "getLoginToken");
                assert_eq!(message, "not logged in");
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_instance_uses_close_command() {
        let (result, envelope) =
            exchange(|s| async move { s.close_instance().await }, ok(json!(null))).await;

        assert!(result.is_ok());
        assert_eq!(envelope["cmd"], "close");
    }
}
