//! Tests for the authorization flow against a mock server.

use std::time::{Duration, SystemTime};

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use aliyundrive_open::error::DriveError;
use aliyundrive_open::{AuthClient, AuthorizeOptions, ClientConfig, QrStatus, Session, Transport};

fn auth_for(server: &ServerGuard) -> AuthClient {
    let config = ClientConfig::default()
        .with_base_url(server.url())
        .with_retries(0);
    AuthClient::new("app-id", "app-secret", Transport::new(&config).unwrap())
}

fn drive_info_body() -> String {
    json!({
        "user_id": "u1",
        "nick_name": "tester",
        "default_drive_id": "drive-9",
        "resource_drive_id": "drive-10"
    })
    .to_string()
}

mod qr_code {
    use super::*;

    #[tokio::test]
    async fn test_issue_qr_code() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/authorize/qrcode")
            .match_body(Matcher::Json(json!({
                "client_id": "app-id",
                "client_secret": "app-secret",
                "scopes": ["user:base", "user:phone", "file:all:read", "file:all:write"]
            })))
            .with_body(r#"{"qrCodeUrl":"https://open.example.com/qr/sid-1","sid":"sid-1"}"#)
            .create_async()
            .await;

        let qr = auth_for(&server)
            .qr_code(&AuthorizeOptions::qr_code())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(qr.sid, "sid-1");
        assert_eq!(qr.qr_code_url, "https://open.example.com/qr/sid-1");
    }

    #[tokio::test]
    async fn test_empty_scopes_send_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/authorize/qrcode")
            .expect(0)
            .create_async()
            .await;

        let err = auth_for(&server)
            .qr_code(&AuthorizeOptions::qr_code().with_scopes(&[]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, DriveError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_status_probes() {
        let mut server = Server::new_async().await;
        let _waiting = server
            .mock("GET", "/oauth/qrcode/sid-wait/status")
            .with_body(r#"{"status":"WaitLogin"}"#)
            .create_async()
            .await;
        let _done = server
            .mock("GET", "/oauth/qrcode/sid-done/status")
            .with_body(r#"{"status":"LoginSuccess","authCode":"code-1"}"#)
            .create_async()
            .await;
        let _expired = server
            .mock("GET", "/oauth/qrcode/sid-old/status")
            .with_body(r#"{"status":"QRCodeExpired"}"#)
            .create_async()
            .await;

        let auth = auth_for(&server);

        let status = auth.qr_code_status("sid-wait").await.unwrap();
        assert_eq!(status.status, QrStatus::WaitLogin);
        assert!(status.auth_code.is_none());

        let status = auth.qr_code_status("sid-done").await.unwrap();
        assert_eq!(status.status, QrStatus::LoginSuccess);
        assert_eq!(status.auth_code.as_deref(), Some("code-1"));

        let status = auth.qr_code_status("sid-old").await.unwrap();
        assert_eq!(status.status, QrStatus::Other("QRCodeExpired".to_string()));
    }

    #[tokio::test]
    async fn test_empty_sid_is_rejected() {
        let server = Server::new_async().await;
        let err = auth_for(&server).qr_code_status("").await.unwrap_err();
        assert!(matches!(err, DriveError::Precondition(_)));
    }
}

mod token {
    use super::*;

    #[tokio::test]
    async fn test_authorize_binds_default_drive() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth/access_token")
            .match_body(Matcher::Json(json!({
                "client_id": "app-id",
                "client_secret": "app-secret",
                "grant_type": "authorization_code",
                "code": "code-1"
            })))
            .with_body(
                json!({
                    "token_type": "Bearer",
                    "access_token": "at-1",
                    "refresh_token": "rt-1",
                    "expires_in": 3600
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let drive = server
            .mock("POST", "/adrive/v1.0/user/getDriveInfo")
            .match_header("authorization", "Bearer at-1")
            .with_body(drive_info_body())
            .expect(1)
            .create_async()
            .await;

        let before = SystemTime::now();
        let session = auth_for(&server).authorize("code-1").await.unwrap();
        let after = SystemTime::now();

        token.assert_async().await;
        drive.assert_async().await;
        assert_eq!(session.access_token, "at-1");
        assert_eq!(session.refresh_token, "rt-1");
        assert_eq!(session.drive_id, "drive-9");
        assert!(session.expires_at >= before + Duration::from_secs(3540));
        assert!(session.expires_at <= after + Duration::from_secs(3540));
    }

    #[tokio::test]
    async fn test_empty_code_sends_nothing() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth/access_token")
            .expect(0)
            .create_async()
            .await;

        let err = auth_for(&server).authorize("").await.unwrap_err();

        token.assert_async().await;
        assert!(matches!(err, DriveError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_rejected_code_keeps_vendor_message() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("POST", "/oauth/access_token")
            .with_status(400)
            .with_body(r#"{"code":"InvalidCode","message":"code is invalid or expired"}"#)
            .create_async()
            .await;
        let drive = server
            .mock("POST", "/adrive/v1.0/user/getDriveInfo")
            .expect(0)
            .create_async()
            .await;

        let err = auth_for(&server).authorize("stale").await.unwrap_err();

        drive.assert_async().await;
        match err {
            DriveError::Service { code, message, .. } => {
                assert_eq!(code, "InvalidCode");
                assert_eq!(message, "code is invalid or expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_drive_id() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth/access_token")
            .match_body(Matcher::PartialJson(json!({
                "grant_type": "refresh_token",
                "refresh_token": "rt-1"
            })))
            .with_body(
                json!({
                    "token_type": "Bearer",
                    "access_token": "at-2",
                    "refresh_token": "rt-2",
                    "expires_in": 7200
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let drive = server
            .mock("POST", "/adrive/v1.0/user/getDriveInfo")
            .expect(0)
            .create_async()
            .await;

        let old = Session {
            token_type: "Bearer".to_string(),
            access_token: "at-1".to_string(),
            refresh_token: "rt-1".to_string(),
            expires_at: SystemTime::now(),
            drive_id: "drive-9".to_string(),
        };

        let session = auth_for(&server).refresh(&old).await.unwrap();

        token.assert_async().await;
        drive.assert_async().await;
        assert_eq!(session.access_token, "at-2");
        assert_eq!(session.refresh_token, "rt-2");
        assert_eq!(session.drive_id, "drive-9");
        assert!(!session.is_expired());
    }
}
