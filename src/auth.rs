//! Authorization against the Aliyun Drive open platform.
//!
//! Two ways to obtain an authorization code are supported:
//! - QR code: [`AuthClient::qr_code`] issues a code to scan, and the caller
//!   polls [`AuthClient::qr_code_status`] (about once a second) until the status
//!   is [`QrStatus::LoginSuccess`], which carries the auth code.
//! - H5 redirect: the user opens [`AuthClient::authorize_url`] in a browser and
//!   the platform redirects back with `?code=...`, see [`code_from_redirect`].
//!
//! The code is then exchanged once with [`AuthClient::authorize`] for a
//! [`Session`], which [`AuthClient::refresh`] renews.

use std::time::{Duration, SystemTime};

use rand::Rng;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::client::fetch_drive_info;
use crate::error::{DriveError, Result};
use crate::models::{QrCode, QrCodeStatus, TokenResponse};
use crate::transport::{self, Transport};

/// Subtracted from the server-reported token lifetime.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Permission scope requested during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    #[serde(rename = "user:base")]
    Base,
    #[serde(rename = "user:phone")]
    Phone,
    #[serde(rename = "file:all:read")]
    Read,
    #[serde(rename = "file:all:write")]
    Write,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Base, Scope::Phone, Scope::Read, Scope::Write];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Base => "user:base",
            Scope::Phone => "user:phone",
            Scope::Read => "file:all:read",
            Scope::Write => "file:all:write",
        }
    }
}

/// Options for starting an authorization.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    pub scopes: Vec<Scope>,
    /// Required for the H5 redirect flow.
    pub redirect_uri: Option<String>,
    /// Echoed back on redirect, for CSRF protection.
    pub state: Option<String>,
}

impl AuthorizeOptions {
    /// QR code login with every scope.
    pub fn qr_code() -> Self {
        Self {
            scopes: Scope::ALL.to_vec(),
            ..Default::default()
        }
    }

    /// H5 redirect login with every scope and a random state.
    pub fn redirect(redirect_uri: &str) -> Self {
        Self {
            scopes: Scope::ALL.to_vec(),
            redirect_uri: Some(redirect_uri.to_string()),
            state: Some(random_state(8)),
        }
    }

    pub fn with_scopes(mut self, scopes: &[Scope]) -> Self {
        self.scopes = scopes.to_vec();
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    fn joined_scopes(&self) -> String {
        self.scopes
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn random_state(len: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// An authorized session: tokens plus the drive they are bound to.
///
/// Immutable; a refresh produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: SystemTime,
    pub drive_id: String,
}

impl Session {
    fn from_token(token: TokenResponse, drive_id: String, prior_refresh_token: &str) -> Self {
        Self {
            token_type: token.token_type,
            access_token: token.access_token,
            refresh_token: token
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| prior_refresh_token.to_string()),
            expires_at: expiry_from_ttl(token.expires_in),
            drive_id,
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// Longest token lifetime taken from a server response.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// `now + ttl - 60s`, never earlier than now. `ttl` is capped at [`MAX_TOKEN_TTL`].
pub fn expiry_from_ttl(ttl_secs: u64) -> SystemTime {
    let ttl = Duration::from_secs(ttl_secs)
        .min(MAX_TOKEN_TTL)
        .saturating_sub(EXPIRY_MARGIN);
    SystemTime::now() + ttl
}

/// Extract the authorization code from the H5 redirect URL.
pub fn code_from_redirect(redirect_url: &str) -> Result<String> {
    let url = Url::parse(redirect_url)
        .map_err(|e| DriveError::precondition(format!("invalid redirect URL: {}", e)))?;

    url.query_pairs()
        .find(|(key, value)| key == "code" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| DriveError::precondition("redirect URL has no code"))
}

/// Client for the authorization endpoints of one registered application.
#[derive(Clone)]
pub struct AuthClient {
    client_id: String,
    client_secret: String,
    transport: Transport,
}

impl AuthClient {
    /// Create a new AuthClient.
    ///
    /// # Arguments
    /// * `client_id` - Application id from the open platform console
    /// * `client_secret` - Application secret
    /// * `transport` - HTTP transport to send requests with
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        transport: Transport,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            transport,
        }
    }

    /// Build the H5 authorization page URL.
    pub fn authorize_url(&self, options: &AuthorizeOptions) -> Result<String> {
        let redirect_uri = options
            .redirect_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DriveError::precondition("redirect_uri"))?;

        let scope = options.joined_scopes();
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
        ];
        if let Some(state) = options.state.as_deref() {
            params.push(("state", state));
        }

        let url = Url::parse_with_params(&self.transport.url(transport::API_AUTHORIZE), &params)
            .map_err(|e| DriveError::precondition(format!("invalid authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Issue a login QR code.
    pub async fn qr_code(&self, options: &AuthorizeOptions) -> Result<QrCode> {
        if options.scopes.is_empty() {
            return Err(DriveError::precondition("scopes"));
        }

        let body = json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "scopes": options.scopes,
        });

        let qr: QrCode = self
            .transport
            .post_json(transport::API_QRCODE, None, &body)
            .await?;
        debug!(sid = %qr.sid, "QR code issued");

        Ok(qr)
    }

    /// Probe the scan state of a QR code once.
    pub async fn qr_code_status(&self, sid: &str) -> Result<QrCodeStatus> {
        if sid.is_empty() {
            return Err(DriveError::precondition("sid"));
        }

        let status: QrCodeStatus = self
            .transport
            .get_json(&transport::qrcode_status_path(sid))
            .await?;
        debug!(sid, status = ?status.status, "QR code status");

        Ok(status)
    }

    /// Exchange a one-shot authorization code for a session bound to the
    /// user's default drive.
    pub async fn authorize(&self, auth_code: &str) -> Result<Session> {
        if auth_code.is_empty() {
            return Err(DriveError::precondition("auth code"));
        }

        let body = json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "grant_type": "authorization_code",
            "code": auth_code,
        });

        let token: TokenResponse = self
            .transport
            .post_json(transport::API_TOKEN, None, &body)
            .await?;

        let drive = fetch_drive_info(&self.transport, &token.access_token).await?;
        info!(drive_id = %drive.default_drive_id, "Authorization succeeded");

        Ok(Session::from_token(token, drive.default_drive_id, ""))
    }

    /// Renew a session. The drive id is carried over from `session`.
    pub async fn refresh(&self, session: &Session) -> Result<Session> {
        if session.refresh_token.is_empty() {
            return Err(DriveError::precondition("refresh token"));
        }

        let body = json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "grant_type": "refresh_token",
            "refresh_token": session.refresh_token,
        });

        let token: TokenResponse = self
            .transport
            .post_json(transport::API_TOKEN, None, &body)
            .await?;
        info!(drive_id = %session.drive_id, "Access token refreshed");

        Ok(Session::from_token(
            token,
            session.drive_id.clone(),
            &session.refresh_token,
        ))
    }
}
