//! HTTP transport for the Aliyun Drive open API.
//!
//! Every JSON response may carry a `{code, message, requestId}` envelope on top
//! of its success schema. A non-empty `code` is a failure whatever the HTTP
//! status says, so responses are decoded in two steps: envelope first, then the
//! typed payload.

use std::path::Path;

use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{DriveError, Result};
use crate::models::ErrorInfo;

pub(crate) const API_AUTHORIZE: &str = "/oauth/authorize";
pub(crate) const API_QRCODE: &str = "/oauth/authorize/qrcode";
pub(crate) const API_TOKEN: &str = "/oauth/access_token";
pub(crate) const API_DRIVE_INFO: &str = "/adrive/v1.0/user/getDriveInfo";
pub(crate) const API_SPACE_INFO: &str = "/adrive/v1.0/user/getSpaceInfo";
pub(crate) const API_LIST: &str = "/adrive/v1.0/openFile/list";
pub(crate) const API_GET: &str = "/adrive/v1.0/openFile/get";
pub(crate) const API_BATCH_GET: &str = "/adrive/v1.0/openFile/batch/get";
pub(crate) const API_TRASH: &str = "/adrive/v1.0/openFile/recyclebin/trash";
pub(crate) const API_DELETE: &str = "/adrive/v1.0/openFile/delete";
pub(crate) const API_CREATE: &str = "/adrive/v1.0/openFile/create";
pub(crate) const API_COMPLETE: &str = "/adrive/v1.0/openFile/complete";
pub(crate) const API_DOWNLOAD_URL: &str = "/adrive/v1.0/openFile/getDownloadUrl";
pub(crate) const API_VIDEO_PLAY_INFO: &str = "/adrive/v1.0/openFile/getVideoPreviewPlayInfo";
pub(crate) const API_MOVE: &str = "/adrive/v1.0/openFile/move";
pub(crate) const API_COPY: &str = "/adrive/v1.0/openFile/copy";
pub(crate) const API_UPDATE: &str = "/adrive/v1.0/openFile/update";

pub(crate) fn qrcode_status_path(sid: &str) -> String {
    format!("/oauth/qrcode/{}/status", sid)
}

const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// HTTP client bound to one API host.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Transport {
    http: Client,
    base_url: String,
    retries: u32,
}

impl Transport {
    /// Build a transport from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body, optionally authenticated, and decode the reply.
    pub async fn post_json<B, T>(&self, path: &str, token: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let payload = serde_json::to_vec(body)?;
        debug!(%url, bytes = payload.len(), "POST");

        let response = self
            .send_with_retry(|| {
                let request = self
                    .http
                    .post(&url)
                    .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .body(payload.clone());
                match token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            })
            .await?;

        decode_response(response).await
    }

    /// Unauthenticated GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self.send_with_retry(|| self.http.get(&url)).await?;
        decode_response(response).await
    }

    /// PUT one upload part to its pre-signed URL. Single attempt.
    pub async fn put_part(&self, url: &str, part_number: u32, body: Vec<u8>) -> Result<()> {
        debug!(part_number, bytes = body.len(), "PUT part");

        let response = self.http.put(url).body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::PartUpload {
                part_number,
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Stream a pre-signed download URL to a local file.
    ///
    /// Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, destination: &Path) -> Result<u64> {
        debug!(destination = %destination.display(), "GET download");

        let response = self.send_with_retry(|| self.http.get(url)).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Http {
                status: status.as_u16(),
                message,
            });
        }

        write_stream(response.bytes_stream(), destination).await
    }

    /// Send a request, rebuilding it for each retry of a connect or timeout failure.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retries && (err.is_connect() || err.is_timeout()) => {
                    attempt += 1;
                    warn!(attempt, max = self.retries, error = %err, "Request failed, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Write a byte stream to `destination`. A partly written file is removed on failure.
async fn write_stream<S, B, E>(mut stream: S, destination: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    DriveError: From<E>,
{
    let mut file = File::create(destination).await?;
    let mut written = 0u64;

    let outcome = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(chunk.as_ref()).await?;
            written += chunk.as_ref().len() as u64;
        }
        file.flush().await?;
        Ok::<(), DriveError>(())
    }
    .await;

    if let Err(err) = outcome {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(destination).await {
            warn!(destination = %destination.display(), error = %remove_err, "Failed to remove partial download");
        }
        return Err(err);
    }

    Ok(written)
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    decode_body(status, &body)
}

/// Decode a response body, giving the vendor error envelope precedence.
pub(crate) fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let success = (200..300).contains(&status);

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !success => {
            return Err(DriveError::Http {
                status,
                message: body.to_string(),
            })
        }
        Err(err) => return Err(err.into()),
    };

    if let Ok(info) = ErrorInfo::deserialize(&value) {
        if let Some(code) = info.code.filter(|c| !c.is_empty()) {
            return Err(DriveError::Service {
                code,
                message: info.message.unwrap_or_default(),
                request_id: info.request_id,
            });
        }
    }

    if !success {
        return Err(DriveError::Http {
            status,
            message: body.to_string(),
        });
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadUrl;

    #[test]
    fn test_envelope_wins_over_http_success() {
        let body = r#"{"code":"NotFound.File","message":"The resource file cannot be found.","requestId":"abc"}"#;

        let err = decode_body::<DownloadUrl>(200, body).unwrap_err();
        match err {
            DriveError::Service {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "NotFound.File");
                assert_eq!(message, "The resource file cannot be found.");
                assert_eq!(request_id.as_deref(), Some("abc"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_code_is_not_an_error() {
        let body = r#"{"code":"","url":"https://cdn.example.com/f","expiration":"2024-01-01T00:00:00Z"}"#;

        let url: DownloadUrl = decode_body(200, body).unwrap();
        assert_eq!(url.url, "https://cdn.example.com/f");
    }

    #[test]
    fn test_non_json_error_status() {
        let err = decode_body::<DownloadUrl>(502, "Bad Gateway").unwrap_err();
        assert!(matches!(err, DriveError::Http { status: 502, .. }));
    }

    #[test]
    fn test_invalid_json_on_success_is_decode_error() {
        let err = decode_body::<DownloadUrl>(200, "not json").unwrap_err();
        assert!(matches!(err, DriveError::Decode(_)));
    }

    #[test]
    fn test_wrong_shape_is_decode_error() {
        let err = decode_body::<DownloadUrl>(200, r#"{"expiration": 5}"#).unwrap_err();
        assert!(matches!(err, DriveError::Decode(_)));
    }

    #[tokio::test]
    async fn test_write_stream_writes_every_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(b"hello ".to_vec()),
            Ok(b"drive".to_vec()),
        ]);

        let written = write_stream(chunks, &path).await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello drive");
    }

    #[tokio::test]
    async fn test_write_stream_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let chunks = futures::stream::iter(vec![
            Ok(b"hello".to_vec()),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ]);

        let err = write_stream(chunks, &path).await.unwrap_err();

        assert!(matches!(err, DriveError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_qrcode_status_path() {
        assert_eq!(qrcode_status_path("sid-1"), "/oauth/qrcode/sid-1/status");
    }
}
