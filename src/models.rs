//! Data models for Aliyun Drive open API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error envelope overlaid on every response body.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "requestId")]
    pub request_id: Option<String>,
}

/// Kind of a drive entry. `All` is only meaningful as a list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    All,
    File,
    Folder,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileType::All => "all",
            FileType::File => "file",
            FileType::Folder => "folder",
        };
        f.write_str(s)
    }
}

/// Metadata for a file or folder in the drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub drive_id: String,
    pub file_id: String,
    #[serde(default)]
    pub parent_file_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc64_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_media_metadata: Option<VideoMediaMetadata>,
}

impl FileMetadata {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Folder
    }
}

impl std::fmt::Display for FileMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.file_id, size_str, self.file_type, self.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMediaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One page of a folder listing.
#[derive(Debug, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<FileMetadata>,
    #[serde(default)]
    pub next_marker: Option<String>,
}

impl FileList {
    /// Marker for the next page; the vendor signals the last page with an empty string.
    pub fn next_page(&self) -> Option<&str> {
        self.next_marker.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadUrl {
    pub url: String,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// Result of move, copy, trash and delete calls.
#[derive(Debug, Deserialize)]
pub struct FileTask {
    #[serde(default)]
    pub drive_id: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub async_task_id: Option<String>,
    #[serde(default)]
    pub exist: bool,
}

#[derive(Debug, Deserialize)]
pub struct VideoPlayInfo {
    pub drive_id: String,
    pub file_id: String,
    pub video_preview_play_info: VideoPreviewPlayInfo,
}

#[derive(Debug, Deserialize)]
pub struct VideoPreviewPlayInfo {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub meta: Option<VideoMeta>,
    #[serde(default)]
    pub live_transcoding_task_list: Vec<TranscodingTask>,
}

#[derive(Debug, Deserialize)]
pub struct VideoMeta {
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct TranscodingTask {
    pub template_id: String,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub template_width: Option<u32>,
    #[serde(default)]
    pub template_height: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Response of the create call. For files this is the upload session:
/// one single-use URL per requested part.
#[derive(Debug, Deserialize)]
pub struct CreatedFile {
    pub drive_id: String,
    pub file_id: String,
    #[serde(default)]
    pub parent_file_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<FileType>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub rapid_upload: bool,
    #[serde(default)]
    pub exist: bool,
    #[serde(default)]
    pub part_info_list: Vec<UploadPart>,
}

#[derive(Debug, Deserialize)]
pub struct UploadPart {
    pub part_number: u32,
    pub upload_url: String,
    #[serde(default)]
    pub part_size: Option<u64>,
}

/// User and drive information.
#[derive(Debug, Deserialize)]
pub struct DriveInfo {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub default_drive_id: String,
    #[serde(default)]
    pub resource_drive_id: Option<String>,
    #[serde(default)]
    pub backup_drive_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpaceInfo {
    pub personal_space_info: PersonalSpaceInfo,
}

#[derive(Debug, Deserialize)]
pub struct PersonalSpaceInfo {
    pub used_size: u64,
    pub total_size: u64,
}

/// QR code issued for scan login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub qr_code_url: String,
    pub sid: String,
}

/// Scan state of a QR code.
///
/// Only three values are documented. Anything else is kept verbatim in
/// `Other` so the caller decides whether to keep polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QrStatus {
    WaitLogin,
    ScanSuccess,
    LoginSuccess,
    Other(String),
}

impl From<String> for QrStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "WaitLogin" => QrStatus::WaitLogin,
            "ScanSuccess" => QrStatus::ScanSuccess,
            "LoginSuccess" => QrStatus::LoginSuccess,
            _ => QrStatus::Other(s),
        }
    }
}

impl From<QrStatus> for String {
    fn from(status: QrStatus) -> Self {
        match status {
            QrStatus::WaitLogin => "WaitLogin".to_string(),
            QrStatus::ScanSuccess => "ScanSuccess".to_string(),
            QrStatus::LoginSuccess => "LoginSuccess".to_string(),
            QrStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeStatus {
    pub status: QrStatus,
    #[serde(default)]
    pub auth_code: Option<String>,
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_file_metadata_deserialize() {
        let json = r#"{
            "drive_id": "1001",
            "file_id": "63d2b8a1c0ffee0000000001",
            "parent_file_id": "root",
            "name": "test.txt",
            "type": "file",
            "size": 1024,
            "content_hash": "ABCDEF",
            "content_hash_name": "sha1",
            "created_at": "2023-01-26T17:10:57.123Z",
            "updated_at": "2023-01-26T17:10:57.123Z",
            "trashed": false
        }"#;

        let metadata: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.file_id, "63d2b8a1c0ffee0000000001");
        assert_eq!(metadata.name, "test.txt");
        assert_eq!(metadata.file_type, FileType::File);
        assert_eq!(metadata.size, Some(1024));
        assert_eq!(metadata.content_hash_name.as_deref(), Some("sha1"));
        assert!(metadata.created_at.is_some());
        assert!(!metadata.is_dir());
    }

    #[test]
    fn test_file_metadata_display() {
        let json = r#"{"drive_id":"1","file_id":"abc123","name":"test.txt","type":"file","size":1024}"#;
        let metadata: FileMetadata = serde_json::from_str(json).unwrap();

        let display = format!("{}", metadata);
        assert!(display.contains("abc123"));
        assert!(display.contains("test.txt"));
        assert!(display.contains("1.00 KB"));
    }

    #[test]
    fn test_file_list_last_page() {
        let list: FileList = serde_json::from_str(r#"{"items":[],"next_marker":""}"#).unwrap();
        assert_eq!(list.next_page(), None);

        let list: FileList = serde_json::from_str(r#"{"items":[],"next_marker":"m2"}"#).unwrap();
        assert_eq!(list.next_page(), Some("m2"));
    }

    #[test]
    fn test_qr_status_passes_unknown_values_through() {
        let status: QrCodeStatus =
            serde_json::from_str(r#"{"status":"QRCodeExpired"}"#).unwrap();
        assert_eq!(status.status, QrStatus::Other("QRCodeExpired".to_string()));
        assert!(status.auth_code.is_none());

        let status: QrCodeStatus =
            serde_json::from_str(r#"{"status":"LoginSuccess","authCode":"code-1"}"#).unwrap();
        assert_eq!(status.status, QrStatus::LoginSuccess);
        assert_eq!(status.auth_code.as_deref(), Some("code-1"));
    }
}
