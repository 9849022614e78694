//! Request parameters for file operations.
//!
//! `FileOptions` is a plain value: constructors apply the vendor defaults for
//! one operation and every `with_*` method consumes the value and returns a new
//! one, so an options value can be cloned and reused safely.

use serde::Serialize;

use crate::models::FileType;
use crate::split::FilePart;

/// Folder id of the drive root.
pub const ROOT_FOLDER: &str = "root";

const DEFAULT_LIST_LIMIT: u32 = 100;
const DEFAULT_LIST_URL_EXPIRE_SEC: u64 = 86_400;
const DEFAULT_DOWNLOAD_EXPIRE_SEC: u64 = 115_200;
const DEFAULT_VIDEO_URL_EXPIRE_SEC: u64 = 14_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
    Size,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Video,
    Audio,
    Image,
    Doc,
    Zip,
    Others,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Image => "image",
            FileCategory::Doc => "doc",
            FileCategory::Zip => "zip",
            FileCategory::Others => "others",
        }
    }
}

/// What the server does when the target name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckNameMode {
    Refuse,
    AutoRename,
    Ignore,
}

/// Optional fields the list call can be asked to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseField {
    Url,
    Thumbnail,
    VideoMetadata,
}

impl ResponseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseField::Url => "url",
            ResponseField::Thumbnail => "thumbnail",
            ResponseField::VideoMetadata => "video_metadata",
        }
    }
}

/// Wire form of a part descriptor sent with the create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartInfo {
    pub part_number: u32,
    pub parallel_sha1_ctx: PartRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRange {
    pub part_offset: u64,
    pub part_size: u64,
}

impl From<&FilePart> for PartInfo {
    fn from(part: &FilePart) -> Self {
        Self {
            part_number: part.part_number,
            parallel_sha1_ctx: PartRange {
                part_offset: part.offset,
                part_size: part.size,
            },
        }
    }
}

/// Parameters for a single file operation. Unset fields are left off the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full path below the root, for lookups by path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Download URL lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_sec: Option<u64>,
    /// Lifetime of URLs embedded in listings and video play info.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_expire_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_parent_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_name_mode: Option<CheckNameMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_thumbnail_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_thumbnail_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_thumbnail_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_info_list: Option<Vec<PartInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

fn folder_or_root(parent_file_id: &str) -> String {
    if parent_file_id.is_empty() {
        ROOT_FOLDER.to_string()
    } else {
        parent_file_id.to_string()
    }
}

impl FileOptions {
    /// Listing of one folder, first page, sorted by name ascending.
    pub fn list(parent_file_id: &str) -> Self {
        Self {
            parent_file_id: Some(folder_or_root(parent_file_id)),
            limit: Some(DEFAULT_LIST_LIMIT),
            order_by: Some(OrderBy::Name),
            order_direction: Some(OrderDirection::Asc),
            url_expire_sec: Some(DEFAULT_LIST_URL_EXPIRE_SEC),
            fields: Some("*".to_string()),
            ..Default::default()
        }
    }

    /// A single file addressed by id.
    pub fn file(file_id: &str) -> Self {
        Self {
            file_id: Some(file_id.to_string()),
            ..Default::default()
        }
    }

    /// A single file addressed by its path below the root.
    pub fn by_path(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    /// New entry under `parent_file_id`; name clashes are auto-renamed.
    pub fn create(parent_file_id: &str, name: &str) -> Self {
        Self {
            parent_file_id: Some(folder_or_root(parent_file_id)),
            name: Some(name.to_string()),
            check_name_mode: Some(CheckNameMode::AutoRename),
            ..Default::default()
        }
    }

    pub fn upload(parent_file_id: &str, name: &str) -> Self {
        Self::create(parent_file_id, name).with_type(FileType::File)
    }

    pub fn folder(parent_file_id: &str, name: &str) -> Self {
        Self::create(parent_file_id, name).with_type(FileType::Folder)
    }

    pub fn rename(file_id: &str, new_name: &str) -> Self {
        Self::file(file_id).with_name(new_name)
    }

    pub fn move_or_copy(file_id: &str, to_parent_file_id: &str) -> Self {
        Self {
            file_id: Some(file_id.to_string()),
            to_parent_file_id: Some(folder_or_root(to_parent_file_id)),
            check_name_mode: Some(CheckNameMode::AutoRename),
            ..Default::default()
        }
    }

    pub fn download_url(file_id: &str) -> Self {
        Self::file(file_id).with_expire_sec(DEFAULT_DOWNLOAD_EXPIRE_SEC)
    }

    pub fn video_play_info(file_id: &str) -> Self {
        Self {
            file_id: Some(file_id.to_string()),
            category: Some("live_transcoding".to_string()),
            url_expire_sec: Some(DEFAULT_VIDEO_URL_EXPIRE_SEC),
            ..Default::default()
        }
    }

    pub fn with_drive_id(mut self, drive_id: &str) -> Self {
        self.drive_id = Some(drive_id.to_string());
        self
    }

    /// Fill in the drive id only when none was given.
    pub(crate) fn or_drive_id(mut self, drive_id: &str) -> Self {
        if self.drive_id.as_deref().map_or(true, str::is_empty) {
            self.drive_id = Some(drive_id.to_string());
        }
        self
    }

    pub(crate) fn or_parent_file_id(mut self, parent_file_id: &str) -> Self {
        if self.parent_file_id.as_deref().map_or(true, str::is_empty) {
            self.parent_file_id = Some(parent_file_id.to_string());
        }
        self
    }

    pub(crate) fn or_check_name_mode(mut self, mode: CheckNameMode) -> Self {
        self.check_name_mode.get_or_insert(mode);
        self
    }

    pub fn with_parent_file_id(mut self, parent_file_id: &str) -> Self {
        self.parent_file_id = Some(folder_or_root(parent_file_id));
        self
    }

    pub fn with_file_id(mut self, file_id: &str) -> Self {
        self.file_id = Some(file_id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_expire_sec(mut self, expire_sec: u64) -> Self {
        self.expire_sec = Some(expire_sec);
        self
    }

    pub fn with_url_expire_sec(mut self, url_expire_sec: u64) -> Self {
        self.url_expire_sec = Some(url_expire_sec);
        self
    }

    pub fn with_check_name_mode(mut self, mode: CheckNameMode) -> Self {
        self.check_name_mode = Some(mode);
        self
    }

    pub fn with_new_name(mut self, new_name: &str) -> Self {
        self.new_name = Some(new_name.to_string());
        self
    }

    /// Page marker from the previous listing; empty means first page.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = if marker.is_empty() {
            None
        } else {
            Some(marker.to_string())
        };
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, order_by: OrderBy, direction: OrderDirection) -> Self {
        self.order_by = Some(order_by);
        self.order_direction = Some(direction);
        self
    }

    pub fn with_categories(mut self, categories: &[FileCategory]) -> Self {
        let joined = categories
            .iter()
            .map(FileCategory::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.category = Some(joined);
        self
    }

    /// Restrict a listing to files or folders. Overrides any category filter server-side.
    pub fn with_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_video_thumbnail_time(mut self, seconds: u64) -> Self {
        self.video_thumbnail_time = Some(seconds);
        self
    }

    /// Sets both the video and the image thumbnail width.
    pub fn with_thumbnail_width(mut self, width: u32) -> Self {
        self.video_thumbnail_width = Some(width);
        self.image_thumbnail_width = Some(width);
        self
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.join(","));
        self
    }

    pub fn with_response_fields(mut self, fields: &[ResponseField]) -> Self {
        let joined = fields
            .iter()
            .map(ResponseField::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.fields = Some(joined);
        self
    }

    pub(crate) fn with_parts(mut self, parts: &[FilePart]) -> Self {
        self.part_info_list = Some(parts.iter().map(PartInfo::from).collect());
        self
    }
}
