//! Aliyun Drive API client for file operations.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::config::{ClientConfig, DEFAULT_PART_SIZE};
use crate::error::{DriveError, Result};
use crate::models::{
    CreatedFile, DownloadUrl, DriveInfo, FileList, FileMetadata, FileTask, SpaceInfo,
    VideoPlayInfo,
};
use crate::options::FileOptions;
use crate::transport::{self, Transport};

/// Length of the file-id tail appended to names on move/copy.
const NAME_SUFFIX_LEN: usize = 8;

pub(crate) async fn fetch_drive_info(transport: &Transport, access_token: &str) -> Result<DriveInfo> {
    transport
        .post_json(transport::API_DRIVE_INFO, Some(access_token), &json!({}))
        .await
}

/// `"<name>_<last 8 chars of file_id>"`, used as the destination name on move/copy.
pub fn collision_safe_name(name: &str, file_id: &str) -> String {
    let tail_start = file_id
        .char_indices()
        .rev()
        .nth(NAME_SUFFIX_LEN - 1)
        .map_or(0, |(i, _)| i);
    format!("{}_{}", name, &file_id[tail_start..])
}

/// Client for one authorized drive.
pub struct DriveClient {
    transport: Transport,
    session: Session,
    pub(crate) part_size: u64,
}

impl DriveClient {
    /// Create a new DriveClient.
    ///
    /// # Arguments
    /// * `transport` - HTTP transport to send requests with
    /// * `session` - Authorized session; its drive id is the default for every call
    pub fn new(transport: Transport, session: Session) -> Self {
        Self {
            transport,
            session,
            part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Build the transport from configuration, including the upload part size.
    pub fn from_config(config: &ClientConfig, session: Session) -> Result<Self> {
        let transport = Transport::new(config)?;
        Ok(Self::new(transport, session).with_part_size(config.part_size))
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    pub fn drive_id(&self) -> &str {
        &self.session.drive_id
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.transport
            .post_json(path, Some(&self.session.access_token), body)
            .await
    }

    pub(crate) fn scoped(&self, options: FileOptions) -> FileOptions {
        options.or_drive_id(&self.session.drive_id)
    }

    /// User and default-drive information.
    pub async fn drive_info(&self) -> Result<DriveInfo> {
        fetch_drive_info(&self.transport, &self.session.access_token).await
    }

    /// Used and total space.
    pub async fn space_info(&self) -> Result<SpaceInfo> {
        self.post(transport::API_SPACE_INFO, &json!({})).await
    }

    /// One page of a folder listing.
    pub async fn list(&self, options: FileOptions) -> Result<FileList> {
        let options = self.scoped(options);
        debug!(parent = ?options.parent_file_id, marker = ?options.marker, "Listing folder");
        self.post(transport::API_LIST, &options).await
    }

    /// Every entry of a folder, following page markers.
    pub async fn list_all(&self, parent_file_id: &str) -> Result<Vec<FileMetadata>> {
        let base = FileOptions::list(parent_file_id);
        let mut all_files = Vec::new();
        let mut marker = String::new();

        loop {
            let page = self.list(base.clone().with_marker(&marker)).await?;
            let next = page.next_page().map(str::to_string);
            all_files.extend(page.items);

            match next {
                Some(m) => marker = m,
                None => break,
            }
        }

        Ok(all_files)
    }

    pub async fn get(&self, options: FileOptions) -> Result<FileMetadata> {
        let options = self.scoped(options);
        self.post(transport::API_GET, &options).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<FileMetadata> {
        if file_id.is_empty() {
            return Err(DriveError::precondition("file id"));
        }
        self.get(FileOptions::file(file_id)).await
    }

    /// Look a file up by its path below the root, e.g. `/docs/a.txt`.
    pub async fn get_by_path(&self, path: &str) -> Result<FileMetadata> {
        if path.is_empty() {
            return Err(DriveError::precondition("path"));
        }
        self.get(FileOptions::by_path(path)).await
    }

    /// Metadata for several files in one call.
    pub async fn get_batch(&self, options: &[FileOptions]) -> Result<FileList> {
        if options.is_empty() {
            return Err(DriveError::precondition("file list"));
        }

        let file_list: Vec<FileOptions> = options.iter().cloned().map(|o| self.scoped(o)).collect();
        self.post(transport::API_BATCH_GET, &json!({ "file_list": file_list }))
            .await
    }

    pub async fn rename(&self, file_id: &str, new_name: &str) -> Result<FileMetadata> {
        if file_id.is_empty() || new_name.is_empty() {
            return Err(DriveError::precondition("file id and new name"));
        }

        let options = self.scoped(FileOptions::rename(file_id, new_name));
        self.post(transport::API_UPDATE, &options).await
    }

    pub async fn create_folder(&self, parent_file_id: &str, name: &str) -> Result<CreatedFile> {
        if name.is_empty() {
            return Err(DriveError::precondition("folder name"));
        }

        let options = self.scoped(FileOptions::folder(parent_file_id, name));
        self.post(transport::API_CREATE, &options).await
    }

    /// Move a file into another folder under a collision-safe name.
    pub async fn move_to(&self, file_id: &str, to_parent_file_id: &str) -> Result<FileTask> {
        self.move_or_copy(FileOptions::move_or_copy(file_id, to_parent_file_id), true)
            .await
    }

    /// Copy a file into another folder under a collision-safe name.
    pub async fn copy_to(&self, file_id: &str, to_parent_file_id: &str) -> Result<FileTask> {
        self.move_or_copy(FileOptions::move_or_copy(file_id, to_parent_file_id), false)
            .await
    }

    /// Move or copy with caller-supplied options. The current metadata is
    /// fetched first so the destination name can be derived from it.
    pub async fn move_or_copy(&self, options: FileOptions, is_move: bool) -> Result<FileTask> {
        let options = self.scoped(options);
        if options.file_id.as_deref().map_or(true, str::is_empty) {
            return Err(DriveError::precondition("file id"));
        }

        let file = self.get(options.clone()).await?;
        let options = options.with_new_name(&collision_safe_name(&file.name, &file.file_id));

        let path = if is_move {
            transport::API_MOVE
        } else {
            transport::API_COPY
        };
        debug!(file_id = %file.file_id, new_name = ?options.new_name, is_move, "Moving/copying file");

        self.post(path, &options).await
    }

    pub async fn trash(&self, file_id: &str) -> Result<FileTask> {
        if file_id.is_empty() {
            return Err(DriveError::precondition("file id"));
        }
        let options = self.scoped(FileOptions::file(file_id));
        self.post(transport::API_TRASH, &options).await
    }

    /// Delete permanently, bypassing the recycle bin.
    pub async fn delete(&self, file_id: &str) -> Result<FileTask> {
        if file_id.is_empty() {
            return Err(DriveError::precondition("file id"));
        }
        let options = self.scoped(FileOptions::file(file_id));
        self.post(transport::API_DELETE, &options).await
    }

    pub async fn download_url(&self, options: FileOptions) -> Result<DownloadUrl> {
        let options = self.scoped(options);
        self.post(transport::API_DOWNLOAD_URL, &options).await
    }

    /// Download a file to a local path.
    ///
    /// # Arguments
    /// * `file_id` - The ID of the file to download
    /// * `destination` - A local file path, or a directory to save under the remote name
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        file_id: &str,
        destination: P,
    ) -> Result<(FileMetadata, PathBuf)> {
        let destination = destination.as_ref();
        let metadata = self.get_file(file_id).await?;

        let final_path = if destination.is_dir() {
            destination.join(&metadata.name)
        } else {
            destination.to_path_buf()
        };

        let link = self.download_url(FileOptions::download_url(file_id)).await?;
        let written = self.transport.download_to(&link.url, &final_path).await?;
        debug!(file_id, bytes = written, path = %final_path.display(), "Downloaded file");

        Ok((metadata, final_path))
    }

    pub async fn video_play_info(&self, file_id: &str) -> Result<VideoPlayInfo> {
        if file_id.is_empty() {
            return Err(DriveError::precondition("file id"));
        }
        let options = self.scoped(FileOptions::video_play_info(file_id));
        self.post(transport::API_VIDEO_PLAY_INFO, &options).await
    }

    /// Replace every occurrence of `old` with `new` in a file's name, or in
    /// the names of all direct children when `file_id` is a folder.
    ///
    /// For folders every page is walked and failures are collected; the call
    /// succeeds only if every matching child was renamed.
    pub async fn replace_name(&self, file_id: &str, old: &str, new: &str) -> Result<()> {
        if old.is_empty() {
            return Err(DriveError::precondition("text to replace"));
        }

        let file = self.get_file(file_id).await?;

        if !file.is_dir() {
            if !file.name.contains(old) {
                return Err(DriveError::NoMatch {
                    file_id: file.file_id,
                    name: file.name,
                    pattern: old.to_string(),
                });
            }
            self.rename(&file.file_id, &file.name.replace(old, new))
                .await?;
            return Ok(());
        }

        let base = FileOptions::list(&file.file_id);
        let mut failures = Vec::new();
        let mut marker = String::new();

        loop {
            let page = self.list(base.clone().with_marker(&marker)).await?;

            for child in page.items.iter().filter(|f| f.name.contains(old)) {
                let new_name = child.name.replace(old, new);
                if let Err(err) = self.rename(&child.file_id, &new_name).await {
                    warn!(file_id = %child.file_id, error = %err, "Rename failed");
                    failures.push(format!("{}:{}", child.file_id, err));
                }
            }

            match page.next_page() {
                Some(m) => marker = m.to_string(),
                None => break,
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DriveError::PartialBatch(failures))
        }
    }
}
