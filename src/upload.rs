//! Chunked file upload.
//!
//! An upload runs three phases against the API:
//! 1. create: announce the file and its part layout, receive one single-use
//!    upload URL per part plus an upload id;
//! 2. PUT every part, strictly in ascending order, reading the source forward
//!    only;
//! 3. complete: commit the upload and receive the file metadata.
//!
//! Any failure aborts the whole attempt. Part URLs cannot be reused, so the
//! caller restarts from phase 1.

use std::io;
use std::path::Path;

use serde_json::json;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::models::{CreatedFile, FileMetadata, FileType, UploadPart};
use crate::options::{CheckNameMode, FileOptions, ROOT_FOLDER};
use crate::split::{split_file, split_parts, FilePart};
use crate::transport;

fn protocol_error(code: &str, message: String) -> DriveError {
    DriveError::Service {
        code: code.to_string(),
        message,
        request_id: None,
    }
}

/// Pair each local part with the URL the server issued for it.
fn match_upload_urls<'a>(
    parts: &'a [FilePart],
    issued: &'a [UploadPart],
) -> Result<Vec<(&'a FilePart, &'a str)>> {
    if issued.len() != parts.len() {
        return Err(protocol_error(
            "PartCountMismatch",
            format!(
                "requested {} upload URLs, server issued {}",
                parts.len(),
                issued.len()
            ),
        ));
    }

    parts
        .iter()
        .map(|part| {
            issued
                .iter()
                .find(|u| u.part_number == part.part_number)
                .map(|u| (part, u.upload_url.as_str()))
                .ok_or_else(|| {
                    protocol_error(
                        "PartCountMismatch",
                        format!("no upload URL for part {}", part.part_number),
                    )
                })
        })
        .collect()
}

impl DriveClient {
    /// Upload a local file into a folder, named after the local file.
    ///
    /// Name clashes are resolved by the server with an automatic rename.
    ///
    /// # Arguments
    /// * `local_path` - Path to the local file
    /// * `parent_file_id` - ID of the destination folder (empty for the root)
    pub async fn upload_file<P: AsRef<Path>>(
        &self,
        local_path: P,
        parent_file_id: &str,
    ) -> Result<FileMetadata> {
        let local_path = local_path.as_ref();
        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DriveError::precondition(format!("file name of {}", local_path.display()))
            })?;

        let file = File::open(local_path).await?;
        let parts = split_file(&file, self.part_size).await?;

        self.upload_parts(file, &parts, FileOptions::upload(parent_file_id, filename))
            .await
    }

    /// Upload `len` bytes from `reader` as a new file described by `options`
    /// (at least a name; see [`FileOptions::upload`]).
    pub async fn upload<R>(&self, reader: R, len: u64, options: FileOptions) -> Result<FileMetadata>
    where
        R: AsyncRead + Unpin,
    {
        let parts = split_parts(len, self.part_size)?;
        self.upload_parts(reader, &parts, options).await
    }

    async fn upload_parts<R>(
        &self,
        mut reader: R,
        parts: &[FilePart],
        options: FileOptions,
    ) -> Result<FileMetadata>
    where
        R: AsyncRead + Unpin,
    {
        if options.name.as_deref().map_or(true, str::is_empty) {
            return Err(DriveError::precondition("file name"));
        }

        let options = self
            .scoped(options)
            .or_parent_file_id(ROOT_FOLDER)
            .or_check_name_mode(CheckNameMode::AutoRename)
            .with_type(FileType::File)
            .with_parts(parts);

        let created: CreatedFile = self.post(transport::API_CREATE, &options).await?;
        let upload_id = created
            .upload_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                protocol_error("MissingUploadId", "create returned no upload id".to_string())
            })?;
        info!(
            file_id = %created.file_id,
            name = ?options.name,
            parts = parts.len(),
            "Upload created"
        );

        let targets = match_upload_urls(parts, &created.part_info_list)?;

        for (part, url) in targets {
            let mut buf = Vec::with_capacity(part.size as usize);
            (&mut reader).take(part.size).read_to_end(&mut buf).await?;

            if buf.len() as u64 != part.size {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "part {} expected {} bytes, source ended after {}",
                        part.part_number,
                        part.size,
                        buf.len()
                    ),
                )
                .into());
            }

            self.transport()
                .put_part(url, part.part_number, buf)
                .await?;
            debug!(part_number = part.part_number, size = part.size, "Part uploaded");
        }

        let metadata: FileMetadata = self
            .post(
                transport::API_COMPLETE,
                &json!({
                    "drive_id": created.drive_id,
                    "file_id": created.file_id,
                    "upload_id": upload_id,
                }),
            )
            .await?;
        info!(file_id = %metadata.file_id, size = ?metadata.size, "Upload completed");

        Ok(metadata)
    }
}
