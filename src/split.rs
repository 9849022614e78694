//! Partitioning of a file into upload parts.
//!
//! A file no larger than the part size goes up as one part. Larger files are
//! cut into `len / part_size` parts and the remainder is merged into the last
//! one instead of becoming a short trailing part. The server expects exactly
//! this layout, so it must not change.

use tokio::fs::File;

use crate::error::{DriveError, Result};

/// One contiguous byte range of a file, uploaded with a single PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePart {
    /// 1-based, contiguous.
    pub part_number: u32,
    pub offset: u64,
    pub size: u64,
}

/// Split `len` bytes into parts of `part_size`.
pub fn split_parts(len: u64, part_size: u64) -> Result<Vec<FilePart>> {
    if part_size == 0 {
        return Err(DriveError::precondition("part size must be greater than zero"));
    }

    if len <= part_size {
        return Ok(vec![FilePart {
            part_number: 1,
            offset: 0,
            size: len,
        }]);
    }

    let count = len / part_size;
    let remainder = len % part_size;
    let count_u32 = u32::try_from(count)
        .map_err(|_| DriveError::precondition("file needs more parts than the API allows"))?;

    Ok((0..count_u32)
        .map(|i| {
            let last = u64::from(i) + 1 == count;
            FilePart {
                part_number: i + 1,
                offset: u64::from(i) * part_size,
                size: if last { part_size + remainder } else { part_size },
            }
        })
        .collect())
}

/// Split an open file using its size on disk.
pub async fn split_file(file: &File, part_size: u64) -> Result<Vec<FilePart>> {
    let len = file.metadata().await?.len();
    split_parts(len, part_size)
}
