use std::io::{Cursor, Read};

use bytes::Bytes;
use converter_core::is_image_name;
use engine_logging::{engine_debug, engine_warn};
use thiserror::Error;
use zip::ZipArchive;

/// Members larger than this are skipped.
pub const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("archive cannot be opened: {0}")]
    Unreadable(String),
    #[error("archive entry {index} cannot be read: {message}")]
    Entry { index: usize, message: String },
}

/// One image member of an archive, with its sanitized root-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Bytes,
}

impl ArchiveEntry {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Single pass over the image members of an archive, in archive order.
pub struct ArchiveEntries {
    archive: ZipArchive<Cursor<Bytes>>,
    next_index: usize,
    max_entry_size: u64,
}

/// Open an archive blob for extraction.
pub fn unpack(bytes: Bytes) -> Result<ArchiveEntries, ArchiveError> {
    unpack_with_limit(bytes, MAX_ENTRY_SIZE)
}

pub fn unpack_with_limit(bytes: Bytes, max_entry_size: u64) -> Result<ArchiveEntries, ArchiveError> {
    let archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ArchiveError::Unreadable(err.to_string()))?;
    engine_debug!("archive opened with {} entries", archive.len());
    Ok(ArchiveEntries {
        archive,
        next_index: 0,
        max_entry_size,
    })
}

impl Iterator for ArchiveEntries {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let mut file = match self.archive.by_index(index) {
                Ok(file) => file,
                Err(err) => {
                    return Some(Err(ArchiveError::Entry {
                        index,
                        message: err.to_string(),
                    }))
                }
            };
            if file.is_dir() {
                continue;
            }
            let Some(path) = sanitize_entry_path(file.name()) else {
                engine_warn!("skipping archive entry with unsafe path {:?}", file.name());
                continue;
            };
            if !is_image_name(&path) {
                engine_debug!("skipping non-image archive entry {}", path);
                continue;
            }
            if file.size() > self.max_entry_size {
                engine_warn!(
                    "skipping archive entry {} ({} bytes exceeds limit {})",
                    path,
                    file.size(),
                    self.max_entry_size
                );
                continue;
            }

            // The declared size can lie; cap what is actually inflated.
            let mut buf = Vec::with_capacity(file.size() as usize);
            let limit = self.max_entry_size.saturating_add(1);
            if let Err(err) = (&mut file).take(limit).read_to_end(&mut buf) {
                return Some(Err(ArchiveError::Entry {
                    index,
                    message: err.to_string(),
                }));
            }
            if buf.len() as u64 > self.max_entry_size {
                engine_warn!(
                    "skipping archive entry {} (inflates past limit {})",
                    path,
                    self.max_entry_size
                );
                continue;
            }
            return Some(Ok(ArchiveEntry {
                path,
                bytes: Bytes::from(buf),
            }));
        }
        None
    }
}

/// Normalise separators and reject anything that could escape the archive root.
pub(crate) fn sanitize_entry_path(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if segments.is_empty() && s.ends_with(':') => return None,
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
