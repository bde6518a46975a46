use std::collections::HashMap;
use std::io::{Cursor, Write};

use bytes::Bytes;
use converter_core::{
    archive_file_name, archive_path, output_name, ItemId, ItemRepository, TargetFormat, WorkItem,
};
use engine_logging::{engine_debug, engine_info};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_MIME: &str = "application/zip";

/// A download: file name plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlob {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Bytes,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("item {0} does not exist")]
    NotFound(ItemId),
    #[error("item {0} has not been converted yet")]
    NotConverted(ItemId),
    #[error("archive write failed: {0}")]
    Archive(String),
}

pub fn export_one(
    repository: &ItemRepository,
    id: ItemId,
    target: TargetFormat,
) -> Result<NamedBlob, ExportError> {
    let item = repository.get(id).ok_or(ExportError::NotFound(id))?;
    converted_blob(item, target).ok_or(ExportError::NotConverted(id))
}

/// Every converted item as its own download, in repository order. Unconverted
/// items are skipped.
pub fn export_all_flat(repository: &ItemRepository, target: TargetFormat) -> Vec<NamedBlob> {
    repository
        .converted()
        .filter_map(|item| converted_blob(item, target))
        .collect()
}

/// All converted items in one zip, archive members keeping their directories.
///
/// Returns `None` when nothing has been converted. Two items mapping to the same
/// path keep the first one's position and the last one's content.
pub fn export_all_as_archive(
    repository: &ItemRepository,
    target: TargetFormat,
) -> Result<Option<NamedBlob>, ExportError> {
    let mut entries: Vec<(String, Bytes)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for item in repository.converted() {
        let Some(preview) = item.converted_preview() else {
            continue;
        };
        let path = archive_path(item, target);
        match positions.get(&path) {
            Some(&index) => {
                engine_debug!("archive path {} written twice; keeping the later item", path);
                entries[index].1 = preview.bytes.clone();
            }
            None => {
                positions.insert(path.clone(), entries.len());
                entries.push((path, preview.bytes.clone()));
            }
        }
    }
    if entries.is_empty() {
        return Ok(None);
    }

    let archive_err = |err: zip::result::ZipError| ExportError::Archive(err.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, bytes) in &entries {
        writer.start_file(path.as_str(), options).map_err(archive_err)?;
        writer
            .write_all(bytes)
            .map_err(|err| ExportError::Archive(err.to_string()))?;
    }
    let cursor = writer.finish().map_err(archive_err)?;
    let blob = NamedBlob {
        name: archive_file_name(target),
        mime: ARCHIVE_MIME,
        bytes: Bytes::from(cursor.into_inner()),
    };
    engine_info!("packed {} items into {}", entries.len(), blob.name);
    Ok(Some(blob))
}

fn converted_blob(item: &WorkItem, target: TargetFormat) -> Option<NamedBlob> {
    let preview = item.converted_preview()?;
    Some(NamedBlob {
        name: output_name(&item.source.name, target),
        mime: preview.mime,
        bytes: preview.bytes.clone(),
    })
}
