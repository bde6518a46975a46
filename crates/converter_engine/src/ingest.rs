use bytes::Bytes;
use converter_core::{
    detect_format, is_image_name, list_targets, mime_for, IngestIssue, InputFile, ItemOrigin,
    NewItem, Preview, SourceImage,
};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::archive::unpack_with_limit;
use crate::EngineConfig;

const ARCHIVE_EXTENSION: &str = ".zip";
const ARCHIVE_MIME_TYPES: &[&str] = &["application/zip", "application/x-zip-compressed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Archive,
    Image,
    Unsupported,
}

/// Result of ingesting one batch: the new items in encounter order plus any
/// per-input problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub items: Vec<NewItem>,
    pub issues: Vec<IngestIssue>,
}

pub fn classify(input: &InputFile) -> InputKind {
    let mime = input.mime_hint.as_deref().map(str::trim);
    let is_archive_name = input
        .name
        .to_ascii_lowercase()
        .ends_with(ARCHIVE_EXTENSION);
    let is_archive_mime = mime.is_some_and(|m| {
        ARCHIVE_MIME_TYPES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(m))
    });
    if is_archive_name || is_archive_mime {
        return InputKind::Archive;
    }

    match mime {
        Some(m) if !m.is_empty() => {
            if m.to_ascii_lowercase().starts_with("image/") {
                InputKind::Image
            } else {
                InputKind::Unsupported
            }
        }
        _ if is_image_name(&input.name) => InputKind::Image,
        _ => InputKind::Unsupported,
    }
}

/// Classify every input and turn images and archive members into new items.
pub fn ingest(inputs: Vec<InputFile>, config: &EngineConfig) -> IngestReport {
    let mut report = IngestReport::default();
    for input in inputs {
        match classify(&input) {
            InputKind::Archive => ingest_archive(input, config, &mut report),
            InputKind::Image => {
                engine_debug!("ingesting image {}", input.name);
                let mime = preview_mime(&input.name, input.mime_hint.as_deref());
                report
                    .items
                    .push(new_item(input.name, input.bytes, mime, ItemOrigin::Loose));
            }
            InputKind::Unsupported => {
                engine_debug!(
                    "ignoring unsupported input {} (mime {:?})",
                    input.name,
                    input.mime_hint
                );
            }
        }
    }
    engine_info!(
        "ingested {} items ({} issues)",
        report.items.len(),
        report.issues.len()
    );
    report
}

fn ingest_archive(input: InputFile, config: &EngineConfig, report: &mut IngestReport) {
    let entries = match unpack_with_limit(input.bytes, config.max_entry_size) {
        Ok(entries) => entries,
        Err(err) => {
            engine_warn!("archive {} skipped: {}", input.name, err);
            report.issues.push(IngestIssue::ArchiveUnreadable {
                name: input.name,
                reason: err.to_string(),
            });
            return;
        }
    };

    let mut count = 0usize;
    for entry in entries {
        match entry {
            Ok(entry) => {
                let name = entry.file_name().to_string();
                let mime = preview_mime(&name, None);
                report.items.push(new_item(
                    name,
                    entry.bytes,
                    mime,
                    ItemOrigin::Archive { path: entry.path },
                ));
                count += 1;
            }
            Err(err) => engine_warn!("archive {}: {}", input.name, err),
        }
    }
    engine_debug!("archive {} yielded {} images", input.name, count);
}

/// A known `image/*` hint wins; otherwise the mime follows the file name.
fn preview_mime(name: &str, mime_hint: Option<&str>) -> &'static str {
    mime_hint
        .map(|hint| hint.trim().to_ascii_lowercase())
        .and_then(|hint| {
            list_targets()
                .map(|target| target.mime())
                .find(|mime| *mime == hint)
        })
        .unwrap_or_else(|| mime_for(detect_format(name)))
}

fn new_item(name: String, bytes: Bytes, mime: &'static str, origin: ItemOrigin) -> NewItem {
    let original_preview = Preview::new(mime, bytes.clone());
    NewItem {
        source: SourceImage { name, bytes },
        original_preview,
        origin,
    }
}
