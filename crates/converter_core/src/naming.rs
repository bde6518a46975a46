use crate::{TargetFormat, WorkItem};

/// `{stem}_converted.{format}` for a single download.
///
/// Only the last extension is dropped, so inner dots survive:
/// `photo.v2.png` becomes `photo.v2_converted.{format}`, not `photo_converted.{format}`.
pub fn output_name(source_name: &str, target: TargetFormat) -> String {
    format!("{}_converted.{}", file_stem(source_name), target)
}

/// Path of an item inside the exported archive: the archive member's directory is kept,
/// loose and root-level items stay flat.
pub fn archive_path(item: &WorkItem, target: TargetFormat) -> String {
    let name = output_name(&item.source.name, target);
    match item
        .archive_origin
        .as_deref()
        .and_then(|origin| origin.rsplit_once('/'))
    {
        Some((dir, _)) if !dir.is_empty() => format!("{dir}/{name}"),
        _ => name,
    }
}

/// Name of the batch download archive.
pub fn archive_file_name(target: TargetFormat) -> String {
    format!("converted_images_{target}.zip")
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}
