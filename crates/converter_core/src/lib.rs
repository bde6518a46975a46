//! Converter core: format catalog, item repository and the pure state machine.
mod effect;
mod format;
mod msg;
mod naming;
mod repository;
mod state;
mod update;
mod view_model;

pub use effect::{ConvertJob, Effect};
pub use format::{
    detect_format, is_image_name, list_formats, list_targets, mime_for, normalize_token,
    FormatError, FormatToken, TargetFormat, JPEG_QUALITY,
};
pub use msg::{InputFile, Msg};
pub use naming::{archive_file_name, archive_path, output_name};
pub use repository::{
    ConversionState, ItemId, ItemOrigin, ItemRepository, NewItem, Preview, SourceImage, WorkItem,
};
pub use state::{AppState, BatchId, IngestIssue, Notice};
pub use update::update;
pub use view_model::{AppViewModel, ItemRowView, ItemStatus};
