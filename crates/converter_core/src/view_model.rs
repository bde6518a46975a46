use crate::{FormatToken, ItemId, TargetFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub items: Vec<ItemRowView>,
    pub item_count: usize,
    pub is_converting: bool,
    pub has_converted: bool,
    pub pending_ingests: usize,
    pub input_format: FormatToken,
    pub output_format: TargetFormat,
    pub formats: &'static [FormatToken],
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Idle,
    Converting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub id: ItemId,
    pub name: String,
    pub archive_origin: Option<String>,
    pub status: ItemStatus,
    pub original_bytes: usize,
    pub converted_bytes: Option<usize>,
}
