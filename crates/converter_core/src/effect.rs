use crate::{BatchId, FormatToken, InputFile, ItemId, SourceImage, TargetFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Classify and unpack a batch of user inputs.
    Ingest {
        batch_id: BatchId,
        inputs: Vec<InputFile>,
    },
    /// Run one decode/encode cycle on the rendering surface.
    Convert(ConvertJob),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertJob {
    pub id: ItemId,
    pub source: SourceImage,
    pub hint: FormatToken,
    pub target: TargetFormat,
}
