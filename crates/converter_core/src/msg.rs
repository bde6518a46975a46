use bytes::Bytes;

use crate::{BatchId, FormatToken, IngestIssue, ItemId, NewItem, Preview, TargetFormat};

/// A user-supplied file: a loose image, an archive, or something to ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Bytes,
    pub mime_hint: Option<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>, mime_hint: Option<&str>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime_hint: mime_hint.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked files (images and/or archives).
    InputsAdded(Vec<InputFile>),
    /// Engine finished classifying and unpacking one input batch.
    IngestFinished {
        batch_id: BatchId,
        items: Vec<NewItem>,
        issues: Vec<IngestIssue>,
    },
    /// The engine's rendering surface is initialised and can take work.
    SurfaceReady,
    /// User changed the input format hint.
    InputFormatSelected(FormatToken),
    /// User changed the output format.
    OutputFormatSelected(TargetFormat),
    /// User asked to convert a single item.
    ConvertOneRequested { id: ItemId, target: TargetFormat },
    /// User asked to convert every pending item.
    ConvertAllRequested { target: TargetFormat },
    /// Engine completion for one conversion cycle.
    ConversionFinished {
        id: ItemId,
        result: Result<Preview, String>,
    },
    /// User removed one item.
    RemoveItem(ItemId),
    /// User cleared everything.
    ResetAll,
    NoOp,
}
