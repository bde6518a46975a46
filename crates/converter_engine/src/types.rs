use converter_core::{BatchId, ItemId, Preview};

use crate::archive::MAX_ENTRY_SIZE;
use crate::ingest::IngestReport;
use crate::surface::SurfaceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Archive members above this size are skipped.
    pub max_entry_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_entry_size: MAX_ENTRY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The rendering surface exists; conversions can be requested.
    SurfaceReady,
    IngestCompleted {
        batch_id: BatchId,
        report: IngestReport,
    },
    ConversionCompleted {
        id: ItemId,
        result: Result<Preview, SurfaceError>,
    },
}
