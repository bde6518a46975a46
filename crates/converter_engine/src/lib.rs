//! Converter engine: archive IO, ingestion, the rendering surface worker and export.
mod archive;
mod engine;
mod export;
mod ingest;
mod persist;
mod surface;
mod types;

pub use archive::{unpack, unpack_with_limit, ArchiveEntries, ArchiveEntry, ArchiveError, MAX_ENTRY_SIZE};
pub use engine::{EngineEvents, EngineHandle};
pub use export::{export_all_as_archive, export_all_flat, export_one, ExportError, NamedBlob};
pub use ingest::{classify, ingest, IngestReport, InputKind};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use surface::{RenderSurface, SharedSurface, SurfaceError};
pub use types::{EngineConfig, EngineEvent};
