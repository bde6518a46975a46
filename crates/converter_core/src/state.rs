use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::effect::ConvertJob;
use crate::view_model::{AppViewModel, ItemRowView, ItemStatus};
use crate::{
    list_formats, ConversionState, Effect, FormatToken, ItemId, ItemRepository, NewItem, Preview,
    TargetFormat,
};

pub type BatchId = u64;

/// Non-fatal problem found while ingesting one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestIssue {
    ArchiveUnreadable { name: String, reason: String },
}

/// Something the user should be told about. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ArchiveUnreadable { name: String, reason: String },
    ConversionFailed { id: ItemId, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ArchiveUnreadable { name, reason } => {
                write!(f, "archive {name} could not be read: {reason}")
            }
            Notice::ConversionFailed { id, reason } => {
                write!(f, "conversion of item {id} failed: {reason}")
            }
        }
    }
}

impl From<IngestIssue> for Notice {
    fn from(issue: IngestIssue) -> Self {
        match issue {
            IngestIssue::ArchiveUnreadable { name, reason } => {
                Notice::ArchiveUnreadable { name, reason }
            }
        }
    }
}

/// A running "convert all": the queue is fixed when the batch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchRun {
    target: TargetFormat,
    queue: VecDeque<ItemId>,
    in_flight: Option<ItemId>,
}

/// A finished ingest batch waiting for earlier batches to land.
type IngestOutput = (Vec<NewItem>, Vec<IngestIssue>);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    repository: ItemRepository,
    batch: Option<BatchRun>,
    surface_ready: bool,
    input_format: FormatToken,
    output_format: TargetFormat,
    /// Keyed by batch id; `None` until the engine reports back.
    pending_ingests: BTreeMap<BatchId, Option<IngestOutput>>,
    next_batch_id: BatchId,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let items: Vec<ItemRowView> = self
            .repository
            .iter()
            .map(|item| ItemRowView {
                id: item.id,
                name: item.source.name.clone(),
                archive_origin: item.archive_origin.clone(),
                status: match item.state {
                    ConversionState::Idle => ItemStatus::Idle,
                    ConversionState::Converting => ItemStatus::Converting,
                    ConversionState::Done(_) => ItemStatus::Done,
                },
                original_bytes: item.original_preview.bytes.len(),
                converted_bytes: item.converted_preview().map(|p| p.bytes.len()),
            })
            .collect();

        AppViewModel {
            item_count: items.len(),
            items,
            is_converting: self.is_converting(),
            has_converted: self.repository.has_converted(),
            pending_ingests: self.pending_ingests.len(),
            input_format: self.input_format,
            output_format: self.output_format,
            formats: list_formats(),
            dirty: self.dirty,
        }
    }

    pub fn repository(&self) -> &ItemRepository {
        &self.repository
    }

    /// True while a "convert all" batch is running.
    pub fn is_converting(&self) -> bool {
        self.batch.is_some()
    }

    pub fn is_surface_ready(&self) -> bool {
        self.surface_ready
    }

    pub fn is_ingesting(&self) -> bool {
        !self.pending_ingests.is_empty()
    }

    /// True when no ingestion, batch or single conversion is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.is_ingesting()
            && !self.is_converting()
            && !self.repository.iter().any(|item| item.state.is_converting())
    }

    pub fn input_format(&self) -> FormatToken {
        self.input_format
    }

    pub fn output_format(&self) -> TargetFormat {
        self.output_format
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_ingest(&mut self) -> BatchId {
        self.next_batch_id += 1;
        self.pending_ingests.insert(self.next_batch_id, None);
        self.mark_dirty();
        self.next_batch_id
    }

    pub(crate) fn finish_ingest(
        &mut self,
        batch_id: BatchId,
        items: Vec<NewItem>,
        issues: Vec<IngestIssue>,
    ) {
        let Some(slot) = self.pending_ingests.get_mut(&batch_id) else {
            return;
        };
        if slot.is_some() {
            return;
        }
        *slot = Some((items, issues));
        // Batches land in request order, whatever order they finish in.
        while let Some(entry) = self.pending_ingests.first_entry() {
            if entry.get().is_none() {
                break;
            }
            if let Some((items, issues)) = entry.remove() {
                self.repository.append(items);
                self.notices.extend(issues.into_iter().map(Notice::from));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn mark_surface_ready(&mut self) {
        if !self.surface_ready {
            self.surface_ready = true;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_input_format(&mut self, token: FormatToken) {
        if self.input_format != token {
            self.input_format = token;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_output_format(&mut self, target: TargetFormat) {
        if self.output_format != target {
            self.output_format = target;
            self.mark_dirty();
        }
    }

    pub(crate) fn start_single(&mut self, id: ItemId, target: TargetFormat) -> Option<Effect> {
        if !self.surface_ready {
            return None;
        }
        let job = self.begin_conversion(id, target)?;
        Some(Effect::Convert(job))
    }

    pub(crate) fn start_batch(&mut self, target: TargetFormat) -> Option<Effect> {
        if !self.surface_ready || self.batch.is_some() {
            return None;
        }
        let queue: VecDeque<ItemId> = self
            .repository
            .iter()
            .filter(|item| item.state == ConversionState::Idle)
            .map(|item| item.id)
            .collect();
        if queue.is_empty() {
            return None;
        }
        self.batch = Some(BatchRun {
            target,
            queue,
            in_flight: None,
        });
        self.mark_dirty();
        self.next_batch_job()
    }

    pub(crate) fn apply_conversion_result(&mut self, id: ItemId, result: Result<Preview, String>) {
        let Some(item) = self.repository.get_mut(id) else {
            return;
        };
        if !item.state.is_converting() {
            return;
        }
        match result {
            Ok(preview) => item.state = ConversionState::Done(preview),
            Err(reason) => {
                item.state = ConversionState::Idle;
                self.notices.push(Notice::ConversionFailed { id, reason });
            }
        }
        self.mark_dirty();
    }

    /// Moves the batch on once its in-flight item reports back.
    pub(crate) fn advance_batch(&mut self, finished: ItemId) -> Option<Effect> {
        match &mut self.batch {
            Some(batch) if batch.in_flight == Some(finished) => batch.in_flight = None,
            _ => return None,
        }
        self.next_batch_job()
    }

    pub(crate) fn remove_item(&mut self, id: ItemId) {
        if self.repository.remove(id) {
            self.mark_dirty();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.repository.clear();
        self.batch = None;
        self.notices.clear();
        self.mark_dirty();
    }

    fn next_batch_job(&mut self) -> Option<Effect> {
        loop {
            let batch = self.batch.as_mut()?;
            let Some(next) = batch.queue.pop_front() else {
                self.batch = None;
                self.mark_dirty();
                return None;
            };
            let target = batch.target;
            // Items removed or converted individually since the batch started are skipped.
            let still_idle = self
                .repository
                .get(next)
                .is_some_and(|item| item.state == ConversionState::Idle);
            if !still_idle {
                continue;
            }
            let job = self.begin_conversion(next, target)?;
            if let Some(batch) = self.batch.as_mut() {
                batch.in_flight = Some(next);
            }
            return Some(Effect::Convert(job));
        }
    }

    fn begin_conversion(&mut self, id: ItemId, target: TargetFormat) -> Option<ConvertJob> {
        let hint = self.input_format;
        let item = self.repository.get_mut(id)?;
        if item.state.is_converting() {
            return None;
        }
        item.state = ConversionState::Converting;
        let job = ConvertJob {
            id,
            source: item.source.clone(),
            hint,
            target,
        };
        self.mark_dirty();
        Some(job)
    }
}
