use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use converter_core::{
    archive_path, output_name, update, AppState, InputFile, Msg, Notice, TargetFormat,
};
use converter_engine::{
    ensure_output_dir, export_all_as_archive, export_all_flat, AtomicFileWriter, EngineConfig,
    NamedBlob,
};
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde::Serialize;

use crate::cli::ExportMode;
use crate::config::Settings;
use crate::effects::EffectRunner;

const MANIFEST_FILENAME: &str = "manifest.json";

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub items: usize,
    pub converted: usize,
    pub failed: usize,
    pub written: Vec<PathBuf>,
}

pub fn run(settings: &Settings) -> Result<RunSummary> {
    ensure_output_dir(&settings.output_dir)
        .with_context(|| format!("output directory {}", settings.output_dir.display()))?;

    let inputs = read_inputs(&settings.inputs);
    if inputs.is_empty() {
        bail!("none of the inputs could be read");
    }

    let mut session = Session::start(settings.engine.clone(), settings.stall_timeout);
    session.pump_until(AppState::is_surface_ready)?;

    session.dispatch(Msg::InputFormatSelected(settings.input_format));
    session.dispatch(Msg::OutputFormatSelected(settings.output_format));
    session.dispatch(Msg::InputsAdded(inputs));
    session.pump_until(|state| !state.is_ingesting())?;

    let items = session.state.repository().len();
    if items == 0 {
        engine_warn!("no convertible images found");
        return Ok(RunSummary::default());
    }
    engine_info!("converting {} images to {}", items, settings.output_format);

    session.dispatch(Msg::ConvertAllRequested {
        target: settings.output_format,
    });
    session.pump_until(AppState::is_idle)?;

    let converted = session.state.repository().converted().count();
    let mut summary = RunSummary {
        items,
        converted,
        failed: session.failures,
        written: Vec::new(),
    };

    let writer = AtomicFileWriter::new(settings.output_dir.clone());
    for blob in collect_blobs(&session.state, settings.output_format, settings.mode)? {
        let path = writer
            .write(&blob.name, &blob.bytes)
            .with_context(|| format!("writing {}", blob.name))?;
        engine_debug!("wrote {} ({} bytes)", path.display(), blob.bytes.len());
        summary.written.push(path);
    }

    if settings.write_manifest {
        let manifest = Manifest::build(&session.state, settings.output_format, settings.mode);
        let content = serde_json::to_vec_pretty(&manifest).context("serializing manifest")?;
        let path = writer
            .write(MANIFEST_FILENAME, &content)
            .context("writing manifest")?;
        summary.written.push(path);
    }

    engine_info!(
        "done: {} of {} converted, {} failed, {} files written to {}",
        summary.converted,
        summary.items,
        summary.failed,
        summary.written.len(),
        settings.output_dir.display()
    );
    Ok(summary)
}

fn collect_blobs(
    state: &AppState,
    target: TargetFormat,
    mode: ExportMode,
) -> Result<Vec<NamedBlob>> {
    let blobs = match mode {
        ExportMode::Flat => export_all_flat(state.repository(), target),
        ExportMode::Archive => export_all_as_archive(state.repository(), target)?
            .into_iter()
            .collect(),
    };
    Ok(blobs)
}

/// Reads every path; unreadable ones are logged and skipped. Mime hints come
/// from content sniffing so misnamed files are still classified correctly.
fn read_inputs(paths: &[PathBuf]) -> Vec<InputFile> {
    paths
        .iter()
        .filter_map(|path| match fs::read(path) {
            Ok(bytes) => {
                let mime = infer::get(&bytes).map(|kind| kind.mime_type());
                Some(InputFile::new(display_name(path), bytes, mime))
            }
            Err(err) => {
                engine_warn!("skipping {}: {}", path.display(), err);
                None
            }
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Owns the state and feeds it messages until a condition holds.
struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
    stall_timeout: Duration,
    failures: usize,
}

impl Session {
    fn start(config: EngineConfig, stall_timeout: Duration) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(config, msg_tx),
            msg_rx,
            stall_timeout,
            failures: 0,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            let done = view.items.iter().filter(|row| row.converted_bytes.is_some()).count();
            engine_debug!(
                "items={} done={} pending_ingests={} converting={}",
                view.item_count,
                done,
                view.pending_ingests,
                view.is_converting
            );
        }
        for notice in state.take_notices() {
            if matches!(notice, Notice::ConversionFailed { .. }) {
                self.failures += 1;
            }
            engine_warn!("{}", notice);
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn pump_until(&mut self, done: impl Fn(&AppState) -> bool) -> Result<()> {
        while !done(&self.state) {
            match self.msg_rx.recv_timeout(self.stall_timeout) {
                Ok(msg) => self.dispatch(msg),
                Err(RecvTimeoutError::Timeout) => bail!(
                    "no engine progress for {}s; giving up",
                    self.stall_timeout.as_secs()
                ),
                Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Manifest {
    generated_utc: String,
    output_format: String,
    mode: ExportMode,
    items: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    id: u64,
    source: String,
    archive_origin: Option<String>,
    converted: bool,
    output: Option<String>,
    bytes: Option<usize>,
}

impl Manifest {
    fn build(state: &AppState, target: TargetFormat, mode: ExportMode) -> Self {
        let items = state
            .repository()
            .iter()
            .map(|item| {
                let preview = item.converted_preview();
                let output = preview.map(|_| match mode {
                    ExportMode::Flat => output_name(&item.source.name, target),
                    ExportMode::Archive => archive_path(item, target),
                });
                ManifestEntry {
                    id: item.id.get(),
                    source: item.source.name.clone(),
                    archive_origin: item.archive_origin.clone(),
                    converted: preview.is_some(),
                    output,
                    bytes: preview.map(|preview| preview.bytes.len()),
                }
            })
            .collect();
        Self {
            generated_utc: Utc::now().to_rfc3339(),
            output_format: target.to_string(),
            mode,
            items,
        }
    }
}
