use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use converter_core::{BatchId, ConvertJob, InputFile};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::ingest::ingest;
use crate::surface::SharedSurface;
use crate::{EngineConfig, EngineEvent};

enum EngineCommand {
    Ingest {
        batch_id: BatchId,
        inputs: Vec<InputFile>,
    },
    Convert(ConvertJob),
}

/// Handle to the background worker that owns the rendering surface.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    // Without a runtime the surface never becomes ready and
                    // conversion requests stay no-ops.
                    engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            let surface = SharedSurface::new();
            let config = Arc::new(config);
            let _ = event_tx.send(EngineEvent::SurfaceReady);
            engine_info!("engine ready");

            while let Ok(command) = cmd_rx.recv() {
                let surface = surface.clone();
                let config = config.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&surface, &config, command, event_tx).await;
                });
            }
            engine_debug!("engine command channel closed");
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn ingest(&self, batch_id: BatchId, inputs: Vec<InputFile>) {
        self.send(EngineCommand::Ingest { batch_id, inputs });
    }

    pub fn convert(&self, job: ConvertJob) {
        self.send(EngineCommand::Convert(job));
    }

    /// Event receiver that does not keep the worker alive. Once every handle is
    /// dropped the worker stops and the receiver reports `Disconnected`.
    pub fn events(&self) -> EngineEvents {
        EngineEvents {
            event_rx: self.event_rx.clone(),
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("engine worker is gone; command dropped");
        }
    }
}

#[derive(Clone)]
pub struct EngineEvents {
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineEvents {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        let rx = self
            .event_rx
            .lock()
            .map_err(|_| RecvTimeoutError::Disconnected)?;
        rx.recv_timeout(timeout)
    }
}

async fn handle_command(
    surface: &SharedSurface,
    config: &EngineConfig,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Ingest { batch_id, inputs } => {
            let config = config.clone();
            let report = match tokio::task::spawn_blocking(move || ingest(inputs, &config)).await
            {
                Ok(report) => report,
                Err(err) => {
                    engine_error!("ingest batch {} panicked: {}", batch_id, err);
                    Default::default()
                }
            };
            let _ = event_tx.send(EngineEvent::IngestCompleted { batch_id, report });
        }
        EngineCommand::Convert(job) => {
            let id = job.id;
            engine_debug!("converting item {} to {}", id, job.target);
            let result = surface.convert(job).await;
            if let Err(err) = &result {
                engine_warn!("item {} failed: {}", id, err);
            }
            let _ = event_tx.send(EngineEvent::ConversionCompleted { id, result });
        }
    }
}
