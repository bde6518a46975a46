use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use converter_core::{Effect, Msg};
use converter_engine::{EngineConfig, EngineEvent, EngineHandle};
use engine_logging::{engine_debug, engine_info, engine_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Self {
        let engine = EngineHandle::new(config);
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Ingest { batch_id, inputs } => {
                    engine_info!("Ingest batch_id={} inputs={}", batch_id, inputs.len());
                    self.engine.ingest(batch_id, inputs);
                }
                Effect::Convert(job) => {
                    engine_debug!(
                        "Convert id={} name={} hint={} target={}",
                        job.id,
                        job.source.name,
                        job.hint,
                        job.target
                    );
                    self.engine.convert(job);
                }
            }
        }
    }

    /// Forwards events until the engine shuts down or nobody listens any more.
    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let events = self.engine.events();
        thread::spawn(move || loop {
            match events.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    if msg_tx.send(map_event(event)).is_err() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    engine_debug!("engine event channel closed");
                    break;
                }
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SurfaceReady => Msg::SurfaceReady,
        EngineEvent::IngestCompleted { batch_id, report } => Msg::IngestFinished {
            batch_id,
            items: report.items,
            issues: report.issues,
        },
        EngineEvent::ConversionCompleted { id, result } => Msg::ConversionFinished {
            id,
            result: result.map_err(|err| {
                engine_warn!("Conversion {} failed: {}", id, err);
                err.to_string()
            }),
        },
    }
}
