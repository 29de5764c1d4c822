use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use report_logging::{report_debug, report_info, report_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::service::{
    ChannelProgressSink, ConversionService, ReqwestConversionService, ServiceSettings,
};
use crate::{EngineEvent, ServiceError, SessionId, UploadFile};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceSettings,
    /// Where downloaded reports are written.
    pub download_dir: PathBuf,
}

impl EngineConfig {
    pub fn new(base_url: Url, download_dir: PathBuf) -> Self {
        Self {
            service: ServiceSettings::new(base_url),
            download_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to configure conversion service: {0}")]
    Service(#[from] ServiceError),
}

/// Work that runs after a delay unless cancelled first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    Finalize,
    Cleanup { filename: String },
}

impl DeferredTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            DeferredTask::Finalize => TaskKind::Finalize,
            DeferredTask::Cleanup { .. } => TaskKind::Cleanup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Finalize,
    Cleanup,
}

enum EngineCommand {
    Upload {
        session_id: SessionId,
        file: UploadFile,
    },
    Download {
        session_id: SessionId,
        filename: String,
    },
    Schedule {
        session_id: SessionId,
        task: DeferredTask,
        delay: Duration,
    },
    Cancel {
        session_id: SessionId,
        kind: TaskKind,
    },
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let service = ReqwestConversionService::new(config.service)?;
        Self::with_service(Arc::new(service), config.download_dir)
    }

    pub fn with_service(
        service: Arc<dyn ConversionService>,
        download_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let mut deferred = DeferredRegistry::default();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    &service,
                    &download_dir,
                    &mut deferred,
                    command,
                    &event_tx,
                );
            }
            report_debug!("Engine command channel closed; shutting down runtime");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, session_id: SessionId, file: UploadFile) {
        let _ = self.cmd_tx.send(EngineCommand::Upload { session_id, file });
    }

    pub fn download(&self, session_id: SessionId, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            session_id,
            filename: filename.into(),
        });
    }

    /// Runs `task` after `delay`. Scheduling the same kind again for a session
    /// replaces the earlier one.
    pub fn schedule(&self, session_id: SessionId, task: DeferredTask, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::Schedule {
            session_id,
            task,
            delay,
        });
    }

    pub fn cancel(&self, session_id: SessionId, kind: TaskKind) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Cancel { session_id, kind });
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

#[derive(Default)]
struct DeferredRegistry {
    tokens: HashMap<(SessionId, TaskKind), CancellationToken>,
}

impl DeferredRegistry {
    fn register(&mut self, session_id: SessionId, kind: TaskKind) -> CancellationToken {
        // Finished tasks cancel their own token, so anything cancelled is done.
        self.tokens.retain(|_, token| !token.is_cancelled());
        let token = CancellationToken::new();
        if let Some(previous) = self.tokens.insert((session_id, kind), token.clone()) {
            previous.cancel();
        }
        token
    }

    fn cancel(&mut self, session_id: SessionId, kind: TaskKind) {
        if let Some(token) = self.tokens.remove(&(session_id, kind)) {
            token.cancel();
        }
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    service: &Arc<dyn ConversionService>,
    download_dir: &Path,
    deferred: &mut DeferredRegistry,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Upload { session_id, file } => {
            let service = service.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                report_info!("Uploading {} for session {}", file.name, session_id);
                let sink = ChannelProgressSink::new(event_tx.clone());
                let result = service.upload(session_id, &file, &sink).await;
                let _ = event_tx.send(EngineEvent::UploadCompleted { session_id, result });
            });
        }
        EngineCommand::Download {
            session_id,
            filename,
        } => {
            let service = service.clone();
            let event_tx = event_tx.clone();
            let download_dir = download_dir.to_path_buf();
            runtime.spawn(async move {
                let result = service.download(&filename, &download_dir).await;
                let _ = event_tx.send(EngineEvent::DownloadCompleted {
                    session_id,
                    filename,
                    result,
                });
            });
        }
        EngineCommand::Schedule {
            session_id,
            task,
            delay,
        } => {
            let token = deferred.register(session_id, task.kind());
            let service = service.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(run_deferred(service, session_id, task, delay, token, event_tx));
        }
        EngineCommand::Cancel { session_id, kind } => {
            report_debug!("Cancelling {:?} for session {}", kind, session_id);
            deferred.cancel(session_id, kind);
        }
    }
}

async fn run_deferred(
    service: Arc<dyn ConversionService>,
    session_id: SessionId,
    task: DeferredTask,
    delay: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    tokio::select! {
        _ = token.cancelled() => {
            report_debug!("{:?} for session {} cancelled", task.kind(), session_id);
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }
    token.cancel();

    match task {
        DeferredTask::Finalize => {
            let _ = event_tx.send(EngineEvent::FinalizeElapsed { session_id });
        }
        DeferredTask::Cleanup { filename } => {
            let result = service.cleanup(&filename).await;
            if let Err(err) = &result {
                report_warn!("Cleanup of {} failed ({}): {}", filename, err.kind, err);
            }
            let _ = event_tx.send(EngineEvent::CleanupCompleted {
                session_id,
                filename,
                result,
            });
        }
    }
}
