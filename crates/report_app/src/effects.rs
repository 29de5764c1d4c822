use std::time::Duration;

use report_core::{Effect, Msg, SelectedFile, UploadFailure, UploadReceipt, UploadStage};
use report_engine::{
    ConversionReceipt, DeferredTask, EngineConfig, EngineError, EngineEvent, EngineHandle,
    ServiceError, TaskKind, UploadFile,
};
use report_logging::{report_debug, report_info, report_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(config)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUpload { session_id, file } => {
                    report_info!(
                        "SubmitUpload session_id={} name={} size={}",
                        session_id,
                        file.name,
                        file.size
                    );
                    self.engine.upload(session_id, upload_file(file));
                }
                Effect::ScheduleFinalize { session_id, delay } => {
                    self.engine
                        .schedule(session_id, DeferredTask::Finalize, delay);
                }
                Effect::CancelFinalize { session_id } => {
                    self.engine.cancel(session_id, TaskKind::Finalize);
                }
                Effect::Download {
                    session_id,
                    filename,
                } => {
                    report_info!("Download session_id={} filename={}", session_id, filename);
                    self.engine.download(session_id, filename);
                }
                Effect::ScheduleCleanup {
                    session_id,
                    filename,
                    delay,
                } => {
                    report_debug!(
                        "Cleanup of {} scheduled in {:?} (session {})",
                        filename,
                        delay,
                        session_id
                    );
                    self.engine
                        .schedule(session_id, DeferredTask::Cleanup { filename }, delay);
                }
            }
        }
    }

    pub fn next_event(&self, timeout: Duration) -> Option<EngineEvent> {
        self.engine.recv_timeout(timeout)
    }
}

/// Translates an engine event into the message the core understands.
///
/// Successful downloads have no core counterpart: the session stays in
/// `Success` whether or not the artifact has arrived yet.
pub fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Progress(progress) => Some(Msg::UploadProgress {
            session_id: progress.session_id,
            stage: map_stage(progress.stage),
        }),
        EngineEvent::UploadCompleted { session_id, result } => Some(Msg::UploadFinished {
            session_id,
            result: result.map(map_receipt).map_err(map_failure),
        }),
        EngineEvent::FinalizeElapsed { session_id } => Some(Msg::FinalizeElapsed { session_id }),
        EngineEvent::DownloadCompleted {
            session_id,
            filename,
            result,
        } => match result {
            Ok(path) => {
                report_info!("Saved {} to {:?}", filename, path);
                None
            }
            Err(err) => {
                report_warn!("Download of {} failed: {}", filename, err);
                Some(Msg::DownloadFailed {
                    session_id,
                    message: err.to_string(),
                })
            }
        },
        EngineEvent::CleanupCompleted {
            session_id,
            filename,
            result,
        } => Some(Msg::CleanupFinished {
            session_id,
            filename,
            succeeded: result.is_ok(),
        }),
    }
}

fn upload_file(file: SelectedFile) -> UploadFile {
    UploadFile {
        name: file.name,
        media_type: file.media_type,
        contents: file.contents,
    }
}

fn map_stage(stage: report_engine::UploadStage) -> UploadStage {
    match stage {
        report_engine::UploadStage::Dispatched => UploadStage::Dispatched,
        report_engine::UploadStage::ResponseReceived => UploadStage::ResponseReceived,
    }
}

fn map_receipt(receipt: ConversionReceipt) -> UploadReceipt {
    UploadReceipt {
        filename: receipt.filename,
        message: receipt.message,
    }
}

fn map_failure(err: ServiceError) -> UploadFailure {
    if err.is_service_reported() {
        UploadFailure::Service {
            message: err.server_error().map(ToOwned::to_owned),
        }
    } else {
        UploadFailure::Transport {
            description: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use report_core::{Msg, UploadFailure};
    use report_engine::{EngineEvent, FailureKind, ServiceError};

    use super::map_event;

    #[test]
    fn http_errors_become_service_failures() {
        let event = EngineEvent::UploadCompleted {
            session_id: 1,
            result: Err(ServiceError {
                kind: FailureKind::HttpStatus {
                    status: 500,
                    server_error: None,
                },
                message: "500 Internal Server Error".to_string(),
            }),
        };

        assert_eq!(
            map_event(event),
            Some(Msg::UploadFinished {
                session_id: 1,
                result: Err(UploadFailure::Service { message: None }),
            })
        );
    }

    #[test]
    fn transport_errors_keep_their_description() {
        let event = EngineEvent::UploadCompleted {
            session_id: 2,
            result: Err(ServiceError {
                kind: FailureKind::Timeout,
                message: "operation timed out".to_string(),
            }),
        };

        assert_eq!(
            map_event(event),
            Some(Msg::UploadFinished {
                session_id: 2,
                result: Err(UploadFailure::Transport {
                    description: "operation timed out".to_string(),
                }),
            })
        );
    }

    #[test]
    fn unparsable_error_page_shows_its_parse_error() {
        let event = EngineEvent::UploadCompleted {
            session_id: 4,
            result: Err(ServiceError {
                kind: FailureKind::InvalidResponse,
                message: "expected value at line 1 column 1".to_string(),
            }),
        };

        assert_eq!(
            map_event(event),
            Some(Msg::UploadFinished {
                session_id: 4,
                result: Err(UploadFailure::Transport {
                    description: "expected value at line 1 column 1".to_string(),
                }),
            })
        );
    }

    #[test]
    fn successful_download_has_no_message() {
        let event = EngineEvent::DownloadCompleted {
            session_id: 3,
            filename: "r1.pptx".to_string(),
            result: Ok("reports/r1.pptx".into()),
        };

        assert_eq!(map_event(event), None);
    }
}
