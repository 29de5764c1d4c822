use report_logging::{report_debug, report_info, report_warn};

use crate::validate::validate_selection;
use crate::{AppState, Effect, Msg, SelectedFile, SessionId, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(None) => Vec::new(),
        Msg::FileSelected(Some(file)) => select_file(&mut state, file),
        Msg::UploadProgress { session_id, stage } => {
            if accepts_engine_result(&state, session_id) {
                state.apply_stage(stage);
            }
            Vec::new()
        }
        Msg::UploadFinished { session_id, result } => {
            if !accepts_engine_result(&state, session_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(receipt) => {
                    report_info!(
                        "Session {} conversion succeeded, artifact {}",
                        session_id,
                        receipt.filename
                    );
                    state.hold_receipt(receipt);
                    vec![Effect::ScheduleFinalize {
                        session_id,
                        delay: state.config().finalize_delay,
                    }]
                }
                Err(failure) => {
                    report_warn!("Session {} conversion failed: {:?}", session_id, failure);
                    state.fail(failure.user_message());
                    Vec::new()
                }
            }
        }
        Msg::FinalizeElapsed { session_id } => {
            if state.is_current(session_id) && !state.complete() {
                report_debug!("Finalize for session {} had nothing pending", session_id);
            }
            Vec::new()
        }
        Msg::DownloadClicked => download(&mut state),
        Msg::DownloadFailed {
            session_id,
            message,
        } => {
            if state.is_current(session_id) && state.session().state() == SessionState::Success {
                state.fail(format!("Error downloading file: {message}"));
            }
            Vec::new()
        }
        Msg::CleanupFinished {
            session_id,
            filename,
            succeeded,
        } => {
            if succeeded {
                report_debug!("Cleanup of {} (session {}) done", filename, session_id);
            } else {
                report_debug!("Cleanup of {} (session {}) failed; ignored", filename, session_id);
            }
            Vec::new()
        }
        Msg::NewReportClicked | Msg::RetryClicked => reset(&mut state),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn select_file(state: &mut AppState, file: SelectedFile) -> Vec<Effect> {
    let current = state.session().state();
    if current.is_busy() {
        // One session at a time: a pick while a request is in flight is dropped.
        report_warn!(
            "Ignoring selection of {} while session {} is {:?}",
            file.name,
            state.session().id(),
            current
        );
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(1);
    let session_id = state.begin_validation();
    match validate_selection(&file, state.config().max_upload_bytes) {
        Err(err) => {
            report_info!("Rejected {} ({} bytes): {}", file.name, file.size, err);
            state.fail(err.to_string());
        }
        Ok(()) => {
            report_info!(
                "Submitting {} ({} bytes) as session {}",
                file.name,
                file.size,
                session_id
            );
            state.begin_submission(&file);
            effects.push(Effect::SubmitUpload { session_id, file });
        }
    }
    effects
}

fn download(state: &mut AppState) -> Vec<Effect> {
    let Some(filename) = state.session().result_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    let session_id = state.session().id();
    let mut effects = vec![Effect::Download {
        session_id,
        filename: filename.clone(),
    }];
    if state.mark_cleanup_scheduled() {
        effects.push(Effect::ScheduleCleanup {
            session_id,
            filename,
            delay: state.config().cleanup_delay,
        });
    }
    effects
}

fn reset(state: &mut AppState) -> Vec<Effect> {
    let previous = state.session().id();
    let finalize_pending = state.session().has_pending_receipt();
    state.replace_session();
    if finalize_pending {
        vec![Effect::CancelFinalize {
            session_id: previous,
        }]
    } else {
        Vec::new()
    }
}

/// Engine results only apply to the current session while it waits on the service.
fn accepts_engine_result(state: &AppState, session_id: SessionId) -> bool {
    if !state.is_current(session_id) {
        report_debug!("Dropping stale engine result for session {}", session_id);
        return false;
    }
    matches!(
        state.session().state(),
        SessionState::Submitting | SessionState::AwaitingResult
    ) && !state.session().has_pending_receipt()
}
