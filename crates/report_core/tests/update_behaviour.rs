use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use report_core::{
    update, AppState, ControllerConfig, Effect, Msg, SelectedFile, SessionId, SessionState,
    UploadFailure, UploadReceipt, UploadStage, VisibleMode, CLEANUP_DELAY, FINALIZE_DELAY,
    XLSX_MEDIA_TYPE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(report_logging::initialize_for_tests);
}

fn workbook() -> SelectedFile {
    SelectedFile::new(
        "findings.xlsx",
        Some(XLSX_MEDIA_TYPE.to_string()),
        b"PK\x03\x04sheet".to_vec(),
    )
}

fn submitted(state: AppState) -> (AppState, SessionId) {
    let (state, effects) = update(state, Msg::FileSelected(Some(workbook())));
    let session_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitUpload { session_id, .. } => Some(*session_id),
            _ => None,
        })
        .expect("submit effect");
    (state, session_id)
}

fn finished_ok(state: AppState, session_id: SessionId, message: Option<&str>) -> AppState {
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Ok(UploadReceipt {
                filename: "r1.pptx".to_string(),
                message: message.map(ToOwned::to_owned),
            }),
        },
    );
    let (state, _) = update(state, Msg::FinalizeElapsed { session_id });
    state
}

#[test]
fn valid_selection_submits_exactly_once() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::FileSelected(Some(workbook())));

    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::SubmitUpload { file, .. } => assert_eq!(file, &workbook()),
        other => panic!("unexpected effect {other:?}"),
    }

    let view = state.view();
    assert_eq!(view.state, SessionState::Submitting);
    assert_eq!(view.mode, VisibleMode::Progress);
    assert_eq!(view.progress_percent, 10);
    assert_eq!(view.progress_label, "Uploading file...");
    let info = view.file_info.expect("file info");
    assert_eq!(info.name, "findings.xlsx");
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn invalid_type_fails_without_effects() {
    init_logging();
    let file = SelectedFile::new("notes.txt", Some("text/plain".to_string()), b"hi".to_vec());
    let (state, effects) = update(AppState::new(), Msg::FileSelected(Some(file)));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.state, SessionState::Error);
    assert_eq!(view.mode, VisibleMode::Error);
    assert!(view.error_message.unwrap().starts_with("Invalid file type"));
    assert_eq!(view.result_filename, None);
    assert_eq!(view.progress_percent, 0);
}

#[test]
fn oversized_file_fails_without_effects() {
    init_logging();
    let mut file = workbook();
    file.size = 10 * 1024 * 1024 + 1;
    let (state, effects) = update(AppState::new(), Msg::FileSelected(Some(file)));

    assert!(effects.is_empty());
    assert_eq!(state.view().state, SessionState::Error);
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("File too large. Maximum size is 10MB")
    );
}

#[test]
fn engine_stages_advance_progress() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());

    let (state, effects) = update(
        state,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::Dispatched,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().state, SessionState::AwaitingResult);
    assert_eq!(state.view().progress_percent, 30);
    assert_eq!(state.view().mode, VisibleMode::Progress);

    let (state, _) = update(
        state,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::ResponseReceived,
        },
    );
    assert_eq!(state.view().progress_percent, 60);
    assert_eq!(state.view().progress_label, "Generating PowerPoint report...");
}

#[test]
fn progress_never_moves_backwards() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::ResponseReceived,
        },
    );
    let (state, _) = update(
        state,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::Dispatched,
        },
    );

    assert_eq!(state.view().progress_percent, 60);
}

#[test]
fn success_is_published_after_finalize_delay() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Ok(UploadReceipt {
                filename: "r1.pptx".to_string(),
                message: Some("Done".to_string()),
            }),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::ScheduleFinalize {
            session_id,
            delay: FINALIZE_DELAY,
        }]
    );
    let view = state.view();
    assert_eq!(view.state, SessionState::AwaitingResult);
    assert_eq!(view.progress_percent, 90);
    assert_eq!(view.result_filename, None);

    let (state, effects) = update(state, Msg::FinalizeElapsed { session_id });
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.state, SessionState::Success);
    assert_eq!(view.mode, VisibleMode::Success);
    assert_eq!(view.progress_percent, 100);
    assert_eq!(view.result_filename.as_deref(), Some("r1.pptx"));
    assert_eq!(view.success_message.as_deref(), Some("Done"));
    assert_eq!(view.error_message, None);
}

#[test]
fn missing_message_uses_default_notice() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let state = finished_ok(state, session_id, None);

    assert_eq!(
        state.view().success_message.as_deref(),
        Some("Your EDR report is ready to download")
    );
}

#[test]
fn service_error_is_shown_verbatim() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Err(UploadFailure::Service {
                message: Some("bad sheet".to_string()),
            }),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.state, SessionState::Error);
    assert_eq!(view.error_message.as_deref(), Some("bad sheet"));
    assert_eq!(view.result_filename, None);
    assert_eq!(view.progress_percent, 0);
}

#[test]
fn service_error_without_body_uses_generic_message() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Err(UploadFailure::Service { message: None }),
        },
    );

    assert_eq!(state.view().error_message.as_deref(), Some("Upload failed"));
}

#[test]
fn transport_failure_surfaces_description() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Err(UploadFailure::Transport {
                description: "error sending request: connection refused".to_string(),
            }),
        },
    );

    let view = state.view();
    assert_eq!(view.state, SessionState::Error);
    assert_eq!(
        view.error_message.as_deref(),
        Some("error sending request: connection refused")
    );
    assert_eq!(view.result_filename, None);
}

#[test]
fn download_schedules_a_single_cleanup() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let state = finished_ok(state, session_id, Some("Done"));

    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![
            Effect::Download {
                session_id,
                filename: "r1.pptx".to_string(),
            },
            Effect::ScheduleCleanup {
                session_id,
                filename: "r1.pptx".to_string(),
                delay: CLEANUP_DELAY,
            },
        ]
    );
    assert_eq!(state.view().state, SessionState::Success);

    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![Effect::Download {
            session_id,
            filename: "r1.pptx".to_string(),
        }]
    );
    assert_eq!(state.view().state, SessionState::Success);
}

#[test]
fn cleanup_failure_does_not_change_visible_state() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let state = finished_ok(state, session_id, Some("Done"));
    let (state, _) = update(state, Msg::DownloadClicked);
    let before = state.view();

    let (next, effects) = update(
        state,
        Msg::CleanupFinished {
            session_id,
            filename: "r1.pptx".to_string(),
            succeeded: false,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(next.view(), before);
}

#[test]
fn download_failure_moves_to_error() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let state = finished_ok(state, session_id, None);
    let (state, _) = update(
        state,
        Msg::DownloadFailed {
            session_id,
            message: "disk full".to_string(),
        },
    );

    let view = state.view();
    assert_eq!(view.state, SessionState::Error);
    assert_eq!(
        view.error_message.as_deref(),
        Some("Error downloading file: disk full")
    );
    assert_eq!(view.result_filename, None);
}

#[test]
fn reset_from_terminal_and_waiting_states_returns_to_idle() {
    init_logging();

    let (waiting, session_id) = submitted(AppState::new());
    let (waiting, _) = update(
        waiting,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::Dispatched,
        },
    );
    let (success, id) = submitted(AppState::new());
    let success = finished_ok(success, id, None);
    let (error, _) = update(
        AppState::new(),
        Msg::FileSelected(Some(SelectedFile::new("a.csv", None, b"x".to_vec()))),
    );

    for (state, msg) in [
        (waiting, Msg::NewReportClicked),
        (success, Msg::NewReportClicked),
        (error, Msg::RetryClicked),
    ] {
        let (next, _) = update(state, msg);
        let view = next.view();
        assert_eq!(view.state, SessionState::Idle);
        assert_eq!(view.mode, VisibleMode::Upload);
        assert_eq!(view.result_filename, None);
        assert_eq!(view.error_message, None);
        assert_eq!(view.file_info, None);
        assert_eq!(view.progress_percent, 0);
        assert_eq!(view.progress_label, "");
    }
}

#[test]
fn reset_during_finalize_cancels_timer_and_ignores_late_event() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Ok(UploadReceipt {
                filename: "r1.pptx".to_string(),
                message: None,
            }),
        },
    );

    let (state, effects) = update(state, Msg::NewReportClicked);
    assert_eq!(effects, vec![Effect::CancelFinalize { session_id }]);

    let (state, _) = update(state, Msg::FinalizeElapsed { session_id });
    assert_eq!(state.view().state, SessionState::Idle);
    assert_eq!(state.view().result_filename, None);
}

#[test]
fn stale_results_for_superseded_session_are_ignored() {
    init_logging();
    let (state, old_session) = submitted(AppState::new());
    let (state, _) = update(state, Msg::RetryClicked);
    let (state, new_session) = submitted(state);
    assert_ne!(old_session, new_session);

    let (state, _) = update(
        state,
        Msg::UploadFinished {
            session_id: old_session,
            result: Err(UploadFailure::Service {
                message: Some("old failure".to_string()),
            }),
        },
    );

    let view = state.view();
    assert_eq!(view.state, SessionState::Submitting);
    assert_eq!(view.session_id, new_session);
    assert_eq!(view.error_message, None);
}

#[test]
fn selection_while_in_flight_is_rejected() {
    init_logging();
    let (state, session_id) = submitted(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadProgress {
            session_id,
            stage: UploadStage::Dispatched,
        },
    );
    let before = state.clone();

    let other = SelectedFile::new("other.xls", None, b"x".to_vec());
    let (next, effects) = update(state, Msg::FileSelected(Some(other)));

    assert!(effects.is_empty());
    assert_eq!(next, before);
}

#[test]
fn selection_after_error_starts_a_new_session() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FileSelected(Some(SelectedFile::new("a.pdf", None, b"x".to_vec()))),
    );
    assert_eq!(state.view().state, SessionState::Error);

    let (state, effects) = update(state, Msg::FileSelected(Some(workbook())));

    assert_eq!(effects.len(), 1);
    assert_eq!(state.view().state, SessionState::Submitting);
    assert_eq!(state.view().error_message, None);
}

#[test]
fn configured_delays_flow_into_effects() {
    init_logging();
    let config = ControllerConfig {
        finalize_delay: Duration::from_millis(5),
        cleanup_delay: Duration::from_millis(7),
        ..ControllerConfig::default()
    };
    let (state, session_id) = submitted(AppState::with_config(config));
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            session_id,
            result: Ok(UploadReceipt {
                filename: "r1.pptx".to_string(),
                message: None,
            }),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::ScheduleFinalize {
            session_id,
            delay: Duration::from_millis(5),
        }]
    );

    let (state, _) = update(state, Msg::FinalizeElapsed { session_id });
    let (_, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.contains(&Effect::ScheduleCleanup {
        session_id,
        filename: "r1.pptx".to_string(),
        delay: Duration::from_millis(7),
    }));
}
