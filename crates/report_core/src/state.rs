use std::time::Duration;

use bytes::Bytes;

use crate::progress::ProgressStep;
use crate::view_model::{AppViewModel, FileInfoView, VisibleMode};

pub type SessionId = u64;

/// Largest spreadsheet accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Delay between a parsed success response and the success panel.
pub const FINALIZE_DELAY: Duration = Duration::from_millis(500);
/// Delay between starting a download and telling the service it may delete the artifact.
pub const CLEANUP_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Your EDR report is ready to download";
pub const DEFAULT_UPLOAD_ERROR: &str = "Upload failed";

/// A file handed over by the picker or a drop.
///
/// `size` is the declared byte size; it is what validation checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: Option<String>,
    pub size: u64,
    pub contents: Bytes,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: Option<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        let contents = contents.into();
        Self {
            name: name.into(),
            media_type,
            size: contents.len() as u64,
            contents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    AwaitingResult,
    Success,
    Error,
}

impl SessionState {
    /// True while a selection is being validated or a request is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionState::Validating | SessionState::Submitting | SessionState::AwaitingResult
        )
    }
}

/// Milestones the engine reports while a conversion request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// The request has been handed to the transport.
    Dispatched,
    /// Response headers arrived; the body has not been read yet.
    ResponseReceived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// The service answered with a non-success status.
    Service { message: Option<String> },
    /// The request could not be completed or the answer was unreadable.
    Transport { description: String },
}

impl UploadFailure {
    pub fn user_message(&self) -> String {
        match self {
            UploadFailure::Service { message } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_UPLOAD_ERROR)
                .to_string(),
            UploadFailure::Transport { description } if description.trim().is_empty() => {
                DEFAULT_UPLOAD_ERROR.to_string()
            }
            UploadFailure::Transport { description } => description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionOutcome {
    Ready { filename: String, message: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub max_upload_bytes: u64,
    pub finalize_delay: Duration,
    pub cleanup_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            finalize_delay: FINALIZE_DELAY,
            cleanup_delay: CLEANUP_DELAY,
        }
    }
}

/// One attempt to turn a selected spreadsheet into a report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadSession {
    id: SessionId,
    state: SessionState,
    progress_percent: u8,
    progress_label: String,
    file_info: Option<FileInfo>,
    outcome: Option<SessionOutcome>,
    pending_receipt: Option<UploadReceipt>,
    cleanup_scheduled: bool,
}

impl UploadSession {
    fn with_id(id: SessionId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn progress_label(&self) -> &str {
        &self.progress_label
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        self.file_info.as_ref()
    }

    pub fn result_filename(&self) -> Option<&str> {
        match &self.outcome {
            Some(SessionOutcome::Ready { filename, .. }) => Some(filename),
            _ => None,
        }
    }

    pub fn success_message(&self) -> Option<&str> {
        match &self.outcome {
            Some(SessionOutcome::Ready { message, .. }) => Some(message),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Some(SessionOutcome::Failed { message }) => Some(message),
            _ => None,
        }
    }

    pub fn has_pending_receipt(&self) -> bool {
        self.pending_receipt.is_some()
    }

    pub fn cleanup_scheduled(&self) -> bool {
        self.cleanup_scheduled
    }

    /// Raises progress; lower values within one submission are ignored.
    fn advance(&mut self, step: ProgressStep) {
        if step.percent() >= self.progress_percent {
            self.progress_percent = step.percent();
            self.progress_label = step.label().to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    config: ControllerConfig,
    session: UploadSession,
    last_session_id: SessionId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn is_current(&self, session_id: SessionId) -> bool {
        self.session.id == session_id
    }

    pub fn view(&self) -> AppViewModel {
        let session = &self.session;
        AppViewModel {
            session_id: session.id,
            state: session.state,
            mode: VisibleMode::for_state(session.state),
            progress_percent: session.progress_percent,
            progress_label: session.progress_label.clone(),
            file_info: session.file_info.as_ref().map(FileInfoView::from_info),
            success_message: session.success_message().map(ToOwned::to_owned),
            error_message: session.error_message().map(ToOwned::to_owned),
            result_filename: session.result_filename().map(ToOwned::to_owned),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Replaces the session with a fresh idle one under a new id.
    pub(crate) fn replace_session(&mut self) -> SessionId {
        self.last_session_id += 1;
        self.session = UploadSession::with_id(self.last_session_id);
        self.dirty = true;
        self.last_session_id
    }

    pub(crate) fn begin_validation(&mut self) -> SessionId {
        let id = self.replace_session();
        self.session.state = SessionState::Validating;
        id
    }

    pub(crate) fn begin_submission(&mut self, file: &SelectedFile) {
        self.session.file_info = Some(FileInfo {
            name: file.name.clone(),
            size: file.size,
        });
        self.session.state = SessionState::Submitting;
        self.session.progress_percent = 0;
        self.session.advance(ProgressStep::Uploading);
        self.dirty = true;
    }

    pub(crate) fn apply_stage(&mut self, stage: UploadStage) {
        let step = match stage {
            UploadStage::Dispatched => ProgressStep::Validating,
            UploadStage::ResponseReceived => ProgressStep::Generating,
        };
        self.session.state = SessionState::AwaitingResult;
        self.session.advance(step);
        self.dirty = true;
    }

    pub(crate) fn hold_receipt(&mut self, receipt: UploadReceipt) {
        self.session.state = SessionState::AwaitingResult;
        self.session.advance(ProgressStep::Finalizing);
        self.session.pending_receipt = Some(receipt);
        self.dirty = true;
    }

    /// Publishes the held receipt; false when nothing was pending.
    pub(crate) fn complete(&mut self) -> bool {
        let Some(receipt) = self.session.pending_receipt.take() else {
            return false;
        };
        let message = receipt
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
        self.session.advance(ProgressStep::Complete);
        self.session.state = SessionState::Success;
        self.session.outcome = Some(SessionOutcome::Ready {
            filename: receipt.filename,
            message,
        });
        self.dirty = true;
        true
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.session.state = SessionState::Error;
        self.session.progress_percent = 0;
        self.session.progress_label.clear();
        self.session.pending_receipt = None;
        self.session.outcome = Some(SessionOutcome::Failed {
            message: message.into(),
        });
        self.dirty = true;
    }

    /// Marks the cleanup as scheduled; false if it already was.
    pub(crate) fn mark_cleanup_scheduled(&mut self) -> bool {
        !std::mem::replace(&mut self.session.cleanup_scheduled, true)
    }
}
