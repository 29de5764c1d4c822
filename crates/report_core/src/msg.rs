use crate::{SelectedFile, SessionId, UploadFailure, UploadReceipt, UploadStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked or dropped a file; `None` when the picker was dismissed.
    FileSelected(Option<SelectedFile>),
    /// Engine milestone for an in-flight conversion request.
    UploadProgress {
        session_id: SessionId,
        stage: UploadStage,
    },
    /// Engine completion for a conversion request.
    UploadFinished {
        session_id: SessionId,
        result: Result<UploadReceipt, UploadFailure>,
    },
    /// The finalize delay after a successful response has elapsed.
    FinalizeElapsed { session_id: SessionId },
    /// User clicked Download.
    DownloadClicked,
    /// The host could not start or finish retrieving the artifact.
    DownloadFailed {
        session_id: SessionId,
        message: String,
    },
    /// The deferred cleanup call returned; never user-visible.
    CleanupFinished {
        session_id: SessionId,
        filename: String,
        succeeded: bool,
    },
    /// User clicked New Report on the success panel.
    NewReportClicked,
    /// User clicked Retry on the error panel.
    RetryClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
