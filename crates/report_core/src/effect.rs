use std::time::Duration;

use crate::{SelectedFile, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `POST /upload` with the file as multipart part `file`.
    SubmitUpload {
        session_id: SessionId,
        file: SelectedFile,
    },
    /// Deliver `Msg::FinalizeElapsed` after `delay` unless cancelled.
    ScheduleFinalize {
        session_id: SessionId,
        delay: Duration,
    },
    CancelFinalize { session_id: SessionId },
    /// Retrieve the artifact via `GET /download/{filename}`.
    Download {
        session_id: SessionId,
        filename: String,
    },
    /// Fire-and-forget `POST /cleanup/{filename}` after `delay`.
    ScheduleCleanup {
        session_id: SessionId,
        filename: String,
        delay: Duration,
    },
}
