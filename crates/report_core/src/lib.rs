//! Report uploader core: pure upload state machine, validation and view-model helpers.
mod effect;
mod msg;
mod progress;
mod state;
pub mod tracking;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use progress::ProgressStep;
pub use state::{
    AppState, ControllerConfig, FileInfo, SelectedFile, SessionId, SessionState, UploadFailure,
    UploadReceipt, UploadSession, UploadStage, CLEANUP_DELAY, DEFAULT_SUCCESS_MESSAGE,
    DEFAULT_UPLOAD_ERROR, FINALIZE_DELAY, MAX_UPLOAD_BYTES,
};
pub use update::update;
pub use validate::{
    is_spreadsheet, validate_selection, ValidationError, XLSX_MEDIA_TYPE, XLS_MEDIA_TYPE,
};
pub use view_model::{AppViewModel, FileInfoView, VisibleMode};
