use crate::{FileInfo, SessionId, SessionState};

/// The four mutually exclusive panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibleMode {
    #[default]
    Upload,
    Progress,
    Success,
    Error,
}

impl VisibleMode {
    pub fn for_state(state: SessionState) -> Self {
        match state {
            SessionState::Idle | SessionState::Validating => VisibleMode::Upload,
            SessionState::Submitting | SessionState::AwaitingResult => VisibleMode::Progress,
            SessionState::Success => VisibleMode::Success,
            SessionState::Error => VisibleMode::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfoView {
    pub name: String,
    /// Size in kilobytes with two decimals, e.g. `"12.50 KB"`.
    pub size_label: String,
}

impl FileInfoView {
    pub(crate) fn from_info(info: &FileInfo) -> Self {
        Self {
            name: info.name.clone(),
            size_label: format!("{:.2} KB", info.size as f64 / 1024.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session_id: SessionId,
    pub state: SessionState,
    pub mode: VisibleMode,
    pub progress_percent: u8,
    pub progress_label: String,
    pub file_info: Option<FileInfoView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub result_filename: Option<String>,
    pub dirty: bool,
}
