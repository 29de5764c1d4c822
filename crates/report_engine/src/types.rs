use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;

pub type SessionId = u64;

/// Spreadsheet handed to the conversion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub media_type: Option<String>,
    pub contents: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Dispatched,
    ResponseReceived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub session_id: SessionId,
    pub stage: UploadStage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReceipt {
    pub filename: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(UploadProgress),
    UploadCompleted {
        session_id: SessionId,
        result: Result<ConversionReceipt, ServiceError>,
    },
    FinalizeElapsed {
        session_id: SessionId,
    },
    DownloadCompleted {
        session_id: SessionId,
        filename: String,
        result: Result<PathBuf, ServiceError>,
    },
    CleanupCompleted {
        session_id: SessionId,
        filename: String,
        result: Result<(), ServiceError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error text the service itself put in the response, if any.
    pub fn server_error(&self) -> Option<&str> {
        match &self.kind {
            FailureKind::HttpStatus { server_error, .. } => server_error.as_deref(),
            _ => None,
        }
    }

    /// True when the service answered; false for transport-level failures.
    pub fn is_service_reported(&self) -> bool {
        matches!(self.kind, FailureKind::HttpStatus { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus {
        status: u16,
        server_error: Option<String>,
    },
    Timeout,
    Network,
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus { status, .. } => write!(f, "http status {status}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
