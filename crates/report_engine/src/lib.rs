//! Report engine: conversion-service IO and effect execution.
mod engine;
mod filename;
mod persist;
mod service;
mod types;

pub use engine::{DeferredTask, EngineConfig, EngineError, EngineHandle, TaskKind};
pub use filename::local_filename;
pub use persist::{prepare_download_dir, ArtifactWriter, PersistError};
pub use service::{
    ConversionService, ProgressSink, ReqwestConversionService, ServiceSettings, MISSING_FILENAME,
};
pub use types::{
    ConversionReceipt, EngineEvent, FailureKind, ServiceError, SessionId, UploadFile,
    UploadProgress, UploadStage,
};
