use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::filename::local_filename;
use crate::persist::ArtifactWriter;
use crate::{
    ConversionReceipt, EngineEvent, FailureKind, ServiceError, SessionId, UploadFile,
    UploadProgress, UploadStage,
};

pub const MISSING_FILENAME: &str = "Server response did not include a report filename";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Root of the conversion service; endpoints are resolved below its path.
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl ServiceSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            // Report generation happens inside the upload request.
            request_timeout: Duration::from_secs(300),
            max_download_bytes: 200 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The external conversion service: `POST /upload`, `GET /download/{name}`,
/// `POST /cleanup/{name}`.
#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    async fn upload(
        &self,
        session_id: SessionId,
        file: &UploadFile,
        sink: &dyn ProgressSink,
    ) -> Result<ConversionReceipt, ServiceError>;

    /// Retrieves the artifact into `dest_dir`, returning the written path.
    async fn download(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, ServiceError>;

    async fn cleanup(&self, filename: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Deserialize)]
struct ServiceResponse {
    filename: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestConversionService {
    settings: ServiceSettings,
    client: reqwest::Client,
}

impl ReqwestConversionService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Appends `segments` to the base path; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::new(
                    FailureKind::InvalidUrl,
                    format!("{} cannot be used as a service base", self.settings.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ConversionService for ReqwestConversionService {
    async fn upload(
        &self,
        session_id: SessionId,
        file: &UploadFile,
        sink: &dyn ProgressSink,
    ) -> Result<ConversionReceipt, ServiceError> {
        let url = self.endpoint(&["upload"])?;
        let form = Form::new().part("file", file_part(file));

        sink.emit(EngineEvent::Progress(UploadProgress {
            session_id,
            stage: UploadStage::Dispatched,
        }));
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        sink.emit(EngineEvent::Progress(UploadProgress {
            session_id,
            stage: UploadStage::ResponseReceived,
        }));
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        // The body must be JSON whatever the status; a proxy's HTML error page
        // is a transport failure, not a service answer.
        let parsed: ServiceResponse = serde_json::from_slice(&body)
            .map_err(|err| ServiceError::new(FailureKind::InvalidResponse, err.to_string()))?;
        if !status.is_success() {
            return Err(status_error(status, parsed.error));
        }

        let filename = parsed
            .filename
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ServiceError::new(FailureKind::InvalidResponse, MISSING_FILENAME))?;

        Ok(ConversionReceipt {
            filename,
            message: parsed.message,
        })
    }

    async fn download(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, ServiceError> {
        let url = self.endpoint(&["download", filename])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let parsed: ServiceResponse = serde_json::from_slice(&body).unwrap_or_default();
            return Err(status_error(status, parsed.error));
        }

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let writer = ArtifactWriter::new(dest_dir.to_path_buf());
        let local = local_filename(filename);
        tokio::task::spawn_blocking(move || writer.save(&local, &bytes))
            .await
            .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string()))?
            .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string()))
    }

    async fn cleanup(&self, filename: &str) -> Result<(), ServiceError> {
        let url = self.endpoint(&["cleanup", filename])?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, None));
        }
        Ok(())
    }
}

fn file_part(file: &UploadFile) -> Part {
    let part = || {
        Part::stream_with_length(Body::from(file.contents.clone()), file.contents.len() as u64)
            .file_name(file.name.clone())
    };
    match file.media_type.as_deref() {
        // An unparsable declared type is dropped rather than failing the upload.
        Some(media_type) => part().mime_str(media_type).unwrap_or_else(|_| part()),
        None => part(),
    }
}

fn status_error(status: StatusCode, server_error: Option<String>) -> ServiceError {
    let server_error = server_error.filter(|e| !e.trim().is_empty());
    let message = server_error
        .clone()
        .unwrap_or_else(|| status.to_string());
    ServiceError::new(
        FailureKind::HttpStatus {
            status: status.as_u16(),
            server_error,
        },
        message,
    )
}

fn too_large(max_bytes: u64, actual: u64) -> ServiceError {
    ServiceError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "report too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::InvalidResponse, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
