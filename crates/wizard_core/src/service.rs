//! Client for the external portfolio service (upload, preview, export).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use shared::{
    domain::Draft,
    error::ErrorBody,
    protocol::{
        HealthResponse, UploadResponse, GENERATE_PATH, HEALTH_PATH, PREVIEW_PATH, UPLOAD_FIELD,
        UPLOAD_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
pub trait PortfolioService: Send + Sync {
    /// Stores one image and returns the reference to put in `personal.image`.
    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError>;
    async fn render_preview(&self, draft: &Draft) -> Result<String, ServiceError>;
    /// Packaged export (a ZIP archive) of the whole draft.
    async fn generate_archive(&self, draft: &Draft) -> Result<Vec<u8>, ServiceError>;
    async fn health(&self) -> Result<(), ServiceError>;
}

pub struct HttpPortfolioService {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPortfolioService {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_error(&self, path: &str, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout {
                endpoint: path.to_string(),
                timeout: self.timeout,
            }
        } else {
            ServiceError::Transport {
                endpoint: path.to_string(),
                source: err,
            }
        }
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, ServiceError> {
        debug!(endpoint = path, "sending portfolio service request");
        let response = request
            .send()
            .await
            .map_err(|err| self.transport_error(path, err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(ServiceError::status(
            path,
            status.as_u16(),
            ErrorBody::message_from(&body),
        ))
    }

    fn invalid(path: &str, reason: impl ToString) -> ServiceError {
        ServiceError::InvalidResponse {
            endpoint: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl PortfolioService for HttpPortfolioService {
    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.filename.clone());
        if let Some(mime_type) = upload.mime_type.as_deref() {
            part = part
                .mime_str(mime_type)
                .map_err(|err| Self::invalid(UPLOAD_PATH, format!("bad mime type: {err}")))?;
        }
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .send(
                UPLOAD_PATH,
                self.http.post(self.endpoint(UPLOAD_PATH)).multipart(form),
            )
            .await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| Self::invalid(UPLOAD_PATH, err))?;
        if body.url.trim().is_empty() {
            return Err(Self::invalid(UPLOAD_PATH, "empty url in upload response"));
        }
        Ok(body.url)
    }

    async fn render_preview(&self, draft: &Draft) -> Result<String, ServiceError> {
        let response = self
            .send(
                PREVIEW_PATH,
                self.http.post(self.endpoint(PREVIEW_PATH)).json(draft),
            )
            .await?;
        response
            .text()
            .await
            .map_err(|err| self.transport_error(PREVIEW_PATH, err))
    }

    async fn generate_archive(&self, draft: &Draft) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .send(
                GENERATE_PATH,
                self.http.post(self.endpoint(GENERATE_PATH)).json(draft),
            )
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(GENERATE_PATH, err))?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<(), ServiceError> {
        let response = self
            .send(HEALTH_PATH, self.http.get(self.endpoint(HEALTH_PATH)))
            .await?;
        let body: HealthResponse = response
            .json()
            .await
            .map_err(|err| Self::invalid(HEALTH_PATH, err))?;
        if body.is_healthy() {
            Ok(())
        } else {
            Err(Self::invalid(
                HEALTH_PATH,
                format!("service reports status {:?}", body.status),
            ))
        }
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
