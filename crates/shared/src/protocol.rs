use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Draft, MergeReport, SectionId};

pub const UPLOAD_PATH: &str = "/api/upload";
pub const PREVIEW_PATH: &str = "/api/preview";
pub const GENERATE_PATH: &str = "/api/generate";
pub const HEALTH_PATH: &str = "/api/health";

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// File name the packaged export is saved under.
pub const EXPORT_FILE_NAME: &str = "portfolio.zip";

/// Name of the single storage key holding the persisted wizard state.
pub const STATE_STORAGE_KEY: &str = "builder_state";

/// Image extensions the service accepts for profile uploads.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

pub fn is_allowed_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Wire shape of the persisted snapshot: `{ "activeSection": ..., "data": ... }`.
#[derive(Debug, Serialize)]
pub struct PersistedState<'a> {
    #[serde(rename = "activeSection")]
    pub active_section: SectionId,
    pub data: &'a Draft,
}

impl<'a> PersistedState<'a> {
    pub fn new(active_section: SectionId, data: &'a Draft) -> Self {
        Self {
            active_section,
            data,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Result of reading a persisted snapshot. Never fails: anything unusable
/// falls back to schema defaults and is described in `report`/`malformed`.
#[derive(Debug, Clone)]
pub struct RestoredState {
    pub active_section: Option<SectionId>,
    pub draft: Draft,
    pub report: MergeReport,
    pub malformed: bool,
}

impl RestoredState {
    pub fn decode(raw: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(raw).ok();
        let malformed = !matches!(parsed, Some(Value::Object(_)));

        let active_section = parsed
            .as_ref()
            .and_then(|value| value.get("activeSection"))
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<SectionId>().ok());
        let (draft, report) =
            Draft::merge_persisted(parsed.as_ref().and_then(|value| value.get("data")));

        Self {
            active_section,
            draft,
            report,
            malformed,
        }
    }
}
