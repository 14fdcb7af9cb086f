//! Capabilities the embedding UI lends to the controller.

use std::fmt;

use anyhow::Result;

/// The three service-backed operations; at most one of each is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Upload,
    Preview,
    Export,
}

impl RequestKind {
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Upload => "image upload",
            RequestKind::Preview => "preview",
            RequestKind::Export => "export",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: RequestKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: RequestKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Short, user-facing sentence for a notification area.
    pub fn summary(&self) -> String {
        match self.kind {
            RequestKind::Upload => format!("Failed to upload image: {}", self.message),
            RequestKind::Preview => format!("Failed to load preview: {}", self.message),
            RequestKind::Export => format!("Download failed: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(String),
    Cancelled,
}

pub trait HostUi {
    /// Visible, non-blocking notification.
    fn notify_failure(&mut self, failure: &Failure);
    /// Opens rendered HTML in a new viewing context.
    fn show_preview(&mut self, html: &str) -> Result<()>;
    fn save_artifact(&mut self, file_name: &str, bytes: &[u8]) -> Result<SaveOutcome>;
}

/// Explicit user confirmation before a destructive edit.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}
