//! UI/backend events and error modeling for the builder GUI.

use shared::domain::{Direction, SectionId};
use wizard_core::{Failure, RequestKind, ServiceOutcome};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    ServiceHealth(Result<(), String>),
    Completed(ServiceOutcome),
}

/// User intent collected while drawing a frame and applied after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    SetField {
        section: SectionId,
        field: &'static str,
        value: String,
    },
    SetListField {
        section: SectionId,
        index: usize,
        field: &'static str,
        value: String,
    },
    AddItem(SectionId),
    RemoveItem {
        section: SectionId,
        index: usize,
    },
    PickImage,
    Navigate(Direction),
    Jump(SectionId),
    RequestClear(SectionId),
    ResolveClear(bool),
    Preview,
    Export,
    DismissBanner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Service,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    Preview,
    Export,
    General,
}

impl From<RequestKind> for UiErrorContext {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Upload => UiErrorContext::Upload,
            RequestKind::Preview => UiErrorContext::Preview,
            RequestKind::Export => UiErrorContext::Export,
        }
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Service => "Service",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("not allowed")
            || message_lower.contains("invalid")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("http 4") || message_lower.contains("http 5") {
            UiErrorCategory::Service
        } else if message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("unreachable")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnected")
            || message_lower.contains("startup failure")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_failure(failure: &Failure) -> Self {
        let mut err = Self::from_message(failure.kind.into(), failure.message.clone());
        err.message = failure.summary();
        err
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Startup and service-call failures get a banner; the rest only hit the status line.
    pub fn wants_banner(&self) -> bool {
        self.context != UiErrorContext::General
    }

    pub fn status_line(&self) -> String {
        format!("{} error: {}", err_label(self.category), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_queue_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(!err.wants_banner());
    }

    #[test]
    fn failure_summary_becomes_banner_text() {
        let failure = Failure::new(
            RequestKind::Export,
            "portfolio service at /api/generate returned HTTP 500: template missing",
        );
        let err = UiError::from_failure(&failure);

        assert_eq!(err.category(), UiErrorCategory::Service);
        assert_eq!(err.context(), UiErrorContext::Export);
        assert!(err.message().starts_with("Download failed:"));
        assert!(err.wants_banner());
    }

    #[test]
    fn rejected_file_types_are_validation_errors() {
        let failure = Failure::new(RequestKind::Upload, "file type not allowed: \"notes.txt\"");
        let err = UiError::from_failure(&failure);

        assert_eq!(err.category(), UiErrorCategory::Validation);
        assert!(err.status_line().starts_with("Validation error: Failed to upload image"));
    }
}
