//! Desktop implementation of the capabilities the wizard controller borrows.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use wizard_core::{Failure, HostUi, SaveOutcome};

use crate::controller::events::UiError;

pub const PREVIEW_FILE_NAME: &str = "preview.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub severity: StatusBannerSeverity,
    pub message: String,
}

impl StatusBanner {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: StatusBannerSeverity::Error,
            message: message.into(),
        }
    }
}

/// Writes rendered preview HTML next to the persisted draft.
pub fn write_preview(dir: &Path, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create preview directory '{}'", dir.display()))?;
    let path = dir.join(PREVIEW_FILE_NAME);
    fs::write(&path, html)
        .with_context(|| format!("failed to write preview to '{}'", path.display()))?;
    Ok(path)
}

pub fn open_file_in_external_viewer(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", &path.to_string_lossy()])
        .spawn();

    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(path).spawn();

    #[cfg(all(unix, not(target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(path).spawn();

    result
        .map(|_| ())
        .with_context(|| format!("failed to open external viewer for '{}'", path.display()))
}

pub struct GuiHost {
    preview_dir: PathBuf,
    pub status: String,
    pub status_banner: Option<StatusBanner>,
}

impl GuiHost {
    pub fn new(preview_dir: PathBuf) -> Self {
        Self {
            preview_dir,
            status: "Ready".to_string(),
            status_banner: None,
        }
    }

    pub fn report(&mut self, err: &UiError) {
        self.status = err.status_line();
        if err.wants_banner() {
            self.status_banner = Some(StatusBanner::error(err.message()));
        }
    }
}

impl HostUi for GuiHost {
    fn notify_failure(&mut self, failure: &Failure) {
        self.report(&UiError::from_failure(failure));
    }

    fn show_preview(&mut self, html: &str) -> Result<()> {
        let path = write_preview(&self.preview_dir, html)?;
        open_file_in_external_viewer(&path)?;
        self.status = format!("Preview opened from {}", path.display());
        Ok(())
    }

    fn save_artifact(&mut self, file_name: &str, bytes: &[u8]) -> Result<SaveOutcome> {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("Zip archive", &["zip"])
            .save_file()
        else {
            self.status = "Download cancelled".to_string();
            return Ok(SaveOutcome::Cancelled);
        };
        fs::write(&path, bytes)
            .with_context(|| format!("failed to save archive to '{}'", path.display()))?;
        self.status = format!("Saved portfolio to {}", path.display());
        Ok(SaveOutcome::Saved(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_core::RequestKind;

    #[test]
    fn preview_is_written_into_state_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("state");

        let path = write_preview(&nested, "<h1>Ada</h1>").expect("write");

        assert_eq!(path, nested.join(PREVIEW_FILE_NAME));
        assert_eq!(fs::read_to_string(path).expect("read"), "<h1>Ada</h1>");
    }

    #[test]
    fn failures_raise_a_banner() {
        let mut host = GuiHost::new(PathBuf::from("."));
        host.notify_failure(&Failure::new(RequestKind::Preview, "request timed out"));

        let banner = host.status_banner.expect("banner");
        assert_eq!(banner.severity, StatusBannerSeverity::Error);
        assert!(banner.message.starts_with("Failed to load preview"));
        assert!(host.status.starts_with("Connection error"));
    }
}
