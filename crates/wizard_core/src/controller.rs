//! The wizard state controller: sole owner and mutator of the draft.

use std::collections::{BTreeMap, HashSet};

use shared::{
    domain::{Direction, Draft, ListItem, SectionId},
    protocol::{is_allowed_image, PersistedState, RestoredState, EXPORT_FILE_NAME},
};
use tracing::{debug, error, info, warn};

use crate::{
    error::ServiceError,
    host::{Confirm, Failure, HostUi, RequestKind, SaveOutcome},
    service::{ImageUpload, PortfolioService},
    store::DraftStore,
};

pub const CLEAR_PROMPT: &str = "Are you sure you want to clear all data in this section?";

/// What the UI should currently show; a pure function of controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardView {
    pub active: SectionId,
    /// Zero-based position of `active` in the section order.
    pub position: usize,
    pub total: usize,
    pub can_go_back: bool,
    /// At the last section the "next" control becomes "finish/export".
    pub show_finish: bool,
}

impl WizardView {
    fn of(active: SectionId) -> Self {
        let position = active.index();
        let total = SectionId::ALL.len();
        Self {
            active,
            position,
            total,
            can_go_back: position > 0,
            show_finish: position + 1 == total,
        }
    }

    pub fn is_visible(&self, section: SectionId) -> bool {
        self.active == section
    }
}

/// A service call detached from the controller so it can run elsewhere.
/// Draft-carrying variants hold a snapshot taken when the request began.
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Upload(ImageUpload),
    Preview(Draft),
    Export(Draft),
}

#[derive(Debug)]
pub enum ServiceOutcome {
    Uploaded(Result<String, ServiceError>),
    Previewed(Result<String, ServiceError>),
    Exported(Result<Vec<u8>, ServiceError>),
}

impl ServiceRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            ServiceRequest::Upload(_) => RequestKind::Upload,
            ServiceRequest::Preview(_) => RequestKind::Preview,
            ServiceRequest::Export(_) => RequestKind::Export,
        }
    }

    pub async fn execute(self, service: &dyn PortfolioService) -> ServiceOutcome {
        match self {
            ServiceRequest::Upload(upload) => {
                ServiceOutcome::Uploaded(service.upload_image(upload).await)
            }
            ServiceRequest::Preview(draft) => {
                ServiceOutcome::Previewed(service.render_preview(&draft).await)
            }
            ServiceRequest::Export(draft) => {
                ServiceOutcome::Exported(service.generate_archive(&draft).await)
            }
        }
    }
}

impl ServiceOutcome {
    /// Outcome for a request that never reached the service.
    pub fn failed(kind: RequestKind, err: ServiceError) -> Self {
        match kind {
            RequestKind::Upload => ServiceOutcome::Uploaded(Err(err)),
            RequestKind::Preview => ServiceOutcome::Previewed(Err(err)),
            RequestKind::Export => ServiceOutcome::Exported(Err(err)),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            ServiceOutcome::Uploaded(_) => RequestKind::Upload,
            ServiceOutcome::Previewed(_) => RequestKind::Preview,
            ServiceOutcome::Exported(_) => RequestKind::Export,
        }
    }
}

pub struct WizardController<S: DraftStore> {
    store: S,
    draft: Draft,
    active: SectionId,
    in_flight: HashSet<RequestKind>,
    pending_clear: Option<SectionId>,
}

impl<S: DraftStore> WizardController<S> {
    /// Builds the controller from defaults overlaid with whatever the store
    /// holds. Missing or unreadable state silently yields defaults.
    pub fn initialize(store: S) -> Self {
        let restored = match store.load() {
            Ok(Some(raw)) => Some(RestoredState::decode(&raw)),
            Ok(None) => {
                debug!("no persisted wizard state; starting from defaults");
                None
            }
            Err(err) => {
                warn!("could not read persisted wizard state, using defaults: {err:#}");
                None
            }
        };

        let (draft, active) = match restored {
            Some(restored) => {
                if restored.malformed {
                    debug!("persisted wizard state is malformed; using defaults");
                }
                if !restored.report.is_clean() {
                    debug!(
                        rejected = ?restored.report.rejected,
                        ignored = ?restored.report.ignored,
                        "persisted draft partially reset to defaults"
                    );
                }
                (
                    restored.draft,
                    restored.active_section.unwrap_or(SectionId::FIRST),
                )
            }
            None => (Draft::default(), SectionId::FIRST),
        };

        Self {
            store,
            draft,
            active,
            in_flight: HashSet::new(),
            pending_clear: None,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn active_section(&self) -> SectionId {
        self.active
    }

    pub fn view(&self) -> WizardView {
        WizardView::of(self.active)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_in_flight(&self, kind: RequestKind) -> bool {
        self.in_flight.contains(&kind)
    }

    fn persist(&self) {
        let encoded = match PersistedState::new(self.active, &self.draft).encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("failed to encode wizard state: {err}");
                return;
            }
        };
        if let Err(err) = self.store.save(&encoded) {
            warn!("failed to persist wizard state: {err:#}");
        }
    }

    // ---------- navigation ----------

    pub fn navigate(&mut self, direction: Direction) -> SectionId {
        self.jump_to(self.active.step(direction));
        self.active
    }

    pub fn jump_to(&mut self, section: SectionId) {
        self.active = section;
        self.pending_clear = None;
        self.persist();
    }

    /// Unknown section identifiers are ignored.
    pub fn set_active_section(&mut self, id: &str) -> bool {
        match id.parse::<SectionId>() {
            Ok(section) => {
                self.jump_to(section);
                true
            }
            Err(err) => {
                debug!("ignoring jump: {err}");
                false
            }
        }
    }

    // ---------- record sections ----------

    /// Sets `draft[section][field]` for record sections. Unknown sections,
    /// list sections and unknown fields are no-ops.
    pub fn update_field(&mut self, section: &str, field: &str, value: impl Into<String>) -> bool {
        let Ok(section) = section.parse::<SectionId>() else {
            debug!(section, field, "ignoring update for unknown section");
            return false;
        };
        if !self.draft.set_field(section, field, value) {
            debug!(%section, field, "ignoring update for unknown field");
            return false;
        }
        self.persist();
        true
    }

    // ---------- clearing ----------

    /// Resets `section` after the user confirms. Returns whether it was cleared.
    pub fn clear_section(&mut self, section: SectionId, confirm: &mut dyn Confirm) -> bool {
        self.request_clear(section);
        let confirmed = confirm.confirm(CLEAR_PROMPT);
        self.resolve_clear(confirmed)
    }

    /// First half of [`Self::clear_section`] for hosts that cannot block on a prompt.
    pub fn request_clear(&mut self, section: SectionId) {
        self.pending_clear = Some(section);
    }

    pub fn pending_clear(&self) -> Option<SectionId> {
        self.pending_clear
    }

    pub fn resolve_clear(&mut self, confirmed: bool) -> bool {
        let Some(section) = self.pending_clear.take() else {
            return false;
        };
        if !confirmed {
            debug!(%section, "clear declined");
            return false;
        }
        self.draft.clear(section);
        self.persist();
        info!(%section, "section cleared");
        true
    }

    // ---------- list sections ----------

    /// Appends `item` (or the blank row) to a list section.
    pub fn add_list_item(&mut self, section: SectionId, item: Option<ListItem>) -> bool {
        let Some(item) = item.or_else(|| ListItem::blank(section)) else {
            debug!(%section, "ignoring add on a record section");
            return false;
        };
        if item.section() != section {
            debug!(%section, item_section = %item.section(), "ignoring mismatched list item");
            return false;
        }
        self.draft.push_item(item);
        self.persist();
        true
    }

    pub fn remove_list_item(&mut self, section: SectionId, index: usize) -> bool {
        if !self.draft.remove_item(section, index) {
            debug!(%section, index, "ignoring removal outside the list");
            return false;
        }
        self.persist();
        true
    }

    pub fn update_list_field(
        &mut self,
        section: SectionId,
        index: usize,
        field: &str,
        value: impl Into<String>,
    ) -> bool {
        if !self.draft.set_item_field(section, index, field, value) {
            debug!(%section, index, field, "ignoring list field update");
            return false;
        }
        self.persist();
        true
    }

    /// Replaces a list section with rows read back from UI inputs, in order.
    /// Kept for hosts that cannot route per-row edits through the controller.
    pub fn sync_list_from_inputs(
        &mut self,
        section: SectionId,
        rows: &[BTreeMap<String, String>],
    ) -> bool {
        let items = rows
            .iter()
            .filter_map(|row| ListItem::from_fields(section, row))
            .collect();
        if !self.draft.replace_list(section, items) {
            return false;
        }
        self.persist();
        true
    }

    // ---------- service requests ----------

    fn begin(&mut self, kind: RequestKind) -> bool {
        if !self.in_flight.insert(kind) {
            debug!(%kind, "request already in flight; ignoring trigger");
            return false;
        }
        true
    }

    pub fn begin_preview(&mut self) -> Option<ServiceRequest> {
        self.begin(RequestKind::Preview)
            .then(|| ServiceRequest::Preview(self.draft.clone()))
    }

    pub fn begin_export(&mut self) -> Option<ServiceRequest> {
        self.begin(RequestKind::Export)
            .then(|| ServiceRequest::Export(self.draft.clone()))
    }

    /// Rejects unsupported files locally, before any network traffic.
    pub fn begin_upload(
        &mut self,
        upload: ImageUpload,
        host: &mut dyn HostUi,
    ) -> Option<ServiceRequest> {
        if self.is_in_flight(RequestKind::Upload) {
            debug!("upload already in flight; ignoring trigger");
            return None;
        }
        if upload.filename.trim().is_empty() || !is_allowed_image(&upload.filename) {
            let err = ServiceError::UnsupportedImage {
                filename: upload.filename,
            };
            self.fail(host, RequestKind::Upload, err.to_string());
            return None;
        }
        self.in_flight.insert(RequestKind::Upload);
        Some(ServiceRequest::Upload(upload))
    }

    /// Applies a finished request. Failures are reported once and never touch the draft.
    pub fn complete(&mut self, outcome: ServiceOutcome, host: &mut dyn HostUi) {
        let kind = outcome.kind();
        self.in_flight.remove(&kind);

        match outcome {
            ServiceOutcome::Uploaded(Ok(url)) => {
                info!(url = %url, "image uploaded");
                self.draft.personal.image = url;
                self.persist();
            }
            ServiceOutcome::Previewed(Ok(html)) => {
                info!(bytes = html.len(), "preview rendered");
                if let Err(err) = host.show_preview(&html) {
                    self.fail(host, kind, format!("{err:#}"));
                }
            }
            ServiceOutcome::Exported(Ok(bytes)) => {
                match host.save_artifact(EXPORT_FILE_NAME, &bytes) {
                    Ok(SaveOutcome::Saved(location)) => {
                        info!(bytes = bytes.len(), location = %location, "export saved");
                    }
                    Ok(SaveOutcome::Cancelled) => debug!("export save cancelled by user"),
                    Err(err) => self.fail(host, kind, format!("{err:#}")),
                }
            }
            ServiceOutcome::Uploaded(Err(err))
            | ServiceOutcome::Previewed(Err(err))
            | ServiceOutcome::Exported(Err(err)) => self.fail(host, kind, err.to_string()),
        }
    }

    fn fail(&self, host: &mut dyn HostUi, kind: RequestKind, message: String) {
        error!(%kind, "{message}");
        host.notify_failure(&Failure::new(kind, message));
    }

    pub async fn request_preview(
        &mut self,
        service: &dyn PortfolioService,
        host: &mut dyn HostUi,
    ) -> bool {
        let Some(request) = self.begin_preview() else {
            return false;
        };
        let outcome = request.execute(service).await;
        self.complete(outcome, host);
        true
    }

    pub async fn request_export(
        &mut self,
        service: &dyn PortfolioService,
        host: &mut dyn HostUi,
    ) -> bool {
        let Some(request) = self.begin_export() else {
            return false;
        };
        let outcome = request.execute(service).await;
        self.complete(outcome, host);
        true
    }

    pub async fn request_image_upload(
        &mut self,
        upload: ImageUpload,
        service: &dyn PortfolioService,
        host: &mut dyn HostUi,
    ) -> bool {
        let Some(request) = self.begin_upload(upload, host) else {
            return false;
        };
        let outcome = request.execute(service).await;
        self.complete(outcome, host);
        true
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
