//! Wizard state controller for the portfolio builder, with its persistence,
//! host-UI seams and portfolio-service client.

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod service;
pub mod store;

pub use config::{load_settings, Overrides, Settings};
pub use controller::{ServiceOutcome, ServiceRequest, WizardController, WizardView};
pub use error::ServiceError;
pub use host::{Confirm, Failure, HostUi, RequestKind, SaveOutcome};
pub use service::{HttpPortfolioService, ImageUpload, PortfolioService};
pub use store::{DraftStore, FileDraftStore, MemoryDraftStore};
