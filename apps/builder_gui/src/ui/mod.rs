//! UI layer for the builder GUI: app shell, section panels, and the desktop host.

pub mod app;
pub mod host;
pub mod panels;

pub use app::BuilderApp;
