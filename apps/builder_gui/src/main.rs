mod backend_bridge;
mod controller;
mod ui;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use wizard_core::{load_settings, FileDraftStore, Overrides, WizardController};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{host::GuiHost, BuilderApp};

#[derive(Debug, Parser)]
#[command(name = "builder_gui", about = "Step-by-step portfolio builder")]
struct Args {
    /// TOML settings file (defaults to ./portfolio_builder.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the portfolio service
    #[arg(long)]
    service_url: Option<String>,
    /// Directory holding the saved draft
    #[arg(long)]
    state_dir: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            service_url: self.service_url.clone(),
            state_dir: self.state_dir.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = load_settings(&args.overrides())?;
    tracing::info!(
        service_url = %settings.service_url,
        state_dir = %settings.state_dir.display(),
        "starting portfolio builder"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(&settings, cmd_rx, ui_tx);

    let controller = WizardController::initialize(FileDraftStore::in_dir(&settings.state_dir));
    let host = GuiHost::new(settings.state_dir.clone());
    let service_label = settings.service_url.to_string();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Portfolio Builder")
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Portfolio Builder",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(BuilderApp::new(
                controller,
                host,
                cmd_tx,
                ui_rx,
                service_label,
            )))
        }),
    )
    .map_err(|err| anyhow!("portfolio builder window failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_become_overrides() {
        let args = Args::parse_from([
            "builder_gui",
            "--service-url",
            "http://localhost:8080",
            "--state-dir",
            "/tmp/builder",
            "--timeout-secs",
            "5",
        ]);
        let overrides = args.overrides();

        assert_eq!(overrides.service_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(overrides.state_dir, Some(PathBuf::from("/tmp/builder")));
        assert_eq!(overrides.timeout_secs, Some(5));
        assert!(overrides.config_file.is_none());
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let overrides = Args::parse_from(["builder_gui"]).overrides();
        assert!(overrides.service_url.is_none());
        assert!(overrides.timeout_secs.is_none());
    }
}
