//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use wizard_core::{HttpPortfolioService, PortfolioService, Settings};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: &Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let service_url = settings.service_url.clone();
    let timeout = settings.request_timeout;

    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let service = match HttpPortfolioService::new(&service_url, timeout) {
            Ok(service) => Arc::new(service),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build http client: {err}"),
                )));
                tracing::error!("failed to build portfolio service client: {err}");
                return;
            }
        };
        tracing::info!(service_url = %service_url, "backend worker ready");
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Using portfolio service at {service_url}"
        )));

        runtime.block_on(async move {
            while let Ok(cmd) = cmd_rx.recv() {
                let service = Arc::clone(&service);
                let ui_tx = ui_tx.clone();
                let cmd_name = cmd.name();
                tracing::debug!(command = cmd_name, "backend worker picked up command");

                tokio::spawn(async move {
                    let event = match cmd {
                        BackendCommand::Execute(request) => {
                            UiEvent::Completed(request.execute(&*service).await)
                        }
                        BackendCommand::CheckHealth => UiEvent::ServiceHealth(
                            service.health().await.map_err(|err| err.to_string()),
                        ),
                    };
                    // Completions clear in-flight markers, so they must not be dropped.
                    if ui_tx.send(event).is_err() {
                        tracing::warn!(command = cmd_name, "ui event channel closed");
                    }
                });
            }
            tracing::debug!("ui command queue closed; backend worker exiting");
        });
    });
}
