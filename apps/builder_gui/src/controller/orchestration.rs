//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the backend worker. On failure the command is handed back
/// so the caller can settle any state it reserved for it.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Result<(), BackendCommand> {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(cmd)) => {
            *status = "UI command queue is full; please retry".to_string();
            tracing::warn!(command = cmd_name, "backend command queue full");
            Err(cmd)
        }
        Err(TrySendError::Disconnected(cmd)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure)"
                    .to_string();
            tracing::warn!(command = cmd_name, "backend command queue disconnected");
            Err(cmd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::domain::Draft;
    use wizard_core::ServiceRequest;

    #[test]
    fn full_queue_hands_command_back() {
        let (tx, _rx) = bounded::<BackendCommand>(1);
        let mut status = String::new();

        assert!(dispatch_backend_command(&tx, BackendCommand::CheckHealth, &mut status).is_ok());
        let rejected = dispatch_backend_command(
            &tx,
            BackendCommand::Execute(ServiceRequest::Preview(Draft::default())),
            &mut status,
        )
        .expect_err("queue is full");

        assert_eq!(rejected.name(), "render_preview");
        assert!(status.contains("full"));
    }

    #[test]
    fn disconnected_queue_reports_status() {
        let (tx, rx) = bounded::<BackendCommand>(1);
        drop(rx);
        let mut status = String::new();

        assert!(dispatch_backend_command(&tx, BackendCommand::CheckHealth, &mut status).is_err());
        assert!(status.contains("disconnected"));
    }
}
