//! Backend commands queued from UI to backend worker.

use wizard_core::ServiceRequest;

pub enum BackendCommand {
    Execute(ServiceRequest),
    CheckHealth,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Execute(ServiceRequest::Upload(_)) => "upload_image",
            BackendCommand::Execute(ServiceRequest::Preview(_)) => "render_preview",
            BackendCommand::Execute(ServiceRequest::Export(_)) => "generate_archive",
            BackendCommand::CheckHealth => "check_health",
        }
    }
}
