use std::{fs, path::Path, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{Direction, SectionId},
    protocol::ALLOWED_IMAGE_EXTENSIONS,
};
use wizard_core::{
    controller::CLEAR_PROMPT, FileDraftStore, ImageUpload, RequestKind, ServiceError,
    ServiceOutcome, ServiceRequest, WizardController,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiAction, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};
use crate::ui::{
    host::{GuiHost, StatusBannerSeverity},
    panels,
};

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic.thumbnail(320, 320).to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

/// Reads a picked file into an upload, guessing its content type from the name.
pub fn read_image_upload(path: &Path) -> std::io::Result<ImageUpload> {
    let bytes = fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = ImageUpload::new(filename, bytes);
    Ok(match mime_guess::from_path(path).first() {
        Some(mime) => upload.with_mime_type(mime.essence_str()),
        None => upload,
    })
}

pub struct BuilderApp {
    controller: WizardController<FileDraftStore>,
    host: GuiHost,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    service_label: String,
    service_health: Option<Result<(), String>>,
    /// Thumbnail of the file currently being uploaded; shown once the upload lands.
    pending_image: Option<PreviewImage>,
    decoded_image: Option<PreviewImage>,
    image_texture: Option<egui::TextureHandle>,
}

impl BuilderApp {
    pub fn new(
        controller: WizardController<FileDraftStore>,
        host: GuiHost,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        service_label: String,
    ) -> Self {
        let mut app = Self {
            controller,
            host,
            cmd_tx,
            ui_rx,
            service_label,
            service_health: None,
            pending_image: None,
            decoded_image: None,
            image_texture: None,
        };
        app.queue_command(BackendCommand::CheckHealth);
        app
    }

    fn queue_command(&mut self, cmd: BackendCommand) {
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.host.status).is_err() {
            let err = UiError::from_message(UiErrorContext::General, self.host.status.clone());
            self.host.report(&err);
        }
    }

    /// Sends a begun request to the worker, settling it locally if it cannot be queued.
    fn dispatch_request(&mut self, request: ServiceRequest) {
        let kind = request.kind();
        let cmd = BackendCommand::Execute(request);
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.host.status).is_err() {
            let err = ServiceError::Unavailable(self.host.status.clone());
            if kind == RequestKind::Upload {
                self.pending_image = None;
            }
            self.controller
                .complete(ServiceOutcome::failed(kind, err), &mut self.host);
        } else {
            self.host.status = format!("Waiting for {kind}...");
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.host.status = message;
                }
                UiEvent::Error(err) => {
                    self.host.report(&err);
                }
                UiEvent::ServiceHealth(health) => {
                    if let Err(reason) = &health {
                        tracing::warn!("portfolio service health check failed: {reason}");
                    }
                    self.service_health = Some(health);
                }
                UiEvent::Completed(outcome) => {
                    if let ServiceOutcome::Uploaded(result) = &outcome {
                        let pending = self.pending_image.take();
                        if result.is_ok() {
                            self.host.status = "Image uploaded".to_string();
                            self.decoded_image = pending;
                            self.image_texture = None;
                        }
                    }
                    self.controller.complete(outcome, &mut self.host);
                }
            }
        }
    }

    fn pick_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", ALLOWED_IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        let upload = match read_image_upload(&path) {
            Ok(upload) => upload,
            Err(err) => {
                let err = UiError::from_message(
                    UiErrorContext::Upload,
                    format!("Failed to read '{}': {err}", path.display()),
                );
                self.host.report(&err);
                return;
            }
        };
        let thumbnail = decode_preview_image(&upload.bytes);
        let Some(request) = self.controller.begin_upload(upload, &mut self.host) else {
            return;
        };
        self.pending_image = thumbnail
            .map_err(|err| tracing::debug!("no local thumbnail for upload: {err}"))
            .ok();
        self.dispatch_request(request);
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::SetField {
                section,
                field,
                value,
            } => {
                self.controller.update_field(section.as_str(), field, value);
            }
            UiAction::SetListField {
                section,
                index,
                field,
                value,
            } => {
                self.controller
                    .update_list_field(section, index, field, value);
            }
            UiAction::AddItem(section) => {
                self.controller.add_list_item(section, None);
            }
            UiAction::RemoveItem { section, index } => {
                self.controller.remove_list_item(section, index);
            }
            UiAction::PickImage => self.pick_image(),
            UiAction::Navigate(direction) => {
                self.controller.navigate(direction);
            }
            UiAction::Jump(section) => self.controller.jump_to(section),
            UiAction::RequestClear(section) => self.controller.request_clear(section),
            UiAction::ResolveClear(confirmed) => {
                let section = self.controller.pending_clear();
                if self.controller.resolve_clear(confirmed) {
                    if section == Some(SectionId::Personal) {
                        self.decoded_image = None;
                        self.image_texture = None;
                    }
                    self.host.status = "Section cleared".to_string();
                }
            }
            UiAction::Preview => {
                if let Some(request) = self.controller.begin_preview() {
                    self.dispatch_request(request);
                }
            }
            UiAction::Export => {
                if let Some(request) = self.controller.begin_export() {
                    self.dispatch_request(request);
                }
            }
            UiAction::DismissBanner => self.host.status_banner = None,
        }
    }

    fn image_texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        if self.controller.draft().personal.image.is_empty() {
            return None;
        }
        if self.image_texture.is_none() {
            let image = self.decoded_image.as_ref()?;
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width, image.height],
                &image.rgba,
            );
            self.image_texture = Some(ctx.load_texture(
                "personal-image-preview",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
        self.image_texture.as_ref()
    }

    fn show_status_banner(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let Some(banner) = &self.host.status_banner else {
            return;
        };
        let color = match banner.severity {
            StatusBannerSeverity::Error => egui::Color32::from_rgb(175, 96, 96),
        };
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new(&banner.message).color(color));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        actions.push(UiAction::DismissBanner);
                    }
                });
            });
        });
    }

    fn show_health(&self, ui: &mut egui::Ui) {
        let (text, color) = match &self.service_health {
            None => ("checking...".to_string(), egui::Color32::GRAY),
            Some(Ok(())) => ("online".to_string(), egui::Color32::from_rgb(87, 171, 90)),
            Some(Err(reason)) => (
                format!("offline ({reason})"),
                egui::Color32::from_rgb(175, 96, 96),
            ),
        };
        ui.label(format!("Service {}:", self.service_label));
        ui.label(egui::RichText::new(text).color(color));
    }

    fn show_clear_confirmation(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(section) = self.controller.pending_clear() else {
            return;
        };
        egui::Window::new(format!("Clear {}", section.label()))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(CLEAR_PROMPT);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Clear").clicked() {
                        actions.push(UiAction::ResolveClear(true));
                    }
                    if ui.button("Cancel").clicked() {
                        actions.push(UiAction::ResolveClear(false));
                    }
                });
            });
    }
}

impl eframe::App for BuilderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let mut actions = Vec::new();
        let view = self.controller.view();
        let preview_busy = self.controller.is_in_flight(RequestKind::Preview);
        let export_busy = self.controller.is_in_flight(RequestKind::Export);
        let upload_busy = self.controller.is_in_flight(RequestKind::Upload);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Portfolio Builder");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Check").clicked() {
                        self.queue_command(BackendCommand::CheckHealth);
                    }
                    self.show_health(ui);
                });
            });
            self.show_status_banner(ui, &mut actions);
        });

        egui::TopBottomPanel::bottom("navigation").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(view.can_go_back, egui::Button::new("< Previous"))
                    .clicked()
                {
                    actions.push(UiAction::Navigate(Direction::Prev));
                }
                ui.label(format!("Step {} of {}", view.position + 1, view.total));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if view.show_finish {
                        let label = if export_busy {
                            "Generating..."
                        } else {
                            "Download ZIP"
                        };
                        if ui
                            .add_enabled(!export_busy, egui::Button::new(label))
                            .clicked()
                        {
                            actions.push(UiAction::Export);
                        }
                    } else if ui.button("Next >").clicked() {
                        actions.push(UiAction::Navigate(Direction::Next));
                    }
                    let preview_label = if preview_busy {
                        "Rendering..."
                    } else {
                        "Preview"
                    };
                    if ui
                        .add_enabled(!preview_busy, egui::Button::new(preview_label))
                        .clicked()
                    {
                        actions.push(UiAction::Preview);
                    }
                });
            });
            ui.small(&self.host.status);
            ui.add_space(4.0);
        });

        egui::SidePanel::left("sections")
            .resizable(false)
            .default_width(170.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                for section in SectionId::ALL {
                    if ui
                        .selectable_label(view.is_visible(section), section.label())
                        .clicked()
                    {
                        actions.push(UiAction::Jump(section));
                    }
                }
            });

        let texture = self.image_texture(ctx).cloned();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(view.active.label());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear section").clicked() {
                        actions.push(UiAction::RequestClear(view.active));
                    }
                });
            });
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                panels::show_section(
                    ui,
                    self.controller.draft(),
                    view.active,
                    texture.as_ref(),
                    upload_busy,
                    &mut actions,
                );
            });
        });

        self.show_clear_confirmation(ctx, &mut actions);

        for action in actions {
            self.apply_action(action);
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    #[test]
    fn decodes_thumbnail_rgba() {
        let preview = decode_preview_image(&tiny_png()).expect("decode");
        assert_eq!((preview.width, preview.height), (4, 2));
        assert_eq!(preview.rgba.len(), 4 * 2 * 4);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(decode_preview_image(b"not an image").is_err());
    }

    #[test]
    fn picked_file_carries_name_and_mime_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("avatar.png");
        fs::write(&path, tiny_png()).expect("write");

        let upload = read_image_upload(&path).expect("read");

        assert_eq!(upload.filename, "avatar.png");
        assert_eq!(upload.mime_type.as_deref(), Some("image/png"));
        assert!(!upload.bytes.is_empty());
    }
}
