//! Section forms. Panels only read the draft and emit [`UiAction`]s.

use eframe::egui;
use shared::domain::{Draft, ListItem, SectionId};

use crate::controller::events::UiAction;

const MULTILINE_FIELDS: &[&str] = &["bio", "description"];

pub fn field_label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field_hint(section: SectionId, field: &str) -> &'static str {
    match (section, field) {
        (SectionId::Social, _) | (_, "link") => "https://",
        (SectionId::Contact, "email") => "you@example.com",
        (_, "year") => "e.g. 2019 - 2023",
        _ => "",
    }
}

/// Draws one labelled input and returns the new value when the user edited it.
fn text_input(
    ui: &mut egui::Ui,
    id: impl std::hash::Hash,
    section: SectionId,
    field: &'static str,
    current: &str,
) -> Option<String> {
    let mut value = current.to_string();
    ui.label(egui::RichText::new(field_label(field)).strong());
    let edit = if MULTILINE_FIELDS.contains(&field) {
        egui::TextEdit::multiline(&mut value).desired_rows(3)
    } else {
        egui::TextEdit::singleline(&mut value)
    };
    let response = ui.add(
        edit.id_salt(id)
            .hint_text(field_hint(section, field))
            .desired_width(f32::INFINITY),
    );
    response.changed().then_some(value)
}

pub fn show_section(
    ui: &mut egui::Ui,
    draft: &Draft,
    section: SectionId,
    image_preview: Option<&egui::TextureHandle>,
    upload_busy: bool,
    actions: &mut Vec<UiAction>,
) {
    if section.is_list() {
        show_list_section(ui, draft, section, actions);
    } else {
        show_record_section(ui, draft, section, image_preview, upload_busy, actions);
    }
}

fn show_record_section(
    ui: &mut egui::Ui,
    draft: &Draft,
    section: SectionId,
    image_preview: Option<&egui::TextureHandle>,
    upload_busy: bool,
    actions: &mut Vec<UiAction>,
) {
    for &field in section.fields() {
        let current = draft.field(section, field).unwrap_or_default();
        if section == SectionId::Personal && field == "image" {
            show_image_field(ui, current, image_preview, upload_busy, actions);
            continue;
        }
        if let Some(value) = text_input(ui, (section.as_str(), field), section, field, current) {
            actions.push(UiAction::SetField {
                section,
                field,
                value,
            });
        }
        ui.add_space(6.0);
    }
}

fn show_image_field(
    ui: &mut egui::Ui,
    current: &str,
    image_preview: Option<&egui::TextureHandle>,
    upload_busy: bool,
    actions: &mut Vec<UiAction>,
) {
    ui.label(egui::RichText::new("Image").strong());
    ui.horizontal(|ui| {
        let label = if upload_busy {
            "Uploading..."
        } else {
            "Choose image..."
        };
        if ui
            .add_enabled(!upload_busy, egui::Button::new(label))
            .clicked()
        {
            actions.push(UiAction::PickImage);
        }
        if current.is_empty() {
            ui.weak("No image uploaded");
        } else {
            ui.monospace(current);
        }
    });
    if let Some(texture) = image_preview {
        ui.add(
            egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                .max_width(160.0)
                .max_height(160.0),
        );
    }
    ui.add_space(6.0);
}

fn show_list_section(
    ui: &mut egui::Ui,
    draft: &Draft,
    section: SectionId,
    actions: &mut Vec<UiAction>,
) {
    let items = draft.items(section);
    if items.is_empty() {
        ui.weak(format!("No {} yet.", section.label().to_lowercase()));
    }

    for (index, item) in items.iter().enumerate() {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            show_list_item(ui, section, index, item, actions);
        });
        ui.add_space(6.0);
    }

    let add_label = match section {
        SectionId::Skills => "+ Add skill",
        SectionId::Projects => "+ Add project",
        SectionId::Experience => "+ Add experience",
        SectionId::Education => "+ Add education",
        _ => "+ Add",
    };
    if ui.button(add_label).clicked() {
        actions.push(UiAction::AddItem(section));
    }
}

fn show_list_item(
    ui: &mut egui::Ui,
    section: SectionId,
    index: usize,
    item: &ListItem,
    actions: &mut Vec<UiAction>,
) {
    for &field in section.fields() {
        let current = item.field(field).unwrap_or_default();
        let id = (section.as_str(), index, field);
        if let Some(value) = text_input(ui, id, section, field, current) {
            actions.push(UiAction::SetListField {
                section,
                index,
                field,
                value,
            });
        }
    }
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        if ui.button("Remove").clicked() {
            actions.push(UiAction::RemoveItem { section, index });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_capitalize_field_names() {
        assert_eq!(field_label("linkedin"), "Linkedin");
        assert_eq!(field_label("year"), "Year");
        assert_eq!(field_label(""), "");
    }

    #[test]
    fn hints_follow_field_kind() {
        assert_eq!(field_hint(SectionId::Social, "github"), "https://");
        assert_eq!(field_hint(SectionId::Projects, "link"), "https://");
        assert_eq!(field_hint(SectionId::Education, "year"), "e.g. 2019 - 2023");
        assert_eq!(field_hint(SectionId::Personal, "name"), "");
    }
}
