use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UnknownSection;

macro_rules! text_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl $name {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            pub fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            /// Returns `false` and leaves the record untouched for unknown names.
            pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
                match name {
                    $(stringify!($field) => {
                        self.$field = value.into();
                        true
                    })+
                    _ => false,
                }
            }

            pub fn from_fields(row: &BTreeMap<String, String>) -> Self {
                let mut record = Self::default();
                for (name, value) in row {
                    record.set_field(name, value.clone());
                }
                record
            }

            pub fn is_blank(&self) -> bool {
                $(self.$field.is_empty())&&+
            }
        }
    };
}

text_record!(Personal { name, title, location, bio, image });
text_record!(Social { github, linkedin, twitter });
text_record!(Contact { email });
text_record!(Skill { name });
text_record!(Project { title, description, link });
text_record!(Experience { company, role, year, description });
text_record!(Education { school, degree, year });

/// One of the seven wizard sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Personal,
    Social,
    Skills,
    Projects,
    Experience,
    Education,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        SectionId::Personal,
        SectionId::Social,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Experience,
        SectionId::Education,
        SectionId::Contact,
    ];

    pub const FIRST: SectionId = SectionId::Personal;
    pub const LAST: SectionId = SectionId::Contact;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Personal => "personal",
            SectionId::Social => "social",
            SectionId::Skills => "skills",
            SectionId::Projects => "projects",
            SectionId::Experience => "experience",
            SectionId::Education => "education",
            SectionId::Contact => "contact",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SectionId::Personal => "Personal Info",
            SectionId::Social => "Social Links",
            SectionId::Skills => "Skills",
            SectionId::Projects => "Projects",
            SectionId::Experience => "Experience",
            SectionId::Education => "Education",
            SectionId::Contact => "Contact",
        }
    }

    /// List sections hold ordered sequences; the rest are flat text records.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            SectionId::Skills | SectionId::Projects | SectionId::Experience | SectionId::Education
        )
    }

    /// Field names of the record (or of one list row) in display order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SectionId::Personal => Personal::FIELDS,
            SectionId::Social => Social::FIELDS,
            SectionId::Contact => Contact::FIELDS,
            SectionId::Skills => Skill::FIELDS,
            SectionId::Projects => Project::FIELDS,
            SectionId::Experience => Experience::FIELDS,
            SectionId::Education => Education::FIELDS,
        }
    }

    /// Clamped step along [`SectionId::ALL`]; never wraps.
    pub fn step(self, direction: Direction) -> SectionId {
        let index = self.index();
        let target = match direction {
            Direction::Next => (index + 1).min(Self::ALL.len() - 1),
            Direction::Prev => index.saturating_sub(1),
        };
        Self::ALL[target]
    }

    pub fn next(self) -> SectionId {
        self.step(Direction::Next)
    }

    pub fn prev(self) -> SectionId {
        self.step(Direction::Prev)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// A single row of one of the list sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    Skill(Skill),
    Project(Project),
    Experience(Experience),
    Education(Education),
}

impl ListItem {
    pub fn section(&self) -> SectionId {
        match self {
            ListItem::Skill(_) => SectionId::Skills,
            ListItem::Project(_) => SectionId::Projects,
            ListItem::Experience(_) => SectionId::Experience,
            ListItem::Education(_) => SectionId::Education,
        }
    }

    /// The empty row appended by an "add" control; `None` for record sections.
    pub fn blank(section: SectionId) -> Option<ListItem> {
        Self::from_fields(section, &BTreeMap::new())
    }

    pub fn from_fields(section: SectionId, row: &BTreeMap<String, String>) -> Option<ListItem> {
        match section {
            SectionId::Skills => Some(ListItem::Skill(Skill::from_fields(row))),
            SectionId::Projects => Some(ListItem::Project(Project::from_fields(row))),
            SectionId::Experience => Some(ListItem::Experience(Experience::from_fields(row))),
            SectionId::Education => Some(ListItem::Education(Education::from_fields(row))),
            SectionId::Personal | SectionId::Social | SectionId::Contact => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            ListItem::Skill(item) => item.field(name),
            ListItem::Project(item) => item.field(name),
            ListItem::Experience(item) => item.field(name),
            ListItem::Education(item) => item.field(name),
        }
    }
}

/// What [`Draft::merge_persisted`] did with each top-level key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys absent from the persisted data, left at their defaults.
    pub defaulted: Vec<SectionId>,
    /// Keys present but with an unusable shape, reset to their defaults.
    pub rejected: Vec<SectionId>,
    /// Keys the schema does not know about; dropped.
    pub ignored: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.ignored.is_empty()
    }
}

/// The whole wizard document. All seven sections are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub personal: Personal,
    pub social: Social,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub contact: Contact,
}

fn overlay<T: DeserializeOwned>(
    slot: &mut T,
    data: &Map<String, Value>,
    section: SectionId,
    report: &mut MergeReport,
) {
    match data.get(section.as_str()) {
        None => report.defaulted.push(section),
        Some(value) => match T::deserialize(value) {
            Ok(parsed) => *slot = parsed,
            Err(_) => report.rejected.push(section),
        },
    }
}

impl Draft {
    /// Overlays persisted `data` on schema defaults one top-level key at a time.
    /// Anything that is not a JSON object leaves every section at its default.
    pub fn merge_persisted(data: Option<&Value>) -> (Draft, MergeReport) {
        let mut draft = Draft::default();
        let mut report = MergeReport::default();

        let Some(Value::Object(data)) = data else {
            report.defaulted.extend(SectionId::ALL);
            return (draft, report);
        };

        overlay(&mut draft.personal, data, SectionId::Personal, &mut report);
        overlay(&mut draft.social, data, SectionId::Social, &mut report);
        overlay(&mut draft.skills, data, SectionId::Skills, &mut report);
        overlay(&mut draft.projects, data, SectionId::Projects, &mut report);
        overlay(&mut draft.experience, data, SectionId::Experience, &mut report);
        overlay(&mut draft.education, data, SectionId::Education, &mut report);
        overlay(&mut draft.contact, data, SectionId::Contact, &mut report);

        report.ignored = data
            .keys()
            .filter(|key| key.parse::<SectionId>().is_err())
            .cloned()
            .collect();

        (draft, report)
    }

    /// Sets one field of a record section. List sections and unknown fields are rejected.
    pub fn set_field(&mut self, section: SectionId, field: &str, value: impl Into<String>) -> bool {
        match section {
            SectionId::Personal => self.personal.set_field(field, value),
            SectionId::Social => self.social.set_field(field, value),
            SectionId::Contact => self.contact.set_field(field, value),
            _ => false,
        }
    }

    pub fn field(&self, section: SectionId, field: &str) -> Option<&str> {
        match section {
            SectionId::Personal => self.personal.field(field),
            SectionId::Social => self.social.field(field),
            SectionId::Contact => self.contact.field(field),
            _ => None,
        }
    }

    pub fn list_len(&self, section: SectionId) -> Option<usize> {
        match section {
            SectionId::Skills => Some(self.skills.len()),
            SectionId::Projects => Some(self.projects.len()),
            SectionId::Experience => Some(self.experience.len()),
            SectionId::Education => Some(self.education.len()),
            _ => None,
        }
    }

    pub fn items(&self, section: SectionId) -> Vec<ListItem> {
        match section {
            SectionId::Skills => self.skills.iter().cloned().map(ListItem::Skill).collect(),
            SectionId::Projects => self.projects.iter().cloned().map(ListItem::Project).collect(),
            SectionId::Experience => self
                .experience
                .iter()
                .cloned()
                .map(ListItem::Experience)
                .collect(),
            SectionId::Education => self
                .education
                .iter()
                .cloned()
                .map(ListItem::Education)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn push_item(&mut self, item: ListItem) {
        match item {
            ListItem::Skill(item) => self.skills.push(item),
            ListItem::Project(item) => self.projects.push(item),
            ListItem::Experience(item) => self.experience.push(item),
            ListItem::Education(item) => self.education.push(item),
        }
    }

    pub fn remove_item(&mut self, section: SectionId, index: usize) -> bool {
        fn remove_at<T>(list: &mut Vec<T>, index: usize) -> bool {
            if index < list.len() {
                list.remove(index);
                true
            } else {
                false
            }
        }

        match section {
            SectionId::Skills => remove_at(&mut self.skills, index),
            SectionId::Projects => remove_at(&mut self.projects, index),
            SectionId::Experience => remove_at(&mut self.experience, index),
            SectionId::Education => remove_at(&mut self.education, index),
            _ => false,
        }
    }

    pub fn set_item_field(
        &mut self,
        section: SectionId,
        index: usize,
        field: &str,
        value: impl Into<String>,
    ) -> bool {
        match section {
            SectionId::Skills => self
                .skills
                .get_mut(index)
                .is_some_and(|item| item.set_field(field, value)),
            SectionId::Projects => self
                .projects
                .get_mut(index)
                .is_some_and(|item| item.set_field(field, value)),
            SectionId::Experience => self
                .experience
                .get_mut(index)
                .is_some_and(|item| item.set_field(field, value)),
            SectionId::Education => self
                .education
                .get_mut(index)
                .is_some_and(|item| item.set_field(field, value)),
            _ => false,
        }
    }

    /// Replaces a list section wholesale. Items of another section's shape are dropped.
    pub fn replace_list(&mut self, section: SectionId, items: Vec<ListItem>) -> bool {
        if !section.is_list() {
            return false;
        }
        self.clear(section);
        for item in items.into_iter().filter(|item| item.section() == section) {
            self.push_item(item);
        }
        true
    }

    /// Resets one section to its default shape.
    pub fn clear(&mut self, section: SectionId) {
        match section {
            SectionId::Personal => self.personal = Personal::default(),
            SectionId::Social => self.social = Social::default(),
            SectionId::Skills => self.skills.clear(),
            SectionId::Projects => self.projects.clear(),
            SectionId::Experience => self.experience.clear(),
            SectionId::Education => self.education.clear(),
            SectionId::Contact => self.contact = Contact::default(),
        }
    }

    pub fn is_section_empty(&self, section: SectionId) -> bool {
        match section {
            SectionId::Personal => self.personal.is_blank(),
            SectionId::Social => self.social.is_blank(),
            SectionId::Contact => self.contact.is_blank(),
            list => self.list_len(list) == Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stepping_clamps_at_both_ends() {
        assert_eq!(SectionId::Personal.prev(), SectionId::Personal);
        assert_eq!(SectionId::Contact.next(), SectionId::Contact);
        assert_eq!(SectionId::Skills.next(), SectionId::Projects);
        assert_eq!(SectionId::Skills.prev(), SectionId::Social);

        let mut section = SectionId::FIRST;
        for _ in 0..20 {
            section = section.next();
        }
        assert_eq!(section, SectionId::LAST);
    }

    #[test]
    fn section_ids_round_trip_through_their_identifiers() {
        for section in SectionId::ALL {
            assert_eq!(section.as_str().parse::<SectionId>().unwrap(), section);
            assert_eq!(
                serde_json::to_value(section).unwrap(),
                json!(section.as_str())
            );
        }
        assert!("Personal".parse::<SectionId>().is_err());
        assert!("style".parse::<SectionId>().is_err());
    }

    #[test]
    fn merge_fills_missing_sections_with_defaults() {
        let data = json!({
            "personal": { "name": "Ada", "title": "Engineer" },
            "skills": [{ "name": "Rust" }]
        });

        let (draft, report) = Draft::merge_persisted(Some(&data));

        assert_eq!(draft.personal.name, "Ada");
        assert_eq!(draft.personal.bio, "");
        assert_eq!(draft.skills, vec![Skill { name: "Rust".into() }]);
        assert_eq!(draft.contact, Contact::default());
        assert!(report.defaulted.contains(&SectionId::Contact));
        assert!(report.is_clean());
    }

    #[test]
    fn merge_resets_wrongly_shaped_sections_and_ignores_unknown_keys() {
        let data = json!({
            "skills": null,
            "personal": 3,
            "contact": { "email": "ada@example.com" },
            "style": { "template": "minimal" }
        });

        let (draft, report) = Draft::merge_persisted(Some(&data));

        assert!(draft.skills.is_empty());
        assert_eq!(draft.personal, Personal::default());
        assert_eq!(draft.contact.email, "ada@example.com");
        assert_eq!(report.rejected, vec![SectionId::Personal, SectionId::Skills]);
        assert_eq!(report.ignored, vec!["style".to_string()]);
    }

    #[test]
    fn merge_without_object_yields_defaults() {
        let (draft, report) = Draft::merge_persisted(Some(&json!("nope")));
        assert_eq!(draft, Draft::default());
        assert_eq!(report.defaulted.len(), SectionId::ALL.len());

        let (draft, _) = Draft::merge_persisted(None);
        assert_eq!(draft, Draft::default());
    }

    #[test]
    fn record_fields_reject_unknown_names_and_list_sections() {
        let mut draft = Draft::default();
        assert!(draft.set_field(SectionId::Social, "github", "ada"));
        assert!(!draft.set_field(SectionId::Social, "mastodon", "ada"));
        assert!(!draft.set_field(SectionId::Skills, "name", "Rust"));
        assert_eq!(draft.field(SectionId::Social, "github"), Some("ada"));
        assert_eq!(draft.field(SectionId::Social, "mastodon"), None);
    }

    #[test]
    fn list_rows_are_positional() {
        let mut draft = Draft::default();
        for name in ["a", "b", "c"] {
            let mut row = BTreeMap::new();
            row.insert("name".to_string(), name.to_string());
            draft.push_item(ListItem::from_fields(SectionId::Skills, &row).unwrap());
        }

        assert!(draft.remove_item(SectionId::Skills, 1));
        assert!(!draft.remove_item(SectionId::Skills, 5));
        let names: Vec<_> = draft.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);

        assert!(draft.set_item_field(SectionId::Skills, 1, "name", "z"));
        assert!(!draft.set_item_field(SectionId::Skills, 2, "name", "z"));
        assert_eq!(draft.skills[1].name, "z");
    }

    #[test]
    fn replace_list_keeps_only_matching_shapes() {
        let mut draft = Draft::default();
        draft.skills.push(Skill { name: "old".into() });

        let replaced = draft.replace_list(
            SectionId::Skills,
            vec![
                ListItem::Skill(Skill { name: "new".into() }),
                ListItem::Project(Project::default()),
            ],
        );

        assert!(replaced);
        assert_eq!(draft.skills, vec![Skill { name: "new".into() }]);
        assert!(draft.projects.is_empty());
        assert!(!draft.replace_list(SectionId::Contact, Vec::new()));
    }

    #[test]
    fn blank_items_exist_only_for_list_sections() {
        for section in SectionId::ALL {
            assert_eq!(ListItem::blank(section).is_some(), section.is_list());
        }
    }
}
