use serde::Deserialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum OsVariant {
    #[default]
    Ubuntu,
    Windows,
}

impl OsVariant {
    pub const ALL: [Self; 2] = [Self::Ubuntu, Self::Windows];

    pub fn title(self) -> &'static str {
        match self {
            Self::Ubuntu => "Ubuntu",
            Self::Windows => "Windows",
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Windows => "windows",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ubuntu => Self::Windows,
            Self::Windows => Self::Ubuntu,
        }
    }
}

impl Display for OsVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_token())
    }
}

/// Which of the two resolved commands an action targets.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum CommandKind {
    #[default]
    Pull,
    Run,
}

impl CommandKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Run => "run",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Pull => "Pull Command",
            Self::Run => "Run Command",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Pull => Self::Run,
            Self::Run => Self::Pull,
        }
    }
}

/// One catalog entry as served by the catalog service.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(try_from = "LabImageRecord")]
pub struct LabImage {
    pub id: String,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub ubuntu_pull_command: Option<String>,
    pub windows_pull_command: Option<String>,
    pub ubuntu_run_command: Option<String>,
    pub windows_run_command: Option<String>,
    pub ubuntu_instructions: Option<String>,
    pub windows_instructions: Option<String>,
    pub notes: Option<String>,
}

/// Wire shape of a catalog record. Document stores may send `_id`, `id`, or
/// both; `_id` wins when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabImageRecord {
    #[serde(default, rename = "_id")]
    document_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    semester: Option<String>,
    #[serde(default)]
    ubuntu_pull_command: Option<String>,
    #[serde(default)]
    windows_pull_command: Option<String>,
    #[serde(default)]
    ubuntu_run_command: Option<String>,
    #[serde(default)]
    windows_run_command: Option<String>,
    #[serde(default)]
    ubuntu_instructions: Option<String>,
    #[serde(default)]
    windows_instructions: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl TryFrom<LabImageRecord> for LabImage {
    type Error = String;

    fn try_from(record: LabImageRecord) -> Result<Self, Self::Error> {
        let id = record
            .document_id
            .or(record.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "lab image record has no `_id` or `id`".to_string())?;

        Ok(Self {
            id,
            subject: record.subject,
            semester: record.semester,
            ubuntu_pull_command: record.ubuntu_pull_command,
            windows_pull_command: record.windows_pull_command,
            ubuntu_run_command: record.ubuntu_run_command,
            windows_run_command: record.windows_run_command,
            ubuntu_instructions: record.ubuntu_instructions,
            windows_instructions: record.windows_instructions,
            notes: record.notes,
        })
    }
}

impl LabImage {
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    pub fn semester(&self) -> &str {
        self.semester.as_deref().unwrap_or_default()
    }

    pub fn title(&self) -> String {
        format!("{} - {}", self.semester(), self.subject())
    }

    /// Case-folded substring match on the subject only. An empty query
    /// matches every image.
    pub fn matches_subject(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        self.subject()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::{LabImage, OsVariant};

    #[test]
    fn variant_defaults_to_ubuntu_and_toggles() {
        assert_eq!(OsVariant::default(), OsVariant::Ubuntu);
        assert_eq!(OsVariant::Ubuntu.toggled(), OsVariant::Windows);
        assert_eq!(OsVariant::Windows.toggled(), OsVariant::Ubuntu);
        assert_eq!(OsVariant::Windows.to_string(), "windows");
    }

    #[test]
    fn lab_image_deserializes_mongo_style_record() {
        let raw = r#"{
            "_id": "665f1c",
            "subject": "Operating Systems",
            "semester": "Sem 4",
            "ubuntuPullCommand": "docker pull os:u",
            "windowsPullCommand": "docker pull os:w",
            "ubuntuRunCommand": "docker run -it os:u",
            "windowsInstructions": null,
            "createdAt": "2024-06-01T10:00:00Z",
            "__v": 0
        }"#;

        let image: LabImage = serde_json::from_str(raw).expect("record should parse");
        assert_eq!(image.id, "665f1c");
        assert_eq!(image.subject(), "Operating Systems");
        assert_eq!(image.title(), "Sem 4 - Operating Systems");
        assert_eq!(image.ubuntu_pull_command.as_deref(), Some("docker pull os:u"));
        assert_eq!(image.windows_run_command, None);
        assert_eq!(image.windows_instructions, None);
    }

    #[test]
    fn lab_image_accepts_plain_id_and_null_subject() {
        let raw = r#"{"id": "a", "subject": null}"#;
        let image: LabImage = serde_json::from_str(raw).expect("record should parse");
        assert_eq!(image.id, "a");
        assert_eq!(image.subject(), "");
        assert!(image.matches_subject(""));
        assert!(!image.matches_subject("os"));
    }

    #[test]
    fn document_id_wins_when_both_ids_are_sent() {
        let raw = r#"{"_id": "665f1c", "id": "virtual-665f1c", "subject": "OS Labs"}"#;
        let image: LabImage = serde_json::from_str(raw).expect("record should parse");
        assert_eq!(image.id, "665f1c");
        assert_eq!(image.subject(), "OS Labs");
    }

    #[test]
    fn record_without_any_id_is_rejected() {
        let error = serde_json::from_str::<LabImage>(r#"{"subject": "OS Labs"}"#)
            .expect_err("record has no id");
        assert!(error.to_string().contains("no `_id` or `id`"));
    }

    #[test]
    fn subject_match_is_case_insensitive_substring() {
        let image = LabImage {
            id: "a".to_string(),
            subject: Some("Database Systems".to_string()),
            ..LabImage::default()
        };
        assert!(image.matches_subject("BASE"));
        assert!(image.matches_subject("database systems"));
        assert!(!image.matches_subject("networks"));
    }
}
