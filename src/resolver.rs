use crate::error::LabError;
use crate::model::{CommandKind, LabImage, OsVariant};

/// The strings shown, copied and executed for one (image, variant) pair.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ResolvedCommands {
    pub variant: OsVariant,
    pub pull_command: Option<String>,
    pub run_command: Option<String>,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}

impl ResolvedCommands {
    pub fn get(&self, kind: CommandKind) -> Option<&str> {
        match kind {
            CommandKind::Pull => self.pull_command.as_deref(),
            CommandKind::Run => self.run_command.as_deref(),
        }
        .filter(|command| !command.trim().is_empty())
    }

    pub fn command(&self, kind: CommandKind) -> Result<&str, LabError> {
        self.get(kind).ok_or(LabError::MissingCommand {
            kind,
            variant: self.variant,
        })
    }
}

pub fn resolve(image: &LabImage, variant: OsVariant) -> ResolvedCommands {
    let (pull, run, instructions) = match variant {
        OsVariant::Ubuntu => (
            &image.ubuntu_pull_command,
            &image.ubuntu_run_command,
            &image.ubuntu_instructions,
        ),
        OsVariant::Windows => (
            &image.windows_pull_command,
            &image.windows_run_command,
            &image.windows_instructions,
        ),
    };

    ResolvedCommands {
        variant,
        pull_command: non_empty(pull),
        run_command: non_empty(run),
        instructions: non_empty(instructions),
        notes: non_empty(&image.notes),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::error::LabError;
    use crate::model::{CommandKind, LabImage, OsVariant};

    fn full_image() -> LabImage {
        LabImage {
            id: "a".to_string(),
            subject: Some("OS Labs".to_string()),
            semester: Some("Sem 3".to_string()),
            ubuntu_pull_command: Some("docker pull os:u".to_string()),
            windows_pull_command: Some("docker pull os:w".to_string()),
            ubuntu_run_command: Some("docker run u".to_string()),
            windows_run_command: Some("docker run w".to_string()),
            ubuntu_instructions: Some("use bash".to_string()),
            windows_instructions: Some("use powershell".to_string()),
            notes: Some("bring a laptop".to_string()),
        }
    }

    #[test]
    fn commands_follow_the_selected_variant() {
        let image = full_image();

        let ubuntu = resolve(&image, OsVariant::Ubuntu);
        assert_eq!(ubuntu.pull_command.as_deref(), Some("docker pull os:u"));
        assert_eq!(ubuntu.run_command.as_deref(), Some("docker run u"));
        assert_eq!(ubuntu.instructions.as_deref(), Some("use bash"));

        let windows = resolve(&image, OsVariant::Windows);
        assert_eq!(windows.pull_command.as_deref(), Some("docker pull os:w"));
        assert_eq!(windows.run_command.as_deref(), Some("docker run w"));
        assert_eq!(windows.instructions.as_deref(), Some("use powershell"));
    }

    #[test]
    fn notes_do_not_depend_on_variant() {
        let image = full_image();
        assert_eq!(
            resolve(&image, OsVariant::Ubuntu).notes,
            resolve(&image, OsVariant::Windows).notes
        );
    }

    #[test]
    fn instructions_never_fall_back_to_other_variant() {
        let image = LabImage {
            ubuntu_instructions: Some("use bash".to_string()),
            windows_instructions: Some(String::new()),
            ..full_image()
        };
        assert_eq!(resolve(&image, OsVariant::Windows).instructions, None);
    }

    #[test]
    fn absent_windows_run_command_is_reported_as_missing() {
        let image = LabImage {
            id: "a".to_string(),
            ubuntu_run_command: Some("docker run u".to_string()),
            ..LabImage::default()
        };

        let ubuntu = resolve(&image, OsVariant::Ubuntu);
        assert_eq!(ubuntu.command(CommandKind::Run), Ok("docker run u"));

        let windows = resolve(&image, OsVariant::Windows);
        assert_eq!(windows.run_command, None);
        assert_eq!(
            windows.command(CommandKind::Run),
            Err(LabError::MissingCommand {
                kind: CommandKind::Run,
                variant: OsVariant::Windows,
            })
        );
    }

    #[test]
    fn blank_commands_are_treated_as_absent() {
        let image = LabImage {
            id: "a".to_string(),
            ubuntu_pull_command: Some("   ".to_string()),
            ..LabImage::default()
        };
        assert_eq!(resolve(&image, OsVariant::Ubuntu).pull_command, None);
    }
}
