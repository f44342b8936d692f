use crate::model::{CommandKind, OsVariant};
use thiserror::Error;

/// Failures surfaced by the lab catalog and its collaborators. None of them
/// end the session; each degrades to a status warning or retained state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LabError {
    #[error("catalog load failed: {0}")]
    CatalogLoad(String),

    #[error("{} command is missing for {}", kind.label(), variant.title())]
    MissingCommand { kind: CommandKind, variant: OsVariant },

    #[error("execution bridge is not available on this host")]
    ExecutionUnavailable,

    #[error("clipboard error: {0}")]
    Clipboard(String),
}

impl LabError {
    pub fn catalog_load(error: impl std::fmt::Display) -> Self {
        Self::CatalogLoad(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::LabError;
    use crate::model::{CommandKind, OsVariant};

    #[test]
    fn missing_command_names_kind_and_variant() {
        let error = LabError::MissingCommand {
            kind: CommandKind::Run,
            variant: OsVariant::Windows,
        };
        assert_eq!(error.to_string(), "run command is missing for Windows");
    }
}
