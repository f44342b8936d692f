use crate::model::OsVariant;
use std::collections::HashMap;

/// Per-session user choices: the OS variant picked for each image and the one
/// image whose detail view is open. Entries are created lazily, so catalog
/// reloads never need to resynchronize this map.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    variant_by_image_id: HashMap<String, OsVariant>,
    open_image_id: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variant(&mut self, image_id: &str, variant: OsVariant) {
        self.variant_by_image_id
            .insert(image_id.to_string(), variant);
    }

    pub fn variant(&self, image_id: &str) -> OsVariant {
        self.variant_by_image_id
            .get(image_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn toggle_variant(&mut self, image_id: &str) -> OsVariant {
        let next = self.variant(image_id).toggled();
        self.set_variant(image_id, next);
        next
    }

    pub fn open(&mut self, image_id: &str) {
        self.open_image_id = Some(image_id.to_string());
    }

    pub fn close(&mut self) {
        self.open_image_id = None;
    }

    pub fn open_image_id(&self) -> Option<&str> {
        self.open_image_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionState;
    use crate::model::OsVariant;

    #[test]
    fn unknown_ids_default_to_ubuntu() {
        let selection = SelectionState::new();
        assert_eq!(selection.variant("never-set"), OsVariant::Ubuntu);
    }

    #[test]
    fn last_write_wins_and_repeats_are_idempotent() {
        let mut selection = SelectionState::new();
        selection.set_variant("a", OsVariant::Windows);
        selection.set_variant("a", OsVariant::Windows);
        assert_eq!(selection.variant("a"), OsVariant::Windows);

        selection.set_variant("a", OsVariant::Ubuntu);
        assert_eq!(selection.variant("a"), OsVariant::Ubuntu);
        assert_eq!(selection.variant("b"), OsVariant::Ubuntu);
    }

    #[test]
    fn toggle_flips_from_default() {
        let mut selection = SelectionState::new();
        assert_eq!(selection.toggle_variant("a"), OsVariant::Windows);
        assert_eq!(selection.toggle_variant("a"), OsVariant::Ubuntu);
    }

    #[test]
    fn opening_replaces_previous_and_close_always_clears() {
        let mut selection = SelectionState::new();
        selection.close();
        assert_eq!(selection.open_image_id(), None);

        selection.open("a");
        selection.open("b");
        assert_eq!(selection.open_image_id(), Some("b"));

        selection.close();
        assert_eq!(selection.open_image_id(), None);
    }

    #[test]
    fn ids_absent_from_catalog_are_accepted() {
        let mut selection = SelectionState::new();
        selection.set_variant("ghost", OsVariant::Windows);
        selection.open("ghost");
        assert_eq!(selection.open_image_id(), Some("ghost"));
        assert_eq!(selection.variant("ghost"), OsVariant::Windows);
    }
}
