use waymark_data::ContactId;

/// The single highlighted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlight {
    Contact(ContactId),
    Place(String),
}

/// Active contact and active place.
///
/// Both may be set at once, but only the most recent selection is highlighted.
/// The active place keeps driving list ordering after a contact is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    contact: Option<ContactId>,
    place: Option<String>,
    highlight: Option<Highlight>,
}

impl SelectionState {
    pub fn select_contact(&mut self, id: ContactId) {
        self.highlight = Some(Highlight::Contact(id.clone()));
        self.contact = Some(id);
    }

    pub fn select_place(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.highlight = Some(Highlight::Place(name.clone()));
        self.place = Some(name);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn active_contact(&self) -> Option<&ContactId> {
        self.contact.as_ref()
    }

    pub fn active_place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn is_highlighted(&self, id: &ContactId) -> bool {
        matches!(&self.highlight, Some(Highlight::Contact(active)) if active == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_contact_moves_highlight_but_keeps_place() {
        let mut selection = SelectionState::default();
        selection.select_place("Austin");
        assert_eq!(selection.highlight(), Some(&Highlight::Place("Austin".to_string())));

        selection.select_contact(ContactId::new("c-1"));
        assert!(selection.is_highlighted(&ContactId::new("c-1")));
        assert_eq!(selection.active_place(), Some("Austin"));
    }

    #[test]
    fn test_selecting_place_clears_contact_highlight() {
        let mut selection = SelectionState::default();
        selection.select_contact(ContactId::new("c-1"));
        selection.select_place("Reno");
        assert!(!selection.is_highlighted(&ContactId::new("c-1")));
        assert_eq!(selection.active_contact(), Some(&ContactId::new("c-1")));

        selection.clear();
        assert_eq!(selection, SelectionState::default());
    }
}
