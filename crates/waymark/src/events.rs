use waymark_data::Contact;

/// Events produced for the page layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A city or state was activated; carries the name, not coordinates.
    PlaceSelected(String),
    ContactSelected(Contact),
    VisibleContactsChanged(Vec<Contact>),
}
