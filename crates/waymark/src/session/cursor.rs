//! Keyboard cursor over the sectioned result list.

use super::evaluate::SearchResult;

/// Result sections in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Contacts,
    Cities,
    States,
}

const SECTIONS: [Section; 3] = [Section::Contacts, Section::Cities, Section::States];

/// A single linear cursor across all sections.
///
/// Moving past the end of one section lands in the next populated one; empty
/// sections are never visited. Movement wraps from the last item to the first
/// and back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    lens: [usize; 3],
    position: Option<usize>,
}

impl Cursor {
    /// Cursor on the first item of `result`, or unset when it is empty.
    pub fn for_result(result: &SearchResult) -> Self {
        let lens = [result.contacts.len(), result.cities.len(), result.states.len()];
        let total: usize = lens.iter().sum();
        Self {
            lens,
            position: (total > 0).then_some(0),
        }
    }

    fn total(&self) -> usize {
        self.lens.iter().sum()
    }

    pub fn down(&mut self) {
        let total = self.total();
        if let Some(pos) = self.position.as_mut() {
            *pos = (*pos + 1) % total;
        }
    }

    pub fn up(&mut self) {
        let total = self.total();
        if let Some(pos) = self.position.as_mut() {
            *pos = (*pos + total - 1) % total;
        }
    }

    /// Section and index within it under the cursor.
    pub fn location(&self) -> Option<(Section, usize)> {
        let mut remaining = self.position?;
        for (section, len) in SECTIONS.into_iter().zip(self.lens) {
            if remaining < len {
                return Some((section, remaining));
            }
            remaining -= len;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::evaluate::{PlaceHit, PlaceKind};
    use waymark_data::Contact;

    fn result(contacts: usize, cities: usize, states: usize) -> SearchResult {
        let place = |i: usize| PlaceHit {
            name: format!("p{i}"),
            kind: PlaceKind::Match,
        };
        SearchResult {
            contacts: (0..contacts).map(|i| Contact::new(format!("c{i}"))).collect(),
            cities: (0..cities).map(place).collect(),
            states: (0..states).map(place).collect(),
            anchor: None,
        }
    }

    #[test]
    fn test_empty_result_has_no_cursor() {
        let mut cursor = Cursor::for_result(&result(0, 0, 0));
        cursor.down();
        cursor.up();
        assert_eq!(cursor.location(), None);
    }

    #[test]
    fn test_down_crosses_sections_and_skips_empty() {
        let mut cursor = Cursor::for_result(&result(2, 0, 1));
        assert_eq!(cursor.location(), Some((Section::Contacts, 0)));
        cursor.down();
        assert_eq!(cursor.location(), Some((Section::Contacts, 1)));
        cursor.down();
        assert_eq!(cursor.location(), Some((Section::States, 0)));
        cursor.down();
        assert_eq!(cursor.location(), Some((Section::Contacts, 0)), "wraps to the top");
    }

    #[test]
    fn test_up_lands_on_bottom_of_previous_section() {
        let mut cursor = Cursor::for_result(&result(1, 3, 0));
        cursor.down();
        assert_eq!(cursor.location(), Some((Section::Cities, 0)));
        cursor.up();
        assert_eq!(cursor.location(), Some((Section::Contacts, 0)));
        cursor.up();
        assert_eq!(cursor.location(), Some((Section::Cities, 2)), "wraps to the bottom");
    }
}
