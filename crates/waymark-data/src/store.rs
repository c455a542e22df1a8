//! Keyed contact storage.

use ahash::AHashMap as HashMap;
use tracing::debug;

use crate::contact::{Contact, ContactId};
use crate::{DataError, Result};

/// The contact store boundary: a keyed record store queried by city substring.
pub trait ContactStore {
    /// All contacts whose city contains `city_filter` (case-insensitive), or every
    /// contact when no filter is given.
    fn contacts(&self, city_filter: Option<&str>) -> Result<Vec<Contact>>;

    fn get(&self, id: &ContactId) -> Option<Contact>;
}

/// Insertion-ordered in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactStore {
    records: Vec<Contact>,
    by_id: HashMap<ContactId, usize>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a contact, replacing any existing record with the same id in place.
    pub fn upsert(&mut self, contact: Contact) {
        if let Some(&idx) = self.by_id.get(&contact.id) {
            debug!(id = %contact.id, "Replacing existing contact");
            self.records[idx] = contact;
        } else {
            self.by_id.insert(contact.id.clone(), self.records.len());
            self.records.push(contact);
        }
    }

    pub fn remove(&mut self, id: &ContactId) -> Result<Contact> {
        let idx = self
            .by_id
            .remove(id)
            .ok_or_else(|| DataError::ContactNotFound(id.to_string()))?;
        let removed = self.records.remove(idx);
        for slot in self.by_id.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Ok(removed)
    }
}

impl FromIterator<Contact> for InMemoryContactStore {
    fn from_iter<I: IntoIterator<Item = Contact>>(iter: I) -> Self {
        let mut store = Self::new();
        for contact in iter {
            store.upsert(contact);
        }
        store
    }
}

impl ContactStore for InMemoryContactStore {
    fn contacts(&self, city_filter: Option<&str>) -> Result<Vec<Contact>> {
        let needle = city_filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());
        Ok(self
            .records
            .iter()
            .filter(|contact| match &needle {
                Some(needle) => contact
                    .city
                    .as_deref()
                    .is_some_and(|city| city.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn get(&self, id: &ContactId) -> Option<Contact> {
        self.by_id.get(id).map(|&idx| self.records[idx].clone())
    }
}
