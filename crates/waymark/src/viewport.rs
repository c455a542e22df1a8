//! Keeps the contact list in step with what the map is showing.

use std::collections::VecDeque;

use ahash::AHashMap as HashMap;
use tracing::{debug, instrument};
use waymark_data::{Contact, ContactId, Coordinates};

/// Axis-aligned viewport rectangle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl ViewportBounds {
    pub const fn new(south_west: Coordinates, north_east: Coordinates) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Inclusive on every edge. A west edge east of the east edge means the
    /// viewport spans the antimeridian.
    pub fn contains(&self, point: Coordinates) -> bool {
        let lat_ok =
            point.latitude >= self.south_west.latitude && point.latitude <= self.north_east.latitude;
        let (west, east) = (self.south_west.longitude, self.north_east.longitude);
        let lon_ok = if west <= east {
            point.longitude >= west && point.longitude <= east
        } else {
            point.longitude >= west || point.longitude <= east
        };
        lat_ok && lon_ok
    }
}

/// Tracks which geocoded contacts fall inside the settled viewport.
#[derive(Debug, Clone, Default)]
pub struct ViewportReconciler {
    contacts: Vec<Contact>,
    bounds: Option<ViewportBounds>,
    visible: Vec<Contact>,
}

impl ViewportReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.bounds
    }

    /// Replace the contact collection, recomputing visibility. Returns whether the
    /// visible set changed.
    pub fn set_contacts(&mut self, contacts: Vec<Contact>) -> bool {
        self.contacts = contacts;
        self.recompute()
    }

    /// Record newly settled bounds. Returns whether the visible set changed.
    #[instrument(name = "Bounds changed", skip_all, level = "debug")]
    pub fn on_bounds_changed(&mut self, bounds: ViewportBounds) -> bool {
        self.bounds = Some(bounds);
        self.recompute()
    }

    pub fn visible_contacts(&self) -> &[Contact] {
        &self.visible
    }

    fn recompute(&mut self) -> bool {
        let visible: Vec<Contact> = match self.bounds {
            Some(bounds) => self
                .contacts
                .iter()
                .filter(|c| c.coordinates().is_some_and(|p| bounds.contains(p)))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let changed = !same_ids(&visible, &self.visible);
        if changed {
            debug!(visible = visible.len(), total = self.contacts.len(), "Visible contacts changed");
        }
        self.visible = visible;
        changed
    }
}

fn same_ids(a: &[Contact], b: &[Contact]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

/// One row of the contact list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListedContact<'a> {
    pub contact: &'a Contact,
    pub in_viewport: bool,
}

/// Order `all` for display: contacts in `visible` first (in `visible`'s order),
/// then the rest in their original order.
///
/// When nothing is visible and a place is active, the rest are ordered by
/// exact city match, then substring match, then city name. The output always
/// holds exactly the contacts of `all`.
pub fn ordered_contact_list<'a>(
    all: &'a [Contact],
    visible: &[Contact],
    active_place: Option<&str>,
) -> Vec<ListedContact<'a>> {
    let mut slots: HashMap<&ContactId, VecDeque<usize>> = HashMap::new();
    for (idx, contact) in all.iter().enumerate() {
        slots.entry(&contact.id).or_default().push_back(idx);
    }

    let mut taken = vec![false; all.len()];
    let mut ordered = Vec::with_capacity(all.len());
    for contact in visible {
        if let Some(idx) = slots.get_mut(&contact.id).and_then(VecDeque::pop_front) {
            taken[idx] = true;
            ordered.push(ListedContact {
                contact: &all[idx],
                in_viewport: true,
            });
        }
    }

    let mut rest: Vec<&Contact> = all
        .iter()
        .zip(&taken)
        .filter(|(_, taken)| !**taken)
        .map(|(contact, _)| contact)
        .collect();

    if ordered.is_empty()
        && let Some(place) = active_place.map(str::trim).filter(|p| !p.is_empty())
    {
        let place = place.to_lowercase();
        rest.sort_by_cached_key(|contact| {
            let city = contact.city.as_deref().map(str::to_lowercase);
            (place_affinity(&place, contact, city.as_deref()), city.is_none(), city)
        });
    }

    ordered.extend(rest.into_iter().map(|contact| ListedContact {
        contact,
        in_viewport: false,
    }));
    ordered
}

/// 0 for an exact city match, 1 for a substring match either way, 2 otherwise.
fn place_affinity(place: &str, contact: &Contact, city: Option<&str>) -> u8 {
    let Some(city) = city else {
        return 2;
    };
    let qualified = contact
        .state
        .as_deref()
        .map(|state| format!("{city}, {}", state.to_lowercase()));
    if city == place || qualified.as_deref() == Some(place) {
        0
    } else if city.contains(place) || place.contains(city) {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_data::{TestDataConfig, sample_contacts};

    fn texas() -> ViewportBounds {
        ViewportBounds::new(Coordinates::new(-99.0, 29.0), Coordinates::new(-95.0, 31.0))
    }

    fn ids(list: &[ListedContact<'_>]) -> Vec<String> {
        list.iter().map(|l| l.contact.id.to_string()).collect()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = ViewportBounds::new(Coordinates::new(-1.0, -1.0), Coordinates::new(1.0, 1.0));
        assert!(bounds.contains(Coordinates::new(1.0, 1.0)));
        assert!(bounds.contains(Coordinates::new(-1.0, 0.0)));
        assert!(!bounds.contains(Coordinates::new(1.0001, 0.0)));
    }

    #[test]
    fn test_bounds_across_antimeridian() {
        let bounds = ViewportBounds::new(Coordinates::new(170.0, -10.0), Coordinates::new(-170.0, 10.0));
        assert!(bounds.contains(Coordinates::new(179.0, 0.0)));
        assert!(bounds.contains(Coordinates::new(-175.0, 0.0)));
        assert!(!bounds.contains(Coordinates::new(0.0, 0.0)));
    }

    #[test]
    fn test_visible_contacts_follow_bounds() {
        let mut reconciler = ViewportReconciler::new();
        assert!(!reconciler.set_contacts(sample_contacts(&TestDataConfig::sample())));
        assert!(reconciler.visible_contacts().is_empty());

        assert!(reconciler.on_bounds_changed(texas()));
        let cities: Vec<_> = reconciler
            .visible_contacts()
            .iter()
            .filter_map(|c| c.city.as_deref())
            .collect();
        assert_eq!(cities, ["Austin", "Round Rock", "San Antonio", "Houston"]);

        assert!(!reconciler.on_bounds_changed(texas()), "same set, no change");
    }

    #[test]
    fn test_ungeocoded_contacts_are_never_visible() {
        let mut reconciler = ViewportReconciler::new();
        reconciler.set_contacts(vec![Contact::new("x").with_city("Austin", "TX")]);
        reconciler.on_bounds_changed(texas());
        assert!(reconciler.visible_contacts().is_empty());
    }

    #[test]
    fn test_visible_first_in_visible_order() {
        let all = sample_contacts(&TestDataConfig::minimal());
        let visible = vec![all[2].clone(), all[0].clone()];
        let list = ordered_contact_list(&all, &visible, None);
        assert_eq!(ids(&list), ["c-3", "c-1", "c-2"]);
        assert!(list[0].in_viewport && list[1].in_viewport && !list[2].in_viewport);
    }

    #[test]
    fn test_fallback_when_nothing_visible() {
        let all = vec![
            Contact::new("1").with_city("Dallas", "TX"),
            Contact::new("2").with_city("South Austin", "TX"),
            Contact::new("3"),
            Contact::new("4").with_city("Austin", "TX"),
            Contact::new("5").with_city("Boulder", "CO"),
        ];
        let list = ordered_contact_list(&all, &[], Some("Austin"));
        assert_eq!(ids(&list), ["4", "2", "5", "1", "3"]);

        // Without an active place the original order is kept.
        let list = ordered_contact_list(&all, &[], None);
        assert_eq!(ids(&list), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_ordering_is_lossless() {
        let mut all = sample_contacts(&TestDataConfig::sample());
        all.push(all[0].clone());
        let stranger = Contact::new("not-in-all");

        for visible in [
            vec![],
            vec![all[3].clone()],
            vec![all[0].clone(), all[0].clone(), all[0].clone(), stranger],
        ] {
            for place in [None, Some("Austin"), Some("nowhere")] {
                let list = ordered_contact_list(&all, &visible, place);
                let mut got = ids(&list);
                let mut want: Vec<_> = all.iter().map(|c| c.id.to_string()).collect();
                got.sort();
                want.sort();
                assert_eq!(got, want);
            }
        }
    }
}
