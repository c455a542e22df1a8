//! One evaluation of a query: local fuzzy matches, then optional geocoding and
//! proximity suggestions.

use std::collections::hash_map::Entry;
use std::fmt;

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use itertools::Itertools;
use tracing::{debug, instrument, warn};
use waymark_data::{Contact, Coordinates, is_region, lookup_region};

use crate::config::SessionConfig;
use crate::fuzzy::MatchRank;
use crate::geocode::{GeocodeError, GeocodeResolver, GeocodedLocation, Scope};
use crate::proximity::nearby;

/// A city seen in the contact collection.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownCity {
    pub name: String,
    pub state: Option<String>,
    /// Coordinates of the first geocoded contact in this city.
    pub coordinates: Option<Coordinates>,
}

/// Cities and states derived from the contact collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownPlaces {
    cities: Vec<KnownCity>,
    states: Vec<String>,
}

impl KnownPlaces {
    pub fn from_contacts(contacts: &[Contact]) -> Self {
        let mut cities: Vec<KnownCity> = Vec::new();
        let mut city_slots: HashMap<String, usize> = HashMap::new();
        let mut states = Vec::new();
        let mut seen_states = HashSet::new();

        for contact in contacts {
            if let Some(city) = contact.city.as_deref() {
                match city_slots.entry(city.to_lowercase()) {
                    Entry::Occupied(slot) => {
                        let known = &mut cities[*slot.get()];
                        if known.coordinates.is_none() {
                            known.coordinates = contact.coordinates();
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(cities.len());
                        cities.push(KnownCity {
                            name: city.to_string(),
                            state: contact.state.clone(),
                            coordinates: contact.coordinates(),
                        });
                    }
                }
            }
            if let Some(state) = contact.state.as_deref()
                && seen_states.insert(state.to_lowercase())
            {
                states.push(state.to_string());
            }
        }

        Self { cities, states }
    }

    pub fn cities(&self) -> &[KnownCity] {
        &self.cities
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Whether `query` names a known city ("City" or "City, ST") or state exactly.
    pub fn contains(&self, query: &str) -> bool {
        let query = query.trim();
        let city_match = self.cities.iter().any(|city| {
            city.name.eq_ignore_ascii_case(query)
                || city
                    .state
                    .as_deref()
                    .is_some_and(|state| format!("{}, {state}", city.name).eq_ignore_ascii_case(query))
        });
        if city_match {
            return true;
        }
        let region = lookup_region(query);
        self.states.iter().any(|state| {
            state.eq_ignore_ascii_case(query)
                || region.is_some_and(|r| {
                    r.abbreviation.eq_ignore_ascii_case(state) || r.name.eq_ignore_ascii_case(state)
                })
        })
    }

    fn geocoded_cities(&self) -> Vec<GeocodedLocation> {
        self.cities
            .iter()
            .filter_map(|city| {
                city.coordinates.map(|coordinates| GeocodedLocation {
                    name: city.name.clone(),
                    coordinates,
                    resolved_in: Scope::Local,
                })
            })
            .collect()
    }
}

/// Why a place appears in the result.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceKind {
    /// Fuzzy match against a known city or state.
    Match,
    /// Resolved by the geocoder; not present in contact data.
    Resolved,
    /// Known city within the proximity radius of the resolved anchor.
    Near { anchor: String, miles: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceHit {
    pub name: String,
    pub kind: PlaceKind,
}

impl PlaceHit {
    fn matched(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PlaceKind::Match,
        }
    }
}

impl fmt::Display for PlaceHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PlaceKind::Near { anchor, .. } => write!(f, "{} (near {anchor})", self.name),
            PlaceKind::Match | PlaceKind::Resolved => f.write_str(&self.name),
        }
    }
}

/// Sectioned results for one query, recomputed wholesale each evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub contacts: Vec<Contact>,
    pub cities: Vec<PlaceHit>,
    pub states: Vec<PlaceHit>,
    /// Resolved place used for "near X" suggestions.
    pub anchor: Option<GeocodedLocation>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.contacts.len() + self.cities.len() + self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluate `query` against contacts and known places, consulting the geocoder
/// when local matches are thin.
///
/// Never fails: a geocoding error leaves only the local matches.
#[instrument(name = "Evaluate query", skip_all, fields(query = %query), level = "debug")]
pub async fn evaluate(
    query: &str,
    contacts: &[Contact],
    known: &KnownPlaces,
    resolver: &GeocodeResolver,
    config: &SessionConfig,
) -> SearchResult {
    let query = query.trim();
    if query.is_empty() {
        return SearchResult::default();
    }

    let mut result = local_matches(query, contacts, known, config);
    if !should_geocode(query, &result, known, config) {
        return result;
    }

    match resolver.resolve(query, Scope::RegionRestricted).await {
        Ok(anchor) => {
            add_resolved(&mut result, anchor, known, config);
        }
        Err(e @ GeocodeError::NotFound { .. }) => debug!(error = %e, "No external match"),
        Err(e) => warn!(error = %e, "Geocoding failed, showing local matches only"),
    }
    result
}

fn local_matches(
    query: &str,
    contacts: &[Contact],
    known: &KnownPlaces,
    config: &SessionConfig,
) -> SearchResult {
    let contacts = contacts
        .iter()
        .filter_map(|c| MatchRank::best(c.searchable_fields(), query).map(|rank| (rank, c)))
        .sorted_by(|(a, _), (b, _)| a.cmp_best_first(b))
        .take(config.caps.contacts)
        .map(|(_, c)| c.clone())
        .collect();

    let cities = ranked_names(known.cities.iter().map(|c| c.name.as_str()), query)
        .take(config.caps.cities)
        .map(PlaceHit::matched)
        .collect();

    let states = ranked_names(known.states.iter().map(String::as_str), query)
        .take(config.caps.states)
        .map(PlaceHit::matched)
        .collect();

    SearchResult {
        contacts,
        cities,
        states,
        anchor: None,
    }
}

fn ranked_names<'a>(
    names: impl Iterator<Item = &'a str>,
    query: &str,
) -> impl Iterator<Item = &'a str> {
    names
        .filter_map(|name| MatchRank::of(name, query).map(|rank| (rank, name)))
        .sorted_by(|(a, _), (b, _)| a.cmp_best_first(b))
        .map(|(_, name)| name)
}

/// Letters, spaces and the punctuation place names use ("St. John's", "Winston-Salem").
fn looks_like_place(query: &str) -> bool {
    query.chars().any(char::is_alphabetic)
        && query
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, ',' | '.' | '\'' | '-'))
}

fn should_geocode(
    query: &str,
    local: &SearchResult,
    known: &KnownPlaces,
    config: &SessionConfig,
) -> bool {
    query.chars().count() >= config.min_geocode_query_len
        && looks_like_place(query)
        && !known.contains(query)
        && (local.len() < config.scarce_threshold || local.cities.is_empty())
}

fn add_resolved(
    result: &mut SearchResult,
    anchor: GeocodedLocation,
    known: &KnownPlaces,
    config: &SessionConfig,
) {
    let listed = |hits: &[PlaceHit], name: &str| hits.iter().any(|h| h.name.eq_ignore_ascii_case(name));
    let resolved = PlaceHit {
        name: anchor.name.clone(),
        kind: PlaceKind::Resolved,
    };

    if is_region(&anchor.name) {
        if !listed(&result.states, &anchor.name) {
            push_capped(&mut result.states, resolved, config.caps.states);
        }
    } else if !listed(&result.cities, &anchor.name) {
        push_capped(&mut result.cities, resolved, config.caps.cities);
    }

    let candidates = known.geocoded_cities();
    for place in nearby(&anchor, &candidates, config.proximity_radius_miles) {
        if result.cities.len() >= config.caps.cities {
            break;
        }
        if place.name.eq_ignore_ascii_case(&anchor.name) || listed(&result.cities, &place.name) {
            continue;
        }
        result.cities.push(PlaceHit {
            name: place.name,
            kind: PlaceKind::Near {
                anchor: anchor.name.clone(),
                miles: place.miles,
            },
        });
    }
    debug!(anchor = %anchor.name, cities = result.cities.len(), "Added resolved place");
    result.anchor = Some(anchor);
}

/// Append `hit`, dropping the weakest existing entries to stay within `cap`.
fn push_capped(hits: &mut Vec<PlaceHit>, hit: PlaceHit, cap: usize) {
    if cap == 0 {
        return;
    }
    hits.truncate(cap - 1);
    hits.push(hit);
}
