//! The contact record and its coordinate pair.

use std::fmt;

/// Placeholder used when an imported row carries neither a first nor a last name.
pub const PLACEHOLDER_NAME: &str = "Unknown Contact";

/// Opaque identity of a contact, owned by the contact store.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A geographic point. Longitude first, matching the map collaborator's `(lon, lat)` order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Validate a raw latitude/longitude pair as it arrives from an external source.
    ///
    /// Both absent is a legitimately ungeocoded contact (`Ok(None)`). Exactly one
    /// present is rejected: a half-set pair is never treated as a location.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ContactIssue> {
        match (latitude, longitude) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ContactIssue::CoordinatesOutOfRange {
                        latitude: lat,
                        longitude: lon,
                    });
                }
                Ok(Some(Self::new(lon, lat)))
            }
            _ => Err(ContactIssue::HalfSetCoordinates),
        }
    }
}

/// Problems found with a contact record at the import boundary.
///
/// None of these are fatal: the record is kept, with placeholders or without
/// coordinates, and the issue is reported as a warning.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactIssue {
    /// Neither first nor last name was present.
    MissingName,
    /// Only one of latitude/longitude was present.
    HalfSetCoordinates,
    CoordinatesOutOfRange { latitude: f64, longitude: f64 },
    /// A coordinate cell could not be parsed as a number.
    UnparseableCoordinate(String),
}

impl fmt::Display for ContactIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing first and last name"),
            Self::HalfSetCoordinates => {
                write!(f, "only one of latitude/longitude is set; treated as ungeocoded")
            }
            Self::CoordinatesOutOfRange {
                latitude,
                longitude,
            } => write!(f, "coordinates out of range: ({latitude}, {longitude})"),
            Self::UnparseableCoordinate(raw) => write!(f, "unparseable coordinate '{raw}'"),
        }
    }
}

/// A contact record as the core sees it: immutable input for one query cycle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub location: Option<Coordinates>,
}

impl Contact {
    pub fn new(id: impl Into<ContactId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first: &str, last: &str) -> Self {
        self.first_name = non_empty(first);
        self.last_name = non_empty(last);
        self
    }

    pub fn with_organization(mut self, organization: &str) -> Self {
        self.organization = non_empty(organization);
        self
    }

    pub fn with_city(mut self, city: &str, state: &str) -> Self {
        self.city = non_empty(city);
        self.state = non_empty(state);
        self
    }

    pub fn with_location(mut self, longitude: f64, latitude: f64) -> Self {
        self.location = Some(Coordinates::new(longitude, latitude));
        self
    }

    /// Display name, "First Last", falling back to whichever half exists.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(only), None) | (None, Some(only)) => only.to_string(),
            (None, None) => PLACEHOLDER_NAME.to_string(),
        }
    }

    /// Coordinates when the contact is geocoded.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn is_geocoded(&self) -> bool {
        self.location.is_some()
    }

    /// The fields fuzzy search runs against, in priority order.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.organization.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

impl From<String> for ContactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
