//! Contact CSV import.
//!
//! Exports from spreadsheets and other CRMs disagree on header spelling, so headers
//! are normalized (case, spaces, punctuation) and matched against a small alias
//! table. Every row becomes a [`Contact`]; rows with problems are kept and
//! reported as [`ImportWarning`]s rather than dropped.

use std::fmt;
use std::path::Path;

use itertools::Itertools;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::contact::{Contact, ContactId, ContactIssue, Coordinates, PLACEHOLDER_NAME, non_empty};
use crate::{DataError, Result};

static HEADER_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    FullName,
    FirstName,
    LastName,
    Organization,
    Street,
    City,
    State,
    Zip,
    Country,
    Latitude,
    Longitude,
}

impl Field {
    const ALL: [Self; 12] = [
        Self::Id,
        Self::FullName,
        Self::FirstName,
        Self::LastName,
        Self::Organization,
        Self::Street,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Country,
        Self::Latitude,
        Self::Longitude,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["id", "contactid"],
            Self::FullName => &["name", "fullname"],
            Self::FirstName => &["firstname", "first", "givenname"],
            Self::LastName => &["lastname", "last", "surname", "familyname"],
            Self::Organization => &["organization", "organisation", "company", "org"],
            Self::Street => &["street", "address", "streetaddress", "address1"],
            Self::City => &["city", "town"],
            Self::State => &["state", "province", "region"],
            Self::Zip => &["zip", "zipcode", "postalcode", "postcode"],
            Self::Country => &["country"],
            Self::Latitude => &["latitude", "lat"],
            Self::Longitude => &["longitude", "lon", "lng", "long"],
        }
    }
}

fn normalize_header(header: &str) -> String {
    HEADER_NOISE
        .replace_all(&header.to_lowercase(), "")
        .into_owned()
}

/// A non-fatal problem with one imported row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportWarning {
    /// 1-based data row (the header is not counted).
    pub row: usize,
    pub contact_id: ContactId,
    pub issue: ContactIssue,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.row, self.contact_id, self.issue)
    }
}

/// Result of importing a contact export.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub contacts: Vec<Contact>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn geocoded_count(&self) -> usize {
        self.contacts.iter().filter(|c| c.is_geocoded()).count()
    }
}

/// Read a contact CSV export into contacts.
///
/// All cells are read as strings; coordinates are parsed and validated here so
/// that no contact leaves the import boundary with a half-set coordinate pair.
#[instrument(name = "Import contacts", skip_all, fields(path = %path.as_ref().display()), level = "info")]
pub fn import_contacts_csv(path: impl AsRef<Path>) -> Result<ImportReport> {
    let df = LazyCsvReader::new(path.as_ref())
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;
    contacts_from_frame(&df)
}

/// Build contacts from an already-loaded frame of string columns.
pub fn contacts_from_frame(df: &DataFrame) -> Result<ImportReport> {
    let columns = ColumnMap::resolve(df);
    if columns.get(Field::City).is_none() {
        return Err(DataError::MissingColumn("city"));
    }
    debug!(columns = ?columns.found, "Resolved contact columns");

    let height = df.height();
    let values = |field: Field| -> Result<Vec<Option<String>>> {
        match columns.get(field) {
            Some(name) => Ok(df
                .column(name)?
                .str()?
                .into_iter()
                .map(|v| v.and_then(non_empty))
                .collect()),
            None => Ok(vec![None; height]),
        }
    };

    let ids = values(Field::Id)?;
    let full_names = values(Field::FullName)?;
    let first_names = values(Field::FirstName)?;
    let last_names = values(Field::LastName)?;
    let organizations = values(Field::Organization)?;
    let streets = values(Field::Street)?;
    let cities = values(Field::City)?;
    let states = values(Field::State)?;
    let zips = values(Field::Zip)?;
    let countries = values(Field::Country)?;
    let latitudes = values(Field::Latitude)?;
    let longitudes = values(Field::Longitude)?;

    let mut report = ImportReport::default();
    for idx in 0..height {
        let row = idx + 1;
        let id = ids[idx]
            .clone()
            .map_or_else(|| ContactId::new(format!("row-{row}")), ContactId::from);
        let mut warn_row = |issue: ContactIssue| {
            warn!(row, id = %id, %issue, "Contact imported with issue");
            report.warnings.push(ImportWarning {
                row,
                contact_id: id.clone(),
                issue,
            });
        };

        let (mut first_name, mut last_name) = (first_names[idx].clone(), last_names[idx].clone());
        if first_name.is_none()
            && last_name.is_none()
            && let Some(full) = &full_names[idx]
        {
            (first_name, last_name) = split_full_name(full);
        }
        if first_name.is_none() && last_name.is_none() {
            warn_row(ContactIssue::MissingName);
            first_name = Some(PLACEHOLDER_NAME.to_string());
        }

        let location = match parse_coordinates(latitudes[idx].as_deref(), longitudes[idx].as_deref()) {
            Ok(location) => location,
            Err(issue) => {
                warn_row(issue);
                None
            }
        };

        report.contacts.push(Contact {
            id,
            first_name,
            last_name,
            organization: organizations[idx].clone(),
            street: streets[idx].clone(),
            city: cities[idx].clone(),
            state: states[idx].clone(),
            zip: zips[idx].clone(),
            country: countries[idx].clone(),
            location,
        });
    }

    info!(
        contacts = report.contacts.len(),
        geocoded = report.geocoded_count(),
        warnings = report.warnings.len(),
        "Contact import complete"
    );
    Ok(report)
}

/// Which source column backs each field, first alias match wins.
struct ColumnMap {
    found: Vec<(Field, String)>,
}

impl ColumnMap {
    fn resolve(df: &DataFrame) -> Self {
        let headers = df
            .get_column_names()
            .into_iter()
            .map(|name| (normalize_header(name.as_str()), name.to_string()))
            .collect_vec();

        let found = Field::ALL
            .into_iter()
            .filter_map(|field| {
                headers
                    .iter()
                    .find(|(normalized, _)| field.aliases().contains(&normalized.as_str()))
                    .map(|(_, original)| (field, original.clone()))
            })
            .collect();
        Self { found }
    }

    fn get(&self, field: Field) -> Option<&str> {
        self.found
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, name)| name.as_str())
    }
}

fn split_full_name(full: &str) -> (Option<String>, Option<String>) {
    match full.trim().split_once(char::is_whitespace) {
        Some((first, last)) => (non_empty(first), non_empty(last)),
        None => (non_empty(full), None),
    }
}

fn parse_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> std::result::Result<Option<Coordinates>, ContactIssue> {
    let parse = |raw: Option<&str>| -> std::result::Result<Option<f64>, ContactIssue> {
        raw.map(|value| {
            value
                .parse::<f64>()
                .map_err(|_| ContactIssue::UnparseableCoordinate(value.to_string()))
        })
        .transpose()
    };
    Coordinates::from_parts(parse(latitude)?, parse(longitude)?)
}
