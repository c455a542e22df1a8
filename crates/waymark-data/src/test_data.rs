use std::io::Write;

use tempfile::NamedTempFile;
use tracing::info;

use crate::contact::Contact;
use crate::error::Result;

/// Configuration for sample contact generation
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Number of contacts to emit; cycles through the base table when larger
    pub contacts: usize,
    /// Emit one contact without coordinates for every `ungeocoded_every` rows (0 = never)
    pub ungeocoded_every: usize,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl TestDataConfig {
    /// Minimal data for unit tests
    pub fn minimal() -> Self {
        Self {
            contacts: 3,
            ungeocoded_every: 0,
        }
    }

    /// Sample data for integration tests
    pub fn sample() -> Self {
        Self {
            contacts: BASE_CONTACTS.len(),
            ungeocoded_every: 5,
        }
    }
}

// (first, last, organization, city, state, latitude, longitude)
type BaseRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    f64,
    f64,
);

const BASE_CONTACTS: [BaseRow; 12] = [
    ("Ada", "Lovelace", "Analytical Engines", "Austin", "TX", 30.2672, -97.7431),
    ("Grace", "Hopper", "Cobol Works", "Round Rock", "TX", 30.5083, -97.6789),
    ("Alan", "Turing", "Bletchley Labs", "San Antonio", "TX", 29.4241, -98.4936),
    ("Edsger", "Dijkstra", "Shortest Path Co", "Dallas", "TX", 32.7767, -96.7970),
    ("Barbara", "Liskov", "Substitution Inc", "Denver", "CO", 39.7392, -104.9903),
    ("Donald", "Knuth", "TeX Partners", "Boulder", "CO", 40.0150, -105.2705),
    ("Margaret", "Hamilton", "Apollo Software", "Seattle", "WA", 47.6062, -122.3321),
    ("Ken", "Thompson", "Bell Systems", "Portland", "OR", 45.5152, -122.6784),
    ("Frances", "Allen", "Optimizing Compilers", "Toronto", "ON", 43.6532, -79.3832),
    ("John", "Backus", "Formula Translation", "Oakland", "CA", 37.8044, -122.2712),
    ("Radia", "Perlman", "Spanning Trees", "Tacoma", "WA", 47.2529, -122.4443),
    ("Leslie", "Lamport", "Paxos Group", "Houston", "TX", 29.7604, -95.3698),
];

/// Contacts built directly from the sample table.
pub fn sample_contacts(config: &TestDataConfig) -> Vec<Contact> {
    (0..config.contacts)
        .map(|idx| {
            let (first, last, org, city, state, lat, lon) = BASE_CONTACTS[idx % BASE_CONTACTS.len()];
            let contact = Contact::new(format!("c-{}", idx + 1))
                .with_name(first, last)
                .with_organization(org)
                .with_city(city, state);
            if is_ungeocoded(config, idx) {
                contact
            } else {
                contact.with_location(lon, lat)
            }
        })
        .collect()
}

/// Write the sample table to a temporary CSV file in the export layout the importer expects.
pub fn create_test_contacts_csv(config: &TestDataConfig) -> Result<NamedTempFile> {
    info!("Creating test contacts with config: {:?}", config);
    let mut file = NamedTempFile::with_suffix(".csv")?;

    writeln!(
        file,
        "id,First Name,Last Name,Company,City,State,Country,Latitude,Longitude"
    )?;
    for idx in 0..config.contacts {
        let (first, last, org, city, state, lat, lon) = BASE_CONTACTS[idx % BASE_CONTACTS.len()];
        let country = if state == "ON" { "CA" } else { "US" };
        if is_ungeocoded(config, idx) {
            writeln!(file, "c-{},{first},{last},{org},{city},{state},{country},,", idx + 1)?;
        } else {
            writeln!(
                file,
                "c-{},{first},{last},{org},{city},{state},{country},{lat},{lon}",
                idx + 1
            )?;
        }
    }

    file.flush()?;
    Ok(file)
}

fn is_ungeocoded(config: &TestDataConfig, idx: usize) -> bool {
    config.ungeocoded_every > 0 && (idx + 1) % config.ungeocoded_every == 0
}
