//! Contact data for the Waymark location core.
//!
//! This crate owns everything the core treats as external input: the [`Contact`]
//! record, the static catalog of administrative regions used to classify queries,
//! CSV import of contact exports, and a simple keyed [`ContactStore`].

pub mod contact;
pub mod import;
pub mod regions;
pub mod store;
pub mod test_data;

mod error {
    use polars::prelude::PolarsError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum DataError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Polars error: {0}")]
        Polars(#[from] PolarsError),
        #[error("Required column '{0}' not found in contact export")]
        MissingColumn(&'static str),
        #[error("Contact '{0}' not found")]
        ContactNotFound(String),
    }

    pub type Result<T> = std::result::Result<T, DataError>;
}

pub use contact::{Contact, ContactId, ContactIssue, Coordinates};
pub use error::{DataError, Result};
pub use import::{ImportReport, ImportWarning, import_contacts_csv};
pub use regions::{Region, is_region, lookup_region};
pub use store::{ContactStore, InMemoryContactStore};
pub use test_data::{TestDataConfig, create_test_contacts_csv, sample_contacts};
