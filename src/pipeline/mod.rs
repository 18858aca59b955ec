//! Geocode -> search -> flatten stages
//!
//! Each stage is usable on its own: `geocode` turns names into locations,
//! `enumerate` plans one search per (location, category) pair, fetches it and
//! flattens the validated results into output records.

pub mod enumerate;
pub mod geocode;

pub use enumerate::{
    EnumerateError, EnumerationReport, SearchSettings, enumerate, fetch, flatten, search_plan,
};
pub use geocode::{GeocodeReport, geocode_names};

use serde::Deserialize;

/// What to do when a single lookup or search fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failure
    FailFast,
    /// Record the failure and continue with the next item
    #[default]
    Skip,
}

/// A failure recorded under [`ErrorPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What was being processed, e.g. a place name or "location / category"
    pub subject: String,
    pub message: String,
}

impl Failure {
    pub fn new(subject: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            subject: subject.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
