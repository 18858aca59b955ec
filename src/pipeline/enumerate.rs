use indicatif::ProgressBar;
use thiserror::Error;

use super::{ErrorPolicy, Failure};
use crate::api::{ItemError, PlaceSearch, SearchError, SearchQuery, parse_results};
use crate::domain::{Category, CategoryMap, EstablishmentRecord, Location, PlaceResult};

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("search failed for {location} / {category}: {source}")]
    Search {
        location: String,
        category: String,
        #[source]
        source: SearchError,
    },

    #[error("malformed search result for {location} / {category}: {source}")]
    Item {
        location: String,
        category: String,
        #[source]
        source: ItemError,
    },
}

/// Request settings shared by every search in a run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Search radius in meters
    pub radius: u32,
    /// Response fields requested from the API
    pub fields: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnumerationReport {
    /// Records in (location, category, result) order
    pub records: Vec<EstablishmentRecord>,
    /// Searches or items skipped under [`ErrorPolicy::Skip`]
    pub failures: Vec<Failure>,
    /// Number of search calls issued
    pub calls: usize,
}

/// Every (location, category) pair, locations outer and categories inner
pub fn search_plan<'a>(
    locations: &'a [Location],
    categories: &'a CategoryMap,
) -> impl Iterator<Item = (&'a Location, &'a Category)> + 'a {
    locations
        .iter()
        .flat_map(move |location| categories.iter().map(move |category| (location, category)))
}

/// Run one search and validate the response
pub fn fetch<S: PlaceSearch + ?Sized>(
    searcher: &S,
    location: &Location,
    category: &Category,
    settings: &SearchSettings,
) -> Result<Vec<Result<PlaceResult, ItemError>>, SearchError> {
    let query = SearchQuery {
        latitude: location.latitude,
        longitude: location.longitude,
        category_id: category.id.clone(),
        radius: settings.radius,
        fields: settings.fields.clone(),
    };

    let body = searcher.search(&query)?;
    parse_results(&body)
}

/// One record per place, in the order given
pub fn flatten<'a, I>(
    location: &'a Location,
    category: &'a Category,
    places: I,
) -> impl Iterator<Item = EstablishmentRecord> + 'a
where
    I: IntoIterator<Item = PlaceResult>,
    I::IntoIter: 'a,
{
    places
        .into_iter()
        .map(move |place| EstablishmentRecord::new(location, category, place))
}

/// Search every category around every location and collect the results.
///
/// Issues exactly `locations.len() * categories.len()` searches. Under
/// [`ErrorPolicy::FailFast`] the first failed search or malformed item
/// aborts the run and no records are returned.
pub fn enumerate<S: PlaceSearch + ?Sized>(
    searcher: &S,
    locations: &[Location],
    categories: &CategoryMap,
    settings: &SearchSettings,
    policy: ErrorPolicy,
    progress: &ProgressBar,
) -> Result<EnumerationReport, EnumerateError> {
    let mut report = EnumerationReport::default();

    for (location, category) in search_plan(locations, categories) {
        progress.set_message(format!("{} / {}", location.name, category.name));
        report.calls += 1;

        let items = match fetch(searcher, location, category, settings) {
            Ok(items) => items,
            Err(source) => match policy {
                ErrorPolicy::FailFast => {
                    return Err(EnumerateError::Search {
                        location: location.name.clone(),
                        category: category.name.clone(),
                        source,
                    });
                }
                ErrorPolicy::Skip => {
                    tracing::warn!(
                        location = %location.name,
                        category = %category.name,
                        error = %source,
                        "search failed, skipping"
                    );
                    report
                        .failures
                        .push(Failure::new(subject(location, category), &source));
                    progress.inc(1);
                    continue;
                }
            },
        };

        let mut places = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Ok(place) => places.push(place),
                Err(source) if policy == ErrorPolicy::FailFast => {
                    return Err(EnumerateError::Item {
                        location: location.name.clone(),
                        category: category.name.clone(),
                        source,
                    });
                }
                Err(source) => {
                    tracing::warn!(
                        location = %location.name,
                        category = %category.name,
                        error = %source,
                        "malformed result, skipping"
                    );
                    report
                        .failures
                        .push(Failure::new(subject(location, category), &source));
                }
            }
        }

        tracing::debug!(
            location = %location.name,
            category = %category.name,
            results = places.len(),
            "search complete"
        );
        report.records.extend(flatten(location, category, places));
        progress.inc(1);
    }

    Ok(report)
}

fn subject(location: &Location, category: &Category) -> String {
    format!("{} / {}", location.name, category.name)
}
