use indicatif::ProgressBar;

use super::{ErrorPolicy, Failure};
use crate::api::{GeocodeError, Geocoder, Pacer};
use crate::domain::GeocodedTable;

/// Outcome of geocoding a batch of names
#[derive(Debug, Default)]
pub struct GeocodeReport {
    pub table: GeocodedTable,
    /// Names the provider could not resolve
    pub misses: Vec<String>,
    /// Names whose lookup failed (only under [`ErrorPolicy::Skip`])
    pub failures: Vec<Failure>,
    /// Names that appeared more than once; the last lookup won
    pub duplicates: Vec<String>,
}

/// Geocode each name in order, pausing after every request.
///
/// A miss never aborts the batch. A request failure aborts it under
/// [`ErrorPolicy::FailFast`] and is recorded under [`ErrorPolicy::Skip`].
pub fn geocode_names<G, P>(
    geocoder: &G,
    names: &[String],
    pacer: &mut P,
    policy: ErrorPolicy,
    progress: &ProgressBar,
) -> Result<GeocodeReport, GeocodeError>
where
    G: Geocoder + ?Sized,
    P: Pacer + ?Sized,
{
    let mut report = GeocodeReport::default();

    for name in names {
        progress.set_message(name.clone());

        match geocoder.geocode(name) {
            Ok(Some(coords)) => {
                if let Some(previous) = report.table.insert(name, coords) {
                    tracing::warn!(
                        name = %name,
                        ?previous,
                        current = ?coords,
                        "duplicate place name, overwriting earlier coordinates"
                    );
                    report.duplicates.push(name.clone());
                }
            }
            Ok(None) => {
                tracing::warn!(name = %name, "no geocoding match");
                report.misses.push(name.clone());
            }
            Err(e) => match policy {
                ErrorPolicy::FailFast => return Err(e),
                ErrorPolicy::Skip => {
                    tracing::warn!(name = %name, error = %e, "geocoding failed, skipping");
                    report.failures.push(Failure::new(name.clone(), &e));
                }
            },
        }

        progress.inc(1);
        pacer.pause();
    }

    Ok(report)
}
