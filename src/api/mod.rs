pub mod nominatim;
pub mod pacing;
pub mod places;

pub use nominatim::{Geocoder, GeocodeError, NominatimGeocoder};
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use places::{FoursquareClient, ItemError, PlaceSearch, SearchError, SearchQuery, parse_results};
