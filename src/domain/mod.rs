pub mod category;
pub mod location;
pub mod record;

pub use category::{Category, CategoryMap};
pub use location::{GeocodedTable, Location};
pub use record::{EstablishmentRecord, PlaceResult, RECORD_COLUMNS};
