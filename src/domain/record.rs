use serde::{Deserialize, Serialize};

use super::{Category, Location};

/// One validated item from a places-search response
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceResult {
    pub name: String,
    /// Distance from the search center in meters, as returned by the API
    pub distance: serde_json::Number,
    pub formatted_address: String,
}

/// Flat output row joining a location, a category and one search result.
///
/// Deserializes from the JSON/JSONL output so written results can be loaded
/// back by downstream tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentRecord {
    #[serde(rename = "Municipio")]
    pub municipio: String,
    #[serde(rename = "Latitud")]
    pub latitud: f64,
    #[serde(rename = "Longitud")]
    pub longitud: f64,
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "Categoria")]
    pub categoria: String,
    #[serde(rename = "Distancia")]
    pub distancia: serde_json::Number,
    #[serde(rename = "Dirección")]
    pub direccion: String,
}

impl EstablishmentRecord {
    pub fn new(location: &Location, category: &Category, place: PlaceResult) -> Self {
        Self {
            municipio: location.name.clone(),
            latitud: location.latitude,
            longitud: location.longitude,
            nombre: place.name,
            categoria: category.name.clone(),
            distancia: place.distance,
            direccion: place.formatted_address,
        }
    }
}

/// Column names of the output table, in order
pub const RECORD_COLUMNS: [&str; 7] = [
    "Municipio",
    "Latitud",
    "Longitud",
    "Nombre",
    "Categoria",
    "Distancia",
    "Dirección",
];
