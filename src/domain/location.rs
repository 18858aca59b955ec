use serde::Serialize;

/// A municipality with resolved WGS84 coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Center point as a (lat, lon) pair
    pub fn center(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Ordered name -> (lat, lon) table produced by the geocoder.
///
/// One entry per distinct name. Inserting a name that is already present
/// replaces its coordinates but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodedTable {
    entries: Vec<Location>,
}

impl GeocodedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite coordinates for `name`.
    ///
    /// # Returns
    /// * `Some((lat, lon))` - The coordinates that were overwritten
    /// * `None` - The name was not present before
    pub fn insert(&mut self, name: &str, coords: (f64, f64)) -> Option<(f64, f64)> {
        let (latitude, longitude) = coords;
        if let Some(existing) = self.entries.iter_mut().find(|l| l.name == name) {
            let previous = existing.center();
            existing.latitude = latitude;
            existing.longitude = longitude;
            return Some(previous);
        }
        self.entries.push(Location::new(name, latitude, longitude));
        None
    }

    /// Coordinates recorded for `name`, if it was resolved
    pub fn get(&self, name: &str) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .find(|l| l.name == name)
            .map(Location::center)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn locations(&self) -> &[Location] {
        &self.entries
    }

    pub fn into_locations(self) -> Vec<Location> {
        self.entries
    }
}
