use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::nominatim::{DEFAULT_USER_AGENT, NOMINATIM_URL};
use crate::api::places::FOURSQUARE_URL;
use crate::domain::{Category, CategoryMap};
use crate::pipeline::{ErrorPolicy, SearchSettings};
use crate::table::OutputFormat;

fn default_radius() -> u32 {
    500
}
fn default_fields() -> Vec<String> {
    vec![
        "name".to_string(),
        "distance".to_string(),
        "location".to_string(),
    ]
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Search radius in meters
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Categories in search order
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub places: PlacesConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            fields: default_fields(),
            error_policy: ErrorPolicy::default(),
            output_format: OutputFormat::default(),
            categories: Vec::new(),
            geocoder: GeocoderConfig::default(),
            places: PlacesConfig::default(),
        }
    }
}

fn default_nominatim_url() -> String {
    NOMINATIM_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
// Nominatim usage policy allows at most one request per second
fn default_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_nominatim_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Pause after every geocoding request
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_places_url() -> String {
    FOURSQUARE_URL.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlacesConfig {
    #[serde(default = "default_places_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Environment variable naming a config file to use before the search paths
pub const CONFIG_ENV: &str = "MUNIPLACES_CONFIG";

/// Search options taken from the command line. Unset values fall back to the
/// config file.
#[derive(Debug, Clone, Default)]
pub struct SearchOverrides {
    pub radius: Option<u32>,
    pub categories: Vec<Category>,
    pub fields: Vec<String>,
    pub format: Option<OutputFormat>,
    pub api_key: Option<String>,
}

/// Everything a search run needs once flags and file are merged
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSearch {
    pub categories: CategoryMap,
    pub settings: SearchSettings,
    pub format: OutputFormat,
    pub api_key: String,
}

impl FileConfig {
    /// Load the first config file found by [`config_search_paths`]
    pub fn load() -> Option<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let candidates = config_search_paths(explicit, dirs::config_dir(), dirs::home_dir());

        let path = candidates.into_iter().find(|p| p.is_file())?;
        match Self::from_path(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "ignoring config file");
                None
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn category_map(&self) -> CategoryMap {
        self.categories.iter().cloned().collect()
    }

    /// Merge command-line overrides over this file's values.
    ///
    /// Categories and fields given on the command line replace the file's
    /// lists as a whole. Fails when no API key or no category is available.
    pub fn resolve_search(&self, overrides: &SearchOverrides) -> Result<ResolvedSearch> {
        let categories: CategoryMap = if overrides.categories.is_empty() {
            self.category_map()
        } else {
            overrides.categories.iter().cloned().collect()
        };
        if categories.is_empty() {
            bail!("No categories given. Use --category ID=NAME or [[categories]] in the config file");
        }

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| self.places.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .context("No API key. Use --api-key, FOURSQUARE_API_KEY or [places].api_key")?;

        let fields = if overrides.fields.is_empty() {
            self.fields.clone()
        } else {
            overrides.fields.clone()
        };

        Ok(ResolvedSearch {
            categories,
            settings: SearchSettings {
                radius: overrides.radius.unwrap_or(self.radius),
                fields,
            },
            format: overrides.format.unwrap_or(self.output_format),
            api_key,
        })
    }

    /// Geocoder settings with optional command-line overrides applied
    pub fn resolve_geocoder(&self, user_agent: Option<&str>, delay_ms: Option<u64>) -> GeocoderConfig {
        let mut config = self.geocoder.clone();
        if let Some(user_agent) = user_agent {
            config.user_agent = user_agent.to_string();
        }
        if let Some(delay_ms) = delay_ms {
            config.delay_ms = delay_ms;
        }
        config
    }
}

/// Config file candidates, first match wins:
/// `$MUNIPLACES_CONFIG`, `./muniplaces.toml`, `<config dir>/muniplaces/config.toml`,
/// `~/.muniplaces.toml`.
pub fn config_search_paths(
    explicit: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    explicit
        .into_iter()
        .chain(std::iter::once(PathBuf::from("muniplaces.toml")))
        .chain(config_dir.map(|d| d.join("muniplaces").join("config.toml")))
        .chain(home.map(|h| h.join(".muniplaces.toml")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert_eq!(config.radius, 500);
        assert_eq!(config.fields, default_fields());
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert!(config.categories.is_empty());
        assert_eq!(config.geocoder.delay_ms, 1000);
        assert_eq!(config.places.base_url, FOURSQUARE_URL);
        assert!(config.places.api_key.is_none());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
radius = 1000
fields = ["name", "distance"]
error_policy = "fail-fast"
output_format = "jsonl"

[[categories]]
id = "13065"
name = "Restaurantes"

[[categories]]
id = "17069"
name = "Supermercados"

[geocoder]
user_agent = "my_app"
delay_ms = 1500

[places]
api_key = "fsq-key"
"#;
        let config: FileConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.radius, 1000);
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
        assert_eq!(config.output_format, OutputFormat::Jsonl);
        assert_eq!(config.geocoder.user_agent, "my_app");
        assert_eq!(config.geocoder.delay_ms, 1500);
        assert_eq!(config.geocoder.base_url, NOMINATIM_URL);
        assert_eq!(config.places.api_key.as_deref(), Some("fsq-key"));

        let categories = config.category_map();
        let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["13065", "17069"]);
    }

    fn file_with_categories() -> FileConfig {
        toml::from_str(
            r#"
radius = 1000
fields = ["name", "distance", "location"]
output_format = "json"

[[categories]]
id = "13065"
name = "Restaurantes"

[places]
api_key = "file-key"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_search_uses_file_values() {
        let resolved = file_with_categories()
            .resolve_search(&SearchOverrides::default())
            .unwrap();

        assert_eq!(resolved.api_key, "file-key");
        assert_eq!(resolved.settings.radius, 1000);
        assert_eq!(resolved.settings.fields, default_fields());
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.categories.name_of("13065"), Some("Restaurantes"));
    }

    #[test]
    fn test_resolve_search_flags_override_file() {
        let overrides = SearchOverrides {
            radius: Some(250),
            categories: vec![Category::new("17069", "Supermercados")],
            fields: vec!["name".to_string()],
            format: Some(OutputFormat::Jsonl),
            api_key: Some("flag-key".to_string()),
        };
        let resolved = file_with_categories().resolve_search(&overrides).unwrap();

        assert_eq!(resolved.api_key, "flag-key");
        assert_eq!(resolved.settings.radius, 250);
        assert_eq!(resolved.settings.fields, vec!["name".to_string()]);
        assert_eq!(resolved.format, OutputFormat::Jsonl);
        assert_eq!(resolved.categories.len(), 1);
        assert_eq!(resolved.categories.name_of("13065"), None);
    }

    #[test]
    fn test_resolve_search_defaults_without_file() {
        let overrides = SearchOverrides {
            categories: vec![Category::new("c1", "Bares")],
            api_key: Some("k".to_string()),
            ..SearchOverrides::default()
        };
        let resolved = FileConfig::default().resolve_search(&overrides).unwrap();

        assert_eq!(resolved.settings.radius, 500);
        assert_eq!(resolved.format, OutputFormat::Csv);
    }

    #[test]
    fn test_resolve_search_missing_api_key() {
        let mut config = file_with_categories();
        config.places.api_key = None;

        let err = config
            .resolve_search(&SearchOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("No API key"));

        let blank = SearchOverrides {
            api_key: Some("  ".to_string()),
            ..SearchOverrides::default()
        };
        assert!(config.resolve_search(&blank).is_err());
    }

    #[test]
    fn test_resolve_search_no_categories() {
        let overrides = SearchOverrides {
            api_key: Some("k".to_string()),
            ..SearchOverrides::default()
        };
        let err = FileConfig::default()
            .resolve_search(&overrides)
            .unwrap_err();
        assert!(err.to_string().contains("No categories"));
    }

    #[test]
    fn test_resolve_geocoder() {
        let config = FileConfig::default();

        let unchanged = config.resolve_geocoder(None, None);
        assert_eq!(unchanged.delay_ms, 1000);
        assert_eq!(unchanged.user_agent, DEFAULT_USER_AGENT);

        let overridden = config.resolve_geocoder(Some("my_app"), Some(0));
        assert_eq!(overridden.user_agent, "my_app");
        assert_eq!(overridden.delay_ms, 0);
        assert_eq!(overridden.base_url, NOMINATIM_URL);
    }

    #[test]
    fn test_config_search_paths_order() {
        let paths = config_search_paths(
            Some(PathBuf::from("/etc/muniplaces.toml")),
            Some(PathBuf::from("/home/ana/.config")),
            Some(PathBuf::from("/home/ana")),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/etc/muniplaces.toml"),
                PathBuf::from("muniplaces.toml"),
                PathBuf::from("/home/ana/.config/muniplaces/config.toml"),
                PathBuf::from("/home/ana/.muniplaces.toml"),
            ]
        );

        assert_eq!(
            config_search_paths(None, None, None),
            vec![PathBuf::from("muniplaces.toml")]
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "radius = 250").unwrap();

        let config = FileConfig::from_path(file.path()).unwrap();
        assert_eq!(config.radius, 250);

        assert!(FileConfig::from_path(Path::new("/nonexistent/muniplaces.toml")).is_err());
    }
}
