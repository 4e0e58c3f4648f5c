//! Configuration models and loaders for the pass predictor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pass_core::{InvalidInput, ObserverLocation, Roster, SatelliteCatalogEntry, SatelliteId};
use serde::Deserialize;
use thiserror::Error;

/// Top-level application settings, read from a TOML file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding one `<designator>.tle` record per satellite.
    pub tle_dir: PathBuf,
    /// Roster file (`.toml`, `.yaml` or `.yml`).
    pub roster: PathBuf,
    /// Observer zone as `+HH:MM` / `-HH:MM`; the system zone when absent.
    pub utc_offset: Option<String>,
    pub observer: ObserverConfig,
    pub catalog: CatalogConfig,
    pub defaults: RequestDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tle_dir: PathBuf::from("data/tle"),
            roster: PathBuf::from("configs/roster.toml"),
            utc_offset: None,
            observer: ObserverConfig::default(),
            catalog: CatalogConfig::default(),
            defaults: RequestDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Parsed `utc_offset` in seconds east of UTC.
    pub fn utc_offset_seconds(&self) -> Result<Option<i32>, ConfigError> {
        self.utc_offset.as_deref().map(parse_utc_offset).transpose()
    }
}

/// Default ground station.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ObserverConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            latitude: 54.0078,
            longitude: -1.8560,
            altitude_m: 10.0,
        }
    }
}

impl ObserverConfig {
    pub fn location(&self) -> Result<ObserverLocation, ConfigError> {
        Ok(ObserverLocation::new(
            self.latitude,
            self.longitude,
            self.altitude_m,
        )?)
    }
}

/// Remote element-set catalog.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Query parameter that carries the designator.
    pub query_param: String,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://celestrak.org/NORAD/elements/gp.php".to_string(),
            query_param: "INTDES".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Values used when a request leaves a field unset.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RequestDefaults {
    pub horizon_days: u32,
    pub min_elevation_deg: f64,
    pub min_hour: u32,
    pub max_hour: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            min_elevation_deg: 10.0,
            min_hour: 0,
            max_hour: 24,
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported roster format `{0}` (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
    #[error("roster is empty")]
    EmptyRoster,
    #[error(transparent)]
    Invalid(#[from] InvalidInput),
}

/// Load the application config from a TOML file.
pub fn load_app_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let contents = read(path.as_ref())?;
    Ok(toml::from_str(&contents)?)
}

/// Load the designator to display-name roster.
///
/// TOML rosters are a flat table (`"33591" = "NOAA 19"`); YAML rosters a
/// flat mapping.
pub fn load_roster<P: AsRef<Path>>(path: P) -> Result<Roster, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    let raw: BTreeMap<String, String> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)?,
        Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };
    roster_from_map(raw)
}

fn roster_from_map(raw: BTreeMap<String, String>) -> Result<Roster, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::EmptyRoster);
    }
    let entries = raw
        .into_iter()
        .map(|(id, name)| -> Result<SatelliteCatalogEntry, ConfigError> {
            Ok(SatelliteCatalogEntry {
                id: SatelliteId::new(id)?,
                name,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Roster::from_entries(entries))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_utc_offset(raw: &str) -> Result<i32, ConfigError> {
    let invalid = || InvalidInput::new("utc_offset", format!("`{raw}` is not +HH:MM or -HH:MM"));
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid().into()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return Err(invalid().into());
    }
    Ok(sign * (hours * 3_600 + minutes * 60))
}
