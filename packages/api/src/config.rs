//! # Neighborhood configuration — `neighborhood.toml`
//!
//! Describes the patch of map the community lives on. Pins may only be placed
//! inside [`MapConfig::bounds`].
//!
//! ## Structure
//!
//! ```toml
//! [map]
//! center = { lat = 12.904751, lng = 80.157509 }
//! initial_zoom = 18
//! min_zoom = 17
//! max_zoom = 22
//!
//! [map.bounds]
//! south_west = { lat = 12.901, lng = 80.154 }
//! north_east = { lat = 12.909, lng = 80.161 }
//! ```
//!
//! Every field has a default, so a missing or empty file is equivalent to the
//! default configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

/// Top-level configuration stored in `neighborhood.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodConfig {
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_center")]
    pub center: GeoPoint,
    #[serde(default)]
    pub bounds: Bounds,
}

/// Axis-aligned lat/lng rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

fn default_center() -> GeoPoint {
    GeoPoint::new(12.904751, 80.157509)
}

fn default_initial_zoom() -> u8 {
    18
}

fn default_min_zoom() -> u8 {
    17
}

fn default_max_zoom() -> u8 {
    22
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            south_west: GeoPoint::new(12.901, 80.154),
            north_east: GeoPoint::new(12.909, 80.161),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_zoom: default_initial_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            center: default_center(),
            bounds: Bounds::default(),
        }
    }
}

impl Bounds {
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }
}

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid neighborhood config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl NeighborhoodConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "neighborhood.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read the file at `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(s) => Ok(Self::from_toml(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no neighborhood config, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = NeighborhoodConfig::from_toml("").unwrap();
        assert_eq!(config, NeighborhoodConfig::default());
        assert_eq!(config.map.initial_zoom, 18);
    }

    #[test]
    fn test_partial_override() {
        let config = NeighborhoodConfig::from_toml(
            r#"
            [map]
            min_zoom = 15

            [map.bounds]
            south_west = { lat = 10.0, lng = 70.0 }
            north_east = { lat = 11.0, lng = 71.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.map.min_zoom, 15);
        assert_eq!(config.map.max_zoom, 22);
        assert!(config.map.bounds.contains(GeoPoint::new(10.5, 70.5)));
        assert!(!config.map.bounds.contains(default_center()));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = NeighborhoodConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(NeighborhoodConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_default_bounds_contain_center() {
        let bounds = Bounds::default();
        assert!(bounds.contains(default_center()));
        assert!(!bounds.contains(GeoPoint::new(12.95, 80.157)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = NeighborhoodConfig::load("/nonexistent/neighborhood.toml").unwrap();
        assert_eq!(config, NeighborhoodConfig::default());
    }
}
