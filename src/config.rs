// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored as TOML through `confy`. Every field carries a
//! serde default, so older files keep loading as fields are added.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelter_core::{CameraRegion, Category, CategorySet, CoordinatePolicy, FieldMap, GeoPoint, PanelConfig, ScreenConfig};

const APP_NAME: &str = "shelter-map";

/// Environment variable holding the Seoul open-data API key.
pub const API_KEY_ENV: &str = "SEOUL_API_KEY";

/// Placeholder replaced with the API key in source URLs.
pub const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// Map tiles are 256px wide; the camera spans about this many tiles horizontally.
const VISIBLE_TILES: f64 = 1.5;

/// Where one category's dataset comes from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataSourceConfig {
    pub category: Category,

    /// HTTP endpoint returning JSON records. May contain `{api_key}`.
    #[serde(default)]
    pub url: Option<String>,

    /// CSV file name, relative to the data directory
    #[serde(default)]
    pub csv_file: Option<String>,

    /// Record keys mapped onto name/address/coordinates
    #[serde(default)]
    pub fields: FieldMap,

    /// Shown on start
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl DataSourceConfig {
    fn local(category: Category) -> Self {
        Self {
            category,
            url: None,
            csv_file: Some(format!("{category}.csv")),
            fields: FieldMap::default(),
            enabled: true,
        }
    }

    /// The URL with the API key filled in. `None` when there is no URL, or
    /// the URL needs a key and none is available.
    pub fn resolved_url(&self, api_key: Option<&str>) -> Option<String> {
        let url = self.url.as_deref()?;
        if url.contains(API_KEY_PLACEHOLDER) {
            api_key.map(|key| url.replace(API_KEY_PLACEHOLDER, key))
        } else {
            Some(url.to_string())
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Initial camera latitude
    #[serde(default = "default_latitude")]
    pub initial_latitude: f64,

    /// Initial camera longitude
    #[serde(default = "default_longitude")]
    pub initial_longitude: f64,

    /// Initial map zoom level
    #[serde(default = "default_zoom")]
    pub initial_zoom: f64,

    /// Multiplier applied to the camera span before filtering markers
    #[serde(default = "default_padding_factor")]
    pub padding_factor: f64,

    /// List rows added per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Scroll progress that triggers the next page (0.0 - 1.0)
    #[serde(default = "default_trigger_ratio")]
    pub list_trigger_ratio: f64,

    /// Simulated page-load latency in milliseconds
    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,

    /// Screen height in points shared by map and list
    #[serde(default = "default_screen_height")]
    pub screen_height: f64,

    /// Map height with the panel collapsed
    #[serde(default = "default_min_map_height")]
    pub min_map_height: f64,

    /// Map height with the panel expanded
    #[serde(default = "default_max_map_height")]
    pub max_map_height: f64,

    /// Seconds a tapped marker's info stays visible
    #[serde(default = "default_info_seconds")]
    pub info_seconds: u64,

    /// What to do with records whose coordinates don't parse
    #[serde(default)]
    pub coordinate_policy: CoordinatePolicy,

    /// Drop later records sharing an id with an earlier one
    #[serde(default = "default_true")]
    pub dedup_by_id: bool,

    /// Directory holding CSV datasets (defaults to the platform data dir)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Per-category data sources
    #[serde(default = "default_sources")]
    pub sources: Vec<DataSourceConfig>,

    /// Averaged air-quality service
    #[serde(default = "default_air_quality_url")]
    pub air_quality_url: String,

    /// Mosquito index service; `{date}` is replaced with yesterday's date
    #[serde(default = "default_mosquito_url")]
    pub mosquito_url: String,

    /// Seoul open-data API key (optional, env var takes precedence)
    #[serde(default)]
    pub seoul_api_key: Option<String>,

    /// Override user latitude (for devices without location)
    #[serde(default)]
    pub override_user_latitude: Option<f64>,

    /// Override user longitude (for devices without location)
    #[serde(default)]
    pub override_user_longitude: Option<f64>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_latitude() -> f64 {
    37.571_203
}

fn default_longitude() -> f64 {
    126.978_974
}

fn default_zoom() -> f64 {
    15.0
}

fn default_padding_factor() -> f64 {
    shelter_core::viewport::DEFAULT_PADDING_FACTOR
}

fn default_page_size() -> usize {
    shelter_core::pagination::DEFAULT_PAGE_SIZE
}

fn default_trigger_ratio() -> f64 {
    shelter_core::pagination::DEFAULT_TRIGGER_RATIO
}

fn default_load_latency_ms() -> u64 {
    1000
}

fn default_screen_height() -> f64 {
    800.0
}

fn default_min_map_height() -> f64 {
    320.0
}

fn default_max_map_height() -> f64 {
    640.0
}

fn default_info_seconds() -> u64 {
    5
}

fn default_sources() -> Vec<DataSourceConfig> {
    Category::ALL.into_iter().map(DataSourceConfig::local).collect()
}

fn default_air_quality_url() -> String {
    "http://openAPI.seoul.go.kr:8088/{api_key}/json/ListAvgOfSeoulAirQualityService/1/1/".to_string()
}

fn default_mosquito_url() -> String {
    "http://openapi.seoul.go.kr:8088/{api_key}/json/MosquitoStatus/1/5/{date}".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            initial_latitude: default_latitude(),
            initial_longitude: default_longitude(),
            initial_zoom: default_zoom(),
            padding_factor: default_padding_factor(),
            page_size: default_page_size(),
            list_trigger_ratio: default_trigger_ratio(),
            load_latency_ms: default_load_latency_ms(),
            screen_height: default_screen_height(),
            min_map_height: default_min_map_height(),
            max_map_height: default_max_map_height(),
            info_seconds: default_info_seconds(),
            coordinate_policy: CoordinatePolicy::default(),
            dedup_by_id: true,
            data_dir: None,
            sources: default_sources(),
            air_quality_url: default_air_quality_url(),
            mosquito_url: default_mosquito_url(),
            seoul_api_key: None,
            override_user_latitude: None,
            override_user_longitude: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// API key from the environment, falling back to the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.seoul_api_key.as_deref())
    }

    /// Directory CSV datasets are read from.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
        })
    }

    /// Camera region for the configured start position and zoom.
    pub fn initial_camera(&self) -> CameraRegion {
        region_for_zoom(self.initial_latitude, self.initial_longitude, self.initial_zoom)
    }

    /// User location override, when both coordinates are set.
    pub fn user_location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.override_user_latitude?, self.override_user_longitude?))
    }

    pub fn page_load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }

    pub fn info_duration(&self) -> Duration {
        Duration::from_secs(self.info_seconds)
    }

    /// Screen configuration for the orchestrator.
    pub fn screen_config(&self) -> ScreenConfig {
        let enabled: CategorySet = self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.category)
            .collect();

        ScreenConfig {
            screen_height: self.screen_height,
            panel: PanelConfig::new(self.min_map_height, self.max_map_height),
            padding_factor: self.padding_factor,
            page_size: self.page_size,
            trigger_ratio: self.list_trigger_ratio,
            enabled,
            dedup_by_id: self.dedup_by_id,
        }
    }
}

fn pick_api_key(env_key: Option<String>, config_key: Option<&str>) -> Option<String> {
    // Check environment variable first
    if let Some(key) = env_key.filter(|k| !k.is_empty()) {
        return Some(key);
    }

    // Fall back to config
    config_key.map(ToString::to_string).filter(|s| !s.is_empty())
}

/// Web-mercator span for a zoom level, centered on the given point.
fn region_for_zoom(latitude: f64, longitude: f64, zoom: f64) -> CameraRegion {
    let longitude_delta = 360.0 / 2f64.powf(zoom) * VISIBLE_TILES;
    let latitude_delta = longitude_delta * latitude.to_radians().cos();
    CameraRegion::new(latitude, longitude, latitude_delta, longitude_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_category() {
        let config = AppConfig::default();
        assert_eq!(config.sources.len(), Category::COUNT);
        assert_eq!(config.sources[0].csv_file.as_deref(), Some("cold.csv"));
        assert_eq!(config.screen_config().enabled, CategorySet::all());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "page_size": 25 }"#).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.info_seconds, 5);
        assert!((config.initial_latitude - 37.571_203).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_source_starts_hidden() {
        let mut config = AppConfig::default();
        config.sources[1].enabled = false;
        let enabled = config.screen_config().enabled;
        assert!(!enabled.contains(Category::Hot));
        assert!(enabled.contains(Category::Cold));
    }

    #[test]
    fn test_api_key_precedence() {
        assert_eq!(pick_api_key(Some("env".into()), Some("file")).as_deref(), Some("env"));
        assert_eq!(pick_api_key(Some(String::new()), Some("file")).as_deref(), Some("file"));
        assert_eq!(pick_api_key(None, Some("")), None);
        assert_eq!(pick_api_key(None, None), None);
    }

    #[test]
    fn test_resolved_url() {
        let mut source = DataSourceConfig::local(Category::Dust);
        assert_eq!(source.resolved_url(Some("k")), None);

        source.url = Some("http://example.org/{api_key}/json/Dust/1/1000/".to_string());
        assert_eq!(source.resolved_url(None), None);
        assert_eq!(
            source.resolved_url(Some("abc")).as_deref(),
            Some("http://example.org/abc/json/Dust/1/1000/")
        );

        source.url = Some("http://example.org/aed.json".to_string());
        assert_eq!(source.resolved_url(None).as_deref(), Some("http://example.org/aed.json"));
    }

    #[test]
    fn test_initial_camera_from_zoom() {
        let region = AppConfig::default().initial_camera();
        assert!((region.latitude - 37.571_203).abs() < 1e-9);
        assert!(region.longitude_delta > region.latitude_delta);
        assert!(region.longitude_delta > 0.01 && region.longitude_delta < 0.02);
    }
}
