//! Konfiguracja aplikacji z pliku TOML.
//!
//! Brakujący plik oznacza ustawienia domyślne; brakujące pola też
//! przyjmują wartości domyślne.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AtlasError, AtlasResult};
use crate::movement::{DEFAULT_THRESHOLD_METERS, GeoCoordinate};

pub const DEFAULT_CONFIG_FILE: &str = "sales_atlas.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtlasConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub refetch: RefetchSettings,
    #[serde(default)]
    pub legend: LegendSettings,
    #[serde(default)]
    pub heatmap: HeatmapSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_records")]
    pub records: PathBuf,
    #[serde(default = "default_basemap")]
    pub basemap: Option<PathBuf>,
    #[serde(default = "default_demo_records")]
    pub demo_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_long")]
    pub center_long: f64,
    #[serde(default = "default_span_degrees")]
    pub span_degrees: f64,
    #[serde(default = "default_pan_step")]
    pub pan_step_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefetchSettings {
    #[serde(default = "default_threshold")]
    pub threshold_meters: f64,
    #[serde(default = "default_closest_limit")]
    pub closest_limit: usize,
    #[serde(default = "default_nearby_radius")]
    pub nearby_radius_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSettings {
    #[serde(default = "default_segments")]
    pub segments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapSettings {
    #[serde(default = "default_cell_degrees")]
    pub cell_degrees: f64,
    #[serde(default = "default_opacity")]
    pub opacity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_records() -> PathBuf {
    PathBuf::from("data/records.json")
}

fn default_basemap() -> Option<PathBuf> {
    Some(PathBuf::from("data/basemap.geojson"))
}

fn default_demo_records() -> usize {
    400
}

fn default_center_lat() -> f64 {
    41.583495
}

fn default_center_long() -> f64 {
    -71.989491
}

fn default_span_degrees() -> f64 {
    8.0
}

fn default_pan_step() -> f64 {
    1.0
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_METERS
}

fn default_closest_limit() -> usize {
    25
}

fn default_nearby_radius() -> f64 {
    600_000.0
}

fn default_segments() -> usize {
    6
}

fn default_cell_degrees() -> f64 {
    0.5
}

fn default_opacity() -> u8 {
    200
}

fn default_log_file() -> PathBuf {
    PathBuf::from("sales_atlas.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { records: default_records(), basemap: default_basemap(), demo_records: default_demo_records() }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_long: default_center_long(),
            span_degrees: default_span_degrees(),
            pan_step_degrees: default_pan_step(),
        }
    }
}

impl Default for RefetchSettings {
    fn default() -> Self {
        Self {
            threshold_meters: default_threshold(),
            closest_limit: default_closest_limit(),
            nearby_radius_meters: default_nearby_radius(),
        }
    }
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self { segments: default_segments() }
    }
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self { cell_degrees: default_cell_degrees(), opacity: default_opacity() }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { file: default_log_file(), level: default_log_level() }
    }
}

impl AtlasConfig {
    pub fn parse(content: &str) -> AtlasResult<Self> {
        let config: AtlasConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AtlasResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| AtlasError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Wczytuje plik, a gdy go nie ma, zwraca ustawienia domyślne.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> AtlasResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> AtlasResult<()> {
        if self.legend.segments < 2 {
            return Err(AtlasError::Config("legend.segments must be at least 2".into()));
        }
        if !(self.refetch.threshold_meters > 0.0) {
            return Err(AtlasError::Config("refetch.threshold_meters must be positive".into()));
        }
        if !(self.map.span_degrees > 0.0) {
            return Err(AtlasError::Config("map.span_degrees must be positive".into()));
        }
        if !(self.heatmap.cell_degrees > 0.0) {
            return Err(AtlasError::Config("heatmap.cell_degrees must be positive".into()));
        }
        Ok(())
    }

    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.map.center_lat, self.map.center_long)
    }
}
