//! Błędy warstwy aplikacji (dane, konfiguracja, pobieranie).
//!
//! Rdzeń liczeniowy (`color`, `legend`, `movement`) nie zwraca błędów.

/// Wynik operacji aplikacji
pub type AtlasResult<T> = Result<T, AtlasError>;

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date error: {0}")]
    Date(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

impl From<toml::de::Error> for AtlasError {
    fn from(e: toml::de::Error) -> Self {
        AtlasError::Config(format!("Failed to parse config file: {}", e))
    }
}

impl From<chrono::ParseError> for AtlasError {
    fn from(e: chrono::ParseError) -> Self {
        AtlasError::Date(e.to_string())
    }
}
