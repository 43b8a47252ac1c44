//! Terminalowy atlas sprzedaży: mapa rekordów, filtry, heatmapa i prognozy.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod date_range;
pub mod error;
pub mod heatmap;
pub mod legend;
pub mod map_draw;
pub mod movement;
pub mod request;
pub mod state;
pub mod ui;

pub use color::{ColorSample, ValueRange, color_for};
pub use legend::{LegendSegment, build_legend};
pub use movement::{GeoCoordinate, MovementDecision, MovementGate, haversine_distance, should_refetch};
