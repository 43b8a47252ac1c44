use geo::{Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;
use ratatui::layout::Rect as TuiRect;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Line, Points, Rectangle};
use ratatui::widgets::{Block, Borders};
use ratatui::{Frame, style::Color};
use std::collections::{BTreeMap, HashSet};
use std::{fs, path::Path, str::FromStr};

use crate::color::{DEFAULT_COLOR, SELECTED_COLOR, SalesPoint, ValueRange};
use crate::data::SalesRecord;
use crate::error::{AtlasError, AtlasResult};
use crate::heatmap::{HeatCell, bin_points, cell_range};
use crate::movement::GeoCoordinate;

/// Liczy pole (w przybliżeniu płaskim) wielokąta wzorem shoelace’a.
fn poly_area(poly: &Polygon<f64>) -> f64 {
    let coords = &poly.exterior().0;
    let mut sum = 0.0;
    for window in coords.windows(2) {
        let a = window[0];
        let b = window[1];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum * 0.5).abs()
}

/// Wycinek świata widoczny na mapie
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: GeoCoordinate,
    /// Wysokość widoku w stopniach szerokości; szerokość jest dwa razy większa
    /// (komórki terminala są wyższe niż szersze).
    pub span_degrees: f64,
}

impl Viewport {
    pub fn new(center: GeoCoordinate, span_degrees: f64) -> Self {
        Self { center, span_degrees }
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [self.center.long - self.span_degrees, self.center.long + self.span_degrees]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        [self.center.lat - self.span_degrees / 2.0, self.center.lat + self.span_degrees / 2.0]
    }

    /// Przesuwa środek; szerokość przycięta do ±85°, długość zawijana.
    pub fn pan(&mut self, d_lat: f64, d_long: f64) {
        self.center.lat = (self.center.lat + d_lat).clamp(-85.0, 85.0);
        let long = self.center.long + d_long;
        self.center.long = (long + 180.0).rem_euclid(360.0) - 180.0;
    }

    pub fn zoom(&mut self, factor: f64) {
        self.span_degrees = (self.span_degrees * factor).clamp(0.25, 120.0);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerMode {
    #[default]
    Scatter,
    Heatmap,
}

/// Warstwa sprzedaży gotowa do narysowania
#[derive(Clone, Debug, Default)]
pub struct SalesLayer {
    pub points: Vec<(GeoCoordinate, Color)>,
    pub cells: Vec<(HeatCell, Color)>,
    /// Zakres, z którego liczono kolory (do legendy)
    pub range: Option<ValueRange>,
}

/// Punkty kolorowane średnią sprzedażą; zaznaczone mają stały kolor.
pub fn scatter_layer(records: &[SalesRecord], selected: &HashSet<u64>) -> SalesLayer {
    let range = ValueRange::of_points(records);
    let points = records
        .iter()
        .map(|r| {
            let sample = if selected.contains(&r.id) {
                SELECTED_COLOR
            } else {
                range.map_or(DEFAULT_COLOR, |rg| rg.color(r.sales(), None))
            };
            (r.coordinate(), sample.to_tui())
        })
        .collect();
    SalesLayer { points, cells: Vec::new(), range }
}

pub fn heatmap_layer<P: SalesPoint>(points: &[P], cell_degrees: f64, opacity: u8) -> SalesLayer {
    let cells = bin_points(points, cell_degrees);
    let range = cell_range(&cells);
    let cells = cells
        .into_iter()
        .map(|c| {
            let sample = range.map_or(DEFAULT_COLOR, |rg| rg.color(c.total, Some(opacity)));
            (c, sample.to_tui())
        })
        .collect();
    SalesLayer { points: Vec::new(), cells, range }
}

/// Granice podkładu i rysowanie mapy
#[derive(Default)]
pub struct MapView {
    items: Vec<(String, MultiPolygon<f64>)>,
}

impl MapView {
    pub fn load<P: AsRef<Path>>(path: P) -> AtlasResult<Self> {
        let txt = fs::read_to_string(path)?;
        Self::new(GeoJson::from_str(&txt)?)
    }

    pub fn new(raw: GeoJson) -> AtlasResult<Self> {
        let mut items = Vec::new();

        if let GeoJson::FeatureCollection(fc) = raw {
            for feature in fc.features {
                let name = feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get("ADMIN").or_else(|| p.get("name")).and_then(|v| v.as_str()))
                    .unwrap_or("")
                    .to_string();

                if let Some(gj) = feature.geometry {
                    let geom: Geometry<f64> = gj.value.try_into()?;
                    let mut mp = match geom {
                        Geometry::Polygon(p) => p.into(),
                        Geometry::MultiPolygon(m) => m,
                        _ => continue,
                    };

                    // Odrzucamy drobne wyspy, jeśli fragmentów jest wiele
                    if mp.0.len() > 1 {
                        let areas: Vec<f64> = mp.0.iter().map(poly_area).collect();
                        let threshold = areas.iter().cloned().fold(0.0, f64::max) * 0.20;
                        let filtered: Vec<Polygon<f64>> = mp
                            .0
                            .into_iter()
                            .zip(areas)
                            .filter(|(_, area)| *area >= threshold)
                            .map(|(poly, _)| poly)
                            .collect();
                        mp = MultiPolygon(filtered);
                    }

                    items.push((name, mp));
                }
            }
        }

        if items.is_empty() {
            return Err(AtlasError::Geometry("basemap has no polygon features".into()));
        }
        Ok(Self { items })
    }

    /// Liczba obiektów podkładu
    pub fn feature_count(&self) -> usize {
        self.items.len()
    }

    /// Rysuje podkład, potem warstwę sprzedaży.
    pub fn render(&self, f: &mut Frame, area: TuiRect, title: &str, viewport: &Viewport, layer: &SalesLayer) {
        // grupujemy punkty po kolorze, żeby rysować je jednym wywołaniem
        let mut by_color: BTreeMap<(u8, u8, u8), Vec<(f64, f64)>> = BTreeMap::new();
        for (c, color) in &layer.points {
            if let Color::Rgb(r, g, b) = color {
                by_color.entry((*r, *g, *b)).or_default().push((c.long, c.lat));
            }
        }

        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds())
            .y_bounds(viewport.y_bounds())
            .paint(|ctx| {
                // 1) Granice podkładu
                for (_, mp) in &self.items {
                    for poly in &mp.0 {
                        let ring = &poly.exterior().0;
                        for window in ring.windows(2) {
                            let (a, b) = (window[0], window[1]);
                            ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color: Color::DarkGray });
                        }
                        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
                            ctx.draw(&Line { x1: last.x, y1: last.y, x2: first.x, y2: first.y, color: Color::DarkGray });
                        }
                    }
                }
                ctx.layer();

                // 2) Komórki heatmapy: wypełnienie siatką punktów i obrys
                for (cell, color) in &layer.cells {
                    let step = cell.size / 6.0;
                    let fill: Vec<(f64, f64)> = (0..6)
                        .flat_map(|i| (0..6).map(move |j| (i, j)))
                        .map(|(i, j)| (cell.long + (i as f64 + 0.5) * step, cell.lat + (j as f64 + 0.5) * step))
                        .collect();
                    ctx.draw(&Points { coords: &fill, color: *color });
                    ctx.draw(&Rectangle { x: cell.long, y: cell.lat, width: cell.size, height: cell.size, color: *color });
                }

                // 3) Punkty sprzedaży
                for ((r, g, b), coords) in &by_color {
                    ctx.draw(&Points { coords, color: Color::Rgb(*r, *g, *b) });
                }
            });
        f.render_widget(canvas, area);
    }
}
