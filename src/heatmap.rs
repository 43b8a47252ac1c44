//! Intensywność sprzedaży w siatce kwadratowych komórek.

use std::collections::BTreeMap;

use crate::color::{SalesPoint, ValueRange};

/// Komórka siatki: lewy dolny róg (long, lat), bok w stopniach.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatCell {
    pub long: f64,
    pub lat: f64,
    pub size: f64,
    pub total: f64,
    pub count: usize,
}

/// Sumuje metrykę sprzedaży w komórkach o boku `cell_degrees`.
/// Zwraca komórki posortowane po (lat, long) indeksie siatki.
pub fn bin_points<P: SalesPoint>(points: &[P], cell_degrees: f64) -> Vec<HeatCell> {
    if cell_degrees <= 0.0 || !cell_degrees.is_finite() {
        return Vec::new();
    }
    let mut cells: BTreeMap<(i64, i64), HeatCell> = BTreeMap::new();
    for p in points {
        let c = p.coordinate();
        let key = ((c.lat / cell_degrees).floor() as i64, (c.long / cell_degrees).floor() as i64);
        let cell = cells.entry(key).or_insert(HeatCell {
            long: key.1 as f64 * cell_degrees,
            lat: key.0 as f64 * cell_degrees,
            size: cell_degrees,
            total: 0.0,
            count: 0,
        });
        cell.total += p.sales();
        cell.count += 1;
    }
    cells.into_values().collect()
}

pub fn cell_range(cells: &[HeatCell]) -> Option<ValueRange> {
    ValueRange::from_values(cells.iter().map(|c| c.total))
}
