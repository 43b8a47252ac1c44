use chrono::NaiveDate;
use geo::{Intersects, Rect, coord};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use serde_json::from_slice;
use std::{fs, path::Path};
use tracing::info;

use crate::{
    color::SalesPoint,
    error::AtlasResult,
    movement::{GeoCoordinate, haversine_distance},
};

/// Jeden wpis prognozy tygodniowej
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: String,
    pub forecast: f64,
    pub weekly_sales: f64,
}

impl ForecastRecord {
    /// Data z pola tekstowego; akceptuje `YYYY-MM-DD` oraz pełne znaczniki czasu.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let head = self.date.get(..10).unwrap_or(&self.date);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }
}

/// Sklep/pozycja z danymi sprzedaży (nazwy pól jak w API)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "HId")]
    pub id: u64,
    #[serde(rename = "IId", default)]
    pub item_id: u64,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "SLat")]
    pub lat: f64,
    #[serde(rename = "SLong")]
    pub long: f64,
    #[serde(rename = "weeknumber", default)]
    pub week_number: u32,
    #[serde(default)]
    pub weekly_sales: f64,
    #[serde(default)]
    pub avg_weekly_sales: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_records: Option<Vec<ForecastRecord>>,
}

impl SalesPoint for SalesRecord {
    fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.lat, self.long)
    }

    fn sales(&self) -> f64 {
        self.avg_weekly_sales
    }
}

/// Wynik zapytania o najbliższe rekordy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClosestRecords {
    pub closest: Vec<SalesRecord>,
    pub all: Vec<SalesRecord>,
}

/// Lokalne źródło rekordów (zamiast REST API)
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<SalesRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> AtlasResult<Self> {
        let data = fs::read(path.as_ref())?;
        let records: Vec<SalesRecord> = from_slice(&data)?;
        info!(count = records.len(), path = %path.as_ref().display(), "loaded sales records");
        Ok(Self { records })
    }

    /// Syntetyczny zbiór wokół `center` (powtarzalny dla danego ziarna).
    pub fn demo(count: usize, center: GeoCoordinate, seed: u64) -> Self {
        const TITLES: [&str; 8] = [
            "Grocery", "Hardware", "Pharmacy", "Bakery", "Electronics", "Garden Center", "Books", "Outlet",
        ];
        let mut rng = StdRng::seed_from_u64(seed);
        let start = NaiveDate::from_ymd_opt(2011, 1, 7).unwrap_or_default();

        let records = (0..count)
            .map(|i| {
                let lat = center.lat + rng.random_range(-6.0..6.0);
                let long = center.long + rng.random_range(-8.0..8.0);
                let base: f64 = rng.random_range(5_000.0..60_000.0);
                let forecast_records = (0..20)
                    .map(|w| {
                        let date = start + chrono::Duration::weeks(w);
                        let weekly_sales = (base * rng.random_range(0.7..1.3)).round();
                        ForecastRecord {
                            date: date.format("%Y-%m-%d").to_string(),
                            forecast: (base * rng.random_range(0.85..1.15)).round(),
                            weekly_sales,
                        }
                    })
                    .collect::<Vec<_>>();
                let weekly_sales = forecast_records.last().map_or(base, |f| f.weekly_sales);
                let title = TITLES[i % TITLES.len()];
                SalesRecord {
                    id: i as u64 + 1,
                    item_id: rng.random_range(1..100),
                    title: format!("{} #{}", title, i + 1),
                    description: format!("{} store with weekly sales history", title.to_lowercase()),
                    image: String::new(),
                    lat,
                    long,
                    week_number: forecast_records.len() as u32,
                    weekly_sales,
                    avg_weekly_sales: base.round(),
                    distance: None,
                    forecast_records: Some(forecast_records),
                }
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    fn by_distance(&self, center: GeoCoordinate) -> Vec<SalesRecord> {
        let mut out: Vec<SalesRecord> = self
            .records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.distance = Some(haversine_distance(center, r.coordinate()));
                r
            })
            .collect();
        out.sort_by(|a, b| a.distance.unwrap_or(f64::MAX).total_cmp(&b.distance.unwrap_or(f64::MAX)));
        out
    }

    /// `limit` najbliższych rekordów oraz wszystkie w promieniu `radius_meters`.
    pub fn closest(&self, center: GeoCoordinate, limit: usize, radius_meters: f64) -> ClosestRecords {
        let sorted = self.by_distance(center);
        let closest = sorted.iter().take(limit).cloned().collect();
        let all = sorted
            .into_iter()
            .take_while(|r| r.distance.is_some_and(|d| d <= radius_meters))
            .collect();
        ClosestRecords { closest, all }
    }

    /// Wyszukiwanie tekstowe w tytule i opisie (bez rozróżniania wielkości liter).
    pub fn search(&self, text: &str) -> Vec<SalesRecord> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle) || r.description.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn within_range(&self, min_lat: f64, max_lat: f64, min_long: f64, max_long: f64) -> Vec<SalesRecord> {
        let bbox = Rect::new(coord! { x: min_long, y: min_lat }, coord! { x: max_long, y: max_lat });
        self.records
            .iter()
            .filter(|r| bbox.intersects(&coord! { x: r.long, y: r.lat }))
            .cloned()
            .collect()
    }

    /// Rekordy z prognozą w oknie `[start, end]`; lista prognoz przycięta do okna.
    pub fn in_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<SalesRecord> {
        self.records
            .iter()
            .filter_map(|r| {
                let window: Vec<ForecastRecord> = r
                    .forecast_records
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter(|f| f.parsed_date().is_some_and(|d| d >= start && d <= end))
                    .cloned()
                    .collect();
                if window.is_empty() {
                    return None;
                }
                let mut r = r.clone();
                r.forecast_records = Some(window);
                Some(r)
            })
            .collect()
    }

    /// Najwcześniejsza data prognozy w zbiorze.
    pub fn earliest_forecast_date(&self) -> Option<NaiveDate> {
        self.records
            .iter()
            .flat_map(|r| r.forecast_records.as_deref().unwrap_or_default())
            .filter_map(ForecastRecord::parsed_date)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, title: &str, lat: f64, long: f64, sales: f64) -> SalesRecord {
        SalesRecord {
            id,
            item_id: 0,
            title: title.to_string(),
            description: String::new(),
            image: String::new(),
            lat,
            long,
            week_number: 0,
            weekly_sales: sales,
            avg_weekly_sales: sales,
            distance: None,
            forecast_records: None,
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(vec![
            record(1, "Grocery North", 42.0, -72.0, 100.0),
            record(2, "Hardware", 41.6, -72.0, 200.0),
            record(3, "grocery south", 30.0, -90.0, 300.0),
        ])
    }

    #[test]
    fn test_deserialize_api_shape() {
        let json = r#"[{"HId": 7, "IId": 3, "Title": "Shop", "Description": "d", "Image": "x.png",
            "SLat": 36.5, "SLong": -92.1, "weeknumber": 12, "weekly_sales": 1500.5,
            "avg_weekly_sales": 1400.0, "forecast_records": [{"date": "2011-02-04", "forecast": 1, "weekly_sales": 2}]}]"#;
        let records: Vec<SalesRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, 7);
        assert_eq!(records[0].lat, 36.5);
        assert_eq!(records[0].sales(), 1400.0);
        assert_eq!(records[0].forecast_records.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_closest_orders_by_distance() {
        let res = store().closest(GeoCoordinate::new(41.5, -72.0), 2, 100_000.0);
        let ids: Vec<u64> = res.closest.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(res.closest[0].distance.unwrap() < res.closest[1].distance.unwrap());
        // rekord 1 jest ~55 km, rekord 3 daleko poza promieniem
        assert_eq!(res.all.len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let s = store();
        let ids: Vec<u64> = s.search("GROCERY").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(s.search("   ").is_empty());
    }

    #[test]
    fn test_within_range_inclusive() {
        let ids: Vec<u64> = store().within_range(41.6, 42.0, -72.0, -71.0).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_in_date_range_trims_forecasts() {
        let mut r = record(1, "a", 0.0, 0.0, 1.0);
        r.forecast_records = Some(vec![
            ForecastRecord { date: "2011-01-07".into(), forecast: 1.0, weekly_sales: 1.0 },
            ForecastRecord { date: "2011-03-04".into(), forecast: 2.0, weekly_sales: 2.0 },
            ForecastRecord { date: "2011-06-03T00:00:00".into(), forecast: 3.0, weekly_sales: 3.0 },
        ]);
        let s = RecordStore::new(vec![r, record(2, "b", 0.0, 0.0, 1.0)]);
        let start = NaiveDate::from_ymd_opt(2011, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2011, 6, 30).unwrap();

        let out = s.in_date_range(start, end);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].forecast_records.as_ref().unwrap().len(), 2);
        assert_eq!(s.earliest_forecast_date(), NaiveDate::from_ymd_opt(2011, 1, 7));
    }

    #[test]
    fn test_demo_is_reproducible() {
        let center = GeoCoordinate::new(41.5, -72.0);
        let a = RecordStore::demo(10, center, 7);
        let b = RecordStore::demo(10, center, 7);
        assert_eq!(a.records(), b.records());
        assert_eq!(a.len(), 10);
        assert!(a.records().iter().all(|r| r.forecast_records.as_ref().is_some_and(|f| f.len() == 20)));
    }
}
