use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sales_atlas::{
    GeoCoordinate, MovementDecision, MovementGate,
    config::AtlasConfig,
    data::RecordStore,
    error::AtlasError,
    map_draw::MapView,
    request::{FetchRequest, Fetcher},
    state::{AppState, load_sources},
};
use tempfile::{NamedTempFile, TempDir};

const RECORDS: &str = r#"[
    {"HId": 1, "Title": "Corner Grocery", "Description": "fresh food", "SLat": 41.58, "SLong": -71.99,
     "avg_weekly_sales": 1200.0, "weekly_sales": 1300.0,
     "forecast_records": [
        {"date": "2011-01-07", "forecast": 1100.0, "weekly_sales": 1250.0},
        {"date": "2011-01-14", "forecast": 1150.0, "weekly_sales": 1180.0},
        {"date": "2011-01-07", "forecast": 9999.0, "weekly_sales": 9999.0}
     ]},
    {"HId": 2, "Title": "Harbor Hardware", "Description": "tools", "SLat": 41.70, "SLong": -71.50,
     "avg_weekly_sales": 5400.0},
    {"HId": 3, "Title": "Prairie Outlet", "Description": "discount grocery", "SLat": 36.78, "SLong": -92.19,
     "avg_weekly_sales": 800.0}
]"#;

#[test]
fn movement_gate_end_to_end_sequence() {
    let mut gate = MovementGate::new(250_000.0);
    let first = GeoCoordinate::new(36.7849143994791, -92.1959309706847);
    let second = GeoCoordinate::new(40.0, -95.0);
    let third = GeoCoordinate::new(36.0, -99.0);

    assert_eq!(gate.observe(first, false), MovementDecision::Anchored);
    assert_eq!(gate.observe(second, false), MovementDecision::Baseline);
    assert_eq!(gate.reference(), Some(second));
    assert_eq!(gate.observe(third, false), MovementDecision::Refetch(third));
    assert_eq!(gate.reference(), Some(third));
}

#[test]
fn config_file_round_trip() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[map]\ncenter_lat = 36.78\ncenter_long = -92.19\n\n[legend]\nsegments = 4").unwrap();

    let config = AtlasConfig::load_or_default(file.path()).unwrap();
    assert_eq!(config.center(), GeoCoordinate::new(36.78, -92.19));
    assert_eq!(config.legend.segments, 4);
    assert_eq!(config.refetch.closest_limit, 25);

    let missing = AtlasConfig::load_or_default("/nonexistent/sales_atlas.toml").unwrap();
    assert_eq!(missing, AtlasConfig::default());
}

#[test]
fn broken_records_file_is_json_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();
    assert!(matches!(RecordStore::load(file.path()), Err(AtlasError::Json(_))));
}

#[test]
fn loads_sources_from_disk() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.json");
    std::fs::write(&records, RECORDS).unwrap();

    let mut config = AtlasConfig::default();
    config.data.records = records;
    config.data.basemap = Some(dir.path().join("missing.geojson"));

    let (store, basemap) = load_sources(&config).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(basemap.feature_count(), 0);
}

#[test]
fn missing_records_file_falls_back_to_demo() {
    let dir = TempDir::new().unwrap();
    let mut config = AtlasConfig::default();
    config.data.records = dir.path().join("none.json");
    config.data.basemap = None;
    config.data.demo_records = 12;

    let (store, _) = load_sources(&config).unwrap();
    assert_eq!(store.len(), 12);
}

#[test]
fn fetcher_runs_each_query_kind() {
    let store: Vec<_> = serde_json::from_str(RECORDS).unwrap();
    let fetcher = Fetcher::new(Arc::new(RecordStore::new(store)));

    fetcher.submit(FetchRequest::WithinRange { min_lat: 41.0, max_lat: 42.0, min_long: -72.0, max_long: -71.0 });
    let res = fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(res.list_records().len(), 2);

    fetcher.submit(FetchRequest::Search { text: "grocery".into() });
    let res = fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
    let ids: Vec<u64> = res.list_records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn app_commits_nearby_then_search() {
    let records: Vec<_> = serde_json::from_str(RECORDS).unwrap();
    let mut state = AppState::new(AtlasConfig::default(), RecordStore::new(records), MapView::default());

    let nearby = state.fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
    state.commit(nearby);
    // rekord 3 leży ~1800 km dalej, poza promieniem mapy
    assert_eq!(state.map_records.len(), 2);
    assert_eq!(state.list_items.len(), 3);
    assert_eq!(state.list_items[0].id, 1);

    let series = state.highlighted_series();
    assert_eq!(series.forecast.len(), 2);
    assert_eq!(series.forecast[0].1, 1100.0);

    state.submit_search("outlet".into());
    let found = state.fetcher.wait(Duration::from_secs(5)).unwrap().unwrap();
    state.commit(found);
    assert_eq!(state.list_items.len(), 1);
    assert_eq!(state.legend().len(), 6);
    assert!(state.legend().iter().all(|s| s.color == sales_atlas::ColorSample::opaque(255, 255, 0)));
}
