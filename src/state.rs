use crossterm::event::KeyCode;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    chart::{ForecastSeries, forecast_series},
    config::AtlasConfig,
    data::{RecordStore, SalesRecord},
    date_range::{DateRangeSlider, quarter_marks},
    error::AtlasResult,
    legend::{LegendSegment, build_legend},
    map_draw::{LayerMode, MapView, SalesLayer, Viewport, heatmap_layer, scatter_layer},
    movement::{MovementDecision, MovementGate},
    request::{FetchRequest, FetchResponse, Fetcher},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    List,
    Map,
    Dates,
}

/// Aktywny filtr rekordów
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Przeglądanie okolicy środka mapy
    Nearby,
    Search(String),
    DateRange(chrono::NaiveDate, chrono::NaiveDate),
}

pub struct AppState {
    pub config: AtlasConfig,
    pub fetcher: Fetcher,
    pub basemap: MapView,
    pub viewport: Viewport,
    pub gate: MovementGate,
    pub filter: Filter,
    pub mode: LayerMode,
    /// Rekordy na mapie
    pub map_records: Vec<SalesRecord>,
    /// Rekordy na liście
    pub list_items: Vec<SalesRecord>,
    pub selected: usize,
    pub selected_ids: HashSet<u64>,
    pub dates: Option<DateRangeSlider>,
    pub search_input: Option<String>,
    pub active_panel: Panel,
    pub loading: bool,
    pub info: String,
    layer: SalesLayer,
    legend: Vec<LegendSegment>,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "\
Tab: zmiana panelu
↑/↓: ruch w liście, Enter: zaznacz
strzałki (mapa): przesuwanie, +/-: zoom
h: heatmapa, /: szukaj, Esc: wyczyść filtr
←/→ (daty): uchwyt, Spacja: drugi uchwyt, Enter: filtr
q: wyjście";

    pub fn new(config: AtlasConfig, store: RecordStore, basemap: MapView) -> Self {
        let viewport = Viewport::new(config.center(), config.map.span_degrees);
        let dates = store
            .earliest_forecast_date()
            .and_then(|first| DateRangeSlider::new(quarter_marks(first)).ok());
        let mut gate = MovementGate::new(config.refetch.threshold_meters);
        // początkowe ustawienie mapy wyznacza punkt odniesienia
        gate.observe(viewport.center, false);

        let info = format!("{} rekordów, podkład: {} obiektów", store.len(), basemap.feature_count());
        info!(records = store.len(), basemap = basemap.feature_count(), "application state ready");

        let mut state = Self {
            config,
            fetcher: Fetcher::new(Arc::new(store)),
            basemap,
            viewport,
            gate,
            filter: Filter::Nearby,
            mode: LayerMode::Scatter,
            map_records: Vec::new(),
            list_items: Vec::new(),
            selected: 0,
            selected_ids: HashSet::new(),
            dates,
            search_input: None,
            active_panel: Panel::List,
            loading: false,
            info,
            layer: SalesLayer::default(),
            legend: Vec::new(),
        };
        state.fetch_nearby();
        state
    }

    pub fn layer(&self) -> &SalesLayer {
        &self.layer
    }

    pub fn legend(&self) -> &[LegendSegment] {
        &self.legend
    }

    pub fn highlighted(&self) -> Option<&SalesRecord> {
        self.list_items.get(self.selected)
    }

    /// Seria wykresu dla podświetlonego rekordu
    pub fn highlighted_series(&self) -> ForecastSeries {
        self.highlighted()
            .and_then(|r| r.forecast_records.as_deref())
            .map(forecast_series)
            .unwrap_or_default()
    }

    fn submit(&mut self, request: FetchRequest) {
        self.fetcher.submit(request);
        self.loading = true;
    }

    pub fn fetch_nearby(&mut self) {
        let request = FetchRequest::Closest {
            center: self.viewport.center,
            limit: self.config.refetch.closest_limit,
            radius_meters: self.config.refetch.nearby_radius_meters,
        };
        self.submit(request);
    }

    /// Odbiera gotowe wyniki; zwraca true, jeśli coś się zmieniło.
    pub fn poll_fetches(&mut self) -> bool {
        match self.fetcher.poll() {
            Some(Ok(response)) => {
                self.commit(response);
                true
            }
            Some(Err(e)) => {
                warn!(error = %e, "fetch failed");
                self.loading = false;
                self.info = format!("Błąd pobierania: {}", e);
                true
            }
            None => false,
        }
    }

    pub fn commit(&mut self, response: FetchResponse) {
        self.map_records = response.map_records().to_vec();
        self.list_items = response.list_records().to_vec();
        self.selected = 0;
        self.loading = false;
        info!(map = self.map_records.len(), list = self.list_items.len(), "fetch committed");
        self.rebuild_layer();
    }

    /// Przelicza warstwę mapy i legendę po zmianie danych, trybu lub zaznaczenia.
    pub fn rebuild_layer(&mut self) {
        self.layer = match self.mode {
            LayerMode::Scatter => scatter_layer(&self.map_records, &self.selected_ids),
            LayerMode::Heatmap => {
                heatmap_layer(&self.map_records, self.config.heatmap.cell_degrees, self.config.heatmap.opacity)
            }
        };
        self.legend = self
            .layer
            .range
            .map(|r| build_legend(r.min, r.max, self.config.legend.segments))
            .unwrap_or_default();
    }

    /// Nowy środek widoku przechodzi przez bramkę ruchu.
    pub fn on_viewport_moved(&mut self) -> MovementDecision {
        let filter_active = self.filter != Filter::Nearby;
        let decision = self.gate.observe(self.viewport.center, filter_active);
        if let MovementDecision::Refetch(center) = decision {
            info!(lat = center.lat, long = center.long, "viewport moved, refetching");
            self.fetch_nearby();
        }
        decision
    }

    pub fn pan(&mut self, d_lat: f64, d_long: f64) -> MovementDecision {
        self.viewport.pan(d_lat, d_long);
        self.on_viewport_moved()
    }

    pub fn submit_search(&mut self, text: String) {
        if text.trim().is_empty() {
            self.clear_filter();
            return;
        }
        info!(%text, "search filter applied");
        self.filter = Filter::Search(text.clone());
        self.submit(FetchRequest::Search { text });
    }

    pub fn apply_date_filter(&mut self) {
        let Some(slider) = &self.dates else { return };
        let (start, end) = slider.selected_range();
        info!(%start, %end, "date filter applied");
        self.filter = Filter::DateRange(start, end);
        self.submit(FetchRequest::DateRange { start, end });
    }

    /// Wraca do danych z okolicy; bramka liczy ruch od nowego miejsca pobrania.
    pub fn clear_filter(&mut self) {
        self.filter = Filter::Nearby;
        self.gate.anchor(self.viewport.center);
        self.fetch_nearby();
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.highlighted().map(|r| r.id) else { return };
        if !self.selected_ids.remove(&id) {
            self.selected_ids.insert(id);
        }
        self.rebuild_layer();
    }

    pub fn toggle_heatmap(&mut self) {
        self.mode = match self.mode {
            LayerMode::Scatter => LayerMode::Heatmap,
            LayerMode::Heatmap => LayerMode::Scatter,
        };
        self.rebuild_layer();
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;

        if let Some(input) = self.search_input.as_mut() {
            match key {
                Enter => {
                    let text = std::mem::take(input);
                    self.search_input = None;
                    self.submit_search(text);
                }
                Esc => self.search_input = None,
                Backspace => {
                    input.pop();
                }
                Char(c) => input.push(c),
                _ => {}
            }
            return false;
        }

        let step = self.config.map.pan_step_degrees;
        match key {
            Char('q') => return true,
            Char('/') => self.search_input = Some(String::new()),
            Char('h') => self.toggle_heatmap(),
            Char('+') => self.viewport.zoom(0.5),
            Char('-') => self.viewport.zoom(2.0),
            Esc => self.clear_filter(),
            Tab => {
                self.active_panel = match self.active_panel {
                    Panel::List => Panel::Map,
                    Panel::Map => Panel::Dates,
                    Panel::Dates => Panel::List,
                };
            }
            _ => match self.active_panel {
                Panel::List => match key {
                    Up => self.selected = self.selected.saturating_sub(1),
                    Down => {
                        if self.selected + 1 < self.list_items.len() {
                            self.selected += 1
                        }
                    }
                    Enter => self.toggle_selected(),
                    _ => {}
                },
                Panel::Map => {
                    let moved = match key {
                        Up => Some((step, 0.0)),
                        Down => Some((-step, 0.0)),
                        Left => Some((0.0, -step)),
                        Right => Some((0.0, step)),
                        _ => None,
                    };
                    if let Some((d_lat, d_long)) = moved {
                        self.pan(d_lat, d_long);
                    }
                }
                Panel::Dates => {
                    if key == Enter {
                        self.apply_date_filter();
                    } else if let Some(slider) = self.dates.as_mut() {
                        match key {
                            Left => slider.step(-1),
                            Right => slider.step(1),
                            Char(' ') => slider.toggle_handle(),
                            _ => {}
                        }
                    }
                }
            },
        }
        false
    }
}

/// Ładuje rekordy i podkład według konfiguracji. Brak pliku z rekordami
/// oznacza zbiór demonstracyjny; brak podkładu to pusta mapa.
pub fn load_sources(config: &AtlasConfig) -> AtlasResult<(RecordStore, MapView)> {
    let store = if config.data.records.exists() {
        RecordStore::load(&config.data.records)?
    } else {
        warn!(path = %config.data.records.display(), "records file missing, using demo dataset");
        RecordStore::demo(config.data.demo_records, config.center(), 42)
    };

    let basemap = match &config.data.basemap {
        Some(path) => MapView::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "basemap not loaded");
            MapView::default()
        }),
        None => MapView::default(),
    };
    Ok((store, basemap))
}
