//! Pobieranie rekordów w tle z unieważnianiem starszych zapytań.
//!
//! Każde zapytanie dostaje kolejny numer generacji. Nowy numer unieważnia
//! wszystkie poprzednie; wynik z nieaktualnym numerem jest odrzucany.

use chrono::NaiveDate;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc::{self, Receiver, Sender},
};
use std::thread;
use tracing::{debug, warn};

use crate::{
    data::{ClosestRecords, RecordStore, SalesRecord},
    error::{AtlasError, AtlasResult},
    movement::GeoCoordinate,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Licznik generacji współdzielony z wątkami roboczymi.
#[derive(Clone, Debug, Default)]
pub struct RequestGenerations {
    latest: Arc<AtomicU64>,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wydaje nowy bilet i unieważnia wszystkie wcześniejsze.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FetchRequest {
    Closest { center: GeoCoordinate, limit: usize, radius_meters: f64 },
    Search { text: String },
    DateRange { start: NaiveDate, end: NaiveDate },
    WithinRange { min_lat: f64, max_lat: f64, min_long: f64, max_long: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum FetchResponse {
    Closest(ClosestRecords),
    Records(Vec<SalesRecord>),
}

impl FetchResponse {
    /// Rekordy do pokazania na mapie.
    pub fn map_records(&self) -> &[SalesRecord] {
        match self {
            FetchResponse::Closest(c) => &c.all,
            FetchResponse::Records(r) => r,
        }
    }

    /// Rekordy do listy.
    pub fn list_records(&self) -> &[SalesRecord] {
        match self {
            FetchResponse::Closest(c) => &c.closest,
            FetchResponse::Records(r) => r,
        }
    }
}

pub fn execute(store: &RecordStore, request: &FetchRequest) -> AtlasResult<FetchResponse> {
    match request {
        FetchRequest::Closest { center, limit, radius_meters } => {
            Ok(FetchResponse::Closest(store.closest(*center, *limit, *radius_meters)))
        }
        FetchRequest::Search { text } => Ok(FetchResponse::Records(store.search(text))),
        FetchRequest::DateRange { start, end } => {
            if start > end {
                return Err(AtlasError::Fetch(format!("empty date range {} .. {}", start, end)));
            }
            Ok(FetchResponse::Records(store.in_date_range(*start, *end)))
        }
        FetchRequest::WithinRange { min_lat, max_lat, min_long, max_long } => {
            Ok(FetchResponse::Records(store.within_range(*min_lat, *max_lat, *min_long, *max_long)))
        }
    }
}

pub type FetchOutcome = (RequestTicket, AtlasResult<FetchResponse>);

/// Wykonuje zapytania na osobnych wątkach i odsyła wyniki kanałem.
pub struct Fetcher {
    store: Arc<RecordStore>,
    generations: RequestGenerations,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl Fetcher {
    pub fn new(store: Arc<RecordStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { store, generations: RequestGenerations::new(), tx, rx }
    }

    /// Uruchamia zapytanie; poprzednie, jeszcze trwające, zostaje unieważnione.
    pub fn submit(&self, request: FetchRequest) -> RequestTicket {
        let ticket = self.generations.issue();
        let store = Arc::clone(&self.store);
        let generations = self.generations.clone();
        let tx = self.tx.clone();
        debug!(generation = ticket.generation(), ?request, "fetch issued");

        thread::spawn(move || {
            let result = execute(&store, &request);
            if !generations.is_current(ticket) {
                debug!(generation = ticket.generation(), "fetch superseded before completion");
                return;
            }
            if tx.send((ticket, result)).is_err() {
                warn!(generation = ticket.generation(), "fetch receiver dropped");
            }
        });
        ticket
    }

    /// Zbiera gotowe wyniki; zwraca tylko ten z aktualnym biletem.
    pub fn poll(&self) -> Option<AtlasResult<FetchResponse>> {
        let mut committed = None;
        while let Ok((ticket, result)) = self.rx.try_recv() {
            if self.generations.is_current(ticket) {
                committed = Some(result);
            } else {
                debug!(generation = ticket.generation(), "stale fetch result discarded");
            }
        }
        committed
    }

    /// Czeka na wynik bieżącego zapytania (w testach i przy starcie).
    pub fn wait(&self, timeout: std::time::Duration) -> Option<AtlasResult<FetchResponse>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(left) {
                Ok((ticket, result)) if self.generations.is_current(ticket) => return Some(result),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}
