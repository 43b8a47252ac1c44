//! Bramka ruchu widoku: czy mapa przesunęła się na tyle, by pobrać dane ponownie.

use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Promień Ziemi we wzorze haversine, w metrach.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Domyślny próg ponownego pobrania (≈250 km).
pub const DEFAULT_THRESHOLD_METERS: f64 = 250_000.0;

/// Współrzędne w stopniach.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub long: f64,
}

impl GeoCoordinate {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

impl From<GeoCoordinate> for Point<f64> {
    fn from(c: GeoCoordinate) -> Self {
        Point::new(c.long, c.lat)
    }
}

impl From<Point<f64>> for GeoCoordinate {
    fn from(p: Point<f64>) -> Self {
        Self { lat: p.y(), long: p.x() }
    }
}

/// Odległość po kole wielkim w metrach.
pub fn haversine_distance(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.long - a.long).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // dla antypodów błąd zaokrągleń daje h odrobinę powyżej 1
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

pub fn should_refetch(current: GeoCoordinate, candidate: GeoCoordinate, threshold_meters: f64) -> bool {
    haversine_distance(current, candidate) >= threshold_meters
}

/// Wynik obserwacji nowego środka widoku.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementDecision {
    /// Pierwsza obserwacja: zapamiętany punkt odniesienia.
    Anchored,
    /// Za mały ruch; punkt odniesienia bez zmian.
    Stay,
    /// Pierwsza decyzja „przekroczono próg”: tylko nowa baza, bez pobierania.
    Baseline,
    /// Trzeba pobrać dane wokół tego punktu.
    Refetch(GeoCoordinate),
    /// Aktywny filtr; ruch nie prowadzi do pobierania.
    Suppressed,
}

/// Stan bramki należący do widoku: punkt odniesienia i flaga pierwszej decyzji.
///
/// Małe przesunięcia są zawsze mierzone od starego punktu odniesienia,
/// więc kumulują się aż do przekroczenia progu.
#[derive(Clone, Debug)]
pub struct MovementGate {
    reference: Option<GeoCoordinate>,
    first_decision: bool,
    threshold_meters: f64,
}

impl Default for MovementGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_METERS)
    }
}

impl MovementGate {
    pub fn new(threshold_meters: f64) -> Self {
        Self { reference: None, first_decision: true, threshold_meters }
    }

    pub fn reference(&self) -> Option<GeoCoordinate> {
        self.reference
    }

    pub fn threshold_meters(&self) -> f64 {
        self.threshold_meters
    }

    /// Ustawia punkt odniesienia na miejsce, wokół którego właśnie pobrano dane.
    /// Flaga pierwszej decyzji zostaje bez zmian.
    pub fn anchor(&mut self, at: GeoCoordinate) {
        debug!(lat = at.lat, long = at.long, "movement gate re-anchored");
        self.reference = Some(at);
    }

    /// Przetwarza nową pozycję. `filter_active` wyłącza pobieranie
    /// (i nie zmienia stanu bramki).
    pub fn observe(&mut self, candidate: GeoCoordinate, filter_active: bool) -> MovementDecision {
        let Some(reference) = self.reference else {
            self.reference = Some(candidate);
            debug!(lat = candidate.lat, long = candidate.long, "movement gate anchored");
            return MovementDecision::Anchored;
        };

        if filter_active {
            return MovementDecision::Suppressed;
        }

        if !should_refetch(reference, candidate, self.threshold_meters) {
            return MovementDecision::Stay;
        }

        self.reference = Some(candidate);
        if self.first_decision {
            self.first_decision = false;
            debug!(lat = candidate.lat, long = candidate.long, "movement gate baseline update");
            MovementDecision::Baseline
        } else {
            debug!(lat = candidate.lat, long = candidate.long, "movement gate refetch");
            MovementDecision::Refetch(candidate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: GeoCoordinate = GeoCoordinate { lat: 36.7849143994791, long: -92.1959309706847 };

    #[test]
    fn test_haversine_one_degree_at_equator() {
        let d = haversine_distance(GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 200.0);
    }

    #[test]
    fn test_haversine_antipodal() {
        let d = haversine_distance(GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
        assert!(d.is_finite());
    }

    #[test]
    fn test_haversine_inexact_antipodes_are_finite() {
        let a = GeoCoordinate::new(-11.056008330198168, -1.4992175852974583);
        let b = GeoCoordinate::new(11.056008330198168, 178.50078241470254);
        let d = haversine_distance(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
        assert!(should_refetch(a, b, DEFAULT_THRESHOLD_METERS));

        let mut gate = MovementGate::default();
        gate.observe(a, false);
        assert_eq!(gate.observe(b, false), MovementDecision::Baseline);
    }

    #[test]
    fn test_far_candidate_refetches() {
        let far = GeoCoordinate::new(40.0, -95.0);
        let d = haversine_distance(HOME, far);
        assert!((d - 433_000.0).abs() < 1_000.0);
        assert!(should_refetch(HOME, far, DEFAULT_THRESHOLD_METERS));
    }

    #[test]
    fn test_near_candidate_stays() {
        let near = GeoCoordinate::new(36.80, -92.20);
        assert!(haversine_distance(HOME, near) < 2_000.0);
        assert!(!should_refetch(HOME, near, DEFAULT_THRESHOLD_METERS));
    }

    #[test]
    fn test_gate_sequence() {
        let mut gate = MovementGate::default();
        let second = GeoCoordinate::new(40.0, -95.0);
        let third = GeoCoordinate::new(44.0, -99.0);

        assert_eq!(gate.observe(HOME, false), MovementDecision::Anchored);
        assert_eq!(gate.reference(), Some(HOME));

        assert_eq!(gate.observe(second, false), MovementDecision::Baseline);
        assert_eq!(gate.reference(), Some(second));

        assert_eq!(gate.observe(third, false), MovementDecision::Refetch(third));
        assert_eq!(gate.reference(), Some(third));
    }

    #[test]
    fn test_small_moves_accumulate_against_reference() {
        let mut gate = MovementGate::default();
        gate.observe(GeoCoordinate::new(0.0, 0.0), false);

        // 1° ≈ 111 km, trzy kroki przekraczają 250 km
        assert_eq!(gate.observe(GeoCoordinate::new(0.0, 1.0), false), MovementDecision::Stay);
        assert_eq!(gate.observe(GeoCoordinate::new(0.0, 2.0), false), MovementDecision::Stay);
        assert_eq!(gate.reference(), Some(GeoCoordinate::new(0.0, 0.0)));
        assert_eq!(gate.observe(GeoCoordinate::new(0.0, 3.0), false), MovementDecision::Baseline);
    }

    #[test]
    fn test_filter_suppresses_without_touching_state() {
        let mut gate = MovementGate::default();
        gate.observe(HOME, false);
        let far = GeoCoordinate::new(40.0, -95.0);

        assert_eq!(gate.observe(far, true), MovementDecision::Suppressed);
        assert_eq!(gate.reference(), Some(HOME));
        // flaga pierwszej decyzji nadal nieskonsumowana
        assert_eq!(gate.observe(far, false), MovementDecision::Baseline);
    }

    #[test]
    fn test_anchor_moves_reference_only() {
        let mut gate = MovementGate::default();
        gate.observe(HOME, false);
        let moved = GeoCoordinate::new(40.0, -95.0);
        gate.anchor(moved);
        assert_eq!(gate.reference(), Some(moved));
        assert_eq!(gate.threshold_meters(), DEFAULT_THRESHOLD_METERS);

        // odległość liczona od nowego punktu, pierwsza decyzja nadal wolna
        assert_eq!(gate.observe(GeoCoordinate::new(40.0, -94.0), false), MovementDecision::Stay);
        assert_eq!(gate.observe(HOME, false), MovementDecision::Baseline);
    }

    #[test]
    fn test_point_conversion() {
        let p: Point<f64> = HOME.into();
        assert_eq!(p.x(), HOME.long);
        assert_eq!(GeoCoordinate::from(p), HOME);
    }
}
