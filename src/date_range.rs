//! Suwak zakresu dat o kroku kwartalnym.
//!
//! Pozycje suwaka to 1, 4, 7, 10, 12 (zakres 1..12, krok 3). Pozycja `v`
//! wskazuje znacznik o indeksie `ceil((v - 1) / 3)`; koniec zakresu to
//! ostatni dzień miesiąca znacznika.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{AtlasError, AtlasResult};

pub const SLIDER_POSITIONS: [u32; 5] = [1, 4, 7, 10, 12];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Lower,
    Upper,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DateRangeSlider {
    marks: Vec<NaiveDate>,
    min: u32,
    max: u32,
    active: Handle,
}

pub fn mark_index(position: u32) -> usize {
    (position.saturating_sub(1)).div_ceil(3) as usize
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Pięć znaczników co trzy miesiące, od początku miesiąca `first`.
pub fn quarter_marks(first: NaiveDate) -> Vec<NaiveDate> {
    let start = first.with_day(1).unwrap_or(first);
    (0..SLIDER_POSITIONS.len() as u32)
        .filter_map(|i| start.checked_add_months(Months::new(3 * i)))
        .collect()
}

impl DateRangeSlider {
    pub fn new(marks: Vec<NaiveDate>) -> AtlasResult<Self> {
        if marks.len() != SLIDER_POSITIONS.len() {
            return Err(AtlasError::Date(format!(
                "expected {} date marks, got {}",
                SLIDER_POSITIONS.len(),
                marks.len()
            )));
        }
        let (min, max) = (SLIDER_POSITIONS[0], SLIDER_POSITIONS[SLIDER_POSITIONS.len() - 1]);
        Ok(Self { marks, min, max, active: Handle::Lower })
    }

    pub fn positions(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    pub fn active(&self) -> Handle {
        self.active
    }

    pub fn toggle_handle(&mut self) {
        self.active = match self.active {
            Handle::Lower => Handle::Upper,
            Handle::Upper => Handle::Lower,
        };
    }

    /// Ustawia obie pozycje (jak `onChange` suwaka). Nieznane pozycje są
    /// przyciągane do najbliższego kroku; dolna nie przekracza górnej.
    pub fn set_positions(&mut self, lower: u32, upper: u32) {
        let snap = |v: u32| {
            *SLIDER_POSITIONS
                .iter()
                .min_by_key(|p| p.abs_diff(v))
                .unwrap_or(&SLIDER_POSITIONS[0])
        };
        let (a, b) = (snap(lower), snap(upper));
        (self.min, self.max) = if a <= b { (a, b) } else { (b, a) };
    }

    /// Przesuwa aktywny uchwyt o `steps` pozycji.
    pub fn step(&mut self, steps: i32) {
        let idx_of = |v: u32| SLIDER_POSITIONS.iter().position(|p| *p == v).unwrap_or(0) as i32;
        let last = SLIDER_POSITIONS.len() as i32 - 1;
        match self.active {
            Handle::Lower => {
                let idx = (idx_of(self.min) + steps).clamp(0, idx_of(self.max));
                self.min = SLIDER_POSITIONS[idx as usize];
            }
            Handle::Upper => {
                let idx = (idx_of(self.max) + steps).clamp(idx_of(self.min), last);
                self.max = SLIDER_POSITIONS[idx as usize];
            }
        }
    }

    /// Wybrany zakres: `(początek znacznika, koniec miesiąca znacznika)`.
    pub fn selected_range(&self) -> (NaiveDate, NaiveDate) {
        let start = self.marks[mark_index(self.min)];
        let end = end_of_month(self.marks[mark_index(self.max)]);
        (start, end)
    }

    /// Etykiety znaczników w formacie `MM/YY`.
    pub fn labels(&self) -> Vec<String> {
        self.marks.iter().map(|d| format!("{:02}/{:02}", d.month(), d.year() % 100)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slider() -> DateRangeSlider {
        DateRangeSlider::new(quarter_marks(ymd(2011, 1, 7))).unwrap()
    }

    #[test]
    fn test_mark_index() {
        let idx: Vec<usize> = SLIDER_POSITIONS.iter().map(|p| mark_index(*p)).collect();
        assert_eq!(idx, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_end_of_month() {
        assert_eq!(end_of_month(ymd(2012, 2, 10)), ymd(2012, 2, 29));
        assert_eq!(end_of_month(ymd(2011, 12, 1)), ymd(2011, 12, 31));
    }

    #[test]
    fn test_quarter_marks() {
        assert_eq!(
            quarter_marks(ymd(2011, 1, 7)),
            vec![ymd(2011, 1, 1), ymd(2011, 4, 1), ymd(2011, 7, 1), ymd(2011, 10, 1), ymd(2012, 1, 1)]
        );
    }

    #[test]
    fn test_full_range_by_default() {
        assert_eq!(slider().selected_range(), (ymd(2011, 1, 1), ymd(2012, 1, 31)));
        assert_eq!(slider().labels()[4], "01/12");
    }

    #[test]
    fn test_handles_do_not_cross() {
        let mut s = slider();
        s.toggle_handle();
        s.step(-10);
        assert_eq!(s.positions(), (1, 1));
        s.toggle_handle();
        s.step(3);
        assert_eq!(s.positions(), (1, 1));

        s.set_positions(12, 5);
        assert_eq!(s.positions(), (4, 12));
        assert_eq!(s.selected_range(), (ymd(2011, 4, 1), ymd(2012, 1, 31)));
    }

    #[test]
    fn test_wrong_mark_count() {
        assert!(DateRangeSlider::new(vec![ymd(2011, 1, 1)]).is_err());
    }
}
