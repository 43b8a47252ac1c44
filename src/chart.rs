//! Wykres prognozy i sprzedaży tygodniowej.

use chrono::{Datelike, NaiveDate};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
};
use std::collections::HashSet;

use crate::data::ForecastRecord;

pub const FORECAST_COLOR: Color = Color::Rgb(0xFF, 0x45, 0x60);
pub const SALES_COLOR: Color = Color::Rgb(0x00, 0xE3, 0x96);

/// Dwie serie: prognoza i faktyczna sprzedaż. `x` = dni od początku ery.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastSeries {
    pub forecast: Vec<(f64, f64)>,
    pub weekly_sales: Vec<(f64, f64)>,
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_from_day(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Powtórzone daty są pomijane (pierwsze wystąpienie wygrywa).
pub fn forecast_series(records: &[ForecastRecord]) -> ForecastSeries {
    let mut seen = HashSet::new();
    let mut series = ForecastSeries::default();
    for record in records {
        if !seen.insert(record.date.as_str()) {
            continue;
        }
        let Some(date) = record.parsed_date() else { continue };
        let x = day_number(date);
        series.forecast.push((x, record.forecast));
        series.weekly_sales.push((x, record.weekly_sales));
    }
    series
}

impl ForecastSeries {
    pub fn is_empty(&self) -> bool {
        self.forecast.is_empty()
    }

    /// Zakresy osi `([x_min, x_max], [y_min, y_max])`.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let points = self.forecast.iter().chain(self.weekly_sales.iter());
        points.fold(None, |acc, &(x, y)| match acc {
            None => Some(([x, x], [y, y])),
            Some(([x0, x1], [y0, y1])) => Some(([x0.min(x), x1.max(x)], [y0.min(y), y1.max(y)])),
        })
    }

    pub fn render(&self, f: &mut Frame, area: Rect, title: &str) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        let Some(([x0, x1], [y0, y1])) = self.bounds() else {
            let txt = Paragraph::new("Brak danych prognozy").block(block).wrap(Wrap { trim: true });
            f.render_widget(txt, area);
            return;
        };

        let label = |x: f64| date_from_day(x).map(|d| d.format("%m/%y").to_string()).unwrap_or_default();
        let datasets = vec![
            Dataset::default()
                .name("Forecast")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(FORECAST_COLOR))
                .data(&self.forecast),
            Dataset::default()
                .name("Weekly Sales")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SALES_COLOR))
                .data(&self.weekly_sales),
        ];
        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x0, x1.max(x0 + 1.0)])
                    .labels(vec![Span::raw(label(x0)), Span::raw(label(x1))]),
            )
            .y_axis(
                Axis::default()
                    .bounds([y0, y1.max(y0 + 1.0)])
                    .labels(vec![Span::raw(format!("{:.0}", y0)), Span::raw(format!("{:.0}", y1))]),
            );
        f.render_widget(chart, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: &str, forecast: f64, sales: f64) -> ForecastRecord {
        ForecastRecord { date: date.to_string(), forecast, weekly_sales: sales }
    }

    #[test]
    fn test_duplicate_dates_keep_first() {
        let s = forecast_series(&[
            rec("2011-01-07", 10.0, 11.0),
            rec("2011-01-14", 20.0, 21.0),
            rec("2011-01-07", 99.0, 99.0),
        ]);
        assert_eq!(s.forecast.len(), 2);
        assert_eq!(s.forecast[0].1, 10.0);
        assert_eq!(s.weekly_sales[1].1, 21.0);
        assert!(s.forecast[0].0 < s.forecast[1].0);
        assert_eq!(s.forecast[1].0 - s.forecast[0].0, 7.0);
    }

    #[test]
    fn test_bad_dates_skipped() {
        let s = forecast_series(&[rec("soon", 1.0, 1.0), rec("2011-02-04", 2.0, 3.0)]);
        assert_eq!(s.forecast.len(), 1);
        assert_eq!(s.bounds(), Some(([s.forecast[0].0; 2], [2.0, 3.0])));
    }

    #[test]
    fn test_empty_series() {
        let s = forecast_series(&[]);
        assert!(s.is_empty());
        assert_eq!(s.bounds(), None);
    }

    #[test]
    fn test_day_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2012, 10, 26).unwrap();
        assert_eq!(date_from_day(day_number(d)), Some(d));
    }
}
