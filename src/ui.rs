use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::date_range::Handle;
use crate::legend::LegendBar;
use crate::map_draw::LayerMode;
use crate::state::{AppState, Filter, Panel};

fn panel_block(title: &str, active: bool) -> Block<'static> {
    let style = if active { Style::default().fg(Color::Yellow) } else { Style::default() };
    Block::default().borders(Borders::ALL).border_style(style).title(title.to_string())
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(50), Constraint::Percentage(25)])
        .split(f.area());

    draw_left(f, state, chunks[0]);
    draw_center(f, state, chunks[1]);
    draw_right(f, state, chunks[2]);
}

fn draw_left(f: &mut Frame, state: &AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    // Wyszukiwarka
    let (text, style) = match (&state.search_input, &state.filter) {
        (Some(input), _) => (format!("{}_", input), Style::default().fg(Color::Yellow)),
        (None, Filter::Search(text)) => (text.clone(), Style::default()),
        (None, _) => ("/ aby szukać".to_string(), Style::default().fg(Color::DarkGray)),
    };
    let search = Paragraph::new(text).style(style).block(panel_block("Szukaj", state.search_input.is_some()));
    f.render_widget(search, parts[0]);

    // Lista rekordów
    let items: Vec<ListItem> = state
        .list_items
        .iter()
        .map(|r| {
            let mark = if state.selected_ids.contains(&r.id) { "● " } else { "  " };
            ListItem::new(format!("{}{} ({:.0})", mark, r.title, r.avg_weekly_sales))
        })
        .collect();
    let title = match &state.filter {
        Filter::Nearby => "W pobliżu".to_string(),
        Filter::Search(_) => format!("Wyniki ({})", state.list_items.len()),
        Filter::DateRange(start, end) => format!("{} – {}", start, end),
    };
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list = List::new(items)
        .block(panel_block(&title, state.active_panel == Panel::List))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, parts[1], &mut list_state);
}

fn draw_center(f: &mut Frame, state: &AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let mode = match state.mode {
        LayerMode::Scatter => "punkty",
        LayerMode::Heatmap => "heatmapa",
    };
    let marker = if state.active_panel == Panel::Map { "*" } else { "" };
    let title = format!("Mapa{} ({}, {} rekordów)", marker, mode, state.map_records.len());
    state.basemap.render(f, parts[0], &title, &state.viewport, state.layer());

    let c = state.viewport.center;
    let status = format!(
        "{:.4}, {:.4}  zakres {:.1}°  próg {:.0} km{}",
        c.lat,
        c.long,
        state.viewport.span_degrees,
        state.gate.threshold_meters() / 1000.0,
        if state.loading { "  ładowanie…" } else { "" }
    );
    f.render_widget(Paragraph::new(status).style(Style::default().fg(Color::DarkGray)), parts[1]);
}

fn draw_right(f: &mut Frame, state: &AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Min(4),
        ])
        .split(area);

    // — Informacje
    let info_text = match state.highlighted() {
        Some(r) => format!(
            "{}\n{}\nSprzedaż (śr.): {:.0}\nSprzedaż tyg.: {:.0}\nOdległość: {}",
            r.title,
            r.description,
            r.avg_weekly_sales,
            r.weekly_sales,
            r.distance.map_or("-".to_string(), |d| format!("{:.1} km", d / 1000.0)),
        ),
        None => format!("{}\n\n{}", state.info, AppState::HELP_TEXT),
    };
    let info = Paragraph::new(info_text).block(panel_block("Informacje", false)).wrap(Wrap { trim: true });
    f.render_widget(info, parts[0]);

    // — Wykres
    state.highlighted_series().render(f, parts[1], "Prognoza i sprzedaż");

    // — Legenda
    let legend = LegendBar::new(state.legend()).block(panel_block("Legenda", false));
    f.render_widget(legend, parts[2]);

    // — Zakres dat
    let dates_text = match &state.dates {
        Some(slider) => {
            let (lo, hi) = slider.positions();
            let (start, end) = slider.selected_range();
            let active = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
            let (lo_style, hi_style) = match slider.active() {
                Handle::Lower => (active, Style::default()),
                Handle::Upper => (Style::default(), active),
            };
            vec![
                Line::from(slider.labels().join(" ")),
                Line::from(vec![
                    Span::styled(format!("[{}]", lo), lo_style),
                    Span::raw(" – "),
                    Span::styled(format!("[{}]", hi), hi_style),
                ]),
                Line::from(format!("{} do {}", start, end)),
            ]
        }
        None => vec![Line::from("Brak dat prognozy")],
    };
    let dates = Paragraph::new(dates_text)
        .block(panel_block("Zakres dat", state.active_panel == Panel::Dates))
        .wrap(Wrap { trim: true });
    f.render_widget(dates, parts[3]);
}
