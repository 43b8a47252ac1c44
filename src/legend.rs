//! Legenda skali kolorów: dyskretne segmenty (wartość, kolor) i widżet paska.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

use crate::color::{ColorSample, color_for, round_half_up};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegendSegment {
    pub representative_value: f64,
    pub color: ColorSample,
}

fn round_to_nearest_hundred(value: f64) -> f64 {
    round_half_up(value / 100.0) * 100.0
}

/// `num_segments` wpisów legendy próbkowanych liniowo w `[min, max]`.
///
/// Wartość zaokrąglana do pełnych setek, kolor liczony z wartości po
/// zaokrągleniu. Jeden segment daje pojedynczy wpis dla `min`.
pub fn build_legend(min: f64, max: f64, num_segments: usize) -> Vec<LegendSegment> {
    let segment = |raw: f64| {
        let representative_value = round_to_nearest_hundred(raw);
        LegendSegment { representative_value, color: color_for(representative_value, min, max, None) }
    };

    match num_segments {
        0 => Vec::new(),
        1 => vec![segment(min)],
        n => {
            let last = (n - 1) as f64;
            (0..n).map(|i| segment(min + (i as f64 / last) * (max - min))).collect()
        }
    }
}

/// Pionowy pasek legendy: etykieta wartości po lewej, kolor po prawej.
/// Pierwszy segment (minimum) na górze.
pub struct LegendBar<'a> {
    segments: &'a [LegendSegment],
    block: Option<Block<'a>>,
    bar_width: u16,
}

impl<'a> LegendBar<'a> {
    pub fn new(segments: &'a [LegendSegment]) -> Self {
        Self { segments, block: None, bar_width: 4 }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for LegendBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.height == 0 || inner.width == 0 || self.segments.is_empty() {
            return;
        }

        let n = self.segments.len();
        let bar_width = self.bar_width.min(inner.width);
        let label_width = inner.width - bar_width;
        let mut last_idx = None;

        for row in 0..inner.height {
            let idx = (row as usize * n) / inner.height as usize;
            let seg = &self.segments[idx];
            let y = inner.y + row;

            let bar = Rect { x: inner.x + label_width, y, width: bar_width, height: 1 };
            buf.set_style(bar, Style::default().bg(seg.color.to_tui()));

            if last_idx != Some(idx) && label_width > 1 {
                let label = format!("{:.0}", seg.representative_value);
                let w = label_width as usize - 1;
                let text = format!("{:>w$}", label, w = w);
                buf.set_string(inner.x, y, text, Style::default());
            }
            last_idx = Some(idx);
        }
    }
}
