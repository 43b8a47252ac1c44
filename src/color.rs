//! Skala kolorów: wartość sprzedaży → kolor RGBA.
//!
//! Dwa odcinki interpolacji liniowej: czerwony → żółty (dolna połowa
//! zakresu) i żółty → zielony (górna połowa). Współczynnik nie jest
//! przycinany do [0, 1], więc wartości spoza zakresu ekstrapolują kanały
//! poza [0, 255]. Przycięcie do bajtów następuje dopiero przy rysowaniu
//! (`ColorSample::to_tui`).

use ratatui::style::Color;

use crate::movement::GeoCoordinate;

pub const LOW_COLOR: [i32; 3] = [255, 0, 0];
pub const MID_COLOR: [i32; 3] = [255, 255, 0];
pub const HIGH_COLOR: [i32; 3] = [0, 255, 0];

/// Kolor zaznaczonego punktu na mapie.
pub const SELECTED_COLOR: ColorSample = ColorSample::opaque(57, 117, 206);
/// Kolor punktu bez danych o zakresie.
pub const DEFAULT_COLOR: ColorSample = ColorSample::opaque(169, 169, 169);

/// Próbka koloru. Kanały są `i32`, bo ekstrapolacja może wyjść poza bajt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorSample {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

impl ColorSample {
    pub const fn opaque(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn channels(&self) -> [i32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Czy każdy kanał mieści się w bajcie.
    pub fn is_byte_range(&self) -> bool {
        self.channels().iter().all(|c| (0..=255).contains(c))
    }

    /// Kolor terminala. Terminal nie zna przezroczystości, więc alfa jest
    /// mnożona na czarne tło.
    pub fn to_tui(&self) -> Color {
        let a = self.a.clamp(0, 255);
        let blend = |c: i32| (c.clamp(0, 255) * a / 255) as u8;
        Color::Rgb(blend(self.r), blend(self.g), blend(self.b))
    }
}

/// Zaokrąglenie jak w przeglądarce: połówki w stronę +∞.
pub fn round_half_up(x: f64) -> f64 {
    let f = x.floor();
    if x - f >= 0.5 { f + 1.0 } else { f }
}

fn interpolate(start: i32, end: i32, factor: f64) -> i32 {
    round_half_up(start as f64 + (end - start) as f64 * factor) as i32
}

fn mix(from: [i32; 3], to: [i32; 3], factor: f64, alpha: i32) -> ColorSample {
    ColorSample {
        r: interpolate(from[0], to[0], factor),
        g: interpolate(from[1], to[1], factor),
        b: interpolate(from[2], to[2], factor),
        a: alpha,
    }
}

/// Kolor wartości `value` na skali czerwony → żółty → zielony w `[min, max]`.
///
/// `opacity` zastępuje kanał alfa (domyślnie 255). Dla `min == max`
/// każda wartość dostaje kolor środkowy.
pub fn color_for(value: f64, min: f64, max: f64, opacity: Option<u8>) -> ColorSample {
    let alpha = opacity.map_or(255, i32::from);
    if min == max {
        return mix(MID_COLOR, MID_COLOR, 0.0, alpha);
    }

    let mid = (min + max) / 2.0;
    if value <= mid {
        let factor = (value - min) / (mid - min);
        mix(LOW_COLOR, MID_COLOR, factor, alpha)
    } else {
        let factor = (value - mid) / (max - mid);
        mix(MID_COLOR, HIGH_COLOR, factor, alpha)
    }
}

/// Zakres wartości metryki w bieżącym zbiorze rekordów.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// `None` dla pustego zbioru (i dla samych NaN).
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<Self>, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(r) => Some(Self { min: r.min.min(v), max: r.max.max(v) }),
            })
    }

    pub fn of_points<'a, P: SalesPoint + 'a, I: IntoIterator<Item = &'a P>>(points: I) -> Option<Self> {
        Self::from_values(points.into_iter().map(|p| p.sales()))
    }

    pub fn color(&self, value: f64, opacity: Option<u8>) -> ColorSample {
        color_for(value, self.min, self.max, opacity)
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Minimalny kształt rekordu potrzebny mapie: położenie i metryka sprzedaży.
pub trait SalesPoint {
    fn coordinate(&self) -> GeoCoordinate;
    fn sales(&self) -> f64;
}
