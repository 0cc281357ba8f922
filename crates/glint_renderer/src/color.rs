//! Channel-wise color helpers.
//!
//! Light values are colors too: RGB carries energy, alpha is left to the
//! caller.

use glint_math::Color;

/// Scale RGB, keep alpha.
#[inline]
pub fn scale_rgb(c: Color, s: f64) -> Color {
    Color::new(c.x * s, c.y * s, c.z * s, c.w)
}

/// Multiply RGB channel by channel, keep the first color's alpha.
#[inline]
pub fn mul_rgb(a: Color, b: Color) -> Color {
    Color::new(a.x * b.x, a.y * b.y, a.z * b.z, a.w)
}

/// Sum of the RGB channels (the edge detector's brightness measure).
#[inline]
pub fn rgb_sum(c: Color) -> f64 {
    c.x + c.y + c.z
}

/// Channel-wise mean; zero for an empty set.
pub fn average(colors: impl IntoIterator<Item = Color>) -> Color {
    let mut total = Color::ZERO;
    let mut count = 0usize;
    for c in colors {
        total += c;
        count += 1;
    }
    if count == 0 {
        Color::ZERO
    } else {
        total / count as f64
    }
}
