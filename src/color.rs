//! Stable kind -> fill color assignment for fallback boxes. The color is a
//! pure function of the kind string (FNV-1a hash into a hue), so the same
//! kind gets the same color within a diagram and across runs. `ColorMap` is
//! a per-render memo table; concurrent renders each build their own.

use std::collections::HashMap;

const SATURATION: f32 = 0.7;
const VALUE: f32 = 0.95;

#[derive(Debug, Default)]
pub struct ColorMap {
    colors: HashMap<String, String>,
}

impl ColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, kind: &str) -> String {
        self.colors
            .entry(kind.to_string())
            .or_insert_with(|| fallback_color(kind))
            .clone()
    }
}

/// Hex fill for a kind, independent of any map state.
pub fn fallback_color(kind: &str) -> String {
    let hue = (fnv1a(kind.as_bytes()) % 360) as f32 / 360.0;
    let (r, g, b) = hsv_to_rgb(hue, SATURATION, VALUE);
    format!(
        "#{:02x}{:02x}{:02x}",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8
    )
}

// FNV-1a: std's DefaultHasher makes no cross-version stability promise, and
// the color contract is cross-run.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x1000_0000_01b3);
    }
    hash
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s <= 0.0 {
        return (v, v, v);
    }
    let h = (h.fract() + 1.0).fract() * 6.0;
    let sector = h.floor() as i32 % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}
