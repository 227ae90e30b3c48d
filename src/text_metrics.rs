//! Text width measurement backed by the system font database. Used for
//! caption and edge-label sizing; when no matching face can be loaded
//! (headless machines, containers) an approximate per-character width keeps
//! layout working and deterministic.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Average glyph advance as a fraction of font size, for the approximate
/// path and for glyphs missing from a loaded face.
const FALLBACK_CHAR_FACTOR: f32 = 0.56;

static MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width in px of `text` at `font_size`. Never fails; falls back to the
/// approximate width when the font stack cannot be resolved.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    let measured = MEASURER
        .lock()
        .ok()
        .and_then(|mut measurer| measurer.measure(text, font_size, font_family));
    measured.unwrap_or_else(|| approximate_width(text, font_size))
}

pub fn approximate_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|c| *c != '\n').count() as f32 * font_size * FALLBACK_CHAR_FACTOR
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get(&key)?.as_ref()?;
        face.measure(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        for part in font_family.split(',').chain(std::iter::once("sans-serif")) {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            let family = match raw.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(raw),
            };
            let query = Query {
                families: &[family],
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let Some(id) = self.db.query(&query) else {
                continue;
            };
            let mut loaded = None;
            self.db.with_face_data(id, |data, index| {
                if let Ok(face) = Face::parse(data, index) {
                    loaded = Some(LoadedFace {
                        data: data.to_vec(),
                        index,
                        units_per_em: face.units_per_em().max(1),
                    });
                }
            });
            if loaded.is_some() {
                return loaded;
            }
        }
        None
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
}

impl LoadedFace {
    fn measure(&self, text: &str, font_size: f32) -> Option<f32> {
        // Face borrows the byte buffer, so it is re-parsed per call instead
        // of being self-referentially cached. ttf-parser's parse is a cheap
        // header read.
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_CHAR_FACTOR;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = face
                .glyph_index(ch)
                .and_then(|id| face.glyph_hor_advance(id));
            match advance {
                Some(advance) => width += advance as f32 * scale,
                None => width += fallback,
            }
        }
        Some(width.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(text_width("", 13.0, "sans-serif"), 0.0);
    }

    #[test]
    fn width_grows_with_text() {
        let short = text_width("ab", 13.0, "sans-serif");
        let long = text_width("abcdefgh", 13.0, "sans-serif");
        assert!(long > short);
    }

    #[test]
    fn approximate_width_ignores_newlines() {
        let flat = approximate_width("abcd", 10.0);
        let broken = approximate_width("ab\ncd", 10.0);
        assert_eq!(flat, broken);
    }

    #[test]
    fn measurement_is_repeatable() {
        let a = text_width("CloudWatch", 13.0, "sans-serif");
        let b = text_width("CloudWatch", 13.0, "sans-serif");
        assert_eq!(a, b);
    }
}
