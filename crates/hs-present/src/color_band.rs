//! Breakpoint color table for hail size buckets.
//!
//! Lookup is by exact key text first. A value that parses as a number above
//! the largest breakpoint takes the largest breakpoint's color. Anything else,
//! including values below the smallest breakpoint, has no color.

use serde::{Deserialize, Serialize};

use crate::error::{PresentError, PresentResult};

/// An RGB triple, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// One breakpoint as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEntry {
    pub key: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
struct Breakpoint {
    key: String,
    value: f64,
    color: Rgb,
}

/// Ordered breakpoint-to-color table. Keys are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBand {
    breakpoints: Vec<Breakpoint>,
}

const HAIL_SIZE_BAND: [(&str, f64, Rgb); 9] = [
    ("0.75", 0.75, Rgb(255, 237, 160)),
    ("1", 1.0, Rgb(254, 217, 118)),
    ("1.25", 1.25, Rgb(254, 178, 76)),
    ("1.5", 1.5, Rgb(253, 141, 60)),
    ("1.75", 1.75, Rgb(252, 78, 42)),
    ("2", 2.0, Rgb(227, 26, 28)),
    ("2.5", 2.5, Rgb(189, 0, 38)),
    ("3", 3.0, Rgb(128, 0, 38)),
    ("3.75", 3.75, Rgb(189, 0, 96)),
];

impl ColorBand {
    /// Build a band from `(key, color)` pairs in any order.
    ///
    /// Every key must parse as a finite number and no two keys may be equal.
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, Rgb)>) -> PresentResult<Self> {
        let mut breakpoints = Vec::new();
        for (key, color) in entries {
            let key = key.into();
            let value = parse_finite(&key).ok_or_else(|| PresentError::InvalidBand {
                what: format!("breakpoint key '{key}' is not a finite number"),
            })?;
            breakpoints.push(Breakpoint { key, value, color });
        }

        if breakpoints.is_empty() {
            return Err(PresentError::InvalidBand {
                what: "band has no breakpoints".to_string(),
            });
        }

        breakpoints.sort_by(|a, b| a.value.total_cmp(&b.value));
        for pair in breakpoints.windows(2) {
            if pair[0].value >= pair[1].value {
                return Err(PresentError::InvalidBand {
                    what: format!(
                        "breakpoints '{}' and '{}' are not strictly increasing",
                        pair[0].key, pair[1].key
                    ),
                });
            }
        }

        Ok(Self { breakpoints })
    }

    pub fn from_entries(entries: &[BandEntry]) -> PresentResult<Self> {
        Self::new(entries.iter().map(|e| (e.key.clone(), e.color)))
    }

    /// The hail diameter band (inches) used by the analysis panel.
    pub fn hail_size() -> Self {
        Self {
            breakpoints: HAIL_SIZE_BAND
                .iter()
                .map(|(key, value, color)| Breakpoint {
                    key: (*key).to_string(),
                    value: *value,
                    color: *color,
                })
                .collect(),
        }
    }

    /// Color for a discriminant value, if any.
    pub fn color_for(&self, value: &str) -> Option<Rgb> {
        if let Some(bp) = self.breakpoints.iter().find(|bp| bp.key == value) {
            return Some(bp.color);
        }
        let largest = self.breakpoints.last()?;
        match parse_finite(value) {
            Some(v) if v > largest.value => Some(largest.color),
            _ => None,
        }
    }

    pub fn largest(&self) -> Option<(&str, Rgb)> {
        self.breakpoints.last().map(|bp| (bp.key.as_str(), bp.color))
    }

    pub fn entries(&self) -> Vec<BandEntry> {
        self.breakpoints
            .iter()
            .map(|bp| BandEntry {
                key: bp.key.clone(),
                color: bp.color,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }
}

impl Default for ColorBand {
    fn default() -> Self {
        Self::hail_size()
    }
}

/// Free-function form of [`ColorBand::color_for`].
pub fn color_for(value: &str, band: &ColorBand) -> Option<Rgb> {
    band.color_for(value)
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_band() -> ColorBand {
        ColorBand::new([("0.75", Rgb(255, 255, 0)), ("3.75", Rgb(189, 0, 96))]).unwrap()
    }

    #[test]
    fn exact_key_returns_its_color() {
        let band = two_point_band();
        assert_eq!(band.color_for("0.75"), Some(Rgb(255, 255, 0)));
        assert_eq!(band.color_for("3.75"), Some(Rgb(189, 0, 96)));
    }

    #[test]
    fn above_largest_clamps_to_largest() {
        let band = two_point_band();
        assert_eq!(band.color_for("4.5"), Some(Rgb(189, 0, 96)));
        assert_eq!(band.color_for("100"), Some(Rgb(189, 0, 96)));
    }

    #[test]
    fn below_smallest_has_no_color() {
        let band = two_point_band();
        assert_eq!(band.color_for("0.5"), None);
        assert_eq!(band.color_for("-3"), None);
    }

    #[test]
    fn between_breakpoints_without_match_has_no_color() {
        let band = two_point_band();
        assert_eq!(band.color_for("2"), None);
    }

    #[test]
    fn non_numeric_has_no_color() {
        let band = two_point_band();
        assert_eq!(band.color_for("Total"), None);
        assert_eq!(band.color_for(""), None);
        assert_eq!(band.color_for("inf"), None);
        assert_eq!(band.color_for("NaN"), None);
    }

    #[test]
    fn match_is_by_key_text() {
        // "3.750" is numerically a breakpoint but not textually one, and it
        // is not above the largest either.
        let band = two_point_band();
        assert_eq!(band.color_for("3.750"), None);
    }

    #[test]
    fn entries_are_sorted_numerically() {
        let band = ColorBand::new([
            ("10", Rgb(3, 3, 3)),
            ("2", Rgb(2, 2, 2)),
            ("1", Rgb(1, 1, 1)),
        ])
        .unwrap();
        let keys: Vec<_> = band.entries().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["1", "2", "10"]);
        assert_eq!(band.largest(), Some(("10", Rgb(3, 3, 3))));
    }

    #[test]
    fn rejects_bad_bands() {
        let empty: [(&str, Rgb); 0] = [];
        assert!(ColorBand::new(empty).is_err());
        assert!(ColorBand::new([("x", Rgb(0, 0, 0))]).is_err());
        assert!(ColorBand::new([("1", Rgb(0, 0, 0)), ("1.0", Rgb(1, 1, 1))]).is_err());
    }

    #[test]
    fn builtin_band_is_valid() {
        let rebuilt = ColorBand::from_entries(&ColorBand::hail_size().entries()).unwrap();
        assert_eq!(rebuilt, ColorBand::hail_size());
        assert_eq!(rebuilt.color_for("4.5"), Some(Rgb(189, 0, 96)));
    }

    #[test]
    fn hex_form() {
        assert_eq!(Rgb(189, 0, 96).hex(), "#bd0060");
    }
}
