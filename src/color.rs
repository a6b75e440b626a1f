use palette::{Hsl, IntoColor, Srgb};
use serde::{Serialize, Serializer};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Rgb – a palette entry
// ---------------------------------------------------------------------------

/// An opaque sRGB colour. Kept free of any GUI type so view models stay plain
/// data; the UI converts with [`Rgb::to_color32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let rgb: Srgb<u8> = hex
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidColor(hex.to_string()))?;
        Ok(Rgb(rgb.red, rgb.green, rgb.blue))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn to_color32(self) -> eframe::egui::Color32 {
        eframe::egui::Color32::from_rgb(self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Plotly's qualitative sequence.
const PLOTLY: &[&str] = &[
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Plotly's Dark24 qualitative sequence.
const DARK24: &[&str] = &[
    "#2E91E5", "#E15F99", "#1CA71C", "#FB0D0D", "#DA16E3", "#222A2A", "#B68100", "#750D86",
    "#EB663B", "#511CFB", "#00A08B", "#FB00D1", "#FC0080", "#B2828D", "#6C7C32", "#778AAE",
    "#862A16", "#A777F1", "#620042", "#1616A7", "#DA60CA", "#6C4516", "#0D2A63", "#AF0038",
];

/// Number of hues generated when a palette is configured empty.
const FALLBACK_HUES: usize = 12;

/// Ordered list of slice colours shared by every chart. Slice `i` gets colour
/// `i % len`, so the same rank has the same colour in every cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        let colors = PLOTLY
            .iter()
            .chain(DARK24)
            .filter_map(|hex| Rgb::from_hex(hex).ok())
            .collect();
        Palette { colors }
    }
}

impl Palette {
    /// Build a palette from `#rrggbb` strings. An empty list yields evenly
    /// spaced hues.
    pub fn from_hex<S: AsRef<str>>(hexes: &[S]) -> Result<Self, ConfigError> {
        if hexes.is_empty() {
            return Ok(Palette {
                colors: generate_palette(FALLBACK_HUES),
            });
        }
        let colors = hexes
            .iter()
            .map(|h| Rgb::from_hex(h.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Palette { colors })
    }

    /// Colour for the slice at `index`, cycling through the palette.
    pub fn color_at(&self, index: usize) -> Rgb {
        if self.is_empty() {
            return Rgb(128, 128, 128);
        }
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}
