//! The text field placed on the template
//!
//! A `FieldConfig` is the editor's snapshot at the moment generation is
//! requested. It is serialized in the editor's camelCase JSON shape.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CertGenError;
use crate::geometry::ViewportRect;

/// Identifier the editor uses for the decorative script font
pub const DECORATIVE_FONT_ID: &str = "var(--font-great-vibes)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// RGB color with channels normalized to 0-1
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parse "#RRGGBB" / "RRGGBB" (and the "#RGB" shorthand)
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .ok()
                .map(|v| v as f64 / 255.0)
        };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorInput {
            Hex(String),
            Channels { r: f64, g: f64, b: f64 },
        }

        Ok(match ColorInput::deserialize(deserializer)? {
            // Unparseable hex renders black, like the editor does
            ColorInput::Hex(hex) => Rgb::from_hex(&hex).unwrap_or(Rgb::BLACK),
            ColorInput::Channels { r, g, b } => Rgb { r, g, b }.clamped(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    pub color: Rgb,
    #[serde(default)]
    pub alignment: Alignment,
    /// Sample text shown in the editor; never drawn by generation
    #[serde(default)]
    pub text: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            width: 200.0,
            height: 50.0,
            font_size: 24.0,
            font_family: DECORATIVE_FONT_ID.to_string(),
            font_weight: FontWeight::Normal,
            color: Rgb {
                r: 17.0 / 255.0,
                g: 17.0 / 255.0,
                b: 17.0 / 255.0,
            },
            alignment: Alignment::Center,
            text: "Participant Name".to_string(),
        }
    }
}

impl FieldConfig {
    pub fn rect(&self) -> ViewportRect {
        ViewportRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Reject degenerate geometry before any generation work starts
    pub fn validate(&self) -> Result<(), CertGenError> {
        let numbers = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("fontSize", self.font_size),
        ];
        for (name, value) in numbers {
            if !value.is_finite() {
                return Err(CertGenError::InvalidField(format!(
                    "{} must be a finite number",
                    name
                )));
            }
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CertGenError::InvalidField(
                "Field width and height must be positive".into(),
            ));
        }
        if self.font_size <= 0.0 {
            return Err(CertGenError::InvalidField(
                "Font size must be positive".into(),
            ));
        }
        Ok(())
    }
}
