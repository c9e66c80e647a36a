//! Draw-list commands
//!
//! The engines never touch pixels. Each frame they emit a list of
//! commands which the platform glue replays onto whatever surface it
//! owns (a 2d canvas in the browser build).

use serde::{Deserialize, Serialize};

/// RGB color with separate alpha, renderer-agnostic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const GREEN: Rgba = Rgba::rgb(0, 255, 0);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
}

/// Vertical text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextBaseline {
    Alphabetic,
    Middle,
}

/// One renderer command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCmd {
    /// Fill the whole surface
    Clear { color: Rgba },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        r: f32,
        color: Rgba,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        px: f32,
        align: TextAlign,
        baseline: TextBaseline,
        color: Rgba,
    },
}
