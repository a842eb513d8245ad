use std::collections::HashMap;

use glam::DVec3;

use crate::config::{LABEL_DEPTH, LABEL_SIZE, LABEL_Z};
use crate::map::geometry::Aabb;

/// Glyph metrics of a typeface font
#[derive(Clone, Debug)]
pub struct LabelFont {
    pub family: String,
    /// Font units per em
    pub resolution: f64,
    /// Horizontal advance per glyph, in font units
    pub advances: HashMap<char, f64>,
}

impl LabelFont {
    /// Lay out `text` at `size`, returning the printable text and its width.
    /// Characters without a glyph fall back to `?`, or are dropped when the
    /// font has no `?` either.
    pub fn layout(&self, text: &str, size: f64) -> (String, f64) {
        let scale = size / self.resolution.max(f64::EPSILON);
        let mut out = String::with_capacity(text.len());
        let mut width = 0.0;

        for ch in text.chars() {
            let glyph = self
                .advances
                .get(&ch)
                .map(|&ha| (ch, ha))
                .or_else(|| self.advances.get(&'?').map(|&ha| ('?', ha)));
            if let Some((ch, ha)) = glyph {
                out.push(ch);
                width += ha * scale;
            }
        }
        (out, width)
    }
}

/// Pending label for a region, positioned in local map space
#[derive(Clone, Debug, PartialEq)]
pub struct LabelRequest {
    pub text: String,
    pub position: DVec3,
    pub size: f64,
    pub depth: f64,
}

impl LabelRequest {
    /// Request a label at a projected anchor (screen-convention y)
    pub fn at_projected(text: &str, x: f64, y: f64) -> Self {
        Self {
            text: text.to_string(),
            position: DVec3::new(x, -y, LABEL_Z),
            size: LABEL_SIZE,
            depth: LABEL_DEPTH,
        }
    }

    pub fn resolve(&self, font: &LabelFont) -> TextLabel {
        let (text, width) = font.layout(&self.text, self.size);
        let bounds = Aabb {
            min: self.position,
            max: self.position + DVec3::new(width, self.size, self.depth),
        };
        TextLabel {
            text,
            position: self.position,
            bounds,
        }
    }
}

/// Label text mesh stand-in: laid out text plus its extent
#[derive(Clone, Debug)]
pub struct TextLabel {
    pub text: String,
    pub position: DVec3,
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
pub enum LabelSlot {
    /// Waiting for the font
    Pending(LabelRequest),
    Ready(TextLabel),
    /// Font failed or the region has no vertices to anchor on
    Unavailable,
}

impl LabelSlot {
    pub fn ready(&self) -> Option<&TextLabel> {
        match self {
            LabelSlot::Ready(label) => Some(label),
            _ => None,
        }
    }
}
