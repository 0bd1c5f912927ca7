use serde::{Deserialize, Serialize};

/// Where a brush takes its color from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushColor {
    /// Index into the active [`Palette`].
    Palette(u8),
    /// Straight RGBA.
    Fixed([u8; 4]),
}

impl BrushColor {
    pub fn resolve(&self, palette: &Palette) -> [u8; 4] {
        match self {
            BrushColor::Palette(idx) => palette.color(*idx),
            BrushColor::Fixed(rgba) => *rgba,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushShape {
    Round,
    Square,
}

/// 8×8 one-bit tiles used by pattern brushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternId {
    Checker,
    Dots,
    Stripes,
    Diagonal,
    Crosshatch,
    Bricks,
}

pub const PATTERN_TILE_SIZE: i32 = 8;

impl PatternId {
    pub const ALL: [PatternId; 6] = [
        PatternId::Checker,
        PatternId::Dots,
        PatternId::Stripes,
        PatternId::Diagonal,
        PatternId::Crosshatch,
        PatternId::Bricks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternId::Checker => "Checker",
            PatternId::Dots => "Dots",
            PatternId::Stripes => "Stripes",
            PatternId::Diagonal => "Diagonal",
            PatternId::Crosshatch => "Crosshatch",
            PatternId::Bricks => "Bricks",
        }
    }

    /// Rows of the tile, most significant bit is the leftmost pixel.
    fn rows(&self) -> [u8; 8] {
        match self {
            PatternId::Checker => [
                0b1010_1010,
                0b0101_0101,
                0b1010_1010,
                0b0101_0101,
                0b1010_1010,
                0b0101_0101,
                0b1010_1010,
                0b0101_0101,
            ],
            PatternId::Dots => [
                0b1000_1000,
                0b0000_0000,
                0b0010_0010,
                0b0000_0000,
                0b1000_1000,
                0b0000_0000,
                0b0010_0010,
                0b0000_0000,
            ],
            PatternId::Stripes => [
                0b1111_1111,
                0b0000_0000,
                0b0000_0000,
                0b1111_1111,
                0b0000_0000,
                0b0000_0000,
                0b1111_1111,
                0b0000_0000,
            ],
            PatternId::Diagonal => [
                0b1000_0001,
                0b0100_0000,
                0b0010_0000,
                0b0001_0000,
                0b0000_1000,
                0b0000_0100,
                0b0000_0010,
                0b0000_0001,
            ],
            PatternId::Crosshatch => [
                0b1000_0001,
                0b0100_0010,
                0b0010_0100,
                0b0001_1000,
                0b0001_1000,
                0b0010_0100,
                0b0100_0010,
                0b1000_0001,
            ],
            PatternId::Bricks => [
                0b1111_1111,
                0b1000_0000,
                0b1000_0000,
                0b1000_0000,
                0b1111_1111,
                0b0000_1000,
                0b0000_1000,
                0b0000_1000,
            ],
        }
    }

    /// Tile bit at an arbitrary (possibly negative) pixel position; the tile
    /// repeats in both directions.
    pub fn sample(&self, x: i32, y: i32) -> bool {
        let tx = x.rem_euclid(PATTERN_TILE_SIZE) as u32;
        let ty = y.rem_euclid(PATTERN_TILE_SIZE) as usize;
        (self.rows()[ty] >> (7 - tx)) & 1 == 1
    }
}

/// Brush used for a stroke. Fixed at stroke creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrushSettings {
    Solid {
        color: BrushColor,
        width: f32,
        opacity: f32,
        shape: BrushShape,
    },
    Pattern {
        color: BrushColor,
        width: f32,
        opacity: f32,
        pattern: PatternId,
    },
}

impl BrushSettings {
    pub fn pen(color: BrushColor, width: f32) -> Self {
        BrushSettings::Solid {
            color,
            width,
            opacity: 1.0,
            shape: BrushShape::Round,
        }
    }

    pub fn pattern(color: BrushColor, width: f32, pattern: PatternId) -> Self {
        BrushSettings::Pattern {
            color,
            width,
            opacity: 1.0,
            pattern,
        }
    }

    pub fn color(&self) -> BrushColor {
        match self {
            BrushSettings::Solid { color, .. } | BrushSettings::Pattern { color, .. } => *color,
        }
    }

    /// Footprint diameter in pixels, never below one.
    pub fn width(&self) -> f32 {
        let w = match self {
            BrushSettings::Solid { width, .. } | BrushSettings::Pattern { width, .. } => *width,
        };
        if w.is_finite() {
            w.max(1.0)
        } else {
            1.0
        }
    }

    pub fn opacity(&self) -> f32 {
        let o = match self {
            BrushSettings::Solid { opacity, .. } | BrushSettings::Pattern { opacity, .. } => {
                *opacity
            }
        };
        if o.is_finite() {
            o.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Pattern brushes always stamp round footprints.
    pub fn shape(&self) -> BrushShape {
        match self {
            BrushSettings::Solid { shape, .. } => *shape,
            BrushSettings::Pattern { .. } => BrushShape::Round,
        }
    }

    pub fn pattern_id(&self) -> Option<PatternId> {
        match self {
            BrushSettings::Pattern { pattern, .. } => Some(*pattern),
            BrushSettings::Solid { .. } => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, BrushSettings::Pattern { .. })
    }
}

impl Default for BrushSettings {
    fn default() -> Self {
        BrushSettings::pen(BrushColor::Palette(1), 3.0)
    }
}

/// Ordered list of RGBA colors that palette-indexed brushes resolve against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<[u8; 4]>,
}

impl Palette {
    /// Out-of-range indices fall back to the first entry.
    pub fn color(&self, idx: u8) -> [u8; 4] {
        self.colors
            .get(idx as usize)
            .or_else(|| self.colors.first())
            .copied()
            .unwrap_or([0, 0, 0, 255])
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                [255, 255, 255, 255],
                [24, 20, 37, 255],
                [228, 59, 68, 255],
                [247, 118, 34, 255],
                [254, 231, 97, 255],
                [99, 199, 77, 255],
                [0, 149, 233, 255],
                [181, 80, 136, 255],
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_falls_back_to_first_entry() {
        let palette = Palette::default();
        assert_eq!(palette.color(2), [228, 59, 68, 255]);
        assert_eq!(palette.color(200), palette.colors[0]);
        let empty = Palette { colors: Vec::new() };
        assert_eq!(empty.color(0), [0, 0, 0, 255]);
    }

    #[test]
    fn tiles_repeat_across_negative_coordinates() {
        for pattern in PatternId::ALL {
            for y in -16..16 {
                for x in -16..16 {
                    assert_eq!(
                        pattern.sample(x, y),
                        pattern.sample(x + PATTERN_TILE_SIZE, y - PATTERN_TILE_SIZE)
                    );
                }
            }
        }
        assert!(PatternId::Checker.sample(0, 0));
        assert!(!PatternId::Checker.sample(1, 0));
        assert!(PatternId::Checker.sample(-1, 1));
    }

    #[test]
    fn width_and_opacity_are_sanitised() {
        let b = BrushSettings::Solid {
            color: BrushColor::Fixed([1, 2, 3, 255]),
            width: 0.2,
            opacity: 3.0,
            shape: BrushShape::Square,
        };
        assert_eq!(b.width(), 1.0);
        assert_eq!(b.opacity(), 1.0);
        assert_eq!(b.shape(), BrushShape::Square);
        assert!(!b.is_pattern());
    }

    #[test]
    fn brush_serializes_with_type_tag() {
        let b = BrushSettings::pattern(BrushColor::Palette(3), 6.0, PatternId::Dots);
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("\"type\":\"pattern\""));
        let back: BrushSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
