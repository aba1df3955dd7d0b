//! Palette colours for particles and connective lines.

use crate::error::SettingsError;

/// 8-bit RGB triple. Alpha travels separately with each draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const INDIGO: Rgb = Rgb::new(0x63, 0x66, 0xf1);
    pub const VIOLET: Rgb = Rgb::new(0x8b, 0x5c, 0xf6);
    pub const ORANGE: Rgb = Rgb::new(0xf9, 0x73, 0x16);
    pub const ASH: Rgb = Rgb::new(0xd1, 0xd5, 0xdb);
    pub const GRAY: Rgb = Rgb::new(0x6b, 0x72, 0x80);

    /// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
    pub fn from_hex(text: &str) -> Result<Self, SettingsError> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        let bytes = digits.as_bytes();

        let nibble = |c: u8| -> Result<u8, SettingsError> {
            match c {
                b'0'..=b'9' => Ok(c - b'0'),
                b'a'..=b'f' => Ok(c - b'a' + 10),
                b'A'..=b'F' => Ok(c - b'A' + 10),
                _ => Err(SettingsError::InvalidColor),
            }
        };

        match bytes.len() {
            6 => Ok(Self::new(
                nibble(bytes[0])? << 4 | nibble(bytes[1])?,
                nibble(bytes[2])? << 4 | nibble(bytes[3])?,
                nibble(bytes[4])? << 4 | nibble(bytes[5])?,
            )),
            3 => {
                let r = nibble(bytes[0])?;
                let g = nibble(bytes[1])?;
                let b = nibble(bytes[2])?;
                Ok(Self::new(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            _ => Err(SettingsError::InvalidColor),
        }
    }

    /// Composites `self` at `alpha` over an opaque `background`.
    pub fn blend_over(self, background: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| -> u8 {
            let v = fg as f32 * a + bg as f32 * (1.0 - a);
            (v + 0.5) as u8
        };
        Rgb::new(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}
