#![forbid(unsafe_code)]

//! RGBA color model.
//!
//! Colors are four `f32` channels in `[0.0, 1.0]`, stored as **straight
//! alpha** (RGB not pre-multiplied). Construction helpers accept float
//! channels, 8-bit integer channels, and hex strings; everything past the API
//! boundary works on the resolved [`Rgba`] value only.

use core::fmt;
use core::str::FromStr;

/// A floating-point RGBA color.
///
/// The default is fully transparent black.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel (1.0 = opaque).
    pub a: f32,
}

impl Rgba {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    /// Opaque yellow.
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    /// Opaque cyan.
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    /// Opaque magenta.
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    /// Opaque mid gray.
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);

    /// Create a color from float channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from float channels (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Create a color from 8-bit channels.
    #[inline]
    pub fn from_ints(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Create an opaque color from 8-bit channels.
    #[inline]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::from_ints(r, g, b, 255)
    }

    /// Parse a hex color: `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`.
    ///
    /// The leading `#` is optional.
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigit(input.to_owned()));
        }

        let nibble = |i: usize| -> Result<u8, ColorParseError> {
            u8::from_str_radix(&hex[i..=i], 16)
                .map(|v| v * 17)
                .map_err(|_| ColorParseError::InvalidDigit(input.to_owned()))
        };
        let byte = |i: usize| -> Result<u8, ColorParseError> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ColorParseError::InvalidDigit(input.to_owned()))
        };

        match hex.len() {
            3 => Ok(Self::from_ints(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
            4 => Ok(Self::from_ints(
                nibble(0)?,
                nibble(1)?,
                nibble(2)?,
                nibble(3)?,
            )),
            6 => Ok(Self::from_ints(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::from_ints(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            len => Err(ColorParseError::InvalidLength(len)),
        }
    }

    /// Quantize to 8-bit channels (clamped, rounded).
    #[inline]
    pub fn to_ints(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_ints();
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }

    /// `true` when the color is not fully opaque.
    #[inline]
    pub fn has_alpha(self) -> bool {
        self.a < 1.0
    }

    /// `true` when alpha is exactly zero.
    #[inline]
    pub fn is_transparent(self) -> bool {
        self.a == 0.0
    }

    /// Return a copy with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Perceived luminance (Rec. 601 weights), ignoring alpha.
    #[inline]
    pub fn luminance(self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Apply `f` to the RGB channels, leaving alpha untouched.
    #[inline]
    pub fn map_rgb(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b), self.a)
    }

    /// Channels as an array `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build from an array `[r, g, b, a]`.
    #[inline]
    pub const fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    /// Bitwise equality of all four channels.
    ///
    /// Unlike `==`, distinguishes `0.0` from `-0.0` and treats identical NaN
    /// payloads as equal, which is what change detection wants.
    #[inline]
    pub fn bits_eq(&self, other: &Self) -> bool {
        (self.r.to_bits() == other.r.to_bits())
            & (self.g.to_bits() == other.g.to_bits())
            & (self.b.to_bits() == other.b.to_bits())
            & (self.a.to_bits() == other.a.to_bits())
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(value: [f32; 4]) -> Self {
        Self::from_array(value)
    }
}

impl From<(u8, u8, u8)> for Rgba {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::from_rgb_u8(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Rgba {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::from_ints(r, g, b, a)
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Hex color parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Digit count other than 3, 4, 6, or 8.
    InvalidLength(usize),
    /// Non-hex character in the input.
    InvalidDigit(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => {
                write!(f, "hex color must have 3, 4, 6, or 8 digits, got {len}")
            }
            Self::InvalidDigit(input) => write!(f, "invalid hex color: {input:?}"),
        }
    }
}

impl std::error::Error for ColorParseError {}

/// Color as supplied by a caller, before resolution.
///
/// Resolved once at the API boundary into an [`Rgba`]; drawing loops never see
/// this type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorInput {
    /// Already-resolved color.
    Rgba(Rgba),
    /// Hex string such as `"#ff8800"`.
    Hex(String),
}

impl ColorInput {
    /// Resolve to a concrete color.
    pub fn resolve(&self) -> Result<Rgba, ColorParseError> {
        match self {
            Self::Rgba(c) => Ok(*c),
            Self::Hex(s) => Rgba::from_hex(s),
        }
    }
}

impl From<Rgba> for ColorInput {
    fn from(value: Rgba) -> Self {
        Self::Rgba(value)
    }
}

impl From<&str> for ColorInput {
    fn from(value: &str) -> Self {
        Self::Hex(value.to_owned())
    }
}

impl From<String> for ColorInput {
    fn from(value: String) -> Self {
        Self::Hex(value)
    }
}
