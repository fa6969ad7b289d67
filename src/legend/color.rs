use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::model::{Rate, Regime};

/// An RGB color, written `#RRGGBB` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color must start with '#': {}", s))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color must be #RRGGBB: {}", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Three color channels plus alpha, as drawn on a map layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#RRGGBBAA`
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

/// Drawn for values with no data and unrecognized categories.
pub const FALLBACK: Rgba = Rgba::new(100, 100, 100, 160);

const INDICATOR_ALPHA: u8 = 180;

/// Red-to-green ramp used for municipality indicator maps.
///
/// `ratio` is the value over the layer maximum; higher values lean red.
pub fn indicator_color(ratio: Rate) -> Rgba {
    match ratio {
        Rate::Defined(r) => {
            let r = r.clamp(0.0, 1.0);
            Rgba::new((255.0 * r) as u8, (255.0 * (1.0 - r)) as u8, 100, INDICATOR_ALPHA)
        }
        Rate::Undefined => FALLBACK,
    }
}

impl Regime {
    pub fn color(&self) -> Rgba {
        match self {
            Regime::Public => Rgba::new(0, 128, 0, 160),
            Regime::SubsidizedPrivate => Rgba::new(255, 165, 0, 160),
            Regime::Private => Rgba::new(220, 20, 60, 160),
            Regime::Other(_) => FALLBACK,
        }
    }
}
