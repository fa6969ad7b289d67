use serde::{Deserialize, Serialize};

use super::color::{Rgb, Rgba};

/// Three-anchor color scale for map legends.
///
/// `[0, 0.5]` blends `low` into `mid`, `[0.5, 1]` blends `mid` into `high`.
///
/// Example YAML:
/// ```yaml
/// legend:
///   low: "#FF9D00"
///   mid: "#4DD0E1"
///   high: "#062E57"
///   alpha: 180
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tritone {
    pub low: Rgb,
    pub mid: Rgb,
    pub high: Rgb,
    pub alpha: u8,
}

impl Default for Tritone {
    fn default() -> Self {
        Self {
            low: Rgb(0xFF, 0x9D, 0x00),
            mid: Rgb(0x4D, 0xD0, 0xE1),
            high: Rgb(0x06, 0x2E, 0x57),
            alpha: 180,
        }
    }
}

impl Tritone {
    /// Color at position `t`. Values outside `[0, 1]` (and NaN) clamp to the
    /// nearest end.
    pub fn color_at(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.5 {
            self.lower(t)
        } else {
            self.upper(t)
        }
    }

    fn lower(&self, t: f64) -> Rgba {
        blend(self.low, self.mid, t * 2.0, self.alpha)
    }

    fn upper(&self, t: f64) -> Rgba {
        blend(self.mid, self.high, (t - 0.5) * 2.0, self.alpha)
    }
}

/// Color at `t` on the default scale.
pub fn tritone(t: f64) -> Rgba {
    Tritone::default().color_at(t)
}

fn blend(from: Rgb, to: Rgb, w: f64, alpha: u8) -> Rgba {
    // Channels truncate toward zero.
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w) as u8;
    Rgba::new(channel(from.0, to.0), channel(from.1, to.1), channel(from.2, to.2), alpha)
}
