//! Hex, RGB and HSL color conversions.
//!
//! The HSL conversion follows the ruby-sass reference algorithm branch for
//! branch so that converted colors match Sass output exactly.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Diagnostic;

static HEX_SHORTHAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#?([0-9a-f])([0-9a-f])([0-9a-f])$").expect("hex shorthand regex is valid")
});

static HEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#?([0-9a-f]{2})([0-9a-f]{2})([0-9a-f]{2})$").expect("hex regex is valid")
});

static HSLA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^hsla\((?P<h>[0-9]+),\s?(?P<s>[0-9]+)%,\s?(?P<l>[0-9]+)%,\s?1\)$")
        .expect("hsla regex is valid")
});

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A color in hue/saturation/lightness form.
///
/// Hue is in degrees `[0, 360)`, saturation and lightness in percent
/// `[0, 100]`. Hue and saturation are always whole numbers. Lightness is a
/// whole number too, except after a fractional `lighten`/`darken` delta has
/// been applied: that delta is not re-rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: f64,
}

impl Hsl {
    /// Copy of this color with a different lightness.
    pub fn with_lightness(self, l: f64) -> Self {
        Self { l, ..self }
    }
}

impl fmt::Display for Hsl {
    /// Canonical `hsla(h, s%, l%, 1)` form, the same shape [`parse_hsla`] accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsla({}, {}%, {}%, 1)", self.h, self.s, self.l)
    }
}

/// Round half up, matching `Math.round` (and Sass) rather than Rust's
/// half-away-from-zero rounding.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Parse a `#rgb` or `#rrggbb` literal. The leading `#` is optional.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    // Expand shorthand (e.g., "#fa0" -> "ffaa00")
    let expanded = match HEX_SHORTHAND_RE.captures(hex) {
        Some(caps) => {
            let mut full = String::with_capacity(6);
            for digit in [&caps[1], &caps[2], &caps[3]] {
                full.push_str(digit);
                full.push_str(digit);
            }
            full
        }
        None => hex.to_string(),
    };

    let caps = HEX_RE.captures(&expanded)?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();

    Some(Rgb {
        r: channel(1)?,
        g: channel(2)?,
        b: channel(3)?,
    })
}

/// Convert RGB to HSL, rounding every component to the nearest integer.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;

    let h = if max == min {
        0.0
    } else if max == r {
        60.0 * (g - b) / d
    } else if max == g {
        60.0 * (b - r) / d + 120.0
    } else {
        60.0 * (r - g) / d + 240.0
    };

    let l = (max + min) / 2.0;

    let s = if max == min {
        0.0
    } else if l < 0.5 {
        d / (2.0 * l)
    } else {
        d / (2.0 - 2.0 * l)
    };

    // Negative hues (red is max, blue above green) wrap into [0, 360); a hue
    // that rounds up to 360 is the same angle as 0.
    let h = round_half_up(h.rem_euclid(360.0)) as u16 % 360;

    Hsl {
        h,
        s: round_half_up(s * 100.0) as u8,
        l: round_half_up(l * 100.0),
    }
}

/// Convert a hex literal straight to HSL.
pub fn hex_to_hsl(hex: &str) -> Result<Hsl, Diagnostic> {
    let rgb = hex_to_rgb(hex).ok_or_else(|| Diagnostic::UnresolvableHex {
        hex: hex.to_string(),
    })?;
    tracing::debug!(?rgb, "converted {hex} to RGB");

    let hsl = rgb_to_hsl(rgb);
    tracing::debug!(?hsl, "converted {hex} to HSL");

    Ok(hsl)
}

/// Parse the canonical `hsla(H, S%, L%, 1)` literal.
///
/// Only whole-number components and an alpha of exactly `1` are accepted;
/// that is the only shape this crate ever emits.
pub fn parse_hsla(text: &str) -> Result<Hsl, Diagnostic> {
    let unparsable = || Diagnostic::UnparsableHslaLiteral {
        text: text.to_string(),
    };

    let caps = HSLA_RE.captures(text).ok_or_else(unparsable)?;
    let component = |name: &str| caps[name].parse::<u32>().ok();

    let (h, s, l) = match (component("h"), component("s"), component("l")) {
        (Some(h), Some(s), Some(l)) if h < 360 && s <= 100 && l <= 100 => (h, s, l),
        _ => return Err(unparsable()),
    };

    Ok(Hsl {
        h: h as u16,
        s: s as u8,
        l: f64::from(l),
    })
}
