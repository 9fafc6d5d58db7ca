//! Pure progress-bar rendering.
//!
//! `render` maps a completion fraction and target width to a string of block
//! glyphs: whole units, at most one partial glyph chosen by nearest-rounding
//! into the style's partial granularity, then blank padding. The rendered
//! width never exceeds the target width.

use crate::errors::ConfigError;
use std::str::FromStr;

/// Glyph set used for the bar. Parsed at configuration-read time; an
/// unrecognized name is a [`ConfigError`], never a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarStyle {
    /// Render nothing.
    None,
    /// Eighth-block partials: `▏▎▍▌▋▊▉`.
    #[default]
    BlockWidth,
    /// Shade partials: `░▒▓`.
    BlockShade,
    /// Quadrant partials: `▖▚▙`.
    BlockQuadrant,
}

impl FromStr for BarStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(BarStyle::None),
            "block-width" => Ok(BarStyle::BlockWidth),
            "block-shade" => Ok(BarStyle::BlockShade),
            "block-quadrant" => Ok(BarStyle::BlockQuadrant),
            _ => Err(ConfigError::UnknownBarStyle(s.to_string())),
        }
    }
}

impl std::fmt::Display for BarStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BarStyle::None => "none",
            BarStyle::BlockWidth => "block-width",
            BarStyle::BlockShade => "block-shade",
            BarStyle::BlockQuadrant => "block-quadrant",
        };
        write!(f, "{name}")
    }
}

struct Glyphs {
    whole: char,
    partials: &'static [char],
    blank: char,
}

fn glyphs(style: BarStyle) -> Option<Glyphs> {
    match style {
        BarStyle::None => None,
        BarStyle::BlockWidth => Some(Glyphs {
            whole: '█',
            partials: &['▏', '▎', '▍', '▌', '▋', '▊', '▉'],
            blank: ' ',
        }),
        BarStyle::BlockShade => Some(Glyphs {
            whole: '█',
            partials: &['░', '▒', '▓'],
            blank: '░',
        }),
        BarStyle::BlockQuadrant => Some(Glyphs {
            whole: '█',
            partials: &['▖', '▚', '▙'],
            blank: ' ',
        }),
    }
}

/// Render `fraction` (callers keep it within [0, 1]) as a bar of exactly
/// `width` glyphs, or the empty string under [`BarStyle::None`].
pub fn render(fraction: f64, width: usize, style: BarStyle) -> String {
    let Some(g) = glyphs(style) else {
        return String::new();
    };

    let whole = ((width as f64 * fraction).floor() as usize).min(width);
    let mut out = String::with_capacity(width * 3);
    for _ in 0..whole {
        out.push(g.whole);
    }

    if whole < width {
        let remainder = width as f64 * fraction - whole as f64;
        let steps = g.partials.len() + 1;
        let idx = ((remainder * steps as f64).round() as usize).min(g.partials.len());
        if idx == 0 {
            out.push(g.blank);
        } else {
            out.push(g.partials[idx - 1]);
        }
        for _ in whole + 1..width {
            out.push(g.blank);
        }
    }

    out
}
