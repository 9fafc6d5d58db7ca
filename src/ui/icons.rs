//! Cosmetic per-stage icons for the status line.

use crate::errors::ConfigError;
use std::str::FromStr;

/// How stage numbers are decorated. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconSet {
    /// Circled digits: ① ② ③ …
    #[default]
    Digits,
    /// Letters: A B C …
    Letters,
    /// No icon.
    None,
}

impl FromStr for IconSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "digits" => Ok(IconSet::Digits),
            "letters" => Ok(IconSet::Letters),
            "none" => Ok(IconSet::None),
            _ => Err(ConfigError::UnknownIconSet(s.to_string())),
        }
    }
}

impl std::fmt::Display for IconSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IconSet::Digits => "digits",
            IconSet::Letters => "letters",
            IconSet::None => "none",
        };
        write!(f, "{name}")
    }
}

/// Icon for a 1-based stage number. Falls back to the plain number once the
/// set runs out of dedicated glyphs.
pub fn stage_icon(set: IconSet, stage: u32) -> String {
    match set {
        IconSet::None => String::new(),
        // ① is U+2460; the circled digits run through ⑳ (20).
        IconSet::Digits => match stage {
            1..=20 => char::from_u32(0x2460 + stage - 1)
                .map(String::from)
                .unwrap_or_else(|| stage.to_string()),
            _ => stage.to_string(),
        },
        IconSet::Letters => match stage {
            1..=26 => char::from_u32('A' as u32 + stage - 1)
                .map(String::from)
                .unwrap_or_else(|| stage.to_string()),
            _ => stage.to_string(),
        },
    }
}
