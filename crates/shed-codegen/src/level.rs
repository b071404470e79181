//! Optimisation levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How much the generator simplifies and how compactly the writer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptimisationLevel {
    /// A literal structural mapping, pretty-printed.
    #[default]
    None,
    /// Constant folding, dead-branch elision and compact rendering.
    Simple,
}

impl OptimisationLevel {
    pub const ALL: [OptimisationLevel; 2] = [OptimisationLevel::None, OptimisationLevel::Simple];

    pub fn name(self) -> &'static str {
        match self {
            OptimisationLevel::None => "NONE",
            OptimisationLevel::Simple => "SIMPLE",
        }
    }
}

impl fmt::Display for OptimisationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An optimisation level name that is neither `NONE` nor `SIMPLE`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown optimisation level '{0}' (expected NONE or SIMPLE)")]
pub struct ParseLevelError(pub String);

impl FromStr for OptimisationLevel {
    type Err = ParseLevelError;

    /// Names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptimisationLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_levels() {
        assert_eq!("NONE".parse(), Ok(OptimisationLevel::None));
        assert_eq!("simple".parse(), Ok(OptimisationLevel::Simple));
        assert_eq!(" Simple ".parse(), Ok(OptimisationLevel::Simple));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let err = "ADVANCED".parse::<OptimisationLevel>().unwrap_err();
        assert_eq!(err, ParseLevelError("ADVANCED".into()));
        assert!("".parse::<OptimisationLevel>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for level in OptimisationLevel::ALL {
            assert_eq!(level.to_string().parse(), Ok(level));
        }
    }
}
