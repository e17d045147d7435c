//! Bureau presentation mode: the ordinary continuity or the corrupted
//! "segwang" continuity, which swaps in its own static datasets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BureauMode {
    #[default]
    Ordinary,
    Segwang,
}

impl BureauMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::Segwang => "segwang",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ordinary => Self::Segwang,
            Self::Segwang => Self::Ordinary,
        }
    }
}

impl fmt::Display for BureauMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BureauMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinary" => Ok(Self::Ordinary),
            "segwang" => Ok(Self::Segwang),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_the_two_modes() {
        assert_eq!(BureauMode::Ordinary.toggled(), BureauMode::Segwang);
        assert_eq!(BureauMode::Segwang.toggled(), BureauMode::Ordinary);
    }

    #[test]
    fn mode_round_trips_lowercase() {
        let json = serde_json::to_string(&BureauMode::Segwang).unwrap();
        assert_eq!(json, "\"segwang\"");
        assert_eq!("ordinary".parse(), Ok(BureauMode::Ordinary));
        assert!("other".parse::<BureauMode>().is_err());
    }
}
