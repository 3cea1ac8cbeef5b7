//! Longitudinal study sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A fixed point in the IMAGEN timeline.
///
/// Sessions are written with their short codes (`BL`, `FU1`, `FU2`, `FU3`)
/// everywhere a table or registry stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    #[serde(rename = "BL")]
    Baseline,
    #[serde(rename = "FU1")]
    FollowUp1,
    #[serde(rename = "FU2")]
    FollowUp2,
    #[serde(rename = "FU3")]
    FollowUp3,
}

impl Session {
    /// All sessions in timeline order.
    pub const ALL: [Session; 4] = [
        Session::Baseline,
        Session::FollowUp1,
        Session::FollowUp2,
        Session::FollowUp3,
    ];

    /// Short code used in file layouts and table cells.
    pub fn code(&self) -> &'static str {
        match self {
            Session::Baseline => "BL",
            Session::FollowUp1 => "FU1",
            Session::FollowUp2 => "FU2",
            Session::FollowUp3 => "FU3",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Session::Baseline => "Baseline",
            Session::FollowUp1 => "Follow-up 1",
            Session::FollowUp2 => "Follow-up 2",
            Session::FollowUp3 => "Follow-up 3",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Session {
    type Err = ParseError;

    /// Accepts the short codes and the long names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "BL" | "BASELINE" => Ok(Session::Baseline),
            "FU1" | "FOLLOWUP1" => Ok(Session::FollowUp1),
            "FU2" | "FOLLOWUP2" => Ok(Session::FollowUp2),
            "FU3" | "FOLLOWUP3" => Ok(Session::FollowUp3),
            _ => Err(ParseError::Session(s.to_string())),
        }
    }
}
