//! Cohort label codes.
//!
//! The labelled-dataset store encodes sex, acquisition site and the binary
//! target as small integers. These enums decode them to the labels used in
//! annotated tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::session::Session;
use crate::subject::SubjectId;

/// Subject sex as recorded by the label store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Decodes a raw sex code: `0` is male, every other code is female.
    pub fn from_code(code: i64) -> Self {
        if code == 0 { Sex::Male } else { Sex::Female }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(ParseError::Sex(s.to_string())),
        }
    }
}

/// The eight IMAGEN acquisition sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Paris,
    Nottingham,
    Mannheim,
    London,
    Hamburg,
    Dublin,
    Dresden,
    Berlin,
}

impl Site {
    /// Sites indexed by their raw code.
    pub const ALL: [Site; 8] = [
        Site::Paris,
        Site::Nottingham,
        Site::Mannheim,
        Site::London,
        Site::Hamburg,
        Site::Dublin,
        Site::Dresden,
        Site::Berlin,
    ];

    /// Decodes a raw site code in `0..=7`.
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn code(&self) -> u8 {
        match self {
            Site::Paris => 0,
            Site::Nottingham => 1,
            Site::Mannheim => 2,
            Site::London => 3,
            Site::Hamburg => 4,
            Site::Dublin => 5,
            Site::Dresden => 6,
            Site::Berlin => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Paris => "Paris",
            Site::Nottingham => "Nottingham",
            Site::Mannheim => "Mannheim",
            Site::London => "London",
            Site::Hamburg => "Hamburg",
            Site::Dublin => "Dublin",
            Site::Dresden => "Dresden",
            Site::Berlin => "Berlin",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|site| site.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseError::Site(s.to_string()))
    }
}

/// Binary cohort class: healthy control or adolescent alcohol misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CohortClass {
    #[serde(rename = "HC")]
    HealthyControl,
    #[serde(rename = "AAM")]
    AlcoholMisuse,
}

impl CohortClass {
    /// Derives the class from the raw binary target by parity.
    ///
    /// Even targets are controls and odd targets are misuse cases; this
    /// holds for negative encodings too.
    pub fn from_target(target: i64) -> Self {
        if target.rem_euclid(2) == 0 {
            CohortClass::HealthyControl
        } else {
            CohortClass::AlcoholMisuse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CohortClass::HealthyControl => "HC",
            CohortClass::AlcoholMisuse => "AAM",
        }
    }
}

impl fmt::Display for CohortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CohortClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HC" => Ok(CohortClass::HealthyControl),
            "AAM" => Ok(CohortClass::AlcoholMisuse),
            _ => Err(ParseError::Class(s.to_string())),
        }
    }
}

/// Which split of the labelled dataset a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetSplit {
    Training,
    Holdout,
}

impl DatasetSplit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Training => "Training",
            DatasetSplit::Holdout => "Holdout",
        }
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetSplit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "training" => Ok(DatasetSplit::Training),
            "holdout" => Ok(DatasetSplit::Holdout),
            _ => Err(ParseError::Dataset(s.to_string())),
        }
    }
}

/// One decoded record of the labelled-dataset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortLabel {
    pub id: SubjectId,
    pub session: Session,
    /// Name of the binary target the class was derived from.
    pub target: String,
    pub dataset: DatasetSplit,
    pub sex: Sex,
    pub site: Site,
    pub class: CohortClass,
}
