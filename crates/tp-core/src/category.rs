//! Activity category enum as the single source of truth for category strings.
//!
//! The declaration order (TRAVEL, STAY, EXPERIENCE, BUFFER) is the tie-break
//! order used by section classification and must not be reordered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a catalog activity, also derived onto sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityCategory {
    Travel,
    Stay,
    Experience,
    Buffer,
}

impl ActivityCategory {
    /// All categories in declaration order.
    pub const ALL: [Self; 4] = [Self::Travel, Self::Stay, Self::Experience, Self::Buffer];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "TRAVEL",
            Self::Stay => "STAY",
            Self::Experience => "EXPERIENCE",
            Self::Buffer => "BUFFER",
        }
    }

    /// Position in declaration order.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRAVEL" => Ok(Self::Travel),
            "STAY" => Ok(Self::Stay),
            "EXPERIENCE" => Ok(Self::Experience),
            "BUFFER" => Ok(Self::Buffer),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for ActivityCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown category strings.
#[derive(Debug, Clone)]
pub struct UnknownCategory(String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activity category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}
