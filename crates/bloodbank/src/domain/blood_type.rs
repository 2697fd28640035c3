use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// ABO group portion of a blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BloodGroup {
    A,
    B,
    AB,
    O,
}

impl BloodGroup {
    pub fn label(self) -> &'static str {
        match self {
            BloodGroup::A => "A",
            BloodGroup::B => "B",
            BloodGroup::AB => "AB",
            BloodGroup::O => "O",
        }
    }
}

impl FromStr for BloodGroup {
    type Err = BloodTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(BloodGroup::A),
            "B" => Ok(BloodGroup::B),
            "AB" => Ok(BloodGroup::AB),
            "O" => Ok(BloodGroup::O),
            _ => Err(BloodTypeError::UnknownGroup(value.to_string())),
        }
    }
}

/// Rhesus factor, always stored as the single character `+` or `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RhFactor {
    Positive,
    Negative,
}

impl RhFactor {
    pub fn symbol(self) -> &'static str {
        match self {
            RhFactor::Positive => "+",
            RhFactor::Negative => "-",
        }
    }
}

impl FromStr for RhFactor {
    type Err = BloodTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "+" => Ok(RhFactor::Positive),
            "-" => Ok(RhFactor::Negative),
            _ => Err(BloodTypeError::UnknownRhFactor(value.to_string())),
        }
    }
}

/// Combined blood type such as `O+` or `AB-`.
///
/// The textual form is split at its last character: everything before it is the group and the
/// final character is the Rh factor. [`BloodType::compose`] is the exact inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BloodType {
    pub group: BloodGroup,
    pub rh: RhFactor,
}

impl BloodType {
    pub fn new(group: BloodGroup, rh: RhFactor) -> Self {
        Self { group, rh }
    }

    pub fn split(raw: &str) -> Result<Self, BloodTypeError> {
        let trimmed = raw.trim();
        let (boundary, _) = trimmed
            .char_indices()
            .last()
            .ok_or(BloodTypeError::Empty)?;
        let (group, rh) = trimmed.split_at(boundary);
        if group.is_empty() {
            return Err(BloodTypeError::UnknownGroup(trimmed.to_string()));
        }
        Self::from_parts(group, rh)
    }

    /// Rebuilds a blood type from the two columns it is persisted as.
    pub fn from_parts(group: &str, rh: &str) -> Result<Self, BloodTypeError> {
        Ok(Self {
            group: group.parse()?,
            rh: rh.parse()?,
        })
    }

    pub fn compose(&self) -> String {
        format!("{}{}", self.group.label(), self.rh.symbol())
    }
}

impl FromStr for BloodType {
    type Err = BloodTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::split(value)
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.group.label(), self.rh.symbol())
    }
}

impl Serialize for BloodType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.compose())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        BloodType::split(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BloodTypeError {
    #[error("blood type is empty")]
    Empty,
    #[error("unknown blood group in '{0}' (expected A, B, AB or O)")]
    UnknownGroup(String),
    #[error("unknown rh factor '{0}' (expected + or -)")]
    UnknownRhFactor(String),
}
