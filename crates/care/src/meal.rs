//! Meal slots and medication status codes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CareError;

/// One of the three fixed daily periods
///
/// Ordering follows the canonical `morning < lunch < dinner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    /// Morning
    Morning,
    /// Lunch
    Lunch,
    /// Dinner
    Dinner,
}

impl MealSlot {
    /// All slots in canonical order
    pub const ALL: [MealSlot; 3] = [Self::Morning, Self::Lunch, Self::Dinner];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    /// Position in [`MealSlot::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Parse a value read back from the database
    pub(crate) fn from_stored(s: &str) -> Result<Self, CareError> {
        match s {
            "morning" => Ok(Self::Morning),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => Err(CareError::Database(format!("unknown stored meal_slot '{}'", other))),
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "" => Err(CareError::validation("meal_slot is required")),
            other => Err(CareError::validation(format!(
                "meal_slot must be morning, lunch or dinner, got '{}'",
                other
            ))),
        }
    }
}

/// Status of a schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicationStatus {
    /// Dose taken (`y`)
    Taken,
    /// Dose not yet taken (`n`)
    #[default]
    NotTaken,
    /// Dose missed (`m`)
    Failed,
}

impl MedicationStatus {
    /// Single-letter storage code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Taken => "y",
            Self::NotTaken => "n",
            Self::Failed => "m",
        }
    }

    /// Parse a storage code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "y" => Some(Self::Taken),
            "n" => Some(Self::NotTaken),
            "m" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slots() {
        assert_eq!("morning".parse::<MealSlot>().unwrap(), MealSlot::Morning);
        assert_eq!(" Dinner ".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
        assert!("breakfast".parse::<MealSlot>().is_err());
        assert!("".parse::<MealSlot>().unwrap_err().to_string().contains("required"));
    }

    #[test]
    fn test_stored_slot_is_strict() {
        assert_eq!(MealSlot::from_stored("lunch").unwrap(), MealSlot::Lunch);
        for bad in ["Lunch", "brunch", ""] {
            let err = MealSlot::from_stored(bad).unwrap_err();
            assert!(matches!(err, CareError::Database(_)), "{}", bad);
        }
    }

    #[test]
    fn test_canonical_order() {
        assert!(MealSlot::Morning < MealSlot::Lunch);
        assert!(MealSlot::Lunch < MealSlot::Dinner);
        for (i, slot) in MealSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }

    #[test]
    fn test_status_codes() {
        for status in [
            MedicationStatus::Taken,
            MedicationStatus::NotTaken,
            MedicationStatus::Failed,
        ] {
            assert_eq!(MedicationStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(MedicationStatus::default(), MedicationStatus::NotTaken);
        assert_eq!(
            serde_json::to_string(&MedicationStatus::NotTaken).unwrap(),
            "\"not_taken\""
        );
    }
}
