//! Subscription duration requested on an order line.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whole number of months, at least one.
///
/// Fractional durations are rejected here so nothing downstream ever sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DurationMonths(u32);

impl DurationMonths {
    pub fn new(months: u32) -> Result<Self, ValidationError> {
        if months == 0 {
            return Err(ValidationError::out_of_range(
                "duration_months",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(Self(months))
    }

    /// Converts a signed storage value.
    pub fn from_i32(months: i32) -> Result<Self, ValidationError> {
        let months = u32::try_from(months).map_err(|_| {
            ValidationError::out_of_range("duration_months", 1, i64::from(u32::MAX), i64::from(months))
        })?;
        Self::new(months)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for DurationMonths {
    type Error = ValidationError;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<DurationMonths> for u32 {
    fn from(duration: DurationMonths) -> u32 {
        duration.0
    }
}

impl FromStr for DurationMonths {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let months = trimmed.parse::<u32>().map_err(|_| {
            ValidationError::invalid_format(
                "duration_months",
                format!("'{}' is not a whole number of months", trimmed),
            )
        })?;
        Self::new(months)
    }
}

impl fmt::Display for DurationMonths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1 {
            write!(f, "1 month")
        } else {
            write!(f, "{} months", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_months_is_rejected() {
        assert!(DurationMonths::new(0).is_err());
        assert!(DurationMonths::from_i32(-3).is_err());
    }

    #[test]
    fn fractional_months_fail_to_parse() {
        assert!("1.5".parse::<DurationMonths>().is_err());
        assert!("0.5".parse::<DurationMonths>().is_err());
        assert_eq!("6".parse::<DurationMonths>().unwrap().get(), 6);
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<DurationMonths>("0").is_err());
        assert_eq!(serde_json::from_str::<DurationMonths>("12").unwrap().get(), 12);
    }

    #[test]
    fn displays_singular_and_plural() {
        assert_eq!(DurationMonths::new(1).unwrap().to_string(), "1 month");
        assert_eq!(DurationMonths::new(3).unwrap().to_string(), "3 months");
    }
}
