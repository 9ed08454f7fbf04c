//! Skin type used by the product listing filter.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a skin type string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown skin type: {0}")]
pub struct SkinTypeError(pub String);

/// Skin type a product is formulated for.
///
/// The API stores these as lowercase strings. `All` means the product suits
/// every skin type; it is a real value, distinct from "no filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinType {
    All,
    Oily,
    Dry,
    Combination,
    Sensitive,
}

impl SkinType {
    /// Every skin type, in dropdown order.
    pub const ALL_VARIANTS: [Self; 5] = [
        Self::All,
        Self::Oily,
        Self::Dry,
        Self::Combination,
        Self::Sensitive,
    ];

    /// Wire value sent to the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Oily => "oily",
            Self::Dry => "dry",
            Self::Combination => "combination",
            Self::Sensitive => "sensitive",
        }
    }

    /// Human-readable label for the filter sidebar.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All Skin Types",
            Self::Oily => "Oily",
            Self::Dry => "Dry",
            Self::Combination => "Combination",
            Self::Sensitive => "Sensitive",
        }
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkinType {
    type Err = SkinTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL_VARIANTS
            .into_iter()
            .find(|variant| variant.as_str() == normalized)
            .ok_or_else(|| SkinTypeError(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Oily".parse::<SkinType>().unwrap(), SkinType::Oily);
        assert_eq!(" DRY ".parse::<SkinType>().unwrap(), SkinType::Dry);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "scaly".parse::<SkinType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown skin type: scaly");
    }

    #[test]
    fn test_wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&SkinType::Combination).unwrap(),
            "\"combination\""
        );
        let parsed: SkinType = serde_json::from_str("\"sensitive\"").unwrap();
        assert_eq!(parsed, SkinType::Sensitive);
    }
}
