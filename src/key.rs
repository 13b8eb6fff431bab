//! Cache key normalization
//!
//! Every lookup is keyed by a normalized city name so that raw inputs which
//! differ only in case or surrounding whitespace share one cache entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized identifier for a city lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityKey(String);

impl CityKey {
    /// Derives the canonical key from a raw, user-supplied city string.
    ///
    /// Trims surrounding whitespace and lower-cases the rest. Any string is
    /// accepted, including empty or whitespace-only input.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form of the key: each word starts with an upper-case letter
    ///
    /// A word starts at every letter that does not follow another letter, so
    /// "saint-étienne" becomes "Saint-Étienne".
    pub fn title_case(&self) -> String {
        let mut titled = String::with_capacity(self.0.len());
        let mut after_letter = false;
        for c in self.0.chars() {
            if c.is_alphabetic() && !after_letter {
                titled.extend(c.to_uppercase());
            } else {
                titled.push(c);
            }
            after_letter = c.is_alphabetic();
        }
        titled
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(CityKey::normalize("  London ").as_str(), "london");
        assert_eq!(CityKey::normalize("NEW YORK").as_str(), "new york");
    }

    #[test]
    fn test_case_and_whitespace_variants_share_a_key() {
        let a = CityKey::normalize("London");
        let b = CityKey::normalize(" london ");
        let c = CityKey::normalize("LONDON");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "   ", " Paris\t", "ÅLESUND", "san  Francisco ", "\nTokyo\n"] {
            let once = CityKey::normalize(raw);
            let twice = CityKey::normalize(once.as_str());
            assert_eq!(once, twice, "normalize should be idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_whitespace_only_input_is_empty_key() {
        assert!(CityKey::normalize(" \t ").is_empty());
        assert!(CityKey::normalize("").is_empty());
    }

    #[test]
    fn test_interior_whitespace_is_preserved() {
        assert_eq!(CityKey::normalize(" Rio de Janeiro ").as_str(), "rio de janeiro");
    }

    #[test]
    fn test_title_case_capitalizes_each_word() {
        assert_eq!(CityKey::normalize("rio de janeiro").title_case(), "Rio De Janeiro");
        assert_eq!(CityKey::normalize("SAINT-ÉTIENNE").title_case(), "Saint-Étienne");
        assert_eq!(CityKey::normalize("").title_case(), "");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = CityKey::normalize("Oslo");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"oslo\"");
    }
}
