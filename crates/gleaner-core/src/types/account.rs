//! Account name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated external account name (the handle whose connection lists
/// are being captured).
///
/// Account names are the path handles the host site uses:
/// ASCII alphanumerics and underscores, between 1 and 32 characters.
///
/// # Example
///
/// ```
/// use gleaner_core::AccountName;
///
/// let account = AccountName::new("alice_w").unwrap();
/// assert_eq!(account.as_str(), "alice_w");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountName(String);

impl AccountName {
    /// Create a new account name from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, too long, or contains
    /// characters outside `[A-Za-z0-9_]`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();

        if s.is_empty() {
            return Err(InvalidInputError::AccountName {
                value: s.to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if s.len() > 32 {
            return Err(InvalidInputError::AccountName {
                value: s.to_string(),
                reason: "must be at most 32 characters".to_string(),
            }
            .into());
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(InvalidInputError::AccountName {
                value: s.to_string(),
                reason: "must contain only ASCII alphanumerics and '_'".to_string(),
            }
            .into());
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the account name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for AccountName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AccountName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_account_name() {
        let account = AccountName::new("some_user42").unwrap();
        assert_eq!(account.as_str(), "some_user42");
    }

    #[test]
    fn rejects_empty() {
        assert!(AccountName::new("").is_err());
    }

    #[test]
    fn rejects_path_characters() {
        assert!(AccountName::new("a/b").is_err());
        assert!(AccountName::new("name with spaces").is_err());
    }

    #[test]
    fn rejects_overlong() {
        assert!(AccountName::new("x".repeat(33)).is_err());
    }

    #[test]
    fn serde_string_form() {
        let account = AccountName::new("alice").unwrap();
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, "\"alice\"");

        let back: AccountName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
