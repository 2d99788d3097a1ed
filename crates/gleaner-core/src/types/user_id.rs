//! User id type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated stable user identity from the source feed.
///
/// This is the primary key of a [`ConnectionRecord`](crate::ConnectionRecord)
/// within its collection. The source assigns these; gleaner only requires
/// them to be non-empty, printable, and bounded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Create a new user id from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, longer than 64 characters,
    /// or contains whitespace or control characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();

        if s.is_empty() {
            return Err(InvalidInputError::UserId {
                value: s.to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if s.len() > 64 {
            return Err(InvalidInputError::UserId {
                value: s.to_string(),
                reason: "must be at most 64 characters".to_string(),
            }
            .into());
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidInputError::UserId {
                value: s.to_string(),
                reason: "must not contain whitespace or control characters".to_string(),
            }
            .into());
        }

        Ok(Self(s.to_string()))
    }

    /// Returns the user id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_user_id() {
        let id = UserId::new("1234567890").unwrap();
        assert_eq!(id.as_str(), "1234567890");
    }

    #[test]
    fn rejects_empty() {
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(UserId::new("12 34").is_err());
        assert!(UserId::new("12\n34").is_err());
    }
}
