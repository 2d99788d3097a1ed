//! Relation kind type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// The two relation kinds a connection list can belong to.
///
/// Every captured record is scoped to one `(account, relation kind)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// Accounts the captured account follows.
    Following,
    /// Accounts following the captured account.
    Followers,
}

impl RelationKind {
    /// All relation kinds, in a fixed order.
    pub const ALL: [RelationKind; 2] = [RelationKind::Following, RelationKind::Followers];

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Following => "following",
            RelationKind::Followers => "followers",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "following" => Ok(RelationKind::Following),
            "followers" => Ok(RelationKind::Followers),
            other => Err(InvalidInputError::RelationKind {
                value: other.to_string(),
            }
            .into()),
        }
    }
}

impl Serialize for RelationKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_names() {
        for kind in RelationKind::ALL {
            let parsed: RelationKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn rejects_unknown() {
        assert!("friends".parse::<RelationKind>().is_err());
    }

    #[test]
    fn serde_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(RelationKind::Following, 3u64);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "{\"following\":3}");

        let back: HashMap<RelationKind, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[&RelationKind::Following], 3);
    }
}
