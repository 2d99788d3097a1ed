//! Relation page classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, InvalidInputError};

use super::{AccountName, RelationKind};

/// The `(account, relation kind)` pair a relation page is showing.
///
/// Relation pages have paths of the form `/<account>/following` or
/// `/<account>/followers`. Any other page is not a capture target.
///
/// # Example
///
/// ```
/// use gleaner_core::{PageTarget, RelationKind};
/// use url::Url;
///
/// let url = Url::parse("https://x.com/alice/following").unwrap();
/// let target = PageTarget::from_page_url(&url).unwrap();
/// assert_eq!(target.account.as_str(), "alice");
/// assert_eq!(target.kind, RelationKind::Following);
///
/// let url = Url::parse("https://x.com/home").unwrap();
/// assert!(PageTarget::from_page_url(&url).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTarget {
    /// The account whose list the page shows.
    pub account: AccountName,
    /// Which list the page shows.
    pub kind: RelationKind,
}

impl PageTarget {
    /// Classify a page URL, returning `None` for anything that is not a
    /// relation page.
    pub fn from_page_url(url: &Url) -> Option<Self> {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

        let account = segments.next()?;
        let kind = segments.next()?;
        if segments.next().is_some() {
            return None;
        }

        let account = AccountName::new(account).ok()?;
        let kind: RelationKind = kind.parse().ok()?;

        Some(Self { account, kind })
    }

    /// Classify a page URL string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a URL at all; a well-formed URL
    /// that is not a relation page yields `Ok(None)`.
    pub fn parse_page_url(s: &str) -> Result<Option<Self>, Error> {
        let url = Url::parse(s).map_err(|e| InvalidInputError::PageUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_page_url(&url))
    }
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_following_page() {
        let url = Url::parse("https://x.com/bob/following").unwrap();
        let target = PageTarget::from_page_url(&url).unwrap();
        assert_eq!(target.account.as_str(), "bob");
        assert_eq!(target.kind, RelationKind::Following);
    }

    #[test]
    fn classifies_followers_page() {
        let url = Url::parse("https://x.com/bob/followers").unwrap();
        let target = PageTarget::from_page_url(&url).unwrap();
        assert_eq!(target.kind, RelationKind::Followers);
    }

    #[test]
    fn ignores_other_pages() {
        for s in [
            "https://x.com/",
            "https://x.com/home",
            "https://x.com/bob/status/123",
            "https://x.com/bob/following/extra",
        ] {
            let url = Url::parse(s).unwrap();
            assert!(PageTarget::from_page_url(&url).is_none(), "{}", s);
        }
    }

    #[test]
    fn tolerates_trailing_slash() {
        let url = Url::parse("https://x.com/bob/followers/").unwrap();
        assert!(PageTarget::from_page_url(&url).is_some());
    }

    #[test]
    fn rejects_garbage_url_string() {
        assert!(PageTarget::parse_page_url("not a url").is_err());
    }
}
