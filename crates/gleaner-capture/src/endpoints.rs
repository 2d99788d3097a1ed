//! Relation-list endpoint classification.

use url::Url;

use gleaner_core::types::RelationKind;

/// GraphQL operation serving the following list.
pub const FOLLOWING_OPERATION: &str = "Following";

/// GraphQL operation serving the followers list.
pub const FOLLOWERS_OPERATION: &str = "Followers";

/// Alternate followers operation used for the verified-followers tab.
pub const VERIFIED_FOLLOWERS_OPERATION: &str = "BlueVerifiedFollowers";

const GRAPHQL_MARKER: &str = "/graphql/";

/// Classify a response URL into one of the two endpoint families.
///
/// Relation-list responses come from GraphQL endpoints shaped
/// `.../graphql/<query-id>/<operation>`; everything else is not a capture
/// target.
pub fn relation_kind_for_endpoint(url: &str) -> Option<RelationKind> {
    let url = Url::parse(url).ok()?;
    let path = url.path();

    let marker = path.find(GRAPHQL_MARKER)?;
    let mut segments = path[marker + GRAPHQL_MARKER.len()..].split('/');

    let _query_id = segments.next()?;
    let operation = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    match operation {
        FOLLOWING_OPERATION => Some(RelationKind::Following),
        FOLLOWERS_OPERATION | VERIFIED_FOLLOWERS_OPERATION => Some(RelationKind::Followers),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_following_endpoint() {
        let url = "https://x.com/i/api/graphql/abc123XYZ/Following?variables=%7B%7D";
        assert_eq!(
            relation_kind_for_endpoint(url),
            Some(RelationKind::Following)
        );
    }

    #[test]
    fn classifies_followers_endpoint() {
        let url = "https://x.com/i/api/graphql/abc123XYZ/Followers";
        assert_eq!(
            relation_kind_for_endpoint(url),
            Some(RelationKind::Followers)
        );
    }

    #[test]
    fn classifies_verified_followers_endpoint() {
        let url = "https://x.com/i/api/graphql/q/BlueVerifiedFollowers";
        assert_eq!(
            relation_kind_for_endpoint(url),
            Some(RelationKind::Followers)
        );
    }

    #[test]
    fn ignores_other_operations() {
        for url in [
            "https://x.com/i/api/graphql/abc/UserByScreenName",
            "https://x.com/i/api/graphql/abc/Following/extra",
            "https://x.com/i/api/2/notifications/all.json",
            "https://x.com/alice/following",
            "not a url",
        ] {
            assert_eq!(relation_kind_for_endpoint(url), None, "{}", url);
        }
    }
}
