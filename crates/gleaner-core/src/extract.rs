//! Export-field extraction from raw payloads.
//!
//! Source records carry the same logical field at different nesting depths
//! depending on which API layer produced them. Each export field therefore
//! declares an ordered list of paths, tried in priority order; the first
//! defined non-empty value wins. The priority order is behaviorally
//! significant - it decides which value is exported when a record carries
//! conflicting values at two layers - so it is fixed here and nowhere else.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::record::ConnectionRecord;
use crate::types::{AccountName, RelationKind};

/// Ordered extraction paths per logical export field.
pub mod paths {
    pub const SCREEN_NAME: &[&[&str]] = &[&["legacy", "screen_name"], &["core", "screen_name"]];
    pub const DISPLAY_NAME: &[&[&str]] = &[&["legacy", "name"], &["core", "name"]];
    pub const BIO: &[&[&str]] = &[&["legacy", "description"], &["profile_bio", "description"]];
    pub const FOLLOWERS_COUNT: &[&[&str]] = &[&["legacy", "followers_count"]];
    pub const FOLLOWING_COUNT: &[&[&str]] = &[&["legacy", "friends_count"]];
    pub const POSTS_COUNT: &[&[&str]] = &[&["legacy", "statuses_count"]];
    pub const VERIFIED: &[&[&str]] = &[&["legacy", "verified"], &["verification", "verified"]];
    pub const BLUE_VERIFIED: &[&[&str]] = &[&["is_blue_verified"]];
    pub const AVATAR_URL: &[&[&str]] = &[
        &["legacy", "profile_image_url_https"],
        &["avatar", "image_url"],
    ];
    pub const BANNER_URL: &[&[&str]] = &[
        &["legacy", "profile_banner_url"],
        &["banner", "image_url"],
    ];
    pub const ACCOUNT_CREATED_AT: &[&[&str]] =
        &[&["legacy", "created_at"], &["core", "created_at"]];
}

fn lookup<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = payload;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// First defined non-empty string across the given paths.
pub fn first_string(payload: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(payload, path))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First defined integer across the given paths.
pub fn first_u64(payload: &Value, paths: &[&[&str]]) -> Option<u64> {
    paths
        .iter()
        .filter_map(|path| lookup(payload, path))
        .find_map(Value::as_u64)
}

/// First defined boolean across the given paths.
pub fn first_bool(payload: &Value, paths: &[&[&str]]) -> Option<bool> {
    paths
        .iter()
        .filter_map(|path| lookup(payload, path))
        .find_map(Value::as_bool)
}

/// One row of the flattened tabular export.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub user_id: String,
    pub screen_name: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub followers_count: Option<u64>,
    pub following_count: Option<u64>,
    pub posts_count: Option<u64>,
    pub verified: Option<bool>,
    pub blue_verified: Option<bool>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub account_created_at: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub source_account: String,
    pub relation_kind: RelationKind,
}

impl ExportRow {
    /// Column headers for the tabular form, in field order.
    pub const HEADERS: &'static [&'static str] = &[
        "user_id",
        "screen_name",
        "display_name",
        "bio",
        "followers_count",
        "following_count",
        "posts_count",
        "verified",
        "blue_verified",
        "avatar_url",
        "banner_url",
        "account_created_at",
        "collected_at",
        "source_account",
        "relation_kind",
    ];

    /// Flatten one record into an export row.
    pub fn from_record(
        account: &AccountName,
        kind: RelationKind,
        record: &ConnectionRecord,
    ) -> Self {
        let payload = &record.raw_payload;

        Self {
            user_id: record.id.to_string(),
            screen_name: first_string(payload, paths::SCREEN_NAME),
            display_name: first_string(payload, paths::DISPLAY_NAME),
            bio: first_string(payload, paths::BIO),
            followers_count: first_u64(payload, paths::FOLLOWERS_COUNT),
            following_count: first_u64(payload, paths::FOLLOWING_COUNT),
            posts_count: first_u64(payload, paths::POSTS_COUNT),
            verified: first_bool(payload, paths::VERIFIED),
            blue_verified: first_bool(payload, paths::BLUE_VERIFIED),
            avatar_url: first_string(payload, paths::AVATAR_URL),
            banner_url: first_string(payload, paths::BANNER_URL),
            account_created_at: first_string(payload, paths::ACCOUNT_CREATED_AT),
            collected_at: record.collected_at,
            source_account: account.to_string(),
            relation_kind: kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn earlier_path_wins_on_conflict() {
        let payload = json!({
            "legacy": {"screen_name": "legacy_name"},
            "core": {"screen_name": "core_name"},
        });
        assert_eq!(
            first_string(&payload, paths::SCREEN_NAME).as_deref(),
            Some("legacy_name")
        );
    }

    #[test]
    fn empty_string_falls_through() {
        let payload = json!({
            "legacy": {"screen_name": ""},
            "core": {"screen_name": "core_name"},
        });
        assert_eq!(
            first_string(&payload, paths::SCREEN_NAME).as_deref(),
            Some("core_name")
        );
    }

    #[test]
    fn missing_everywhere_is_none() {
        let payload = json!({"legacy": {}});
        assert_eq!(first_string(&payload, paths::BIO), None);
        assert_eq!(first_u64(&payload, paths::FOLLOWERS_COUNT), None);
        assert_eq!(first_bool(&payload, paths::VERIFIED), None);
    }

    #[test]
    fn flattens_a_record() {
        let record = ConnectionRecord {
            id: UserId::new("42").unwrap(),
            collected_at: Utc.timestamp_opt(1000, 0).unwrap(),
            last_seen: Utc.timestamp_opt(2000, 0).unwrap(),
            raw_payload: json!({
                "rest_id": "42",
                "is_blue_verified": true,
                "legacy": {
                    "screen_name": "carol",
                    "name": "Carol",
                    "description": "hi",
                    "followers_count": 10,
                    "friends_count": 20,
                    "statuses_count": 30,
                },
            }),
            sort_index: None,
            entry_id: None,
        };

        let account = AccountName::new("alice").unwrap();
        let row = ExportRow::from_record(&account, RelationKind::Followers, &record);

        assert_eq!(row.user_id, "42");
        assert_eq!(row.screen_name.as_deref(), Some("carol"));
        assert_eq!(row.followers_count, Some(10));
        assert_eq!(row.following_count, Some(20));
        assert_eq!(row.posts_count, Some(30));
        assert_eq!(row.blue_verified, Some(true));
        assert_eq!(row.verified, None);
        assert_eq!(row.source_account, "alice");
        assert_eq!(row.relation_kind, RelationKind::Followers);
    }
}
