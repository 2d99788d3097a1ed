use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI binary with an isolated data directory.
pub fn run_cli(args: &[&str], data_dir: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gleaner"));
    cmd.arg("--data-dir").arg(data_dir);
    cmd.args(args);
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// A response feed with one Following page of the given user ids, plus an
/// unrelated response and a malformed line the pipeline must skip.
pub fn following_feed(ids: &[&str]) -> String {
    let entries: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "entryId": format!("user-{}", id),
                "sortIndex": "1860000000000000",
                "content": {
                    "itemContent": {
                        "user_results": {
                            "result": {
                                "rest_id": id,
                                "is_blue_verified": false,
                                "legacy": {
                                    "screen_name": format!("user_{}", id),
                                    "name": format!("User {}", id),
                                    "description": "captured in a test",
                                    "followers_count": 5,
                                    "friends_count": 7,
                                    "statuses_count": 11,
                                }
                            }
                        }
                    }
                }
            })
        })
        .collect();

    let matching = serde_json::json!({
        "url": "https://x.com/i/api/graphql/q1/Following",
        "pageUrl": "https://x.com/alice/following",
        "body": {
            "data": {"user": {"result": {"timeline": {"timeline": {"instructions": [
                {"type": "TimelineAddEntries", "entries": entries}
            ]}}}}}
        }
    });

    let unrelated = serde_json::json!({
        "url": "https://x.com/i/api/graphql/q2/HomeTimeline",
        "body": {"data": {}}
    });

    format!("{}\n{}\nnot json at all\n", matching, unrelated)
}
