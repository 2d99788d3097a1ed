//! The observed-response feed.
//!
//! A feed is an NDJSON stream of [`ObservedResponse`] values, one per line,
//! as written by a devtools exporter or proxy dump. It can be consumed to
//! EOF from any async reader, or a file can be tailed: existing lines are
//! replayed, then appends are picked up through a filesystem watcher with a
//! polling fallback.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use notify::{RecursiveMode, Watcher};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use gleaner_core::Result;
use gleaner_core::error::{Error, InvalidInputError, PersistenceError};

use crate::observed::ObservedResponse;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A stream of observed responses.
///
/// Malformed lines are skipped with a diagnostic; only I/O failures surface
/// as stream errors.
pub struct ResponseFeed {
    inner: Pin<Box<dyn Stream<Item = Result<ObservedResponse>> + Send>>,
}

impl ResponseFeed {
    /// Consume an async reader of NDJSON lines to EOF.
    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let stream = async_stream::stream! {
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(response) = parse_line(&line) {
                            yield Ok(response);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(Error::Persistence(PersistenceError::Read {
                            message: format!("feed read: {}", e),
                        }));
                        break;
                    }
                }
            }
        };

        Self {
            inner: Box::pin(stream),
        }
    }

    /// Tail a feed file: replay its current contents, then follow appends
    /// until the stream is dropped.
    pub fn tail_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("feed path {} has no file name", path.display()),
                })
            })?;

        let (tx, mut rx) = mpsc::channel::<Result<ObservedResponse>>(100);

        let position = Arc::new(Mutex::new(0u64));

        let watcher_position = position.clone();
        let watcher_path = path.clone();
        let watcher_tx = tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                if !matches!(
                    event.kind,
                    notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                ) {
                    return;
                }

                let is_feed = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().is_some_and(|n| n == file_name.as_os_str()));

                if is_feed {
                    // Runs on the watcher's own thread; blocking is fine.
                    for item in read_appended(&watcher_path, &watcher_position) {
                        if watcher_tx.blocking_send(item).is_err() {
                            return;
                        }
                    }
                }
            }
        })
        .map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: format!("create feed watcher: {}", e),
            })
        })?;

        watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("watch {}: {}", parent.display(), e),
                })
            })?;

        let poll_path = path.clone();
        tokio::spawn(async move {
            let _watcher = watcher;
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            loop {
                interval.tick().await;
                for item in read_appended(&poll_path, &position) {
                    if tx.send(item).await.is_err() {
                        debug!(path = %poll_path.display(), "Feed consumer gone, stopping tail");
                        return;
                    }
                }
            }
        });

        let stream = async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };

        Ok(Self {
            inner: Box::pin(stream),
        })
    }
}

impl Stream for ResponseFeed {
    type Item = Result<ObservedResponse>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

fn parse_line(line: &str) -> Option<ObservedResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(response) => Some(response),
        Err(e) => {
            warn!(error = %e, "Skipping malformed feed line");
            None
        }
    }
}

/// Read lines appended past the remembered position.
fn read_appended(
    path: &PathBuf,
    position: &Arc<Mutex<u64>>,
) -> Vec<Result<ObservedResponse>> {
    let mut out = Vec::new();

    let Ok(mut file) = File::open(path) else {
        return out;
    };

    let mut pos = position.lock().expect("feed position poisoned");
    if file.seek(SeekFrom::Start(*pos)).is_err() {
        return out;
    }

    let mut reader = BufReader::new(&file);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            // Stop at a partial trailing line; the writer is mid-append and
            // the next pass will pick it up whole.
            Ok(0) => break,
            Ok(_) if !line.ends_with('\n') => break,
            Ok(n) => {
                *pos += n as u64;
                if let Some(response) = parse_line(&line) {
                    out.push(Ok(response));
                }
            }
            Err(e) => {
                out.push(Err(Error::Persistence(PersistenceError::Read {
                    message: format!("feed tail read: {}", e),
                })));
                break;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::io::Write;

    fn feed_line(url: &str) -> String {
        format!("{{\"url\": \"{}\", \"body\": {{}}}}\n", url)
    }

    #[tokio::test]
    async fn reads_lines_to_eof() {
        let data = format!(
            "{}garbage line\n\n{}",
            feed_line("https://a.test/1"),
            feed_line("https://a.test/2")
        );

        let mut feed = ResponseFeed::from_reader(std::io::Cursor::new(data.into_bytes()));

        let first = feed.next().await.unwrap().unwrap();
        assert_eq!(first.url, "https://a.test/1");

        // The garbage and blank lines are skipped silently.
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(second.url, "https://a.test/2");

        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn tail_replays_then_follows_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.ndjson");
        std::fs::write(&path, feed_line("https://a.test/old")).unwrap();

        let mut feed = ResponseFeed::tail_file(&path).unwrap();

        let old = feed.next().await.unwrap().unwrap();
        assert_eq!(old.url, "https://a.test/old");

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(feed_line("https://a.test/new").as_bytes()).unwrap();
        file.flush().unwrap();

        let new = feed.next().await.unwrap().unwrap();
        assert_eq!(new.url, "https://a.test/new");
    }
}
