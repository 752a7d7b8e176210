//! JSON-lines snapshot source over a file or stdin.
//!
//! Each non-blank line is one batch in the `SnapshotBatch::from_json` wire
//! shape. A line that fails to decode is delivered as a decode error and
//! the feed carries on with the next line.

use std::path::{Path, PathBuf};

use futures_util::stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::debug;

use farola_core::{SnapshotBatch, SnapshotFeed, SnapshotSource, SourceError};

use crate::input::is_stdin;

type LineReader = Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>;

#[derive(Debug, Clone)]
pub struct LineFeed {
    file: Option<PathBuf>,
}

impl LineFeed {
    /// `-` reads stdin.
    pub fn new(path: &Path) -> Self {
        Self {
            file: (!is_stdin(path)).then(|| path.to_path_buf()),
        }
    }

    fn open(&self) -> Result<LineReader, SourceError> {
        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.file {
            None => Box::new(tokio::io::stdin()),
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|e| SourceError::Connection {
                    reason: format!("{}: {e}", path.display()),
                })?;
                Box::new(tokio::fs::File::from_std(file))
            }
        };
        Ok(BufReader::new(reader).lines())
    }
}

impl SnapshotSource for LineFeed {
    fn subscribe(&self, collection: &str) -> Result<SnapshotFeed, SourceError> {
        let lines = self.open()?;
        debug!(collection, file = ?self.file, "opened line feed");

        // State goes to `None` after a read error so the stream ends.
        Ok(Box::pin(stream::unfold(Some(lines), |state| async move {
            let mut lines = state?;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => return Some((SnapshotBatch::from_json(&line), Some(lines))),
                    Ok(None) => return None,
                    Err(e) => {
                        let err = SourceError::Connection {
                            reason: e.to_string(),
                        };
                        return Some((Err(err), None));
                    }
                }
            }
        })))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::io::Write;

    #[tokio::test]
    async fn lines_become_batches_and_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"changes":[{{"id":"p-1","data":{{"online":true}}}}]}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"removed":["p-1"]}}"#).unwrap();

        let feed = LineFeed::new(file.path()).subscribe("postes").unwrap();
        let items: Vec<_> = feed.collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().upserts.len(), 1);
        assert!(matches!(items[1], Err(SourceError::Decode { .. })));
        assert_eq!(items[2].as_ref().unwrap().removed, vec!["p-1".to_owned()]);
    }

    #[test]
    fn missing_file_fails_to_subscribe() {
        let feed = LineFeed::new(Path::new("/nonexistent/farola-feed.jsonl"));
        assert!(matches!(
            feed.subscribe("postes"),
            Err(SourceError::Connection { .. })
        ));
    }
}
