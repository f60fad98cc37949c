use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::types::NormalizedEvent;

/// Downstream consumer of normalized events. The poll cycle is handed one of
/// these instead of reaching for a process-wide output handle.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &NormalizedEvent) -> Result<()>;
}

/// Appends one JSON line per event to a local NDJSON file.
pub struct NdjsonFileSink {
    path: PathBuf,
}

impl NdjsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl EventSink for NdjsonFileSink {
    async fn emit(&self, event: &NormalizedEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(event)
            .map_err(|e| crate::error::PollerError::Protocol(format!("event not serializable: {e}")))?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Collects events in memory; used by tests and `--dry-run` polls.
#[derive(Clone, Default)]
pub struct InMemorySink {
    events: Arc<Mutex<Vec<NormalizedEvent>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NormalizedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl EventSink for InMemorySink {
    async fn emit(&self, event: &NormalizedEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ndjson_sink_appends_one_line_per_event() {
        let dir = tempdir().unwrap();
        let sink = NdjsonFileSink::new(dir.path().join("events/out.ndjson"));

        for id in ["a", "b"] {
            let event = NormalizedEvent {
                source: "acme".into(),
                payload: json!({ "id": id }),
            };
            sink.emit(&event).await.unwrap();
        }

        let raw = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: NormalizedEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.source, "acme");
        assert_eq!(first.payload["id"], "a");
    }

    #[tokio::test]
    async fn in_memory_sink_preserves_order() {
        let sink = InMemorySink::new();
        for n in 0..3 {
            sink.emit(&NormalizedEvent {
                source: "acme".into(),
                payload: json!(n),
            })
            .await
            .unwrap();
        }
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].payload, json!(2));
    }
}
