use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::config::SourceConfig;
use crate::cursor::CursorStore;
use crate::error::Result;
use crate::sink::EventSink;
use crate::types::{Credential, CycleSummary, FeedApi, FeedResult, NormalizedEvent, PollWindow};

/// Orchestrates one poll for one source: read the cursor, fetch the window,
/// emit normalized events, in that order. The cursor is advanced when the
/// window is computed, so a failed fetch is retried by the next scheduled
/// invocation over roughly the same window.
pub struct PollCycle {
    data_root: PathBuf,
    feed: Arc<dyn FeedApi>,
    sink: Arc<dyn EventSink>,
}

impl PollCycle {
    pub fn new<P: Into<PathBuf>>(data_root: P, feed: Arc<dyn FeedApi>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            data_root: data_root.into(),
            feed,
            sink,
        }
    }

    pub async fn run(&self, source_name: &str, credential: &Credential) -> Result<CycleSummary> {
        match self.run_inner(source_name, credential).await {
            Ok(summary) => {
                crate::metrics::cycle::completed();
                Ok(summary)
            }
            Err(e) => {
                crate::metrics::cycle::aborted(e.kind());
                Err(e)
            }
        }
    }

    #[instrument(skip(self, credential), fields(source = %source_name))]
    async fn run_inner(&self, source_name: &str, credential: &Credential) -> Result<CycleSummary> {
        // Misconfigured sources are rejected before the cursor moves or the
        // network is touched.
        credential.validate()?;

        let cursor = CursorStore::for_source(&self.data_root, source_name);
        let now = Utc::now().timestamp();
        let since = cursor.load_window(now)?;
        debug!(since, "poll window computed");

        let window = PollWindow {
            since_epoch_seconds: since,
        };
        let result = self.feed.fetch_since(credential, window).await?;

        let events_emitted = match result {
            FeedResult::List(items) => {
                let count = items.len();
                for payload in items {
                    let event = NormalizedEvent {
                        source: source_name.to_string(),
                        payload,
                    };
                    self.sink.emit(&event).await?;
                }
                crate::metrics::cycle::events_emitted(count);
                count
            }
            FeedResult::NotAList(value) => {
                // An error envelope or empty payload is a valid zero-event
                // cycle, not a failure.
                debug!(message_type = json_type_name(&value), "feed message was not a list");
                0
            }
        };

        info!(events = events_emitted, since, "poll cycle complete");
        Ok(CycleSummary {
            source: source_name.to_string(),
            since_epoch_seconds: since,
            events_emitted,
        })
    }
}

/// Result of polling one configured source; errors stay attached to the
/// source they came from.
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<CycleSummary>,
}

/// Polls each source in turn. A failing source is logged and reported in its
/// outcome; the remaining sources still run.
pub async fn run_sources(cycle: &PollCycle, sources: &[SourceConfig]) -> Vec<SourceOutcome> {
    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        let result = match source.credential() {
            Ok(credential) => cycle.run(&source.name, &credential).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(source = %source.name, kind = e.kind(), "poll cycle aborted: {e}");
        }
        outcomes.push(SourceOutcome {
            source: source.name.clone(),
            result,
        });
    }
    outcomes
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
