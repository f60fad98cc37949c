use serde::{Deserialize, Serialize};

use crate::error::{PollerError, Result};

/// Raw threat-indicator object as returned by the feed. The schema is owned
/// by the feed; records pass through untouched.
pub type RawItem = serde_json::Value;

/// Key pair for one logical source. Borrowed by the signer and feed client,
/// never persisted.
#[derive(Debug, Clone)]
pub struct Credential {
    pub public_key: String,
    pub private_key: String,
}

impl Credential {
    /// Both keys are opaque strings; the only validation the feed contract
    /// asks for is non-emptiness.
    pub fn validate(&self) -> Result<()> {
        if self.public_key.trim().is_empty() {
            return Err(PollerError::Config("public key is empty".into()));
        }
        if self.private_key.trim().is_empty() {
            return Err(PollerError::Config("private key is empty".into()));
        }
        Ok(())
    }
}

/// Lower time bound for one poll, derived from the cursor store each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub since_epoch_seconds: i64,
}

/// The feed envelope's `message` field, tagged so callers must handle the
/// non-list shape explicitly instead of duck-typing it.
#[derive(Debug, Clone)]
pub enum FeedResult {
    List(Vec<RawItem>),
    NotAList(RawItem),
}

/// One feed record tagged with the logical source that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub source: String,
    pub payload: RawItem,
}

/// Seam between the poll cycle and the network. Production uses
/// [`crate::feed::HttpFeedClient`]; tests substitute stubs.
#[async_trait::async_trait]
pub trait FeedApi: Send + Sync {
    async fn fetch_since(&self, credential: &Credential, window: PollWindow) -> Result<FeedResult>;
}

/// Outcome of one completed cycle, surfaced to the CLI for operator output.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub source: String,
    pub since_epoch_seconds: i64,
    pub events_emitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_requires_both_keys() {
        let cred = Credential {
            public_key: "pub".into(),
            private_key: "prv".into(),
        };
        assert!(cred.validate().is_ok());

        let blank_public = Credential {
            public_key: "   ".into(),
            private_key: "prv".into(),
        };
        assert!(matches!(
            blank_public.validate(),
            Err(PollerError::Config(_))
        ));

        let missing_private = Credential {
            public_key: "pub".into(),
            private_key: String::new(),
        };
        assert!(matches!(
            missing_private.validate(),
            Err(PollerError::Config(_))
        ));
    }
}
