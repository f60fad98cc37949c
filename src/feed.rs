use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::constants::{AUTH_HASH_HEADER, AUTH_HEADER};
use crate::error::{PollerError, Result, TransportStage};
use crate::signer;
use crate::types::{Credential, FeedApi, FeedResult, PollWindow};

/// Reqwest-backed feed client. One instance is shared across sources; the
/// per-call timeout is baked into the underlying client so a stalled feed
/// cannot block the invocation indefinitely.
pub struct HttpFeedClient {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedClient {
    pub fn new(host: &str, path: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PollerError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("https://{host}{path}"),
        })
    }

}

#[async_trait::async_trait]
impl FeedApi for HttpFeedClient {
    #[instrument(skip(self, credential))]
    async fn fetch_since(&self, credential: &Credential, window: PollWindow) -> Result<FeedResult> {
        let headers = signer::sign(credential)?;

        let since = window.since_epoch_seconds.to_string();
        let started = std::time::Instant::now();
        let response = self
            .client
            .get(&self.url)
            .query(&[("format", "json"), ("since", since.as_str())])
            .header(AUTH_HEADER, &headers.auth)
            .header(AUTH_HASH_HEADER, &headers.auth_hash)
            .send()
            .await
            .map_err(|e| {
                crate::metrics::feed::request_error();
                PollerError::Transport {
                    stage: TransportStage::Request,
                    source: e,
                }
            })?;

        // The feed reports failures inside the JSON envelope rather than via
        // status codes alone, so the body is read and parsed regardless.
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            crate::metrics::feed::request_error();
            PollerError::Transport {
                stage: TransportStage::ReadBody,
                source: e,
            }
        })?;

        crate::metrics::feed::request_success();
        crate::metrics::feed::request_duration(started.elapsed().as_secs_f64());
        debug!(status, bytes = body.len(), "feed response received");

        parse_envelope(&body)
    }
}

/// Parses the response envelope and extracts its `message` field.
///
/// A body that is not JSON, or an envelope with no `message` field at all, is
/// a protocol violation. A `message` that is present but not a list (an error
/// object, `null`) is a valid empty cycle and comes back as `NotAList` for
/// the caller to handle.
pub fn parse_envelope(body: &[u8]) -> Result<FeedResult> {
    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| PollerError::Protocol(format!("response body is not JSON: {e}")))?;

    let message = envelope
        .get("message")
        .cloned()
        .ok_or_else(|| PollerError::Protocol("envelope has no `message` field".into()))?;

    match message {
        Value::Array(items) => Ok(FeedResult::List(items)),
        other => Ok(FeedResult::NotAList(other)),
    }
}
