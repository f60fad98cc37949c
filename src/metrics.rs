//! Poll-health counters behind the `metrics` facade. With no recorder
//! installed the macros are no-ops, so library callers pay nothing unless the
//! host wires up an exporter.

use std::net::SocketAddr;

use once_cell::sync::OnceCell;

/// Idempotent metrics bootstrap. Installs the Prometheus exporter only when
/// `INTELFEED_METRICS_ADDR` is set (e.g. `0.0.0.0:9898`); otherwise just
/// registers descriptions so series carry help text once a recorder exists.
pub fn init_metrics() {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_init(|| {
        if let Ok(raw) = std::env::var("INTELFEED_METRICS_ADDR") {
            match raw.parse::<SocketAddr>() {
                Ok(addr) => {
                    let builder = metrics_exporter_prometheus::PrometheusBuilder::new()
                        .with_http_listener(addr);
                    match builder.install() {
                        Ok(()) => tracing::info!(%addr, "prometheus exporter listening"),
                        Err(e) => tracing::warn!("prometheus exporter install failed: {e}"),
                    }
                }
                Err(e) => tracing::warn!("INTELFEED_METRICS_ADDR unparseable: {e}"),
            }
        }
        describe();
    });
}

fn describe() {
    ::metrics::describe_counter!(
        "intelfeed_feed_requests_success",
        "Feed requests that returned a readable body."
    );
    ::metrics::describe_counter!(
        "intelfeed_feed_requests_error",
        "Feed requests that failed in transport."
    );
    ::metrics::describe_histogram!(
        "intelfeed_feed_request_seconds",
        "Wall-clock duration of feed requests."
    );
    ::metrics::describe_counter!(
        "intelfeed_cycles_completed",
        "Poll cycles that ran to completion."
    );
    ::metrics::describe_counter!(
        "intelfeed_cycles_aborted",
        "Poll cycles aborted by a reported error, labeled by kind."
    );
    ::metrics::describe_counter!(
        "intelfeed_events_emitted",
        "Normalized events handed to the sink."
    );
}

pub mod feed {
    pub fn request_success() {
        ::metrics::counter!("intelfeed_feed_requests_success").increment(1);
    }

    pub fn request_error() {
        ::metrics::counter!("intelfeed_feed_requests_error").increment(1);
    }

    pub fn request_duration(seconds: f64) {
        ::metrics::histogram!("intelfeed_feed_request_seconds").record(seconds);
    }
}

pub mod cycle {
    pub fn completed() {
        ::metrics::counter!("intelfeed_cycles_completed").increment(1);
    }

    pub fn aborted(kind: &'static str) {
        ::metrics::counter!("intelfeed_cycles_aborted", "kind" => kind).increment(1);
    }

    pub fn events_emitted(count: usize) {
        ::metrics::counter!("intelfeed_events_emitted").increment(count as u64);
    }
}
