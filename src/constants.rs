/// Feed endpoint defaults. `config.toml` can override both, which is how the
/// tests and staging mirrors point the client at a local server.
pub const DEFAULT_FEED_HOST: &str = "api.isightpartners.com";
pub const DEFAULT_FEED_PATH: &str = "/view/iocs";

// Authentication headers expected by the feed
pub const AUTH_HEADER: &str = "X-Auth";
pub const AUTH_HASH_HEADER: &str = "X-Auth-Hash";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A source polled for the first time reaches back 90 days.
pub const FIRST_RUN_LOOKBACK_SECS: i64 = 90 * 86_400;

/// Overlap subtracted from the cursor basis so feed-side clock skew and
/// backfill don't drop records between cycles.
pub const WINDOW_OVERLAP_SECS: i64 = 86_400;

/// The cursor file retains the last two poll stamps.
pub const CURSOR_ENTRIES_KEPT: usize = 2;

/// Cursor files live under `<data_root>/lookups/`.
pub const LOOKUP_DIR: &str = "lookups";
