pub mod config;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod signer;
pub mod sink;
pub mod types;

pub use error::{PollerError, Result};
pub use pipeline::PollCycle;
pub use types::{Credential, FeedResult, NormalizedEvent};
