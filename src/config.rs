use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cli::Args;
use crate::probe::{DEFAULT_PAYLOAD_SIZE, get_identifier};

/// Default hop ceiling
pub const DEFAULT_MAX_TTL: u8 = 30;
/// Default per-hop receive timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Runtime configuration for a trace, derived from CLI args
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Highest TTL probed before giving up
    pub max_ttl: u8,
    /// How long to wait for an answer at each hop
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Zero-filled payload bytes after the 8-byte ICMP header
    pub payload_size: usize,
    /// Echo identifier stamped on every probe
    pub identifier: u16,
    /// Only accept responses whose quoted identifier/sequence match the probe
    pub match_probe: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_ttl: DEFAULT_MAX_TTL,
            timeout: DEFAULT_TIMEOUT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            identifier: get_identifier(),
            match_probe: false,
        }
    }
}

impl From<&Args> for TraceConfig {
    fn from(args: &Args) -> Self {
        Self {
            max_ttl: args.max_ttl,
            timeout: args.timeout_duration(),
            payload_size: args.payload_size,
            identifier: get_identifier(),
            match_probe: args.match_probe,
        }
    }
}

/// Serde helper for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
