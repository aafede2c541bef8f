use clap::Parser;
use std::time::Duration;

use crate::config::DEFAULT_MAX_TTL;
use crate::probe::DEFAULT_PAYLOAD_SIZE;

/// Largest payload that still fits an IPv4 datagram with both headers
const MAX_PAYLOAD_SIZE: usize = 65_000;
/// Lower bound on the per-hop wait, in seconds
const MIN_TIMEOUT_SECS: f64 = 0.001;
/// Upper bound on the per-hop wait, in seconds
const MAX_TIMEOUT_SECS: f64 = 60.0;

/// ICMP traceroute: probe each hop with increasing TTL and report who answers
#[derive(Parser, Debug, Clone)]
#[command(name = "tracehop")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Destination host (IPv4 address or hostname)
    pub destination: String,

    /// Maximum TTL (hops)
    #[arg(short = 'm', long = "max-ttl", default_value_t = DEFAULT_MAX_TTL)]
    pub max_ttl: u8,

    /// Per-hop timeout in seconds
    #[arg(short = 'w', long = "timeout", default_value = "3")]
    pub timeout: f64,

    /// Payload bytes after the ICMP header
    #[arg(long = "payload-size", default_value_t = DEFAULT_PAYLOAD_SIZE)]
    pub payload_size: usize,

    /// Ignore responses that do not quote this probe's identifier and sequence
    #[arg(long = "match-probe")]
    pub match_probe: bool,

    /// Print a JSON document instead of per-hop lines
    #[arg(long = "json")]
    pub json: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.max_ttl == 0 {
            return Err("Max TTL must be at least 1".into());
        }

        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err("Timeout must be positive".into());
        }

        if self.timeout < MIN_TIMEOUT_SECS {
            return Err(format!("Timeout must be at least {} seconds", MIN_TIMEOUT_SECS));
        }

        if self.timeout > MAX_TIMEOUT_SECS {
            return Err(format!("Timeout cannot exceed {} seconds", MAX_TIMEOUT_SECS));
        }

        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(format!("Payload size cannot exceed {}", MAX_PAYLOAD_SIZE));
        }

        Ok(())
    }
}
