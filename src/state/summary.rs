use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Destination as given on the command line and as resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceTarget {
    /// Original hostname or address string
    pub host: String,
    pub address: Ipv4Addr,
}

impl TraceTarget {
    pub fn new(host: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            host: host.into(),
            address,
        }
    }
}

/// How a trace ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Number of hop results handed to the sink
    pub hops: usize,
    /// Echo Reply seen before the hop ceiling
    pub reached: bool,
    /// TTL at which the destination answered
    pub destination_hop: Option<u8>,
}
