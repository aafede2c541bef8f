use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::error::TransportError;

/// A datagram read from the receive endpoint
#[derive(Debug, Clone)]
pub struct Response {
    /// Raw bytes, starting at the IPv4 header
    pub bytes: Vec<u8>,
    pub source: Ipv4Addr,
    pub received_at: Instant,
}

/// Send/receive seam between the hop loop and the network
///
/// The raw-socket implementation lives in [`crate::probe::RawTransport`];
/// tests drive the hop loop through scripted implementations.
pub trait Transport {
    /// Set the outbound TTL for subsequent sends (send endpoint only)
    fn set_hop_limit(&mut self, ttl: u8) -> Result<(), TransportError>;

    /// Transmit a fully built probe to the destination
    ///
    /// Returns the instant taken immediately before transmission.
    fn send_probe(&mut self, packet: &[u8]) -> Result<Instant, TransportError>;

    /// Block until a datagram arrives or `wait` elapses
    ///
    /// Elapsed time is reported as [`TransportError::Timeout`].
    fn receive_response(&mut self, wait: Duration) -> Result<Response, TransportError>;

    /// Release both endpoints. Calling it again is a no-op.
    fn close(&mut self);
}
