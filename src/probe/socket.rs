use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::TransportError;
use crate::probe::transport::{Response, Transport};

/// Large enough for a full Ethernet-MTU datagram
const RECV_BUFFER_SIZE: usize = 1500;

/// Smallest wait SO_RCVTIMEO can hold; a zeroed timeval blocks forever
const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

/// Read timeout to arm for a requested wait, capped at `ceiling`
///
/// `None` means the wait is too short to express and must be reported as a
/// timeout without reading.
pub fn read_timeout_for(wait: Duration, ceiling: Duration) -> Option<Duration> {
    let wait = wait.min(ceiling);
    (wait >= MIN_READ_TIMEOUT).then_some(wait)
}

/// Create a raw ICMPv4 socket (requires CAP_NET_RAW or root)
pub fn create_raw_icmp_socket(endpoint: &'static str) -> Result<Socket, TransportError> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
        .map_err(|e| TransportError::from_open(endpoint, e))?;
    socket
        .set_nonblocking(false)
        .map_err(TransportError::Configure)?;
    Ok(socket)
}

/// Two raw ICMPv4 endpoints: one sends probes, the other listens for answers
///
/// Only the send socket ever has its TTL changed. Both sockets are released by
/// [`Transport::close`] or, failing that, on drop.
#[derive(Debug)]
pub struct RawTransport {
    send: Option<Socket>,
    recv: Option<Socket>,
    destination: Ipv4Addr,
    timeout: Duration,
    /// Read timeout currently applied to the receive socket
    applied_wait: Duration,
}

impl RawTransport {
    /// Acquire both endpoints and apply the receive timeout
    ///
    /// A socket created before a later step fails is closed before returning.
    pub fn open(destination: Ipv4Addr, timeout: Duration) -> Result<Self, TransportError> {
        let timeout = read_timeout_for(timeout, timeout).ok_or_else(|| {
            TransportError::Configure(io::Error::new(
                io::ErrorKind::InvalidInput,
                "receive timeout below 1µs",
            ))
        })?;

        let send = create_raw_icmp_socket("send")?;
        let recv = create_raw_icmp_socket("receive")?;

        recv.set_read_timeout(Some(timeout))
            .map_err(TransportError::Configure)?;

        debug!(%destination, ?timeout, "opened raw ICMP endpoints");

        Ok(Self {
            send: Some(send),
            recv: Some(recv),
            destination,
            timeout,
            applied_wait: timeout,
        })
    }

    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    pub fn is_open(&self) -> bool {
        self.send.is_some() || self.recv.is_some()
    }

    fn send_socket(&self) -> Result<&Socket, TransportError> {
        self.send.as_ref().ok_or(TransportError::Closed)
    }
}

impl Transport for RawTransport {
    fn set_hop_limit(&mut self, ttl: u8) -> Result<(), TransportError> {
        self.send_socket()?
            .set_ttl(ttl as u32)
            .map_err(|source| TransportError::HopLimit { ttl, source })
    }

    fn send_probe(&mut self, packet: &[u8]) -> Result<Instant, TransportError> {
        let socket = self.send_socket()?;
        let addr = SockAddr::from(SocketAddrV4::new(self.destination, 0));

        let sent_at = Instant::now();
        socket
            .send_to(packet, &addr)
            .map_err(TransportError::SendFailed)?;
        Ok(sent_at)
    }

    fn receive_response(&mut self, wait: Duration) -> Result<Response, TransportError> {
        let Some(wait) = read_timeout_for(wait, self.timeout) else {
            return Err(TransportError::Timeout);
        };

        let socket = self.recv.as_ref().ok_or(TransportError::Closed)?;

        // Only touch SO_RCVTIMEO when a shortened wait is requested
        if wait != self.applied_wait {
            socket
                .set_read_timeout(Some(wait))
                .map_err(TransportError::Configure)?;
            self.applied_wait = wait;
        }

        let mut buffer = [MaybeUninit::<u8>::uninit(); RECV_BUFFER_SIZE];
        let (len, from) = socket
            .recv_from(&mut buffer)
            .map_err(TransportError::from_recv)?;
        let received_at = Instant::now();

        // SAFETY: recv_from initialised the first `len` bytes
        let bytes = buffer[..len]
            .iter()
            .map(|b| unsafe { b.assume_init() })
            .collect();

        let source = from.as_socket_ipv4().map(|a| *a.ip()).ok_or_else(|| {
            TransportError::ReceiveFailed(io::Error::new(
                io::ErrorKind::InvalidData,
                "response from a non-IPv4 address",
            ))
        })?;

        Ok(Response {
            bytes,
            source,
            received_at,
        })
    }

    fn close(&mut self) {
        let had_send = self.send.take().is_some();
        let had_recv = self.recv.take().is_some();
        if had_send || had_recv {
            debug!(destination = %self.destination, "closed raw ICMP endpoints");
        }
    }
}

impl Drop for RawTransport {
    fn drop(&mut self) {
        self.close();
    }
}
