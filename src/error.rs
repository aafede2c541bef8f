//! Error types for the probe transport.

use std::io;
use thiserror::Error;

/// Errors raised while acquiring or driving the raw ICMP endpoints.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("permission denied creating {endpoint} socket: {source}")]
    PermissionDenied {
        endpoint: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("out of resources creating {endpoint} socket: {source}")]
    ResourceExhausted {
        endpoint: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to create {endpoint} socket: {source}")]
    Open {
        endpoint: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to set socket options: {0}")]
    Configure(#[source] io::Error),

    #[error("failed to set TTL {ttl}: {source}")]
    HopLimit {
        ttl: u8,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send packet: {0}")]
    SendFailed(#[source] io::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to receive packet: {0}")]
    ReceiveFailed(#[source] io::Error),

    #[error("transport is closed")]
    Closed,
}

impl TransportError {
    /// Classify a socket creation failure for the given endpoint.
    pub fn from_open(endpoint: &'static str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied { endpoint, source };
        }
        match source.raw_os_error() {
            Some(libc::EPERM) | Some(libc::EACCES) => Self::PermissionDenied { endpoint, source },
            Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS) | Some(libc::ENOMEM) => {
                Self::ResourceExhausted { endpoint, source }
            }
            _ => Self::Open { endpoint, source },
        }
    }

    /// Classify a receive failure, folding the socket timeout into `Timeout`.
    pub fn from_recv(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::ReceiveFailed(source),
        }
    }

    /// Returns true for errors that must abort the run before any hop is probed.
    ///
    /// Everything else is absorbed by the hop loop and reported on that hop's line.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::ResourceExhausted { .. }
                | Self::Open { .. }
                | Self::Configure(_)
        )
    }
}
