use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use tracing::debug;

/// Resolve a destination to an IPv4 address
///
/// Dotted-quad literals are returned unchanged. Anything else goes through the
/// system resolver and the first IPv4 answer wins. IPv6 literals and names
/// with only IPv6 records resolve to `None`.
pub fn resolve(host: &str) -> Option<Ipv4Addr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => {
                debug!(host, "IPv6 literal is not traceable over ICMPv4");
                None
            }
        };
    }

    let addrs = match format!("{}:0", host).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!(host, error = %e, "resolver lookup failed");
            return None;
        }
    };

    let found = addrs.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    });
    if found.is_none() {
        debug!(host, "no IPv4 address in resolver answer");
    }
    found
}
