use pnet::packet::icmp::{IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;

use crate::probe::ICMP_HEADER_SIZE;

/// Smallest legal IPv4 header (IHL = 5)
const IPV4_MIN_HEADER_SIZE: usize = 20;

/// What kind of notification an inbound datagram carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Time Exceeded: the probe's TTL expired at an intermediate router
    TimeExceeded,
    /// Echo Reply: the probe reached the destination
    EchoReply,
    /// Any other ICMP type, kept raw for diagnostics
    Unexpected(u8),
    /// Header chain does not fit inside the datagram
    Malformed,
}

/// Echo identifier/sequence recovered from a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedProbe {
    pub identifier: u16,
    pub sequence: u16,
}

impl EmbeddedProbe {
    pub fn matches(&self, identifier: u16, sequence: u16) -> bool {
        self.identifier == identifier && self.sequence == sequence
    }
}

/// Result of classifying one inbound datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: ResponseKind,
    /// Present when the probe that triggered the response could be identified
    pub embedded: Option<EmbeddedProbe>,
}

impl Classification {
    fn malformed() -> Self {
        Self {
            kind: ResponseKind::Malformed,
            embedded: None,
        }
    }
}

/// Return the bytes that follow an IPv4 header, validating IHL against the buffer
///
/// Returns None when the buffer is shorter than a minimal header, when the
/// version is not 4, when IHL is below 5, or when IHL * 4 runs past the end
/// of the buffer.
fn ipv4_payload(data: &[u8]) -> Option<(Ipv4Packet<'_>, &[u8])> {
    let ip_packet = Ipv4Packet::new(data)?;
    if ip_packet.get_version() != 4 {
        return None;
    }
    let header_len = (ip_packet.get_header_length() as usize) * 4;
    if header_len < IPV4_MIN_HEADER_SIZE || header_len > data.len() {
        return None;
    }
    Some((ip_packet, &data[header_len..]))
}

/// Read identifier and sequence from bytes 4-7 of an echo header
fn echo_fields(icmp_data: &[u8]) -> Option<EmbeddedProbe> {
    if icmp_data.len() < ICMP_HEADER_SIZE {
        return None;
    }
    Some(EmbeddedProbe {
        identifier: u16::from_be_bytes([icmp_data[4], icmp_data[5]]),
        sequence: u16::from_be_bytes([icmp_data[6], icmp_data[7]]),
    })
}

/// Recover our echo request from the original datagram quoted in an ICMP error
///
/// Layout after the 8-byte ICMP error header: original IPv4 header (its own
/// IHL) followed by at least the first 8 bytes of the original ICMP message.
fn quoted_echo_request(icmp_data: &[u8]) -> Option<EmbeddedProbe> {
    let quoted = icmp_data.get(ICMP_HEADER_SIZE..)?;
    let (inner_ip, inner_icmp) = ipv4_payload(quoted)?;

    if inner_ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }
    if inner_icmp.first() != Some(&IcmpTypes::EchoRequest.0) {
        return None;
    }
    echo_fields(inner_icmp)
}

/// ICMP error types whose payload quotes the offending datagram
fn quotes_original(icmp_type: u8) -> bool {
    matches!(icmp_type, 3 | 4 | 5 | 11 | 12)
}

/// Classify a datagram read from a raw ICMPv4 socket (IP header included)
///
/// The outer header length is taken from IHL * 4 and checked against the
/// buffer before the ICMP header behind it is read. Never panics.
pub fn classify(data: &[u8]) -> Classification {
    let Some((_, icmp_data)) = ipv4_payload(data) else {
        return Classification::malformed();
    };
    let Some(icmp_packet) = IcmpPacket::new(icmp_data) else {
        return Classification::malformed();
    };

    let icmp_type = icmp_packet.get_icmp_type();
    match icmp_type {
        IcmpTypes::EchoReply => Classification {
            kind: ResponseKind::EchoReply,
            embedded: echo_fields(icmp_data),
        },
        IcmpTypes::TimeExceeded => Classification {
            kind: ResponseKind::TimeExceeded,
            embedded: quoted_echo_request(icmp_data),
        },
        other => Classification {
            kind: ResponseKind::Unexpected(other.0),
            embedded: if quotes_original(other.0) {
                quoted_echo_request(icmp_data)
            } else {
                None
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::build_echo_request;
    use proptest::prelude::*;

    /// Build an IPv4 header with the given IHL, carrying `payload`
    fn ipv4_datagram(ihl: u8, protocol: u8, payload: &[u8]) -> Vec<u8> {
        let header_len = ihl as usize * 4;
        let mut data = vec![0u8; header_len + payload.len()];
        data[0] = 0x40 | ihl;
        let total = data.len() as u16;
        data[2..4].copy_from_slice(&total.to_be_bytes());
        data[8] = 64;
        data[9] = protocol;
        data[12..16].copy_from_slice(&[10, 0, 0, 1]);
        data[16..20].copy_from_slice(&[192, 168, 1, 10]);
        data[header_len..].copy_from_slice(payload);
        data
    }

    fn echo_reply(identifier: u16, sequence: u16) -> Vec<u8> {
        let mut icmp = build_echo_request(identifier, sequence, 8);
        icmp[0] = 0;
        ipv4_datagram(5, 1, &icmp)
    }

    fn icmp_error(icmp_type: u8, identifier: u16, sequence: u16) -> Vec<u8> {
        let probe = build_echo_request(identifier, sequence, 56);
        let original = ipv4_datagram(5, 1, &probe[..8]);
        let mut icmp = vec![icmp_type, 0, 0, 0, 0, 0, 0, 0];
        icmp.extend_from_slice(&original);
        ipv4_datagram(5, 1, &icmp)
    }

    #[test]
    fn test_echo_reply() {
        let result = classify(&echo_reply(0x1234, 7));
        assert_eq!(result.kind, ResponseKind::EchoReply);
        assert_eq!(
            result.embedded,
            Some(EmbeddedProbe {
                identifier: 0x1234,
                sequence: 7
            })
        );
    }

    #[test]
    fn test_time_exceeded() {
        let result = classify(&icmp_error(11, 0x4321, 3));
        assert_eq!(result.kind, ResponseKind::TimeExceeded);
        let embedded = result.embedded.unwrap();
        assert!(embedded.matches(0x4321, 3));
        assert!(!embedded.matches(0x4321, 4));
    }

    #[test]
    fn test_unexpected_type_keeps_raw_code() {
        let result = classify(&icmp_error(3, 0x4321, 9));
        assert_eq!(result.kind, ResponseKind::Unexpected(3));
        assert!(result.embedded.unwrap().matches(0x4321, 9));

        let mut echo_request = ipv4_datagram(5, 1, &build_echo_request(1, 1, 8));
        echo_request[20] = 8;
        let result = classify(&echo_request);
        assert_eq!(result.kind, ResponseKind::Unexpected(8));
        assert_eq!(result.embedded, None);
    }

    #[test]
    fn test_header_length_five_reads_offset_20() {
        let mut data = vec![0u8; 28];
        data[0] = 0x45;
        data[20] = 11;
        assert_eq!(classify(&data).kind, ResponseKind::TimeExceeded);

        data[20] = 0;
        assert_eq!(classify(&data).kind, ResponseKind::EchoReply);
    }

    #[test]
    fn test_variable_ihl() {
        // IHL 6 (24 bytes, one word of options) moves ICMP to offset 24
        let mut icmp = build_echo_request(0xAAAA, 12, 8);
        icmp[0] = 0;
        let data = ipv4_datagram(6, 1, &icmp);
        assert_eq!(data[20], 0);
        let result = classify(&data);
        assert_eq!(result.kind, ResponseKind::EchoReply);
        assert!(result.embedded.unwrap().matches(0xAAAA, 12));
    }

    #[test]
    fn test_empty_and_truncated_are_malformed() {
        assert_eq!(classify(&[]).kind, ResponseKind::Malformed);
        assert_eq!(classify(&[0x45; 10]).kind, ResponseKind::Malformed);

        // Header only, no ICMP
        let data = ipv4_datagram(5, 1, &[]);
        assert_eq!(classify(&data).kind, ResponseKind::Malformed);
    }

    #[test]
    fn test_ihl_past_buffer_is_malformed() {
        let mut data = vec![0u8; 28];
        data[0] = 0x4F; // claims a 60-byte header
        data[20] = 11;
        assert_eq!(classify(&data).kind, ResponseKind::Malformed);
    }

    #[test]
    fn test_ihl_below_minimum_is_malformed() {
        let mut data = vec![0u8; 28];
        data[0] = 0x42;
        assert_eq!(classify(&data).kind, ResponseKind::Malformed);
    }

    #[test]
    fn test_non_ipv4_version_is_malformed() {
        let mut data = echo_reply(1, 1);
        data[0] = 0x65;
        assert_eq!(classify(&data).kind, ResponseKind::Malformed);
    }

    #[test]
    fn test_truncated_quote_has_no_embedded_probe() {
        let mut data = icmp_error(11, 0x4321, 3);
        data.truncate(20 + 8 + 20 + 4);
        let result = classify(&data);
        assert_eq!(result.kind, ResponseKind::TimeExceeded);
        assert_eq!(result.embedded, None);
    }

    proptest! {
        /// Random bytes should not panic when classified
        #[test]
        fn proptest_classify_no_panic(data in prop::collection::vec(0u8..=255, 0..1500)) {
            let _ = classify(&data);
        }

        /// The ICMP type is always read right after IHL * 4 bytes
        #[test]
        fn proptest_ihl_offset(ihl in 5u8..=15, icmp_type in 0u8..=255) {
            let mut payload = vec![0u8; 8];
            payload[0] = icmp_type;
            let data = ipv4_datagram(ihl, 1, &payload);

            let expected = match icmp_type {
                0 => ResponseKind::EchoReply,
                11 => ResponseKind::TimeExceeded,
                other => ResponseKind::Unexpected(other),
            };
            prop_assert_eq!(classify(&data).kind, expected);
        }

        #[test]
        fn proptest_short_packets_are_malformed(size in 0usize..24) {
            let data = vec![0x45u8; size];
            prop_assert_eq!(classify(&data).kind, ResponseKind::Malformed);
        }
    }
}
