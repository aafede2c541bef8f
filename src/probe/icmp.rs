use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpTypes};

use crate::probe::checksum;

/// ICMP header size (fixed)
pub const ICMP_HEADER_SIZE: usize = 8;
/// Default payload size (standard ping, 64 bytes on the wire with the header)
pub const DEFAULT_PAYLOAD_SIZE: usize = 56;

/// Get process identifier for ICMP identification field
pub fn get_identifier() -> u16 {
    std::process::id() as u16
}

/// Build an ICMP Echo Request with a zero-filled payload
///
/// The checksum covers the whole message and is computed with the checksum
/// field zeroed. Length is always `ICMP_HEADER_SIZE + payload_size`.
pub fn build_echo_request(identifier: u16, sequence: u16, payload_size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; ICMP_HEADER_SIZE + payload_size];

    {
        // Buffer is never shorter than the echo header
        let Some(mut packet) = MutableEchoRequestPacket::new(&mut buffer) else {
            unreachable!("echo request buffer shorter than its header");
        };
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode::new(0));
        packet.set_checksum(0);
        packet.set_identifier(identifier);
        packet.set_sequence_number(sequence);
    }

    let cksum = checksum(&buffer);
    buffer[2..4].copy_from_slice(&cksum.to_be_bytes());

    buffer
}
