/// Internet checksum (RFC 1071) over an arbitrary byte buffer.
///
/// Words are summed in network byte order and the result is meant to be
/// written back big-endian; an odd trailing byte is padded with zero.
/// Running it over a buffer that already carries its checksum yields 0.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u32;
    }

    if let [last] = words.remainder() {
        sum += (*last as u32) << 8;
    }

    // Two folds are enough for any buffer that fits in memory
    sum = (sum >> 16) + (sum & 0xFFFF);
    sum += sum >> 16;

    !(sum as u16)
}
