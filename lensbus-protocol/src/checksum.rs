//! Additive frame checksum

/// 8-bit truncated sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Verify a complete frame whose last byte is its checksum
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&stored, body)) => checksum(body) == stored,
        None => false,
    }
}
