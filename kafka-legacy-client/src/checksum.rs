//! CRC32 checksum stamped on every legacy message frame

/// Size of the checksum field in a message frame
pub const CHECKSUM_SIZE: usize = 4;

/// IEEE CRC32 of `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Checksum of `data` as it appears on the wire (big-endian)
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    crc32(data).to_be_bytes()
}
