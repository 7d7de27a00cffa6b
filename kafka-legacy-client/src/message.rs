//! # Legacy message frames
//!
//! Every message travels as a self-delimiting frame:
//!
//! ```text
//! v0: length(4) | magic=0(1) |                  checksum(4) | payload
//! v1: length(4) | magic=1(1) | compression(1) | checksum(4) | payload
//! ```
//!
//! `length` counts every byte after the length field. The checksum is the
//! CRC32 of the payload bytes as stored, so for compressed frames it covers the
//! compressed blob. A compressed payload expands into a message set: further
//! frames laid out back to back, which may themselves be compressed.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::{debug, trace};

use crate::checksum::{checksum, crc32, CHECKSUM_SIZE};
use crate::compression::{
    default_codecs, CodecRegistry, CompressionCodec, CompressionType, GZIP_COMPRESSION_ID,
    NO_COMPRESSION_ID,
};
use crate::error::KafkaClientError;
use crate::Result;

/// Size of the length prefix of a frame
pub const LENGTH_SIZE: usize = 4;

/// Largest frame accepted by [`MessageDecoder`] unless configured otherwise
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Compressed sets nested deeper than this are rejected
pub const MAX_NESTING_DEPTH: usize = 32;

/// Header layout selector, the "magic" byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FormatVersion {
    /// Predates the compression attribute
    V0 = 0,
    #[default]
    V1 = 1,
}

impl FormatVersion {
    /// Bytes between the length prefix and the payload
    pub fn header_size(self) -> usize {
        match self {
            FormatVersion::V0 => 1 + CHECKSUM_SIZE,
            FormatVersion::V1 => 2 + CHECKSUM_SIZE,
        }
    }
}

impl TryFrom<u8> for FormatVersion {
    type Error = KafkaClientError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(FormatVersion::V0),
            1 => Ok(FormatVersion::V1),
            other => Err(KafkaClientError::UnknownFormatVersion(other)),
        }
    }
}

/// One logical message as carried in a legacy frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    format_version: FormatVersion,
    compression: u8,
    checksum: [u8; CHECKSUM_SIZE],
    payload: Bytes,
}

impl Message {
    /// Uncompressed version 1 message
    pub fn new<P: Into<Bytes>>(payload: P) -> Self {
        Self::with_version(payload, FormatVersion::V1)
    }

    /// Uncompressed message using the given header layout
    pub fn with_version<P: Into<Bytes>>(payload: P, format_version: FormatVersion) -> Self {
        let payload = payload.into();
        Self {
            format_version,
            compression: NO_COMPRESSION_ID,
            checksum: checksum(&payload),
            payload,
        }
    }

    /// Version 1 message whose payload is compressed with `codec`.
    ///
    /// `payload` should already be an encoded message set, otherwise decoders
    /// cannot expand the frame.
    pub fn with_codec(payload: &[u8], codec: &dyn CompressionCodec) -> Result<Self> {
        let stored = codec.compress(payload)?;
        Ok(Self {
            format_version: FormatVersion::V1,
            compression: codec.id(),
            checksum: checksum(&stored),
            payload: stored,
        })
    }

    /// Gzip envelope holding a single inner message carrying `payload`
    pub fn compressed<P: Into<Bytes>>(payload: P) -> Result<Self> {
        Self::compressed_batch(&[Message::new(payload)])
    }

    /// Gzip envelope holding all `messages` as one inner message set
    pub fn compressed_batch(messages: &[Message]) -> Result<Self> {
        let codec = default_codecs().resolve(GZIP_COMPRESSION_ID)?;
        Self::compressed_with(messages, codec.as_ref())
    }

    /// Envelope holding all `messages`, compressed with `codec`
    pub fn compressed_with(messages: &[Message], codec: &dyn CompressionCodec) -> Result<Self> {
        let inner = encode_message_set(messages);
        Self::with_codec(&inner, codec)
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    /// Raw compression id (always 0 for version 0 frames)
    pub fn compression(&self) -> u8 {
        self.compression
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        CompressionType::try_from(self.compression)
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != NO_COMPRESSION_ID
    }

    pub fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        self.checksum
    }

    /// Payload as stored in the frame
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Size of the encoded frame, length prefix included
    pub fn encoded_len(&self) -> usize {
        LENGTH_SIZE + self.format_version.header_size() + self.payload.len()
    }

    /// Append the encoded frame to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u32((self.format_version.header_size() + self.payload.len()) as u32);
        buf.put_u8(self.format_version as u8);
        if self.format_version == FormatVersion::V1 {
            buf.put_u8(self.compression);
        }
        buf.put_slice(&self.checksum);
        buf.put_slice(&self.payload);
    }

    /// Encode the frame
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Check the stored checksum against the stored payload
    pub fn verify(&self) -> Result<()> {
        verify_checksum(self.checksum, &self.payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "magic={} compression={} checksum={:08X} payload={} bytes",
            self.format_version as u8,
            self.compression,
            u32::from_be_bytes(self.checksum),
            self.payload.len()
        )
    }
}

/// Concatenate the encoded frames of `messages`
pub fn encode_message_set(messages: &[Message]) -> Bytes {
    let size = messages.iter().map(Message::encoded_len).sum();
    let mut buf = BytesMut::with_capacity(size);
    for message in messages {
        message.encode_into(&mut buf);
    }
    buf.freeze()
}

fn verify_checksum(expected: [u8; CHECKSUM_SIZE], payload: &[u8]) -> Result<()> {
    let actual = crc32(payload);
    let expected = u32::from_be_bytes(expected);
    if actual != expected {
        return Err(KafkaClientError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Decode frames from `buf` using `codecs` and the default limits
pub fn decode_messages(buf: &[u8], codecs: &CodecRegistry) -> Result<(usize, Vec<Message>)> {
    MessageDecoder::new(codecs).decode(buf)
}

/// Decode frames from `buf` with the process-wide codecs
pub fn decode_with_default_codecs(buf: &[u8]) -> Result<(usize, Vec<Message>)> {
    decode_messages(buf, default_codecs())
}

/// Decompressed region still being walked
struct Region {
    bytes: Bytes,
    pos: usize,
}

/// Frame decoder bound to a codec registry
#[derive(Debug, Clone, Copy)]
pub struct MessageDecoder<'a> {
    codecs: &'a CodecRegistry,
    max_frame_size: usize,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(codecs: &'a CodecRegistry) -> Self {
        Self {
            codecs,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Largest declared frame length accepted before failing with `MalformedLength`.
    ///
    /// Also caps the bytes a single outer frame may expand to across all of
    /// its compressed levels.
    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Decode every complete frame in `buf`.
    ///
    /// Returns the number of bytes of `buf` consumed and the messages found,
    /// with compressed frames replaced by their contents. A trailing partial
    /// frame is left unconsumed and is not an error.
    pub fn decode(&self, buf: &[u8]) -> Result<(usize, Vec<Message>)> {
        let mut consumed = 0;
        let mut messages = Vec::new();

        while consumed < buf.len() {
            match self.decode_frame(&buf[consumed..])? {
                Some((len, mut inner)) => {
                    consumed += len;
                    messages.append(&mut inner);
                }
                None => break,
            }
        }

        trace!(
            "decoded {} messages from {} of {} bytes",
            messages.len(),
            consumed,
            buf.len()
        );
        Ok((consumed, messages))
    }

    /// Decode the first frame of `buf`, `None` when it is not complete yet
    pub fn decode_frame(&self, buf: &[u8]) -> Result<Option<(usize, Vec<Message>)>> {
        let Some((len, message)) = self.read_frame(buf)? else {
            return Ok(None);
        };

        let mut messages = Vec::new();
        if message.is_compressed() {
            self.expand(&message, &mut messages)?;
        } else {
            messages.push(message);
        }
        Ok(Some((len, messages)))
    }

    /// Walk a compressed frame depth first, keeping pending regions on the heap
    fn expand(&self, outer: &Message, out: &mut Vec<Message>) -> Result<()> {
        let mut budget = self.max_frame_size;
        let mut pending = vec![Region {
            bytes: self.inflate(outer, &mut budget)?,
            pos: 0,
        }];

        while let Some(region) = pending.last_mut() {
            if region.pos >= region.bytes.len() {
                pending.pop();
                continue;
            }

            let Some((len, inner)) = self.read_frame(&region.bytes[region.pos..])? else {
                return Err(KafkaClientError::protocol(format!(
                    "compressed message set ends mid-frame at byte {} of {}",
                    region.pos,
                    region.bytes.len()
                )));
            };
            region.pos += len;

            if !inner.is_compressed() {
                out.push(inner);
                continue;
            }

            if pending.len() >= MAX_NESTING_DEPTH {
                return Err(KafkaClientError::protocol(format!(
                    "compressed messages nested deeper than {}",
                    MAX_NESTING_DEPTH
                )));
            }
            let bytes = self.inflate(&inner, &mut budget)?;
            pending.push(Region { bytes, pos: 0 });
        }
        Ok(())
    }

    fn inflate(&self, message: &Message, budget: &mut usize) -> Result<Bytes> {
        let codec = self.codecs.resolve(message.compression)?;
        let bytes = codec.decompress_limited(&message.payload, *budget)?;
        *budget -= bytes.len();
        debug!(
            "expanded compressed message ({} -> {} bytes, codec {})",
            message.payload.len(),
            bytes.len(),
            message.compression
        );
        Ok(bytes)
    }

    /// Parse one frame without expanding it
    fn read_frame(&self, buf: &[u8]) -> Result<Option<(usize, Message)>> {
        if buf.len() < LENGTH_SIZE {
            return Ok(None);
        }

        let length = i64::from(i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]));
        let min = FormatVersion::V0.header_size();
        if length < min as i64 || length > self.max_frame_size as i64 {
            return Err(KafkaClientError::MalformedLength {
                length,
                min,
                max: self.max_frame_size,
            });
        }

        let length = length as usize;
        if buf.len() < LENGTH_SIZE + length {
            return Ok(None);
        }
        let frame = &buf[LENGTH_SIZE..LENGTH_SIZE + length];

        let format_version = FormatVersion::try_from(frame[0])?;
        let header_size = format_version.header_size();
        if length < header_size {
            return Err(KafkaClientError::MalformedLength {
                length: length as i64,
                min: header_size,
                max: self.max_frame_size,
            });
        }

        let compression = match format_version {
            FormatVersion::V0 => NO_COMPRESSION_ID,
            FormatVersion::V1 => frame[1],
        };
        let checksum_at = header_size - CHECKSUM_SIZE;
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(&frame[checksum_at..header_size]);

        let payload = &frame[header_size..];
        verify_checksum(stored, payload)?;

        let message = Message {
            format_version,
            compression,
            checksum: stored,
            payload: Bytes::copy_from_slice(payload),
        };
        Ok(Some((LENGTH_SIZE + length, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::GzipCodec;

    const TESTING_V1: [u8; 17] = [
        0x00, 0x00, 0x00, 0x0D, 0x01, 0x00, 0xE8, 0xF3, 0x5A, 0x06, 0x74, 0x65, 0x73, 0x74, 0x69,
        0x6E, 0x67,
    ];
    const TESTING_V0: [u8; 16] = [
        0x00, 0x00, 0x00, 0x0C, 0x00, 0xE8, 0xF3, 0x5A, 0x06, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E,
        0x67,
    ];

    #[test]
    fn test_message_creation() {
        let message = Message::new("testing");
        assert_eq!(message.format_version(), FormatVersion::V1);
        assert_eq!(message.compression(), 0);
        assert_eq!(message.checksum(), [0xE8, 0xF3, 0x5A, 0x06]);
        assert!(message.verify().is_ok());
    }

    #[test]
    fn test_message_encoding() {
        let message = Message::new("testing");
        assert_eq!(message.encode().as_ref(), &TESTING_V1);
        assert_eq!(message.encoded_len(), TESTING_V1.len());

        let decoded = decode_with_default_codecs(&message.encode()).unwrap();
        assert_eq!(decoded.0, TESTING_V1.len());
        assert_eq!(decoded.1, vec![message]);
    }

    #[test]
    fn test_v0_message_encoding() {
        let message = Message::with_version("testing", FormatVersion::V0);
        assert_eq!(message.encode().as_ref(), &TESTING_V0);
    }

    #[test]
    fn test_v0_decodes_like_v1() {
        let (len0, v0) = decode_with_default_codecs(&TESTING_V0).unwrap();
        let (len1, v1) = decode_with_default_codecs(&TESTING_V1).unwrap();

        assert_eq!(len0, TESTING_V0.len());
        assert_eq!(len1, TESTING_V1.len());
        assert_eq!(v0[0].format_version(), FormatVersion::V0);
        assert_eq!(v1[0].format_version(), FormatVersion::V1);
        assert_eq!(v0[0].payload(), v1[0].payload());
        assert_eq!(v0[0].checksum(), v1[0].checksum());
        assert_eq!(v0[0].payload().as_ref(), b"testing");
    }

    #[test]
    fn test_compressed_constructor_matches_explicit_gzip() {
        let inner = Message::new("testing").encode();
        let explicit = Message::with_codec(&inner, &GzipCodec::default()).unwrap();
        let convenient = Message::compressed("testing").unwrap();

        assert_eq!(explicit.encode(), convenient.encode());
        assert_eq!(convenient.compression(), GZIP_COMPRESSION_ID);
        assert_eq!(
            convenient.compression_type().unwrap(),
            CompressionType::Gzip
        );
        assert_eq!(convenient.checksum(), checksum(convenient.payload()));
    }

    #[test]
    fn test_compressed_message_roundtrip() {
        let message = Message::compressed("testing").unwrap();
        let encoded = message.encode();

        let (len, decoded) = decode_with_default_codecs(&encoded).unwrap();
        assert_eq!(len, encoded.len());
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].payload().as_ref(), b"testing");
        assert_eq!(decoded[0].checksum(), [0xE8, 0xF3, 0x5A, 0x06]);
        assert_eq!(decoded[0].format_version(), FormatVersion::V1);
        assert!(!decoded[0].is_compressed());
    }

    #[test]
    fn test_long_compressed_message_roundtrip() {
        // larger than the 100/200 byte scratch buffers older clients used
        let payload = "testing123 ".repeat(15);
        let message = Message::compressed(payload.clone()).unwrap();

        let (_, decoded) = decode_with_default_codecs(&message.encode()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].payload().as_ref(), payload.as_bytes());

        let payload = "x".repeat(64 * 1024);
        let message = Message::compressed(payload.clone()).unwrap();
        let (_, decoded) = decode_with_default_codecs(&message.encode()).unwrap();
        assert_eq!(decoded[0].payload().len(), payload.len());
    }

    #[test]
    fn test_multiple_compressed_messages() {
        let messages = vec![
            Message::new("testing"),
            Message::new("multiple"),
            Message::new("messages"),
        ];
        let envelope = Message::compressed_batch(&messages).unwrap();

        let (_, decoded) = decode_with_default_codecs(&envelope.encode()).unwrap();
        assert_eq!(decoded, messages);
    }

    #[test]
    fn test_nested_compression_is_flattened() {
        let inner = Message::compressed_batch(&[Message::new("a"), Message::new("b")]).unwrap();
        let outer =
            Message::compressed_batch(&[Message::new("first"), inner, Message::new("last")])
                .unwrap();

        let mut buf = BytesMut::new();
        outer.encode_into(&mut buf);
        Message::new("after").encode_into(&mut buf);

        let (len, decoded) = decode_with_default_codecs(&buf).unwrap();
        assert_eq!(len, buf.len());
        let payloads: Vec<&[u8]> = decoded.iter().map(|m| m.payload().as_ref()).collect();
        let expected: Vec<&[u8]> = vec![
            &b"first"[..],
            &b"a"[..],
            &b"b"[..],
            &b"last"[..],
            &b"after"[..],
        ];
        assert_eq!(payloads, expected);
    }

    #[test]
    fn test_partial_frame_consumes_nothing() {
        let encoded = Message::new("testing").encode();
        for cut in 0..encoded.len() {
            let (len, decoded) = decode_with_default_codecs(&encoded[..cut]).unwrap();
            assert_eq!(len, 0);
            assert!(decoded.is_empty());
        }
    }

    #[test]
    fn test_partial_trailing_frame_is_left_over() {
        let first = Message::new("complete").encode();
        let second = Message::compressed("x".repeat(300)).unwrap().encode();

        let mut buf = BytesMut::new();
        buf.put_slice(&first);
        buf.put_slice(&second[..second.len() - 1]);

        let (len, decoded) = decode_with_default_codecs(&buf).unwrap();
        assert_eq!(len, first.len());
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].payload().as_ref(), b"complete");
    }

    #[test]
    fn test_corrupt_payload_is_detected() {
        let encoded = Message::new("testing").encode();
        for i in FormatVersion::V1.header_size() + LENGTH_SIZE..encoded.len() {
            let mut corrupt = encoded.to_vec();
            corrupt[i] ^= 0x01;
            let result = decode_with_default_codecs(&corrupt);
            assert!(
                matches!(result, Err(KafkaClientError::ChecksumMismatch { .. })),
                "byte {} flipped",
                i
            );
        }
    }

    #[test]
    fn test_corrupt_compressed_payload_is_detected() {
        let mut corrupt = Message::compressed("testing").unwrap().encode().to_vec();
        let last = corrupt.len() - 3;
        corrupt[last] ^= 0xFF;

        let result = decode_with_default_codecs(&corrupt);
        assert!(matches!(
            result,
            Err(KafkaClientError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_codec() {
        let mut frame = Message::new("testing").encode().to_vec();
        frame[5] = 7;

        let result = decode_with_default_codecs(&frame);
        assert!(matches!(result, Err(KafkaClientError::UnknownCodec(7))));

        let gzip = Message::compressed("testing").unwrap().encode();
        let result = decode_messages(&gzip, &CodecRegistry::empty());
        assert!(matches!(result, Err(KafkaClientError::UnknownCodec(1))));
    }

    #[test]
    fn test_unknown_format_version() {
        let mut frame = TESTING_V0.to_vec();
        frame[4] = 2;

        let result = decode_with_default_codecs(&frame);
        assert!(matches!(
            result,
            Err(KafkaClientError::UnknownFormatVersion(2))
        ));
    }

    #[test]
    fn test_malformed_lengths() {
        let negative = [0xFF, 0xFF, 0xFF, 0xF0, 0x01];
        assert!(matches!(
            decode_with_default_codecs(&negative),
            Err(KafkaClientError::MalformedLength { length: -16, .. })
        ));

        let too_short = [0x00, 0x00, 0x00, 0x02, 0x01, 0x00];
        assert!(matches!(
            decode_with_default_codecs(&too_short),
            Err(KafkaClientError::MalformedLength { .. })
        ));

        // v1 frame too short to hold its own header
        let short_v1 = [0x00, 0x00, 0x00, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_with_default_codecs(&short_v1),
            Err(KafkaClientError::MalformedLength { min: 6, .. })
        ));

        let encoded = Message::new("testing").encode();
        let decoder = MessageDecoder::new(default_codecs()).max_frame_size(8);
        assert!(matches!(
            decoder.decode(&encoded),
            Err(KafkaClientError::MalformedLength { length: 13, .. })
        ));
    }

    #[test]
    fn test_truncated_compressed_set_is_an_error() {
        let inner = Message::new("testing").encode();
        let cut = &inner[..inner.len() - 2];
        let envelope = Message::with_codec(cut, &GzipCodec::default()).unwrap();

        let result = decode_with_default_codecs(&envelope.encode());
        assert!(matches!(result, Err(KafkaClientError::Protocol { .. })));
    }

    #[test]
    fn test_expansion_bounded_by_max_frame_size() {
        let envelope = Message::compressed(vec![0u8; 4 * 1024 * 1024])
            .unwrap()
            .encode();
        assert!(envelope.len() < 64 * 1024);

        let decoder = MessageDecoder::new(default_codecs()).max_frame_size(1024 * 1024);
        assert!(matches!(
            decoder.decode(&envelope),
            Err(KafkaClientError::Compression { .. })
        ));

        let (consumed, messages) = decode_with_default_codecs(&envelope).unwrap();
        assert_eq!(consumed, envelope.len());
        assert_eq!(messages[0].payload().len(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_nested_expansion_shares_one_budget() {
        let chunk = || Message::compressed(vec![7u8; 600 * 1024]).unwrap();
        let single = Message::compressed_batch(&[chunk()]).unwrap().encode();
        let double = Message::compressed_batch(&[chunk(), chunk()]).unwrap().encode();

        let decoder = MessageDecoder::new(default_codecs()).max_frame_size(1024 * 1024);
        let (_, messages) = decoder.decode(&single).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            decoder.decode(&double),
            Err(KafkaClientError::Compression { .. })
        ));
    }

    #[test]
    fn test_empty_payload() {
        let message = Message::new(Bytes::new());
        let (_, decoded) = decode_with_default_codecs(&message.encode()).unwrap();
        assert_eq!(decoded[0].payload().len(), 0);
        assert_eq!(decoded[0].checksum(), [0, 0, 0, 0]);

        let (len, decoded) = decode_with_default_codecs(&[]).unwrap();
        assert_eq!(len, 0);
        assert!(decoded.is_empty());

        let envelope = Message::compressed_batch(&[]).unwrap();
        let (_, decoded) = decode_with_default_codecs(&envelope.encode()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_display() {
        let text = Message::new("testing").to_string();
        assert_eq!(text, "magic=1 compression=0 checksum=E8F35A06 payload=7 bytes");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn build(payloads: &[Vec<u8>], version: FormatVersion, gzip: bool) -> Bytes {
            let messages: Vec<Message> = payloads
                .iter()
                .map(|p| Message::with_version(p.clone(), version))
                .collect();
            if gzip {
                Message::compressed_batch(&messages).unwrap().encode()
            } else {
                encode_message_set(&messages)
            }
        }

        proptest! {
            #[test]
            fn prop_message_set_roundtrip(
                payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..256), 0..8),
                v0 in any::<bool>(),
                gzip in any::<bool>(),
            ) {
                let version = if v0 { FormatVersion::V0 } else { FormatVersion::V1 };
                let buf = build(&payloads, version, gzip);

                let (consumed, messages) = decode_with_default_codecs(&buf).unwrap();
                prop_assert_eq!(consumed, buf.len());
                let decoded: Vec<Vec<u8>> = messages.iter().map(|m| m.payload().to_vec()).collect();
                prop_assert_eq!(decoded, payloads);
            }

            #[test]
            fn prop_prefix_never_errors(
                payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..128), 1..6),
                gzip in any::<bool>(),
                cut in any::<prop::sample::Index>(),
            ) {
                let buf = build(&payloads, FormatVersion::V1, gzip);
                let prefix = &buf[..cut.index(buf.len())];

                let (consumed, messages) = decode_with_default_codecs(prefix).unwrap();
                prop_assert!(consumed <= prefix.len());
                prop_assert!(messages.len() <= payloads.len());
                for (message, payload) in messages.iter().zip(&payloads) {
                    prop_assert_eq!(message.payload().as_ref(), &payload[..]);
                }
            }
        }
    }
}
