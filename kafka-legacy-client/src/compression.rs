//! # Compression codecs
//!
//! Legacy message frames carry a one-byte compression attribute (format
//! version 1 only). A non-zero attribute means the stored payload is a
//! compressed message set that has to be expanded and decoded again.
//!
//! ## Supported Compression Types
//!
//! - **None** (0): stored as is, never looked up in the registry
//! - **GZIP** (1): gzip stream (header, deflate body, CRC/size trailer)
//!
//! Codecs are resolved through a [`CodecRegistry`] that is built once and then
//! shared read-only, either explicitly or through [`default_codecs`].

use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use tracing::trace;

use crate::error::KafkaClientError;
use crate::Result;

/// Compression id of an uncompressed payload
pub const NO_COMPRESSION_ID: u8 = 0;
/// Compression id of a gzip payload
pub const GZIP_COMPRESSION_ID: u8 = 1;

const READ_CHUNK: usize = 4096;

/// Compression types understood by the legacy protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    #[default]
    None = 0,
    Gzip = 1,
}

impl CompressionType {
    /// Numeric id written into the attribute byte
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Check if compression is enabled
    pub fn is_compressed(self) -> bool {
        !matches!(self, CompressionType::None)
    }
}

impl TryFrom<u8> for CompressionType {
    type Error = KafkaClientError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            NO_COMPRESSION_ID => Ok(CompressionType::None),
            GZIP_COMPRESSION_ID => Ok(CompressionType::Gzip),
            _ => Err(KafkaClientError::UnknownCodec(value)),
        }
    }
}

impl From<CompressionType> for u8 {
    fn from(compression_type: CompressionType) -> Self {
        compression_type as u8
    }
}

/// A compress/decompress pair identified by a compression id
pub trait CompressionCodec: Send + Sync + fmt::Debug {
    /// Id written into the attribute byte of frames using this codec
    fn id(&self) -> u8;

    /// Compress `data` into a self-contained stream
    fn compress(&self, data: &[u8]) -> Result<Bytes>;

    /// Expand a stream produced by [`CompressionCodec::compress`].
    ///
    /// Returns exactly the bytes produced, however many that is.
    fn decompress(&self, data: &[u8]) -> Result<Bytes>;

    /// Expand `data`, failing once the output grows past `max_size` bytes.
    ///
    /// The default expands everything before checking; streaming codecs
    /// should stop as soon as the limit is crossed.
    fn decompress_limited(&self, data: &[u8], max_size: usize) -> Result<Bytes> {
        let bytes = self.decompress(data)?;
        if bytes.len() > max_size {
            return Err(expanded_past(max_size));
        }
        Ok(bytes)
    }
}

fn expanded_past(max_size: usize) -> KafkaClientError {
    KafkaClientError::compression(format!(
        "decompressed payload exceeds {} bytes",
        max_size
    ))
}

/// Gzip codec (id 1)
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: flate2::Compression,
}

impl GzipCodec {
    pub fn new() -> Self {
        Self {
            level: flate2::Compression::default(),
        }
    }

    pub fn with_level(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level),
        }
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionCodec for GzipCodec {
    fn id(&self) -> u8 {
        GZIP_COMPRESSION_ID
    }

    fn compress(&self, data: &[u8]) -> Result<Bytes> {
        let mut buffer = Vec::with_capacity(data.len() / 2 + 32);
        let mut encoder = flate2::write::GzEncoder::new(&mut buffer, self.level);
        encoder.write_all(data)?;
        encoder.finish()?;

        trace!("gzip compressed {} bytes into {}", data.len(), buffer.len());
        Ok(Bytes::from(buffer))
    }

    fn decompress(&self, data: &[u8]) -> Result<Bytes> {
        self.decompress_limited(data, usize::MAX)
    }

    fn decompress_limited(&self, data: &[u8], max_size: usize) -> Result<Bytes> {
        // concatenated members expand to the concatenation of their contents
        let mut decoder = flate2::read::MultiGzDecoder::new(data);
        let capacity = data.len().saturating_mul(2).min(max_size.saturating_add(1));
        let mut buffer = Vec::with_capacity(capacity);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match decoder.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if buffer.len() > max_size {
                        return Err(expanded_past(max_size));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Streams cut after the deflate body still carry usable data.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !buffer.is_empty() => {
                    trace!("gzip stream ended early after {} bytes", buffer.len());
                    break;
                }
                Err(e) => {
                    return Err(KafkaClientError::compression(format!(
                        "gzip decompression failed: {}",
                        e
                    )))
                }
            }
        }

        trace!("gzip decompressed {} bytes into {}", data.len(), buffer.len());
        Ok(Bytes::from(buffer))
    }
}

/// Mapping from compression id to codec
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<u8, Arc<dyn CompressionCodec>>,
}

impl CodecRegistry {
    /// Registry without any codec; only uncompressed frames can be decoded
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Add a codec, replacing any codec registered under the same id.
    ///
    /// Id 0 is reserved for uncompressed payloads and is rejected.
    pub fn register(&mut self, codec: Arc<dyn CompressionCodec>) -> Result<()> {
        let id = codec.id();
        if id == NO_COMPRESSION_ID {
            return Err(KafkaClientError::invalid_config(
                "compression id 0 is reserved for uncompressed payloads",
            ));
        }
        self.codecs.insert(id, codec);
        Ok(())
    }

    /// Builder-style [`CodecRegistry::register`]
    pub fn with_codec(mut self, codec: Arc<dyn CompressionCodec>) -> Result<Self> {
        self.register(codec)?;
        Ok(self)
    }

    /// Look up a codec
    pub fn get(&self, id: u8) -> Option<&Arc<dyn CompressionCodec>> {
        self.codecs.get(&id)
    }

    /// Look up a codec, failing with `UnknownCodec` when absent
    pub fn resolve(&self, id: u8) -> Result<&Arc<dyn CompressionCodec>> {
        self.get(id).ok_or(KafkaClientError::UnknownCodec(id))
    }

    /// Codec for a compression type, `None` for uncompressed
    pub fn for_type(&self, compression: CompressionType) -> Result<Option<&Arc<dyn CompressionCodec>>> {
        match compression {
            CompressionType::None => Ok(None),
            other => self.resolve(other.id()).map(Some),
        }
    }

    pub fn contains(&self, id: u8) -> bool {
        self.codecs.contains_key(&id)
    }
}

impl Default for CodecRegistry {
    /// Registry holding the gzip codec
    fn default() -> Self {
        let mut codecs: HashMap<u8, Arc<dyn CompressionCodec>> = HashMap::new();
        codecs.insert(GZIP_COMPRESSION_ID, Arc::new(GzipCodec::new()));
        Self { codecs }
    }
}

static DEFAULT_CODECS: Lazy<CodecRegistry> = Lazy::new(CodecRegistry::default);

/// Process-wide registry with the default codecs
pub fn default_codecs() -> &'static CodecRegistry {
    &DEFAULT_CODECS
}
