//! # Legacy Kafka Client Library
//!
//! Wire codec and async client for the pre-0.8 Kafka protocol.
//!
//! ## Features
//!
//! - **Message frames**: format versions 0 and 1, CRC32 checked
//! - **Compression**: pluggable codec registry, gzip built in, nested
//!   compressed message sets flattened on decode
//! - **Requests**: produce, fetch and offsets frames
//! - **Async/Await**: tokio connection layer with timeouts
//! - **Observability**: tracing logs and atomic client metrics
//!
//! ## Codec Example
//!
//! ```rust
//! use kafka_legacy_client::*;
//!
//! let frame = Message::new("testing").encode();
//! assert_eq!(&frame[..4], &[0u8, 0, 0, 13]);
//!
//! let (consumed, messages) = decode_with_default_codecs(&frame)?;
//! assert_eq!(consumed, frame.len());
//! assert_eq!(messages[0].payload().as_ref(), b"testing");
//! # Ok::<(), KafkaClientError>(())
//! ```
//!
//! ## Producer Example
//!
//! ```rust,no_run
//! use kafka_legacy_client::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let producer = ProducerBuilder::new()
//!         .brokers(vec!["localhost:9092"])
//!         .topic("my-topic")
//!         .compression(CompressionType::Gzip)
//!         .build()
//!         .await?;
//!
//!     producer.publish_batch(vec!["hello", "legacy", "kafka"]).await?;
//!     producer.close().await
//! }
//! ```
//!
//! ## Consumer Example
//!
//! ```rust,no_run
//! use kafka_legacy_client::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let consumer = ConsumerBuilder::new()
//!         .brokers(vec!["localhost:9092"])
//!         .topic("my-topic")
//!         .build()
//!         .await?;
//!
//!     for record in consumer.poll().await? {
//!         println!("offset={} value={}",
//!                  record.offset, String::from_utf8_lossy(record.payload()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod client;
pub mod codec;
pub mod compression;
pub mod config;
pub mod connection;
pub mod consumer;
pub mod error;
pub mod message;
pub mod metrics;
pub mod producer;
pub mod request;

pub use client::*;
pub use compression::{default_codecs, CodecRegistry, CompressionCodec, CompressionType, GzipCodec};
pub use config::*;
pub use consumer::*;
pub use error::*;
pub use message::{
    decode_messages, decode_with_default_codecs, encode_message_set, FormatVersion, Message,
    MessageDecoder,
};
pub use producer::*;
pub use request::{
    decode_offsets, encode_fetch_request, encode_offsets_request, encode_produce_request,
    encode_request_header, Broker, Offset, PartitionId, RequestType, TopicName, TopicPartition,
    EARLIEST_TIME, LATEST_TIME,
};

/// Client library result type
pub type Result<T> = std::result::Result<T, KafkaClientError>;

/// Client library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
