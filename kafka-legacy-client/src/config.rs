//! Configuration types for the legacy Kafka client

use std::time::Duration;

use crate::compression::CompressionType;
use crate::error::KafkaClientError;
use crate::message::{FormatVersion, DEFAULT_MAX_FRAME_SIZE};
use crate::request::{Offset, PartitionId, TopicName};
use crate::Result;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Broker addresses, tried in order
    pub brokers: Vec<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Largest response or message frame accepted
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.brokers.is_empty() {
            return Err(KafkaClientError::invalid_config(
                "At least one broker must be specified",
            ));
        }
        if self.max_frame_size == 0 || self.max_frame_size > i32::MAX as usize {
            return Err(KafkaClientError::invalid_config(format!(
                "max_frame_size {} must be between 1 and {}",
                self.max_frame_size,
                i32::MAX
            )));
        }
        Ok(())
    }
}

/// Producer-specific configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Base client configuration
    pub client_config: ClientConfig,
    /// Topic to publish to
    pub topic: TopicName,
    /// Partition to publish to
    pub partition: PartitionId,
    /// Compression applied to each published batch
    pub compression: CompressionType,
    /// Header layout of uncompressed messages
    pub format_version: FormatVersion,
    /// Maximum payload size
    pub max_message_size: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            client_config: ClientConfig::default(),
            topic: String::new(),
            partition: 0,
            compression: CompressionType::None,
            format_version: FormatVersion::V1,
            max_message_size: 1024 * 1024, // 1MB
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> Result<()> {
        self.client_config.validate()?;
        validate_topic(&self.topic)?;
        if self.compression.is_compressed() && self.format_version == FormatVersion::V0 {
            return Err(KafkaClientError::invalid_config(
                "Format version 0 cannot carry compressed messages",
            ));
        }
        Ok(())
    }
}

/// Consumer-specific configuration
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Base client configuration
    pub client_config: ClientConfig,
    /// Topic to consume from
    pub topic: TopicName,
    /// Partition to consume from
    pub partition: PartitionId,
    /// Offset of the first fetch
    pub start_offset: Offset,
    /// Fetch configuration
    pub fetch_config: FetchConfig,
    /// Pause between polls that returned nothing
    pub poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            client_config: ClientConfig::default(),
            topic: String::new(),
            partition: 0,
            start_offset: 0,
            fetch_config: FetchConfig::default(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ConsumerConfig {
    pub fn validate(&self) -> Result<()> {
        self.client_config.validate()?;
        validate_topic(&self.topic)?;
        if self.fetch_config.max_bytes == 0 {
            return Err(KafkaClientError::invalid_config(
                "fetch max_bytes must be positive",
            ));
        }
        Ok(())
    }
}

fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(KafkaClientError::invalid_config("A topic must be specified"));
    }
    if topic.len() > i16::MAX as usize {
        return Err(KafkaClientError::invalid_config(format!(
            "Topic name of {} bytes is too long",
            topic.len()
        )));
    }
    Ok(())
}

/// Fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum fetch size in bytes
    pub max_bytes: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.brokers = brokers.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Builder for ProducerConfig
#[derive(Debug, Default)]
pub struct ProducerConfigBuilder {
    config: ProducerConfig,
}

impl ProducerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_config(mut self, client_config: ClientConfig) -> Self {
        self.config.client_config = client_config;
        self
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.client_config.brokers = brokers.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn topic<S: Into<TopicName>>(mut self, topic: S) -> Self {
        self.config.topic = topic.into();
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.config.partition = partition;
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn format_version(mut self, format_version: FormatVersion) -> Self {
        self.config.format_version = format_version;
        self
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn build(self) -> ProducerConfig {
        self.config
    }
}

/// Builder for ConsumerConfig
#[derive(Debug, Default)]
pub struct ConsumerConfigBuilder {
    config: ConsumerConfig,
}

impl ConsumerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_config(mut self, client_config: ClientConfig) -> Self {
        self.config.client_config = client_config;
        self
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.client_config.brokers = brokers.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn topic<S: Into<TopicName>>(mut self, topic: S) -> Self {
        self.config.topic = topic.into();
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.config.partition = partition;
        self
    }

    pub fn start_offset(mut self, offset: Offset) -> Self {
        self.config.start_offset = offset;
        self
    }

    pub fn fetch_config(mut self, fetch_config: FetchConfig) -> Self {
        self.config.fetch_config = fetch_config;
        self
    }

    pub fn max_fetch_bytes(mut self, max_bytes: u32) -> Self {
        self.config.fetch_config.max_bytes = max_bytes;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn build(self) -> ConsumerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfigBuilder::new()
            .brokers(vec!["broker1:9092", "broker2:9092"])
            .connection_timeout(Duration::from_secs(10))
            .max_frame_size(4096)
            .build();

        assert_eq!(config.brokers, vec!["broker1:9092", "broker2:9092"]);
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert_eq!(config.max_frame_size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_producer_config_builder() {
        let config = ProducerConfigBuilder::new()
            .brokers(vec!["localhost:9092"])
            .topic("test")
            .partition(2)
            .compression(CompressionType::Gzip)
            .max_message_size(2 * 1024 * 1024)
            .build();

        assert_eq!(config.client_config.brokers, vec!["localhost:9092"]);
        assert_eq!(config.topic, "test");
        assert_eq!(config.partition, 2);
        assert_eq!(config.compression, CompressionType::Gzip);
        assert_eq!(config.max_message_size, 2 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_producer_config_validation() {
        assert!(ProducerConfig::default().validate().is_err());

        let v0_gzip = ProducerConfigBuilder::new()
            .topic("test")
            .format_version(FormatVersion::V0)
            .compression(CompressionType::Gzip)
            .build();
        assert!(v0_gzip.validate().is_err());

        let no_brokers = ProducerConfigBuilder::new()
            .topic("test")
            .brokers(Vec::<String>::new())
            .build();
        assert!(matches!(
            no_brokers.validate(),
            Err(KafkaClientError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_consumer_config_builder() {
        let config = ConsumerConfigBuilder::new()
            .brokers(vec!["localhost:9092"])
            .topic("test")
            .partition(1)
            .start_offset(1024)
            .max_fetch_bytes(4096)
            .poll_interval(Duration::from_millis(50))
            .build();

        assert_eq!(config.topic, "test");
        assert_eq!(config.partition, 1);
        assert_eq!(config.start_offset, 1024);
        assert_eq!(config.fetch_config.max_bytes, 4096);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert!(config.validate().is_ok());

        let zero_fetch = ConsumerConfigBuilder::new()
            .topic("test")
            .max_fetch_bytes(0)
            .build();
        assert!(zero_fetch.validate().is_err());
    }
}
