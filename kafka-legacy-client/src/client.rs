//! High-level client interface

use crate::config::ClientConfig;
use crate::consumer::ConsumerBuilder;
use crate::producer::ProducerBuilder;

/// Entry point sharing one client configuration between producers and consumers
#[derive(Debug, Clone)]
pub struct KafkaClient {
    config: ClientConfig,
}

impl KafkaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Client with default configuration for localhost
    pub fn localhost() -> Self {
        Self::new(ClientConfig::default())
    }

    /// Client with default configuration for `brokers`
    pub fn with_brokers<I, S>(brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = ClientConfig {
            brokers: brokers.into_iter().map(|s| s.into()).collect(),
            ..ClientConfig::default()
        };
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Producer builder preloaded with this client's configuration
    pub fn producer(&self) -> ProducerBuilder {
        ProducerBuilder::new().client_config(self.config.clone())
    }

    /// Consumer builder preloaded with this client's configuration
    pub fn consumer(&self) -> ConsumerBuilder {
        ConsumerBuilder::new().client_config(self.config.clone())
    }
}
