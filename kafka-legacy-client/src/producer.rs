//! Producer client for publishing messages to a legacy broker

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::compression::{default_codecs, CompressionType};
use crate::config::{ClientConfig, ProducerConfig, ProducerConfigBuilder};
use crate::connection::BrokerConnection;
use crate::error::KafkaClientError;
use crate::message::{FormatVersion, Message};
use crate::metrics::{global_metrics, Timer};
use crate::request::{Broker, PartitionId};
use crate::Result;

/// Publishes to one topic partition.
///
/// Legacy produce requests are never acknowledged: a publish succeeds once
/// the request has been written and flushed to the broker.
#[derive(Debug)]
pub struct Producer {
    config: ProducerConfig,
    broker: Broker,
    connection: Mutex<BrokerConnection>,
}

impl Producer {
    /// Validate `config` and connect to the first reachable broker
    pub async fn new(config: ProducerConfig) -> Result<Self> {
        config.validate()?;
        let connection = BrokerConnection::connect_any(&config.client_config).await?;
        let broker = Broker::new(connection.broker.clone(), config.topic.clone(), config.partition);

        info!(
            "Producer for {} connected to {}",
            broker.topic_partition, broker.address
        );

        Ok(Self {
            config,
            broker,
            connection: Mutex::new(connection),
        })
    }

    pub fn topic(&self) -> &str {
        self.broker.topic()
    }

    pub fn partition(&self) -> PartitionId {
        self.broker.partition()
    }

    /// Publish a single payload
    pub async fn publish<P: Into<Bytes>>(&self, payload: P) -> Result<()> {
        self.publish_batch(vec![payload]).await
    }

    /// Publish `payloads` in one produce request.
    ///
    /// With compression configured the batch travels as a single compressed
    /// envelope message.
    pub async fn publish_batch<I, P>(&self, payloads: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Bytes>,
    {
        let mut messages = Vec::new();
        for payload in payloads {
            let payload = payload.into();
            if payload.len() > self.config.max_message_size {
                global_metrics().record_publish_error();
                return Err(KafkaClientError::MessageTooLarge {
                    size: payload.len(),
                    max_size: self.config.max_message_size,
                });
            }
            messages.push(Message::with_version(payload, self.config.format_version));
        }

        if messages.is_empty() {
            return Ok(());
        }

        match default_codecs().for_type(self.config.compression)? {
            Some(codec) => {
                let envelope = Message::compressed_with(&messages, codec.as_ref())?;
                debug!(
                    "Compressed {} messages into a {} byte envelope",
                    messages.len(),
                    envelope.payload().len()
                );
                self.send_messages(&[envelope], messages.len()).await
            }
            None => self.send_messages(&messages, messages.len()).await,
        }
    }

    /// Publish pre-built messages as they are
    pub async fn publish_messages(&self, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        if let Some(message) = messages
            .iter()
            .find(|m| m.payload().len() > self.config.max_message_size)
        {
            global_metrics().record_publish_error();
            return Err(KafkaClientError::MessageTooLarge {
                size: message.payload().len(),
                max_size: self.config.max_message_size,
            });
        }
        self.send_messages(messages, messages.len()).await
    }

    /// Close the producer and its connection
    pub async fn close(self) -> Result<()> {
        self.connection.into_inner().close().await?;
        info!("Producer for {} closed", self.broker.topic_partition);
        Ok(())
    }

    async fn send_messages(&self, messages: &[Message], logical_count: usize) -> Result<()> {
        let timer = Timer::start();
        let request = self.broker.encode_produce_request(messages).map_err(|e| {
            global_metrics().record_publish_error();
            e
        })?;
        let request_len = request.len();

        let result = self.connection.lock().await.send(request).await;
        match result {
            Ok(()) => {
                global_metrics().record_publish(
                    logical_count as u64,
                    request_len as u64,
                    timer.elapsed(),
                );
                debug!(
                    "Published {} messages ({} bytes) to {}",
                    logical_count, request_len, self.broker.topic_partition
                );
                Ok(())
            }
            Err(e) => {
                global_metrics().record_publish_error();
                Err(e)
            }
        }
    }
}

/// Builder for Producer
pub struct ProducerBuilder {
    config: ProducerConfigBuilder,
}

impl ProducerBuilder {
    pub fn new() -> Self {
        Self {
            config: ProducerConfigBuilder::new(),
        }
    }

    /// Set the broker addresses
    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.brokers(brokers);
        self
    }

    pub fn client_config(mut self, client_config: ClientConfig) -> Self {
        self.config = self.config.client_config(client_config);
        self
    }

    pub fn topic<S: Into<String>>(mut self, topic: S) -> Self {
        self.config = self.config.topic(topic);
        self
    }

    pub fn partition(mut self, partition: PartitionId) -> Self {
        self.config = self.config.partition(partition);
        self
    }

    /// Compress each published batch
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.config = self.config.compression(compression);
        self
    }

    pub fn format_version(mut self, format_version: FormatVersion) -> Self {
        self.config = self.config.format_version(format_version);
        self
    }

    /// Set the maximum message size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config = self.config.max_message_size(size);
        self
    }

    /// Build the producer and connect it
    pub async fn build(self) -> Result<Producer> {
        Producer::new(self.config.build()).await
    }
}

impl Default for ProducerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::decode_with_default_codecs;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
        let mut len = [0u8; 4];
        socket.read_exact(&mut len).await.unwrap();
        let mut request = vec![0u8; u32::from_be_bytes(len) as usize];
        socket.read_exact(&mut request).await.unwrap();
        let mut frame = len.to_vec();
        frame.extend_from_slice(&request);
        frame
    }

    async fn fake_broker() -> (String, tokio::task::JoinHandle<Vec<Vec<u8>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut requests = Vec::new();
            loop {
                let mut len = [0u8; 4];
                match socket.peek(&mut len).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => requests.push(read_request(&mut socket).await),
                }
            }
            requests
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_publish_writes_produce_request() {
        let (addr, broker) = fake_broker().await;
        let producer = ProducerBuilder::new()
            .brokers(vec![addr])
            .topic("test")
            .build()
            .await
            .unwrap();

        producer.publish("testing").await.unwrap();
        producer.close().await.unwrap();

        let requests = broker.await.unwrap();
        assert_eq!(requests.len(), 1);
        let expected: [u8; 37] = [
            0x00, 0x00, 0x00, 0x21, 0x00, 0x00, 0x00, 0x04, 0x74, 0x65, 0x73, 0x74, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00, 0x0D, 0x01, 0x00, 0xE8, 0xF3,
            0x5A, 0x06, 0x74, 0x65, 0x73, 0x74, 0x69, 0x6E, 0x67,
        ];
        assert_eq!(requests[0], expected);
    }

    #[tokio::test]
    async fn test_publish_batch_with_gzip() {
        let (addr, broker) = fake_broker().await;
        let producer = ProducerBuilder::new()
            .brokers(vec![addr])
            .topic("test")
            .partition(3)
            .compression(CompressionType::Gzip)
            .build()
            .await
            .unwrap();

        producer
            .publish_batch(vec!["first", "second", "third"])
            .await
            .unwrap();
        producer.close().await.unwrap();

        let requests = broker.await.unwrap();
        let request = &requests[0];
        // len(4) type(2) topic_len(2) "test"(4) partition(4) set_len(4)
        assert_eq!(&request[12..16], &[0u8, 0, 0, 3]);
        let set = &request[20..];
        assert_eq!(&request[16..20], &(set.len() as u32).to_be_bytes());

        let (consumed, messages) = decode_with_default_codecs(set).unwrap();
        assert_eq!(consumed, set.len());
        let payloads: Vec<&[u8]> = messages.iter().map(|m| m.payload().as_ref()).collect();
        let expected: Vec<&[u8]> = vec![&b"first"[..], &b"second"[..], &b"third"[..]];
        assert_eq!(payloads, expected);
    }

    #[tokio::test]
    async fn test_publish_rejects_oversized_payload() {
        let (addr, broker) = fake_broker().await;
        let producer = ProducerBuilder::new()
            .brokers(vec![addr])
            .topic("test")
            .max_message_size(4)
            .build()
            .await
            .unwrap();

        let result = producer.publish("too large").await;
        assert!(matches!(
            result,
            Err(KafkaClientError::MessageTooLarge { size: 9, max_size: 4 })
        ));
        producer.close().await.unwrap();
        assert!(broker.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_requires_topic() {
        let result = ProducerBuilder::new()
            .brokers(vec!["127.0.0.1:1"])
            .build()
            .await;
        assert!(matches!(result, Err(KafkaClientError::InvalidConfig { .. })));
    }
}
