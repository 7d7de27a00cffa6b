//! Consumer client for fetching messages from a legacy broker

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::compression::default_codecs;
use crate::config::{ClientConfig, ConsumerConfig, ConsumerConfigBuilder};
use crate::connection::BrokerConnection;
use crate::error::KafkaClientError;
use crate::message::{Message, MessageDecoder};
use crate::metrics::{global_metrics, Timer};
use crate::request::{decode_offsets, Broker, Offset, PartitionId, TopicName};
use crate::Result;

/// Message fetched from a partition.
///
/// `offset` is the byte offset of the outer frame the message arrived in, so
/// messages unpacked from one compressed envelope share the same offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeRecord {
    pub topic: TopicName,
    pub partition: PartitionId,
    pub offset: Offset,
    pub message: Message,
}

impl ConsumeRecord {
    pub fn payload(&self) -> &Bytes {
        self.message.payload()
    }
}

/// Fetches one topic partition, tracking the next offset locally
#[derive(Debug)]
pub struct Consumer {
    config: ConsumerConfig,
    broker: Broker,
    connection: Mutex<BrokerConnection>,
    offset: AtomicU64,
}

impl Consumer {
    /// Validate `config` and connect to the first reachable broker
    pub async fn new(config: ConsumerConfig) -> Result<Self> {
        config.validate()?;
        let connection = BrokerConnection::connect_any(&config.client_config).await?;
        let broker = Broker::new(connection.broker.clone(), config.topic.clone(), config.partition);

        info!(
            "Consumer for {} connected to {}, starting at offset {}",
            broker.topic_partition, broker.address, config.start_offset
        );

        Ok(Self {
            offset: AtomicU64::new(config.start_offset),
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

    /// Offset of the next fetch
    pub fn offset(&self) -> Offset {
        self.offset.load(Ordering::Acquire)
    }

    /// Move the next fetch to `offset`
    pub fn seek(&self, offset: Offset) {
        debug!("Seeking {} to offset {}", self.broker.topic_partition, offset);
        self.offset.store(offset, Ordering::Release);
    }

    /// Fetch once at the current offset.
    ///
    /// The offset advances by the bytes of complete frames received; a frame
    /// cut off by the fetch size is fetched again on the next poll.
    pub async fn poll(&self) -> Result<Vec<ConsumeRecord>> {
        let timer = Timer::start();
        let offset = self.offset();
        let request = self
            .broker
            .encode_fetch_request(offset, self.config.fetch_config.max_bytes)?;

        let response = self.connection.lock().await.request(request).await;
        let body = match response.and_then(|r| r.into_body(&self.fetch_context(offset))) {
            Ok(body) => body,
            Err(e) => {
                global_metrics().record_fetch_error();
                return Err(e);
            }
        };

        let (consumed, records) = match self.decode_records(&body, offset) {
            Ok(decoded) => decoded,
            Err(e) => {
                if matches!(e, KafkaClientError::ChecksumMismatch { .. }) {
                    global_metrics().record_checksum_failure();
                }
                global_metrics().record_fetch_error();
                return Err(e);
            }
        };

        if consumed == 0 && !body.is_empty() {
            warn!(
                "Fetch of {} bytes at {} returned no complete message; max_fetch_bytes may be too small",
                body.len(),
                self.fetch_context(offset)
            );
        }

        self.offset.store(offset + consumed as u64, Ordering::Release);
        global_metrics().record_fetch(records.len() as u64, consumed as u64, timer.elapsed());
        debug!(
            "Fetched {} messages ({} bytes) from {}, next offset {}",
            records.len(),
            consumed,
            self.broker.topic_partition,
            offset + consumed as u64
        );

        Ok(records)
    }

    /// Poll until `shutdown` fires or the receiver is dropped, forwarding
    /// every record to `tx` and sleeping `poll_interval` after empty polls.
    ///
    /// Shutdown is observed between polls; a fetch in flight always completes.
    pub async fn consume_on_channel(
        &self,
        tx: mpsc::Sender<ConsumeRecord>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        info!("Consuming {} onto channel", self.broker.topic_partition);

        loop {
            if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                break;
            }

            let records = self.poll().await?;

            if records.is_empty() {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = sleep(self.config.poll_interval) => continue,
                }
            }

            for record in records {
                if tx.send(record).await.is_err() {
                    debug!("Record receiver dropped, stopping consumption");
                    return Ok(());
                }
            }
        }

        info!("Consumer for {} shut down", self.broker.topic_partition);
        Ok(())
    }

    /// Offsets the broker holds before `time`, newest first.
    ///
    /// `time` is a timestamp in milliseconds or one of
    /// [`LATEST_TIME`](crate::request::LATEST_TIME) and
    /// [`EARLIEST_TIME`](crate::request::EARLIEST_TIME).
    pub async fn get_offsets(&self, time: i64, max_offsets: u32) -> Result<Vec<Offset>> {
        let request = self.broker.encode_offsets_request(time, max_offsets)?;
        let response = self.connection.lock().await.request(request).await?;
        let body = response.into_body(&self.broker.topic_partition.to_string())?;
        let offsets = decode_offsets(body)?;

        debug!(
            "Broker reported {} offsets for {} at time {}",
            offsets.len(),
            self.broker.topic_partition,
            time
        );
        Ok(offsets)
    }

    /// Close the consumer and its connection
    pub async fn close(self) -> Result<()> {
        self.connection.into_inner().close().await?;
        info!("Consumer for {} closed", self.broker.topic_partition);
        Ok(())
    }

    fn decode_records(&self, body: &[u8], base: Offset) -> Result<(usize, Vec<ConsumeRecord>)> {
        let decoder = MessageDecoder::new(default_codecs())
            .max_frame_size(self.config.client_config.max_frame_size);

        let mut consumed = 0;
        let mut records = Vec::new();
        while let Some((len, messages)) = decoder.decode_frame(&body[consumed..])? {
            let frame_offset = base + consumed as u64;
            records.extend(messages.into_iter().map(|message| ConsumeRecord {
                topic: self.broker.topic_partition.topic.clone(),
                partition: self.broker.topic_partition.partition,
                offset: frame_offset,
                message,
            }));
            consumed += len;
        }
        Ok((consumed, records))
    }

    fn fetch_context(&self, offset: Offset) -> String {
        format!("{}@{}", self.broker.topic_partition, offset)
    }
}

/// Builder for Consumer
pub struct ConsumerBuilder {
    config: ConsumerConfigBuilder,
}

impl ConsumerBuilder {
    pub fn new() -> Self {
        Self {
            config: ConsumerConfigBuilder::new(),
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

    pub fn start_offset(mut self, offset: Offset) -> Self {
        self.config = self.config.start_offset(offset);
        self
    }

    /// Set the maximum bytes requested per fetch
    pub fn max_fetch_bytes(mut self, max_bytes: u32) -> Self {
        self.config = self.config.max_fetch_bytes(max_bytes);
        self
    }

    pub fn poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.config = self.config.poll_interval(interval);
        self
    }

    /// Build the consumer and connect it
    pub async fn build(self) -> Result<Consumer> {
        Consumer::new(self.config.build()).await
    }
}

impl Default for ConsumerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
