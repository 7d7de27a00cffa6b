//! Connection management for legacy brokers

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::codec::ResponseCodec;
use crate::config::ClientConfig;
use crate::error::KafkaClientError;
use crate::metrics::global_metrics;
use crate::request::Response;
use crate::Result;

/// Single connection to a broker.
///
/// Legacy responses carry no correlation id, so a request that fails, times
/// out or is dropped mid-flight leaves the socket out of step. The connection
/// then counts as desynced and the next request reconnects first.
#[derive(Debug)]
pub struct BrokerConnection {
    pub broker: String,
    framed: Framed<TcpStream, ResponseCodec>,
    config: ClientConfig,
    request_timeout: Duration,
    desynced: bool,
}

impl BrokerConnection {
    /// Connect to `broker`
    pub async fn connect(broker: &str, config: &ClientConfig) -> Result<Self> {
        debug!("Creating connection to broker: {}", broker);

        let stream = match timeout(config.connection_timeout, TcpStream::connect(broker)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                global_metrics().record_connection_failed();
                return Err(KafkaClientError::connection(format!(
                    "Failed to connect to {}: {}",
                    broker, e
                )));
            }
            Err(_) => {
                global_metrics().record_connection_failed();
                return Err(KafkaClientError::timeout(
                    config.connection_timeout.as_millis() as u64,
                ));
            }
        };
        stream.set_nodelay(true)?;

        global_metrics().record_connection_created();
        info!("Connected to broker: {}", broker);

        Ok(Self {
            broker: broker.to_string(),
            framed: Framed::new(
                stream,
                ResponseCodec::with_max_frame_size(config.max_frame_size),
            ),
            config: config.clone(),
            request_timeout: config.request_timeout,
            desynced: false,
        })
    }

    /// Connect to the first reachable broker of the configuration
    pub async fn connect_any(config: &ClientConfig) -> Result<Self> {
        if config.brokers.is_empty() {
            return Err(KafkaClientError::NoBrokersAvailable);
        }

        for broker in &config.brokers {
            match Self::connect(broker, config).await {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    warn!("Failed to connect to broker {}: {}", broker, e);
                    continue;
                }
            }
        }

        Err(KafkaClientError::NoBrokersAvailable)
    }

    /// True when an earlier request left unread or partly written bytes
    pub fn is_desynced(&self) -> bool {
        self.desynced
    }

    /// Write one encoded request and flush it
    pub async fn send(&mut self, request: Bytes) -> Result<()> {
        if self.desynced {
            self.reconnect().await?;
        }
        debug!("Sending {} byte request to {}", request.len(), self.broker);

        self.desynced = true;
        timeout(self.request_timeout, self.framed.send(request))
            .await
            .map_err(|_| self.timed_out())??;
        self.desynced = false;
        Ok(())
    }

    /// Wait for the next response
    pub async fn receive(&mut self) -> Result<Response> {
        match timeout(self.request_timeout, self.framed.next()).await {
            Ok(Some(Ok(response))) => {
                debug!(
                    "Received response from {}: {} body bytes, error code {}",
                    self.broker,
                    response.body.len(),
                    response.raw_error_code
                );
                Ok(response)
            }
            Ok(Some(Err(e))) => {
                global_metrics().record_connection_error();
                Err(e)
            }
            Ok(None) => {
                global_metrics().record_connection_error();
                Err(KafkaClientError::connection(format!(
                    "Connection to {} closed by broker",
                    self.broker
                )))
            }
            Err(_) => Err(self.timed_out()),
        }
    }

    /// Send a request and wait for its response
    pub async fn request(&mut self, request: Bytes) -> Result<Response> {
        self.send(request).await?;

        self.desynced = true;
        let response = self.receive().await?;
        self.desynced = false;
        Ok(response)
    }

    async fn reconnect(&mut self) -> Result<()> {
        warn!(
            "Connection to {} has an unanswered request, reconnecting",
            self.broker
        );
        let broker = self.broker.clone();
        let config = self.config.clone();
        *self = Self::connect(&broker, &config).await?;
        Ok(())
    }

    /// Flush and shut down the connection
    pub async fn close(mut self) -> Result<()> {
        SinkExt::<Bytes>::close(&mut self.framed).await?;
        info!("Connection to {} closed", self.broker);
        Ok(())
    }

    fn timed_out(&self) -> KafkaClientError {
        warn!("Request to {} timed out", self.broker);
        KafkaClientError::timeout(self.request_timeout.as_millis() as u64)
    }
}
