//! Legacy broker request and response framing
//!
//! Every request is `length(4) | type(2) | topic_len(2) | topic | partition(4) | body`
//! where `length` counts every byte after the length field. Responses are
//! `length(4) | error_code(2) | body`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::{ErrorCode, KafkaClientError};
use crate::message::{encode_message_set, Message, LENGTH_SIZE};
use crate::Result;

pub type TopicName = String;
pub type PartitionId = u32;
pub type Offset = u64;

/// Size of the response header after the length prefix
pub const ERROR_CODE_SIZE: usize = 2;

/// Offsets request `time` asking for the latest offset
pub const LATEST_TIME: i64 = -1;
/// Offsets request `time` asking for the earliest offset
pub const EARLIEST_TIME: i64 = -2;

/// Request type codes accepted by legacy brokers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RequestType {
    Produce = 0,
    Fetch = 1,
    MultiFetch = 2,
    MultiProduce = 3,
    Offsets = 4,
}

impl RequestType {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for RequestType {
    type Error = KafkaClientError;

    fn try_from(code: u16) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(RequestType::Produce),
            1 => Ok(RequestType::Fetch),
            2 => Ok(RequestType::MultiFetch),
            3 => Ok(RequestType::MultiProduce),
            4 => Ok(RequestType::Offsets),
            other => Err(KafkaClientError::protocol(format!(
                "unknown request type {}",
                other
            ))),
        }
    }
}

/// Topic partition identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: TopicName,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub fn new<T: Into<TopicName>>(topic: T, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.topic, self.partition)
    }
}

/// Broker address plus the topic partition that requests target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broker {
    pub address: String,
    pub topic_partition: TopicPartition,
}

impl Broker {
    pub fn new<A: Into<String>, T: Into<TopicName>>(
        address: A,
        topic: T,
        partition: PartitionId,
    ) -> Self {
        Self {
            address: address.into(),
            topic_partition: TopicPartition::new(topic, partition),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic_partition.topic
    }

    pub fn partition(&self) -> PartitionId {
        self.topic_partition.partition
    }

    /// Standalone request header with a zero length placeholder
    pub fn encode_request_header(&self, request_type: RequestType) -> Result<BytesMut> {
        encode_request_header(request_type, self.topic(), self.partition())
    }

    pub fn encode_produce_request(&self, messages: &[Message]) -> Result<Bytes> {
        encode_produce_request(self.topic(), self.partition(), messages)
    }

    pub fn encode_fetch_request(&self, offset: Offset, max_size: u32) -> Result<Bytes> {
        encode_fetch_request(self.topic(), self.partition(), offset, max_size)
    }

    pub fn encode_offsets_request(&self, time: i64, max_offsets: u32) -> Result<Bytes> {
        encode_offsets_request(self.topic(), self.partition(), time, max_offsets)
    }
}

/// Longest topic name the 2-byte length field can carry
pub const MAX_TOPIC_LEN: usize = i16::MAX as usize;

/// Largest request body the 4-byte length field can carry
pub const MAX_REQUEST_SIZE: usize = i32::MAX as usize;

/// Request header preceded by a 4-byte zero placeholder for the length.
///
/// Frames built on top of it are finished with [`finish_request`]. Topics
/// longer than [`MAX_TOPIC_LEN`] bytes are rejected.
pub fn encode_request_header(
    request_type: RequestType,
    topic: &str,
    partition: PartitionId,
) -> Result<BytesMut> {
    if topic.len() > MAX_TOPIC_LEN {
        return Err(KafkaClientError::protocol(format!(
            "topic name of {} bytes exceeds {} bytes",
            topic.len(),
            MAX_TOPIC_LEN
        )));
    }

    let mut buf = BytesMut::with_capacity(LENGTH_SIZE + 2 + 2 + topic.len() + 4);
    buf.put_u32(0); // Placeholder for length
    buf.put_u16(request_type.code());
    buf.put_u16(topic.len() as u16);
    buf.put_slice(topic.as_bytes());
    buf.put_u32(partition);
    Ok(buf)
}

/// Fill in the length placeholder and freeze the request
pub fn finish_request(mut buf: BytesMut) -> Result<Bytes> {
    let total_len = buf.len().saturating_sub(LENGTH_SIZE);
    if total_len > MAX_REQUEST_SIZE {
        return Err(KafkaClientError::MessageTooLarge {
            size: total_len,
            max_size: MAX_REQUEST_SIZE,
        });
    }
    (&mut buf[0..LENGTH_SIZE]).put_u32(total_len as u32);
    Ok(buf.freeze())
}

/// PRODUCE request carrying `messages` as one message set
pub fn encode_produce_request(
    topic: &str,
    partition: PartitionId,
    messages: &[Message],
) -> Result<Bytes> {
    let message_set = encode_message_set(messages);
    if message_set.len() > MAX_REQUEST_SIZE {
        return Err(KafkaClientError::MessageTooLarge {
            size: message_set.len(),
            max_size: MAX_REQUEST_SIZE,
        });
    }

    let mut buf = encode_request_header(RequestType::Produce, topic, partition)?;
    buf.reserve(4 + message_set.len());
    buf.put_u32(message_set.len() as u32);
    buf.put_slice(&message_set);
    finish_request(buf)
}

/// FETCH request for at most `max_size` bytes starting at `offset`
pub fn encode_fetch_request(
    topic: &str,
    partition: PartitionId,
    offset: Offset,
    max_size: u32,
) -> Result<Bytes> {
    let mut buf = encode_request_header(RequestType::Fetch, topic, partition)?;
    buf.put_u64(offset);
    buf.put_u32(max_size);
    finish_request(buf)
}

/// OFFSETS request for up to `max_offsets` offsets before `time`
/// ([`LATEST_TIME`] and [`EARLIEST_TIME`] are special values)
pub fn encode_offsets_request(
    topic: &str,
    partition: PartitionId,
    time: i64,
    max_offsets: u32,
) -> Result<Bytes> {
    let mut buf = encode_request_header(RequestType::Offsets, topic, partition)?;
    buf.put_i64(time);
    buf.put_u32(max_offsets);
    finish_request(buf)
}

/// Response with the length prefix stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub error_code: ErrorCode,
    pub raw_error_code: i16,
    pub body: Bytes,
}

impl Response {
    /// Body of a successful response, the broker error otherwise
    pub fn into_body(self, context: &str) -> Result<Bytes> {
        if !self.error_code.is_ok() {
            return Err(self.error_code.to_client_error(context));
        }
        Ok(self.body)
    }
}

/// Length and error code of a response, `None` until 6 bytes are available
pub fn decode_response_header(buf: &[u8]) -> Result<Option<(usize, i16)>> {
    if buf.len() < LENGTH_SIZE + ERROR_CODE_SIZE {
        return Ok(None);
    }
    let mut header = &buf[..LENGTH_SIZE + ERROR_CODE_SIZE];
    let length = header.get_i32();
    if length < ERROR_CODE_SIZE as i32 {
        return Err(KafkaClientError::MalformedLength {
            length: i64::from(length),
            min: ERROR_CODE_SIZE,
            max: i32::MAX as usize,
        });
    }
    Ok(Some((length as usize, header.get_i16())))
}

/// Offsets listed in an OFFSETS response body: `count(4) | offset(8) * count`
pub fn decode_offsets(mut body: Bytes) -> Result<Vec<Offset>> {
    if body.remaining() < 4 {
        return Err(KafkaClientError::protocol(
            "Insufficient bytes for offset count",
        ));
    }
    let count = body.get_u32() as usize;
    if body.remaining() < count.saturating_mul(8) {
        return Err(KafkaClientError::protocol(format!(
            "Offsets response announces {} offsets but carries {} bytes",
            count,
            body.remaining()
        )));
    }

    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(body.get_u64());
    }
    Ok(offsets)
}
