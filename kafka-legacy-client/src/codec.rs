//! `tokio_util` codec turning a broker socket into a stream of responses

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::{ErrorCode, KafkaClientError};
use crate::message::{DEFAULT_MAX_FRAME_SIZE, LENGTH_SIZE};
use crate::request::{decode_response_header, Response, ERROR_CODE_SIZE};

/// Client codec: writes pre-encoded requests, reads length-prefixed responses
#[derive(Debug, Clone)]
pub struct ResponseCodec {
    max_frame_size: usize,
}

impl ResponseCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Responses announcing more than `max_frame_size` bytes are rejected
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for ResponseCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Bytes> for ResponseCodec {
    type Error = KafkaClientError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Decoder for ResponseCodec {
    type Item = Response;
    type Error = KafkaClientError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((length, raw_error_code)) = decode_response_header(&src[..])? else {
            return Ok(None); // Need length and error code
        };

        if length > self.max_frame_size {
            return Err(KafkaClientError::MalformedLength {
                length: length as i64,
                min: ERROR_CODE_SIZE,
                max: self.max_frame_size,
            });
        }

        if src.len() < LENGTH_SIZE + length {
            src.reserve(LENGTH_SIZE + length - src.len());
            return Ok(None); // Need complete response
        }

        let mut frame = src.split_to(LENGTH_SIZE + length);
        frame.advance(LENGTH_SIZE + ERROR_CODE_SIZE);
        trace!(
            "response frame: {} body bytes, error code {}",
            frame.len(),
            raw_error_code
        );

        Ok(Some(Response {
            error_code: ErrorCode::from(raw_error_code),
            raw_error_code,
            body: frame.freeze(),
        }))
    }
}
