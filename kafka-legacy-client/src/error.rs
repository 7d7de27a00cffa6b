//! Error types for the legacy Kafka client library

/// Main error type for client and codec operations
#[derive(Debug, thiserror::Error)]
pub enum KafkaClientError {
    /// Stored checksum disagrees with the checksum of the stored payload
    #[error("Checksum mismatch: frame carries {expected:08X}, payload hashes to {actual:08X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Compression id has no codec in the registry
    #[error("Unknown compression codec id {0}")]
    UnknownCodec(u8),

    /// Magic byte is neither 0 nor 1
    #[error("Unknown message format version {0}")]
    UnknownFormatVersion(u8),

    /// Declared frame length is negative, too small for its header or too large
    #[error("Malformed frame length {length} (allowed {min}..={max})")]
    MalformedLength { length: i64, min: usize, max: usize },

    /// Compression or decompression failure inside a codec
    #[error("Compression error: {message}")]
    Compression { message: String },

    /// Protocol-related errors
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Connection-related errors
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Broker answered with a non-zero error code
    #[error("Broker error {code:?}: {context}")]
    Broker { code: ErrorCode, context: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Broker not available
    #[error("No available brokers")]
    NoBrokersAvailable,

    /// Message too large
    #[error("Message size {size} exceeds maximum {max_size}")]
    MessageTooLarge { size: usize, max_size: usize },
}

impl KafkaClientError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new compression error
    pub fn compression<S: Into<String>>(message: S) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Create a new invalid config error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Check if this error is retryable. Codec errors never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Timeout { .. } => true,
            Self::NoBrokersAvailable => true,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Check if this error is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Io(_))
    }

    /// Check if this error means the received bytes are corrupt
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. }
                | Self::MalformedLength { .. }
                | Self::UnknownFormatVersion(_)
                | Self::UnknownCodec(_)
        )
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Error codes carried in legacy broker responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error
    None = 0,
    /// Unknown server error
    Unknown = -1,
    /// Requested offset is outside the log
    OffsetOutOfRange = 1,
    /// Broker rejected a message (bad checksum)
    InvalidMessage = 2,
    /// Partition is not served by this broker
    WrongPartition = 3,
    /// Fetch size is invalid
    InvalidFetchSize = 4,
}

impl ErrorCode {
    /// True when the response carries no error
    pub fn is_ok(self) -> bool {
        self == ErrorCode::None
    }

    /// Convert error code to a client error
    pub fn to_client_error(self, context: &str) -> KafkaClientError {
        KafkaClientError::Broker {
            code: self,
            context: context.to_string(),
        }
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        match code {
            0 => ErrorCode::None,
            1 => ErrorCode::OffsetOutOfRange,
            2 => ErrorCode::InvalidMessage,
            3 => ErrorCode::WrongPartition,
            4 => ErrorCode::InvalidFetchSize,
            _ => ErrorCode::Unknown,
        }
    }
}
