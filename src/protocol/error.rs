//! Error types for the Marketstore RPC client.

/// Fixed message surfaced when a write cannot reach the server.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "could not contact server";

/// Failures raised by an [`RpcTransport`](super::RpcTransport).
///
/// The client only distinguishes two kinds of transport failure: the server
/// answered with an error, or the server could not be reached at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Non-2xx HTTP status or an RPC-level error returned by the server
    #[error("HTTP error{}: {message}", status.map(|s| format!(" {s}")).unwrap_or_default())]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// Endpoint unreachable (refused, DNS failure, reset before a response)
    #[error("Connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    /// The envelope codec could not frame the call or parse the reply
    #[error("Codec error: {message}")]
    Codec { message: String },
}

impl TransportError {
    /// True for failures where no response was received from the server.
    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }
}

/// A record batch column that cannot be represented on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Column element type has no wire type tag
    #[error("Unsupported type for column '{column}': {data_type}")]
    UnsupportedType { column: String, data_type: String },

    /// Fixed-size byte column declared with a width of zero
    #[error("Column '{column}' has zero element width")]
    ZeroWidth { column: String },

    /// Column row count differs from the rest of the batch
    #[error("Column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    /// Raw buffer is not a whole number of elements
    #[error("Column '{column}' byte length {len} is not a multiple of {width}")]
    ByteLength {
        column: String,
        len: usize,
        width: usize,
    },

    /// Two columns share a name
    #[error("Duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// Column contains null slots; the wire format has no null bitmap
    #[error("Column '{column}' contains {count} null values")]
    Nulls { column: String, count: usize },
}

/// Client-facing error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure, surfaced unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Write could not reach the server
    #[error("{}", SERVICE_UNAVAILABLE_MESSAGE)]
    ServiceUnavailable {
        #[source]
        source: TransportError,
    },

    /// Record batch could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Reply did not have the expected shape
    #[error("Decoding error: {message}")]
    Decoding { message: String },

    /// Streaming endpoint handoff failed
    #[error("Stream error: {0}")]
    Stream(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

impl ClientError {
    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        ClientError::Decoding {
            message: message.into(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Stream(Box::new(e))
    }
}

/// Result alias used throughout the crate.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_service_unavailable_message_is_fixed() {
        let err = ClientError::ServiceUnavailable {
            source: TransportError::Connection {
                address: "http://localhost:5993/rpc".to_string(),
                reason: "Connection refused (os error 111)".to_string(),
            },
        };
        assert_eq!(err.to_string(), "could not contact server");
        let cause = err.source().expect("cause preserved");
        assert!(cause.to_string().contains("Connection refused"));
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err: ClientError = TransportError::Http {
            status: Some(500),
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "HTTP error 500: boom");
    }

    #[test]
    fn test_http_error_without_status() {
        let err = TransportError::Http {
            status: None,
            message: "no such method".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: no such method");
        assert!(!err.is_connection());
    }
}
