//! RPC transport seam.
//!
//! The client never frames RPC envelopes itself. It hands a method name and a
//! [`WireValue`] to an [`RpcTransport`] and gets a `WireValue` back. The
//! bundled [`HttpTransport`] carries calls over blocking HTTP and leaves the
//! envelope format (msgpack-rpc for Marketstore) to an [`EnvelopeCodec`].

use super::{TransportError, WireValue};
use crate::config::ClientConfig;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;

/// Request/response channel to the data service.
///
/// Implementations must report unreachable endpoints as
/// [`TransportError::Connection`] and every other failure as
/// [`TransportError::Http`] or [`TransportError::Codec`].
pub trait RpcTransport {
    /// Perform one blocking round trip.
    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError>;

    /// Header-only probe of the endpoint, returning the named header if the
    /// server sent it.
    fn probe_header(&self, name: &str) -> Result<Option<String>, TransportError>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for &T {
    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError> {
        (**self).call(method, params)
    }

    fn probe_header(&self, name: &str) -> Result<Option<String>, TransportError> {
        (**self).probe_header(name)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError> {
        (**self).call(method, params)
    }

    fn probe_header(&self, name: &str) -> Result<Option<String>, TransportError> {
        (**self).probe_header(name)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError> {
        (**self).call(method, params)
    }

    fn probe_header(&self, name: &str) -> Result<Option<String>, TransportError> {
        (**self).probe_header(name)
    }
}

/// Frames calls and unframes replies for [`HttpTransport`].
///
/// `decode_reply` should turn an RPC-level error object into
/// [`TransportError::Http`] with no status.
pub trait EnvelopeCodec {
    /// Value for the `Content-Type` request header
    fn content_type(&self) -> &str;

    fn encode_call(&self, method: &str, params: &WireValue) -> Result<Vec<u8>, TransportError>;

    fn decode_reply(&self, body: &[u8]) -> Result<WireValue, TransportError>;
}

/// Blocking HTTP transport.
///
/// Safe to share between threads when the codec is; the underlying reqwest
/// client pools connections.
pub struct HttpTransport<C> {
    endpoint: String,
    client: Client,
    codec: C,
}

impl<C: EnvelopeCodec> HttpTransport<C> {
    /// Transport with no request timeout.
    pub fn new(endpoint: impl Into<String>, codec: C) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| map_reqwest_error(&endpoint, &e))?;
        Ok(Self {
            endpoint,
            client,
            codec,
        })
    }

    /// Transport for the configured endpoint, timeout and user agent.
    pub fn from_config(config: &ClientConfig, codec: C) -> Result<Self, TransportError> {
        let timeout =
            (config.http.timeout_ms > 0).then(|| Duration::from_millis(config.http.timeout_ms));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.http.user_agent.as_str())
            .build()
            .map_err(|e| map_reqwest_error(&config.endpoint, &e))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
            codec,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<C: EnvelopeCodec> RpcTransport for HttpTransport<C> {
    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError> {
        let body = self.codec.encode_call(method, &params)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, self.codec.content_type())
            .body(body)
            .send()
            .map_err(|e| map_reqwest_error(&self.endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text.trim().to_string()
            };
            return Err(TransportError::Http {
                status: Some(status.as_u16()),
                message,
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| map_reqwest_error(&self.endpoint, &e))?;
        self.codec.decode_reply(&bytes)
    }

    fn probe_header(&self, name: &str) -> Result<Option<String>, TransportError> {
        let response = self
            .client
            .head(&self.endpoint)
            .send()
            .map_err(|e| map_reqwest_error(&self.endpoint, &e))?;
        Ok(response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

/// Split reqwest failures into the connection/HTTP taxonomy.
fn map_reqwest_error(endpoint: &str, e: &reqwest::Error) -> TransportError {
    if e.is_connect() {
        return TransportError::Connection {
            address: endpoint.to_string(),
            reason: e.to_string(),
        };
    }
    TransportError::Http {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}
