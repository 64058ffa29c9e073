//! RPC client facade.
//!
//! [`Client`] turns caller-level operations into `DataService.*` calls on an
//! [`RpcTransport`] and decodes the replies. It holds no mutable state; each
//! operation is one blocking round trip. Whether a single client may be used
//! from several threads at once depends on the transport.

use crate::config::ClientConfig;
use crate::protocol::{
    ClientError, ClientResult, EnvelopeCodec, HttpTransport, RpcTransport, TransportError,
    WireValue, METHOD_DESTROY, METHOD_LIST_SYMBOLS, METHOD_QUERY, METHOD_WRITE, VERSION_HEADER,
};
use crate::query::{build_query, IntoQueryParams};
use crate::record::{encode_write, RecordBatch};
use crate::results::QueryReply;
use crate::stream::{stream_url, StreamConn};
use std::fmt;
use tracing::{debug, error, warn};

/// Client for one data service endpoint.
pub struct Client<T> {
    endpoint: String,
    transport: T,
}

impl<C: EnvelopeCodec> Client<HttpTransport<C>> {
    /// HTTP client for `endpoint` with default transport settings.
    pub fn connect(endpoint: impl Into<String>, codec: C) -> ClientResult<Self> {
        let transport = HttpTransport::new(endpoint, codec)?;
        Ok(Self::new(transport.endpoint().to_string(), transport))
    }

    /// HTTP client built from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig, codec: C) -> ClientResult<Self> {
        let transport = HttpTransport::from_config(config, codec)?;
        Ok(Self::new(config.endpoint.clone(), transport))
    }
}

impl<T: RpcTransport> Client<T> {
    /// Client over an arbitrary transport. `endpoint` is only used for the
    /// streaming URL and diagnostics.
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Query one or more buckets.
    pub fn query(&self, params: impl IntoQueryParams) -> ClientResult<QueryReply> {
        let request = build_query(params);
        let reply = self.call(METHOD_QUERY, request.to_wire())?;
        QueryReply::from_response(&reply)
    }

    /// Write `batch` into a single bucket and return the raw reply.
    ///
    /// An unreachable server is reported as
    /// [`ClientError::ServiceUnavailable`] with the transport failure as its
    /// source.
    pub fn write(
        &self,
        batch: &RecordBatch,
        bucket_key: &str,
        is_variable_length: bool,
    ) -> ClientResult<WireValue> {
        let request = encode_write(batch, bucket_key, is_variable_length)?;
        debug!(
            method = METHOD_WRITE,
            bucket = bucket_key,
            rows = batch.len(),
            "rpc_call"
        );
        self.transport
            .call(METHOD_WRITE, request.to_params())
            .map_err(|e| {
                if e.is_connection() {
                    warn!(endpoint = %self.endpoint, error = %e, "server unreachable");
                    ClientError::ServiceUnavailable { source: e }
                } else {
                    error!(method = METHOD_WRITE, error = %e, "rpc_failed");
                    ClientError::Transport(e)
                }
            })
    }

    /// Every symbol the server knows about. A reply without `Results`
    /// means there are none.
    pub fn list_symbols(&self) -> ClientResult<Vec<String>> {
        let reply = self.call(METHOD_LIST_SYMBOLS, WireValue::empty_map())?;
        match reply.get("Results") {
            None | Some(WireValue::Nil) => Ok(Vec::new()),
            Some(results) => results
                .as_array()
                .ok_or_else(|| ClientError::decoding("'Results' is not a list"))?
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| {
                            ClientError::decoding(format!("symbol {s} is not a string"))
                        })
                })
                .collect(),
        }
    }

    /// Delete a bucket and return the raw reply.
    pub fn destroy(&self, bucket_key: &str) -> ClientResult<WireValue> {
        let params = WireValue::map([(
            "requests",
            WireValue::Array(vec![WireValue::map([("key", WireValue::from(bucket_key))])]),
        )]);
        Ok(self.call(METHOD_DESTROY, params)?)
    }

    /// Version reported by the server, if it sends one.
    pub fn server_version(&self) -> ClientResult<Option<String>> {
        debug!(endpoint = %self.endpoint, "version_probe");
        let version = self.transport.probe_header(VERSION_HEADER).map_err(|e| {
            error!(error = %e, "version_probe_failed");
            ClientError::Transport(e)
        })?;
        Ok(version.filter(|v| !v.is_empty()))
    }

    /// Handle to the streaming endpoint. Does not connect.
    pub fn stream(&self) -> StreamConn {
        StreamConn::new(stream_url(&self.endpoint))
    }

    fn call(&self, method: &str, params: WireValue) -> Result<WireValue, TransportError> {
        debug!(method, "rpc_call");
        self.transport.call(method, params).map_err(|e| {
            error!(method, error = %e, "rpc_failed");
            e
        })
    }
}

impl<T> fmt::Display for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RpcClient(\"{}\")", self.endpoint)
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
