//! Streaming endpoint handoff.
//!
//! The client only derives the websocket URL and hands back a [`StreamConn`].
//! Subscribing and reading messages belong to whoever owns the connection.

use crate::protocol::{ClientResult, RPC_PATH, STREAM_PATH};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

static HTTP_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^http").expect("scheme pattern is valid"));

static RPC_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{}$", regex::escape(RPC_PATH))).expect("rpc suffix pattern is valid")
});

/// Websocket connected to the streaming endpoint.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Rewrite an RPC endpoint into its streaming endpoint.
///
/// `http` becomes `ws` (so `https` becomes `wss`) and a trailing `/rpc`
/// becomes `/ws`. Anything else is left alone.
pub fn stream_url(endpoint: &str) -> String {
    let path = RPC_SUFFIX.replace(endpoint, STREAM_PATH);
    HTTP_SCHEME.replace(&path, "ws").into_owned()
}

/// Handle to the streaming endpoint. Owns no socket until
/// [`connect`](Self::connect) is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConn {
    url: String,
}

impl StreamConn {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the websocket and return it without reading from it.
    pub async fn connect(&self) -> ClientResult<WsStream> {
        tracing::debug!(url = %self.url, "stream_connect");
        let (socket, _response) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        Ok(socket)
    }
}

impl fmt::Display for StreamConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamConn(\"{}\")", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientError, DEFAULT_ENDPOINT};

    #[test]
    fn test_default_endpoint() {
        assert_eq!(stream_url(DEFAULT_ENDPOINT), "ws://localhost:5993/ws");
    }

    #[test]
    fn test_https_becomes_wss() {
        assert_eq!(
            stream_url("https://data.example.com/rpc"),
            "wss://data.example.com/ws"
        );
    }

    #[test]
    fn test_only_trailing_rpc_rewritten() {
        assert_eq!(
            stream_url("http://rpc.example.com:5993/rpc/v2"),
            "ws://rpc.example.com:5993/rpc/v2"
        );
        assert_eq!(stream_url("http://host/api"), "ws://host/api");
    }

    #[test]
    fn test_display() {
        let conn = StreamConn::new("ws://localhost:5993/ws");
        assert_eq!(conn.to_string(), "StreamConn(\"ws://localhost:5993/ws\")");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let conn = StreamConn::new(format!("ws://127.0.0.1:{port}/ws"));
        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, ClientError::Stream(_)));
    }
}
