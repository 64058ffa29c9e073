//! Marketstore RPC Protocol
//!
//! Client-side view of the data service: wire value tree, transport seam and
//! error taxonomy.
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                  Marketstore data service                   |
//! +-------------------------------------------------------------+
//! |  POST <endpoint>            DataService.* RPC calls         |
//! |  HEAD <endpoint>            Marketstore-Version header      |
//! |  ws://<host>/ws             streaming subscriptions         |
//! +-------------------------------------------------------------+
//! |  Payload: WireValue tree, framed by an EnvelopeCodec        |
//! |  Transport: blocking HTTP (reqwest)                         |
//! +-------------------------------------------------------------+
//! ```
//!
//! # Module Structure
//!
//! - `wire` - Wire value tree (`WireValue`)
//! - `error` - Transport, encoding and client error types
//! - `transport` - `RpcTransport` seam and the HTTP transport

pub mod error;
pub mod transport;
pub mod wire;

// Re-export error types
pub use error::{ClientError, ClientResult, EncodingError, TransportError};

// Re-export wire types
pub use wire::WireValue;

// Re-export transport types
pub use transport::{EnvelopeCodec, HttpTransport, RpcTransport};

// Protocol Constants
/// Default RPC endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5993/rpc";

/// Query historical records
pub const METHOD_QUERY: &str = "DataService.Query";

/// Write a record batch into a bucket
pub const METHOD_WRITE: &str = "DataService.Write";

/// List known symbols
pub const METHOD_LIST_SYMBOLS: &str = "DataService.ListSymbols";

/// Delete a bucket
pub const METHOD_DESTROY: &str = "DataService.Destroy";

/// Response header carrying the server version
pub const VERSION_HEADER: &str = "Marketstore-Version";

/// Path segment of the RPC endpoint
pub const RPC_PATH: &str = "/rpc";

/// Path segment of the streaming endpoint
pub const STREAM_PATH: &str = "/ws";
