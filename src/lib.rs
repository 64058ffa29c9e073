//! # Marketstore Client
//!
//! Client library for a Marketstore-style time-series data service.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! QueryParam(s)                       RecordBatch + bucket key
//!     ↓                                   ↓
//! [Query Builder]   → {requests}      [Record Encoder]  → {requests: [{dataset, ..}]}
//!     ↓                                   ↓
//!     └──────────── RpcTransport::call ───┘
//!                         ↓
//! [Reply Decoder]   → QueryReply / symbol list / raw reply
//! ```
//!
//! Streaming is a handoff only: [`Client::stream`] derives the websocket URL
//! and returns a [`StreamConn`] that the caller connects and drives.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marketstore_client::{Client, ClientConfig, QueryParam, RecordBatch};
//!
//! let config = ClientConfig::load()?;
//! marketstore_client::logging::init_tracing(&config.logging);
//! let client = Client::from_config(&config, MsgpackCodec)?;
//!
//! let reply = client.query(
//!     QueryParam::for_symbols(&["AAPL"], "1Min", "OHLCV")
//!         .start(1_500_000_000i64)
//!         .limit(100),
//! )?;
//! for ds in reply.all() {
//!     println!("{} rows for {}", ds.batch().len(), ds.key());
//! }
//!
//! let batch = RecordBatch::builder()
//!     .column("Epoch", vec![1_500_000_000i64])
//!     .column("Close", vec![150.25f64])
//!     .build()?;
//! client.write(&batch, "AAPL/1Min/OHLCV", false)?;
//! ```

pub mod client;
pub mod config;
pub mod epoch;
pub mod logging;
pub mod protocol;
pub mod query;
pub mod record;
pub mod results;
pub mod stream;

pub use client::Client;
pub use config::{ClientConfig, HttpConfig, LoggingConfig};
pub use epoch::{from_wire_epoch, to_wire_epoch, IntoTimestamp, WireEpoch};
pub use protocol::{
    ClientError, ClientResult, EncodingError, EnvelopeCodec, HttpTransport, RpcTransport,
    TransportError, WireValue,
};
pub use query::{build_query, IntoQueryParams, QueryParam, QueryRequest};
pub use record::{
    encode_write, Column, ColumnData, ElementType, RecordBatch, RecordBatchBuilder, WireDataSet,
    WriteRequest,
};
pub use results::{DataSet, QueryReply, QueryResult};
pub use stream::{stream_url, StreamConn, WsStream};
