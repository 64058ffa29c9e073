//! Query parameters and the `Query` request builder.
//!
//! Every optional field maps to a wire key that is only emitted when the
//! caller set it. An absent key and a zero/false value mean different things
//! to the server, so options are never flattened to defaults.

use crate::epoch::{to_wire_epoch, IntoTimestamp};
use crate::protocol::WireValue;
use chrono::{DateTime, Utc};

/// Query parameters for one bucket key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    destination: String,
    key_category: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    limit: Option<u32>,
    limit_from_start: Option<bool>,
    functions: Option<Vec<String>>,
}

impl QueryParam {
    /// Query a bucket key such as `"AAPL/1Min/OHLCV"`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            key_category: None,
            start: None,
            end: None,
            limit: None,
            limit_from_start: None,
            functions: None,
        }
    }

    /// Query one or more symbols for a timeframe and attribute group.
    ///
    /// Symbols are joined with `,` into a single `SYMS/TIMEFRAME/ATTRGROUP`
    /// destination, which the server fans out.
    pub fn for_symbols<S: AsRef<str>>(
        symbols: &[S],
        timeframe: &str,
        attribute_group: &str,
    ) -> Self {
        let symbols: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
        Self::new(format!("{}/{timeframe}/{attribute_group}", symbols.join(",")))
    }

    pub fn key_category(mut self, key_category: impl Into<String>) -> Self {
        self.key_category = Some(key_category.into());
        self
    }

    pub fn start(mut self, start: impl IntoTimestamp) -> Self {
        self.start = Some(start.into_timestamp());
        self
    }

    pub fn end(mut self, end: impl IntoTimestamp) -> Self {
        self.end = Some(end.into_timestamp());
        self
    }

    /// Cap the number of records returned. Any value set here, zero
    /// included, is sent as is.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply the limit from the start of the range instead of the end.
    pub fn limit_from_start(mut self, from_start: bool) -> Self {
        self.limit_from_start = Some(from_start);
        self
    }

    /// Server-side aggregation functions, applied in order.
    pub fn functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions = Some(functions.into_iter().map(Into::into).collect());
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Wire object for this parameter set.
    pub fn to_wire(&self) -> WireValue {
        let mut req = WireValue::map([("destination", WireValue::from(self.destination.as_str()))]);

        if let Some(category) = self.key_category.as_deref().filter(|c| !c.is_empty()) {
            req.insert("key_category", WireValue::from(category));
        }
        if let Some(start) = &self.start {
            let epoch = to_wire_epoch(start);
            req.insert("epoch_start", WireValue::from(epoch.seconds));
            if let Some(nanos) = epoch.nanos {
                req.insert("epoch_start_nanos", WireValue::from(nanos));
            }
        }
        if let Some(end) = &self.end {
            let epoch = to_wire_epoch(end);
            req.insert("epoch_end", WireValue::from(epoch.seconds));
            if let Some(nanos) = epoch.nanos {
                req.insert("epoch_end_nanos", WireValue::from(nanos));
            }
        }
        if let Some(limit) = self.limit {
            req.insert("limit_record_count", WireValue::Int(i64::from(limit)));
        }
        if let Some(from_start) = self.limit_from_start {
            req.insert("limit_from_start", WireValue::from(from_start));
        }
        if let Some(functions) = &self.functions {
            req.insert("functions", functions.iter().map(String::as_str).collect());
        }
        req
    }
}

/// One or more query parameter sets.
pub trait IntoQueryParams {
    fn into_query_params(self) -> Vec<QueryParam>;
}

impl IntoQueryParams for QueryParam {
    fn into_query_params(self) -> Vec<QueryParam> {
        vec![self]
    }
}

impl IntoQueryParams for Vec<QueryParam> {
    fn into_query_params(self) -> Vec<QueryParam> {
        self
    }
}

impl IntoQueryParams for &[QueryParam] {
    fn into_query_params(self) -> Vec<QueryParam> {
        self.to_vec()
    }
}

impl<const N: usize> IntoQueryParams for [QueryParam; N] {
    fn into_query_params(self) -> Vec<QueryParam> {
        self.into()
    }
}

/// The `Query` call payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub params: Vec<QueryParam>,
}

impl QueryRequest {
    /// `{requests: [...]}` in parameter order.
    pub fn to_wire(&self) -> WireValue {
        WireValue::map([(
            "requests",
            WireValue::Array(self.params.iter().map(QueryParam::to_wire).collect()),
        )])
    }
}

/// Build a query request from one or more parameter sets.
pub fn build_query(params: impl IntoQueryParams) -> QueryRequest {
    QueryRequest {
        params: params.into_query_params(),
    }
}

// ============================================================================
// Tests
// ============================================================================
