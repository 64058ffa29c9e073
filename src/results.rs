//! Query reply decoding.
//!
//! A `Query` reply carries one response per request. Each response holds a
//! columnar data set covering one or more buckets; [`QueryReply::from_response`]
//! decodes the buffers and slices them into one [`DataSet`] per bucket key.

use crate::epoch::from_wire_epoch;
use crate::protocol::{ClientError, ClientResult, WireValue};
use crate::record::{RecordBatch, WireDataSet};
use chrono::{DateTime, Utc};

/// Timezone reported when the reply does not name one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Rows of a single bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    key: String,
    batch: RecordBatch,
    timezone: String,
}

impl DataSet {
    pub fn new(key: impl Into<String>, batch: RecordBatch, timezone: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            batch,
            timezone: timezone.into(),
        }
    }

    /// Full bucket key, e.g. `AAPL/1Min/OHLCV`
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn symbol(&self) -> Option<&str> {
        self.key.split('/').next()
    }

    pub fn timeframe(&self) -> Option<&str> {
        self.key.split('/').nth(1)
    }

    pub fn attribute_group(&self) -> Option<&str> {
        self.key.split('/').nth(2)
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Row instants from the `Epoch` column plus the optional `Nanoseconds`
    /// column. `None` when there is no usable `Epoch` column.
    pub fn timestamps(&self) -> Option<Vec<DateTime<Utc>>> {
        let epochs = self.batch.column("Epoch")?;
        let nanos = self.batch.column("Nanoseconds");
        (0..self.batch.len())
            .map(|row| {
                let seconds = epochs.integer_at(row)?;
                let nanos = match nanos {
                    Some(col) => u32::try_from(col.integer_at(row)?).ok()?,
                    None => 0,
                };
                from_wire_epoch(seconds, nanos)
            })
            .collect()
    }
}

/// Decoded response to one query request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    datasets: Vec<DataSet>,
}

impl QueryResult {
    /// Bucket keys in reply order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(DataSet::key)
    }

    pub fn get(&self, key: &str) -> Option<&DataSet> {
        self.datasets.iter().find(|d| d.key == key)
    }

    pub fn first(&self) -> Option<&DataSet> {
        self.datasets.first()
    }

    pub fn all(&self) -> &[DataSet] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Decoded `Query` reply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryReply {
    results: Vec<QueryResult>,
}

impl QueryReply {
    /// Decode a raw `Query` reply.
    ///
    /// A reply without `responses`, or with a nil entry, decodes to no
    /// results; the server omits empty lists.
    pub fn from_response(reply: &WireValue) -> ClientResult<Self> {
        let timezone = reply
            .get("timezone")
            .and_then(WireValue::as_str)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(DEFAULT_TIMEZONE);

        let responses = match reply.get("responses") {
            None | Some(WireValue::Nil) => return Ok(Self::default()),
            Some(value) => value
                .as_array()
                .ok_or_else(|| ClientError::decoding("'responses' is not a list"))?,
        };

        let mut results = Vec::with_capacity(responses.len());
        for response in responses {
            let dataset = match response.get("result") {
                None | Some(WireValue::Nil) => {
                    results.push(QueryResult::default());
                    continue;
                }
                Some(result) => WireDataSet::from_wire(result)?,
            };
            let datasets = dataset
                .decode_buckets()?
                .into_iter()
                .map(|(key, batch)| DataSet::new(key, batch, timezone))
                .collect();
            results.push(QueryResult { datasets });
        }

        Ok(Self { results })
    }

    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    /// First data set of the first result
    pub fn first(&self) -> Option<&DataSet> {
        self.results.first().and_then(QueryResult::first)
    }

    /// Every data set across all results
    pub fn all(&self) -> impl Iterator<Item = &DataSet> {
        self.results.iter().flat_map(QueryResult::all)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.all().map(DataSet::key)
    }

    pub fn is_empty(&self) -> bool {
        self.results.iter().all(QueryResult::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ColumnData;

    fn reply_for(batch: &RecordBatch, key: &str, timezone: Option<&str>) -> WireValue {
        let dataset = WireDataSet::from_batch(batch, key).unwrap();
        let mut reply = WireValue::map([(
            "responses",
            WireValue::Array(vec![WireValue::map([("result", dataset.to_wire())])]),
        )]);
        if let Some(tz) = timezone {
            reply.insert("timezone", WireValue::from(tz));
        }
        reply
    }

    fn bars() -> RecordBatch {
        RecordBatch::builder()
            .column("Epoch", vec![1_500_000_000i64, 1_500_000_060])
            .column("Nanoseconds", vec![0i32, 250_000_000])
            .column("Close", vec![10.5f64, 11.0])
            .build()
            .unwrap()
    }

    #[test]
    fn test_decodes_single_bucket() {
        let reply =
            QueryReply::from_response(&reply_for(&bars(), "AAPL/1Min/OHLCV", None)).unwrap();
        let ds = reply.first().unwrap();
        assert_eq!(ds.key(), "AAPL/1Min/OHLCV");
        assert_eq!(ds.symbol(), Some("AAPL"));
        assert_eq!(ds.timeframe(), Some("1Min"));
        assert_eq!(ds.attribute_group(), Some("OHLCV"));
        assert_eq!(ds.timezone(), "UTC");
        assert_eq!(ds.batch(), &bars());
        assert_eq!(reply.keys().collect::<Vec<_>>(), vec!["AAPL/1Min/OHLCV"]);
    }

    #[test]
    fn test_timezone_from_reply() {
        let reply = QueryReply::from_response(&reply_for(
            &bars(),
            "AAPL/1Min/OHLCV",
            Some("America/New_York"),
        ))
        .unwrap();
        assert_eq!(reply.first().unwrap().timezone(), "America/New_York");
    }

    #[test]
    fn test_timestamps_combine_nanoseconds() {
        let reply =
            QueryReply::from_response(&reply_for(&bars(), "AAPL/1Min/OHLCV", None)).unwrap();
        let ts = reply.first().unwrap().timestamps().unwrap();
        assert_eq!(ts[0], from_wire_epoch(1_500_000_000, 0).unwrap());
        assert_eq!(ts[1], from_wire_epoch(1_500_000_060, 250_000_000).unwrap());
    }

    #[test]
    fn test_timestamps_without_epoch() {
        let batch = RecordBatch::builder().column("Close", vec![1.0f64]).build().unwrap();
        let ds = DataSet::new("AAPL/1Min/OHLCV", batch, DEFAULT_TIMEZONE);
        assert!(ds.timestamps().is_none());
    }

    #[test]
    fn test_multi_bucket_response() {
        let batch = RecordBatch::builder()
            .column("Epoch", vec![1i64, 2, 3])
            .build()
            .unwrap();
        let mut dataset = WireDataSet::from_batch(&batch, "AAPL/1D/OHLCV").unwrap();
        dataset.startindex = vec![
            ("AAPL/1D/OHLCV".to_string(), 0),
            ("MSFT/1D/OHLCV".to_string(), 1),
        ];
        dataset.lengths = vec![("AAPL/1D/OHLCV".to_string(), 1), ("MSFT/1D/OHLCV".to_string(), 2)];
        let reply = WireValue::map([(
            "responses",
            WireValue::Array(vec![WireValue::map([("result", dataset.to_wire())])]),
        )]);

        let decoded = QueryReply::from_response(&reply).unwrap();
        let result = &decoded.results()[0];
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.get("MSFT/1D/OHLCV").unwrap().batch().column("Epoch"),
            Some(&ColumnData::I64(vec![2, 3]))
        );
        assert_eq!(decoded.all().count(), 2);
    }

    #[test]
    fn test_empty_reply() {
        let reply = QueryReply::from_response(&WireValue::empty_map()).unwrap();
        assert!(reply.is_empty());
        assert!(reply.first().is_none());

        let reply = QueryReply::from_response(&WireValue::map([(
            "responses",
            WireValue::Array(vec![WireValue::map([("result", WireValue::Nil)])]),
        )]))
        .unwrap();
        assert_eq!(reply.results().len(), 1);
        assert!(reply.is_empty());
    }

    #[test]
    fn test_malformed_reply() {
        let reply = WireValue::map([("responses", WireValue::from("nope"))]);
        assert!(matches!(
            QueryReply::from_response(&reply),
            Err(ClientError::Decoding { .. })
        ));
    }
}
