//! Columnar data set payload, shared by write requests and query replies.
//!
//! ```text
//! {
//!   types:      ["i8", "f4", ...],      one tag per column
//!   names:      ["Epoch", "Open", ...], same order as types
//!   data:       [<bytes>, <bytes>, ...],raw little-endian column buffers
//!   length:     N,                      rows in every column
//!   startindex: {bucket_key: row},      first row of each bucket
//!   lengths:    {bucket_key: rows},     row count of each bucket
//! }
//! ```

use super::{Column, ColumnData, ElementType, RecordBatch};
use crate::protocol::{ClientError, ClientResult, EncodingError, WireValue};

/// Wire form of a columnar batch spanning one or more buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct WireDataSet {
    pub types: Vec<String>,
    pub names: Vec<String>,
    pub data: Vec<Vec<u8>>,
    pub length: usize,
    pub startindex: Vec<(String, usize)>,
    pub lengths: Vec<(String, usize)>,
}

impl WireDataSet {
    /// Encode a whole batch as a single bucket starting at row 0.
    pub fn from_batch(batch: &RecordBatch, bucket_key: &str) -> Result<Self, EncodingError> {
        let mut types = Vec::with_capacity(batch.num_columns());
        let mut names = Vec::with_capacity(batch.num_columns());
        let mut data = Vec::with_capacity(batch.num_columns());
        for column in batch.columns() {
            types.push(column.data.element_type().wire_tag(&column.name)?);
            names.push(column.name.clone());
            data.push(column.data.to_le_bytes());
        }
        Ok(Self {
            types,
            names,
            data,
            length: batch.len(),
            startindex: vec![(bucket_key.to_string(), 0)],
            lengths: vec![(bucket_key.to_string(), batch.len())],
        })
    }

    pub fn to_wire(&self) -> WireValue {
        WireValue::map([
            ("types", self.types.iter().map(String::as_str).collect()),
            ("names", self.names.iter().map(String::as_str).collect()),
            (
                "data",
                WireValue::Array(self.data.iter().cloned().map(WireValue::Bytes).collect()),
            ),
            ("length", WireValue::from(self.length)),
            ("startindex", index_map(&self.startindex)),
            ("lengths", index_map(&self.lengths)),
        ])
    }

    /// Parse the payload out of a reply. Missing `startindex`/`lengths` are
    /// treated as empty.
    pub fn from_wire(value: &WireValue) -> ClientResult<Self> {
        let types = string_list(value, "types")?;
        let names = string_list(value, "names")?;
        let data = value
            .get("data")
            .and_then(WireValue::as_array)
            .ok_or_else(|| ClientError::decoding("data set has no 'data' list"))?
            .iter()
            .map(|item| {
                item.as_bytes()
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| ClientError::decoding("column buffer is not a byte string"))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let length = value
            .get("length")
            .and_then(WireValue::as_u64)
            .ok_or_else(|| ClientError::decoding("data set has no 'length'"))?;

        if types.len() != names.len() || types.len() != data.len() {
            return Err(ClientError::decoding(format!(
                "column lists disagree: {} types, {} names, {} buffers",
                types.len(),
                names.len(),
                data.len()
            )));
        }

        Ok(Self {
            types,
            names,
            data,
            length: usize::try_from(length)
                .map_err(|_| ClientError::decoding("data set length overflows usize"))?,
            startindex: index_entries(value, "startindex")?,
            lengths: index_entries(value, "lengths")?,
        })
    }

    /// Rebuild the full batch from the column buffers.
    pub fn decode(&self) -> ClientResult<RecordBatch> {
        let mut columns = Vec::with_capacity(self.names.len());
        for ((name, tag), bytes) in self.names.iter().zip(&self.types).zip(&self.data) {
            let element_type = ElementType::from_tag(tag).ok_or_else(|| {
                ClientError::decoding(format!("column '{name}' has unknown type '{tag}'"))
            })?;
            let data = ColumnData::from_le_bytes(name, element_type, bytes)?;
            if data.len() != self.length {
                return Err(EncodingError::LengthMismatch {
                    column: name.clone(),
                    expected: self.length,
                    got: data.len(),
                }
                .into());
            }
            columns.push(Column {
                name: name.clone(),
                data,
            });
        }
        Ok(RecordBatch::try_new(columns)?)
    }

    /// Split the decoded batch into per-bucket slices, in `startindex` order.
    pub fn decode_buckets(&self) -> ClientResult<Vec<(String, RecordBatch)>> {
        let batch = self.decode()?;
        self.startindex
            .iter()
            .map(|(key, start)| -> ClientResult<(String, RecordBatch)> {
                let len = self
                    .lengths
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, n)| *n)
                    .ok_or_else(|| {
                        ClientError::decoding(format!("bucket '{key}' has no entry in 'lengths'"))
                    })?;
                let slice = batch.slice(*start, len).ok_or_else(|| {
                    ClientError::decoding(format!(
                        "bucket '{key}' rows {start}..{} exceed length {}",
                        start.saturating_add(len),
                        batch.len()
                    ))
                })?;
                Ok((key.clone(), slice))
            })
            .collect()
    }
}

fn index_map(entries: &[(String, usize)]) -> WireValue {
    WireValue::map(entries.iter().map(|(k, n)| (k.as_str(), WireValue::from(*n))))
}

fn string_list(value: &WireValue, field: &str) -> ClientResult<Vec<String>> {
    value
        .get(field)
        .and_then(WireValue::as_array)
        .ok_or_else(|| ClientError::decoding(format!("data set has no '{field}' list")))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ClientError::decoding(format!("'{field}' entry is not a string")))
        })
        .collect()
}

fn index_entries(value: &WireValue, field: &str) -> ClientResult<Vec<(String, usize)>> {
    let Some(entries) = value.get(field) else {
        return Ok(Vec::new());
    };
    if entries.is_nil() {
        return Ok(Vec::new());
    }
    entries
        .as_map()
        .ok_or_else(|| ClientError::decoding(format!("'{field}' is not a map")))?
        .iter()
        .map(|(key, n)| {
            n.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(|n| (key.clone(), n))
                .ok_or_else(|| {
                    ClientError::decoding(format!("'{field}' entry for '{key}' is not a row count"))
                })
        })
        .collect()
}

// ============================================================================
// Write Request
// ============================================================================

/// One write call: a single batch targeting a single bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub bucket_key: String,
    pub dataset: WireDataSet,
    pub is_variable_length: bool,
}

impl WriteRequest {
    /// `{dataset, is_variable_length}`
    pub fn to_wire(&self) -> WireValue {
        WireValue::map([
            ("dataset", self.dataset.to_wire()),
            ("is_variable_length", WireValue::from(self.is_variable_length)),
        ])
    }

    /// `{requests: [{dataset, is_variable_length}]}`, the `Write` call payload.
    pub fn to_params(&self) -> WireValue {
        WireValue::map([("requests", WireValue::Array(vec![self.to_wire()]))])
    }
}

/// Encode a batch for a write into `bucket_key`.
pub fn encode_write(
    batch: &RecordBatch,
    bucket_key: &str,
    is_variable_length: bool,
) -> Result<WriteRequest, EncodingError> {
    Ok(WriteRequest {
        bucket_key: bucket_key.to_string(),
        dataset: WireDataSet::from_batch(batch, bucket_key)?,
        is_variable_length,
    })
}

// ============================================================================
// Tests
// ============================================================================
