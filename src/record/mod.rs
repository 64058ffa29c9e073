//! Columnar record batches.
//!
//! A [`RecordBatch`] is an ordered list of named, fixed-width columns sharing
//! one row count. Column buffers travel over the wire as raw bytes, so every
//! element type has a fixed layout:
//!
//! | Type       | Tag    | Width | Layout                 |
//! |------------|--------|-------|------------------------|
//! | `I8`       | `i1`   | 1     | two's complement       |
//! | `I16`      | `i2`   | 2     | little-endian          |
//! | `I32`      | `i4`   | 4     | little-endian          |
//! | `I64`      | `i8`   | 8     | little-endian          |
//! | `U8`       | `u1`   | 1     |                        |
//! | `U16`      | `u2`   | 2     | little-endian          |
//! | `U32`      | `u4`   | 4     | little-endian          |
//! | `U64`      | `u8`   | 8     | little-endian          |
//! | `F32`      | `f4`   | 4     | IEEE 754, little-endian|
//! | `F64`      | `f8`   | 8     | IEEE 754, little-endian|
//! | `Bytes(n)` | `S<n>` | n     | verbatim               |
//!
//! Tags carry width and kind only. The byte order is fixed by the wire format
//! (little-endian) and is applied explicitly, never taken from the host.

mod arrow_convert;
mod dataset;

pub use dataset::{encode_write, WireDataSet, WriteRequest};

use crate::protocol::EncodingError;
use std::fmt;

// ============================================================================
// Element Type
// ============================================================================

/// Fixed-width element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Fixed-size byte blob of the given width
    Bytes(usize),
}

impl ElementType {
    /// Width of one element in bytes
    pub fn width(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 => 8,
            ElementType::Bytes(n) => n,
        }
    }

    /// Wire type tag, without any byte-order marker.
    pub fn wire_tag(self, column: &str) -> Result<String, EncodingError> {
        let tag = match self {
            ElementType::I8 => "i1",
            ElementType::I16 => "i2",
            ElementType::I32 => "i4",
            ElementType::I64 => "i8",
            ElementType::U8 => "u1",
            ElementType::U16 => "u2",
            ElementType::U32 => "u4",
            ElementType::U64 => "u8",
            ElementType::F32 => "f4",
            ElementType::F64 => "f8",
            ElementType::Bytes(0) => {
                return Err(EncodingError::ZeroWidth {
                    column: column.to_string(),
                })
            }
            ElementType::Bytes(n) => return Ok(format!("S{n}")),
        };
        Ok(tag.to_string())
    }

    /// Parse a wire type tag.
    ///
    /// A leading `<`, `|` or `=` marker is accepted and ignored. Big-endian
    /// tags are rejected since the wire carries little-endian buffers only.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let bare = tag.strip_prefix(&['<', '|', '='][..]).unwrap_or(tag);
        let ty = match bare {
            "i1" => ElementType::I8,
            "i2" => ElementType::I16,
            "i4" => ElementType::I32,
            "i8" => ElementType::I64,
            "u1" => ElementType::U8,
            "u2" => ElementType::U16,
            "u4" => ElementType::U32,
            "u8" => ElementType::U64,
            "f4" => ElementType::F32,
            "f8" => ElementType::F64,
            _ => {
                let width: usize = bare
                    .strip_prefix('S')
                    .or_else(|| bare.strip_prefix('V'))?
                    .parse()
                    .ok()?;
                if width == 0 {
                    return None;
                }
                ElementType::Bytes(width)
            }
        };
        Some(ty)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Bytes(n) => write!(f, "Bytes[{n}]"),
            other => write!(f, "{other:?}"),
        }
    }
}

// ============================================================================
// Column Data
// ============================================================================

/// Typed column buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Fixed-size blobs packed back to back, `width` bytes each
    Bytes { width: usize, data: Vec<u8> },
}

/// Apply the same expression to every primitive variant.
macro_rules! each_primitive {
    ($value:expr, $v:ident => $body:expr, $width:ident, $data:ident => $bytes:expr) => {
        match $value {
            ColumnData::I8($v) => $body,
            ColumnData::I16($v) => $body,
            ColumnData::I32($v) => $body,
            ColumnData::I64($v) => $body,
            ColumnData::U8($v) => $body,
            ColumnData::U16($v) => $body,
            ColumnData::U32($v) => $body,
            ColumnData::U64($v) => $body,
            ColumnData::F32($v) => $body,
            ColumnData::F64($v) => $body,
            ColumnData::Bytes {
                width: $width,
                data: $data,
            } => $bytes,
        }
    };
}

fn decode_le<const N: usize, T>(bytes: &[u8], convert: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            convert(buf)
        })
        .collect()
}

impl ColumnData {
    /// Element type of this column
    pub fn element_type(&self) -> ElementType {
        match self {
            ColumnData::I8(_) => ElementType::I8,
            ColumnData::I16(_) => ElementType::I16,
            ColumnData::I32(_) => ElementType::I32,
            ColumnData::I64(_) => ElementType::I64,
            ColumnData::U8(_) => ElementType::U8,
            ColumnData::U16(_) => ElementType::U16,
            ColumnData::U32(_) => ElementType::U32,
            ColumnData::U64(_) => ElementType::U64,
            ColumnData::F32(_) => ElementType::F32,
            ColumnData::F64(_) => ElementType::F64,
            ColumnData::Bytes { width, .. } => ElementType::Bytes(*width),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        each_primitive!(self, v => v.len(), width, data => {
            if *width == 0 { 0 } else { data.len() / width }
        })
    }

    /// Check if the column has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian element bytes, `len() * width` long.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            ColumnData::I8(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::I16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::I32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::U8(v) => v.clone(),
            ColumnData::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::U64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnData::Bytes { data, .. } => data.clone(),
        }
    }

    /// Rebuild a column from little-endian element bytes.
    pub fn from_le_bytes(
        column: &str,
        element_type: ElementType,
        bytes: &[u8],
    ) -> Result<Self, EncodingError> {
        let width = element_type.width();
        if width == 0 {
            return Err(EncodingError::ZeroWidth {
                column: column.to_string(),
            });
        }
        if bytes.len() % width != 0 {
            return Err(EncodingError::ByteLength {
                column: column.to_string(),
                len: bytes.len(),
                width,
            });
        }
        Ok(match element_type {
            ElementType::I8 => ColumnData::I8(decode_le(bytes, i8::from_le_bytes)),
            ElementType::I16 => ColumnData::I16(decode_le(bytes, i16::from_le_bytes)),
            ElementType::I32 => ColumnData::I32(decode_le(bytes, i32::from_le_bytes)),
            ElementType::I64 => ColumnData::I64(decode_le(bytes, i64::from_le_bytes)),
            ElementType::U8 => ColumnData::U8(bytes.to_vec()),
            ElementType::U16 => ColumnData::U16(decode_le(bytes, u16::from_le_bytes)),
            ElementType::U32 => ColumnData::U32(decode_le(bytes, u32::from_le_bytes)),
            ElementType::U64 => ColumnData::U64(decode_le(bytes, u64::from_le_bytes)),
            ElementType::F32 => ColumnData::F32(decode_le(bytes, f32::from_le_bytes)),
            ElementType::F64 => ColumnData::F64(decode_le(bytes, f64::from_le_bytes)),
            ElementType::Bytes(width) => ColumnData::Bytes {
                width,
                data: bytes.to_vec(),
            },
        })
    }

    /// Rows `offset..offset + len`, or `None` when out of range.
    pub fn slice(&self, offset: usize, len: usize) -> Option<ColumnData> {
        let end = offset.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(match self {
            ColumnData::I8(v) => ColumnData::I8(v[offset..end].to_vec()),
            ColumnData::I16(v) => ColumnData::I16(v[offset..end].to_vec()),
            ColumnData::I32(v) => ColumnData::I32(v[offset..end].to_vec()),
            ColumnData::I64(v) => ColumnData::I64(v[offset..end].to_vec()),
            ColumnData::U8(v) => ColumnData::U8(v[offset..end].to_vec()),
            ColumnData::U16(v) => ColumnData::U16(v[offset..end].to_vec()),
            ColumnData::U32(v) => ColumnData::U32(v[offset..end].to_vec()),
            ColumnData::U64(v) => ColumnData::U64(v[offset..end].to_vec()),
            ColumnData::F32(v) => ColumnData::F32(v[offset..end].to_vec()),
            ColumnData::F64(v) => ColumnData::F64(v[offset..end].to_vec()),
            ColumnData::Bytes { width, data } => ColumnData::Bytes {
                width: *width,
                data: data[offset * width..end * width].to_vec(),
            },
        })
    }

    /// Integer value at `row` widened to i64. `None` for float and byte
    /// columns, out-of-range rows, and u64 values above `i64::MAX`.
    pub fn integer_at(&self, row: usize) -> Option<i64> {
        match self {
            ColumnData::I8(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::I16(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::I32(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::I64(v) => v.get(row).copied(),
            ColumnData::U8(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::U16(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::U32(v) => v.get(row).map(|x| i64::from(*x)),
            ColumnData::U64(v) => v.get(row).and_then(|x| i64::try_from(*x).ok()),
            _ => None,
        }
    }

    /// Blob at `row` for fixed-size byte columns.
    pub fn bytes_at(&self, row: usize) -> Option<&[u8]> {
        match self {
            ColumnData::Bytes { width, data } if *width > 0 => {
                let start = row.checked_mul(*width)?;
                data.get(start..start.checked_add(*width)?)
            }
            _ => None,
        }
    }
}

macro_rules! column_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for ColumnData {
                fn from(v: Vec<$ty>) -> Self {
                    ColumnData::$variant(v)
                }
            }
        )*
    };
}

column_from_vec! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
}

// ============================================================================
// Record Batch
// ============================================================================

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Ordered columns sharing a row count.
///
/// Every column is guaranteed to hold exactly [`len`](Self::len) elements and
/// column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordBatch {
    columns: Vec<Column>,
    length: usize,
}

impl RecordBatch {
    /// Validate and build a batch. The first column fixes the row count.
    pub fn try_new(columns: Vec<Column>) -> Result<Self, EncodingError> {
        for (idx, column) in columns.iter().enumerate() {
            if let ColumnData::Bytes { width, data } = &column.data {
                if *width == 0 && !data.is_empty() {
                    return Err(EncodingError::ZeroWidth {
                        column: column.name.clone(),
                    });
                }
                if *width > 0 && data.len() % width != 0 {
                    return Err(EncodingError::ByteLength {
                        column: column.name.clone(),
                        len: data.len(),
                        width: *width,
                    });
                }
            }
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(EncodingError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        let length = columns.first().map_or(0, |c| c.data.len());
        if let Some(bad) = columns.iter().find(|c| c.data.len() != length) {
            return Err(EncodingError::LengthMismatch {
                column: bad.name.clone(),
                expected: length,
                got: bad.data.len(),
            });
        }

        Ok(Self { columns, length })
    }

    /// Start an incremental builder.
    pub fn builder() -> RecordBatchBuilder {
        RecordBatchBuilder::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if the batch has no rows
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Rows `offset..offset + len` of every column, or `None` when out of range.
    pub fn slice(&self, offset: usize, len: usize) -> Option<RecordBatch> {
        if offset.checked_add(len)? > self.length {
            return None;
        }
        let columns = self
            .columns
            .iter()
            .map(|c| {
                c.data.slice(offset, len).map(|data| Column {
                    name: c.name.clone(),
                    data,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(RecordBatch {
            columns,
            length: len,
        })
    }
}

/// Builder collecting columns for [`RecordBatch::try_new`].
#[derive(Debug, Default)]
pub struct RecordBatchBuilder {
    columns: Vec<Column>,
}

impl RecordBatchBuilder {
    /// Append a primitive column
    pub fn column(mut self, name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        self.columns.push(Column::new(name, data));
        self
    }

    /// Append a fixed-size byte column
    pub fn bytes_column(mut self, name: impl Into<String>, width: usize, data: Vec<u8>) -> Self {
        self.columns
            .push(Column::new(name, ColumnData::Bytes { width, data }));
        self
    }

    pub fn build(self) -> Result<RecordBatch, EncodingError> {
        RecordBatch::try_new(self.columns)
    }
}

// ============================================================================
// Tests
// ============================================================================
