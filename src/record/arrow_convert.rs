//! Arrow Conversion Utilities
//!
//! Converts between Arrow `RecordBatch`es and the fixed-width [`RecordBatch`]
//! the data service understands. Only null-free primitive columns,
//! second-resolution timestamps and fixed-size binary columns have a wire
//! representation.

use super::{Column, ColumnData, RecordBatch};
use crate::protocol::EncodingError;
use arrow::array::{
    Array, ArrayRef, FixedSizeBinaryArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow::buffer::Buffer;
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch as ArrowRecordBatch, RecordBatchOptions};
use std::sync::Arc;

macro_rules! primitive_values {
    ($array:expr, $arrow_ty:ty, $variant:ident) => {
        $array
            .as_any()
            .downcast_ref::<$arrow_ty>()
            .map(|arr| ColumnData::$variant(arr.values().to_vec()))
    };
}

/// Convert one Arrow column to a wire column
fn column_from_array(name: &str, array: &dyn Array) -> Result<ColumnData, EncodingError> {
    if array.null_count() > 0 {
        return Err(EncodingError::Nulls {
            column: name.to_string(),
            count: array.null_count(),
        });
    }

    let data = match array.data_type() {
        ArrowDataType::Int8 => primitive_values!(array, Int8Array, I8),
        ArrowDataType::Int16 => primitive_values!(array, Int16Array, I16),
        ArrowDataType::Int32 => primitive_values!(array, Int32Array, I32),
        ArrowDataType::Int64 => primitive_values!(array, Int64Array, I64),
        ArrowDataType::UInt8 => primitive_values!(array, UInt8Array, U8),
        ArrowDataType::UInt16 => primitive_values!(array, UInt16Array, U16),
        ArrowDataType::UInt32 => primitive_values!(array, UInt32Array, U32),
        ArrowDataType::UInt64 => primitive_values!(array, UInt64Array, U64),
        ArrowDataType::Float32 => primitive_values!(array, Float32Array, F32),
        ArrowDataType::Float64 => primitive_values!(array, Float64Array, F64),
        // Epoch columns are plain int64 seconds on the wire
        ArrowDataType::Timestamp(TimeUnit::Second, _) => {
            primitive_values!(array, TimestampSecondArray, I64)
        }
        ArrowDataType::FixedSizeBinary(width) => {
            let width = usize::try_from(*width)
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| EncodingError::ZeroWidth {
                    column: name.to_string(),
                })?;
            array
                .as_any()
                .downcast_ref::<FixedSizeBinaryArray>()
                .map(|arr| ColumnData::Bytes {
                    width,
                    data: (0..arr.len())
                        .flat_map(|i| arr.value(i).iter().copied())
                        .collect(),
                })
        }
        _ => None,
    };

    data.ok_or_else(|| EncodingError::UnsupportedType {
        column: name.to_string(),
        data_type: array.data_type().to_string(),
    })
}

/// Convert a wire column to an Arrow array
fn array_from_column(data: &ColumnData) -> Result<ArrayRef, ArrowError> {
    let array: ArrayRef = match data {
        ColumnData::I8(v) => Arc::new(Int8Array::from(v.clone())),
        ColumnData::I16(v) => Arc::new(Int16Array::from(v.clone())),
        ColumnData::I32(v) => Arc::new(Int32Array::from(v.clone())),
        ColumnData::I64(v) => Arc::new(Int64Array::from(v.clone())),
        ColumnData::U8(v) => Arc::new(UInt8Array::from(v.clone())),
        ColumnData::U16(v) => Arc::new(UInt16Array::from(v.clone())),
        ColumnData::U32(v) => Arc::new(UInt32Array::from(v.clone())),
        ColumnData::U64(v) => Arc::new(UInt64Array::from(v.clone())),
        ColumnData::F32(v) => Arc::new(Float32Array::from(v.clone())),
        ColumnData::F64(v) => Arc::new(Float64Array::from(v.clone())),
        ColumnData::Bytes { width, data } => {
            let size = i32::try_from(*width).map_err(|_| {
                ArrowError::InvalidArgumentError(format!("byte width {width} exceeds i32"))
            })?;
            Arc::new(FixedSizeBinaryArray::try_new(
                size,
                Buffer::from_vec(data.clone()),
                None,
            )?)
        }
    };
    Ok(array)
}

impl RecordBatch {
    /// Convert an Arrow batch, keeping column order.
    pub fn from_arrow(batch: &ArrowRecordBatch) -> Result<Self, EncodingError> {
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| {
                column_from_array(field.name(), array.as_ref())
                    .map(|data| Column::new(field.name().clone(), data))
            })
            .collect::<Result<Vec<_>, _>>()?;
        RecordBatch::try_new(columns)
    }

    /// Convert to an Arrow batch with non-nullable fields.
    pub fn to_arrow(&self) -> Result<ArrowRecordBatch, ArrowError> {
        let mut fields = Vec::with_capacity(self.num_columns());
        let mut arrays = Vec::with_capacity(self.num_columns());
        for column in self.columns() {
            let array = array_from_column(&column.data)?;
            fields.push(Field::new(
                column.name.clone(),
                array.data_type().clone(),
                false,
            ));
            arrays.push(array);
        }
        let options = RecordBatchOptions::new().with_row_count(Some(self.len()));
        ArrowRecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
    }
}

impl TryFrom<&ArrowRecordBatch> for RecordBatch {
    type Error = EncodingError;

    fn try_from(batch: &ArrowRecordBatch) -> Result<Self, Self::Error> {
        RecordBatch::from_arrow(batch)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    fn arrow_batch(columns: Vec<(&str, ArrayRef)>) -> ArrowRecordBatch {
        ArrowRecordBatch::try_from_iter(columns).unwrap()
    }

    #[test]
    fn test_from_arrow_primitives() {
        let batch = arrow_batch(vec![
            ("Epoch", Arc::new(Int64Array::from(vec![10i64, 20])) as ArrayRef),
            ("Close", Arc::new(Float32Array::from(vec![1.5f32, 2.5])) as ArrayRef),
            ("Flags", Arc::new(UInt8Array::from(vec![0u8, 1])) as ArrayRef),
        ]);
        let converted = RecordBatch::try_from(&batch).unwrap();
        assert_eq!(converted.len(), 2);
        assert_eq!(converted.column("Epoch"), Some(&ColumnData::I64(vec![10, 20])));
        assert_eq!(converted.column("Close"), Some(&ColumnData::F32(vec![1.5, 2.5])));
        assert_eq!(converted.column("Flags"), Some(&ColumnData::U8(vec![0, 1])));
    }

    #[test]
    fn test_from_arrow_timestamp_seconds() {
        let batch = arrow_batch(vec![(
            "Epoch",
            Arc::new(TimestampSecondArray::from(vec![1_500_000_000i64])) as ArrayRef,
        )]);
        let converted = RecordBatch::from_arrow(&batch).unwrap();
        assert_eq!(converted.column("Epoch"), Some(&ColumnData::I64(vec![1_500_000_000])));
    }

    #[test]
    fn test_from_arrow_fixed_size_binary() {
        let symbols =
            FixedSizeBinaryArray::try_from_iter([b"AAPL".to_vec(), b"MSFT".to_vec()].into_iter())
                .unwrap();
        let batch = arrow_batch(vec![("Sym", Arc::new(symbols) as ArrayRef)]);
        let converted = RecordBatch::from_arrow(&batch).unwrap();
        assert_eq!(
            converted.column("Sym"),
            Some(&ColumnData::Bytes {
                width: 4,
                data: b"AAPLMSFT".to_vec()
            })
        );
    }

    #[test]
    fn test_from_arrow_rejects_strings() {
        let batch = arrow_batch(vec![(
            "Name",
            Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef,
        )]);
        let err = RecordBatch::from_arrow(&batch).unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnsupportedType {
                column: "Name".to_string(),
                data_type: "Utf8".to_string()
            }
        );
    }

    #[test]
    fn test_from_arrow_rejects_nulls() {
        let batch = arrow_batch(vec![(
            "Close",
            Arc::new(Float64Array::from(vec![Some(1.0), None])) as ArrayRef,
        )]);
        let err = RecordBatch::from_arrow(&batch).unwrap_err();
        assert_eq!(
            err,
            EncodingError::Nulls {
                column: "Close".to_string(),
                count: 1
            }
        );
    }

    #[test]
    fn test_arrow_roundtrip() {
        let original = RecordBatch::builder()
            .column("Epoch", vec![1i64, 2, 3])
            .column("Open", vec![1.0f64, 2.0, 3.0])
            .column("Count", vec![7u32, 8, 9])
            .bytes_column("Sym", 2, b"AABBCC".to_vec())
            .build()
            .unwrap();
        let arrow = original.to_arrow().unwrap();
        assert_eq!(arrow.num_rows(), 3);
        assert_eq!(arrow.schema().field(3).data_type(), &ArrowDataType::FixedSizeBinary(2));
        assert_eq!(RecordBatch::from_arrow(&arrow).unwrap(), original);
    }

    #[test]
    fn test_empty_batch_keeps_row_count() {
        let arrow = RecordBatch::default().to_arrow().unwrap();
        assert_eq!(arrow.num_rows(), 0);
        assert_eq!(arrow.num_columns(), 0);
    }
}
