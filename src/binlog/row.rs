// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoding of a single row image against a table map.

use bitvec::{order::Lsb0, slice::BitSlice, vec::BitVec};
use byteorder::{LittleEndian as LE, ReadBytesExt};

use crate::{
    binlog::{events::TableMapEvent, take},
    constants::ColumnType,
    error::{Error, Result},
    value::Value,
};

/// One decoded row image.
///
/// Holds one value per column present in the image, in table map order.
/// Columns absent from the columns-present bitmap do not appear here at all;
/// NULL columns appear as [`Value::NULL`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Returns the decoded values of this row.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Unwraps the values of this row.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Returns the number of values in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has a length of 0.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reads one row image. `cols` is the columns-present bitmap of the enclosing
/// rows event; the null bitmap is sized by the number of present columns.
pub(crate) fn read_row(
    input: &mut &[u8],
    table_map: &TableMapEvent,
    cols: &BitSlice<u8, Lsb0>,
) -> Result<Row> {
    let num_present = cols.count_ones();
    let bitmap_len = (num_present + 7) / 8;

    let mut null_bitmap = BitVec::<u8, Lsb0>::from_vec(take(input, bitmap_len)?.to_vec());
    null_bitmap.truncate(num_present);

    let mut values = Vec::with_capacity(num_present);
    let mut image_idx = 0;

    for i in 0..table_map.column_count() {
        if !cols.get(i).map(|bit| *bit).unwrap_or(false) {
            continue;
        }

        if null_bitmap[image_idx] {
            values.push(Value::NULL);
        } else {
            let column_type = table_map.column_types[i];
            let column_meta = table_map.column_meta[i];
            values.push(read_value(input, column_type, column_meta)?);
        }

        image_idx += 1;
    }

    Ok(Row { values })
}

/// Decodes a single non-NULL column value.
fn read_value(input: &mut &[u8], column_type: ColumnType, meta: u16) -> Result<Value> {
    use ColumnType::*;

    match column_type {
        MYSQL_TYPE_NULL => Ok(Value::NULL),
        MYSQL_TYPE_TINY => Ok(Value::Int(input.read_u8()? as i64)),
        MYSQL_TYPE_SHORT => Ok(Value::Int(input.read_i16::<LE>()? as i64)),
        MYSQL_TYPE_INT24 => Ok(Value::Int(input.read_i24::<LE>()? as i64)),
        MYSQL_TYPE_LONG => Ok(Value::Int(input.read_i32::<LE>()? as i64)),
        MYSQL_TYPE_LONGLONG => Ok(Value::Int(input.read_i64::<LE>()?)),
        MYSQL_TYPE_FLOAT => Ok(Value::Double(input.read_f32::<LE>()? as f64)),
        MYSQL_TYPE_DOUBLE => Ok(Value::Double(input.read_f64::<LE>()?)),
        MYSQL_TYPE_YEAR => {
            let year = input.read_u8()?;
            if year == 0 {
                Ok(Value::NULL)
            } else {
                // YEAR carries no month or day; keep the wire-faithful "Jan 0"
                Ok(Value::Date(1900 + year as u16, 1, 0, 0, 0, 0))
            }
        }
        MYSQL_TYPE_DATETIME => {
            // packed decimal YYYYMMDDhhmmss
            let packed = input.read_i64::<LE>()?;

            let second = (packed % 100) as u8;
            let minute = ((packed % 10_000) / 100) as u8;
            let hour = ((packed % 1_000_000) / 10_000) as u8;

            let date = packed / 1_000_000;
            let day = (date % 100) as u8;
            let month = ((date % 10_000) / 100) as u8;
            let year = (date / 10_000) as u16;

            Ok(Value::Date(year, month, day, hour, minute, second))
        }
        MYSQL_TYPE_VARCHAR => {
            let len = if meta > 255 {
                input.read_u16::<LE>()? as usize
            } else {
                input.read_u8()? as usize
            };
            Ok(Value::Bytes(take(input, len)?.to_vec()))
        }
        MYSQL_TYPE_BLOB => {
            if !(1..=4).contains(&meta) {
                return Err(Error::Protocol(format!(
                    "invalid blob length-prefix width {}",
                    meta
                )));
            }
            let len = input.read_uint::<LE>(meta as usize)? as usize;
            Ok(Value::Bytes(take(input, len)?.to_vec()))
        }
        MYSQL_TYPE_STRING => {
            let (real_type, max_len) = unpack_string_metadata(meta);
            match real_type {
                ColumnType::MYSQL_TYPE_ENUM | ColumnType::MYSQL_TYPE_SET => {
                    Err(Error::UnsupportedFieldType(real_type))
                }
                _ => {
                    let len = if max_len > 255 {
                        input.read_u16::<LE>()? as usize
                    } else {
                        input.read_u8()? as usize
                    };
                    Ok(Value::Bytes(take(input, len)?.to_vec()))
                }
            }
        }
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL | MYSQL_TYPE_BIT | MYSQL_TYPE_ENUM
        | MYSQL_TYPE_SET | MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB
        | MYSQL_TYPE_LONG_BLOB | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_GEOMETRY
        | MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE | MYSQL_TYPE_TIME | MYSQL_TYPE_TIMESTAMP
        | MYSQL_TYPE_TIME2 | MYSQL_TYPE_DATETIME2 | MYSQL_TYPE_TIMESTAMP2 => {
            Err(Error::UnsupportedFieldType(column_type))
        }
    }
}

/// Unpacks the two metadata bytes of a `STRING` column into the real column
/// type and the declared maximum length. Lengths above 255 fold their high
/// bits into the unused bits of the type byte.
fn unpack_string_metadata(meta: u16) -> (ColumnType, u16) {
    use std::convert::TryFrom;

    let type_byte = (meta & 0xff) as u8;
    let len_byte = (meta >> 8) as u16;

    let (real_type, max_len) = if type_byte & 0x30 != 0x30 {
        (
            type_byte | 0x30,
            len_byte | (((type_byte as u16 & 0x30) ^ 0x30) << 4),
        )
    } else {
        (type_byte, len_byte)
    };

    (
        ColumnType::try_from(real_type).unwrap_or(ColumnType::MYSQL_TYPE_STRING),
        max_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(column_type: ColumnType, meta: u16, bytes: &[u8]) -> Result<Value> {
        let mut input = bytes;
        let value = read_value(&mut input, column_type, meta)?;
        assert!(input.is_empty(), "trailing bytes after value");
        Ok(value)
    }

    #[test]
    fn integers_decode_signed_except_tiny() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_TINY, 0, &[0xff]).unwrap(),
            Value::Int(255)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_SHORT, 0, &[0xff, 0xff]).unwrap(),
            Value::Int(-1)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_LONG, 0, &[0x2a, 0x00, 0x00, 0x00]).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            value(
                ColumnType::MYSQL_TYPE_LONGLONG,
                0,
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
            )
            .unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn int24_sign_extends() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_INT24, 0, &[0xff, 0xff, 0xff]).unwrap(),
            Value::Int(-1)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_INT24, 0, &[0x00, 0x00, 0x80]).unwrap(),
            Value::Int(-8_388_608)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_INT24, 0, &[0x39, 0x30, 0x00]).unwrap(),
            Value::Int(12345)
        );
    }

    #[test]
    fn floats_widen_to_double() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_FLOAT, 4, &1.5_f32.to_le_bytes()).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_DOUBLE, 8, &(-2.25_f64).to_le_bytes()).unwrap(),
            Value::Double(-2.25)
        );
    }

    #[test]
    fn year_zero_is_null() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_YEAR, 0, &[0]).unwrap(),
            Value::NULL
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_YEAR, 0, &[124]).unwrap(),
            Value::Date(2024, 1, 0, 0, 0, 0)
        );
    }

    #[test]
    fn datetime_unpacks_decimal_digits() {
        let packed = 2024_08_17_12_34_56_i64;
        assert_eq!(
            value(
                ColumnType::MYSQL_TYPE_DATETIME,
                0,
                &packed.to_le_bytes()
            )
            .unwrap(),
            Value::Date(2024, 8, 17, 12, 34, 56)
        );
    }

    #[test]
    fn varchar_prefix_width_follows_metadata() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_VARCHAR, 30, &[3, b'a', b'b', b'c']).unwrap(),
            Value::Bytes(b"abc".to_vec())
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_VARCHAR, 300, &[3, 0, b'a', b'b', b'c']).unwrap(),
            Value::Bytes(b"abc".to_vec())
        );
    }

    #[test]
    fn blob_prefix_width_follows_metadata() {
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_BLOB, 2, &[2, 0, 0xde, 0xad]).unwrap(),
            Value::Bytes(vec![0xde, 0xad])
        );
        assert!(matches!(
            value(ColumnType::MYSQL_TYPE_BLOB, 0, &[]),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn string_metadata_unpacks_real_type_and_length() {
        // STRING(10): type byte keeps 0x30 bits, length in the high byte
        let meta = (ColumnType::MYSQL_TYPE_STRING as u16) | (10 << 8);
        assert_eq!(
            unpack_string_metadata(meta),
            (ColumnType::MYSQL_TYPE_STRING, 10)
        );
        assert_eq!(
            value(ColumnType::MYSQL_TYPE_STRING, meta, &[2, b'o', b'k']).unwrap(),
            Value::Bytes(b"ok".to_vec())
        );

        // ENUM hides behind STRING with its real type in the low byte
        let meta = (ColumnType::MYSQL_TYPE_ENUM as u16) | (1 << 8);
        assert!(matches!(
            value(ColumnType::MYSQL_TYPE_STRING, meta, &[1]),
            Err(Error::UnsupportedFieldType(ColumnType::MYSQL_TYPE_ENUM))
        ));
    }

    #[test]
    fn unsupported_types_are_reported() {
        for &column_type in &[
            ColumnType::MYSQL_TYPE_NEWDECIMAL,
            ColumnType::MYSQL_TYPE_BIT,
            ColumnType::MYSQL_TYPE_SET,
            ColumnType::MYSQL_TYPE_GEOMETRY,
            ColumnType::MYSQL_TYPE_TIME,
            ColumnType::MYSQL_TYPE_TIMESTAMP,
            ColumnType::MYSQL_TYPE_DATETIME2,
        ] {
            assert!(matches!(
                value(column_type, 0, &[0; 8]),
                Err(Error::UnsupportedFieldType(ty)) if ty == column_type
            ));
        }
    }

    #[test]
    fn short_input_is_a_short_read() {
        assert!(matches!(
            value(ColumnType::MYSQL_TYPE_LONG, 0, &[0x01, 0x02]),
            Err(Error::ShortRead)
        ));
        assert!(matches!(
            value(ColumnType::MYSQL_TYPE_VARCHAR, 30, &[5, b'a']),
            Err(Error::ShortRead)
        ));
    }

    mod props {
        use super::*;
        use crate::misc::RawText;
        use proptest::prelude::*;

        /// A column of the supported decoding subset together with a value.
        #[derive(Debug, Clone)]
        enum Col {
            Tiny(u8),
            Short(i16),
            Long(i32),
            LongLong(i64),
            Double(f64),
            Varchar(Vec<u8>),
        }

        impl Col {
            fn column_type(&self) -> ColumnType {
                match self {
                    Col::Tiny(_) => ColumnType::MYSQL_TYPE_TINY,
                    Col::Short(_) => ColumnType::MYSQL_TYPE_SHORT,
                    Col::Long(_) => ColumnType::MYSQL_TYPE_LONG,
                    Col::LongLong(_) => ColumnType::MYSQL_TYPE_LONGLONG,
                    Col::Double(_) => ColumnType::MYSQL_TYPE_DOUBLE,
                    Col::Varchar(_) => ColumnType::MYSQL_TYPE_VARCHAR,
                }
            }

            fn meta(&self) -> u16 {
                match self {
                    Col::Double(_) => 8,
                    Col::Varchar(_) => 30,
                    _ => 0,
                }
            }

            fn encode(&self, out: &mut Vec<u8>) {
                match self {
                    Col::Tiny(x) => out.push(*x),
                    Col::Short(x) => out.extend_from_slice(&x.to_le_bytes()),
                    Col::Long(x) => out.extend_from_slice(&x.to_le_bytes()),
                    Col::LongLong(x) => out.extend_from_slice(&x.to_le_bytes()),
                    Col::Double(x) => out.extend_from_slice(&x.to_le_bytes()),
                    Col::Varchar(bytes) => {
                        out.push(bytes.len() as u8);
                        out.extend_from_slice(bytes);
                    }
                }
            }

            fn expected(&self) -> Value {
                match self {
                    Col::Tiny(x) => Value::Int(*x as i64),
                    Col::Short(x) => Value::Int(*x as i64),
                    Col::Long(x) => Value::Int(*x as i64),
                    Col::LongLong(x) => Value::Int(*x),
                    Col::Double(x) => Value::Double(*x),
                    Col::Varchar(bytes) => Value::Bytes(bytes.clone()),
                }
            }
        }

        fn col_strategy() -> impl Strategy<Value = Col> {
            prop_oneof![
                any::<u8>().prop_map(Col::Tiny),
                any::<i16>().prop_map(Col::Short),
                any::<i32>().prop_map(Col::Long),
                any::<i64>().prop_map(Col::LongLong),
                // keep doubles comparable (no NaN)
                any::<i32>().prop_map(|x| Col::Double(x as f64)),
                prop::collection::vec(any::<u8>(), 0..40).prop_map(Col::Varchar),
            ]
        }

        fn table_map_for(cols: &[Col]) -> TableMapEvent {
            TableMapEvent {
                table_id: 1,
                flags: 1,
                schema_name: RawText(b"test".to_vec()),
                table_name: RawText(b"t".to_vec()),
                column_types: cols.iter().map(Col::column_type).collect(),
                column_meta: cols.iter().map(Col::meta).collect(),
                null_bitmap: BitVec::repeat(false, cols.len()),
            }
        }

        proptest! {
            #[test]
            fn row_roundtrip(cols in prop::collection::vec(col_strategy(), 1..8)) {
                let table_map = table_map_for(&cols);

                let mut encoded = vec![0_u8; (cols.len() + 7) / 8]; // null bitmap
                for col in &cols {
                    col.encode(&mut encoded);
                }

                let columns_present = BitVec::<u8, Lsb0>::repeat(true, cols.len());
                let mut input = &encoded[..];
                let row = read_row(&mut input, &table_map, &columns_present).unwrap();

                prop_assert!(input.is_empty(), "row decoding must consume the image");
                let expected = cols.iter().map(Col::expected).collect::<Vec<_>>();
                prop_assert_eq!(row.values(), &expected[..]);
            }
        }
    }
}
