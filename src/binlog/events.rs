// Copyright (c) 2020 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Decoders for the event bodies this crate models. Each decoder consumes the
//! event body — everything after the common header, with the checksum suffix
//! already stripped.

use bitvec::{order::Lsb0, vec::BitVec};
use byteorder::{LittleEndian as LE, ReadBytesExt};

use std::{collections::HashMap, convert::TryFrom, io::Read};

use crate::{
    binlog::{take, BinlogEventFooter, BinlogVersion, EventType, UnknownBinlogVersion},
    constants::ColumnType,
    error::{Error, Result},
    io::ReadMysqlExt,
    misc::{split_version, RawField, RawText},
};

use super::row::{read_row, Row};

/// A format description event is the first event of a binlog for
/// binlog-version 4. It describes how the other events are laid out.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormatDescriptionEvent {
    /// Version of this binlog format.
    pub binlog_version: RawField<u16, UnknownBinlogVersion, BinlogVersion>,

    /// Version of the MySql Server that created the binlog (len=50).
    ///
    /// NUL-padded on the wire; [`RawText::get`] trims the padding.
    pub server_version: RawText<[u8; 50]>,

    /// Seconds since Unix epoch when the binlog was created.
    pub create_timestamp: u32,

    /// Length of the common event header. 19 for binlog version 4.
    pub common_header_length: u8,

    /// An array indexed by `event type - 1` to extract the length of the
    /// event-specific (post-header) part.
    pub post_header_lengths: Vec<u8>,

    /// Checksum algorithm description read from the tail of this event.
    ///
    /// Must be assigned after `Self::read` — the reader strips it together
    /// with the checksum before the body is parsed.
    pub footer: BinlogEventFooter,
}

impl FormatDescriptionEvent {
    /// Length of a server version string.
    pub const SERVER_VER_LEN: usize = 50;
    /// Offset of a server version string within the event body.
    pub const SERVER_VER_OFFSET: usize = 2;

    pub(crate) fn read(mut input: &[u8]) -> Result<Self> {
        let binlog_version = input.read_u16::<LE>()?;

        let mut server_version = [0_u8; Self::SERVER_VER_LEN];
        input.read_exact(&mut server_version)?;

        let create_timestamp = input.read_u32::<LE>()?;
        let common_header_length = input.read_u8()?;
        let post_header_lengths = input.to_vec();

        Ok(Self {
            binlog_version: RawField::new(binlog_version),
            server_version: RawText(server_version),
            create_timestamp,
            common_header_length,
            post_header_lengths,
            footer: BinlogEventFooter::default(),
        })
    }

    /// Returns a parsed MySql version.
    pub fn split_version(&self) -> (u8, u8, u8) {
        split_version(&self.server_version.0)
    }

    /// Returns the post-header length for the given event type.
    pub fn post_header_len(&self, event_type: EventType) -> Result<u8> {
        if event_type == EventType::UNKNOWN_EVENT {
            return Ok(0);
        }

        self.post_header_lengths
            .get(event_type as usize - 1)
            .copied()
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "format description lists no post-header length for {:?}",
                    event_type
                ))
            })
    }
}

/// The rotate event is added to the binlog as last event to tell the reader
/// what binlog to request next.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RotateEvent {
    // post-header
    /// Position within the next binlog.
    pub position: u64,

    // payload
    /// Name of the next binlog.
    pub name: RawText,
}

impl RotateEvent {
    pub(crate) fn read(mut input: &[u8]) -> Result<Self> {
        let position = input.read_u64::<LE>()?;
        let name = input.to_vec();

        Ok(Self {
            position,
            name: RawText(name),
        })
    }
}

/// A query event is created for each statement that modifies the database,
/// unless the statement is logged row-based.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QueryEvent {
    // post-header fields
    /// The ID of the thread that issued this statement.
    pub slave_proxy_id: u32,
    /// The time from when the query started to when it was logged, in seconds.
    pub execution_time: u32,
    /// Error code generated by the master.
    pub error_code: u16,

    // payload
    /// Zero or more status variables, kept raw.
    pub status_vars: Vec<u8>,
    /// The currently selected database name.
    pub schema: RawText,
    /// The SQL statement. Not parsed any further.
    pub query: RawText,
}

impl QueryEvent {
    pub(crate) fn read(mut input: &[u8]) -> Result<Self> {
        let slave_proxy_id = input.read_u32::<LE>()?;
        let execution_time = input.read_u32::<LE>()?;
        let schema_len = input.read_u8()? as usize;
        let error_code = input.read_u16::<LE>()?;
        let status_vars_len = input.read_u16::<LE>()? as usize;

        let status_vars = take(&mut input, status_vars_len)?.to_vec();
        let schema = take(&mut input, schema_len)?.to_vec();
        input.read_u8()?; // skip null
        let query = input.to_vec();

        Ok(Self {
            slave_proxy_id,
            execution_time,
            error_code,
            status_vars,
            schema: RawText(schema),
            query: RawText(query),
        })
    }
}

/// Table map event.
///
/// In row-based mode, every sequence of rows events is preceded by a table map
/// event which binds a table definition to a numeric id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableMapEvent {
    // post-header
    /// The number that identifies the table (6 bytes on the wire).
    pub table_id: u64,
    /// Reserved for future use; currently always 0.
    pub flags: u16,

    // payload
    /// The name of the database in which the table resides.
    pub schema_name: RawText,
    /// The name of the table.
    pub table_name: RawText,
    /// The type of each column in the table, listed from left to right.
    pub column_types: Vec<ColumnType>,
    /// One metadata word per column; the encoding depends on the column type.
    pub column_meta: Vec<u16>,
    /// For each column, a bit indicating whether the column can be NULL.
    pub null_bitmap: BitVec<u8, Lsb0>,
}

impl TableMapEvent {
    /// Returns the number of columns in this table.
    pub fn column_count(&self) -> usize {
        self.column_types.len()
    }

    pub(crate) fn read(mut input: &[u8], post_header_len: u8) -> Result<Self> {
        let table_id = if post_header_len == 6 {
            input.read_u32::<LE>()? as u64
        } else {
            input.read_u48::<LE>()?
        };

        let flags = input.read_u16::<LE>()?;

        let schema_name_len = input.read_u8()? as usize;
        let schema_name = take(&mut input, schema_name_len)?.to_vec();
        input.read_u8()?; // skip null

        let table_name_len = input.read_u8()? as usize;
        let table_name = take(&mut input, table_name_len)?.to_vec();
        input.read_u8()?; // skip null

        let column_count = input.read_lenenc_int()? as usize;
        let mut column_types = Vec::with_capacity(column_count);
        for &byte in take(&mut input, column_count)? {
            let column_type =
                ColumnType::try_from(byte).map_err(|err| Error::UnknownFieldType(err.0))?;
            column_types.push(column_type);
        }

        let meta_block_len = input.read_lenenc_int()? as usize;
        let mut meta_block = take(&mut input, meta_block_len)?;
        let mut column_meta = Vec::with_capacity(column_count);
        for column_type in &column_types {
            column_meta.push(read_column_metadata(&mut meta_block, *column_type)?);
        }

        let bitmap_len = (column_count + 7) / 8;
        let mut null_bitmap = BitVec::from_vec(take(&mut input, bitmap_len)?.to_vec());
        null_bitmap.truncate(column_count);

        // anything left is optional metadata (MySql 8.0) — not interpreted

        Ok(Self {
            table_id,
            flags,
            schema_name: RawText(schema_name),
            table_name: RawText(table_name),
            column_types,
            column_meta,
            null_bitmap,
        })
    }
}

/// Reads the metadata word of a single column out of the packed metadata
/// block of a table map event.
fn read_column_metadata(meta_block: &mut &[u8], column_type: ColumnType) -> Result<u16> {
    use ColumnType::*;

    match column_type {
        MYSQL_TYPE_STRING | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_VARCHAR | MYSQL_TYPE_DECIMAL
        | MYSQL_TYPE_NEWDECIMAL | MYSQL_TYPE_ENUM | MYSQL_TYPE_SET => {
            Ok(meta_block.read_u16::<LE>()?)
        }
        MYSQL_TYPE_BLOB | MYSQL_TYPE_DOUBLE | MYSQL_TYPE_FLOAT | MYSQL_TYPE_GEOMETRY
        | MYSQL_TYPE_TIME2 | MYSQL_TYPE_DATETIME2 | MYSQL_TYPE_TIMESTAMP2 => {
            Ok(meta_block.read_u8()? as u16)
        }
        _ => Ok(0),
    }
}

/// Common structure of `WRITE_ROWS`, `UPDATE_ROWS` and `DELETE_ROWS` events,
/// v1 and v2, with the rows already decoded against the referenced table map.
#[derive(Debug, Clone, PartialEq)]
pub struct RowsEvent {
    /// Table identifier resolved through the table map registry.
    pub table_id: u64,
    /// Raw rows event flags.
    pub flags: u16,
    /// Bit-field indicating which columns appear in each row image.
    pub columns_present_before: BitVec<u8, Lsb0>,
    /// Second columns-present bit-field; only present for UPDATE events,
    /// where it applies to the after image.
    pub columns_present_after: Option<BitVec<u8, Lsb0>>,
    /// Decoded rows in wire order.
    ///
    /// For UPDATE events each modified row contributes two consecutive
    /// entries: the before image followed by the after image.
    pub rows: Vec<Row>,
}

impl RowsEvent {
    pub(crate) fn read(
        event_type: EventType,
        mut input: &[u8],
        fde: &FormatDescriptionEvent,
        table_maps: &HashMap<u64, TableMapEvent>,
    ) -> Result<Self> {
        let post_header_len = fde.post_header_len(event_type)?;

        let table_id = if post_header_len == 6 {
            input.read_u32::<LE>()? as u64
        } else {
            input.read_u48::<LE>()?
        };

        let flags = input.read_u16::<LE>()?;

        if event_type.is_rows_event_v2() {
            // variable-length post-header; the length counts its own two bytes
            let extra_data_len = input.read_u16::<LE>()? as usize;
            take(&mut input, extra_data_len.saturating_sub(2))?;
        }

        let column_count = input.read_lenenc_int()? as usize;
        let bitmap_len = (column_count + 7) / 8;

        let mut columns_present_before =
            BitVec::from_vec(take(&mut input, bitmap_len)?.to_vec());
        columns_present_before.truncate(column_count);

        let columns_present_after = if event_type.is_update_rows_event() {
            let mut bitmap = BitVec::from_vec(take(&mut input, bitmap_len)?.to_vec());
            bitmap.truncate(column_count);
            Some(bitmap)
        } else {
            None
        };

        let table_map = table_maps
            .get(&table_id)
            .ok_or(Error::UnknownTable(table_id))?;

        let mut rows = Vec::new();
        while !input.is_empty() {
            rows.push(read_row(&mut input, table_map, &columns_present_before)?);
            if let Some(ref after) = columns_present_after {
                rows.push(read_row(&mut input, table_map, after)?);
            }
        }

        Ok(Self {
            table_id,
            flags,
            columns_present_before,
            columns_present_after,
            rows,
        })
    }
}
