// Copyright (c) 2020 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! MySql protocol constants.

use std::convert::TryFrom;

/// Opcode of the `COM_BINLOG_DUMP` command.
pub const COM_BINLOG_DUMP: u8 = 0x12;
/// Opcode of the `COM_REGISTER_SLAVE` command.
pub const COM_REGISTER_SLAVE: u8 = 0x15;

/// Type of a MySql column as it appears on the wire.
///
/// The numeric values are the field type codes used by the text protocol
/// and by binlog table map events.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL = 0,
    MYSQL_TYPE_TINY,
    MYSQL_TYPE_SHORT,
    MYSQL_TYPE_LONG,
    MYSQL_TYPE_FLOAT,
    MYSQL_TYPE_DOUBLE,
    MYSQL_TYPE_NULL,
    MYSQL_TYPE_TIMESTAMP,
    MYSQL_TYPE_LONGLONG,
    MYSQL_TYPE_INT24,
    MYSQL_TYPE_DATE,
    MYSQL_TYPE_TIME,
    MYSQL_TYPE_DATETIME,
    MYSQL_TYPE_YEAR,
    /// Internal to MySql.
    MYSQL_TYPE_NEWDATE,
    MYSQL_TYPE_VARCHAR,
    MYSQL_TYPE_BIT,
    MYSQL_TYPE_TIMESTAMP2,
    MYSQL_TYPE_DATETIME2,
    MYSQL_TYPE_TIME2,
    MYSQL_TYPE_NEWDECIMAL = 0xf6,
    MYSQL_TYPE_ENUM = 0xf7,
    MYSQL_TYPE_SET = 0xf8,
    MYSQL_TYPE_TINY_BLOB = 0xf9,
    MYSQL_TYPE_MEDIUM_BLOB = 0xfa,
    MYSQL_TYPE_LONG_BLOB = 0xfb,
    MYSQL_TYPE_BLOB = 0xfc,
    MYSQL_TYPE_VAR_STRING = 0xfd,
    MYSQL_TYPE_STRING = 0xfe,
    MYSQL_TYPE_GEOMETRY = 0xff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unknown column type {}", _0)]
#[repr(transparent)]
pub struct UnknownColumnType(pub u8);

impl From<UnknownColumnType> for u8 {
    fn from(x: UnknownColumnType) -> Self {
        x.0
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = UnknownColumnType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::MYSQL_TYPE_DECIMAL),
            0x01 => Ok(Self::MYSQL_TYPE_TINY),
            0x02 => Ok(Self::MYSQL_TYPE_SHORT),
            0x03 => Ok(Self::MYSQL_TYPE_LONG),
            0x04 => Ok(Self::MYSQL_TYPE_FLOAT),
            0x05 => Ok(Self::MYSQL_TYPE_DOUBLE),
            0x06 => Ok(Self::MYSQL_TYPE_NULL),
            0x07 => Ok(Self::MYSQL_TYPE_TIMESTAMP),
            0x08 => Ok(Self::MYSQL_TYPE_LONGLONG),
            0x09 => Ok(Self::MYSQL_TYPE_INT24),
            0x0a => Ok(Self::MYSQL_TYPE_DATE),
            0x0b => Ok(Self::MYSQL_TYPE_TIME),
            0x0c => Ok(Self::MYSQL_TYPE_DATETIME),
            0x0d => Ok(Self::MYSQL_TYPE_YEAR),
            0x0e => Ok(Self::MYSQL_TYPE_NEWDATE),
            0x0f => Ok(Self::MYSQL_TYPE_VARCHAR),
            0x10 => Ok(Self::MYSQL_TYPE_BIT),
            0x11 => Ok(Self::MYSQL_TYPE_TIMESTAMP2),
            0x12 => Ok(Self::MYSQL_TYPE_DATETIME2),
            0x13 => Ok(Self::MYSQL_TYPE_TIME2),
            0xf6 => Ok(Self::MYSQL_TYPE_NEWDECIMAL),
            0xf7 => Ok(Self::MYSQL_TYPE_ENUM),
            0xf8 => Ok(Self::MYSQL_TYPE_SET),
            0xf9 => Ok(Self::MYSQL_TYPE_TINY_BLOB),
            0xfa => Ok(Self::MYSQL_TYPE_MEDIUM_BLOB),
            0xfb => Ok(Self::MYSQL_TYPE_LONG_BLOB),
            0xfc => Ok(Self::MYSQL_TYPE_BLOB),
            0xfd => Ok(Self::MYSQL_TYPE_VAR_STRING),
            0xfe => Ok(Self::MYSQL_TYPE_STRING),
            0xff => Ok(Self::MYSQL_TYPE_GEOMETRY),
            x => Err(UnknownColumnType(x)),
        }
    }
}
