// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Crate-level error type.

use std::io;

use crate::constants::ColumnType;

/// Error of a replication session or of binlog event decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet read or write failed. Fatal to the current stream.
    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),

    /// Unexpected packet or a malformed event frame. Fatal.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A table map or rows event arrived before any format description event.
    #[error("no format description event received yet")]
    FormatMissing,

    /// A rows event referenced a table id with no table map on record.
    #[error("rows event references unknown table id {0}")]
    UnknownTable(u64),

    /// A column type byte outside the known set.
    #[error("unknown field type {0}")]
    UnknownFieldType(u8),

    /// The column type is known but its row image decoding is unimplemented.
    #[error("row decoding unimplemented for field type {0:?}")]
    UnsupportedFieldType(ColumnType),

    /// A decoder needed more bytes than the event body provided.
    #[error("event body ended before decoding was complete")]
    ShortRead,

    /// The server replied with an ERR packet.
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::ShortRead,
            _ => Error::Transport(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
