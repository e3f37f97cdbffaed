// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! This crate is a MySql replication client built around a binlog event
//! stream parser.
//!
//! This crate:
//! * registers a connection as a replica (`COM_REGISTER_SLAVE`) and drives
//!   the binlog dump loop (`COM_BINLOG_DUMP`) over a caller-supplied
//!   [`PacketChannel`];
//! * implements a stateful binlog event parser that threads the format
//!   description and the table map registry across the stream;
//! * decodes row-based events into typed per-column values, with the row
//!   layout taken from the referenced table map;
//! * strips the trailing CRC32 checksum that checksum-capable servers append
//!   to every event.
//!
//! The connection itself — packet framing, sequencing, authentication, query
//! execution — is out of scope and consumed through the [`PacketChannel`]
//! trait. Rows keep string-ish columns as raw bytes: the replication session
//! runs with `names 'binary'`, so character sets are the consumer's concern.
//!
//! ```no_run
//! use mysql_replica::{PacketChannel, ReplicaClient, Result};
//! # struct Conn;
//! # impl PacketChannel for Conn {
//! #     fn exec(&mut self, _sql: &str) -> Result<()> { Ok(()) }
//! #     fn write_packet(&mut self, _payload: &[u8]) -> Result<()> { Ok(()) }
//! #     fn read_packet(&mut self) -> Result<Vec<u8>> { Ok(Vec::new()) }
//! # }
//! # fn connect() -> Conn { Conn }
//!
//! # fn main() -> Result<()> {
//! let mut client = ReplicaClient::new(connect());
//! client.register_slave(2)?;
//!
//! for event in client.dump_binlog(2, "mysql-bin.000001", 4)? {
//!     println!("{:?}", event?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod binlog;
pub mod constants;
pub mod error;
pub mod io;
pub mod misc;
pub mod packets;
pub mod replica;
pub mod value;

pub use binlog::{BinlogEvent, EventData, EventStreamReader, Row};
pub use error::{Error, Result};
pub use replica::{BinlogStream, PacketChannel, ReplicaClient};
pub use value::Value;
