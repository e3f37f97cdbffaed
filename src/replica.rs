// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The replication driver: registers the connection as a replica and drives
//! the binlog dump loop over a [`PacketChannel`].

use tracing::{debug, info, trace, warn};

use crate::{
    binlog::{BinlogEvent, EventData, EventStreamReader},
    error::{Error, Result},
    packets::{is_eof_packet, parse_err_packet, parse_ok_packet, ComBinlogDump, ComRegisterSlave},
};

/// Session variables applied before registering, in order. The `binary`
/// charset keeps row strings byte-transparent; the heartbeat period makes the
/// master emit a liveness event every 15 seconds at the binlog tail.
const SESSION_SETUP: &[&str] = &[
    "set wait_timeout=9999999",
    "set net_write_timeout=1800",
    "set net_read_timeout=1800",
    "set names 'binary'",
    "set @master_binlog_checksum= @@global.binlog_checksum",
    "set @slave_uuid=uuid()",
    "SET @master_heartbeat_period=15",
];

/// `COM_BINLOG_DUMP` flags field. Always 2.
const BINLOG_DUMP_FLAGS: u16 = 2;

/// The connection surface the replication driver runs on.
///
/// Implementations own packet framing, sequencing and authentication. Every
/// packet written through [`PacketChannel::write_packet`] starts a fresh
/// command (sequence number 0); the transport prepends the 4-byte
/// length-and-sequence header. I/O failures should surface as
/// [`Error::Transport`].
pub trait PacketChannel {
    /// Executes an SQL statement, discarding any result.
    fn exec(&mut self, sql: &str) -> Result<()>;

    /// Sends one command packet containing `payload`.
    fn write_packet(&mut self, payload: &[u8]) -> Result<()>;

    /// Reads one packet and returns its payload.
    fn read_packet(&mut self) -> Result<Vec<u8>>;
}

/// A replication client on top of a connected [`PacketChannel`].
#[derive(Debug)]
pub struct ReplicaClient<C> {
    channel: C,
}

impl<C: PacketChannel> ReplicaClient<C> {
    /// Creates a new client over an authenticated connection.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Registers this connection as a replica of the master.
    ///
    /// Applies the replication session variables and sends
    /// `COM_REGISTER_SLAVE`. Any reply other than OK is fatal.
    pub fn register_slave(&mut self, server_id: u32) -> Result<()> {
        for sql in SESSION_SETUP {
            self.channel.exec(sql)?;
        }

        debug!(server_id, "registering as replica");
        self.channel
            .write_packet(&ComRegisterSlave::new(server_id).serialize())?;

        let packet = self.channel.read_packet()?;
        match packet.first().copied() {
            Some(0x00) => {
                parse_ok_packet(&packet)?;
                Ok(())
            }
            Some(0xff) => Err(parse_err_packet(&packet)?.into()),
            _ => Err(Error::Protocol(
                "unexpected reply to COM_REGISTER_SLAVE".into(),
            )),
        }
    }

    /// Starts streaming the binlog from `(filename, position)`.
    ///
    /// The returned stream is infinite: on stream EOF it re-requests the dump
    /// from the latest known coordinates, and it only terminates when the
    /// transport fails. Rotate events update the coordinates and are yielded
    /// so the caller can checkpoint them; heartbeats are absorbed.
    pub fn dump_binlog(
        self,
        server_id: u32,
        filename: &str,
        position: u32,
    ) -> Result<BinlogStream<C>> {
        let mut stream = BinlogStream {
            channel: self.channel,
            reader: EventStreamReader::new(),
            server_id,
            filename: filename.to_owned(),
            position,
        };
        stream.send_dump()?;
        Ok(stream)
    }
}

/// An infinite stream of decoded binlog events.
#[derive(Debug)]
pub struct BinlogStream<C> {
    channel: C,
    reader: EventStreamReader,
    server_id: u32,
    filename: String,
    position: u32,
}

impl<C: PacketChannel> BinlogStream<C> {
    /// The binlog coordinates the stream is currently at — updated by every
    /// rotate event. The caller owns persisting them.
    pub fn coordinates(&self) -> (&str, u32) {
        (&self.filename, self.position)
    }

    fn send_dump(&mut self) -> Result<()> {
        debug!(
            server_id = self.server_id,
            filename = %self.filename,
            position = self.position,
            "requesting binlog dump"
        );
        let command = ComBinlogDump {
            position: self.position,
            flags: BINLOG_DUMP_FLAGS,
            server_id: self.server_id,
            filename: self.filename.as_bytes().to_vec(),
        };
        self.channel.write_packet(&command.serialize())
    }
}

impl<C: PacketChannel> Iterator for BinlogStream<C> {
    type Item = Result<BinlogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let packet = match self.channel.read_packet() {
                Ok(packet) => packet,
                Err(err) => return Some(Err(err)),
            };

            if is_eof_packet(&packet) {
                // the master is done with this binlog; reopen at the latest
                // known coordinates
                if let Err(err) = self.send_dump() {
                    return Some(Err(err));
                }
                continue;
            }

            match packet.first().copied() {
                Some(0x00) => {
                    let event = match self.reader.parse(&packet[1..]) {
                        Ok(event) => event,
                        Err(err) => return Some(Err(err)),
                    };

                    match &event.data {
                        EventData::Heartbeat => {
                            trace!("heartbeat");
                            continue;
                        }
                        EventData::Rotate(rotate) => {
                            self.filename = rotate.name.get().into_owned();
                            self.position = rotate.position as u32;
                            info!(
                                filename = %self.filename,
                                position = self.position,
                                "binlog rotated"
                            );
                        }
                        _ => (),
                    }

                    return Some(Ok(event));
                }
                Some(0xff) => {
                    return Some(Err(match parse_err_packet(&packet) {
                        Ok(err) => err.into(),
                        Err(err) => err,
                    }));
                }
                Some(first) => {
                    warn!(first_byte = first, len = packet.len(), "unexpected packet");
                    continue;
                }
                None => {
                    return Some(Err(Error::Protocol("empty packet".into())));
                }
            }
        }
    }
}
