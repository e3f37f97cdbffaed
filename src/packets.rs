// Copyright (c) 2021 Anatoly Ikorsky
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Parsers for server replies and serializers for the replication commands.

use byteorder::{LittleEndian as LE, ReadBytesExt};

use crate::{
    constants::{COM_BINLOG_DUMP, COM_REGISTER_SLAVE},
    error::{Error, Result},
    io::ReadMysqlExt,
};

/// First byte of an OK packet.
pub const OK_PACKET_HEADER: u8 = 0x00;
/// First byte of an EOF packet.
pub const EOF_PACKET_HEADER: u8 = 0xfe;
/// First byte of an ERR packet.
pub const ERR_PACKET_HEADER: u8 = 0xff;

/// Represents MySql's Ok packet (protocol 4.1 layout).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: u16,
    pub warnings: u16,
}

/// Parses an Ok packet from `payload`.
pub fn parse_ok_packet(mut payload: &[u8]) -> Result<OkPacket> {
    if payload.read_u8()? != OK_PACKET_HEADER {
        return Err(Error::Protocol("invalid OK packet header".into()));
    }

    let affected_rows = payload.read_lenenc_int()?;
    let last_insert_id = payload.read_lenenc_int()?;
    let status_flags = payload.read_u16::<LE>()?;
    let warnings = payload.read_u16::<LE>()?;

    Ok(OkPacket {
        affected_rows,
        last_insert_id,
        status_flags,
        warnings,
    })
}

/// MySql error packet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrPacket {
    pub code: u16,
    pub sql_state: [u8; 5],
    pub message: Vec<u8>,
}

/// Parses an error packet from `payload`.
pub fn parse_err_packet(mut payload: &[u8]) -> Result<ErrPacket> {
    if payload.read_u8()? != ERR_PACKET_HEADER {
        return Err(Error::Protocol("invalid ERR packet header".into()));
    }

    let code = payload.read_u16::<LE>()?;
    let sql_state = match payload.first() {
        Some(b'#') if payload.len() >= 6 => {
            let mut state = [0_u8; 5];
            state.copy_from_slice(&payload[1..6]);
            payload = &payload[6..];
            state
        }
        _ => *b"HY000",
    };

    Ok(ErrPacket {
        code,
        sql_state,
        message: payload.to_vec(),
    })
}

impl From<ErrPacket> for Error {
    fn from(packet: ErrPacket) -> Self {
        Error::Server {
            code: packet.code,
            message: String::from_utf8_lossy(&packet.message).into_owned(),
        }
    }
}

/// Returns `true` if `payload` is an EOF packet (`0xfe`, less than 9 bytes).
pub fn is_eof_packet(payload: &[u8]) -> bool {
    payload.first() == Some(&EOF_PACKET_HEADER) && payload.len() < 9
}

/// `COM_REGISTER_SLAVE` command.
///
/// Report host, user and password are left empty and the replication rank and
/// master id are zero — the master only needs the slave's `server_id` (and a
/// port to show in `SHOW SLAVE HOSTS`).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ComRegisterSlave {
    pub server_id: u32,
    pub port: u16,
}

impl ComRegisterSlave {
    pub fn new(server_id: u32) -> Self {
        Self {
            server_id,
            port: 234,
        }
    }

    /// Serializes the command payload (without the packet header).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18);
        out.push(COM_REGISTER_SLAVE);
        out.extend_from_slice(&self.server_id.to_le_bytes());
        out.push(0); // len of report host
        out.push(0); // len of report user
        out.push(0); // len of report password
        out.extend_from_slice(&self.port.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes()); // replication rank
        out.extend_from_slice(&0_u32.to_le_bytes()); // master id
        out
    }
}

/// `COM_BINLOG_DUMP` command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ComBinlogDump {
    pub position: u32,
    pub flags: u16,
    pub server_id: u32,
    pub filename: Vec<u8>,
}

impl ComBinlogDump {
    /// Serializes the command payload (without the packet header).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(11 + self.filename.len());
        out.push(COM_BINLOG_DUMP);
        out.extend_from_slice(&self.position.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.server_id.to_le_bytes());
        out.extend_from_slice(&self.filename);
        out
    }
}
