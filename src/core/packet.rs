//! Normalized per-packet input
//!
//! The capture layer parses raw frames into `PacketRecord`s; everything
//! downstream (flow table, correlation, classification) works on these.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::flow::FlowKey;

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
}

impl TcpFlags {
    pub fn from_u8(flags: u8) -> Self {
        Self {
            fin: flags & 0x01 != 0,
            syn: flags & 0x02 != 0,
            rst: flags & 0x04 != 0,
            psh: flags & 0x08 != 0,
            ack: flags & 0x10 != 0,
            urg: flags & 0x20 != 0,
            ece: flags & 0x40 != 0,
            cwr: flags & 0x80 != 0,
        }
    }

    pub fn to_u8(&self) -> u8 {
        let mut flags = 0u8;
        if self.fin { flags |= 0x01; }
        if self.syn { flags |= 0x02; }
        if self.rst { flags |= 0x04; }
        if self.psh { flags |= 0x08; }
        if self.ack { flags |= 0x10; }
        if self.urg { flags |= 0x20; }
        if self.ece { flags |= 0x40; }
        if self.cwr { flags |= 0x80; }
        flags
    }

    /// Flag set is exactly {ACK}: a candidate duplicate ACK
    pub fn is_pure_ack(&self) -> bool {
        self.to_u8() == 0x10
    }
}

impl std::fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        if self.syn { s.push('S'); }
        if self.ack { s.push('A'); }
        if self.fin { s.push('F'); }
        if self.rst { s.push('R'); }
        if self.psh { s.push('P'); }
        if self.urg { s.push('U'); }
        if self.ece { s.push('E'); }
        if self.cwr { s.push('C'); }
        if s.is_empty() { s.push('.'); }
        write!(f, "{}", s)
    }
}

/// The two halves of the TCP timestamp option (RFC 7323): the sender's
/// timestamp value and the echo of the most recently received one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpTimestamp {
    pub tsval: u32,
    pub ecr: u32,
}

/// One captured TCP packet, normalized for classification.
///
/// `payload_len` comes from the IP header length fields, not from the
/// captured bytes: with a short snap length the on-wire payload is never
/// present in the capture buffer.
#[derive(Debug, Clone)]
pub struct PacketRecord {
    /// Capture time, whole seconds (epoch)
    pub ts_sec: i64,
    /// Capture time, microseconds within the second
    pub ts_usec: i64,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub flags: TcpFlags,
    pub seq: u32,
    pub ack: u32,
    /// TCP payload bytes, from the IP total/payload length fields
    pub payload_len: u32,
    /// Bytes on the wire, from the capture header
    pub wire_len: u32,
    /// TCP timestamp option, if the header carried one
    pub timestamp: Option<TcpTimestamp>,
}

impl PacketRecord {
    /// Directional flow key for this packet
    pub fn flow_key(&self) -> FlowKey {
        FlowKey {
            src_ip: self.src_ip,
            src_port: self.src_port,
            dst_ip: self.dst_ip,
            dst_port: self.dst_port,
        }
    }
}
