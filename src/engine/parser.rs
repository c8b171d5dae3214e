//! Raw frame parsing
//!
//! Walks link, IP, and TCP headers of a captured frame and produces a
//! `PacketRecord`, or a skip outcome for frames the monitor cannot use.
//! Payload length comes from the IP length fields: the snap length
//! truncates the captured bytes well before the payload ends, so header
//! accessors must never assume the payload is present.

use std::net::IpAddr;

use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::{TcpOptionNumbers, TcpPacket};
use pnet::packet::Packet as _;

use crate::core::packet::{PacketRecord, TcpFlags, TcpTimestamp};

/// Link-layer framing of the capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    /// Ethernet II frames
    Ethernet,
    /// BSD/Linux loopback: 4-byte address-family header before the IP header
    NullLoop,
    /// Bare IP packets
    RawIp,
}

/// What a captured frame turned out to be
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// A usable TCP-over-IP packet
    Record(PacketRecord),
    /// IP packet without a TCP PDU (or one too mangled to read)
    NotTcp,
    /// Not an IPv4 or IPv6 packet
    NotIp,
}

/// Parse one captured frame.
///
/// `wire_len` is the on-wire length from the capture header, which may
/// exceed `data.len()` under a short snap length.
pub fn parse_frame(
    link: LinkLayer,
    data: &[u8],
    ts_sec: i64,
    ts_usec: i64,
    wire_len: u32,
) -> ParseOutcome {
    match link {
        LinkLayer::Ethernet => {
            let eth = match EthernetPacket::new(data) {
                Some(eth) => eth,
                None => return ParseOutcome::NotIp,
            };
            match eth.get_ethertype() {
                EtherTypes::Ipv4 => parse_ipv4(eth.payload(), ts_sec, ts_usec, wire_len),
                EtherTypes::Ipv6 => parse_ipv6(eth.payload(), ts_sec, ts_usec, wire_len),
                _ => ParseOutcome::NotIp,
            }
        }
        LinkLayer::NullLoop => match data.get(4..) {
            Some(inner) => parse_ip(inner, ts_sec, ts_usec, wire_len),
            None => ParseOutcome::NotIp,
        },
        LinkLayer::RawIp => parse_ip(data, ts_sec, ts_usec, wire_len),
    }
}

/// Dispatch a bare IP packet on its version nibble
fn parse_ip(data: &[u8], ts_sec: i64, ts_usec: i64, wire_len: u32) -> ParseOutcome {
    match data.first().map(|b| b >> 4) {
        Some(4) => parse_ipv4(data, ts_sec, ts_usec, wire_len),
        Some(6) => parse_ipv6(data, ts_sec, ts_usec, wire_len),
        _ => ParseOutcome::NotIp,
    }
}

fn parse_ipv4(data: &[u8], ts_sec: i64, ts_usec: i64, wire_len: u32) -> ParseOutcome {
    let ip = match Ipv4Packet::new(data) {
        Some(ip) => ip,
        None => return ParseOutcome::NotIp,
    };
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return ParseOutcome::NotTcp;
    }

    let ihl = ip.get_header_length() as usize * 4;
    let tcp_buf = match data.get(ihl..) {
        Some(buf) => buf,
        None => return ParseOutcome::NotTcp,
    };
    let tcp = match TcpPacket::new(tcp_buf) {
        Some(tcp) => tcp,
        None => return ParseOutcome::NotTcp,
    };

    let tcp_header = tcp.get_data_offset() as u32 * 4;
    let payload_len = (ip.get_total_length() as u32)
        .saturating_sub(ihl as u32)
        .saturating_sub(tcp_header);

    ParseOutcome::Record(build_record(
        &tcp,
        IpAddr::V4(ip.get_source()),
        IpAddr::V4(ip.get_destination()),
        payload_len,
        ts_sec,
        ts_usec,
        wire_len,
    ))
}

fn parse_ipv6(data: &[u8], ts_sec: i64, ts_usec: i64, wire_len: u32) -> ParseOutcome {
    let ip = match Ipv6Packet::new(data) {
        Some(ip) => ip,
        None => return ParseOutcome::NotIp,
    };
    // No extension-header walk: the BPF filter only passes plain TCP
    if ip.get_next_header() != IpNextHeaderProtocols::Tcp {
        return ParseOutcome::NotTcp;
    }

    let tcp_buf = match data.get(40..) {
        Some(buf) => buf,
        None => return ParseOutcome::NotTcp,
    };
    let tcp = match TcpPacket::new(tcp_buf) {
        Some(tcp) => tcp,
        None => return ParseOutcome::NotTcp,
    };

    let tcp_header = tcp.get_data_offset() as u32 * 4;
    let payload_len = (ip.get_payload_length() as u32).saturating_sub(tcp_header);

    ParseOutcome::Record(build_record(
        &tcp,
        IpAddr::V6(ip.get_source()),
        IpAddr::V6(ip.get_destination()),
        payload_len,
        ts_sec,
        ts_usec,
        wire_len,
    ))
}

fn build_record(
    tcp: &TcpPacket<'_>,
    src_ip: IpAddr,
    dst_ip: IpAddr,
    payload_len: u32,
    ts_sec: i64,
    ts_usec: i64,
    wire_len: u32,
) -> PacketRecord {
    PacketRecord {
        ts_sec,
        ts_usec,
        src_ip,
        dst_ip,
        src_port: tcp.get_source(),
        dst_port: tcp.get_destination(),
        flags: TcpFlags::from_u8((tcp.get_flags() & 0xff) as u8),
        seq: tcp.get_sequence(),
        ack: tcp.get_acknowledgement(),
        payload_len,
        wire_len,
        timestamp: timestamp_option(tcp),
    }
}

/// Extract the TCP timestamp option (kind 8), if present
fn timestamp_option(tcp: &TcpPacket<'_>) -> Option<TcpTimestamp> {
    for opt in tcp.get_options_iter() {
        if opt.get_number() == TcpOptionNumbers::TIMESTAMPS {
            let data = opt.payload();
            if data.len() >= 8 {
                return Some(TcpTimestamp {
                    tsval: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
                    ecr: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
                });
            }
            return None;
        }
    }
    None
}
