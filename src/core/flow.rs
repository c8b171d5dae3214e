//! Directional flow identity and per-flow state

use std::net::IpAddr;

/// Directional flow identifier: the 4-tuple as seen on the packet.
///
/// Unlike a normalized connection key, the two directions of a connection
/// are distinct `FlowKey`s; `reversed()` yields the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
}

impl FlowKey {
    /// The key of the reverse-direction flow
    pub fn reversed(&self) -> Self {
        Self {
            src_ip: self.dst_ip,
            src_port: self.dst_port,
            dst_ip: self.src_ip,
            dst_port: self.src_port,
        }
    }

    /// Printable form: `srcIP:srcPort+dstIP:dstPort`
    pub fn name(&self) -> String {
        format!(
            "{}:{}+{}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }
}

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}+{}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }
}

/// Per-direction flow state.
///
/// `last_seq` holds the prior packet's sequence number (plus one after a
/// SYN or FIN); the next expected sequence number is `last_seq + last_pay`.
#[derive(Debug, Clone)]
pub struct FlowRecord {
    /// Printable flow name
    pub name: String,
    /// Cumulative on-wire bytes in this direction
    pub bytes_sent: u64,
    /// Capture time of the most recent packet in this direction
    pub last_time: f64,
    /// Sequence number of the prior packet (SYN/FIN contribute +1)
    pub last_seq: u32,
    /// Payload bytes of the prior packet
    pub last_pay: u32,
    /// Acknowledgment number of the prior packet
    pub last_ack: u32,
    /// Set once the reverse-direction flow has been observed
    pub bidirectional: bool,
}

impl FlowRecord {
    pub fn new(key: &FlowKey, bidirectional: bool) -> Self {
        Self {
            name: key.name(),
            bytes_sent: 0,
            last_time: 0.0,
            last_seq: 0,
            last_pay: 0,
            last_ack: 0,
            bidirectional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key() -> FlowKey {
        FlowKey {
            src_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)),
            src_port: 54321,
            dst_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dst_port: 443,
        }
    }

    #[test]
    fn test_key_name() {
        assert_eq!(key().name(), "192.168.1.100:54321+10.0.0.1:443");
    }

    #[test]
    fn test_key_reversal() {
        let k = key();
        let r = k.reversed();
        assert_eq!(r.name(), "10.0.0.1:443+192.168.1.100:54321");
        assert_eq!(r.reversed(), k);
        assert_ne!(k, r);
    }

    #[test]
    fn test_new_record() {
        let rec = FlowRecord::new(&key(), false);
        assert_eq!(rec.name, key().name());
        assert_eq!(rec.bytes_sent, 0);
        assert_eq!(rec.last_seq, 0);
        assert!(!rec.bidirectional);
    }
}
