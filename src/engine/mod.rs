//! Monitor engine
//!
//! The serial per-packet pipeline: capture clock normalization, flow
//! bookkeeping, the two correlation lookups, sequence-space checks, and
//! periodic maintenance, all driven by one thread in capture order.
//!
//! Per packet the classifier decides which of four signals is observable:
//! a TSval-based delay, a sequence-based delay, a sequence hole or
//! reorder, or a duplicate ACK. Correlation inserts happen in a packet's
//! own direction, lookups against entries left by the reverse direction,
//! so the tables turn one-way sightings into round-trip measurements
//! without touching the connection.

pub mod capture;
pub mod parser;

pub use capture::{local_addr_of, CaptureSource, PacketSource, PcapSource};
pub use parser::{LinkLayer, ParseOutcome};

use std::io::Write;
use std::net::IpAddr;

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::core::packet::PacketRecord;
use crate::error::Result;
use crate::flow::table::FlowTable;
use crate::output::{Observation, ObservationWriter};
use crate::rtd::table::{CorrKey, CorrelationTable};

/// Per-interval counters reported on summary lines.
///
/// Reset after each summary; the run-total packet count used by the `-c`
/// stop condition is kept separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub packets: u64,
    pub not_tcp: u64,
    pub not_ip: u64,
    pub no_tsopt: u64,
    pub unidirectional: u64,
}

/// Capture-time clock, offset to the first packet.
///
/// Subtracting the first packet's whole seconds keeps the fractional
/// microseconds inside the double's mantissa for the whole run.
#[derive(Debug, Clone, Copy, Default)]
struct CaptureClock {
    off_sec: Option<i64>,
    start: f64,
    now: f64,
}

impl CaptureClock {
    fn advance(&mut self, ts_sec: i64, ts_usec: i64) -> f64 {
        match self.off_sec {
            None => {
                self.off_sec = Some(ts_sec);
                self.now = ts_usec as f64 * 1e-6;
                self.start = self.now;
            }
            Some(off) => {
                self.now = (ts_sec - off) as f64 + ts_usec as f64 * 1e-6;
            }
        }
        self.now
    }

    fn started(&self) -> bool {
        self.off_sec.is_some()
    }

    fn elapsed(&self) -> f64 {
        self.now - self.start
    }
}

/// The passive monitor: flow table, correlation tables, and scheduling
pub struct Monitor {
    cfg: MonitorConfig,
    local_ip: Option<IpAddr>,
    flows: FlowTable,
    ts_table: CorrelationTable,
    seq_table: CorrelationTable,
    counters: Counters,
    total_packets: u64,
    clock: CaptureClock,
    next_clean: f64,
    next_summary: f64,
}

impl Monitor {
    pub fn new(cfg: MonitorConfig, local_ip: Option<IpAddr>) -> Self {
        let max_flows = cfg.max_flows;
        Self {
            cfg,
            local_ip,
            flows: FlowTable::new(max_flows),
            ts_table: CorrelationTable::new(),
            seq_table: CorrelationTable::new(),
            counters: Counters::default(),
            total_packets: 0,
            clock: CaptureClock::default(),
            next_clean: 0.0,
            next_summary: 0.0,
        }
    }

    /// Classify one packet, updating flow and correlation state.
    ///
    /// Returns an observation when at least one signal fired (in quick
    /// mode, only when a delay sample fired).
    pub fn process_record(&mut self, rec: &PacketRecord) -> Option<Observation> {
        let first = !self.clock.started();
        let cap_tm = self.clock.advance(rec.ts_sec, rec.ts_usec);
        if first && self.cfg.sum_interval > 0.0 {
            if let Some(when) = Local.timestamp_opt(rec.ts_sec, 0).single() {
                info!("first packet at {}", when.format("%a %b %e %H:%M:%S %Y"));
            }
        }

        let fwd = rec.flow_key();
        let rev = fwd.reversed();

        // At capacity new flows are dropped and the packet ignored until
        // idle eviction frees a slot.
        let (fr, _created) = self.flows.get_or_create(&fwd)?;

        fr.bytes_sent += rec.wire_len as u64;
        let bidirectional = fr.bidirectional;
        if !bidirectional {
            self.counters.unidirectional += 1;
        }
        if rec.timestamp.is_none() {
            self.counters.no_tsopt += 1;
        }

        let local_block = self.cfg.filter_local && self.local_ip == Some(rec.dst_ip);

        // Timestamp correlation. Record this packet's TSval under its own
        // flow; match its echo against the reverse flow's table entry.
        // Only the insert is gated by the local filter: echoes of earlier
        // sightings are still worth matching.
        let mut ts_rtt = None;
        if let Some(ts) = rec.timestamp {
            if bidirectional && ts.tsval != 0 && (ts.ecr != 0 || rec.flags.syn) {
                if !local_block {
                    self.ts_table.try_insert(CorrKey::new(ts.tsval, fwd), cap_tm);
                }
                if let Some(t) = self.ts_table.take(&CorrKey::new(ts.ecr, rev)) {
                    if t > 0.0 {
                        ts_rtt = Some(cap_tm - t);
                    }
                }
            }
        }

        // Sequence correlation. Save times of outbound data packets keyed
        // by the sequence number they run up to; match inbound ACKs. The
        // last_ack guard keeps duplicate ACKs from re-sampling.
        let mut seq_rtt = None;
        if bidirectional && !local_block {
            if rec.payload_len > 0 {
                let nxt = rec.seq.wrapping_add(rec.payload_len);
                self.seq_table.try_insert(CorrKey::new(nxt, fwd), cap_tm);
            }
            if rec.flags.ack && (rec.payload_len == 0 || rec.ack != fr.last_ack) {
                if let Some(t) = self.seq_table.take(&CorrKey::new(rec.ack, rev)) {
                    seq_rtt = Some(cap_tm - t);
                }
            }
        }

        // Sequence delta: hole > 0, out-of-order or retransmission < 0.
        // Wrapping subtraction read as signed handles rollover; deltas
        // beyond the threshold are wrap artifacts, reported as 0.
        let mut dseq = 0i32;
        if fr.last_seq != 0 {
            let expected = fr.last_seq.wrapping_add(fr.last_pay);
            let delta = rec.seq.wrapping_sub(expected) as i32;
            dseq = if delta.unsigned_abs() > self.cfg.seq_wrap_threshold {
                0
            } else {
                delta
            };
        }

        // SYN and FIN occupy one sequence number
        fr.last_seq = if rec.flags.syn || rec.flags.fin {
            rec.seq.wrapping_add(1)
        } else {
            rec.seq
        };

        // Duplicate ACK: pure ACK, no payload, same ackno as the prior
        // packet on this flow. The interval since that packet is reported.
        let mut dup_ack = None;
        if rec.flags.is_pure_ack() && rec.payload_len == 0 && rec.ack == fr.last_ack {
            dup_ack = Some(cap_tm - fr.last_time);
        }

        fr.last_pay = rec.payload_len;
        fr.last_time = cap_tm;
        fr.last_ack = rec.ack;

        let dup_fired = dup_ack.map(|d| d > 0.0).unwrap_or(false);
        if ts_rtt.is_none() && seq_rtt.is_none() && dseq == 0 && !dup_fired {
            return None;
        }
        if self.cfg.quick && ts_rtt.is_none() && seq_rtt.is_none() {
            return None;
        }

        Some(Observation {
            wall_sec: rec.ts_sec,
            wall_usec: rec.ts_usec,
            ts_rtt,
            seq_rtt,
            dseq,
            dup_ack,
            payload_len: rec.payload_len,
            flow_bytes: fr.bytes_sent,
            flow: fr.name.clone(),
        })
    }

    /// Periodic maintenance on the capture-time clock: stale correlation
    /// entries, idle flows, and summary reports.
    fn maintain(&mut self) {
        let now = self.clock.now;

        if now >= self.next_clean {
            let ts_gone = self.ts_table.evict_old(now, self.cfg.rtd_max_age);
            let seq_gone = self.seq_table.evict_old(now, self.cfg.rtd_max_age);
            let flows_gone = self.flows.evict_idle(now, self.cfg.flow_max_idle);
            if ts_gone + seq_gone + flows_gone > 0 {
                debug!(
                    "cleanup at {:.3}: {} ts, {} seq, {} flows evicted",
                    now, ts_gone, seq_gone, flows_gone
                );
            }
            self.next_clean = now + self.cfg.rtd_max_age;
        }

        if self.cfg.sum_interval > 0.0 && now >= self.next_summary {
            // The first tick only arms the timer
            if self.next_summary > 0.0 {
                self.emit_summary();
            }
            self.next_summary = now + self.cfg.sum_interval;
        }
    }

    /// Log a summary line and reset the interval counters.
    /// Zero-valued counters are omitted.
    fn emit_summary(&mut self) {
        let c = self.counters;
        let mut line = format!("{} flows, {} packets", self.flows.len(), c.packets);
        append_nonzero(&mut line, c.no_tsopt, "no TS opt");
        append_nonzero(&mut line, c.unidirectional, "uni-directional");
        append_nonzero(&mut line, c.not_tcp, "not TCP");
        append_nonzero(&mut line, c.not_ip, "not v4 or v6");
        info!("{}", line);
        self.counters = Counters::default();
    }

    /// Serial run loop: fetch, classify, emit, maintain, until the source
    /// is exhausted or a stop condition is met.
    pub fn run<W: Write>(
        &mut self,
        source: &mut dyn PacketSource,
        writer: &mut ObservationWriter<W>,
    ) -> Result<()> {
        while let Some(outcome) = source.next_frame()? {
            self.counters.packets += 1;
            self.total_packets += 1;

            match outcome {
                ParseOutcome::NotTcp => self.counters.not_tcp += 1,
                ParseOutcome::NotIp => self.counters.not_ip += 1,
                ParseOutcome::Record(rec) => {
                    if let Some(obs) = self.process_record(&rec) {
                        writer.write(&obs)?;
                    }
                }
            }

            let count_hit =
                self.cfg.max_packets > 0 && self.total_packets >= self.cfg.max_packets;
            let time_hit = self.clock.started()
                && self.cfg.time_to_run > 0.0
                && self.clock.elapsed() >= self.cfg.time_to_run;
            if count_hit || time_hit {
                break;
            }

            if self.clock.started() {
                self.maintain();
            }
        }

        self.emit_summary();
        info!(
            "captured {} packets in {:.6} seconds",
            self.total_packets,
            self.clock.elapsed()
        );
        writer.flush()?;
        Ok(())
    }
}

fn append_nonzero(line: &mut String, value: u64, label: &str) {
    if value > 0 {
        line.push_str(&format!(", {} {}", value, label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::{TcpFlags, TcpTimestamp};
    use crate::output::{ObservationWriter, OutputFormat, FLUSH_INTERVAL};
    use std::net::{IpAddr, Ipv4Addr};

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    struct RecBuilder {
        rec: PacketRecord,
    }

    /// Packet from A:1000 to B:2000 at capture time `t`
    fn a_to_b(t: f64) -> RecBuilder {
        build(A, 1000, B, 2000, t)
    }

    /// Packet from B:2000 to A:1000 at capture time `t`
    fn b_to_a(t: f64) -> RecBuilder {
        build(B, 2000, A, 1000, t)
    }

    fn build(src: IpAddr, sport: u16, dst: IpAddr, dport: u16, t: f64) -> RecBuilder {
        RecBuilder {
            rec: PacketRecord {
                ts_sec: t.floor() as i64,
                ts_usec: ((t - t.floor()) * 1e6).round() as i64,
                src_ip: src,
                dst_ip: dst,
                src_port: sport,
                dst_port: dport,
                flags: TcpFlags { ack: true, ..Default::default() },
                seq: 0,
                ack: 0,
                payload_len: 0,
                wire_len: 66,
                timestamp: None,
            },
        }
    }

    impl RecBuilder {
        fn seq(mut self, seq: u32) -> Self {
            self.rec.seq = seq;
            self
        }
        fn ack(mut self, ack: u32) -> Self {
            self.rec.ack = ack;
            self
        }
        fn payload(mut self, len: u32) -> Self {
            self.rec.payload_len = len;
            self
        }
        fn ts_opt(mut self, tsval: u32, ecr: u32) -> Self {
            self.rec.timestamp = Some(TcpTimestamp { tsval, ecr });
            self
        }
        fn push(mut self) -> Self {
            self.rec.flags.psh = true;
            self
        }
        fn syn(mut self) -> Self {
            self.rec.flags.syn = true;
            self
        }
        fn fin(mut self) -> Self {
            self.rec.flags.fin = true;
            self
        }
        fn done(self) -> PacketRecord {
            self.rec
        }
    }

    fn monitor() -> Monitor {
        Monitor::new(MonitorConfig::default(), None)
    }

    /// Make both directions known so correlation is armed, without
    /// producing any observation of their own.
    fn seed_bidirectional(mon: &mut Monitor) {
        let obs = mon.process_record(&a_to_b(0.5).seq(1000).ack(1).done());
        assert!(obs.is_none());
        let obs = mon.process_record(&b_to_a(0.6).seq(5000).ack(2).done());
        assert!(obs.is_none());
    }

    #[test]
    fn test_single_ping_pair() {
        let mut mon = monitor();
        seed_bidirectional(&mut mon);

        // Data packet out, matching echo and ack back 50 ms later
        let obs = mon.process_record(
            &a_to_b(1.0).seq(1000).ack(3).payload(50).push().ts_opt(100, 7).done(),
        );
        assert!(obs.is_none());

        let obs = mon
            .process_record(&b_to_a(1.05).seq(5000).ack(1050).ts_opt(900, 100).done())
            .expect("both delay samples fire");

        let ts_rtt = obs.ts_rtt.expect("tsval delay");
        let seq_rtt = obs.seq_rtt.expect("seq delay");
        assert!((ts_rtt - 0.05).abs() < 1e-9);
        assert!((seq_rtt - 0.05).abs() < 1e-9);
        assert_eq!(obs.dseq, 0);
        assert_eq!(obs.flow, "10.0.0.2:2000+10.0.0.1:1000");
    }

    #[test]
    fn test_duplicate_ecr_suppressed() {
        let mut mon = monitor();
        seed_bidirectional(&mut mon);

        mon.process_record(
            &a_to_b(1.0).seq(1000).ack(3).payload(50).push().ts_opt(100, 7).done(),
        );
        let obs = mon
            .process_record(&b_to_a(1.05).seq(5000).ack(1050).ts_opt(900, 100).done())
            .unwrap();
        assert!(obs.ts_rtt.is_some());

        // Same echo again: the entry was consumed, no second sample.
        // The repeated ackno makes this a duplicate ACK, which is the
        // only reason a line appears at all.
        let obs = mon
            .process_record(&b_to_a(1.1).seq(5000).ack(1050).ts_opt(901, 100).done())
            .expect("duplicate ACK fires");
        assert!(obs.ts_rtt.is_none());
        assert!(obs.seq_rtt.is_none());
        let dup = obs.dup_ack.expect("dup interval");
        assert!((dup - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_hole_detection() {
        let mut mon = monitor();

        let obs = mon.process_record(&a_to_b(1.0).seq(1000).ack(1).payload(100).push().done());
        assert!(obs.is_none());

        // Expected next is 1100; 1200 leaves a 100-byte hole
        let obs = mon
            .process_record(&a_to_b(1.1).seq(1200).ack(1).payload(100).push().done())
            .expect("hole fires");
        assert_eq!(obs.dseq, 100);
        assert!(obs.ts_rtt.is_none());
        assert!(obs.seq_rtt.is_none());
    }

    #[test]
    fn test_out_of_order() {
        let mut mon = monitor();

        mon.process_record(&a_to_b(1.0).seq(1100).ack(1).payload(100).push().done());

        // Expected next is 1200; 1000 arrives late
        let obs = mon
            .process_record(&a_to_b(1.1).seq(1000).ack(1).payload(100).push().done())
            .expect("reorder fires");
        assert_eq!(obs.dseq, -200);
    }

    #[test]
    fn test_duplicate_ack_interval() {
        let mut mon = monitor();

        let obs = mon.process_record(&a_to_b(2.0).seq(7000).ack(5000).done());
        assert!(obs.is_none());

        let obs = mon
            .process_record(&a_to_b(2.01).seq(7000).ack(5000).done())
            .expect("dup ACK fires");
        let dup = obs.dup_ack.expect("dup interval");
        assert!((dup - 0.01).abs() < 1e-9);
        assert_eq!(obs.dseq, 0);
    }

    #[test]
    fn test_unidirectional_flow_stays_silent() {
        let mut mon = monitor();

        for (i, t) in [(0u32, 1.0), (1, 1.1), (2, 1.2)] {
            let obs = mon.process_record(
                &a_to_b(t)
                    .seq(1000 + i * 100)
                    .ack(1)
                    .payload(100)
                    .push()
                    .ts_opt(100 + i, 50)
                    .done(),
            );
            assert!(obs.is_none());
        }

        assert_eq!(mon.counters.unidirectional, 3);
        assert!(!mon.flows.get(&a_to_b(0.0).done().flow_key()).unwrap().bidirectional);
        // No correlation state accumulates without the reverse direction
        assert!(mon.ts_table.is_empty());
        assert!(mon.seq_table.is_empty());
    }

    #[test]
    fn test_syn_fin_advance_sequence() {
        let mut mon = monitor();

        // SYN occupies one sequence number: expected next is 1001
        mon.process_record(&a_to_b(1.0).seq(1000).syn().done());
        let obs = mon.process_record(&a_to_b(1.1).seq(1001).ack(1).payload(10).push().done());
        assert!(obs.is_none(), "in-sequence after SYN");

        // FIN too
        mon.process_record(&a_to_b(1.2).seq(1011).ack(1).fin().done());
        let obs = mon.process_record(&a_to_b(1.3).seq(1012).ack(1).payload(5).push().done());
        assert!(obs.is_none(), "in-sequence after FIN");
    }

    #[test]
    fn test_sequence_wrap() {
        let mut mon = monitor();

        // Runs up to the wrap boundary: expected next is u32::MAX - 5
        mon.process_record(
            &a_to_b(1.0).seq(u32::MAX - 10).ack(1).payload(5).push().done(),
        );
        // 16 bytes past the wrapped boundary, a small hole, not a huge one
        let obs = mon
            .process_record(&a_to_b(1.1).seq(10).ack(1).payload(5).push().done())
            .expect("small hole across the wrap");
        assert_eq!(obs.dseq, 16);
    }

    #[test]
    fn test_wrap_threshold_reports_zero() {
        let mut mon = monitor();

        mon.process_record(&a_to_b(1.0).seq(1000).ack(1).payload(100).push().done());
        // A delta beyond the wrap threshold is reported as 0, not a hole
        let jump = 1000 + 100 + (1 << 30);
        let obs = mon.process_record(&a_to_b(1.1).seq(jump).ack(1).payload(10).push().done());
        assert!(obs.is_none());
    }

    #[test]
    fn test_quick_mode_suppresses_holes() {
        let mut cfg = MonitorConfig::default();
        cfg.quick = true;
        let mut mon = Monitor::new(cfg, None);

        mon.process_record(&a_to_b(1.0).seq(1000).ack(1).payload(100).push().done());
        let obs = mon.process_record(&a_to_b(1.1).seq(1200).ack(1).payload(100).push().done());
        assert!(obs.is_none(), "no delay sample, suppressed in quick mode");
    }

    #[test]
    fn test_local_filter_blocks_inserts_not_lookups() {
        let mut cfg = MonitorConfig::default();
        cfg.filter_local = true;
        let mut mon = Monitor::new(cfg, Some(B));
        seed_bidirectional(&mut mon);

        // Traffic toward the local address records nothing
        mon.process_record(
            &a_to_b(1.0).seq(1000).ack(3).payload(50).push().ts_opt(100, 7).done(),
        );
        assert!(mon.ts_table.is_empty());
        assert!(mon.seq_table.is_empty());

        // The other direction inserts normally
        mon.process_record(&b_to_a(1.02).seq(5000).ack(4).payload(20).push().ts_opt(900, 8).done());
        assert_eq!(mon.ts_table.len(), 1);
        assert_eq!(mon.seq_table.len(), 1);

        // And its echo, heading to the local address, still matches
        let obs = mon
            .process_record(&a_to_b(1.06).seq(1050).ack(5020).ts_opt(101, 900).done())
            .expect("lookup fires despite the local filter on ts");
        assert!(obs.ts_rtt.is_some());
        // The seq lookup is gated along with the insert
        assert!(obs.seq_rtt.is_none());
        assert_eq!(mon.seq_table.len(), 1);
    }

    #[test]
    fn test_capture_clock_normalization() {
        let mut clock = CaptureClock::default();
        let t0 = clock.advance(1_600_000_000, 250_000);
        assert!((t0 - 0.25).abs() < 1e-12);
        let t1 = clock.advance(1_600_000_010, 500_000);
        assert!((t1 - 10.5).abs() < 1e-9);
        assert!(t1 >= t0);
        assert!((clock.elapsed() - 10.25).abs() < 1e-9);
    }

    #[test]
    fn test_flow_capacity_ignores_packet() {
        let mut cfg = MonitorConfig::default();
        cfg.max_flows = 1;
        let mut mon = Monitor::new(cfg, None);

        mon.process_record(&a_to_b(1.0).seq(1000).ack(1).payload(10).push().done());
        // A second flow cannot be created; its packets are ignored
        let rec = build(A, 1001, B, 2000, 1.1).seq(50).ack(1).payload(10).push().done();
        assert!(mon.process_record(&rec).is_none());
        assert_eq!(mon.flows.len(), 1);
        assert_eq!(mon.flows.stats.dropped, 1);
    }

    #[test]
    fn test_maintenance_evicts_stale_state() {
        let mut mon = monitor();
        seed_bidirectional(&mut mon);

        mon.process_record(
            &a_to_b(1.0).seq(1000).ack(3).payload(50).push().ts_opt(100, 7).done(),
        );
        assert_eq!(mon.ts_table.len(), 1);
        assert_eq!(mon.seq_table.len(), 1);
        mon.maintain();

        // Advance past rtd_max_age; the next maintenance clears both tables
        mon.process_record(&a_to_b(30.0).seq(1050).ack(3).done());
        mon.maintain();
        assert!(mon.ts_table.is_empty());
        assert!(mon.seq_table.is_empty());

        // A late echo finds nothing
        let obs = mon.process_record(&b_to_a(30.1).seq(5000).ack(1050).ts_opt(900, 100).done());
        assert!(obs.is_none() || obs.unwrap().ts_rtt.is_none());
    }

    #[test]
    fn test_idle_flow_eviction() {
        let mut mon = monitor();
        mon.process_record(&a_to_b(1.0).seq(1000).ack(1).payload(10).push().done());
        assert_eq!(mon.flows.len(), 1);

        // Idle past flow_max_idle; a packet on another flow drives cleanup
        mon.process_record(&build(A, 9999, B, 2000, 400.0).seq(1).ack(1).payload(1).push().done());
        mon.maintain();
        assert_eq!(mon.flows.len(), 1);
        assert!(mon.flows.get(&a_to_b(0.0).done().flow_key()).is_none());
    }

    struct VecSource {
        frames: Vec<ParseOutcome>,
    }

    impl PacketSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<ParseOutcome>> {
            if self.frames.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.frames.remove(0)))
            }
        }
    }

    #[test]
    fn test_run_loop_emits_in_order() {
        let mut mon = monitor();
        let mut source = VecSource {
            frames: vec![
                ParseOutcome::Record(a_to_b(0.5).seq(1000).ack(1).done()),
                ParseOutcome::Record(b_to_a(0.6).seq(5000).ack(2).done()),
                ParseOutcome::NotTcp,
                ParseOutcome::Record(
                    a_to_b(1.0).seq(1000).ack(3).payload(50).push().ts_opt(100, 7).done(),
                ),
                ParseOutcome::Record(b_to_a(1.05).seq(5000).ack(1050).ts_opt(900, 100).done()),
            ],
        };
        let mut writer =
            ObservationWriter::new(Vec::new(), OutputFormat::Machine, FLUSH_INTERVAL);

        mon.run(&mut source, &mut writer).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("0.050000"));
        assert_eq!(mon.total_packets, 5);
    }

    #[test]
    fn test_run_loop_packet_limit() {
        let mut cfg = MonitorConfig::default();
        cfg.max_packets = 2;
        let mut mon = Monitor::new(cfg, None);

        let mut source = VecSource {
            frames: vec![
                ParseOutcome::Record(a_to_b(0.5).seq(1000).ack(1).done()),
                ParseOutcome::Record(a_to_b(0.6).seq(1000).ack(1).done()),
                ParseOutcome::Record(a_to_b(0.7).seq(1000).ack(1).done()),
            ],
        };
        let mut writer =
            ObservationWriter::new(Vec::new(), OutputFormat::Machine, FLUSH_INTERVAL);
        mon.run(&mut source, &mut writer).unwrap();
        assert_eq!(mon.total_packets, 2);
    }

    #[test]
    fn test_run_loop_time_limit() {
        let mut cfg = MonitorConfig::default();
        cfg.time_to_run = 5.0;
        let mut mon = Monitor::new(cfg, None);

        let mut source = VecSource {
            frames: vec![
                ParseOutcome::Record(a_to_b(0.5).seq(1000).ack(1).done()),
                ParseOutcome::Record(a_to_b(6.0).seq(1000).ack(1).done()),
                ParseOutcome::Record(a_to_b(6.1).seq(1000).ack(1).done()),
            ],
        };
        let mut writer =
            ObservationWriter::new(Vec::new(), OutputFormat::Machine, FLUSH_INTERVAL);
        mon.run(&mut source, &mut writer).unwrap();
        assert_eq!(mon.total_packets, 2);
    }
}
