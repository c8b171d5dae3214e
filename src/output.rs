//! Observation rendering
//!
//! One line per emitted observation on stdout. Two formats: human (local
//! time, SI-prefixed delays) and machine (absolute seconds, bare decimal
//! delays) for piping into graphing or post-processing tools. Unused
//! fields render as `*`, the duplicate-ACK column as `-`.
//!
//! Flushing is wall-clock driven; the capture clock can run arbitrarily
//! fast on file replay and must not influence output timing.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};

/// Default flush interval
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);
/// Flush interval when feeding a live pipeline (live + machine readable)
pub const PIPELINE_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Machine,
}

/// One per-packet observation, ready for rendering.
///
/// Optional fields were simply not observable on this packet.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Capture time, whole seconds (epoch)
    pub wall_sec: i64,
    /// Capture time, microseconds within the second
    pub wall_usec: i64,
    /// TSval-based round-trip delay in seconds
    pub ts_rtt: Option<f64>,
    /// Sequence-based round-trip delay in seconds
    pub seq_rtt: Option<f64>,
    /// Observed minus expected sequence number (hole > 0, reorder < 0)
    pub dseq: i32,
    /// Interval since the original ACK, when this is a duplicate
    pub dup_ack: Option<f64>,
    /// Payload bytes in this packet
    pub payload_len: u32,
    /// Bytes seen so far on this flow
    pub flow_bytes: u64,
    /// Flow name `srcIP:srcPort+dstIP:dstPort`
    pub flow: String,
}

/// Format a time difference with an SI prefix.
///
/// Two fractional digits below 10, one below 100, none above.
pub fn fmt_time_diff(dt: f64) -> String {
    let (scaled, prefix) = if dt < 1e-3 {
        (dt * 1e6, "u")
    } else if dt < 1.0 {
        (dt * 1e3, "m")
    } else {
        (dt, "")
    };
    if scaled < 10.0 {
        format!("{:.2}{}s", scaled, prefix)
    } else if scaled < 100.0 {
        format!("{:.1}{}s", scaled, prefix)
    } else {
        format!(" {:.0}{}s", scaled, prefix)
    }
}

/// Buffered observation sink with periodic wall-clock flushing
pub struct ObservationWriter<W: Write> {
    out: W,
    format: OutputFormat,
    flush_interval: Duration,
    next_flush: Instant,
}

impl<W: Write> ObservationWriter<W> {
    pub fn new(out: W, format: OutputFormat, flush_interval: Duration) -> Self {
        Self {
            out,
            format,
            flush_interval,
            next_flush: Instant::now() + flush_interval,
        }
    }

    /// Render one observation and flush if the interval has elapsed
    pub fn write(&mut self, obs: &Observation) -> io::Result<()> {
        match self.format {
            OutputFormat::Human => self.write_human(obs)?,
            OutputFormat::Machine => self.write_machine(obs)?,
        }

        let now = Instant::now();
        if now >= self.next_flush {
            self.next_flush = now + self.flush_interval;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Flush unconditionally
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Consume the writer and return the underlying sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_human(&mut self, obs: &Observation) -> io::Result<()> {
        let when = match Local.timestamp_opt(obs.wall_sec, 0).single() {
            Some(dt) => dt.format("%H:%M:%S").to_string(),
            None => obs.wall_sec.to_string(),
        };
        write!(self.out, "{}", when)?;

        match obs.ts_rtt {
            Some(rtt) => write!(self.out, " {:>6}", fmt_time_diff(rtt))?,
            None => write!(self.out, "   *   ")?,
        }
        match obs.seq_rtt {
            Some(rtt) => write!(self.out, " {:>6}", fmt_time_diff(rtt))?,
            None => write!(self.out, "   *   ")?,
        }

        let dup = match obs.dup_ack {
            Some(d) => fmt_time_diff(d),
            None => "   -    ".to_string(),
        };
        write!(self.out, " {:4}", obs.dseq)?;
        write!(self.out, " {:>8}", dup)?;
        write!(self.out, " {:4}", obs.payload_len)?;
        write!(self.out, " {:7}", obs.flow_bytes)?;
        writeln!(self.out, " {}", obs.flow)
    }

    fn write_machine(&mut self, obs: &Observation) -> io::Result<()> {
        write!(self.out, "{}.{:06}", obs.wall_sec, obs.wall_usec)?;

        match obs.ts_rtt {
            Some(rtt) => write!(self.out, " {:8.6}", rtt)?,
            None => write!(self.out, "    *    ")?,
        }
        match obs.seq_rtt {
            Some(rtt) => write!(self.out, " {:8.6}", rtt)?,
            None => write!(self.out, "    *    ")?,
        }

        let dup = match obs.dup_ack {
            Some(d) => format!("{:.6}", d),
            None => "   -    ".to_string(),
        };
        write!(self.out, " {:4}", obs.dseq)?;
        write!(self.out, " {:>8}", dup)?;
        write!(self.out, " {:4}", obs.payload_len)?;
        write!(self.out, " {:7}", obs.flow_bytes)?;
        writeln!(self.out, " {}", obs.flow)
    }
}
