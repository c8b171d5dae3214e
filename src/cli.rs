use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::warn;

use rttmon::config::Config;
use rttmon::engine::{local_addr_of, CaptureSource, Monitor, PcapSource};
use rttmon::output::{
    ObservationWriter, OutputFormat, FLUSH_INTERVAL, PIPELINE_FLUSH_INTERVAL,
};

#[derive(Parser)]
#[command(name = "rttmon", version)]
#[command(about = "Passive TCP round-trip delay and sequence anomaly monitor")]
#[command(group(ArgGroup::new("source").required(true).args(["interface", "read"])))]
pub struct Cli {
    /// Live capture from this interface
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// Read packets from a pcap savefile
    #[arg(short = 'r', long)]
    pub read: Option<PathBuf>,

    /// Extra BPF filter, ANDed with "tcp".
    /// E.g. -f 'net 74.125.0.0/16' only watches that network
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Stop after this many packets
    #[arg(short = 'c', long)]
    pub count: Option<u64>,

    /// Stop after this many capture seconds
    #[arg(short = 's', long)]
    pub seconds: Option<f64>,

    /// Don't print summary reports
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Print summary reports every sumInt seconds (default)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Show delays through local host applications
    #[arg(short = 'l', long = "showLocal")]
    pub show_local: bool,

    /// Machine-readable output: timestamps as absolute seconds, delays as
    /// bare decimal seconds, microsecond resolution
    #[arg(short = 'm', long)]
    pub machine: bool,

    /// Only print lines carrying a delay sample
    #[arg(short = 'Q', long)]
    pub quick: bool,

    /// Summary report interval in seconds
    #[arg(long = "sumInt")]
    pub sum_int: Option<f64>,

    /// Max age of an unmatched correlation entry in seconds
    #[arg(long = "rtdMaxAge")]
    pub rtd_max_age: Option<f64>,

    /// Flows idle longer than this many seconds are deleted
    #[arg(long = "flowMaxIdle")]
    pub flow_max_idle: Option<f64>,

    /// Maximum concurrent flows
    #[arg(long = "maxFlows")]
    pub max_flows: Option<usize>,

    /// Sequence deltas above this are treated as 32-bit wrap
    #[arg(long = "seqWrapThreshold")]
    pub seq_wrap_threshold: Option<u32>,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Fold the flags over the (possibly file-loaded) configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(v) = self.sum_int {
            config.monitor.sum_interval = v;
        }
        if let Some(v) = self.rtd_max_age {
            config.monitor.rtd_max_age = v;
        }
        if let Some(v) = self.flow_max_idle {
            config.monitor.flow_max_idle = v;
        }
        if let Some(v) = self.max_flows {
            config.monitor.max_flows = v;
        }
        if let Some(v) = self.seq_wrap_threshold {
            config.monitor.seq_wrap_threshold = v;
        }
        if let Some(n) = self.count {
            config.monitor.max_packets = n;
        }
        if let Some(s) = self.seconds {
            config.monitor.time_to_run = s;
        }
        if self.quiet {
            config.monitor.sum_interval = 0.0;
        }
        if self.quick {
            config.monitor.quick = true;
        }
        if self.show_local {
            config.monitor.filter_local = false;
        }
    }
}

pub fn run_command(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply_to(&mut config);

    let live = cli.interface.is_some();
    let source = match (&cli.interface, &cli.read) {
        (Some(ifname), _) => CaptureSource::Live(ifname.clone()),
        (None, Some(path)) => CaptureSource::File(path.clone()),
        (None, None) => unreachable!("clap requires a capture source"),
    };

    // Local filtering needs the interface's address; without one it is off
    let local_ip = if config.monitor.filter_local {
        match &cli.interface {
            Some(ifname) => {
                let addr = local_addr_of(ifname);
                if addr.is_none() {
                    warn!("no IPv4 address on {}, local filtering disabled", ifname);
                }
                addr
            }
            None => None,
        }
    } else {
        None
    };
    if local_ip.is_none() {
        config.monitor.filter_local = false;
    }

    let mut source = PcapSource::open(&source, &config.capture, cli.filter.as_deref())
        .context("Failed to open capture source")?;

    let format = if cli.machine {
        OutputFormat::Machine
    } else {
        OutputFormat::Human
    };
    // A live pipeline wants its data promptly
    let flush_interval = if live && cli.machine {
        PIPELINE_FLUSH_INTERVAL
    } else {
        FLUSH_INTERVAL
    };
    let stdout = io::stdout();
    let mut writer = ObservationWriter::new(
        io::BufWriter::new(stdout.lock()),
        format,
        flush_interval,
    );

    let mut monitor = Monitor::new(config.monitor.clone(), local_ip);
    monitor.run(&mut source, &mut writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_a_source() {
        assert!(Cli::try_parse_from(["rttmon"]).is_err());
        assert!(Cli::try_parse_from(["rttmon", "-r", "x.pcap"]).is_ok());
        assert!(Cli::try_parse_from(["rttmon", "-i", "eth0"]).is_ok());
        assert!(Cli::try_parse_from(["rttmon", "-i", "eth0", "-r", "x.pcap"]).is_err());
    }

    #[test]
    fn test_quiet_and_quick_are_distinct() {
        let cli = Cli::try_parse_from(["rttmon", "-r", "x.pcap", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.quick);

        let cli = Cli::try_parse_from(["rttmon", "-r", "x.pcap", "-Q"]).unwrap();
        assert!(cli.quick);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "rttmon",
            "-r",
            "x.pcap",
            "-q",
            "-l",
            "-c",
            "500",
            "--rtdMaxAge",
            "2.5",
            "--flowMaxIdle",
            "60",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.monitor.sum_interval, 0.0);
        assert!(!config.monitor.filter_local);
        assert_eq!(config.monitor.max_packets, 500);
        assert_eq!(config.monitor.rtd_max_age, 2.5);
        assert_eq!(config.monitor.flow_max_idle, 60.0);
    }

    #[test]
    fn test_long_option_names() {
        let cli = Cli::try_parse_from([
            "rttmon",
            "--read",
            "x.pcap",
            "--sumInt",
            "30",
            "--maxFlows",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.sum_int, Some(30.0));
        assert_eq!(cli.max_flows, Some(100));
    }
}
