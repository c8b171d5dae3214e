//! Packet acquisition
//!
//! Two capture methods behind one trait:
//! - live interface capture with a BPF filter
//! - offline replay of a pcap savefile
//!
//! Either way packets arrive in capture order, already parsed into
//! classification outcomes.

use std::net::IpAddr;
use std::path::PathBuf;

use pcap::{Activated, Capture, Device, Linktype};
use tracing::debug;

use crate::config::CaptureSettings;
use crate::error::{MonitorError, Result};

use super::parser::{parse_frame, LinkLayer, ParseOutcome};

/// Where packets come from
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Live capture from a named interface
    Live(String),
    /// Offline capture from a pcap savefile
    File(PathBuf),
}

/// Abstract packet source consumed by the run loop
pub trait PacketSource {
    /// Next parsed frame in capture order; `None` when the source is done
    fn next_frame(&mut self) -> Result<Option<ParseOutcome>>;
}

/// pcap-backed packet source
pub struct PcapSource {
    cap: Capture<dyn Activated>,
    link: LinkLayer,
    live: bool,
}

impl PcapSource {
    /// Open a capture and apply the BPF filter.
    ///
    /// A user-supplied expression is conjoined with the base filter, so the
    /// monitor never sees non-TCP traffic it did not ask for.
    pub fn open(
        source: &CaptureSource,
        settings: &CaptureSettings,
        extra_filter: Option<&str>,
    ) -> Result<Self> {
        let filter = match extra_filter {
            Some(expr) => format!("{} and ({})", settings.filter, expr),
            None => settings.filter.clone(),
        };

        let (mut cap, live): (Capture<dyn Activated>, bool) = match source {
            CaptureSource::Live(ifname) => {
                let cap = Capture::from_device(ifname.as_str())?
                    .promisc(settings.promiscuous)
                    .snaplen(settings.snaplen)
                    .timeout(settings.timeout_ms)
                    .open()?;
                (cap.into(), true)
            }
            CaptureSource::File(path) => (Capture::from_file(path)?.into(), false),
        };

        cap.filter(&filter, true)?;

        let link = match cap.get_datalink() {
            Linktype::ETHERNET => LinkLayer::Ethernet,
            Linktype::NULL | Linktype::LOOP => LinkLayer::NullLoop,
            Linktype::RAW | Linktype::IPV4 | Linktype::IPV6 => LinkLayer::RawIp,
            other => {
                return Err(MonitorError::UnsupportedLinkType(
                    other.get_name().unwrap_or_else(|_| format!("{:?}", other)),
                ))
            }
        };
        debug!("capture open, link layer {:?}, filter \"{}\"", link, filter);

        Ok(Self { cap, link, live })
    }
}

impl PacketSource for PcapSource {
    fn next_frame(&mut self) -> Result<Option<ParseOutcome>> {
        loop {
            match self.cap.next_packet() {
                Ok(packet) => {
                    let outcome = parse_frame(
                        self.link,
                        packet.data,
                        packet.header.ts.tv_sec as i64,
                        packet.header.ts.tv_usec as i64,
                        packet.header.len,
                    );
                    return Ok(Some(outcome));
                }
                // Live reads time out periodically with nothing to deliver
                Err(pcap::Error::TimeoutExpired) if self.live => continue,
                Err(pcap::Error::NoMorePackets) => return Ok(None),
                Err(e) => return Err(MonitorError::Capture(e)),
            }
        }
    }
}

/// First IPv4 address of the named interface.
///
/// An interface can carry several addresses, v4 and v6; matching the
/// original tool, only the first v4 address is used for local filtering.
pub fn local_addr_of(ifname: &str) -> Option<IpAddr> {
    let devices = Device::list().ok()?;
    let device = devices.into_iter().find(|d| d.name == ifname)?;
    device
        .addresses
        .into_iter()
        .map(|a| a.addr)
        .find(IpAddr::is_ipv4)
}
