use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("capture error: {0}")]
    Capture(#[from] pcap::Error),

    #[error("interface not found: {0}")]
    NoSuchDevice(String),

    #[error("unsupported link type: {0}")]
    UnsupportedLinkType(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
