//! Core shared types for packet observation
//!
//! - `PacketRecord`: normalized per-packet input from the capture layer
//! - `FlowKey` / `FlowRecord`: directional flow identity and state

pub mod flow;
pub mod packet;

pub use flow::{FlowKey, FlowRecord};
pub use packet::{PacketRecord, TcpFlags, TcpTimestamp};
