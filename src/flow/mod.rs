//! Flow tracking
//!
//! One `FlowRecord` per observed direction, keyed by the directional
//! 4-tuple; the table caps live flows and evicts idle ones on the
//! capture-time clock.

pub mod table;

pub use table::{FlowTable, TableStats};

pub use crate::core::{FlowKey, FlowRecord};
