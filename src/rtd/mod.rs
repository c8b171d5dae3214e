//! Round-trip delay correlation
//!
//! Two instances of the same first-seen table drive the monitor: one keyed
//! by TCP timestamp values (matched against echo replies on the reverse
//! flow) and one keyed by expected-next sequence numbers (matched against
//! acknowledgments).

pub mod table;

pub use table::{CorrKey, CorrStats, CorrelationTable};
