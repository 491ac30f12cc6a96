//! Progress reporting.
//!
//! - `protocol`: the machine-readable one-line event format.
//! - `sink`: where lines go (stdout, memory, tee).
//! - `reporter`: pairs structured events with human-readable console lines.

pub mod protocol;
pub mod reporter;
pub mod sink;

pub use protocol::{CaseStatus, EVENT_PREFIX, ProtocolEvent, StructuredLine, decode, encode};
pub use reporter::Reporter;
pub use sink::{LogSink, MemorySink, StdoutSink, TeeSink};
