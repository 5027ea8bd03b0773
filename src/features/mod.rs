//! Feature extractors run over a flow's packet history.

pub mod stats;
mod packet_time;
mod packet_length;
mod packet_count;
mod flag_count;
mod flow_bytes;
mod schema;

pub use stats::StatSummary;
pub use packet_time::PacketTime;
pub use packet_length::PacketLength;
pub use packet_count::PacketCount;
pub use flag_count::FlagCount;
pub use flow_bytes::FlowBytes;
pub use schema::{coerce, FlowFeatures, FlowMetrics, DEFAULT_FALLBACK};
