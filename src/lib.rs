//! Bidirectional flow feature aggregation.
//!
//! Packets of one flow are fed to a [`Flow`] with [`Flow::add_packet`];
//! [`Flow::get_data`] turns the flow into a fixed-schema [`FlowFeatures`]
//! vector in the CICFlowMeter column layout. [`FlowTable`] and
//! [`FeatureProcessor`] demultiplex a packet stream into flows and emit
//! their features when they finish.

pub mod capture;
pub mod config;
pub mod error;
pub mod features;
pub mod processor;
pub mod types;

pub use capture::{Packet, PacketRecord, ParsedPacket};
pub use config::EngineConfig;
pub use error::{FlowError, Result};
pub use features::{FlowFeatures, FlowMetrics, StatSummary};
pub use processor::{FeatureProcessor, Flow, FlowIdentity, FlowKey, FlowTable};
pub use types::{Direction, EngineStats, Protocol, TcpFlag};
