pub mod constants;
pub mod feature_processor;
mod activity;
mod bulk;
mod engine;
mod flow;
mod key;
mod table;

pub use activity::ActivityTracker;
pub use bulk::{BulkDetector, BulkState};
pub use engine::processing_loop;
pub use feature_processor::FeatureProcessor;
pub use flow::{checked_time, Flow};
pub use key::{format_mac, FlowIdentity, FlowKey};
pub use table::{FlowTable, TableStats};
