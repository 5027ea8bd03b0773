/// Largest gap (seconds) between two same-direction payload packets of one bulk.
/// Also the inactivity gap that triggers active/idle segmentation.
pub const CLUMP_TIMEOUT: f64 = 1.0;

/// Gap (seconds) after which an active period is considered over.
pub const ACTIVE_TIMEOUT: f64 = 0.005;

/// Packets a tentative bulk needs before it counts.
pub const BULK_BOUND: u32 = 4;

pub const MICROS_PER_SEC: f64 = 1_000_000.0;
