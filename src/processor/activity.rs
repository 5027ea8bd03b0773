use super::constants::{ACTIVE_TIMEOUT, CLUMP_TIMEOUT, MICROS_PER_SEC};

/// Splits a flow's lifetime into alternating active and idle periods.
///
/// Times are seconds internally; recorded periods are microseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTracker {
    start_active: f64,
    last_active: f64,
    active: Vec<f64>,
    idle: Vec<f64>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the arrival time of every packet and the flow's latest
    /// timestamp before that packet (`None` for the first timed packet).
    pub fn update(&mut self, time: f64, latest: Option<f64>) {
        let Some(latest) = latest else {
            self.start_active = time;
            self.last_active = time;
            return;
        };

        if time - latest > CLUMP_TIMEOUT {
            self.segment(time);
        } else if time > self.last_active {
            self.last_active = time;
        }
    }

    fn segment(&mut self, time: f64) {
        if time - self.last_active > ACTIVE_TIMEOUT {
            let active = self.last_active - self.start_active;
            if active > 0.0 {
                self.active.push(MICROS_PER_SEC * active);
            }
            self.idle.push(MICROS_PER_SEC * (time - self.last_active));
            self.start_active = time;
        }
        self.last_active = time;
    }

    pub fn active(&self) -> &[f64] {
        &self.active
    }

    pub fn idle(&self) -> &[f64] {
        &self.idle
    }
}
