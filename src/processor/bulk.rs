use crate::types::Direction;
use super::constants::{BULK_BOUND, CLUMP_TIMEOUT};

/// Bulk bookkeeping for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BulkState {
    // Tentative bulk, `None` until a payload packet opens one
    start_tmp: Option<f64>,
    last_timestamp: Option<f64>,
    count_tmp: u32,
    size_tmp: u64,

    // Committed totals, only ever grow
    pub count: u32,
    pub packet_count: u64,
    pub size: u64,
    /// Seconds.
    pub duration: f64,
}

impl BulkState {
    fn open(&mut self, time: f64, payload_len: u64) {
        self.start_tmp = Some(time);
        self.last_timestamp = Some(time);
        self.count_tmp = 1;
        self.size_tmp = payload_len;
    }

    fn extend(&mut self, time: f64, start: f64, payload_len: u64) {
        self.count_tmp += 1;
        self.size_tmp += payload_len;

        if self.count_tmp == BULK_BOUND {
            self.count += 1;
            self.packet_count += self.count_tmp as u64;
            self.size += self.size_tmp;
            self.duration += (time - start).max(0.0);
        } else if self.count_tmp > BULK_BOUND {
            self.packet_count += 1;
            self.size += payload_len;
            let last = self.last_timestamp.unwrap_or(time);
            self.duration += (time - last).max(0.0);
        }
        self.last_timestamp = Some(time);
    }

    /// Time of the last payload packet seen in this direction.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Packets in the bulk currently being accumulated.
    pub fn pending_packets(&self) -> u32 {
        if self.start_tmp.is_some() { self.count_tmp } else { 0 }
    }
}

/// Classifies runs of same-direction payload packets into bulk transfers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkDetector {
    states: [BulkState; 2],
}

impl BulkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, direction: Direction) -> &BulkState {
        &self.states[direction.index()]
    }

    pub fn update(&mut self, direction: Direction, time: f64, payload_len: usize) {
        if payload_len == 0 {
            return;
        }
        let payload_len = payload_len as u64;
        let other_last = self.states[direction.opposite().index()].last_timestamp;
        let state = &mut self.states[direction.index()];

        // An answer from the other side splits the run
        if let (Some(start), Some(other)) = (state.start_tmp, other_last) {
            if other > start {
                state.start_tmp = None;
            }
        }

        match state.start_tmp {
            None => state.open(time, payload_len),
            Some(_) if time - state.last_timestamp.unwrap_or(time) > CLUMP_TIMEOUT => {
                state.open(time, payload_len)
            }
            Some(start) => state.extend(time, start, payload_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(detector: &mut BulkDetector, direction: Direction, times: &[f64], payload: usize) {
        for &t in times {
            detector.update(direction, t, payload);
        }
    }

    #[test]
    fn commits_when_bound_reached() {
        let mut d = BulkDetector::new();
        feed(&mut d, Direction::Forward, &[0.0, 0.1, 0.2], 100);
        assert_eq!(d.state(Direction::Forward).count, 0);
        assert_eq!(d.state(Direction::Forward).pending_packets(), 3);

        d.update(Direction::Forward, 0.3, 100);
        let s = d.state(Direction::Forward);
        assert_eq!(s.count, 1);
        assert_eq!(s.packet_count, 4);
        assert_eq!(s.size, 400);
        assert!((s.duration - 0.3).abs() < 1e-9);
    }

    #[test]
    fn packets_past_bound_add_to_committed_totals() {
        let mut d = BulkDetector::new();
        feed(&mut d, Direction::Forward, &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 10);
        let s = d.state(Direction::Forward);
        assert_eq!(s.count, 1);
        assert_eq!(s.packet_count, 6);
        assert_eq!(s.size, 60);
        assert!((s.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clump_timeout_restarts_tentative_bulk() {
        let mut d = BulkDetector::new();
        feed(&mut d, Direction::Forward, &[0.0, 0.1, 0.2], 10);
        feed(&mut d, Direction::Forward, &[5.0, 5.1, 5.2], 10);
        let s = d.state(Direction::Forward);
        assert_eq!(s.count, 0);
        assert_eq!(s.pending_packets(), 3);
    }

    #[test]
    fn reverse_payload_splits_the_run() {
        let mut d = BulkDetector::new();
        feed(&mut d, Direction::Forward, &[0.0, 0.1], 10);
        d.update(Direction::Reverse, 0.15, 10);
        feed(&mut d, Direction::Forward, &[0.2, 0.3], 10);
        assert_eq!(d.state(Direction::Forward).count, 0);
        assert_eq!(d.state(Direction::Forward).pending_packets(), 2);
    }

    #[test]
    fn empty_payload_is_ignored() {
        let mut d = BulkDetector::new();
        feed(&mut d, Direction::Reverse, &[0.0, 0.1, 0.2, 0.3], 0);
        assert_eq!(d.state(Direction::Reverse), &BulkState::default());
    }
}
