use crate::capture::Packet;
use crate::processor::{checked_time, Flow};
use crate::types::Direction;

/// Timing view over a flow's packets.
pub struct PacketTime<'a, P> {
    flow: &'a Flow<P>,
}

impl<'a, P: Packet> PacketTime<'a, P> {
    pub fn new(flow: &'a Flow<P>) -> Self {
        Self { flow }
    }

    /// Arrival time of the flow's first timed packet, seconds.
    pub fn timestamp(&self) -> f64 {
        self.flow.start_timestamp().unwrap_or(0.0)
    }

    /// Seconds between the first and latest packet, never negative.
    pub fn duration(&self) -> f64 {
        match (self.flow.start_timestamp(), self.flow.latest_timestamp()) {
            (Some(start), Some(latest)) => (latest - start).max(0.0),
            _ => 0.0,
        }
    }

    /// Gaps in seconds between consecutive packets of `direction` (all
    /// packets for `None`). Packets without a usable timestamp are skipped.
    pub fn packet_iat(&self, direction: Option<Direction>) -> Vec<f64> {
        let times: Vec<f64> = self
            .flow
            .packets_in(direction)
            .filter_map(|p| checked_time(p.timestamp()).ok())
            .collect();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    fn flow_of(packets: &[(f64, Direction)]) -> Flow<PacketRecord> {
        let first = PacketRecord::tcp(packets[0].0, 10);
        let mut flow = Flow::new(&first, packets[0].1).unwrap();
        for &(t, dir) in packets {
            let pkt = PacketRecord::tcp(t, 10);
            flow.add_packet(if dir == Direction::Forward { pkt } else { pkt.reversed() }, dir);
        }
        flow
    }

    #[test]
    fn per_direction_gaps() {
        let flow = flow_of(&[
            (1.0, Direction::Forward),
            (1.5, Direction::Reverse),
            (2.0, Direction::Forward),
            (4.0, Direction::Forward),
        ]);
        let time = PacketTime::new(&flow);
        assert_eq!(time.timestamp(), 1.0);
        assert_eq!(time.duration(), 3.0);
        assert_eq!(time.packet_iat(Some(Direction::Forward)), vec![1.0, 2.0]);
        assert!(time.packet_iat(Some(Direction::Reverse)).is_empty());
        assert_eq!(time.packet_iat(None), vec![0.5, 0.5, 2.0]);
    }

    #[test]
    fn single_packet_has_zero_duration() {
        let flow = flow_of(&[(3.0, Direction::Forward)]);
        let time = PacketTime::new(&flow);
        assert_eq!(time.duration(), 0.0);
        assert!(time.packet_iat(None).is_empty());
    }
}
