use crate::capture::Packet;
use crate::processor::Flow;
use crate::types::Direction;
use super::packet_time::PacketTime;

/// Packet counters and rates of a flow.
pub struct PacketCount<'a, P> {
    flow: &'a Flow<P>,
}

impl<'a, P: Packet> PacketCount<'a, P> {
    pub fn new(flow: &'a Flow<P>) -> Self {
        Self { flow }
    }

    pub fn total(&self, direction: Option<Direction>) -> usize {
        self.flow.packets_in(direction).count()
    }

    /// Packets per second; zero for a flow with no measurable duration.
    pub fn rate(&self, direction: Option<Direction>) -> f64 {
        let duration = PacketTime::new(self.flow).duration();
        if duration == 0.0 {
            return 0.0;
        }
        self.total(direction) as f64 / duration
    }

    /// Packets of `direction` that carry payload.
    pub fn has_payload(&self, direction: Option<Direction>) -> usize {
        self.flow.packets_in(direction).filter(|p| p.payload_len() > 0).count()
    }

    /// Reverse packets per forward packet.
    pub fn down_up_ratio(&self) -> f64 {
        let forward = self.total(Some(Direction::Forward));
        if forward == 0 {
            return 0.0;
        }
        self.total(Some(Direction::Reverse)) as f64 / forward as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    #[test]
    fn counts_rates_and_ratio() {
        let mut flow = Flow::new(&PacketRecord::tcp(0.0, 0), Direction::Forward).unwrap();
        flow.add_packet(PacketRecord::tcp(0.0, 0), Direction::Forward);
        flow.add_packet(PacketRecord::tcp(1.0, 10).reversed(), Direction::Reverse);
        flow.add_packet(PacketRecord::tcp(1.5, 10).reversed(), Direction::Reverse);
        flow.add_packet(PacketRecord::tcp(2.0, 5), Direction::Forward);

        let count = PacketCount::new(&flow);
        assert_eq!(count.total(None), 4);
        assert_eq!(count.total(Some(Direction::Reverse)), 2);
        assert_eq!(count.rate(None), 2.0);
        assert_eq!(count.rate(Some(Direction::Forward)), 1.0);
        assert_eq!(count.has_payload(Some(Direction::Forward)), 1);
        assert_eq!(count.down_up_ratio(), 1.0);
    }

    #[test]
    fn zero_duration_rate_is_zero() {
        let mut flow = Flow::new(&PacketRecord::tcp(5.0, 0), Direction::Forward).unwrap();
        flow.add_packet(PacketRecord::tcp(5.0, 0), Direction::Forward);
        let count = PacketCount::new(&flow);
        assert_eq!(count.rate(None), 0.0);
        assert_eq!(count.down_up_ratio(), 0.0);
    }
}
