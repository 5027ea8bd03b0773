use crate::capture::Packet;
use crate::processor::Flow;
use crate::types::Direction;
use super::stats::{variance, StatSummary};

/// Payload length distribution of a flow.
pub struct PacketLength<'a, P> {
    flow: &'a Flow<P>,
}

impl<'a, P: Packet> PacketLength<'a, P> {
    pub fn new(flow: &'a Flow<P>) -> Self {
        Self { flow }
    }

    pub fn lengths(&self, direction: Option<Direction>) -> Vec<f64> {
        self.flow.packets_in(direction).map(|p| p.payload_len() as f64).collect()
    }

    fn summary(&self, direction: Option<Direction>) -> StatSummary {
        StatSummary::from_samples(&self.lengths(direction))
    }

    pub fn total(&self, direction: Option<Direction>) -> f64 {
        self.summary(direction).total
    }

    pub fn max(&self, direction: Option<Direction>) -> f64 {
        self.summary(direction).max
    }

    pub fn min(&self, direction: Option<Direction>) -> f64 {
        self.summary(direction).min
    }

    pub fn mean(&self, direction: Option<Direction>) -> f64 {
        self.summary(direction).mean
    }

    pub fn std(&self, direction: Option<Direction>) -> f64 {
        self.summary(direction).std
    }

    pub fn var(&self, direction: Option<Direction>) -> f64 {
        variance(&self.lengths(direction))
    }

    /// Mean payload bytes per packet over the whole flow.
    pub fn avg(&self) -> f64 {
        let count = self.flow.packet_count();
        if count == 0 {
            return 0.0;
        }
        self.total(None) / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    #[test]
    fn lengths_by_direction() {
        let mut flow = Flow::new(&PacketRecord::tcp(0.0, 100), Direction::Forward).unwrap();
        flow.add_packet(PacketRecord::tcp(0.0, 100), Direction::Forward);
        flow.add_packet(PacketRecord::tcp(0.1, 300).reversed(), Direction::Reverse);
        flow.add_packet(PacketRecord::tcp(0.2, 200), Direction::Forward);

        let len = PacketLength::new(&flow);
        assert_eq!(len.total(Some(Direction::Forward)), 300.0);
        assert_eq!(len.max(Some(Direction::Forward)), 200.0);
        assert_eq!(len.min(Some(Direction::Forward)), 100.0);
        assert_eq!(len.mean(Some(Direction::Forward)), 150.0);
        assert_eq!(len.std(Some(Direction::Forward)), 50.0);
        assert_eq!(len.var(None), 20000.0 / 3.0);
        assert_eq!(len.total(Some(Direction::Reverse)), 300.0);
        assert_eq!(len.avg(), 200.0);
    }
}
