use crate::capture::Packet;
use crate::processor::Flow;
use crate::types::Direction;
use super::packet_time::PacketTime;

/// Byte totals, rates, header sizes and bulk averages of a flow.
pub struct FlowBytes<'a, P> {
    flow: &'a Flow<P>,
}

impl<'a, P: Packet> FlowBytes<'a, P> {
    pub fn new(flow: &'a Flow<P>) -> Self {
        Self { flow }
    }

    /// Payload bytes.
    pub fn bytes(&self, direction: Option<Direction>) -> u64 {
        self.flow.packets_in(direction).map(|p| p.payload_len() as u64).sum()
    }

    /// Payload bytes per second over the whole flow.
    pub fn rate(&self) -> f64 {
        let duration = PacketTime::new(self.flow).duration();
        if duration == 0.0 {
            return 0.0;
        }
        self.bytes(None) as f64 / duration
    }

    pub fn header_bytes(&self, direction: Option<Direction>) -> u64 {
        self.flow.packets_in(direction).map(|p| p.header_len() as u64).sum()
    }

    pub fn min_header_bytes(&self, direction: Option<Direction>) -> u64 {
        self.flow
            .packets_in(direction)
            .map(|p| p.header_len() as u64)
            .min()
            .unwrap_or(0)
    }

    pub fn mean_header_bytes(&self, direction: Option<Direction>) -> f64 {
        let count = self.flow.packets_in(direction).count();
        if count == 0 {
            return 0.0;
        }
        self.header_bytes(direction) as f64 / count as f64
    }

    pub fn bytes_per_bulk(&self, direction: Direction) -> f64 {
        let bulk = self.flow.bulk(direction);
        if bulk.count == 0 {
            return 0.0;
        }
        bulk.size as f64 / bulk.count as f64
    }

    pub fn packets_per_bulk(&self, direction: Direction) -> f64 {
        let bulk = self.flow.bulk(direction);
        if bulk.count == 0 {
            return 0.0;
        }
        bulk.packet_count as f64 / bulk.count as f64
    }

    /// Bulk bytes per second of bulk time.
    pub fn bulk_rate(&self, direction: Direction) -> f64 {
        let bulk = self.flow.bulk(direction);
        if bulk.count == 0 || bulk.duration <= 0.0 {
            return 0.0;
        }
        bulk.size as f64 / bulk.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    #[test]
    fn bytes_headers_and_rate() {
        let first = PacketRecord::tcp(0.0, 100).with_header_len(66);
        let mut flow = Flow::new(&first, Direction::Forward).unwrap();
        flow.add_packet(first, Direction::Forward);
        flow.add_packet(PacketRecord::tcp(1.0, 50).with_header_len(54), Direction::Forward);
        flow.add_packet(PacketRecord::tcp(2.0, 250).reversed(), Direction::Reverse);

        let bytes = FlowBytes::new(&flow);
        assert_eq!(bytes.bytes(None), 400);
        assert_eq!(bytes.bytes(Some(Direction::Forward)), 150);
        assert_eq!(bytes.rate(), 200.0);
        assert_eq!(bytes.header_bytes(Some(Direction::Forward)), 120);
        assert_eq!(bytes.min_header_bytes(Some(Direction::Forward)), 54);
        assert_eq!(bytes.mean_header_bytes(Some(Direction::Forward)), 60.0);
        assert_eq!(bytes.bytes_per_bulk(Direction::Forward), 0.0);
        assert_eq!(bytes.bulk_rate(Direction::Reverse), 0.0);
    }

    #[test]
    fn bulk_averages() {
        let first = PacketRecord::tcp(0.0, 100);
        let mut flow = Flow::new(&first, Direction::Forward).unwrap();
        for i in 0..5 {
            flow.add_packet(PacketRecord::tcp(i as f64 * 0.25, 100), Direction::Forward);
        }
        let bytes = FlowBytes::new(&flow);
        assert_eq!(bytes.bytes_per_bulk(Direction::Forward), 500.0);
        assert_eq!(bytes.packets_per_bulk(Direction::Forward), 5.0);
        assert_eq!(bytes.bulk_rate(Direction::Forward), 500.0);
    }
}
