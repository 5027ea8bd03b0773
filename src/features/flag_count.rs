use crate::capture::Packet;
use crate::processor::Flow;
use crate::types::{Direction, TcpFlag};

/// TCP flag occurrence counts of a flow.
pub struct FlagCount<'a, P> {
    flow: &'a Flow<P>,
}

impl<'a, P: Packet> FlagCount<'a, P> {
    pub fn new(flow: &'a Flow<P>) -> Self {
        Self { flow }
    }

    /// Packets of `direction` (all for `None`) carrying `flag`.
    pub fn has_flag(&self, flag: TcpFlag, direction: Option<Direction>) -> usize {
        self.flow
            .packets_in(direction)
            .filter_map(|p| p.tcp())
            .filter(|tcp| flag.is_set(tcp.flags))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    #[test]
    fn counts_flags_per_direction() {
        let syn = PacketRecord::tcp(0.0, 0).with_flags(0x02);
        let mut flow = Flow::new(&syn, Direction::Forward).unwrap();
        flow.add_packet(syn, Direction::Forward);
        flow.add_packet(PacketRecord::tcp(0.1, 0).with_flags(0x12).reversed(), Direction::Reverse);
        flow.add_packet(PacketRecord::tcp(0.2, 10).with_flags(0x18), Direction::Forward);

        let flags = FlagCount::new(&flow);
        assert_eq!(flags.has_flag(TcpFlag::Syn, None), 2);
        assert_eq!(flags.has_flag(TcpFlag::Ack, None), 2);
        assert_eq!(flags.has_flag(TcpFlag::Ack, Some(Direction::Forward)), 1);
        assert_eq!(flags.has_flag(TcpFlag::Psh, Some(Direction::Reverse)), 0);
        assert_eq!(flags.has_flag(TcpFlag::Fin, None), 0);
    }
}
