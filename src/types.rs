use serde::{Serialize, Deserialize};

/// Direction of a packet relative to the first packet seen for its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction { Forward, Reverse }

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    /// Slot used by per-direction `[T; 2]` state.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Icmp,
    Tcp,
    Udp,
    Icmpv6,
    Other(u8),
}

impl Protocol {
    pub fn from_number(number: u8) -> Self {
        match number {
            1 => Protocol::Icmp,
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            58 => Protocol::Icmpv6,
            n => Protocol::Other(n),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Protocol::Icmp => 1,
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Icmpv6 => 58,
            Protocol::Other(n) => n,
        }
    }
}

/// TCP control flags, valued by their bit in the flags octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpFlag {
    Fin = 0x01,
    Syn = 0x02,
    Rst = 0x04,
    Psh = 0x08,
    Ack = 0x10,
    Urg = 0x20,
    Ece = 0x40,
    Cwr = 0x80,
}

impl TcpFlag {
    #[inline]
    pub fn is_set(self, flags: u8) -> bool {
        flags & (self as u8) != 0
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct EngineStats {
    pub flow_count: i64,
    pub packets_per_second: f64,
    pub bytes_per_second: f64,
    pub total_packets: i64,
    pub total_bytes: i64,
    pub flows_emitted: i64,
    pub parse_errors: i64,
    pub uptime_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_index_and_opposite() {
        assert_eq!(Direction::Forward.index(), 0);
        assert_eq!(Direction::Reverse.index(), 1);
        assert_eq!(Direction::Forward.opposite(), Direction::Reverse);
    }

    #[test]
    fn protocol_numbers_round_trip_known_values() {
        assert_eq!(Protocol::from_number(6), Protocol::Tcp);
        assert_eq!(Protocol::from_number(17).number(), 17);
        assert_eq!(Protocol::from_number(132), Protocol::Other(132));
    }

    #[test]
    fn tcp_flag_bits() {
        let flags = 0x12; // SYN | ACK
        assert!(TcpFlag::Syn.is_set(flags));
        assert!(TcpFlag::Ack.is_set(flags));
        assert!(!TcpFlag::Fin.is_set(flags));
    }
}
