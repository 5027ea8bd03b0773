use std::net::IpAddr;

use serde::{Serialize, Serializer};

use crate::capture::{Endpoints, Packet};
use crate::error::{FlowError, Result};
use crate::types::{Direction, Protocol};

#[derive(Debug, Clone, Hash, PartialEq, Eq, Copy)]
pub struct FlowKey {
    pub ip_a: IpAddr,
    pub ip_b: IpAddr,
    pub port_a: u16,
    pub port_b: u16,
    pub protocol: u8,
}

impl FlowKey {
    pub fn new(src_ip: IpAddr, dst_ip: IpAddr, src_port: u16, dst_port: u16, protocol: u8) -> Self {
        // Normalize flow key so both directions map to the same entry
        if (src_ip, src_port) <= (dst_ip, dst_port) {
            Self { ip_a: src_ip, ip_b: dst_ip, port_a: src_port, port_b: dst_port, protocol }
        } else {
            Self { ip_a: dst_ip, ip_b: src_ip, port_a: dst_port, port_b: src_port, protocol }
        }
    }

    pub fn from_packet<P: Packet>(packet: &P) -> Result<Self> {
        let ep = packet.endpoints().ok_or_else(|| FlowError::FlowKey(describe(packet)))?;
        let protocol = packet.protocol().map_or(0, Protocol::number);
        Ok(Self::new(ep.src_ip, ep.dst_ip, ep.src_port, ep.dst_port, protocol))
    }
}

/// Immutable identity of a flow, oriented from the forward side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowIdentity {
    pub flow_id: Option<u64>,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    #[serde(serialize_with = "serialize_mac")]
    pub src_mac: Option<[u8; 6]>,
    #[serde(serialize_with = "serialize_mac")]
    pub dst_mac: Option<[u8; 6]>,
    pub src_port: u16,
    pub dst_port: u16,
    #[serde(serialize_with = "serialize_protocol")]
    pub protocol: Option<Protocol>,
    pub icmp_type: Option<u8>,
    pub icmp_code: Option<u8>,
}

impl FlowIdentity {
    pub const COLUMNS: [&'static str; 10] = [
        "flow_id", "src_ip", "dst_ip", "src_mac", "dst_mac",
        "src_port", "dst_port", "protocol", "icmp_type", "icmp_code",
    ];

    /// Orient the packet's addressing so that `src` is the forward side.
    pub fn from_packet<P: Packet>(packet: &P, direction: Direction) -> Result<Self> {
        let ep = packet.endpoints().ok_or_else(|| FlowError::FlowKey(describe(packet)))?;
        let Endpoints { src_ip, dst_ip, src_port, dst_port, src_mac, dst_mac } = match direction {
            Direction::Forward => ep,
            Direction::Reverse => Endpoints {
                src_ip: ep.dst_ip,
                dst_ip: ep.src_ip,
                src_port: ep.dst_port,
                dst_port: ep.src_port,
                src_mac: ep.dst_mac,
                dst_mac: ep.src_mac,
            },
        };
        let icmp = packet.icmp();

        Ok(Self {
            flow_id: None,
            src_ip,
            dst_ip,
            src_mac,
            dst_mac,
            src_port,
            dst_port,
            protocol: packet.protocol(),
            icmp_type: icmp.map(|i| i.icmp_type),
            icmp_code: icmp.map(|i| i.code),
        })
    }

    pub fn protocol_number(&self) -> u8 {
        self.protocol.map_or(0, Protocol::number)
    }

    pub fn key(&self) -> FlowKey {
        FlowKey::new(self.src_ip, self.dst_ip, self.src_port, self.dst_port, self.protocol_number())
    }

    /// Direction of a packet of this flow, judged by its source endpoint.
    pub fn direction_of(&self, endpoints: &Endpoints) -> Direction {
        if endpoints.src_ip == self.src_ip && endpoints.src_port == self.src_port {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    pub fn csv_fields(&self) -> Vec<String> {
        vec![
            self.flow_id.map(|id| id.to_string()).unwrap_or_default(),
            self.src_ip.to_string(),
            self.dst_ip.to_string(),
            self.src_mac.map(format_mac).unwrap_or_default(),
            self.dst_mac.map(format_mac).unwrap_or_default(),
            self.src_port.to_string(),
            self.dst_port.to_string(),
            self.protocol_number().to_string(),
            self.icmp_type.unwrap_or(0).to_string(),
            self.icmp_code.unwrap_or(0).to_string(),
        ]
    }
}

pub fn format_mac(mac: [u8; 6]) -> String {
    mac.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(":")
}

fn serialize_mac<S: Serializer>(mac: &Option<[u8; 6]>, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&mac.map(format_mac).unwrap_or_default())
}

fn serialize_protocol<S: Serializer>(protocol: &Option<Protocol>, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u8(protocol.map_or(0, Protocol::number))
}

fn describe<P: Packet>(packet: &P) -> String {
    format!(
        "packet at t={} ({} payload bytes, protocol {:?}) has no addressable endpoints",
        packet.timestamp(),
        packet.payload_len(),
        packet.protocol()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PacketRecord;

    #[test]
    fn key_is_direction_independent() {
        let out = PacketRecord::tcp(0.0, 10);
        let back = out.clone().reversed();
        assert_eq!(FlowKey::from_packet(&out).unwrap(), FlowKey::from_packet(&back).unwrap());
    }

    #[test]
    fn reverse_first_packet_swaps_identity() {
        let pkt = PacketRecord::tcp(0.0, 10).reversed();
        let id = FlowIdentity::from_packet(&pkt, Direction::Reverse).unwrap();
        assert_eq!(id.src_port, 40000);
        assert_eq!(id.dst_port, 80);
        assert_eq!(id.src_mac, Some([0x02, 0, 0, 0, 0, 0x01]));
    }

    #[test]
    fn missing_endpoints_is_a_key_error() {
        let pkt = PacketRecord::tcp(0.0, 10).with_endpoints(None);
        assert!(matches!(FlowKey::from_packet(&pkt), Err(FlowError::FlowKey(_))));
        assert!(FlowIdentity::from_packet(&pkt, Direction::Forward).is_err());
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(format_mac([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]), "de:ad:be:ef:00:01");
    }
}
