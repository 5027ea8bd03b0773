use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use etherparse::{Ethernet2Header, Ipv6Header, LinkHeader, NetHeaders, PacketHeaders, TransportHeader, UdpHeader};

use crate::error::{FlowError, Result};
use crate::types::Protocol;
use super::packet::{Endpoints, IcmpInfo, Packet, TcpInfo};

/// A packet decoded from an Ethernet frame, carrying only what the flow
/// engine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPacket {
    pub timestamp: f64,
    pub endpoints: Endpoints,
    pub protocol: Protocol,
    pub packet_len: usize,
    pub payload_len: usize,
    pub header_len: usize,
    pub tcp: Option<TcpInfo>,
    pub icmp: Option<IcmpInfo>,
}

impl ParsedPacket {
    /// Decode `data` captured at `timestamp` (seconds).
    pub fn from_ethernet(timestamp: f64, data: &[u8]) -> Result<Self> {
        let parsed = PacketHeaders::from_ethernet_slice(data)
            .map_err(|e| FlowError::Parse(format!("failed to parse frame: {e}")))?;

        let (src_mac, dst_mac, link_len) = match &parsed.link {
            Some(LinkHeader::Ethernet2(eth)) => (Some(eth.source), Some(eth.destination), Ethernet2Header::LEN),
            _ => (None, None, 0),
        };

        let (src_ip, dst_ip, ip_protocol, ip_header_len) = match &parsed.net {
            Some(NetHeaders::Ipv4(ipv4, _)) => (
                IpAddr::V4(Ipv4Addr::from(ipv4.source)),
                IpAddr::V4(Ipv4Addr::from(ipv4.destination)),
                ipv4.protocol.0,
                ipv4.header_len(),
            ),
            Some(NetHeaders::Ipv6(ipv6, _)) => (
                IpAddr::V6(Ipv6Addr::from(ipv6.source)),
                IpAddr::V6(Ipv6Addr::from(ipv6.destination)),
                ipv6.next_header.0,
                Ipv6Header::LEN,
            ),
            _ => return Err(FlowError::Parse("not an IP packet".into())),
        };

        let mut src_port = 0;
        let mut dst_port = 0;
        let mut tcp = None;
        let mut icmp = None;
        let transport_len = match &parsed.transport {
            Some(TransportHeader::Tcp(header)) => {
                src_port = header.source_port;
                dst_port = header.destination_port;
                let flags = (header.cwr as u8) << 7
                    | (header.ece as u8) << 6
                    | (header.urg as u8) << 5
                    | (header.ack as u8) << 4
                    | (header.psh as u8) << 3
                    | (header.rst as u8) << 2
                    | (header.syn as u8) << 1
                    | (header.fin as u8);
                tcp = Some(TcpInfo { flags, window: header.window_size });
                header.data_offset() as usize * 4
            }
            Some(TransportHeader::Udp(header)) => {
                src_port = header.source_port;
                dst_port = header.destination_port;
                UdpHeader::LEN
            }
            Some(TransportHeader::Icmpv4(header)) => {
                // Icmpv4Type has no raw accessors; type and code lead the wire header
                let bytes = header.to_bytes();
                icmp = Some(IcmpInfo { icmp_type: bytes[0], code: bytes[1] });
                header.header_len()
            }
            Some(TransportHeader::Icmpv6(header)) => {
                icmp = Some(IcmpInfo {
                    icmp_type: header.icmp_type.type_u8(),
                    code: header.icmp_type.code_u8(),
                });
                header.header_len()
            }
            None => 0,
        };

        let protocol = match &parsed.transport {
            Some(TransportHeader::Tcp(_)) => Protocol::Tcp,
            Some(TransportHeader::Udp(_)) => Protocol::Udp,
            Some(TransportHeader::Icmpv4(_)) => Protocol::Icmp,
            Some(TransportHeader::Icmpv6(_)) => Protocol::Icmpv6,
            None => Protocol::from_number(ip_protocol),
        };

        Ok(Self {
            timestamp,
            endpoints: Endpoints { src_ip, dst_ip, src_port, dst_port, src_mac, dst_mac },
            protocol,
            packet_len: data.len(),
            payload_len: parsed.payload.slice().len(),
            header_len: link_len + ip_header_len + transport_len,
            tcp,
            icmp,
        })
    }
}

impl Packet for ParsedPacket {
    fn timestamp(&self) -> f64 { self.timestamp }

    fn payload_len(&self) -> usize { self.payload_len }

    fn header_len(&self) -> usize { self.header_len }

    fn protocol(&self) -> Option<Protocol> { Some(self.protocol) }

    fn tcp(&self) -> Option<TcpInfo> { self.tcp }

    fn icmp(&self) -> Option<IcmpInfo> { self.icmp }

    fn endpoints(&self) -> Option<Endpoints> { Some(self.endpoints) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherparse::icmpv4::DestUnreachableHeader;
    use etherparse::{Icmpv4Type, PacketBuilder};

    const MAC_A: [u8; 6] = [0x02, 0, 0, 0, 0, 0x01];
    const MAC_B: [u8; 6] = [0x02, 0, 0, 0, 0, 0x02];

    #[test]
    fn parses_tcp_frame() {
        let payload = [7u8; 120];
        let builder = PacketBuilder::ethernet2(MAC_A, MAC_B)
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(40000, 80, 1, 29200)
            .syn()
            .psh();
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut frame, &payload).unwrap();

        let pkt = ParsedPacket::from_ethernet(1.5, &frame).unwrap();
        assert_eq!(pkt.protocol, Protocol::Tcp);
        assert_eq!(pkt.payload_len, 120);
        assert_eq!(pkt.header_len, 14 + 20 + 20);
        assert_eq!(pkt.endpoints.src_port, 40000);
        assert_eq!(pkt.endpoints.dst_port, 80);
        assert_eq!(pkt.endpoints.src_mac, Some(MAC_A));
        let tcp = pkt.tcp.unwrap();
        assert_eq!(tcp.window, 29200);
        assert_eq!(tcp.flags, 0x02 | 0x08);
        assert!(pkt.icmp.is_none());
    }

    #[test]
    fn parses_udp_frame_without_tcp_layer() {
        let builder = PacketBuilder::ethernet2(MAC_A, MAC_B)
            .ipv4([192, 168, 0, 5], [8, 8, 8, 8], 64)
            .udp(5353, 53);
        let mut frame = Vec::new();
        builder.write(&mut frame, &[1, 2, 3, 4]).unwrap();

        let pkt = ParsedPacket::from_ethernet(0.0, &frame).unwrap();
        assert_eq!(pkt.protocol, Protocol::Udp);
        assert_eq!(pkt.payload_len, 4);
        assert_eq!(pkt.header_len, 14 + 20 + 8);
        assert!(pkt.tcp.is_none());
    }

    #[test]
    fn parses_icmp_echo() {
        let builder = PacketBuilder::ethernet2(MAC_A, MAC_B)
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .icmpv4_echo_request(1, 1);
        let mut frame = Vec::new();
        builder.write(&mut frame, &[0u8; 32]).unwrap();

        let pkt = ParsedPacket::from_ethernet(0.0, &frame).unwrap();
        assert_eq!(pkt.protocol, Protocol::Icmp);
        assert_eq!(pkt.icmp, Some(IcmpInfo { icmp_type: 8, code: 0 }));
        assert_eq!(pkt.endpoints.src_port, 0);
    }

    #[test]
    fn parses_icmp_code_byte() {
        let builder = PacketBuilder::ethernet2(MAC_A, MAC_B)
            .ipv4([10, 0, 0, 2], [10, 0, 0, 1], 64)
            .icmpv4(Icmpv4Type::DestinationUnreachable(DestUnreachableHeader::Port));
        let mut frame = Vec::new();
        builder.write(&mut frame, &[0u8; 28]).unwrap();

        let pkt = ParsedPacket::from_ethernet(0.0, &frame).unwrap();
        assert_eq!(pkt.protocol, Protocol::Icmp);
        assert_eq!(pkt.icmp, Some(IcmpInfo { icmp_type: 3, code: 3 }));
        assert_eq!(pkt.header_len, 14 + 20 + 8);
    }

    #[test]
    fn rejects_truncated_frame() {
        assert!(ParsedPacket::from_ethernet(0.0, &[0u8; 6]).is_err());
    }
}
