use std::net::{IpAddr, Ipv4Addr};

use crate::types::Protocol;
use super::packet::{Endpoints, IcmpInfo, Packet, TcpInfo};

/// Plain owned packet description for sources that are not raw frames
/// (replayed logs, OpenFlow counters, synthetic traffic).
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    pub timestamp: f64,
    pub payload_len: usize,
    pub header_len: usize,
    pub protocol: Option<Protocol>,
    pub tcp: Option<TcpInfo>,
    pub icmp: Option<IcmpInfo>,
    pub endpoints: Option<Endpoints>,
}

impl PacketRecord {
    /// TCP packet between two fixed hosts, client to server, no flags set.
    pub fn tcp(timestamp: f64, payload_len: usize) -> Self {
        Self {
            timestamp,
            payload_len,
            header_len: 54,
            protocol: Some(Protocol::Tcp),
            tcp: Some(TcpInfo { flags: 0, window: 0 }),
            icmp: None,
            endpoints: Some(default_endpoints()),
        }
    }

    pub fn udp(timestamp: f64, payload_len: usize) -> Self {
        Self {
            header_len: 42,
            protocol: Some(Protocol::Udp),
            tcp: None,
            ..Self::tcp(timestamp, payload_len)
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        let window = self.tcp.map_or(0, |t| t.window);
        self.tcp = Some(TcpInfo { flags, window });
        self
    }

    pub fn with_window(mut self, window: u16) -> Self {
        let flags = self.tcp.map_or(0, |t| t.flags);
        self.tcp = Some(TcpInfo { flags, window });
        self
    }

    pub fn with_header_len(mut self, header_len: usize) -> Self {
        self.header_len = header_len;
        self
    }

    pub fn with_icmp(mut self, icmp_type: u8, code: u8) -> Self {
        self.protocol = Some(Protocol::Icmp);
        self.tcp = None;
        self.icmp = Some(IcmpInfo { icmp_type, code });
        self
    }

    pub fn with_protocol(mut self, protocol: Option<Protocol>) -> Self {
        self.protocol = protocol;
        self
    }

    /// Swap source and destination, as the server's answer would carry.
    pub fn reversed(mut self) -> Self {
        if let Some(ep) = self.endpoints.as_mut() {
            std::mem::swap(&mut ep.src_ip, &mut ep.dst_ip);
            std::mem::swap(&mut ep.src_port, &mut ep.dst_port);
            std::mem::swap(&mut ep.src_mac, &mut ep.dst_mac);
        }
        self
    }

    pub fn with_endpoints(mut self, endpoints: Option<Endpoints>) -> Self {
        self.endpoints = endpoints;
        self
    }
}

fn default_endpoints() -> Endpoints {
    Endpoints {
        src_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        dst_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        src_port: 40000,
        dst_port: 80,
        src_mac: Some([0x02, 0, 0, 0, 0, 0x01]),
        dst_mac: Some([0x02, 0, 0, 0, 0, 0x02]),
    }
}

impl Packet for PacketRecord {
    fn timestamp(&self) -> f64 { self.timestamp }

    fn payload_len(&self) -> usize { self.payload_len }

    fn header_len(&self) -> usize { self.header_len }

    fn protocol(&self) -> Option<Protocol> { self.protocol }

    fn tcp(&self) -> Option<TcpInfo> { self.tcp }

    fn icmp(&self) -> Option<IcmpInfo> { self.icmp }

    fn endpoints(&self) -> Option<Endpoints> { self.endpoints }
}
