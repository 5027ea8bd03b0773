use std::net::IpAddr;

use crate::types::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpInfo {
    pub flags: u8,
    pub window: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpInfo {
    pub icmp_type: u8,
    pub code: u8,
}

/// Addressing of a single packet as it was seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub src_mac: Option<[u8; 6]>,
    pub dst_mac: Option<[u8; 6]>,
}

/// Everything the flow engine reads from a packet.
///
/// Capture backends implement this for their own packet type; the engine
/// never looks past it.
pub trait Packet {
    /// Arrival time in seconds. Non-finite or negative values are treated
    /// as missing.
    fn timestamp(&self) -> f64;

    fn payload_len(&self) -> usize;

    /// Link + network + transport header bytes.
    fn header_len(&self) -> usize;

    /// `None` when the parsing layer could not tell.
    fn protocol(&self) -> Option<Protocol>;

    fn tcp(&self) -> Option<TcpInfo>;

    fn icmp(&self) -> Option<IcmpInfo>;

    /// `None` when no flow key can be derived from this packet.
    fn endpoints(&self) -> Option<Endpoints>;
}
