mod packet;
mod parser;
mod record;

pub use packet::{Endpoints, IcmpInfo, Packet, TcpInfo};
pub use parser::ParsedPacket;
pub use record::PacketRecord;
