use tracing::{debug, trace};

use crate::capture::Packet;
use crate::error::{FlowError, Result};
use crate::features::{
    FlagCount, FlowBytes, FlowFeatures, FlowMetrics, PacketCount, PacketLength, PacketTime, StatSummary,
    DEFAULT_FALLBACK,
};
use crate::types::{Direction, Protocol, TcpFlag};
use super::activity::ActivityTracker;
use super::bulk::{BulkDetector, BulkState};
use super::constants::MICROS_PER_SEC;
use super::key::FlowIdentity;

/// Validate a packet timestamp (seconds).
pub fn checked_time(timestamp: f64) -> Result<f64> {
    if timestamp.is_finite() && timestamp >= 0.0 {
        Ok(timestamp)
    } else {
        Err(FlowError::Timestamp(timestamp))
    }
}

/// One bidirectional flow and every statistic derived from its packets.
#[derive(Debug, Clone)]
pub struct Flow<P> {
    identity: FlowIdentity,
    packets: Vec<(P, Direction)>,

    // Timing, seconds
    start_timestamp: Option<f64>,
    latest_timestamp: Option<f64>,
    // Microseconds, one entry per packet after the first
    flow_interarrival_time: Vec<f64>,

    init_window_size: [u16; 2],
    activity: ActivityTracker,
    bulk: BulkDetector,
}

impl<P: Packet> Flow<P> {
    /// Freeze the flow identity from its first packet. The packet itself is
    /// not recorded; pass it to `add_packet` afterwards.
    pub fn new(packet: &P, direction: Direction) -> Result<Self> {
        let identity = FlowIdentity::from_packet(packet, direction)?;
        Ok(Self {
            identity,
            packets: Vec::new(),
            start_timestamp: None,
            latest_timestamp: None,
            flow_interarrival_time: Vec::new(),
            init_window_size: [0; 2],
            activity: ActivityTracker::new(),
            bulk: BulkDetector::new(),
        })
    }

    /// Same as `new` with a host-assigned flow id.
    pub fn with_id(packet: &P, direction: Direction, flow_id: u64) -> Result<Self> {
        let mut flow = Self::new(packet, direction)?;
        flow.identity.flow_id = Some(flow_id);
        Ok(flow)
    }

    pub fn add_packet(&mut self, packet: P, direction: Direction) {
        let time = checked_time(packet.timestamp());
        let payload_len = packet.payload_len();
        let tcp = packet.tcp();
        let protocol = packet.protocol();

        self.packets.push((packet, direction));

        match &time {
            Ok(t) => {
                self.bulk.update(direction, *t, payload_len);
                self.activity.update(*t, self.latest_timestamp);
            }
            Err(e) => debug!(error = %e, packets = self.packets.len(), "skipping bulk/activity update"),
        }

        if self.packets.len() > 1 {
            let iat = match (&time, self.latest_timestamp) {
                (Ok(t), Some(latest)) => MICROS_PER_SEC * (*t - latest),
                _ => 0.0,
            };
            self.flow_interarrival_time.push(iat);
        }

        if let Ok(t) = time {
            self.latest_timestamp = Some(self.latest_timestamp.map_or(t, |latest| latest.max(t)));
            if self.start_timestamp.is_none() {
                self.start_timestamp = Some(t);
            }
        }

        if let Some(tcp) = tcp {
            let window = &mut self.init_window_size[direction.index()];
            // FORWARD keeps its first window, REVERSE tracks the latest
            if direction == Direction::Reverse || *window == 0 {
                *window = tcp.window;
            }
        }

        if self.packets.len() == 1 && self.identity.protocol.is_none() {
            self.identity.protocol = protocol;
        }

        trace!(packets = self.packets.len(), ?direction, "packet added");
    }

    pub fn identity(&self) -> &FlowIdentity {
        &self.identity
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.identity.protocol
    }

    pub fn packets(&self) -> &[(P, Direction)] {
        &self.packets
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Packets of one direction, or all of them for `None`, in arrival order.
    pub fn packets_in(&self, direction: Option<Direction>) -> impl Iterator<Item = &P> + '_ {
        self.packets
            .iter()
            .filter(move |(_, d)| direction.map_or(true, |want| *d == want))
            .map(|(p, _)| p)
    }

    pub fn start_timestamp(&self) -> Option<f64> {
        self.start_timestamp
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.latest_timestamp
    }

    pub fn interarrival_times(&self) -> &[f64] {
        &self.flow_interarrival_time
    }

    /// FORWARD: window of the first TCP packet. REVERSE: latest window seen.
    pub fn init_window_size(&self, direction: Direction) -> u16 {
        self.init_window_size[direction.index()]
    }

    pub fn bulk(&self, direction: Direction) -> &BulkState {
        self.bulk.state(direction)
    }

    pub fn active(&self) -> &[f64] {
        self.activity.active()
    }

    pub fn idle(&self) -> &[f64] {
        self.activity.idle()
    }

    pub fn get_data(&self) -> FlowFeatures {
        self.get_data_with_fallback(DEFAULT_FALLBACK)
    }

    /// Materialize the feature vector. Fields that do not come out as
    /// finite numbers are replaced by `fallback`.
    pub fn get_data_with_fallback(&self, fallback: f64) -> FlowFeatures {
        use Direction::{Forward, Reverse};

        let flow_bytes = FlowBytes::new(self);
        let flags = FlagCount::new(self);
        let count = PacketCount::new(self);
        let length = PacketLength::new(self);
        let time = PacketTime::new(self);

        let micros = |gaps: Vec<f64>| gaps.into_iter().map(|g| g * MICROS_PER_SEC).collect::<Vec<_>>();
        let flow_iat = StatSummary::from_samples(&self.flow_interarrival_time);
        let fwd_iat = StatSummary::from_samples(&micros(time.packet_iat(Some(Forward))));
        let bwd_iat = StatSummary::from_samples(&micros(time.packet_iat(Some(Reverse))));
        let active = StatSummary::from_samples(self.active());
        let idle = StatSummary::from_samples(self.idle());

        let fwd_len = StatSummary::from_samples(&length.lengths(Some(Forward)));
        let bwd_len = StatSummary::from_samples(&length.lengths(Some(Reverse)));
        let all_len = StatSummary::from_samples(&length.lengths(None));

        let flag = |f: TcpFlag, d: Option<Direction>| flags.has_flag(f, d) as f64;

        let mut m = FlowMetrics {
            timestamp: time.timestamp(),
            flow_duration: MICROS_PER_SEC * time.duration(),
            flow_byts_s: flow_bytes.rate(),
            flow_pkts_s: count.rate(None),
            fwd_pkts_s: count.rate(Some(Forward)),
            bwd_pkts_s: count.rate(Some(Reverse)),
            tot_fwd_pkts: count.total(Some(Forward)) as f64,
            tot_bwd_pkts: count.total(Some(Reverse)) as f64,
            totlen_fwd_pkts: fwd_len.total,
            totlen_bwd_pkts: bwd_len.total,
            fwd_pkt_len_max: fwd_len.max,
            fwd_pkt_len_min: fwd_len.min,
            fwd_pkt_len_mean: fwd_len.mean,
            fwd_pkt_len_std: fwd_len.std,
            bwd_pkt_len_max: bwd_len.max,
            bwd_pkt_len_min: bwd_len.min,
            bwd_pkt_len_mean: bwd_len.mean,
            bwd_pkt_len_std: bwd_len.std,
            pkt_len_max: all_len.max,
            pkt_len_min: all_len.min,
            pkt_len_mean: all_len.mean,
            pkt_len_std: all_len.std,
            pkt_len_var: length.var(None),
            fwd_header_len: flow_bytes.header_bytes(Some(Forward)) as f64,
            bwd_header_len: flow_bytes.header_bytes(Some(Reverse)) as f64,
            fwd_seg_size_min: flow_bytes.min_header_bytes(Some(Forward)) as f64,
            fwd_act_data_pkts: count.has_payload(Some(Forward)) as f64,
            flow_iat_mean: flow_iat.mean,
            flow_iat_max: flow_iat.max,
            flow_iat_min: flow_iat.min,
            flow_iat_std: flow_iat.std,
            fwd_iat_tot: fwd_iat.total,
            fwd_iat_max: fwd_iat.max,
            fwd_iat_min: fwd_iat.min,
            fwd_iat_mean: fwd_iat.mean,
            fwd_iat_std: fwd_iat.std,
            bwd_iat_tot: bwd_iat.total,
            bwd_iat_max: bwd_iat.max,
            bwd_iat_min: bwd_iat.min,
            bwd_iat_mean: bwd_iat.mean,
            bwd_iat_std: bwd_iat.std,
            fwd_psh_flags: flag(TcpFlag::Psh, Some(Forward)),
            bwd_psh_flags: flag(TcpFlag::Psh, Some(Reverse)),
            fwd_urg_flags: flag(TcpFlag::Urg, Some(Forward)),
            bwd_urg_flags: flag(TcpFlag::Urg, Some(Reverse)),
            fin_flag_cnt: flag(TcpFlag::Fin, None),
            syn_flag_cnt: flag(TcpFlag::Syn, None),
            rst_flag_cnt: flag(TcpFlag::Rst, None),
            psh_flag_cnt: flag(TcpFlag::Psh, None),
            ack_flag_cnt: flag(TcpFlag::Ack, None),
            urg_flag_cnt: flag(TcpFlag::Urg, None),
            ece_flag_cnt: flag(TcpFlag::Ece, None),
            cwr_flag_cnt: flag(TcpFlag::Cwr, None),
            down_up_ratio: count.down_up_ratio(),
            pkt_size_avg: length.avg(),
            init_fwd_win_byts: self.init_window_size(Forward) as f64,
            init_bwd_win_byts: self.init_window_size(Reverse) as f64,
            active_max: active.max,
            active_min: active.min,
            active_mean: active.mean,
            active_std: active.std,
            idle_max: idle.max,
            idle_min: idle.min,
            idle_mean: idle.mean,
            idle_std: idle.std,
            fwd_byts_b_avg: flow_bytes.bytes_per_bulk(Forward),
            fwd_pkts_b_avg: flow_bytes.packets_per_bulk(Forward),
            bwd_byts_b_avg: flow_bytes.bytes_per_bulk(Reverse),
            bwd_pkts_b_avg: flow_bytes.packets_per_bulk(Reverse),
            fwd_blk_rate_avg: flow_bytes.bulk_rate(Forward),
            bwd_blk_rate_avg: flow_bytes.bulk_rate(Reverse),
            forward_bulk_count: self.bulk(Forward).count as f64,
            backward_bulk_count: self.bulk(Reverse).count as f64,
            ..Default::default()
        };

        // Columns duplicated for dataset compatibility
        m.fwd_seg_size_avg = m.fwd_pkt_len_mean;
        m.bwd_seg_size_avg = m.bwd_pkt_len_mean;
        m.cwe_flag_count = m.fwd_urg_flags;
        m.subflow_fwd_pkts = m.tot_fwd_pkts;
        m.subflow_bwd_pkts = m.tot_bwd_pkts;
        m.subflow_fwd_byts = m.totlen_fwd_pkts;
        m.subflow_bwd_byts = m.totlen_bwd_pkts;

        if self.protocol() != Some(Protocol::Tcp) {
            m.clear_tcp_fields();
        }

        let replaced = m.coerce_all(fallback);
        if replaced > 0 {
            debug!(replaced, flow_id = ?self.identity.flow_id, "non-finite features replaced");
        }

        FlowFeatures { identity: self.identity.clone(), metrics: m }
    }
}
