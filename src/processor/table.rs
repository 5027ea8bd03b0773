use std::collections::HashMap;

use tracing::{debug, warn};

use crate::capture::Packet;
use crate::config::EngineConfig;
use crate::error::{FlowError, Result};
use crate::features::FlowFeatures;
use crate::types::{Direction, TcpFlag};
use super::flow::{checked_time, Flow};
use super::key::FlowKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub flows_created: u64,
    pub flows_emitted: u64,
    pub evictions: u64,
}

/// Demultiplexes packets into flows and decides when a flow is finished.
///
/// Single owner; wrap it in a thread or a lock to share it.
pub struct FlowTable<P> {
    config: EngineConfig,
    flows: HashMap<FlowKey, Flow<P>>,
    next_id: u64,
    clock: f64,
    stats: TableStats,
}

impl<P: Packet> FlowTable<P> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            flows: HashMap::new(),
            next_id: 1,
            clock: 0.0,
            stats: TableStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Latest packet time seen by the table, seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn get(&self, key: &FlowKey) -> Option<&Flow<P>> {
        self.flows.get(key)
    }

    /// Route one packet to its flow. Returns the features of every flow the
    /// packet finished: a stale flow it replaced, an evicted one, or its own
    /// flow when it carried a FIN.
    pub fn ingest(&mut self, packet: P) -> Result<Vec<FlowFeatures>> {
        let endpoints = packet.endpoints().ok_or_else(|| {
            FlowError::FlowKey(format!("packet at t={} has no endpoints", packet.timestamp()))
        })?;
        let key = FlowKey::from_packet(&packet)?;
        let time = checked_time(packet.timestamp()).ok();
        if let Some(t) = time {
            self.clock = self.clock.max(t);
        }

        let mut finished = Vec::new();

        // A long silence means the old conversation is over
        let stale = match (time, self.flows.get(&key).and_then(|f| f.latest_timestamp())) {
            (Some(t), Some(latest)) => t - latest > self.config.expired_update_secs,
            _ => false,
        };
        if stale {
            if let Some(old) = self.flows.remove(&key) {
                debug!(?key, "flow replaced after inactivity");
                finished.push(self.emit(old));
            }
        }

        if !self.flows.contains_key(&key) {
            if self.config.max_flows > 0 && self.flows.len() >= self.config.max_flows {
                if let Some(evicted) = self.evict_oldest() {
                    finished.push(evicted);
                }
            }
            let flow = Flow::with_id(&packet, Direction::Forward, self.next_id)?;
            debug!(flow_id = self.next_id, ?key, "flow created");
            self.next_id += 1;
            self.stats.flows_created += 1;
            self.flows.insert(key, flow);
        }

        let has_fin = packet.tcp().map_or(false, |tcp| TcpFlag::Fin.is_set(tcp.flags));
        if let Some(flow) = self.flows.get_mut(&key) {
            let direction = flow.identity().direction_of(&endpoints);
            flow.add_packet(packet, direction);
        }

        if has_fin && self.config.close_on_fin {
            if let Some(flow) = self.flows.remove(&key) {
                debug!(?key, "flow closed by FIN");
                finished.push(self.emit(flow));
            }
        }

        Ok(finished)
    }

    /// Flush flows whose latest packet is older than the flow timeout at `now` (seconds).
    pub fn expire(&mut self, now: f64) -> Vec<FlowFeatures> {
        let timeout = self.config.flow_timeout_secs;
        let expired: Vec<FlowKey> = self
            .flows
            .iter()
            .filter(|(_, flow)| flow.latest_timestamp().map_or(true, |latest| now - latest > timeout))
            .map(|(key, _)| *key)
            .collect();

        let mut finished = Vec::with_capacity(expired.len());
        for key in expired {
            if let Some(flow) = self.flows.remove(&key) {
                debug!(?key, "flow expired");
                finished.push(self.emit(flow));
            }
        }
        finished
    }

    pub fn flush_all(&mut self) -> Vec<FlowFeatures> {
        let flows: Vec<Flow<P>> = self.flows.drain().map(|(_, flow)| flow).collect();
        flows.into_iter().map(|flow| self.emit(flow)).collect()
    }

    fn evict_oldest(&mut self) -> Option<FlowFeatures> {
        let oldest = self
            .flows
            .iter()
            .min_by(|(_, a), (_, b)| {
                let a = a.latest_timestamp().unwrap_or(f64::NEG_INFINITY);
                let b = b.latest_timestamp().unwrap_or(f64::NEG_INFINITY);
                a.total_cmp(&b)
            })
            .map(|(key, _)| *key)?;

        let flow = self.flows.remove(&oldest)?;
        warn!(key = ?oldest, capacity = self.config.max_flows, "flow table full, evicting oldest flow");
        self.stats.evictions += 1;
        Some(self.emit(flow))
    }

    fn emit(&mut self, flow: Flow<P>) -> FlowFeatures {
        self.stats.flows_emitted += 1;
        flow.get_data_with_fallback(self.config.coercion_fallback)
    }
}
