use crossbeam_channel::{select, tick, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::capture::Packet;
use crate::config::EngineConfig;
use crate::features::FlowFeatures;
use crate::types::EngineStats;
use super::table::FlowTable;

fn send_all(features_tx: &Sender<FlowFeatures>, finished: Vec<FlowFeatures>) {
    for features in finished {
        if features_tx.send(features).is_err() {
            warn!("feature receiver dropped, discarding flow");
        }
    }
}

/// Drive a `FlowTable` from `packet_rx` until `running` is cleared or every
/// packet sender is gone. Finished flows go to `features_tx`; remaining flows
/// are flushed on exit.
pub fn processing_loop<P: Packet>(
    running: Arc<AtomicBool>,
    config: EngineConfig,
    packet_rx: Receiver<P>,
    features_tx: Sender<FlowFeatures>,
    stats_tx: Sender<EngineStats>,
) {
    let started = Instant::now();

    // Timers to expire idle flows and to publish stats
    let expire_tick = tick(config.expire_tick());
    let stats_tick = tick(config.stats_tick());

    let mut table: FlowTable<P> = FlowTable::new(config);
    let mut last_packet_at = Instant::now();

    let mut last_rate = Instant::now();
    let mut pkts_acc: u64 = 0;
    let mut bytes_acc: u64 = 0;

    let mut stats = EngineStats::default();

    loop {
        // While we're running
        if !running.load(Ordering::Relaxed) { break; }

        select! {
            recv(packet_rx) -> msg => {
                let Ok(pkt) = msg else {
                    debug!("packet channel closed");
                    break;
                };
                let payload = pkt.payload_len() as u64;
                match table.ingest(pkt) {
                    Ok(finished) => {
                        stats.flows_emitted += finished.len() as i64;
                        send_all(&features_tx, finished);
                    }
                    Err(e) => {
                        stats.parse_errors += 1;
                        debug!(error = %e, "packet dropped");
                    }
                }
                last_packet_at = Instant::now();

                pkts_acc += 1;
                bytes_acc += payload;
                stats.total_packets += 1;
                stats.total_bytes += payload as i64;
            },

            recv(expire_tick) -> _ => {
                // Packet clock advanced by the wall time since the last packet
                let now = table.clock() + last_packet_at.elapsed().as_secs_f64();
                let expired = table.expire(now);
                stats.flows_emitted += expired.len() as i64;
                send_all(&features_tx, expired);
            },

            recv(stats_tick) -> _ => {
                let dt = last_rate.elapsed().as_secs_f64().max(1e-6);
                stats.flow_count = table.len() as i64;
                stats.packets_per_second = pkts_acc as f64 / dt;
                stats.bytes_per_second = bytes_acc as f64 / dt;
                stats.uptime_seconds = started.elapsed().as_secs() as i64;

                let _ = stats_tx.try_send(stats.clone());
                pkts_acc = 0;
                bytes_acc = 0;
                last_rate = Instant::now();
            },
        }
    }

    // Packets already queued still belong to their flows
    while let Ok(pkt) = packet_rx.try_recv() {
        let payload = pkt.payload_len() as u64;
        match table.ingest(pkt) {
            Ok(finished) => {
                stats.flows_emitted += finished.len() as i64;
                send_all(&features_tx, finished);
            }
            Err(_) => stats.parse_errors += 1,
        }
        stats.total_packets += 1;
        stats.total_bytes += payload as i64;
    }

    let remaining = table.flush_all();
    info!(flows = remaining.len(), created = table.stats().flows_created, "processing loop exiting, flushing flows");
    stats.flows_emitted += remaining.len() as i64;
    send_all(&features_tx, remaining);

    // Final snapshot so the totals include the shutdown flush
    stats.flow_count = 0;
    stats.packets_per_second = 0.0;
    stats.bytes_per_second = 0.0;
    stats.uptime_seconds = started.elapsed().as_secs() as i64;
    let _ = stats_tx.try_send(stats);
}
