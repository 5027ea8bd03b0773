use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::capture::{Packet, ParsedPacket};
use crate::config::EngineConfig;
use crate::error::{FlowError, Result};
use crate::features::FlowFeatures;
use crate::types::EngineStats;
use super::engine;

/// Owns the processing thread that turns packets into flow features.
pub struct FeatureProcessor<P = ParsedPacket> {
    config: EngineConfig,
    running: Arc<AtomicBool>,
    processing_thread: Option<JoinHandle<()>>,
    packet_tx: Sender<P>,
    packet_rx: Receiver<P>,
}

impl<P: Packet + Send + 'static> FeatureProcessor<P> {
    pub fn new(config: EngineConfig) -> Self {
        let (packet_tx, packet_rx) = unbounded();
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            processing_thread: None,
            packet_tx,
            packet_rx,
        }
    }

    /// Handle for the capture side.
    pub fn sender(&self) -> Sender<P> { self.packet_tx.clone() }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn start(&mut self, features_tx: Sender<FlowFeatures>, stats_tx: Sender<EngineStats>) -> Result<()> {
        if self.running.swap(true, Ordering::Relaxed) {
            return Err(FlowError::ProcessorState("is already running"));
        }

        let running = self.running.clone();
        let config = self.config.clone();
        let rx = self.packet_rx.clone();
        let handle = thread::Builder::new()
            .name("flow-processor".into())
            .spawn(move || engine::processing_loop(running, config, rx, features_tx, stats_tx));

        match handle {
            Ok(h) => {
                self.processing_thread = Some(h);
                info!("feature processor started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Relaxed);
                Err(FlowError::Io(e))
            }
        }
    }

    /// Stop the loop and wait for it; every open flow is flushed first.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running.swap(false, Ordering::Relaxed) {
            return Err(FlowError::ProcessorState("isn't running"));
        }

        if let Some(h) = self.processing_thread.take() { let _ = h.join(); }
        info!("feature processor stopped");
        Ok(())
    }
}

impl<P> Drop for FeatureProcessor<P> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.processing_thread.take() { let _ = h.join(); }
    }
}
