use crate::gpu::probe::sample_load;
use crate::identity::node::short_id;
use crate::registry::client::Registry;
use crate::utils::time::{clock_display, now_iso};
use common::server::heartbeat::{HeartbeatRecord, NodeStatus};
use common::system::GpuInfo;
use log::{error, info, warn};
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;
/// Backoff before the second and third attempt of a tick, in seconds
const RETRY_DELAYS: [u64; 2] = [1, 2];

/// Owns the reporting loop. States: starting -> online (steady loop, delivery
/// failures are transient and absorbed) -> offline (terminal, one best-effort
/// mark on shutdown)
pub(crate) struct HeartbeatEngine<R: Registry> {
    pub(crate) registry: R,
    node_id: String,
    gpu: GpuInfo,
    /// Seconds from the end of one delivery to the start of the next tick
    interval: u64,
}

impl<R: Registry> HeartbeatEngine<R> {
    pub(crate) fn new(registry: R, node_id: String, gpu: GpuInfo, interval: u64) -> Self {
        HeartbeatEngine {
            registry,
            node_id,
            gpu,
            interval,
        }
    }

    /// Steady-state loop. Never returns on its own: the caller races it
    /// against the stop signal and drops it on shutdown
    pub(crate) async fn run(&self) {
        loop {
            if self.deliver().await {
                info!(
                    "[heartbeat] Heartbeat sent at {} - Status: Online",
                    clock_display()
                );
            } else {
                warn!("[heartbeat] Heartbeat failed - will retry next interval");
            }

            // Delivery time is not subtracted, a slow attempt pushes out the
            // next tick
            sleep(Duration::from_secs(self.interval)).await;
        }
    }

    /// One tick: fresh load sample, then bounded retries against the
    /// registry. Exhaustion is logged and absorbed, never escalated
    pub(crate) async fn deliver(&self) -> bool {
        let record = self.build_record(NodeStatus::Online, sample_load().await);

        for attempt in 0..MAX_RETRIES {
            match self.registry.upsert(&record).await {
                Ok(()) => return true,
                Err(err) => {
                    if attempt + 1 == MAX_RETRIES {
                        error!("[heartbeat] Heartbeat failed after {MAX_RETRIES} attempts: {err}");
                        break;
                    }

                    let delay = RETRY_DELAYS[attempt as usize];
                    warn!(
                        "[heartbeat] Heartbeat failed (attempt {}/{MAX_RETRIES}): {err}",
                        attempt + 1
                    );
                    warn!("[heartbeat] Retrying in {delay}s...");
                    sleep(Duration::from_secs(delay)).await;
                }
            }
        }

        false
    }

    pub(crate) fn build_record(&self, status: NodeStatus, load: f64) -> HeartbeatRecord {
        HeartbeatRecord {
            node_id: self.node_id.clone(),
            gpu_name: self.gpu.name.clone(),
            vram_total: self.gpu.vram_total,
            current_load: (load.clamp(0.0, 100.0) * 100.0).round() / 100.0,
            status,
            last_seen: now_iso(),
        }
    }

    /// Final write on shutdown. Single attempt, outcome only logged. Always
    /// the last write this engine makes
    pub(crate) async fn shutdown(&self) {
        match self.registry.mark_offline(&self.node_id).await {
            Ok(()) => info!("[heartbeat] Status updated to offline in registry"),
            Err(err) => error!("[heartbeat] Could not update offline status: {err}"),
        }
    }

    pub(crate) fn banner(&self) {
        info!("[gridpulse] ==================================================");
        info!("[gridpulse] Gridpulse provider agent started");
        info!("[gridpulse] Node ID: {}...", short_id(&self.node_id));
        info!("[gridpulse] GPU: {}", self.gpu.name);
        info!("[gridpulse] VRAM: {} MB", self.gpu.vram_total);
        info!("[gridpulse] Driver: {}", self.gpu.driver_version);
        info!("[gridpulse] Heartbeat interval: {}s", self.interval);
        info!("[gridpulse] ==================================================");
    }
}
