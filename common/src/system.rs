use serde::{Deserialize, Serialize};

/// Static GPU metadata captured once at startup. Only the load changes
/// between heartbeats, never these fields.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GpuInfo {
    pub name: String,
    /// Total VRAM in MB
    pub vram_total: u64,
    pub driver_version: String,
}
