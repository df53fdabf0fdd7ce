use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatRecord {
    pub node_id: String,
    pub gpu_name: String,
    /// Total VRAM in MB
    pub vram_total: u64,
    /// GPU utilization percentage, rounded to two decimals
    pub current_load: f64,
    pub status: NodeStatus,
    /// UTC ISO8601 timestamp
    pub last_seen: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Online => write!(f, "online"),
            NodeStatus::Offline => write!(f, "offline"),
        }
    }
}
