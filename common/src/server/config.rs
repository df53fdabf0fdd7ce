use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub registry: RegistrySettings,
    pub agent: AgentSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistrySettings {
    /// Base URL of the registry, e.g. https://project.supabase.co
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentSettings {
    /// Seconds between heartbeats, measured from the end of one delivery
    /// to the start of the next
    #[serde(default = "default_interval")]
    pub heartbeat_interval: u64,
    /// Node identity file. Relative paths resolve beside the executable
    #[serde(default = "default_id_file")]
    pub id_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_table() -> String {
    String::from("nodes")
}

fn default_interval() -> u64 {
    60
}

fn default_id_file() -> String {
    String::from(".node_id")
}

fn default_log_level() -> String {
    String::from("info")
}
