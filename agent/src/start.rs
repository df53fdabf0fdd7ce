use crate::configuration::config::load_config;
use crate::error::AgentError;
use crate::gpu::probe::detect_gpu;
use crate::heartbeat::engine::HeartbeatEngine;
use crate::identity::node::{id_file_path, resolve_node_id};
use crate::registry::client::{Registry, RegistryClient};
use crate::utils::logging::setup_logging;
use common::server::config::AgentConfig;
use common::system::GpuInfo;
use log::{error, info};
use std::future::Future;

/// Run the agent until a stop signal arrives. Fatal preconditions (bad
/// config, no GPU, unreachable registry) are checked once, before the loop
#[tokio::main]
pub(crate) async fn start(path: &str) -> Result<(), AgentError> {
    let config = match load_config(path).await {
        Ok(result) => result,
        Err(err) => {
            // Logging is not up yet, write straight to stderr
            eprintln!("[gridpulse] Could not load config at {path}: {err}");
            return Err(AgentError::BadConfig);
        }
    };
    setup_logging(&config.agent.log_level);

    info!("[gridpulse] Initializing gridpulse provider agent...");

    run(&config, detect_gpu().await, stop_signal()).await
}

/// Post-config startup sequence. The GPU result is checked before identity
/// resolution and before any registry call, a machine without a usable
/// device exits without side effects
async fn run(
    config: &AgentConfig,
    gpu: Option<GpuInfo>,
    stop: impl Future<Output = ()>,
) -> Result<(), AgentError> {
    let gpu = match gpu {
        Some(result) => result,
        None => {
            error!("[gpu] No NVIDIA GPU detected on this machine");
            error!("[gpu] Ensure a device is installed, drivers are loaded, and nvidia-smi works");
            return Err(AgentError::NoGpu);
        }
    };
    info!(
        "[gpu] Detected {} ({} MB, driver {})",
        gpu.name, gpu.vram_total, gpu.driver_version
    );

    let node_id = resolve_node_id(&id_file_path(&config.agent.id_file));

    let registry = match RegistryClient::connect(&config.registry).await {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] Could not reach registry at startup: {err}");
            return Err(AgentError::RegistryUnreachable);
        }
    };

    let engine = HeartbeatEngine::new(registry, node_id, gpu, config.agent.heartbeat_interval);
    engine.banner();

    run_until_shutdown(&engine, stop).await;
    info!("[gridpulse] Gridpulse provider agent stopped");
    Ok(())
}

/// Race the reporting loop against the stop signal. The signal preempts any
/// sleep or in-flight delivery, then the offline mark is the final write
async fn run_until_shutdown<R: Registry>(
    engine: &HeartbeatEngine<R>,
    stop: impl Future<Output = ()>,
) {
    tokio::select! {
        _ = engine.run() => {}
        _ = stop => {
            info!("[gridpulse] Shutdown requested...");
        }
    }

    engine.shutdown().await;
}

/// Resolves on ctrl-c, or SIGTERM on unix
async fn stop_signal() {
    #[cfg(target_family = "unix")]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut terminate) = signal(SignalKind::terminate()) {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
            return;
        }
    }

    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::{run, run_until_shutdown, start};
    use crate::configuration::config::load_config;
    use crate::error::AgentError;
    use crate::heartbeat::engine::HeartbeatEngine;
    use crate::identity::node::id_file_path;
    use crate::registry::client::testing::FakeRegistry;
    use common::system::GpuInfo;
    use httpmock::{Method::GET, MockServer};
    use std::future::ready;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::sleep;

    fn fixture(name: &str) -> String {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("tests/configs");
        test_location.push(name);
        test_location.display().to_string()
    }

    fn engine(fail_first: u32) -> HeartbeatEngine<FakeRegistry> {
        HeartbeatEngine::new(
            FakeRegistry::new(fail_first),
            String::from("node-test"),
            GpuInfo {
                name: String::from("NVIDIA T4"),
                vram_total: 15360,
                driver_version: String::from("535.03"),
            },
            60,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown_marks_offline_once() {
        let engine = engine(0);

        // Stop while the engine sleeps between ticks
        run_until_shutdown(&engine, sleep(Duration::from_secs(5))).await;

        assert_eq!(engine.registry.upserts.load(Ordering::SeqCst), 1);
        assert_eq!(engine.registry.offlines.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown_abandons_backoff() {
        let engine = engine(u32::MAX);

        // Attempts land at 0s and 1s. Stopping mid-backoff at 1.5s abandons
        // the third attempt, the offline mark is the last call made
        run_until_shutdown(&engine, sleep(Duration::from_millis(1500))).await;

        assert_eq!(engine.registry.upserts.load(Ordering::SeqCst), 2);
        assert_eq!(engine.registry.offlines.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_no_gpu_exits_without_side_effects() {
        let server = MockServer::start();
        let mock_me = server.mock(|when, then| {
            when.method(GET).path("/rest/v1/nodes");
            then.status(200).body("[]");
        });

        let mut config = load_config(&fixture("agent.toml")).await.unwrap();
        config.registry.url = server.base_url();
        config.agent.id_file = String::from(".node_id_no_gpu");

        let result = run(&config, None, ready(())).await;

        // Fatal before any registry call or identity write
        assert_eq!(result.unwrap_err(), AgentError::NoGpu);
        mock_me.assert_hits(0);
        assert!(!id_file_path(".node_id_no_gpu").exists());
    }

    #[test]
    fn test_start_missing_config() {
        let result = start("./tmp/gridpulse/no_such_config.toml");
        assert_eq!(result.unwrap_err(), AgentError::BadConfig);
    }

    #[test]
    fn test_start_placeholder_config() {
        let result = start(&fixture("placeholder.toml"));
        assert_eq!(result.unwrap_err(), AgentError::BadConfig);
    }

    #[test]
    #[ignore = "Runs the agent loop, needs a GPU and a reachable registry"]
    fn test_start() {
        let result = start(&fixture("agent.toml"));
        assert!(result.is_ok());
    }
}
