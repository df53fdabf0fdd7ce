use common::system::GpuInfo;
use log::error;
use tokio::process::Command;

/// Query nvidia-smi for the primary GPU. `None` means no usable device or a
/// failing query mechanism, both fatal at startup
pub(crate) async fn detect_gpu() -> Option<GpuInfo> {
    let output = match Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,memory.total,driver_version",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .await
    {
        Ok(result) => result,
        Err(err) => {
            error!("[gpu] Could not run nvidia-smi: {err:?}");
            return None;
        }
    };

    if !output.status.success() {
        error!("[gpu] nvidia-smi exited with status {:?}", output.status.code());
        return None;
    }

    parse_gpu_query(&String::from_utf8_lossy(&output.stdout))
}

/// Current GPU utilization percentage. Never fails: any problem collapses
/// to 0.0. The query runs off the runtime so a stop signal can still
/// preempt a tick stuck on a hung nvidia-smi
pub(crate) async fn sample_load() -> f64 {
    let output = match Command::new("nvidia-smi")
        .args(["--query-gpu=utilization.gpu", "--format=csv,noheader,nounits"])
        .output()
        .await
    {
        Ok(result) => result,
        Err(_err) => return 0.0,
    };

    if !output.status.success() {
        return 0.0;
    }

    parse_load(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the first line of a csv,noheader,nounits device query
fn parse_gpu_query(stdout: &str) -> Option<GpuInfo> {
    let line = stdout.lines().next()?;
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 3 || parts[0].is_empty() {
        return None;
    }

    let vram_total = match parts[1].parse() {
        Ok(result) => result,
        Err(err) => {
            error!("[gpu] Unexpected memory.total value {}: {err:?}", parts[1]);
            return None;
        }
    };

    Some(GpuInfo {
        name: parts[0].to_string(),
        vram_total,
        driver_version: parts[2].to_string(),
    })
}

/// Parse a utilization query, clamped to [0,100]
fn parse_load(stdout: &str) -> f64 {
    stdout
        .lines()
        .next()
        .and_then(|line| line.trim().parse::<f64>().ok())
        .map(|value| value.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::{parse_gpu_query, parse_load, sample_load};

    #[test]
    fn test_parse_gpu_query() {
        let result = parse_gpu_query("NVIDIA GeForce RTX 4090, 24564, 550.54.15\n").unwrap();
        assert_eq!(result.name, "NVIDIA GeForce RTX 4090");
        assert_eq!(result.vram_total, 24564);
        assert_eq!(result.driver_version, "550.54.15");
    }

    #[test]
    fn test_parse_gpu_query_no_device() {
        assert!(parse_gpu_query("").is_none());
    }

    #[test]
    fn test_parse_gpu_query_short_line() {
        assert!(parse_gpu_query("NVIDIA T4, 15360\n").is_none());
    }

    #[test]
    fn test_parse_gpu_query_bad_memory() {
        assert!(parse_gpu_query("NVIDIA T4, [N/A], 535.03\n").is_none());
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(parse_load("37\n"), 37.0);
        assert_eq!(parse_load("62.5\n"), 62.5);
    }

    #[test]
    fn test_parse_load_clamped() {
        assert_eq!(parse_load("250\n"), 100.0);
        assert_eq!(parse_load("-3\n"), 0.0);
    }

    #[test]
    fn test_parse_load_degrades() {
        assert_eq!(parse_load(""), 0.0);
        assert_eq!(parse_load("[N/A]\n"), 0.0);
    }

    #[tokio::test]
    async fn test_sample_load_in_range() {
        // Valid with or without a GPU present
        let load = sample_load().await;
        assert!((0.0..=100.0).contains(&load));
    }
}
