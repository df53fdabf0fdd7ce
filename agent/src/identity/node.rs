use log::{info, warn};
use std::env::current_exe;
use std::fs::{read_to_string, write};
use std::path::{Path, PathBuf};
use sysinfo::Networks;
use uuid::Uuid;

/// Resolve the persistent node identity, generating and persisting a new one
/// if no usable value exists at `path`. Never fails: persistence problems
/// degrade to an ephemeral identity for this run.
pub(crate) fn resolve_node_id(path: &Path) -> String {
    if let Some(existing) = read_node_id(path) {
        info!("[identity] Loaded existing node ID: {}...", short_id(&existing));
        return existing;
    }

    let node_id = generate_node_id();

    // A failed write means every future run generates a fresh identity until
    // the path becomes writable. The current run keeps this value either way
    match write(path, &node_id) {
        Ok(()) => info!("[identity] Generated new node ID: {}...", short_id(&node_id)),
        Err(err) => warn!(
            "[identity] Could not persist node ID to {}: {err:?}",
            path.display()
        ),
    }

    node_id
}

/// Read a previously persisted identity. Read errors and empty files are
/// treated as absence
fn read_node_id(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    match read_to_string(path) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(trimmed.to_string())
        }
        Err(err) => {
            warn!("[identity] Could not read {}: {err:?}", path.display());
            None
        }
    }
}

/// Name-based UUID seeded by the machine MAC address combined with a random
/// component, unique across machines and across runs
fn generate_node_id() -> String {
    let seed = hardware_seed();

    let mut seed_int = 0u128;
    for byte in seed {
        seed_int = (seed_int << 8) | u128::from(byte);
    }

    let namespace = Uuid::from_u128(seed_int);
    let name = format!("{}-{}", format_mac(&seed), Uuid::new_v4());
    Uuid::new_v5(&namespace, name.as_bytes()).hyphenated().to_string()
}

/// First interface reporting a real MAC address, or a random fallback when
/// nothing usable exists
fn hardware_seed() -> [u8; 6] {
    let networks = Networks::new_with_refreshed_list();
    for (_interface, data) in &networks {
        let mac = data.mac_address();
        if !mac.is_unspecified() {
            return mac.0;
        }
    }

    let fallback = Uuid::new_v4();
    let bytes = fallback.as_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]
}

/// First eight characters of an identity for log output
pub(crate) fn short_id(node_id: &str) -> String {
    node_id.chars().take(8).collect()
}

fn format_mac(seed: &[u8; 6]) -> String {
    seed.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<String>>()
        .join(":")
}

/// Identity file location. Relative names resolve beside the executable,
/// falling back to the working directory
pub(crate) fn id_file_path(configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match current_exe() {
        Ok(exe) => match exe.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        },
        Err(_err) => path.to_path_buf(),
    }
}
