//! Cache-directory discovery for model weights
//!
//! Serverless workers may have a network volume attached, but the mount
//! point is not passed to the container explicitly. Discovery is a short
//! probe over conventional locations rather than an exhaustive filesystem
//! scan: an env override first, then the documented serverless mount, then
//! the mounts older templates used.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variable overriding cache-directory discovery
pub const CACHE_DIR_VAR: &str = "ECHOPOD_CACHE_DIR";

/// Conventional volume mount points, in probe order
const CANDIDATES: [&str; 3] = ["/runpod-volume", "/data", "/workspace"];

/// Find a writable directory suitable for model caches
///
/// Returns the env override when set and writable, otherwise the first
/// writable candidate mount, otherwise `None` (callers fall back to the
/// model library's default cache location).
pub fn locate_writable_cache_dir() -> Option<PathBuf> {
    if let Ok(overridden) = std::env::var(CACHE_DIR_VAR) {
        let path = PathBuf::from(overridden);
        if ensure_writable(&path) {
            tracing::info!(path = %path.display(), "using cache dir from {CACHE_DIR_VAR}");
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{CACHE_DIR_VAR} is set but not writable");
    }

    for candidate in CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.is_dir() && ensure_writable(&path) {
            tracing::info!(path = %path.display(), "using network volume for model cache");
            return Some(path);
        }
    }

    tracing::info!("no network volume found, using default cache directories");
    None
}

/// Check that a directory exists (creating it if needed) and accepts writes
pub fn ensure_writable(path: &Path) -> bool {
    if std::fs::create_dir_all(path).is_err() {
        return false;
    }

    let probe = path.join(".echopod-write-probe");
    let ok = std::fs::write(&probe, b"probe").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}

/// Probe result for one candidate cache location
#[derive(Debug, Serialize)]
pub struct VolumeProbe {
    /// Candidate path
    pub path: PathBuf,
    /// Whether the path exists as a directory
    pub exists: bool,
    /// Whether the path accepted a test write
    pub writable: bool,
}

/// Probe every candidate location, without creating missing directories
pub fn probe_volumes() -> Vec<VolumeProbe> {
    CANDIDATES
        .into_iter()
        .map(|candidate| {
            let path = PathBuf::from(candidate);
            let exists = path.is_dir();
            let writable = exists && ensure_writable(&path);
            VolumeProbe { path, exists, writable }
        })
        .collect()
}

/// One line of `/proc/mounts`
#[derive(Debug, Serialize)]
pub struct MountEntry {
    /// Source device
    pub device: String,
    /// Mount point
    pub mount_point: String,
    /// Filesystem type
    pub fs_type: String,
}

/// Mounts visible to this container
///
/// Returns an empty list on platforms without `/proc/mounts`.
pub fn list_mounts() -> Vec<MountEntry> {
    let Ok(raw) = std::fs::read_to_string("/proc/mounts") else {
        return Vec::new();
    };

    raw.lines().filter_map(parse_mount_line).collect()
}

fn parse_mount_line(line: &str) -> Option<MountEntry> {
    let mut fields = line.split_whitespace();
    Some(MountEntry {
        device: fields.next()?.to_owned(),
        mount_point: fields.next()?.to_owned(),
        fs_type: fields.next()?.to_owned(),
    })
}
