//! Disk and resident-memory footprint of a loaded artifact.
//!
//! The memory delta samples process RSS immediately before and after a load
//! and is advisory only: allocator reuse and leftover garbage from earlier
//! iterations both leak into it. Disk size is an exact file-size read.

use std::fs;
use std::path::Path;

use crate::error::{EvalError, Result};

/// Current process resident set size, or `None` where /proc is unavailable.
pub fn resident_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
                return Some(kb * 1024);
            }
        }
        None
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Run `load`, sampling RSS on both sides. Returns the result together with
/// the advisory memory delta in bytes (0 when RSS cannot be read).
pub fn measure_load<T, F>(load: F) -> (T, i64)
where
    F: FnOnce() -> T,
{
    let before = resident_memory_bytes();
    let result = load();
    let after = resident_memory_bytes();
    let delta = match (before, after) {
        (Some(b), Some(a)) => a as i64 - b as i64,
        _ => 0,
    };
    (result, delta)
}

/// Exact on-disk size of an artifact file.
pub fn disk_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| EvalError::Load {
            path: path.to_path_buf(),
            reason: format!("stat failed: {e}"),
        })
}
