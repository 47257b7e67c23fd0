//! Resource probes
//!
//! A probe observes a backend from the outside: bytes on disk under its data
//! directory and resident memory of its process. Probing is backend specific,
//! so the harness only sees the [`ResourceProbe`] trait.

use crate::error::{GraphmarkError, GraphmarkResult};
use crate::results::ResourceUsage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// External observer of a backend's footprint
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn snapshot(&self) -> GraphmarkResult<ResourceUsage>;
}

/// Probe reading a data directory and, on Linux, a process's `VmRSS`
#[derive(Debug, Clone)]
pub struct PathProbe {
    data_dir: PathBuf,
    pid: Option<u32>,
}

impl PathProbe {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pid: None,
        }
    }

    /// Also report resident memory of process `pid`
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }
}

#[async_trait]
impl ResourceProbe for PathProbe {
    async fn snapshot(&self) -> GraphmarkResult<ResourceUsage> {
        let dir = self.data_dir.clone();
        let pid = self.pid;
        tokio::task::spawn_blocking(move || {
            Ok::<_, GraphmarkError>(ResourceUsage {
                disk_bytes: dir_size(&dir)?,
                ram_bytes: pid.and_then(resident_memory_bytes).unwrap_or(0),
            })
        })
        .await
        .map_err(|e| GraphmarkError::Io(std::io::Error::other(e.to_string())))?
    }
}

/// Total size of all files below `path`; a missing path counts as empty
fn dir_size(path: &Path) -> std::io::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    if path.is_file() {
        return Ok(path.metadata()?.len());
    }
    let mut total = 0u64;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_file() {
            total += meta.len();
        } else if meta.is_dir() {
            total += dir_size(&entry.path())?;
        }
    }
    Ok(total)
}

#[cfg(target_os = "linux")]
fn resident_memory_bytes(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes(_pid: u32) -> Option<u64> {
    None
}
