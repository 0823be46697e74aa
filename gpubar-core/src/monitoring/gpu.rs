//! GPU telemetry data model
//!
//! Optional numeric fields use [`UNREPORTED`] and optional strings use `""`
//! when the host does not report them. Records serialize with the field
//! names the presentation layer expects (`util`, `temp`, `memUsed`, ...).

use serde::{Deserialize, Serialize};

/// Sentinel for an optional numeric metric the host did not report
pub const UNREPORTED: i64 = -1;

/// One GPU as reported by a single query row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuRecord {
    /// Device index on the host
    pub index: i64,
    /// Marketing name (e.g. `NVIDIA GeForce RTX 4090`)
    pub name: String,
    /// GPU utilization (%)
    #[serde(rename = "util")]
    pub utilization: i64,
    /// Core temperature (°C)
    #[serde(rename = "temp")]
    pub temperature: i64,
    /// Framebuffer memory in use (MiB)
    pub mem_used: i64,
    /// Total framebuffer memory (MiB)
    pub mem_total: i64,
    /// Fan speed (%), or [`UNREPORTED`]
    pub fan_speed: i64,
    /// Power draw (W), or [`UNREPORTED`]
    pub power_draw: i64,
    /// Enforced power limit (W), or [`UNREPORTED`]
    pub power_limit: i64,
    /// Driver version, empty if unknown
    pub driver_version: String,
    /// CUDA version, empty if unknown
    pub cuda_version: String,
}

impl GpuRecord {
    /// Fan speed if reported
    #[must_use]
    pub const fn fan_speed(&self) -> Option<i64> {
        reported(self.fan_speed)
    }

    /// Power draw if reported
    #[must_use]
    pub const fn power_draw(&self) -> Option<i64> {
        reported(self.power_draw)
    }

    /// Power limit if reported
    #[must_use]
    pub const fn power_limit(&self) -> Option<i64> {
        reported(self.power_limit)
    }

    /// Memory usage as a rounded percentage, 0 when the total is unknown
    #[must_use]
    pub fn memory_percent(&self) -> i64 {
        if self.mem_total <= 0 {
            return 0;
        }
        ((self.mem_used as f64 / self.mem_total as f64) * 100.0).round() as i64
    }

    /// Power draw as a rounded percentage of the limit, 0 when unknown
    #[must_use]
    pub fn power_percent(&self) -> i64 {
        match (self.power_draw(), self.power_limit()) {
            (Some(draw), Some(limit)) if limit > 0 => {
                ((draw.max(0) as f64 / limit as f64) * 100.0).round() as i64
            }
            _ => 0,
        }
    }
}

const fn reported(value: i64) -> Option<i64> {
    if value < 0 { None } else { Some(value) }
}

/// A complete, ordered set of records from one successful query.
///
/// Order mirrors the remote command's row order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpuSnapshot {
    gpus: Vec<GpuRecord>,
}

impl GpuSnapshot {
    /// Wraps fully parsed records
    #[must_use]
    pub const fn new(gpus: Vec<GpuRecord>) -> Self {
        Self { gpus }
    }

    /// Records in host order
    #[must_use]
    pub fn gpus(&self) -> &[GpuRecord] {
        &self.gpus
    }

    /// Number of GPUs in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.gpus.len()
    }

    /// Whether the host reported no GPUs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gpus.is_empty()
    }

    /// First GPU, used for single-value displays
    #[must_use]
    pub fn primary(&self) -> Option<&GpuRecord> {
        self.gpus.first()
    }

    /// Consumes the snapshot into its records
    #[must_use]
    pub fn into_inner(self) -> Vec<GpuRecord> {
        self.gpus
    }
}

#[cfg(test)]
pub(crate) fn sample_record(index: i64) -> GpuRecord {
    GpuRecord {
        index,
        name: "NVIDIA RTX 4090".to_string(),
        utilization: 78,
        temperature: 66,
        mem_used: 10_240,
        mem_total: 24_576,
        fan_speed: 45,
        power_draw: 210,
        power_limit: 450,
        driver_version: "550.54.14".to_string(),
        cuda_version: "12.4".to_string(),
    }
}
