//! Parser for `nvidia-smi` CSV output
//!
//! Parses the `--format=csv,noheader,nounits` output of [`GPU_QUERY_COMMAND`]
//! (or its reduced variant). Any malformed row or unusable required field
//! fails the whole query, so a snapshot is never partially populated.

use super::gpu::{GpuRecord, GpuSnapshot, UNREPORTED};

/// Errors that can occur while querying or parsing GPU metrics
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitoringError {
    /// No target host was given
    #[error("empty target")]
    EmptyTarget,
    /// The remote shell or the remote command failed
    #[error("ssh: {0}")]
    Command(String),
    /// The remote process did not finish in time
    #[error("ssh: command timed out after {0}s")]
    Timeout(u64),
    /// The remote shell binary could not be started
    #[error("failed to start ssh: {0}")]
    Spawn(String),
    /// A row had fewer than the minimum number of fields
    #[error("unexpected nvidia-smi output: {0:?}")]
    MalformedRow(String),
    /// A required field was missing or not numeric
    #[error("parse {field}: {reason}")]
    Field {
        /// Field name (`index`, `util`, `temp`, `memUsed`, `memTotal`)
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type for monitoring operations
pub type MonitoringResult<T> = Result<T, MonitoringError>;

/// Full query including the CUDA version field.
pub const GPU_QUERY_COMMAND: &str = concat!(
    "nvidia-smi --query-gpu=",
    "index,name,utilization.gpu,temperature.gpu,memory.used,memory.total,",
    "fan.speed,power.draw,power.limit,driver_version,cuda_version",
    " --format=csv,noheader,nounits",
);

/// Reduced query for driver stacks that reject `cuda_version`.
pub const GPU_QUERY_COMMAND_NO_CUDA: &str = concat!(
    "nvidia-smi --query-gpu=",
    "index,name,utilization.gpu,temperature.gpu,memory.used,memory.total,",
    "fan.speed,power.draw,power.limit,driver_version",
    " --format=csv,noheader,nounits",
);

/// Field name that marks a failure as "CUDA field unsupported"
pub const CUDA_FIELD: &str = "cuda_version";

/// Minimum number of comma-separated fields per row
pub const MIN_FIELDS: usize = 6;

/// Which field set the output was produced with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    /// All eleven fields, including `cuda_version`
    Extended,
    /// Ten fields, without `cuda_version`
    Reduced,
}

impl FieldSet {
    /// Remote command for this field set
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Extended => GPU_QUERY_COMMAND,
            Self::Reduced => GPU_QUERY_COMMAND_NO_CUDA,
        }
    }
}

/// Stateless parser for `nvidia-smi` output
pub struct GpuParser;

impl GpuParser {
    /// Parses the raw command output into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MonitoringError::MalformedRow`] if a non-blank line has fewer
    /// than [`MIN_FIELDS`] fields, or [`MonitoringError::Field`] if a required
    /// numeric field is empty, `N/A`, `[Not Supported]` or not a number.
    pub fn parse(output: &str, fields: FieldSet) -> MonitoringResult<GpuSnapshot> {
        let gpus = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Self::parse_row(line, fields))
            .collect::<MonitoringResult<Vec<_>>>()?;
        Ok(GpuSnapshot::new(gpus))
    }

    fn parse_row(line: &str, fields: FieldSet) -> MonitoringResult<GpuRecord> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < MIN_FIELDS {
            return Err(MonitoringError::MalformedRow(line.to_string()));
        }

        let required = |i: usize, field: &'static str| {
            parse_required(parts[i]).map_err(|reason| MonitoringError::Field { field, reason })
        };

        Ok(GpuRecord {
            index: required(0, "index")?,
            name: parts[1].trim().to_string(),
            utilization: required(2, "util")?,
            temperature: required(3, "temp")?,
            mem_used: required(4, "memUsed")?,
            mem_total: required(5, "memTotal")?,
            fan_speed: parse_optional_int(&parts, 6),
            power_draw: parse_optional_int(&parts, 7),
            power_limit: parse_optional_int(&parts, 8),
            driver_version: parse_optional_string(&parts, 9),
            cuda_version: match fields {
                FieldSet::Extended => parse_optional_string(&parts, 10),
                FieldSet::Reduced => String::new(),
            },
        })
    }
}

/// `nvidia-smi` placeholders for values it cannot report
fn is_placeholder(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("n/a") || raw.eq_ignore_ascii_case("[not supported]")
}

/// Parses an integer or floating-point literal, rounding half away from zero.
fn parse_number(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.round() as i64)
}

fn parse_required(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty value".to_string());
    }
    if is_placeholder(raw) {
        return Err(format!("missing required numeric value {raw:?}"));
    }
    parse_number(raw).ok_or_else(|| format!("invalid numeric value {raw:?}"))
}

fn parse_optional_int(parts: &[&str], index: usize) -> i64 {
    let Some(raw) = parts.get(index).map(|p| p.trim()) else {
        return UNREPORTED;
    };
    if raw.is_empty() || is_placeholder(raw) {
        return UNREPORTED;
    }
    parse_number(raw).unwrap_or(UNREPORTED)
}

fn parse_optional_string(parts: &[&str], index: usize) -> String {
    match parts.get(index).map(|p| p.trim()) {
        Some(raw) if !raw.is_empty() && !is_placeholder(raw) => raw.to_string(),
        _ => String::new(),
    }
}
