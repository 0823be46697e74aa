//! Host alias discovery from the OpenSSH client configuration
//!
//! Reads `~/.ssh/config` (or an explicit root file), follows `Include`
//! directives recursively and turns every literal `Host` pattern into an
//! [`AliasCandidate`]. Supported directives are `Host`, `HostName`, `User`,
//! `Port` and `Include`; everything else is ignored, so settings below a
//! `Match` line still land on the open `Host` block.
//!
//! Discovery is best-effort. A missing root file, an unreadable include or a
//! bad include pattern is logged at debug level and skipped, and the caller
//! always gets a list.

pub mod glob;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SshConfigError, SshConfigResult};

/// Source tag carried by every candidate
pub const SOURCE_TAG: &str = "ssh_config";

/// A named connection shortcut found in the client configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasCandidate {
    /// Host pattern as written
    pub name: String,
    /// `user@host` or `host`
    pub target: String,
    /// Configured port, 0 for default
    pub port: u16,
    /// Always [`SOURCE_TAG`]
    pub source: String,
}

impl AliasCandidate {
    fn new(name: &str, target: String, port: u16) -> Self {
        Self {
            name: name.to_string(),
            target,
            port,
            source: SOURCE_TAG.to_string(),
        }
    }
}

/// Discovers host aliases from a client configuration tree
#[derive(Debug, Clone)]
pub struct SshConfigResolver {
    root: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl Default for SshConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SshConfigResolver {
    /// Resolver for the current user's `~/.ssh/config`
    #[must_use]
    pub fn new() -> Self {
        let home = dirs::home_dir();
        Self {
            root: home.as_ref().map(|h| h.join(".ssh").join("config")),
            home,
        }
    }

    /// Resolver with an explicit root file and home directory
    #[must_use]
    pub fn with_paths(root: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            home: Some(home.into()),
        }
    }

    /// Replaces the root file, keeping the home directory
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Root configuration file, if one could be determined
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Returns all candidates sorted by (name, target, port). Never fails.
    #[must_use]
    pub fn discover(&self) -> Vec<AliasCandidate> {
        let Some(root) = self.root.as_deref() else {
            tracing::debug!("No home directory, skipping client configuration");
            return Vec::new();
        };
        if !root.exists() {
            tracing::debug!(path = %root.display(), "Client configuration not found");
            return Vec::new();
        }

        let mut walk = Walk::new(self.home.as_deref());
        if let Err(err) = walk.parse_file(root) {
            tracing::debug!(path = %root.display(), error = %err, "Skipping client configuration");
        }

        let mut out = walk.out;
        out.sort_by(|a, b| {
            (a.name.as_str(), a.target.as_str(), a.port)
                .cmp(&(b.name.as_str(), b.target.as_str(), b.port))
        });
        tracing::debug!(count = out.len(), "Discovered host aliases");
        out
    }
}

#[derive(Debug, Default)]
struct HostBlock {
    patterns: Vec<String>,
    host_name: Option<String>,
    user: Option<String>,
    port: u16,
}

impl HostBlock {
    fn resolvable_patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty() && *p != "*" && !p.starts_with('!'))
            .filter(|p| !p.contains(['*', '?']))
    }

    fn target_for(&self, pattern: &str) -> String {
        let host = self.host_name.as_deref().unwrap_or(pattern);
        match &self.user {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        }
    }
}

/// State carried across one recursive discovery
struct Walk<'a> {
    home: Option<&'a Path>,
    visited: HashSet<PathBuf>,
    seen: HashSet<(String, String, u16)>,
    out: Vec<AliasCandidate>,
}

impl<'a> Walk<'a> {
    fn new(home: Option<&'a Path>) -> Self {
        Self {
            home,
            visited: HashSet::new(),
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn parse_file(&mut self, path: &Path) -> SshConfigResult<()> {
        let io_err = |source| SshConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = fs::canonicalize(path).map_err(io_err)?;
        if !self.visited.insert(canonical.clone()) {
            tracing::trace!(path = %canonical.display(), "Already parsed, skipping");
            return Ok(());
        }
        let content = fs::read_to_string(&canonical).map_err(io_err)?;
        let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::trace!(path = %canonical.display(), "Parsing client configuration");

        let mut block: Option<HostBlock> = None;
        for raw in content.lines() {
            let line = strip_comments(raw).trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = split_directive(line);

            match key.to_ascii_lowercase().as_str() {
                "include" => {
                    for pattern in value.split_whitespace() {
                        self.include(pattern, &dir);
                    }
                }
                "host" => {
                    self.flush(block.take());
                    block = Some(HostBlock {
                        patterns: value.split_whitespace().map(str::to_string).collect(),
                        ..HostBlock::default()
                    });
                }
                "hostname" => {
                    if let Some(b) = block.as_mut() {
                        b.host_name = Some(trim_value(value).to_string());
                    }
                }
                "user" => {
                    if let Some(b) = block.as_mut() {
                        b.user = Some(trim_value(value).to_string());
                    }
                }
                "port" => {
                    if let Some(b) = block.as_mut()
                        && let Ok(port) = trim_value(value).parse::<u16>()
                    {
                        b.port = port;
                    }
                }
                _ => {}
            }
        }
        self.flush(block);
        Ok(())
    }

    fn include(&mut self, pattern: &str, dir: &Path) {
        let home = self.home;
        let expanded =
            shellexpand::tilde_with_context(trim_value(pattern), || home.and_then(Path::to_str));
        let mut path = PathBuf::from(expanded.as_ref());
        if path.is_relative() {
            path = dir.join(path);
        }

        let files = match glob::expand(&path) {
            Ok(files) => files,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Skipping Include");
                return;
            }
        };
        for file in files {
            if let Err(err) = self.parse_file(&file) {
                tracing::debug!(path = %file.display(), error = %err, "Skipping included file");
            }
        }
    }

    fn flush(&mut self, block: Option<HostBlock>) {
        let Some(block) = block else {
            return;
        };
        for pattern in block.resolvable_patterns() {
            let target = block.target_for(pattern);
            let key = (pattern.to_string(), target.clone(), block.port);
            if self.seen.insert(key) {
                self.out
                    .push(AliasCandidate::new(pattern, target, block.port));
            }
        }
    }
}

/// Drops everything from the first `#` outside quotes
fn strip_comments(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Splits at the first run of whitespace
fn split_directive(line: &str) -> (&str, &str) {
    match line.split_once([' ', '\t']) {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    }
}

/// Trims whitespace and surrounding double quotes
fn trim_value(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
