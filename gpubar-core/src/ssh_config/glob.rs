//! Include pattern expansion
//!
//! Supports `*`, `?` and `[...]` classes (`[!...]` or `[^...]` negate) within
//! a single path component. Wildcards never cross a `/`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::error::{SshConfigError, SshConfigResult};

/// Returns true if `s` contains glob metacharacters
#[must_use]
pub fn has_glob(s: &str) -> bool {
    s.contains(['*', '?', '[', ']'])
}

/// Expands an absolute pattern into the regular files it matches, sorted.
///
/// A pattern without metacharacters yields itself if it names a regular
/// file. Unreadable directories along the way simply match nothing.
///
/// # Errors
///
/// Returns [`SshConfigError::Pattern`] for a malformed character class.
pub fn expand(pattern: &Path) -> SshConfigResult<Vec<PathBuf>> {
    let mut candidates = vec![PathBuf::new()];

    for component in pattern.components() {
        let Component::Normal(part) = component else {
            for c in &mut candidates {
                c.push(component.as_os_str());
            }
            continue;
        };

        match part.to_str().filter(|s| has_glob(s)) {
            None => {
                for c in &mut candidates {
                    c.push(part);
                }
            }
            Some(glob) => {
                let re = component_regex(glob)?;
                candidates = candidates
                    .iter()
                    .flat_map(|dir| matching_entries(dir, &re))
                    .collect();
            }
        }

        if candidates.is_empty() {
            break;
        }
    }

    let mut files: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|p| fs::metadata(p).is_ok_and(|m| m.is_file()))
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

fn matching_entries(dir: &Path, re: &Regex) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| re.is_match(name)))
        .map(|entry| entry.path())
        .collect()
}

/// Compiles one path component's glob into an anchored regex
fn component_regex(glob: &str) -> SshConfigResult<Regex> {
    let invalid = |reason: &str| SshConfigError::Pattern {
        pattern: glob.to_string(),
        reason: reason.to_string(),
    };

    let mut re = String::from("^");
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| invalid("trailing backslash"))?;
                re.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
            }
            '[' => {
                re.push('[');
                let mut first = true;
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '!' | '^' if first => re.push('^'),
                        '-' => re.push('-'),
                        c if c.is_alphanumeric() => re.push(c),
                        c => {
                            re.push('\\');
                            re.push(c);
                        }
                    }
                    first = false;
                }
                if !closed {
                    return Err(invalid("unterminated character class"));
                }
                re.push(']');
            }
            ']' => return Err(invalid("unmatched ']'")),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');

    Regex::new(&re).map_err(|e| invalid(&e.to_string()))
}
