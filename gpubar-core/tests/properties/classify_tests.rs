//! Property-based tests for failure classification

use gpubar_core::{ErrorCode, classify};
use proptest::prelude::*;

const MARKERS: [(&str, ErrorCode); 6] = [
    ("permission denied", ErrorCode::AuthFailed),
    ("host key verification failed", ErrorCode::HostKey),
    ("could not resolve hostname", ErrorCode::Dns),
    ("connection refused", ErrorCode::Refused),
    ("operation timed out", ErrorCode::Timeout),
    ("nvidia-smi: command not found", ErrorCode::NvidiaSmiMissing),
];

/// Text that cannot contain any marker
fn arb_noise() -> impl Strategy<Value = String> {
    "[0-9 .,:]{0,20}"
}

/// Randomizes ASCII letter case
fn shout(s: &str, mask: u64) -> String {
    s.chars()
        .enumerate()
        .map(|(i, c)| if mask >> (i % 64) & 1 == 1 { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The highest-priority marker present wins, regardless of case or order
    #[test]
    fn prop_priority_order(
        picks in proptest::collection::btree_set(0usize..MARKERS.len(), 1..4),
        prefix in arb_noise(),
        mask in any::<u64>(),
        reverse in any::<bool>(),
    ) {
        let mut parts: Vec<&str> = picks.iter().map(|&i| MARKERS[i].0).collect();
        if reverse {
            parts.reverse();
        }
        let raw = format!("{prefix}{}", shout(&parts.join(" / "), mask));
        let best = *picks.iter().next().unwrap();
        prop_assert_eq!(classify(&raw).code, MARKERS[best].1);
    }

    /// Unknown failures keep the trimmed text
    #[test]
    fn prop_unknown_keeps_text(noise in arb_noise()) {
        let classified = classify(&noise);
        prop_assert_eq!(classified.code, ErrorCode::Unknown);
        let trimmed = noise.trim();
        if trimmed.is_empty() {
            prop_assert_eq!(classified.message, "Connection failed");
        } else {
            prop_assert_eq!(classified.message, trimmed);
        }
    }
}

#[test]
fn auth_beats_timeout() {
    let c = classify("Permission denied; also the connection timed out");
    assert_eq!(c.code, ErrorCode::AuthFailed);
}
