//! Property-based tests for retry policy and status transitions

use std::time::Duration;

use gpubar_core::supervisor::{DEFAULT_BACKOFF_SECS, MIN_RETRY_DELAY};
use gpubar_core::{ConnectionStatus, RetryPolicy};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Default table for 1..=5, last entry beyond
    #[test]
    fn prop_default_backoff(failures in 1u32..1000) {
        let delay = RetryPolicy::default().delay_for(failures);
        let idx = (failures as usize - 1).min(DEFAULT_BACKOFF_SECS.len() - 1);
        prop_assert_eq!(delay, Duration::from_secs(DEFAULT_BACKOFF_SECS[idx]));
    }

    /// Custom tables clamp to their last entry and never go below one second
    #[test]
    fn prop_custom_backoff_clamps(
        table in proptest::collection::vec(0u64..100, 1..8),
        failures in 1u32..50,
    ) {
        let policy = RetryPolicy::new().with_backoff_secs(&table);
        let delay = policy.delay_for(failures);
        let idx = (failures as usize - 1).min(table.len() - 1);
        prop_assert_eq!(delay, Duration::from_secs(table[idx]).max(MIN_RETRY_DELAY));
        prop_assert!(delay >= MIN_RETRY_DELAY);
    }

    /// Delays never shrink as failures accumulate on the default table
    #[test]
    fn prop_backoff_monotonic(failures in 1u32..100) {
        let policy = RetryPolicy::default();
        prop_assert!(policy.delay_for(failures) <= policy.delay_for(failures + 1));
    }

    /// Stale only while a prior success exists and the threshold is not reached
    #[test]
    fn prop_status_after_failure(
        has_succeeded in any::<bool>(),
        failures in 1u32..20,
        threshold in 1u32..10,
    ) {
        let status = ConnectionStatus::after_failure(has_succeeded, failures, threshold);
        if has_succeeded && failures < threshold {
            prop_assert_eq!(status, ConnectionStatus::Stale);
        } else {
            prop_assert_eq!(status, ConnectionStatus::Error);
        }
    }
}

#[test]
fn sixth_failure_after_success_is_error() {
    let threshold = RetryPolicy::default().error_threshold();
    assert_eq!(ConnectionStatus::after_failure(true, 5, threshold), ConnectionStatus::Stale);
    assert_eq!(ConnectionStatus::after_failure(true, 6, threshold), ConnectionStatus::Error);
    assert_eq!(ConnectionStatus::after_failure(false, 1, threshold), ConnectionStatus::Error);
}
