//! Property-based tests for the retry delay schedule

use proptest::prelude::*;
use std::time::Duration;

use chatpulse::backend::store::BackoffScheduler;

proptest! {
    #[test]
    fn delay_grows_linearly(base_ms in 1u64..10_000, attempt in 1u32..64) {
        let scheduler = BackoffScheduler::new(Duration::from_millis(base_ms));

        prop_assert_eq!(
            scheduler.delay_for(attempt),
            Duration::from_millis(base_ms * attempt as u64)
        );
        prop_assert!(scheduler.delay_for(attempt + 1) > scheduler.delay_for(attempt));
    }
}
