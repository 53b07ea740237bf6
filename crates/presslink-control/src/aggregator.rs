//! Status aggregation.
//!
//! Reduces one cycle's child status records to the four conditions that
//! drive the press outputs:
//!
//! | Condition | Rule |
//! |-----------|------|
//! | `all_at_setpoint` | every child at setpoint |
//! | `all_at_release` | every child at release |
//! | `all_cycle_complete` | every child cycle complete |
//! | `any_faulted` | at least one child faulted |
//!
//! # Empty input
//!
//! Over no records the `all_*` conditions are `true` and `any_faulted` is
//! `false`, the usual universal/existential quantifier results. An empty set
//! only occurs before the address table is populated, and no cycle runs
//! before then, so callers gate on system readiness rather than on these
//! values.
//!
//! # Examples
//!
//! ```
//! use presslink_control::aggregate;
//! use presslink_core::{ChildAddress, ChildStatus};
//!
//! let a = ChildAddress::new(0x10).unwrap();
//! let b = ChildAddress::new(0x11).unwrap();
//!
//! let result = aggregate(&[
//!     ChildStatus::from_flags(a, [true, true, true, false]),
//!     ChildStatus::from_flags(b, [true, false, true, true]),
//! ]);
//!
//! assert!(result.all_at_setpoint);
//! assert!(!result.all_at_release);
//! assert!(result.all_cycle_complete);
//! assert!(result.any_faulted);
//! ```

use presslink_core::ChildStatus;
use serde::{Deserialize, Serialize};

/// Aggregated conditions for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub all_at_setpoint: bool,
    pub all_at_release: bool,
    pub all_cycle_complete: bool,
    pub any_faulted: bool,
}

impl Aggregate {
    /// Result over an empty status set.
    pub const EMPTY: Self = Self {
        all_at_setpoint: true,
        all_at_release: true,
        all_cycle_complete: true,
        any_faulted: false,
    };
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Aggregate one cycle's status records.
///
/// Pure and order-independent.
pub fn aggregate(statuses: &[ChildStatus]) -> Aggregate {
    statuses.iter().fold(Aggregate::EMPTY, |acc, status| Aggregate {
        all_at_setpoint: acc.all_at_setpoint && status.heater_at_setpoint,
        all_at_release: acc.all_at_release && status.heater_at_release,
        all_cycle_complete: acc.all_cycle_complete && status.heater_cycle_complete,
        any_faulted: acc.any_faulted || status.heater_faulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use presslink_core::ChildAddress;
    use proptest::prelude::*;
    use rstest::rstest;

    fn cell(flags: &[[bool; 4]]) -> Vec<ChildStatus> {
        flags
            .iter()
            .enumerate()
            .map(|(i, f)| ChildStatus::from_flags(ChildAddress::new(0x10 + i as u8).unwrap(), *f))
            .collect()
    }

    const T: bool = true;
    const F: bool = false;

    #[test]
    fn test_empty_is_vacuously_true() {
        assert_eq!(aggregate(&[]), Aggregate::EMPTY);
        assert_eq!(Aggregate::default(), Aggregate::EMPTY);
    }

    #[rstest]
    #[case::all_ready(&[[T, T, T, F], [T, T, T, F], [T, T, T, F]], [T, T, T, F])]
    #[case::mixed(&[[T, T, T, F], [T, F, T, F], [T, T, T, T]], [T, F, T, T])]
    #[case::one_heating(&[[F, F, F, F], [T, F, F, F]], [F, F, F, F])]
    #[case::single_faulted(&[[F, F, F, T]], [F, F, F, T])]
    fn test_aggregate_cases(#[case] flags: &[[bool; 4]], #[case] expected: [bool; 4]) {
        let result = aggregate(&cell(flags));
        assert_eq!(
            [
                result.all_at_setpoint,
                result.all_at_release,
                result.all_cycle_complete,
                result.any_faulted,
            ],
            expected
        );
    }

    fn status_flags() -> impl Strategy<Value = Vec<[bool; 4]>> {
        prop::collection::vec(any::<[bool; 4]>(), 1..16)
    }

    proptest! {
        #[test]
        fn prop_cycle_complete_iff_every_child(flags in status_flags()) {
            let result = aggregate(&cell(&flags));
            prop_assert_eq!(result.all_cycle_complete, flags.iter().all(|f| f[2]));
            prop_assert_eq!(result.any_faulted, flags.iter().any(|f| f[3]));
        }

        #[test]
        fn prop_permutation_invariant(
            flags in status_flags(),
            seed in any::<u64>(),
        ) {
            let statuses = cell(&flags);
            let mut shuffled = statuses.clone();

            // Deterministic Fisher-Yates driven by the generated seed
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            prop_assert_eq!(aggregate(&statuses), aggregate(&shuffled));
        }
    }
}
