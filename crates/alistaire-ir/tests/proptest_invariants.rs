//! Property-based tests for job description invariants.
//!
//! Every accepted operation targets slots in `[0, slot_count)`, every
//! out-of-range target is rejected, and the observation step is idempotent.

use alistaire_ir::{IrError, JobDescription, OperationKind, SlotId};
use proptest::prelude::*;

/// Operations of every arity, with a fixed angle for the rotations.
fn arb_kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![
        Just(OperationKind::H),
        Just(OperationKind::X),
        Just(OperationKind::Rz(0.5)),
        Just(OperationKind::CX),
        Just(OperationKind::CZ),
        Just(OperationKind::Swap),
        Just(OperationKind::CCX),
    ]
}

proptest! {
    #[test]
    fn accepted_targets_are_in_range(
        slot_count in 1_u32..=8,
        kind in arb_kind(),
        raw in prop::collection::vec(0_u32..16, 3),
    ) {
        let mut job = JobDescription::new(slot_count).unwrap();
        let targets: Vec<SlotId> = raw[..kind.num_targets()].iter().copied().map(SlotId).collect();

        let result = job.apply(kind, targets).map(|_| ());

        match result {
            Ok(()) => {
                for op in job.operations() {
                    for slot in &op.targets {
                        prop_assert!(slot.0 < slot_count);
                    }
                }
            }
            Err(IrError::SlotOutOfRange { slot, .. }) => {
                prop_assert!(slot.0 >= slot_count);
                prop_assert!(job.is_empty());
            }
            Err(IrError::DuplicateTarget { .. }) => {
                prop_assert!(job.is_empty());
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_always_fails(slot_count in 1_u32..=8, excess in 0_u32..100) {
        let mut job = JobDescription::new(slot_count).unwrap();
        let result = job.h(SlotId(slot_count + excess));
        let is_out_of_range = matches!(result, Err(IrError::SlotOutOfRange { .. }));
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn observe_all_is_idempotent(n in 1_u32..=6) {
        let mut job = JobDescription::ghz(n).unwrap();
        let first = job.clone();
        job.observe_all().unwrap();
        prop_assert_eq!(job, first);
    }
}
