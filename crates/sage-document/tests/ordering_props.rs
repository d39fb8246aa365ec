//! Property tests for sibling ordering.
//!
//! Whatever sequence of inserts, removals, and reorders a scope sees,
//! `order_index` must stay contiguous from zero afterwards.

use proptest::prelude::*;

use sage_document::{
    apply_order, insert_renumbered, insertion_index, is_contiguous, remove_renumbered, renumber,
    Orderable, Step, StepDraft,
};

#[derive(Debug, Clone)]
enum Op {
    Append,
    InsertAt(usize),
    InsertAfterNth(usize),
    RemoveNth(usize),
    Reverse,
    RotateLeft(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Append),
        (0usize..16).prop_map(Op::InsertAt),
        (0usize..16).prop_map(Op::InsertAfterNth),
        (0usize..16).prop_map(Op::RemoveNth),
        Just(Op::Reverse),
        (0usize..16).prop_map(Op::RotateLeft),
    ]
}

fn fresh_step(n: usize) -> Step {
    Step::from_draft(StepDraft {
        activity: format!("step {n}"),
        notes: None,
    })
}

fn apply(steps: &mut Vec<Step>, op: Op, counter: &mut usize) {
    *counter += 1;
    match op {
        Op::Append => {
            let at = insertion_index(steps, None);
            insert_renumbered(steps, at, fresh_step(*counter));
        }
        Op::InsertAt(raw) => {
            insert_renumbered(steps, raw, fresh_step(*counter));
        }
        Op::InsertAfterNth(raw) => {
            let anchor = if steps.is_empty() {
                None
            } else {
                Some(steps[raw % steps.len()].entity_id())
            };
            let at = insertion_index(steps, anchor);
            insert_renumbered(steps, at, fresh_step(*counter));
        }
        Op::RemoveNth(raw) => {
            if !steps.is_empty() {
                let id = steps[raw % steps.len()].entity_id();
                let _ = remove_renumbered(steps, id);
            }
        }
        Op::Reverse => {
            let mut order: Vec<_> = steps.iter().map(Orderable::entity_id).collect();
            order.reverse();
            apply_order(steps, &order).expect("reversal lists every sibling once");
        }
        Op::RotateLeft(raw) => {
            let mut order: Vec<_> = steps.iter().map(Orderable::entity_id).collect();
            if !order.is_empty() {
                let by = raw % order.len();
                order.rotate_left(by);
            }
            apply_order(steps, &order).expect("rotation lists every sibling once");
        }
    }
}

proptest! {
    #[test]
    fn any_edit_sequence_keeps_order_contiguous(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut steps: Vec<Step> = Vec::new();
        let mut counter = 0usize;
        for op in ops {
            apply(&mut steps, op, &mut counter);
            prop_assert!(is_contiguous(&steps), "gap after {steps:?}");
        }
    }

    #[test]
    fn reorder_is_a_permutation(seed in prop::collection::vec(0usize..32, 1..12)) {
        let mut steps: Vec<Step> = (0..seed.len()).map(fresh_step).collect();
        renumber(&mut steps);
        let before: Vec<_> = steps.iter().map(|s| s.id).collect();

        // Build a permutation by repeatedly rotating.
        for by in seed {
            let mut order: Vec<_> = steps.iter().map(Orderable::entity_id).collect();
            let len = order.len();
            order.rotate_left(by % len);
            apply_order(&mut steps, &order).expect("rotation lists every sibling once");
        }

        let mut after: Vec<_> = steps.iter().map(|s| s.id).collect();
        let mut expected = before;
        after.sort();
        expected.sort();
        prop_assert_eq!(after, expected);
        prop_assert!(is_contiguous(&steps));
    }
}
