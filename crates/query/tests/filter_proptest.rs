//! Property-based tests for filter trees.
//!
//! These tests verify the algebraic properties of the filter operations for
//! randomly generated trees: canonical keys are deterministic, rendering
//! round-trips through the parser, merging is idempotent, and value
//! admission follows AND/OR semantics.

use proptest::prelude::*;
use qopt_core::Value;
use qopt_query::ast::{FilterNode, LogicalOp, Operator};
use qopt_query::parser::parse_filters;
use hashbrown::HashSet;

const NAMES: [&str; 4] = ["a", "b", "status", "author.name"];

/// Strategy for unsigned scalar literals, including floats far from 1.0.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..10_000).prop_map(Value::Int64),
        (0u32..10_000, 1u32..100)
            .prop_map(|(whole, cents)| Value::Float64(whole as f64 + cents as f64 / 100.0)),
        (1u32..1000, -20i32..30)
            .prop_map(|(mantissa, exp)| Value::Float64(mantissa as f64 * 10f64.powi(exp))),
        "[a-z' ]{0,8}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Boolean),
    ]
}

/// Strategy for a well-formed comparison on `name`.
fn leaf_for(name: &'static str) -> BoxedStrategy<FilterNode> {
    prop_oneof![
        (
            prop::sample::select(vec![
                Operator::Eq,
                Operator::Ne,
                Operator::Gt,
                Operator::Ge,
                Operator::Lt,
                Operator::Le,
            ]),
            scalar_strategy(),
        )
            .prop_map(move |(op, v)| FilterNode::expression(name, op, v).unwrap()),
        prop::sample::select(vec![Operator::Eq, Operator::Ne])
            .prop_map(move |op| FilterNode::expression(name, op, Value::Null).unwrap()),
        prop::collection::vec(scalar_strategy(), 1..4)
            .prop_map(move |values| FilterNode::expression(name, Operator::In, values).unwrap()),
        (0i64..100, 0i64..100).prop_map(move |(low, high)| {
            FilterNode::expression(name, Operator::Bw, vec![Value::Int64(low), Value::Int64(high)])
                .unwrap()
        }),
    ]
    .boxed()
}

fn leaf_strategy() -> impl Strategy<Value = FilterNode> {
    prop::sample::select(NAMES.to_vec()).prop_flat_map(leaf_for)
}

/// Strategy for binary trees as the parser builds them.
fn tree_strategy() -> impl Strategy<Value = FilterNode> {
    leaf_strategy().prop_recursive(3, 12, 2, |inner| {
        (any::<bool>(), inner.clone(), inner).prop_map(|(and, left, right)| {
            if and {
                FilterNode::and(vec![left, right])
            } else {
                FilterNode::or(vec![left, right])
            }
        })
    })
}

/// Strategy for flat trees in which every property appears once.
fn distinct_tree_strategy() -> impl Strategy<Value = FilterNode> {
    (
        prop::sample::subsequence(NAMES.to_vec(), 1..=NAMES.len()),
        any::<bool>(),
    )
        .prop_flat_map(|(names, and)| {
            let leaves: Vec<BoxedStrategy<FilterNode>> = names.into_iter().map(leaf_for).collect();
            (leaves, Just(and))
        })
        .prop_map(|(mut leaves, and)| {
            if leaves.len() == 1 {
                leaves.remove(0)
            } else if and {
                FilterNode::and(leaves)
            } else {
                FilterNode::or(leaves)
            }
        })
}

fn candidate_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), scalar_strategy()]
}

proptest! {
    /// Property: Parsing the same text twice yields the same canonical key.
    #[test]
    fn canonical_key_is_deterministic(tree in tree_strategy()) {
        let text = tree.to_string();
        let first = parse_filters(&text).unwrap();
        let second = parse_filters(&text).unwrap();
        prop_assert_eq!(first.canonical_key(), second.canonical_key());
        prop_assert_eq!(first.canonical_key(), tree.canonical_key());
    }

    /// Property: Rendering a tree and parsing the text yields the same tree.
    #[test]
    fn display_round_trips(tree in tree_strategy()) {
        let text = tree.to_string();
        let parsed = parse_filters(&text).unwrap();
        prop_assert_eq!(parsed, tree);
    }

    /// Property: Merging a tree into itself twice equals merging once.
    #[test]
    fn merge_with_self_is_idempotent(tree in tree_strategy()) {
        let mut once = tree.clone();
        once.merge_from(&tree, LogicalOp::And);
        let mut twice = once.clone();
        twice.merge_from(&tree, LogicalOp::And);
        prop_assert_eq!(twice, once);
    }

    /// Property: A tree with distinct properties is unchanged by merging
    /// itself, since every comparison overwrites its own property.
    #[test]
    fn merge_distinct_overwrites_rather_than_duplicates(tree in distinct_tree_strategy()) {
        let mut merged = tree.clone();
        merged.merge_from(&tree, LogicalOp::And);
        prop_assert_eq!(merged.expressions().len(), tree.expressions().len());
        prop_assert_eq!(merged, tree);
    }

    /// Property: Merging another tree twice equals merging it once.
    #[test]
    fn merge_other_is_idempotent(
        base in distinct_tree_strategy(),
        other in distinct_tree_strategy(),
        or in any::<bool>(),
    ) {
        let join = if or { LogicalOp::Or } else { LogicalOp::And };
        let mut once = base.clone();
        once.merge_from(&other, join);
        let mut twice = once.clone();
        twice.merge_from(&other, join);
        prop_assert_eq!(&twice, &once);

        let properties: HashSet<&str> = once.expressions().iter().map(|e| e.property()).collect();
        prop_assert_eq!(properties.len(), once.expressions().len());
    }

    /// Property: AND admits a value exactly when both sides admit it.
    #[test]
    fn admits_value_and(
        a in tree_strategy(),
        b in tree_strategy(),
        name in prop::sample::select(NAMES.to_vec()),
        candidate in candidate_strategy(),
    ) {
        let expected = a.admits_value(name, &candidate) && b.admits_value(name, &candidate);
        let combined = FilterNode::and(vec![a, b]);
        prop_assert_eq!(combined.admits_value(name, &candidate), expected);
    }

    /// Property: OR admits a value exactly when either side admits it.
    #[test]
    fn admits_value_or(
        a in tree_strategy(),
        b in tree_strategy(),
        name in prop::sample::select(NAMES.to_vec()),
        candidate in candidate_strategy(),
    ) {
        let expected = a.admits_value(name, &candidate) || b.admits_value(name, &candidate);
        let combined = FilterNode::or(vec![a, b]);
        prop_assert_eq!(combined.admits_value(name, &candidate), expected);
    }

    /// Property: The first match is the head of all matches.
    #[test]
    fn find_first_is_head_of_find_all(
        tree in tree_strategy(),
        name in prop::sample::select(NAMES.to_vec()),
    ) {
        let first = tree.find_first_by_property(name, None);
        let all = tree.find_all_by_property(name, None);
        prop_assert_eq!(first, all.first().copied());
        prop_assert!(all.iter().all(|e| e.property() == name));
    }
}
