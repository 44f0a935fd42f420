//! Property-based tests for tracking and merging.
//!
//! - Clones keep every reference and context
//! - Re-tracking without an origin keeps identity
//! - `unmake` after `make` is the identity on plain data
//! - Merging into an empty map yields the source

use proptest::prelude::*;
use quilt_core::{make, merge, unmake, Node, Tree};
use serde_json::{json, Map, Value};

/// Map keys, including ones that collide with the dotted path syntax.
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,6}",
        1 => "[a-z0-9.~]{0,4}",
        1 => prop::sample::select(vec!["", "0", "01", "a.b", "~e"]).prop_map(String::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| json!(i)),
        "[a-z ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn composite_strategy() -> impl Strategy<Value = Value> {
    value_strategy().prop_map(|v| match v {
        Value::Object(_) | Value::Array(_) => v,
        other => json!({ "value": other }),
    })
}

proptest! {
    #[test]
    fn clone_keeps_identity(value in composite_strategy()) {
        let tree: Tree = make(value, None).unwrap();
        let cloned = tree.clone();
        prop_assert_eq!(cloned.reference(), tree.reference());
        prop_assert_eq!(cloned.contexts(), tree.contexts());
    }

    #[test]
    fn remake_keeps_identity(value in composite_strategy()) {
        let tree: Tree = make(value, None).unwrap();
        let again: Tree = make(&tree, None).unwrap();
        prop_assert_eq!(again.reference(), tree.reference());

        let before: Vec<_> = tree.reference_index().keys().cloned().collect();
        let after: Vec<_> = again.reference_index().keys().cloned().collect();
        prop_assert_eq!(before, after);

        for context in again.contexts().iter() {
            let previous = tree.contexts().get(&context.reference).unwrap();
            prop_assert_eq!(context.created_at, previous.created_at);
            prop_assert_eq!(&context.origin_reference, &previous.origin_reference);
            prop_assert!(context.update_index > previous.update_index);
        }
    }

    #[test]
    fn unmake_inverts_make(value in composite_strategy()) {
        let tree: Tree = make(value.clone(), None).unwrap();
        prop_assert_eq!(unmake(&tree), Node::from(value));
    }

    #[test]
    fn no_self_loops(value in composite_strategy()) {
        let tree: Tree = make(value, None).unwrap();
        for context in tree.contexts().iter() {
            prop_assert_ne!(context.origin_reference.as_ref(), Some(&context.reference));
        }
    }

    #[test]
    fn merge_into_empty_is_identity(value in composite_strategy()) {
        let tree: Tree = make(value, None).unwrap();
        let merged = merge(&Tree::from(json!({})), &tree);
        prop_assert_eq!(merged.root(), tree.root());
        prop_assert_eq!(merged.contexts(), tree.contexts());
    }
}
