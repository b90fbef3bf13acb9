//! Replay through JSON rebuilds arbitrary node graphs.

use bean_model::{invoke, Value};
use bean_persist::{Encoder, FailureLog};
use bean_program::Program;
use bean_test_utils::*;
use proptest::prelude::*;

fn next_of(value: &Value) -> Value {
    invoke(value, "getNext", &[]).unwrap_or(Value::Null)
}

fn name_of(value: &Value) -> Value {
    invoke(value, "getName", &[]).unwrap_or(Value::Null)
}

proptest! {
    #[test]
    fn node_chains_survive_json(
        names in prop::collection::vec("[a-z]{1,3}", 1..6),
        close in any::<bool>(),
    ) {
        let ty = node_type();
        let nodes: Vec<Value> = names.iter().map(|n| node(&ty, n)).collect();
        for pair in nodes.windows(2) {
            set(&pair[0], "next", pair[1].clone());
        }
        if close {
            if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
                set(last, "next", first.clone());
            }
        }

        let failures = FailureLog::new();
        let mut encoder = Encoder::new()
            .with_types(fixture_types())
            .with_listener(failures.clone());
        let program = Program::encode(&mut encoder, &nodes[..1]).unwrap();
        prop_assert!(failures.is_empty());
        prop_assert_eq!(program.slot_count(), nodes.len());

        let json = program.to_json().unwrap();
        let roots = Program::from_json(&json).unwrap().replay(&fixture_types()).unwrap();
        let head = roots[0].clone();
        let mut cursor = head.clone();
        for name in &names {
            prop_assert!(name_of(&cursor).equals(&Value::str(name)));
            cursor = next_of(&cursor);
        }
        if close {
            prop_assert!(cursor.same(&head));
        } else {
            prop_assert!(cursor.is_null());
        }
    }
}
