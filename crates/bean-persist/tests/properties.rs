//! Property-based checks of redundancy elimination and replay fidelity.

use bean_model::{builtins, PrimitiveKind, Value};
use bean_persist::prelude::*;
use bean_test_utils::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn point_statements_match_non_default_coordinates(x in -50i32..50, y in -50i32..50) {
        let p = point(&point_type(), x, y);
        let failures = FailureLog::new();
        let mut encoder = Encoder::new().with_listener(failures.clone());
        encoder.write_object(&p);

        let expected = usize::from(x != 0) + usize::from(y != 0);
        prop_assert_eq!(encoder.log().statements(&p).count(), expected);
        prop_assert!(failures.is_empty());

        let replay = encoder.get(&p);
        prop_assert!(slot(&replay, "x").equals(&Value::Int(x)));
        prop_assert!(slot(&replay, "y").equals(&Value::Int(y)));
    }

    #[test]
    fn array_sets_only_non_default_elements(items in prop::collection::vec(-3i64..3, 0..12)) {
        let values: Vec<Value> = items.iter().copied().map(Value::Long).collect();
        let array = builtins::new_array(&builtins::primitive(PrimitiveKind::Long), values.clone());
        let mut encoder = Encoder::new();
        encoder.write_object(&array);

        let non_default = items.iter().filter(|v| **v != 0).count();
        prop_assert_eq!(encoder.log().statements(&array).count(), non_default);

        let replay = encoder.get(&array);
        let rebuilt = replay.as_object().and_then(bean_model::ObjectRef::elements).unwrap_or_default();
        prop_assert_eq!(rebuilt.len(), values.len());
        for (a, b) in rebuilt.iter().zip(&values) {
            prop_assert!(a.equals(b));
        }
    }

    #[test]
    fn lists_replay_to_equal_contents(items in prop::collection::vec("[a-c]{0,2}", 0..8)) {
        let list = list_of(items.iter().map(Value::str).collect());
        let mut encoder = Encoder::new();
        encoder.write_object(&list);

        prop_assert_eq!(encoder.log().statements(&list).count(), items.len());
        prop_assert!(encoder.get(&list).equals(&list));
    }
}
