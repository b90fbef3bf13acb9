//! Core encoding guarantees: redundancy elimination, identity, cycles,
//! constructor properties and failure containment.

use bean_model::{builtins, invoke, PrimitiveKind, TypeBuilder, Value};
use bean_persist::prelude::*;
use bean_persist::strategies::NullStrategy;
use bean_test_utils::*;
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn encoder() -> (Encoder, FailureLog) {
    init_tracing();
    let failures = FailureLog::new();
    let encoder = Encoder::new()
        .with_types(fixture_types())
        .with_listener(failures.clone());
    (encoder, failures)
}

fn encode(value: &Value) -> (Encoder, FailureLog) {
    let (mut encoder, failures) = encoder();
    encoder.write_object(value);
    (encoder, failures)
}

fn rendered(encoder: &Encoder, value: &Value) -> Vec<String> {
    encoder
        .log()
        .statements(value)
        .map(ToString::to_string)
        .collect()
}

#[test]
fn default_valued_bean_needs_no_statements() {
    let p = point(&point_type(), 0, 0);
    let (encoder, failures) = encode(&p);

    assert!(rendered(&encoder, &p).is_empty());
    assert!(failures.is_empty());
    let creation = encoder.log().creation(&p).unwrap();
    assert_eq!(creation.to_string(), "Point=Point.new();");
}

#[test]
fn only_differing_properties_are_written() {
    let p = point(&point_type(), 3, 0);
    let (encoder, _) = encode(&p);
    assert_eq!(rendered(&encoder, &p), vec!["Point.setX(3);"]);
}

#[test]
fn unchanged_immutable_properties_bind_nothing() {
    let p = point(&point_type(), 0, 7);
    let (encoder, _) = encode(&p);

    assert!(encoder.log().creation(&Value::Int(0)).is_none());
    assert!(!encoder.tracker().contains(&Value::Int(0)));
    assert_eq!(rendered(&encoder, &p), vec!["Point.setY(7);"]);
}

#[test]
fn writing_twice_is_a_no_op() {
    let p = point(&point_type(), 1, 2);
    let (mut encoder, _) = encode(&p);
    let before = rendered(&encoder, &p);
    encoder.write_object(&p);
    assert_eq!(rendered(&encoder, &p), before);
    assert_eq!(encoder.log().roots().len(), 1);
}

#[test]
fn reached_values_can_still_become_roots() {
    let ty = node_type();
    let a = node(&ty, "a");
    let b = node(&ty, "b");
    set(&a, "next", b.clone());
    let (mut encoder, _) = encode(&a);
    let statements = rendered(&encoder, &b);

    encoder.write_object(&b);
    encoder.write_object(&b);
    assert_eq!(encoder.log().roots().len(), 2);
    assert!(encoder.log().roots()[1].same(&b));
    assert_eq!(rendered(&encoder, &b), statements);
}

#[test]
fn replay_counterpart_matches_original() {
    let p = point(&point_type(), 4, -2);
    let (mut encoder, _) = encode(&p);
    let replay = encoder.get(&p);

    assert!(!replay.same(&p));
    assert!(slot(&replay, "x").equals(&Value::Int(4)));
    assert!(slot(&replay, "y").equals(&Value::Int(-2)));
}

#[test]
fn shared_values_map_to_one_replay_value() {
    let p = point(&point_type(), 1, 1);
    let list = list_of(vec![p.clone(), p.clone()]);
    let (mut encoder, _) = encode(&list);

    let replay = encoder.get(&list);
    let items = replay.as_object().unwrap().elements().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].same(&items[1]));
    assert!(items[0].same(&encoder.get(&p)));
    assert!(encoder.log().is_multiply_referenced(&p));
    assert_eq!(encoder.log().statements(&p).count(), 2);
}

#[test]
fn self_reference_terminates() {
    let ty = node_type();
    let n = node(&ty, "solo");
    set(&n, "next", n.clone());
    let (mut encoder, failures) = encode(&n);

    assert!(failures.is_empty());
    assert_eq!(
        rendered(&encoder, &n),
        vec![r#"Node.setName("solo");"#, "Node.setNext(Node);"]
    );
    let replay = encoder.get(&n);
    assert!(slot(&replay, "next").same(&replay));
}

#[test]
fn two_node_cycle_is_rebuilt() {
    let ty = node_type();
    let a = node(&ty, "a");
    let b = node(&ty, "b");
    set(&a, "next", b.clone());
    set(&b, "next", a.clone());
    let (mut encoder, failures) = encode(&a);

    assert!(failures.is_empty());
    let a2 = encoder.get(&a);
    let b2 = encoder.get(&b);
    assert!(slot(&a2, "next").same(&b2));
    assert!(slot(&b2, "next").same(&a2));
    assert!(slot(&b2, "name").equals(&Value::str("b")));
}

#[test]
fn constructor_properties_feed_the_constructor() {
    let r = rect(&rect_type(), 3, 4, 7);
    let (encoder, failures) = encode(&r);

    assert!(failures.is_empty());
    let creation = encoder.log().creation(&r).unwrap();
    assert_eq!(creation.operation(), "new");
    assert!(creation.arguments()[0].equals(&Value::Int(3)));
    assert!(creation.arguments()[1].equals(&Value::Int(4)));
    assert_eq!(rendered(&encoder, &r), vec!["Rect.setC(7);"]);
}

#[test]
fn constructor_properties_with_default_remainder() {
    let r = rect(&rect_type(), 3, 4, 0);
    let (encoder, _) = encode(&r);
    assert!(rendered(&encoder, &r).is_empty());
}

#[test]
fn arrays_set_only_non_default_elements() {
    let ints = builtins::new_array(
        &builtins::primitive(PrimitiveKind::Int),
        vec![Value::Int(0), Value::Int(5), Value::Int(7)],
    );
    let (mut encoder, failures) = encode(&ints);

    assert!(failures.is_empty());
    assert_eq!(
        rendered(&encoder, &ints),
        vec!["intArray.set(1, 5);", "intArray.set(2, 7);"]
    );
    let replay = encoder.get(&ints);
    let items = replay.as_object().unwrap().elements().unwrap();
    assert!(items[2].equals(&Value::Int(7)));
}

#[test]
fn failing_getter_is_reported_once_and_skipped() {
    let ty = flaky_type();
    let f = ty.construct(&[]).unwrap();
    set(&f, "alpha", 1);
    set(&f, "beta", 2);
    set(&f, "gamma", 3);
    let (encoder, failures) = encode(&f);

    assert_eq!(failures.len(), 1);
    let failure = &failures.failures()[0];
    assert!(matches!(
        failure,
        EncodeError::Property { property, .. } if property == "beta"
    ));
    assert!(matches!(failure.root_cause(), EncodeError::Evaluation { .. }));
    assert_eq!(
        rendered(&encoder, &f),
        vec!["Flaky.setAlpha(1);", "Flaky.setGamma(3);"]
    );
}

#[test]
fn self_dependent_construction_is_reported() {
    let link = TypeBuilder::class("demo.Link")
        .read_only_property("peer", "demo.Link")
        .constructor(&["demo.Link"], |ty, args| {
            let obj = bean_model::ObjectRef::instantiate(ty);
            obj.set_slot("peer", args[0].clone())?;
            Ok(Value::Object(obj))
        })
        .constructor_properties(&["peer"])
        .build();
    let l = link.construct(&[Value::Null]).unwrap();
    l.as_object().unwrap().set_slot("peer", l.clone()).unwrap();

    let (encoder, failures) = encode(&l);
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures.failures()[0].root_cause(),
        EncodeError::CyclicConstruction { .. }
    ));
    assert!(encoder.log().roots().is_empty());
}

#[test]
fn strategy_that_never_accepts_its_instance_is_cut_off() {
    #[derive(Debug)]
    struct NeverSatisfied;

    impl PersistenceStrategy for NeverSatisfied {
        fn name(&self) -> &'static str {
            "never-satisfied"
        }

        fn mutates_to(&self, _: &Value, _: &Value) -> bool {
            false
        }

        fn instantiate(
            &self,
            old: &Value,
            _: &mut Encoder,
        ) -> bean_persist::EncodeResult<Expression> {
            Ok(Expression::with_value(
                old.clone(),
                old.runtime_type().unwrap(),
                "new",
                vec![],
            ))
        }
    }

    let (mut encoder, failures) = encoder();
    encoder.set_persistence_strategy("demo.Point", Rc::new(NeverSatisfied));
    encoder.write_object(&point(&point_type(), 1, 1));

    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures.failures()[0],
        EncodeError::Unreproducible { .. }
    ));
}

#[test]
fn explicit_strategy_overrides_resolution() {
    let (mut encoder, _) = encoder();
    encoder.set_persistence_strategy("demo.Point", Rc::new(NullStrategy));
    let p = point(&point_type(), 5, 5);
    encoder.write_object(&p);

    assert!(encoder.log().creation(&p).is_none());
    assert_eq!(encoder.persistence_strategy(&p).name(), "null");
}

#[test]
fn malformed_and_failing_statements_are_dropped() {
    let (mut encoder, failures) = encoder();
    let p = point(&point_type(), 0, 0);
    encoder.write_object(&p);

    encoder
        .write_statement(&Statement::new(Value::Null, "setX", vec![Value::Int(1)]))
        .unwrap();
    encoder
        .write_statement(&Statement::new(p.clone(), "frobnicate", vec![]))
        .unwrap();
    encoder
        .write_statement(&Statement::new(p.clone(), "setY", vec![Value::Int(9)]))
        .unwrap();

    let kinds: Vec<_> = failures
        .failures()
        .iter()
        .map(|f| match f {
            EncodeError::Malformed { .. } => "malformed",
            EncodeError::Discarded { .. } => "discarded",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["malformed", "discarded"]);
    assert_eq!(rendered(&encoder, &p), vec!["Point.setY(9);"]);
    assert!(slot(&encoder.get(&p), "y").equals(&Value::Int(9)));
}

#[test]
fn statements_follow_replay_state() {
    let (mut encoder, _) = encoder();
    let p = point(&point_type(), 0, 0);
    encoder.write_object(&p);
    encoder
        .write_statement(&Statement::new(p.clone(), "setX", vec![Value::Int(2)]))
        .unwrap();

    let replay = encoder.get(&p);
    assert!(invoke(&replay, "getX", &[]).unwrap().equals(&Value::Int(2)));
}

#[test]
fn get_of_unknown_value_is_null() {
    let (mut encoder, failures) = encoder();
    assert!(encoder.get(&point(&point_type(), 1, 1)).is_null());
    assert!(encoder.get(&Value::str("text")).equals(&Value::str("text")));
    assert!(failures.is_empty());
}

#[test]
fn clear_resets_the_session() {
    let p = point(&point_type(), 1, 2);
    let (mut encoder, _) = encode(&p);
    assert!(!encoder.tracker().is_empty());

    encoder.clear();
    assert!(encoder.tracker().is_empty());
    assert!(encoder.log().is_empty());

    encoder.write_object(&p);
    assert_eq!(rendered(&encoder, &p).len(), 2);
}

#[test]
fn disabling_recording_keeps_bindings_only() {
    init_tracing();
    let mut encoder =
        Encoder::with_config(EncoderConfig::new().with_record_statements(false));
    let p = point(&point_type(), 1, 2);
    encoder.write_object(&p);

    assert!(encoder.log().is_empty());
    assert!(slot(&encoder.get(&p), "y").equals(&Value::Int(2)));
}
