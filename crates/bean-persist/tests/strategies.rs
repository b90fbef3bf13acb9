//! Built-in strategies end to end.

use bean_model::{builtins, invoke, Value};
use bean_persist::prelude::*;
use bean_persist::strategies::DefaultStrategy;
use bean_test_utils::*;
use pretty_assertions::assert_eq;

fn encode(value: &Value) -> (Encoder, FailureLog) {
    init_tracing();
    let failures = FailureLog::new();
    let mut encoder = Encoder::new()
        .with_types(fixture_types())
        .with_listener(failures.clone());
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
fn list_elements_are_appended() {
    let list = list_of(vec![Value::Int(1), Value::str("two")]);
    let (mut encoder, failures) = encode(&list);

    assert!(failures.is_empty());
    assert_eq!(
        rendered(&encoder, &list),
        vec!["List.add(1);", r#"List.add("two");"#]
    );
    assert!(encoder.get(&list).equals(&list));
}

#[test]
fn sets_and_maps_are_refilled() {
    let tags = set_of(vec![Value::str("a"), Value::str("b")]);
    let scores = map_of(vec![(Value::str("x"), Value::Int(1))]);
    let (mut encoder, _) = encode(&tags);
    encoder.write_object(&scores);

    assert_eq!(rendered(&encoder, &tags).len(), 2);
    assert_eq!(rendered(&encoder, &scores), vec![r#"Map.put("x", 1);"#]);
    assert!(encoder.get(&scores).equals(&scores));
}

#[test]
fn map_entries_with_null_values_are_kept() {
    let map = map_of(vec![(Value::str("empty"), Value::Null)]);
    let (mut encoder, _) = encode(&map);

    assert_eq!(rendered(&encoder, &map), vec![r#"Map.put("empty", null);"#]);
    let replay = encoder.get(&map);
    assert!(invoke(&replay, "containsKey", &[Value::str("empty")])
        .unwrap()
        .equals(&Value::Bool(true)));
}

#[test]
fn collection_properties_are_built_then_assigned() {
    let ty = team_type();
    let team = ty.construct(&[]).unwrap();
    let members = list_of(vec![Value::str("ada")]);
    set(&team, "members", members.clone());
    let (mut encoder, failures) = encode(&team);

    assert!(failures.is_empty());
    assert_eq!(rendered(&encoder, &team), vec!["Team.setMembers(List);"]);
    assert_eq!(rendered(&encoder, &members), vec![r#"List.add("ada");"#]);
    let replay = encoder.get(&team);
    assert!(slot(&replay, "members").equals(&members));
}

#[test]
fn unmodifiable_views_wrap_a_fresh_copy() {
    let frozen = invoke(
        &Value::Type(builtins::lookup("Collections").unwrap()),
        "unmodifiableList",
        &[list_of(vec![Value::Int(4)])],
    )
    .unwrap();
    let (mut encoder, failures) = encode(&frozen);

    assert!(failures.is_empty());
    let creation = encoder.log().creation(&frozen).unwrap();
    assert_eq!(creation.operation(), "unmodifiableList");
    let replay = encoder.get(&frozen);
    assert_eq!(replay.runtime_type().unwrap().name(), "UnmodifiableList");
    assert!(replay.equals(&frozen));
}

#[test]
fn unmodifiable_views_of_beans_hold_replay_members() {
    let p = point(&point_type(), 2, 3);
    let frozen = invoke(
        &Value::Type(builtins::lookup("Collections").unwrap()),
        "unmodifiableList",
        &[list_of(vec![p.clone()])],
    )
    .unwrap();
    let (mut encoder, failures) = encode(&frozen);

    assert!(failures.is_empty(), "{:?}", failures.failures());
    let replay = encoder.get(&frozen);
    let items = replay.as_object().unwrap().elements().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].same(&encoder.get(&p)));
    assert!(!items[0].same(&p));
    assert!(slot(&items[0], "x").equals(&Value::Int(2)));
}

#[test]
fn unmodifiable_view_after_its_member_was_written() {
    let p = point(&point_type(), 1, 0);
    let frozen = invoke(
        &Value::Type(builtins::lookup("Collections").unwrap()),
        "unmodifiableMap",
        &[map_of(vec![(Value::str("origin"), p.clone())])],
    )
    .unwrap();
    let holder = builtins::new_array(
        &builtins::object(),
        vec![p.clone(), frozen.clone()],
    );
    let (mut encoder, failures) = encode(&holder);

    assert!(failures.is_empty(), "{:?}", failures.failures());
    let replay = encoder.get(&frozen);
    let origin = invoke(&replay, "get", &[Value::str("origin")]).unwrap();
    assert!(origin.same(&encoder.get(&p)));
    assert_eq!(encoder.log().creation(&frozen).unwrap().operation(), "unmodifiableMap");
}

#[test]
fn dates_use_epoch_millis() {
    let date = builtins::date().construct(&[Value::Long(86_400_000)]).unwrap();
    let (mut encoder, _) = encode(&date);

    let creation = encoder.log().creation(&date).unwrap();
    assert!(creation.arguments()[0].equals(&Value::Long(86_400_000)));
    assert!(rendered(&encoder, &date).is_empty());
    assert!(encoder.get(&date).equals(&date));
}

#[test]
fn enum_constants_are_looked_up_by_name() {
    let color = color_type();
    let shape = shape_type(&color).construct(&[]).unwrap();
    let green = color.enum_constant("GREEN").unwrap();
    set(&shape, "color", green.clone());
    let (mut encoder, _) = encode(&shape);

    assert_eq!(rendered(&encoder, &shape), vec!["Shape.setColor(Color.GREEN);"]);
    let creation = encoder.log().creation(&green).unwrap();
    assert_eq!(creation.operation(), "valueOf");
    assert!(slot(&encoder.get(&shape), "color").same(&green));
}

#[test]
fn property_constants_replace_literals() {
    let label = label_type().construct(&[]).unwrap();
    set(&label, "alignment", 4);
    let (encoder, _) = encode(&label);

    assert_eq!(rendered(&encoder, &label), vec!["Label.setAlignment(4);"]);
    let creation = encoder.log().creation(&Value::Int(4)).unwrap();
    match creation.target() {
        Value::Field(field) => assert_eq!(field.name(), "RIGHT"),
        other => panic!("expected a constant, found {other}"),
    }
}

#[test]
fn public_fields_are_diffed() {
    let record = record_type().construct(&[]).unwrap();
    set(&record, "note", "remember");
    set(&record, "count", 3);
    let (mut encoder, failures) = encode(&record);

    assert!(failures.is_empty());
    assert_eq!(
        rendered(&encoder, &record),
        vec![r#"Record.note.set(Record, "remember");"#, "Record.count.set(Record, 3);"]
    );
    let replay = encoder.get(&record);
    assert!(slot(&replay, "count").equals(&Value::Int(3)));
}

#[test]
fn event_handler_listeners_are_registered() {
    let action = action_listener_type();
    let component_listener = component_listener_type();
    let component = component_type(&component_listener);
    let button_ty = button_type(&component, &action);

    let counter = counter_type().construct(&[]).unwrap();
    let button = button_ty.construct(&[]).unwrap();
    let listener = event_listener(&action, &counter, "increment");
    invoke(&button, "addActionListener", &[listener.clone()]).unwrap();
    let internal = event_listener(&component_listener, &counter, "increment");
    invoke(&button, "addComponentListener", &[internal]).unwrap();

    let (mut encoder, failures) = encode(&button);
    assert!(failures.is_empty());
    assert_eq!(
        rendered(&encoder, &button),
        vec!["Button.addActionListener(Proxy$ui_ActionListener);"]
    );
    let creation = encoder.log().creation(&listener).unwrap();
    assert_eq!(creation.operation(), "create");
    assert_eq!(creation.arguments().len(), 3);

    // The replay listener drives the replay counter.
    let replay_button = encoder.get(&button);
    let replay_counter = encoder.get(&counter);
    let replay_listeners = invoke(&replay_button, "getActionListeners", &[]).unwrap();
    let first = replay_listeners.as_object().unwrap().elements().unwrap()[0].clone();
    invoke(&first, "actionPerformed", &[Value::Null]).unwrap();
    assert!(slot(&replay_counter, "count").equals(&Value::Int(1)));
    assert!(slot(&counter, "count").equals(&Value::Int(0)));
}

#[test]
fn listener_roots_are_configurable() {
    let action = action_listener_type();
    let component = component_type(&component_listener_type());
    let button = button_type(&component, &action).construct(&[]).unwrap();
    let counter = counter_type().construct(&[]).unwrap();
    invoke(
        &button,
        "addActionListener",
        &[event_listener(&action, &counter, "increment")],
    )
    .unwrap();

    let mut encoder = Encoder::with_config(EncoderConfig::new().with_listener_roots(["ui.Other"]));
    encoder.write_object(&button);
    assert_eq!(encoder.log().statements(&button).count(), 0);
}

#[test]
fn listener_dropped_from_a_wired_component_is_removed_by_position() {
    let action = action_listener_type();
    let component = component_type(&component_listener_type());
    let wiring = action.clone();
    let wired_ty = TypeBuilder::class("ui.Wired")
        .extends(&component)
        .listener_set(&action)
        .constructor(&[], move |ty, _| {
            let wired = Value::Object(bean_model::ObjectRef::instantiate(ty));
            let counter = counter_type().construct(&[])?;
            invoke(
                &wired,
                "addActionListener",
                &[event_listener(&wiring, &counter, "increment")],
            )?;
            Ok(wired)
        })
        .build();
    let wired = wired_ty.construct(&[]).unwrap();
    let registered = invoke(&wired, "getActionListeners", &[]).unwrap();
    let own = registered.as_object().unwrap().elements().unwrap()[0].clone();
    invoke(&wired, "removeActionListener", &[own]).unwrap();

    let (mut encoder, _) = encode(&wired);
    assert_eq!(
        rendered(&encoder, &wired),
        vec!["Wired.removeActionListener(Proxy$ui_ActionListener);"]
    );
    // The statement names the candidate's listener, which is written as a
    // fresh value, so the constructor's registration survives on replay.
    let replay = encoder.get(&wired);
    let left = invoke(&replay, "getActionListeners", &[]).unwrap();
    assert_eq!(left.as_object().unwrap().len(), Some(1));
}

#[test]
fn listeners_are_read_through_get_listeners_by_class() {
    fn store(this: &Value) -> bean_model::InvokeResult<Value> {
        let obj = this.as_object().unwrap();
        if let Some(list @ Value::Object(_)) = obj.slot("registered") {
            return Ok(list);
        }
        let list = list_of(vec![]);
        obj.set_slot("registered", list.clone())?;
        Ok(list)
    }

    let action = action_listener_type();
    let component = component_type(&component_listener_type());
    let action_type = action.clone();
    let panel_ty = TypeBuilder::class("ui.Panel")
        .extends(&component)
        .slot("registered", "List")
        .method("addActionListener", &["ui.ActionListener"], None, |this, args| {
            invoke(&store(this)?, "add", &[args[0].clone()])?;
            Ok(Value::Null)
        })
        .method("removeActionListener", &["ui.ActionListener"], None, |this, args| {
            invoke(&store(this)?, "remove", &[args[0].clone()])?;
            Ok(Value::Null)
        })
        .method("getListeners", &["Class"], Some("Object[]"), move |this, _| {
            let items = store(this)?.as_object().unwrap().elements().unwrap_or_default();
            Ok(builtins::new_array(&action_type, items))
        })
        .build();

    let info = bean_introspect::Introspector::new().bean_info(&panel_ty).unwrap();
    assert_eq!(info.event_sets()[0].get_method(), None);

    let panel = panel_ty.construct(&[]).unwrap();
    let counter = counter_type().construct(&[]).unwrap();
    invoke(
        &panel,
        "addActionListener",
        &[event_listener(&action, &counter, "increment")],
    )
    .unwrap();
    let (mut encoder, failures) = encode(&panel);

    assert!(failures.is_empty(), "{:?}", failures.failures());
    assert_eq!(
        rendered(&encoder, &panel),
        vec!["Panel.addActionListener(Proxy$ui_ActionListener);"]
    );
    let replay = encoder.get(&panel);
    let listeners = invoke(&replay, "getListeners", &[Value::Type(action)]).unwrap();
    assert_eq!(listeners.as_object().unwrap().len(), Some(1));
}

#[test]
fn transient_event_sets_are_not_diffed() {
    let action = action_listener_type();
    let component = component_type(&component_listener_type());
    let quiet = TypeBuilder::class("ui.Quiet")
        .extends(&component)
        .property("text", "String")
        .listener_set(&action)
        .transient("action")
        .build()
        .construct(&[])
        .unwrap();
    let counter = counter_type().construct(&[]).unwrap();
    invoke(
        &quiet,
        "addActionListener",
        &[event_listener(&action, &counter, "increment")],
    )
    .unwrap();
    set(&quiet, "text", "hush");
    let (encoder, failures) = encode(&quiet);

    assert!(failures.is_empty());
    assert_eq!(rendered(&encoder, &quiet), vec![r#"Quiet.setText("hush");"#]);
}

#[test]
fn declared_strategy_attribute_is_honoured() {
    let ty = TypeBuilder::class("demo.Pinned")
        .property("x", "int")
        .property("y", "int")
        .attribute(
            bean_persist::STRATEGY_ATTRIBUTE,
            DeclaredStrategy::attribute(DefaultStrategy::with_constructor_properties(["x", "y"])),
        )
        .constructor(&["int", "int"], |ty, args| {
            let obj = bean_model::ObjectRef::instantiate(ty);
            obj.set_slot("x", args[0].clone())?;
            obj.set_slot("y", args[1].clone())?;
            Ok(Value::Object(obj))
        })
        .build();
    let pinned = ty.construct(&[Value::Int(6), Value::Int(7)]).unwrap();
    let (mut encoder, failures) = encode(&pinned);

    assert!(failures.is_empty());
    assert_eq!(encoder.persistence_strategy(&pinned).name(), "default");
    assert_eq!(encoder.log().creation(&pinned).unwrap().arguments().len(), 2);
    assert!(rendered(&encoder, &pinned).is_empty());
}
