use entity_serde::{
    Arguments, Entity, Error, ErrorKind, FunctionRef, Map, Partial, Registry, Result, TypeRef,
    Value, entity, function_ref, partial, register_function,
};
use pretty_assertions::assert_eq;
use serde_json::json;

entity! {
    pub struct Greeting {
        pub name: String,
        pub punctuation: String => |f| f.default_value("!"),
    }
}

fn scale(args: Arguments) -> Result<Value> {
    let value = args.get("value", 0).and_then(Value::as_i64).unwrap_or_default();
    let factor = args.get("factor", 1).and_then(Value::as_i64).unwrap_or(1);
    Ok(Value::from(value * factor))
}

register_function!(scale);

fn kwargs(entries: &[(&str, Value)]) -> Map {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

// ── Calling ──────────────────────────────────────────────────────

#[test]
fn partial_function_merges_stored_kwargs() {
    let triple = partial(function_ref!(scale), kwargs(&[("factor", Value::from(3))])).unwrap();
    let out = triple.call(Arguments::new().kwarg("value", 5)).unwrap();
    assert_eq!(out, Value::from(15));
}

#[test]
fn partial_type_constructs_entity() {
    let greet = partial(
        TypeRef::of::<Greeting>(),
        kwargs(&[("punctuation", Value::from("?"))]),
    )
    .unwrap();
    let out = greet.call(Arguments::new().arg("bob")).unwrap();
    assert_eq!(
        out.as_entity::<Greeting>(),
        Some(&Greeting {
            name: "bob".into(),
            punctuation: "?".into(),
        })
    );
}

#[test]
fn duplicate_keyword_is_rejected() {
    let triple = partial(function_ref!(scale), kwargs(&[("factor", Value::from(3))])).unwrap();
    let err = triple
        .call(Arguments::new().kwarg("value", 1).kwarg("factor", 4))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert!(matches!(err, Error::DuplicateArgument(ref name) if name == "factor"));
}

#[test]
fn positional_argument_colliding_with_stored_keyword_is_rejected() {
    let greet = partial(
        TypeRef::of::<Greeting>(),
        kwargs(&[("name", Value::from("amy"))]),
    )
    .unwrap();
    let err = greet.call(Arguments::new().arg("bob")).unwrap_err();
    assert!(matches!(err, Error::DuplicateArgument(ref name) if name == "name"));
}

#[test]
fn call_with_explicit_registry() {
    let greet = partial(TypeRef::of::<Greeting>(), Map::new()).unwrap();
    let err = greet
        .call_with(&Registry::new(), Arguments::new().arg("bob"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);

    let mut registry = Registry::new();
    registry.register::<Greeting>();
    assert!(greet.call_with(&registry, Arguments::new().arg("bob")).is_ok());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn only_references_can_be_wrapped() {
    let err = partial(Value::from(42), Map::new()).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { ref field, .. } if field == "func"));
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn partial_roundtrips() {
    let triple = partial(function_ref!(scale), kwargs(&[("factor", Value::from(3))])).unwrap();
    let blob = triple.serialize().unwrap();
    assert_eq!(
        blob,
        json!({
            "func": {"__ser__": "function", "value": "partial_tests:scale"},
            "kwargs": {"factor": 3},
            "__ser__": "entity_serde::partial:Partial",
        })
    );

    let restored = Partial::deserialize(&blob).unwrap();
    assert_eq!(restored, triple);
    assert_eq!(
        restored.call(Arguments::new().arg(2)).unwrap(),
        Value::from(6)
    );
    triple.validate().unwrap();
}

#[test]
fn partial_nested_in_kwargs_roundtrips() {
    let inner = partial(TypeRef::of::<Greeting>(), Map::new()).unwrap();
    let outer = partial(
        FunctionRef::new("partial_tests", "scale", scale),
        kwargs(&[("then", Value::from(inner))]),
    )
    .unwrap();
    outer.validate().unwrap();
}
