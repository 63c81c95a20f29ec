use entity_serde::{Entity, Error, ErrorKind, Map, Value, entity};
use pretty_assertions::assert_eq;
use serde_json::json;

fn positive(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n > 0.0)
}

entity! {
    pub struct ItemWithContract {
        pub value: Option<Value> => |f| f.contract(positive),
    }
}

entity! {
    pub struct Item {
        pub value: Value,
    }
}

entity! {
    pub struct Range {
        pub low: i64 => |f| f.contract(|v| v.as_i64().is_some_and(|n| n >= 0)),
        pub high: i64 => |f| f.contract(|v| v.as_i64().is_some_and(|n| n <= 100)),
    }
}

// ── Contracts ────────────────────────────────────────────────────

#[test]
fn null_is_exempt_from_contract() {
    let item = ItemWithContract::new(None).unwrap();
    let blob = item.serialize().unwrap();
    assert_eq!(blob, json!({"value": null, "__ser__": "contract_tests:ItemWithContract"}));
    assert_eq!(ItemWithContract::deserialize(&blob).unwrap(), item);
}

#[test]
fn contract_violation_on_construction() {
    let err = ItemWithContract::new(Some(Value::from(-1))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(
        err.to_string(),
        "break the contract for value, ItemWithContract"
    );

    ItemWithContract::new(Some(Value::from(3))).unwrap();
}

#[test]
fn contract_violation_through_construct() {
    let mut kwargs = Map::new();
    kwargs.insert("value".into(), Value::from(0));
    let err = ItemWithContract::construct(kwargs).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { .. }));
}

#[test]
fn contract_violation_on_deserialize() {
    let blob = json!({"value": -5, "__ser__": "contract_tests:ItemWithContract"});
    let err = ItemWithContract::deserialize(&blob).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn struct_literal_is_checked_on_demand() {
    let literal = ItemWithContract {
        value: Some(Value::from(-1)),
    };
    assert!(matches!(
        literal.clone().checked(),
        Err(Error::ContractViolation { .. })
    ));
    assert!(matches!(
        literal.validate(),
        Err(Error::ContractViolation { .. })
    ));
}

#[test]
fn fields_are_checked_in_declaration_order() {
    let err = Range::new(-1, 500).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { ref field, .. } if field == "low"));

    let err = Range::new(0, 500).unwrap_err();
    assert!(matches!(err, Error::ContractViolation { ref field, .. } if field == "high"));

    Range::new(0, 100).unwrap().validate().unwrap();
}

// ── Null enforcement ─────────────────────────────────────────────

#[test]
fn null_in_required_field_rejected_on_construction() {
    let err = Item::new(Value::Null).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(err.to_string(), "value is not optional");
}

#[test]
fn null_in_required_field_rejected_on_serialize() {
    let literal = Item { value: Value::Null };
    let err = literal.serialize().unwrap_err();
    assert!(matches!(err, Error::NotOptional { ref entity, .. } if entity == "Item"));
}

#[test]
fn null_in_required_field_rejected_on_validate() {
    let err = Item { value: Value::Null }.validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn nested_null_fails_outer_serialize() {
    let outer = Item::new(Value::from(Item { value: Value::Null })).unwrap();
    let err = outer.serialize().unwrap_err();
    assert!(matches!(err, Error::NotOptional { .. }));
}
