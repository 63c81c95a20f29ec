use chrono::{DateTime, NaiveDate};
use entity_serde::{
    Arguments, Entity, ErrorKind, Map, ModuleRef, Result, TypeRef, Value, deserialize, entity,
    function_ref, register_function, tag, untag,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;

entity! {
    pub struct Item {
        pub value: Value,
    }
}

entity! {
    pub struct NestedItem {
        pub value: Item,
    }
}

entity! {
    pub struct NestedList {
        pub value: Value,
    }
}

entity! {
    pub struct NestedDictItem {
        pub value: Value,
    }
}

entity! {
    pub struct Catalog {
        pub items: BTreeMap<String, Item>,
    }
}

fn double(args: Arguments) -> Result<Value> {
    let n = args.get("n", 0).and_then(Value::as_i64).unwrap_or_default();
    Ok(Value::from(n * 2))
}

register_function!(double);

fn item(value: impl Into<Value>) -> Item {
    Item::new(value.into()).unwrap()
}

/// Serializes, checks the blob, deserializes it back and validates.
fn assert_roundtrip<T: Entity>(entity: &T, expect: serde_json::Value) {
    entity.validate().unwrap();
    assert_eq!(entity.serialize().unwrap(), expect);
    assert_eq!(&T::deserialize(&expect).unwrap(), entity);
    assert_eq!(
        deserialize(&expect).unwrap().as_entity::<T>(),
        Some(entity)
    );
}

// ── Entities ─────────────────────────────────────────────────────

#[test]
fn item_serializes_with_identifier() {
    assert_roundtrip(
        &item(1),
        json!({"value": 1, "__ser__": "serializer_tests:Item"}),
    );
}

#[test]
fn missing_required_argument_is_type_error() {
    let err = Item::construct(Map::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert!(err.to_string().contains("'value'"));
}

#[test]
fn nested_entity() {
    let nested = NestedItem::new(item(5)).unwrap();
    assert_roundtrip(
        &nested,
        json!({
            "value": {"value": 5, "__ser__": "serializer_tests:Item"},
            "__ser__": "serializer_tests:NestedItem",
        }),
    );
}

#[test]
fn nested_list_of_entities() {
    let nested = NestedList::new(Value::list([item(5)])).unwrap();
    assert_roundtrip(
        &nested,
        json!({
            "value": [{"value": 5, "__ser__": "serializer_tests:Item"}],
            "__ser__": "serializer_tests:NestedList",
        }),
    );
}

#[test]
fn nested_dict_of_entities() {
    let mut value = Map::new();
    value.insert("key".into(), item(5).into());
    let nested = NestedDictItem::new(Value::Map(value)).unwrap();
    assert_roundtrip(
        &nested,
        json!({
            "value": {"key": {"value": 5, "__ser__": "serializer_tests:Item"}},
            "__ser__": "serializer_tests:NestedDictItem",
        }),
    );
}

#[test]
fn typed_map_of_entities() {
    let mut items = BTreeMap::new();
    items.insert("a".to_string(), item(1));
    items.insert("b".to_string(), item("two"));
    let catalog = Catalog::new(items).unwrap();
    assert_roundtrip(
        &catalog,
        json!({
            "items": {
                "a": {"value": 1, "__ser__": "serializer_tests:Item"},
                "b": {"value": "two", "__ser__": "serializer_tests:Item"},
            },
            "__ser__": "serializer_tests:Catalog",
        }),
    );
}

#[test]
fn to_map_is_shallow() {
    let mut expect = Map::new();
    expect.insert("value".into(), Value::from(1));
    assert_eq!(item(1).to_map(), expect);

    let outer = item(item(1));
    let map = outer.to_map();
    assert_eq!(map["value"].as_entity::<Item>(), Some(&item(1)));
}

// ── Built-in kinds ───────────────────────────────────────────────

#[test]
fn tuple() {
    let tuple_item = NestedList::new(Value::tuple([3, 1])).unwrap();
    assert_roundtrip(
        &tuple_item,
        json!({
            "value": {"__ser__": "tuple", "value": [3, 1]},
            "__ser__": "serializer_tests:NestedList",
        }),
    );
}

#[test]
fn nested_tuple() {
    let tuple_item = NestedList::new(Value::tuple([Value::tuple([3]), Value::tuple([1])])).unwrap();
    assert_roundtrip(
        &tuple_item,
        json!({
            "value": {
                "__ser__": "tuple",
                "value": [
                    {"__ser__": "tuple", "value": [3]},
                    {"__ser__": "tuple", "value": [1]},
                ],
            },
            "__ser__": "serializer_tests:NestedList",
        }),
    );
}

#[test]
fn ordered_dict_keeps_entry_order() {
    let ordered = NestedDictItem::new(Value::ordered_map([(3, "a"), (2, "c")])).unwrap();
    let expect = json!({
        "value": {"__ser__": "OrderedDict", "value": [[3, "a"], [2, "c"]]},
        "__ser__": "serializer_tests:NestedDictItem",
    });
    assert_roundtrip(&ordered, expect.clone());

    let reversed = NestedDictItem::new(Value::ordered_map([(2, "c"), (3, "a")])).unwrap();
    assert_ne!(NestedDictItem::deserialize(&expect).unwrap(), reversed);
}

#[test]
fn date() {
    let date = NaiveDate::from_ymd_opt(2015, 11, 11).unwrap();
    assert_roundtrip(
        &item(date),
        json!({
            "value": {"__ser__": "date", "value": "20151111"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn aware_datetime() {
    let now = DateTime::parse_from_rfc3339("2015-11-11T10:20:30.123456+00:00").unwrap();
    assert_roundtrip(
        &item(now),
        json!({
            "value": {"__ser__": "datetime", "value": "2015-11-11T10:20:30.123456+00:00"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn datetime_keeps_non_utc_offset() {
    let dt = DateTime::parse_from_rfc3339("2020-02-29T23:59:59+09:30").unwrap();
    let restored = Item::deserialize(&item(dt).serialize().unwrap()).unwrap();
    let Value::DateTime(restored) = restored.value else {
        panic!("expected a datetime");
    };
    assert_eq!(restored.offset(), Some(*dt.offset()));
}

#[test]
fn naive_datetime() {
    let dt = NaiveDate::from_ymd_opt(2015, 11, 11)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    assert_roundtrip(
        &item(dt),
        json!({
            "value": {"__ser__": "datetime", "value": "2015-11-11T08:00:00"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn decimal() {
    let d = Decimal::from_str("0.02521").unwrap();
    assert_roundtrip(
        &item(d),
        json!({
            "value": {"__ser__": "Decimal", "value": "0.02521"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn set_of_primitives() {
    assert_roundtrip(
        &item(Value::set([1, 2, 3])),
        json!({
            "value": {"__ser__": "set", "value": [1, 2, 3]},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn set_elements_are_tagged() {
    let date = NaiveDate::from_ymd_opt(2015, 11, 11).unwrap();
    let d = Decimal::from_str("1.5").unwrap();
    assert_roundtrip(
        &item(Value::set([Value::from(date), Value::from(d), item(1).into()])),
        json!({
            "value": {
                "__ser__": "set",
                "value": [
                    {"__ser__": "date", "value": "20151111"},
                    {"__ser__": "Decimal", "value": "1.5"},
                    {"value": 1, "__ser__": "serializer_tests:Item"},
                ],
            },
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn set_equality_ignores_wire_order() {
    let blob = json!({
        "value": {"__ser__": "set", "value": [3, 1, 2]},
        "__ser__": "serializer_tests:Item",
    });
    assert_eq!(Item::deserialize(&blob).unwrap(), item(Value::set([1, 2, 3])));
}

// ── References ───────────────────────────────────────────────────

#[test]
fn type_reference() {
    assert_roundtrip(
        &item(TypeRef::of::<NestedItem>()),
        json!({
            "value": {"__ser__": "type", "value": "serializer_tests:NestedItem"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn function_reference_survives_and_stays_callable() {
    let holder = item(function_ref!(double));
    assert_roundtrip(
        &holder,
        json!({
            "value": {"__ser__": "function", "value": "serializer_tests:double"},
            "__ser__": "serializer_tests:Item",
        }),
    );

    let restored = Item::deserialize(&holder.serialize().unwrap()).unwrap();
    let Value::Function(f) = restored.value else {
        panic!("expected a function reference");
    };
    assert_eq!(f.call(Arguments::new().arg(21)).unwrap(), Value::from(42));
}

#[test]
fn module_reference() {
    assert_roundtrip(
        &item(ModuleRef::new("serializer_tests")),
        json!({
            "value": {"__ser__": "module", "value": "serializer_tests"},
            "__ser__": "serializer_tests:Item",
        }),
    );
}

#[test]
fn unknown_references_are_lookup_errors() {
    for blob in [
        json!({"__ser__": "type", "value": "serializer_tests:Missing"}),
        json!({"__ser__": "function", "value": "serializer_tests:missing"}),
        json!({"__ser__": "module", "value": "no_such_module"}),
        json!({"__ser__": "elsewhere:Item", "value": 1}),
        json!({"__ser__": "serializer_tests:Nope", "value": 1}),
    ] {
        let err = untag(&blob).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup, "{blob}");
    }
}

#[test]
fn function_is_not_a_type() {
    let blob = json!({"__ser__": "type", "value": "serializer_tests:double"});
    assert_eq!(untag(&blob).unwrap_err().kind(), ErrorKind::Lookup);
}

// ── Free functions ───────────────────────────────────────────────

#[test]
fn tag_and_untag_plain_containers() {
    let mut map = Map::new();
    map.insert("xs".into(), Value::list([1, 2]));
    map.insert("t".into(), Value::tuple(["a"]));
    let value = Value::Map(map);

    let blob = tag(&value).unwrap();
    assert_eq!(
        blob,
        json!({"xs": [1, 2], "t": {"__ser__": "tuple", "value": ["a"]}})
    );
    assert_eq!(untag(&blob).unwrap(), value);
}

#[test]
fn deserialize_returns_entity_value() {
    let blob = json!({"value": 1, "__ser__": "serializer_tests:Item"});
    let value = deserialize(&blob).unwrap();
    assert_eq!(value, Value::from(item(1)));
    let Value::Entity(entity) = value else {
        panic!("expected an entity");
    };
    assert_eq!(entity.entity_type(), TypeRef::of::<Item>());
}

#[test]
fn deserialize_as_ignores_outer_marker() {
    let blob = json!({"value": 1, "__ser__": "renamed_module:OldItem"});
    assert_eq!(Item::deserialize(&blob).unwrap(), item(1));
}

#[test]
fn deserialize_as_rejects_non_objects() {
    let err = Item::deserialize(&json!([1, 2])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn json_text_roundtrip() {
    let nested = NestedItem::new(item(Value::tuple([1, 2]))).unwrap();
    let text = entity_serde::to_json_string(&nested).unwrap();
    let back: NestedItem = entity_serde::from_json_str(&text).unwrap();
    assert_eq!(back, nested);
}

#[test]
fn wrong_nested_entity_type_is_type_error() {
    let blob = json!({
        "value": {"items": {}, "__ser__": "serializer_tests:Catalog"},
        "__ser__": "serializer_tests:NestedItem",
    });
    let err = NestedItem::deserialize(&blob).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}
