use crate::production::Literal;
use crate::{
    build_node, lookup_node_type, parse_strvec, register_node_type, ConfigKind, ConfigSchema,
    ConfigValue, ErrorKind, NodeTypeInfo, SchemaEntry, StrVec,
};
use std::collections::BTreeMap;
use std::rc::Rc;

fn dict(entries: Vec<(&str, ConfigValue)>) -> ConfigValue {
    ConfigValue::Dict(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn schema_rejects_duplicate_keys() {
    let schema = ConfigSchema::new(vec![
        SchemaEntry::new("word", "A word.", ConfigKind::Str),
        SchemaEntry::new("word", "The same word again.", ConfigKind::Str),
    ]);
    assert_eq!(schema.check().unwrap_err().kind(), ErrorKind::AlreadyExists);
}

#[test]
fn schema_rejects_reserved_keys() {
    let schema = ConfigSchema::new(vec![SchemaEntry::new("id", "Stolen key.", ConfigKind::Str)]);
    assert_eq!(schema.check().unwrap_err().kind(), ErrorKind::NotPermitted);
}

#[test]
fn schema_rejects_keyless_dict_entries() {
    let schema = ConfigSchema::new(vec![SchemaEntry::element("No key.", ConfigKind::Str)]);
    assert_eq!(schema.check().unwrap_err().kind(), ErrorKind::BadFormat);
}

#[test]
fn schema_list_requires_one_element_entry() {
    let schema = ConfigSchema::new(vec![SchemaEntry::new(
        "items",
        "A list without element schema.",
        ConfigKind::List,
    )]);
    assert_eq!(schema.check().unwrap_err().kind(), ErrorKind::BadFormat);
}

#[test]
fn validate_enforces_types_and_mandatory_keys() {
    let schema = ConfigSchema::new(vec![
        SchemaEntry::new("word", "A word.", ConfigKind::Str).mandatory(),
        SchemaEntry::new("count", "A count.", ConfigKind::U64),
    ]);
    schema.check().unwrap();

    schema
        .validate(&dict(vec![
            ("word", ConfigValue::Str("x".into())),
            ("count", ConfigValue::U64(3)),
        ]))
        .unwrap();

    // missing mandatory key
    let err = schema
        .validate(&dict(vec![("count", ConfigValue::U64(3))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);

    // unknown key
    let err = schema
        .validate(&dict(vec![
            ("word", ConfigValue::Str("x".into())),
            ("bogus", ConfigValue::U64(3)),
        ]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);

    // type mismatch
    let err = schema
        .validate(&dict(vec![("word", ConfigValue::U64(1))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}

#[test]
fn config_values_compare_structurally() {
    let a = dict(vec![
        ("word", ConfigValue::Str("x".into())),
        ("list", ConfigValue::List(vec![ConfigValue::I64(1)])),
    ]);
    let b = a.clone();
    assert_eq!(a, b);
    let c = dict(vec![
        ("word", ConfigValue::Str("y".into())),
        ("list", ConfigValue::List(vec![ConfigValue::I64(1)])),
    ]);
    assert_ne!(a, c);
}

#[test]
fn build_node_by_type_name() {
    let node = build_node(
        "str",
        Some("id_word"),
        &dict(vec![("string", ConfigValue::Str("hello".into()))]),
    )
    .unwrap();
    assert_eq!(node.type_name(), "str");
    assert_eq!(node.base().id(), Some("id_word"));

    let input: StrVec = ["hello"].as_slice().into();
    assert!(parse_strvec(&node, &input).unwrap().matches());
}

#[test]
fn build_node_rejects_bad_configs() {
    // unknown type name
    let err = build_node("no_such_type", None, &dict(vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // missing mandatory key
    let err = build_node("str", None, &dict(vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);

    // empty integer range
    let err = build_node(
        "int",
        None,
        &dict(vec![
            ("min", ConfigValue::I64(10)),
            ("max", ConfigValue::I64(0)),
        ]),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // callback based types have no configuration surface
    let err = build_node("dynamic", None, &dict(vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotPermitted);
}

#[test]
fn build_composite_nodes() {
    let x = build_node(
        "str",
        None,
        &dict(vec![("string", ConfigValue::Str("x".into()))]),
    )
    .unwrap();
    let y = build_node(
        "str",
        None,
        &dict(vec![("string", ConfigValue::Str("y".into()))]),
    )
    .unwrap();
    let seq = build_node(
        "seq",
        None,
        &dict(vec![(
            "children",
            ConfigValue::List(vec![ConfigValue::Node(x), ConfigValue::Node(y)]),
        )]),
    )
    .unwrap();

    let input: StrVec = ["x", "y"].as_slice().into();
    assert!(parse_strvec(&seq, &input).unwrap().matches());
    let input: StrVec = ["y", "x"].as_slice().into();
    assert!(!parse_strvec(&seq, &input).unwrap().matches());
}

#[test]
fn registry_rejects_duplicates_unless_overridden() {
    let first = NodeTypeInfo {
        name: "test_dup_type",
        schema: Some(ConfigSchema::new(Vec::new())),
        build: |_, _| Ok(Rc::new(Literal::new("first"))),
    };
    register_node_type(first.clone(), false).unwrap();
    let err = register_node_type(first, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn registry_override_shadows_previous_type() {
    let first = NodeTypeInfo {
        name: "test_override_type",
        schema: Some(ConfigSchema::new(Vec::new())),
        build: |_, _| Ok(Rc::new(Literal::new("first"))),
    };
    let second = NodeTypeInfo {
        name: "test_override_type",
        schema: Some(ConfigSchema::new(Vec::new())),
        build: |_, _| Ok(Rc::new(Literal::new("second"))),
    };
    register_node_type(first, false).unwrap();
    register_node_type(second, true).unwrap();

    assert!(lookup_node_type("test_override_type").is_some());
    let node = build_node("test_override_type", None, &dict(vec![])).unwrap();
    assert_eq!(node.describe(), "second");
}
