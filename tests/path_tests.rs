use fnstream::path::{get_path, set_path};
use fnstream::StreamError;
use serde_json::json;

#[test]
fn test_get_nested_keys() {
    let doc = json!({"a": {"b": 1}});
    assert_eq!(get_path("a.b", &doc).unwrap(), Some(&json!(1)));
    assert_eq!(get_path("a", &doc).unwrap(), Some(&json!({"b": 1})));
}

#[test]
fn test_get_missing_is_none() {
    let doc = json!({"a": {"b": 1}});
    assert_eq!(get_path("a.x", &doc).unwrap(), None);
    assert_eq!(get_path("a.b.c", &doc).unwrap(), None);
}

#[test]
fn test_get_array_index() {
    let doc = json!({"rows": [10, 20]});
    assert_eq!(get_path("rows.1", &doc).unwrap(), Some(&json!(20)));
    assert_eq!(get_path("rows.5", &doc).unwrap(), None);
}

#[test]
fn test_get_with_selectors() {
    let doc = json!({
        "people": [
            {"name": "ann", "age": 30},
            {"name": "bob", "age": 41}
        ],
        "rows": [
            {"id": 3, "cells": ["x", "y"]}
        ]
    });

    assert_eq!(get_path("people[name=\"bob\"].age", &doc).unwrap(), Some(&json!(41)));
    assert_eq!(get_path("people[name='ann'].age", &doc).unwrap(), Some(&json!(30)));
    assert_eq!(get_path("rows[id=3].cells.0", &doc).unwrap(), Some(&json!("x")));
    assert_eq!(get_path("people[name=\"cy\"].age", &doc).unwrap(), None);
}

#[test]
fn test_set_creates_intermediate_objects() {
    let mut doc = json!({});
    set_path("a.b.c", &mut doc, json!(5)).unwrap();
    assert_eq!(doc, json!({"a": {"b": {"c": 5}}}));

    set_path("a.b.d", &mut doc, json!("x")).unwrap();
    assert_eq!(doc, json!({"a": {"b": {"c": 5, "d": "x"}}}));
}

#[test]
fn test_set_replaces_scalars_on_the_way() {
    let mut doc = json!({"a": 1});
    set_path("a.b", &mut doc, json!(true)).unwrap();
    assert_eq!(doc, json!({"a": {"b": true}}));
}

#[test]
fn test_set_through_selector() {
    let mut doc = json!({"people": [{"name": "bob", "age": 41}]});

    set_path("people[name=\"bob\"].age", &mut doc, json!(42)).unwrap();
    assert_eq!(doc, json!({"people": [{"name": "bob", "age": 42}]}));

    // no match appends a new element carrying the selected property
    set_path("people[name=\"ann\"].age", &mut doc, json!(30)).unwrap();
    assert_eq!(
        doc,
        json!({"people": [{"name": "bob", "age": 42}, {"name": "ann", "age": 30}]})
    );
}

#[test]
fn test_set_array_elements() {
    let mut doc = json!({"cells": ["x"]});
    set_path("cells.0", &mut doc, json!("y")).unwrap();
    set_path("cells.1", &mut doc, json!("z")).unwrap();
    assert_eq!(doc, json!({"cells": ["y", "z"]}));

    assert!(set_path("cells.5", &mut doc, json!("gap")).is_err());
}

#[test]
fn test_invalid_paths() {
    let mut doc = json!({});
    assert!(matches!(get_path("a..b", &doc), Err(StreamError::InvalidPath(_))));
    assert!(matches!(get_path("a[id=1", &doc), Err(StreamError::InvalidPath(_))));
    assert!(matches!(
        set_path("a[id=1]", &mut doc, json!(1)),
        Err(StreamError::InvalidPath(_))
    ));
}
