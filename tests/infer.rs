//! End-to-end classifier behaviour over realistic column data, including the
//! interaction between key discovery and the second classification pass.

use csv_design::infer::{Inference, KeyColumn, KeyMap, infer_column_type};
use csv_design::keys::discover_keys;
use csv_design::model::DataType;
use csv_design::patterns::PatternLibrary;
use csv_design::report::BufferedReporter;
use csv_design::source::RelationSource;

fn classify(field_name: &str, values: &[String], key_map: Option<&KeyMap>) -> Inference {
    let patterns = PatternLibrary::default();
    let mut reporter = BufferedReporter::default();
    infer_column_type("specimen", field_name, values, key_map, &patterns, &mut reporter)
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn keyed_elsewhere() -> KeyMap {
    let mut map = KeyMap::new();
    map.insert(
        "specimen".to_string(),
        KeyColumn {
            field_name: "specimen_id".to_string(),
            values: Vec::new(),
        },
    );
    map
}

#[test]
fn distinct_non_blank_column_becomes_manual_key() {
    let values: Vec<String> = (1..=20).map(|i| format!("S{i:03}")).collect();
    let inference = classify("specimen_id", &values, None);
    assert_eq!(inference.detected_type, Some(DataType::ManualKey));
    assert!(inference.is_key);
    assert!(!inference.nullable);
    assert!(inference.null_values.is_empty());
}

#[test]
fn distinct_column_with_key_elsewhere_is_ordinary_data() {
    let map = keyed_elsewhere();
    let labels: Vec<String> = (1..=20).map(|i| format!("L{i:03}")).collect();
    let inference = classify("label", &labels, Some(&map));
    assert_ne!(inference.detected_type, Some(DataType::ManualKey));
    assert!(!inference.is_key);

    let counts: Vec<String> = (1..=20).map(|i| i.to_string()).collect();
    let inference = classify("count", &counts, Some(&map));
    assert_eq!(inference.detected_type, Some(DataType::Integer));
    assert!(!inference.nullable);
}

#[test]
fn integer_column_with_blanks_is_nullable_without_null_token() {
    let map = keyed_elsewhere();
    let mut values: Vec<String> = (1..=20).map(|i| i.to_string()).collect();
    values.push(String::new());
    let inference = classify("count", &values, Some(&map));
    assert_eq!(inference.detected_type, Some(DataType::Integer));
    assert!(inference.nullable);
    // The odd value is treated as a null sentinel but no token is recorded.
    assert!(inference.null_values.is_empty());
}

#[test]
fn uniform_two_place_decimals_size_the_column() {
    let map = keyed_elsewhere();
    let values: Vec<String> = (10..51).map(|i| format!("{i}.25")).collect();
    let inference = classify("weight", &values, Some(&map));
    assert_eq!(inference.detected_type, Some(DataType::Decimal));
    assert!(!inference.nullable);
    assert_eq!(inference.max_seen_decimals, Some(2));
    // Longest literal is five characters wide.
    assert_eq!(inference.max_length, Some(5 + 2 + 4));
}

#[test]
fn mixed_precision_numerics_take_the_widest_scale() {
    let map = keyed_elsewhere();
    let inference = classify("depth", &owned(&["1", "1.1", "2.300"]), Some(&map));
    assert_eq!(inference.detected_type, Some(DataType::Decimal));
    assert!(!inference.nullable);
    assert_eq!(inference.max_seen_decimals, Some(3));
}

#[test]
fn yes_no_column_reclassifies_as_boolean() {
    let inference = classify("flag", &owned(&["Y", "N", "Y", "N", "Y", "N"]), None);
    assert_eq!(inference.detected_type, Some(DataType::Boolean));
    assert!(!inference.nullable);
    assert!(inference.null_values.is_empty());
}

#[test]
fn yes_no_column_with_blanks_is_nullable_boolean_without_token() {
    let inference = classify("flag", &owned(&["Y", "N", "", "Y", "N", "Y"]), None);
    assert_eq!(inference.detected_type, Some(DataType::Boolean));
    assert!(inference.nullable);
    assert!(inference.null_values.is_empty());
}

#[test]
fn yes_no_unknown_column_is_nullable_boolean_with_token() {
    let inference = classify("flag", &owned(&["Y", "N", "U", "Y", "N", "U"]), None);
    assert_eq!(inference.detected_type, Some(DataType::Boolean));
    assert!(inference.nullable);
    assert_eq!(inference.null_values, vec!["U".to_string()]);
}

#[test]
fn repeated_short_values_become_enumerated_text() {
    let mut values = Vec::new();
    for _ in 0..4 {
        values.extend(owned(&["red", "green", "blue"]));
    }
    values.push(String::new());
    let inference = classify("color", &values, None);
    assert_eq!(inference.detected_type, Some(DataType::Text));
    assert!(inference.nullable);
    assert_eq!(inference.choices, vec!["blue", "green", "red"]);
    assert_eq!(inference.max_length, Some(2 * "green".len()));
}

#[test]
fn key_discovery_takes_leftmost_distinct_column_per_relation() {
    let specimens = RelationSource {
        name: "specimen".to_string(),
        headers: vec!["Specimen ID".to_string(), "Tag".to_string()],
        rows: (1..=12)
            .map(|i| vec![format!("S{i:03}"), format!("T{i:03}")])
            .collect(),
    };
    let notes = RelationSource {
        name: "note".to_string(),
        headers: vec!["Body".to_string()],
        rows: (1..=12).map(|_| vec!["same entry".to_string()]).collect(),
    };

    let patterns = PatternLibrary::default();
    let mut reporter = BufferedReporter::default();
    let key_map = discover_keys(&[specimens, notes], &patterns, &mut reporter);

    assert_eq!(key_map.len(), 1);
    assert_eq!(key_map["specimen"].field_name, "specimen_id");
    assert!(
        reporter
            .messages
            .iter()
            .any(|m| m.contains("note")),
        "keyless relation should be reported: {:?}",
        reporter.messages
    );
}
