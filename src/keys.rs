//! Key discovery: the first of the two analysis passes.
//!
//! Scans every relation's columns left-to-right with no key map; the first
//! column that classifies as a key is recorded for that relation and the scan
//! moves on. Relations without a qualifying column are simply absent from the
//! map, and the analyze step synthesizes a surrogate key for them.

use crate::infer::{KeyColumn, KeyMap, infer_column_type};
use crate::names::field_identifier;
use crate::patterns::PatternLibrary;
use crate::report::Reporter;
use crate::source::RelationSource;

pub fn discover_keys(
    sources: &[RelationSource],
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> KeyMap {
    let mut key_map = KeyMap::new();

    for source in sources {
        let mut found = false;
        for (index, header) in source.headers.iter().enumerate() {
            let field_name = field_identifier(header);
            let values = source.column(index);
            let inference =
                infer_column_type(&source.name, &field_name, &values, None, patterns, reporter);
            if inference.is_key {
                key_map.insert(
                    source.name.clone(),
                    KeyColumn { field_name, values },
                );
                found = true;
                break;
            }
        }
        if !found {
            reporter.warn(&format!(
                "No key column found in relation '{}'; a surrogate key will be generated",
                source.name
            ));
        }
    }

    key_map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BufferedReporter;

    fn source(name: &str, headers: &[&str], rows: &[&[&str]]) -> RelationSource {
        RelationSource {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn first_qualifying_column_wins() {
        let src = source(
            "specimen",
            &["code", "label"],
            &[&["a1", "x1"], &["a2", "x2"], &["a3", "x3"]],
        );
        let patterns = PatternLibrary::default();
        let mut reporter = BufferedReporter::default();
        let map = discover_keys(&[src], &patterns, &mut reporter);
        assert_eq!(map.get("specimen").unwrap().field_name, "code");
    }

    #[test]
    fn keyless_relations_stay_absent_independently() {
        let a = source("a", &["flag"], &[&["y"], &["y"], &["n"]]);
        let b = source("b", &["status"], &[&["open"], &["open"], &["shut"]]);
        let patterns = PatternLibrary::default();
        let mut reporter = BufferedReporter::default();
        let map = discover_keys(&[a, b], &patterns, &mut reporter);
        assert!(map.is_empty());
        assert_eq!(reporter.messages.len(), 2);
    }
}
