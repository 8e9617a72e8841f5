//! Identifier sanitization for field and relation names.
//!
//! Source column headers arrive as free text ("Specimen No.", "date
//! collected") and must become identifier-safe names for the generated
//! schema. Relation names additionally get a collision-avoiding prefix and
//! plural collapsing.

use std::sync::OnceLock;

use heck::{ToSnakeCase, ToUpperCamelCase};
use log::warn;
use regex::Regex;

/// Prefix applied to derived relation type names to avoid collisions with
/// reserved or pre-existing identifiers.
pub const RELATION_PREFIX: &str = "Design";

/// Identifiers that would shadow language keywords get a `_field` suffix.
const RESERVED_WORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "yield",
];

fn separator_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s.\-]+").expect("separator regex"))
}

fn non_identifier_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]+").expect("identifier regex"))
}

fn multiple_underscores() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_{2,}").expect("underscore regex"))
}

fn multiple_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("whitespace regex"))
}

pub fn collapse_underscores(value: &str) -> String {
    multiple_underscores().replace_all(value, "_").into_owned()
}

/// Replaces separator runs with underscores and drops everything else that is
/// not a word character.
pub fn sanitize_identifier(value: &str) -> String {
    let trimmed = value.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '-');
    let separated = separator_chars().replace_all(trimmed, "_");
    non_identifier_chars().replace_all(&separated, "").into_owned()
}

/// Converts a raw column header into a lowercase identifier, guarding
/// reserved words with a `_field` suffix.
pub fn field_identifier(value: &str) -> String {
    let mut name = sanitize_identifier(&value.to_lowercase());
    if RESERVED_WORDS.contains(&name.as_str()) {
        name.push_str("_field");
    }
    collapse_underscores(&name)
}

/// Normalizes a data-type token for lookup: lowercase, underscores to spaces,
/// whitespace runs collapsed.
pub fn standardize_data_type(value: &str) -> String {
    let lowered = value.to_lowercase().replace('_', " ");
    multiple_whitespace()
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// Derives the prefixed, UpperCamel, singularized type name for a relation.
///
/// Plural collapsing is deliberately crude (`...ies` -> `...y`, trailing `s`
/// dropped) and warns so the user can supply singular names instead.
pub fn relation_type_name(design_name: &str) -> String {
    let sanitized = collapse_underscores(&sanitize_identifier(design_name));
    let mut name = format!("{RELATION_PREFIX}{}", sanitized.to_upper_camel_case());

    if name.ends_with("ies") {
        let old = name.clone();
        name.truncate(name.len() - 3);
        name.push('y');
        warn!("Auto-detected plural relation name; changing {old} to {name} (specify singular names to avoid this)");
    } else if name.ends_with('s') {
        let old = name.clone();
        name.truncate(name.len() - 1);
        warn!("Auto-detected plural relation name; changing {old} to {name} (specify singular names to avoid this)");
    }

    name
}

/// Identifier-safe lowercase variant of a derived relation type name.
pub fn name_lower_for(type_name: &str) -> String {
    type_name.to_snake_case()
}
