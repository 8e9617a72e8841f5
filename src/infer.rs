//! Column classifier: the ordered heuristic cascade that turns one column's
//! raw values into a typed inference.
//!
//! The cascade is an explicit list of named (predicate, action) rules
//! evaluated top-down with early exit. Order encodes priority and is part of
//! the contract; see [`RULES`].

use std::collections::{BTreeMap, BTreeSet};

use crate::model::DataType;
use crate::patterns::{PatternLibrary, contains_boolean_pair, is_boolean_token};
use crate::report::Reporter;

/// Below this distinct-value count a column may become an enumeration.
const ENUM_MAX_DISTINCT: usize = 16;
/// Enumeration candidates must keep every value under this length.
const ENUM_MAX_VALUE_LENGTH: usize = 24;
/// Enumeration values must repeat at least this often on average.
const ENUM_MIN_REPEAT_FACTOR: usize = 2;
/// Minimum fraction of integer-parsing values for the alternate-field split.
const ALTERNATE_MIN_INTEGER_FRACTION: f64 = 0.5;
/// Distinct non-numeric values at or above this force the text fallback.
const TEXT_MIN_OTHER_DISTINCT: usize = 10;
/// Longest value at or below this gets a bounded text column.
const TEXT_CAP_VALUE_LENGTH: usize = 48;
/// Bounded text columns are capped at this length.
const TEXT_CAPPED_LENGTH: usize = 128;

/// Key column discovered for a relation during the first pass.
#[derive(Debug, Clone)]
pub struct KeyColumn {
    pub field_name: String,
    pub values: Vec<String>,
}

/// Relation name to discovered key column.
pub type KeyMap = BTreeMap<String, KeyColumn>;

/// The classifier's ephemeral result record. `detected_type` of `None` means
/// no rule matched; callers treat the column as unbounded text.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub detected_type: Option<DataType>,
    pub nullable: bool,
    pub null_values: Vec<String>,
    pub choices: Vec<String>,
    pub max_length: Option<usize>,
    pub max_seen_decimals: Option<u32>,
    pub is_key: bool,
    pub include_alternate: bool,
}

impl Inference {
    fn of(detected: DataType) -> Self {
        Self {
            detected_type: Some(detected),
            nullable: false,
            null_values: Vec::new(),
            choices: Vec::new(),
            max_length: None,
            max_seen_decimals: None,
            is_key: false,
            include_alternate: false,
        }
    }

    fn unknown() -> Self {
        Self {
            detected_type: None,
            nullable: false,
            null_values: Vec::new(),
            choices: Vec::new(),
            max_length: None,
            max_seen_decimals: None,
            is_key: false,
            include_alternate: false,
        }
    }

    pub fn detected_label(&self) -> &'static str {
        self.detected_type.map_or("unknown", |dt| dt.as_str())
    }
}

/// Per-column scan statistics gathered in a single pass over the values.
#[derive(Debug, Default)]
pub struct ColumnProfile {
    pub row_count: usize,
    pub blank_count: usize,
    /// Count of values matching the plain integer pattern.
    pub integer_values: usize,
    pub distinct_integers: BTreeSet<String>,
    /// Count of non-integer numerics without exponent notation.
    pub decimal_values: usize,
    /// Count of numerics carrying exponent notation.
    pub float_values: usize,
    pub date_values: usize,
    pub time_values: usize,
    /// Distinct values that parse as neither integer nor decimal/float
    /// (blanks included).
    pub other_values: BTreeSet<String>,
    pub other_values_seen: usize,
    /// `other_values` minus anything matching a date or time pattern.
    pub non_temporal_others: BTreeSet<String>,
    pub all_values: BTreeSet<String>,
    pub max_seen_length: usize,
    pub max_seen_decimals: Option<u32>,
}

impl ColumnProfile {
    pub fn scan(values: &[String], patterns: &PatternLibrary) -> Self {
        let mut profile = ColumnProfile {
            row_count: values.len(),
            ..ColumnProfile::default()
        };

        for raw in values {
            let value = raw.trim();

            if patterns.is_integer(value) {
                profile.integer_values += 1;
                profile.distinct_integers.insert(value.to_string());
            } else if patterns.is_decimal(value) {
                if let Some(fraction) = fractional_digits(value) {
                    profile.max_seen_decimals = Some(
                        profile
                            .max_seen_decimals
                            .map_or(fraction, |seen| seen.max(fraction)),
                    );
                }
                if value.contains('e') {
                    profile.float_values += 1;
                } else {
                    profile.decimal_values += 1;
                }
            } else {
                profile.other_values.insert(value.to_string());
                profile.other_values_seen += 1;
                if !patterns.is_date(value) && !patterns.is_time(value) {
                    profile.non_temporal_others.insert(value.to_string());
                }
            }

            if value.is_empty() {
                profile.blank_count += 1;
            }
            if patterns.is_date(value) {
                profile.date_values += 1;
            }
            if patterns.is_time(value) {
                profile.time_values += 1;
            }

            profile.max_seen_length = profile.max_seen_length.max(value.len());
            profile.all_values.insert(value.to_string());
        }

        profile
    }

    fn distinct_non_blank(&self) -> usize {
        self.all_values.len() - usize::from(self.all_values.contains(""))
    }

    fn non_blank_seen(&self) -> usize {
        self.row_count - self.blank_count
    }

    /// True when the numeric content is nothing but a bare 0/1 flag.
    fn is_binary_flag(&self) -> bool {
        !self.distinct_integers.is_empty()
            && self.distinct_integers.iter().all(|v| v == "0" || v == "1")
    }
}

fn fractional_digits(value: &str) -> Option<u32> {
    let mantissa = value.split('e').next().unwrap_or(value);
    mantissa
        .split_once('.')
        .map(|(_, fraction)| fraction.len() as u32)
}

struct RuleContext<'a> {
    field_name: &'a str,
    profile: &'a ColumnProfile,
    key_allowed: bool,
}

type Rule = (&'static str, fn(&RuleContext<'_>) -> Option<Inference>);

/// The classification cascade. First matching rule wins; the order is the
/// priority contract and must not be rearranged.
const RULES: &[Rule] = &[
    ("manual key", rule_manual_key),
    ("integer (total)", rule_integer_total),
    ("integer (one exceptional value)", rule_integer_one_exception),
    ("integer with alternate", rule_integer_with_alternate),
    ("decimal", rule_decimal),
    ("float", rule_float),
    ("date (total)", rule_date_total),
    ("date (one exceptional value)", rule_date_one_exception),
    ("time (total)", rule_time_total),
    ("time (one exceptional value)", rule_time_one_exception),
    ("enumerated text", rule_enumerated_text),
    ("fallback text", rule_fallback_text),
];

fn rule_manual_key(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.row_count == 0 || !ctx.key_allowed {
        return None;
    }
    if p.all_values.len() != p.row_count || p.all_values.contains("") {
        return None;
    }
    let mut inference = Inference::of(DataType::ManualKey);
    inference.is_key = true;
    Some(inference)
}

fn rule_integer_total(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.row_count == 0 || p.integer_values != p.row_count {
        return None;
    }
    Some(Inference::of(DataType::Integer))
}

fn rule_integer_one_exception(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.integer_values == 0
        || p.other_values.len() != 1
        || p.decimal_values > 0
        || p.float_values > 0
        || p.is_binary_flag()
    {
        return None;
    }
    let mut inference = Inference::of(DataType::Integer);
    inference.nullable = true;
    // The single odd value is the null sentinel candidate, but no null token
    // is recorded here; the quirk is preserved deliberately.
    Some(inference)
}

fn rule_integer_with_alternate(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.integer_values == 0 || p.other_values.len() <= 1 {
        return None;
    }
    let fraction = p.integer_values as f64 / p.row_count as f64;
    if fraction < ALTERNATE_MIN_INTEGER_FRACTION {
        return None;
    }
    let mut inference = Inference::of(DataType::Integer);
    inference.nullable = true;
    inference.include_alternate = true;
    Some(inference)
}

fn rule_decimal(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.decimal_values == 0 || p.other_values.len() > 1 {
        return None;
    }
    let mut inference = Inference::of(DataType::Decimal);
    inference.nullable = p.other_values.len() == 1;
    inference.max_seen_decimals = p.max_seen_decimals;
    let decimals = p.max_seen_decimals.unwrap_or(0) as usize;
    // Headroom for sign, point, and padding.
    inference.max_length = Some(p.max_seen_length + decimals + 4);
    Some(inference)
}

fn rule_float(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.float_values == 0 || p.other_values.len() > 1 {
        return None;
    }
    let mut inference = Inference::of(DataType::Float);
    inference.nullable = p.other_values.len() == 1;
    Some(inference)
}

fn rule_date_total(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.row_count == 0 || p.date_values != p.row_count {
        return None;
    }
    Some(Inference::of(DataType::Date))
}

fn rule_date_one_exception(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.date_values == 0 || p.non_temporal_others.len() != 1 {
        return None;
    }
    let mut inference = Inference::of(DataType::Date);
    inference.nullable = true;
    inference.null_values = p.non_temporal_others.iter().cloned().collect();
    Some(inference)
}

fn rule_time_total(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.row_count == 0 || p.time_values != p.row_count {
        return None;
    }
    Some(Inference::of(DataType::Time))
}

fn rule_time_one_exception(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    if p.time_values == 0 || p.non_temporal_others.len() != 1 {
        return None;
    }
    let mut inference = Inference::of(DataType::Time);
    inference.nullable = true;
    inference.null_values = p.non_temporal_others.iter().cloned().collect();
    Some(inference)
}

fn rule_enumerated_text(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    let distinct = p.distinct_non_blank();
    if distinct == 0
        || distinct >= ENUM_MAX_DISTINCT
        || p.max_seen_length >= ENUM_MAX_VALUE_LENGTH
        || p.non_blank_seen() < ENUM_MIN_REPEAT_FACTOR * distinct
    {
        return None;
    }

    let choices: Vec<String> = p
        .all_values
        .iter()
        .filter(|v| !v.is_empty())
        .cloned()
        .collect();
    let blank_seen = p.blank_count > 0;

    let lowered: Vec<String> = choices.iter().map(|c| c.to_lowercase()).collect();
    if matches!(choices.len(), 2 | 3) && contains_boolean_pair(&lowered) {
        let mut inference = Inference::of(DataType::Boolean);
        inference.nullable = choices.len() == 3 || blank_seen;
        inference.null_values = choices
            .iter()
            .filter(|c| !is_boolean_token(&c.to_lowercase()))
            .cloned()
            .collect();
        return Some(inference);
    }

    let mut inference = Inference::of(DataType::Text);
    inference.nullable = blank_seen;
    inference.max_length = Some(2 * p.max_seen_length);
    inference.choices = choices;
    Some(inference)
}

fn rule_fallback_text(ctx: &RuleContext<'_>) -> Option<Inference> {
    let p = ctx.profile;
    let minority_threshold = std::cmp::max(p.row_count / 10, 10);
    if p.integer_values >= minority_threshold && p.other_values.len() < TEXT_MIN_OTHER_DISTINCT {
        return None;
    }
    let mut inference = Inference::of(DataType::Text);
    if p.max_seen_length <= TEXT_CAP_VALUE_LENGTH && !name_suggests_notes(ctx.field_name) {
        inference.max_length = Some(TEXT_CAPPED_LENGTH);
    }
    Some(inference)
}

fn name_suggests_notes(field_name: &str) -> bool {
    let lowered = field_name.to_lowercase();
    lowered.contains("note") || lowered.contains("comment")
}

/// Classifies one column.
///
/// `key_map` is the product of the key-discovery pass: when present, only the
/// field it records for `relation_name` may classify as a key; when absent,
/// any fully distinct non-blank column does.
pub fn infer_column_type(
    relation_name: &str,
    field_name: &str,
    values: &[String],
    key_map: Option<&KeyMap>,
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Inference {
    let profile = ColumnProfile::scan(values, patterns);
    let key_allowed = match key_map {
        None => true,
        Some(map) => map
            .get(relation_name)
            .is_some_and(|key| key.field_name == field_name),
    };
    let ctx = RuleContext {
        field_name,
        profile: &profile,
        key_allowed,
    };

    for (_, rule) in RULES {
        if let Some(inference) = rule(&ctx) {
            return inference;
        }
    }

    reporter.warn(&format!(
        "Could not infer a type for field '{field_name}' in relation '{relation_name}'; treating it as text"
    ));
    Inference::unknown()
}
