//! Pattern library: precompiled matchers and canonical parsers for the value
//! shapes the classifier recognizes.
//!
//! The registry is an immutable value passed into the inference and parsing
//! cores rather than a set of module globals, so tests can substitute a
//! library with a different ambiguous-date policy.
//!
//! All patterns are locale-naive: thousands separators are `,` or space, the
//! decimal separator is `.`, and ambiguous `D-M-Y` vs `M-D-Y` dates resolve
//! per the configured [`DateOrder`] (day-first by default) with a warning.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::report::Reporter;

/// True/false token pairs, zipped in matching order.
pub const BOOLEAN_TRUE_VALUES: &[&str] = &["y", "yes", "t", "true", "1"];
pub const BOOLEAN_FALSE_VALUES: &[&str] = &["n", "no", "f", "false", "0"];

/// Resolution policy for dates where day and month cannot be distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    YmdDash,
    YmdSlash,
    DmyDash,
    DmySlash,
}

impl DateLayout {
    fn format(self, order: DateOrder) -> &'static str {
        match (self, order) {
            (DateLayout::YmdDash, _) => "%Y-%m-%d",
            (DateLayout::YmdSlash, _) => "%Y/%m/%d",
            (DateLayout::DmyDash, DateOrder::DayFirst) => "%d-%m-%Y",
            (DateLayout::DmyDash, DateOrder::MonthFirst) => "%m-%d-%Y",
            (DateLayout::DmySlash, DateOrder::DayFirst) => "%d/%m/%Y",
            (DateLayout::DmySlash, DateOrder::MonthFirst) => "%m/%d/%Y",
        }
    }

    fn is_ambiguous(self) -> bool {
        matches!(self, DateLayout::DmyDash | DateLayout::DmySlash)
    }
}

/// Precompiled matcher set plus the parse formats paired with each pattern.
#[derive(Debug)]
pub struct PatternLibrary {
    integer: Regex,
    integer_human: Regex,
    decimal: Regex,
    decimal_human: Regex,
    group_separator: Regex,
    dates: Vec<(Regex, DateLayout)>,
    times: Vec<(Regex, &'static str)>,
    date_order: DateOrder,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new(DateOrder::default())
    }
}

impl PatternLibrary {
    pub fn new(date_order: DateOrder) -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("pattern library regex");
        Self {
            integer: compile(r"^[-+]?([1-9]\d*|0)$"),
            integer_human: compile(r"^[-+]?[1-9]\d{0,2}([,\s]\d{3})+$"),
            decimal: compile(r"^[-+]?\d*\.?\d+(e[-+]?\d+)?$"),
            decimal_human: compile(
                r"^[-+]?(\d{1,3}([,\s]\d{3})+(\.\d+)?|\d{1,3}(\.\d+)?|\.\d+)(e[-+]?\d+)?$",
            ),
            group_separator: compile(r"[,\s]"),
            dates: vec![
                (compile(r"^[12]\d{3}-\d{1,2}-\d{1,2}$"), DateLayout::YmdDash),
                (compile(r"^[12]\d{3}/\d{1,2}/\d{1,2}$"), DateLayout::YmdSlash),
                (compile(r"^\d{1,2}-\d{1,2}-[12]\d{3}$"), DateLayout::DmyDash),
                (compile(r"^\d{1,2}/\d{1,2}/[12]\d{3}$"), DateLayout::DmySlash),
            ],
            times: vec![
                (compile(r"^\d{1,2}:\d{2}$"), "%H:%M"),
                (compile(r"^\d{1,2}:\d{2}:\d{2}$"), "%H:%M:%S"),
            ],
            date_order,
        }
    }

    pub fn is_integer(&self, value: &str) -> bool {
        self.integer.is_match(value)
    }

    pub fn is_integer_human(&self, value: &str) -> bool {
        self.integer_human.is_match(value)
    }

    pub fn is_decimal(&self, value: &str) -> bool {
        self.decimal.is_match(value)
    }

    pub fn is_decimal_human(&self, value: &str) -> bool {
        self.decimal_human.is_match(value)
    }

    pub fn is_date(&self, value: &str) -> bool {
        self.dates.iter().any(|(re, _)| re.is_match(value))
    }

    pub fn is_time(&self, value: &str) -> bool {
        self.times.iter().any(|(re, _)| re.is_match(value))
    }

    /// Strips thousands separators so human-grouped numbers parse cleanly.
    pub fn strip_group_separators(&self, value: &str) -> String {
        self.group_separator.replace_all(value, "").into_owned()
    }

    /// Parses an integer, tolerating human grouping.
    pub fn parse_integer(&self, value: &str) -> Result<i64> {
        let trimmed = value.trim();
        let cleaned = if self.is_integer_human(trimmed) {
            self.strip_group_separators(trimmed)
        } else {
            trimmed.to_string()
        };
        cleaned
            .parse()
            .map_err(|_| anyhow!("Failed to parse '{value}' as integer"))
    }

    /// Parses a date against the four recognized layouts. Ambiguous layouts
    /// resolve per the configured [`DateOrder`] and emit a warning.
    pub fn parse_date(&self, value: &str, reporter: &mut dyn Reporter) -> Result<NaiveDate> {
        let trimmed = value.trim();
        for (re, layout) in &self.dates {
            if !re.is_match(trimmed) {
                continue;
            }
            if layout.is_ambiguous() {
                reporter.warn(&format!(
                    "Date '{trimmed}' is ambiguous (day/month order); assuming {}",
                    match self.date_order {
                        DateOrder::DayFirst => "day-first",
                        DateOrder::MonthFirst => "month-first",
                    }
                ));
            }
            let format = layout.format(self.date_order);
            return NaiveDate::parse_from_str(trimmed, format)
                .map_err(|_| anyhow!("Failed to parse '{value}' as date with format {format}"));
        }
        Err(anyhow!("Value '{value}' does not match any date layout"))
    }

    /// Parses a time against the two recognized layouts.
    pub fn parse_time(&self, value: &str) -> Result<NaiveTime> {
        let trimmed = value.trim();
        for (re, format) in &self.times {
            if re.is_match(trimmed) {
                return NaiveTime::parse_from_str(trimmed, format)
                    .map_err(|_| anyhow!("Failed to parse '{value}' as time with format {format}"));
            }
        }
        Err(anyhow!("Value '{value}' does not match any time layout"))
    }

    /// Parses a boolean token, tolerating case.
    pub fn parse_boolean(&self, value: &str) -> Result<bool> {
        let lowered = value.trim().to_ascii_lowercase();
        if BOOLEAN_TRUE_VALUES.contains(&lowered.as_str()) {
            Ok(true)
        } else if BOOLEAN_FALSE_VALUES.contains(&lowered.as_str()) {
            Ok(false)
        } else {
            Err(anyhow!("Failed to parse '{value}' as boolean"))
        }
    }
}

/// True when `choices` (already lowercased) contains one of the recognized
/// word-form true/false pairs. The classifier intentionally excludes the
/// numeric 1/0 pair here; bare 0/1 columns stay integer flags.
pub fn contains_boolean_pair(lowered_choices: &[String]) -> bool {
    const WORD_PAIRS: &[(&str, &str)] = &[("y", "n"), ("yes", "no"), ("t", "f"), ("true", "false")];
    WORD_PAIRS.iter().any(|(t, f)| {
        lowered_choices.iter().any(|c| c == t) && lowered_choices.iter().any(|c| c == f)
    })
}

/// True when a lowered token belongs to a recognized word-form pair.
pub fn is_boolean_token(lowered: &str) -> bool {
    matches!(lowered, "y" | "n" | "yes" | "no" | "t" | "f" | "true" | "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BufferedReporter;

    #[test]
    fn integer_pattern_accepts_signed_values() {
        let lib = PatternLibrary::default();
        for value in ["1", "0", "-1", "-1000", "-4302941", "+43902", "+5", "304923"] {
            assert!(lib.is_integer(value), "expected integer match for {value}");
        }
        assert!(!lib.is_integer("007"));
        assert!(!lib.is_integer("1.5"));
    }

    #[test]
    fn human_integer_pattern_accepts_grouped_values() {
        let lib = PatternLibrary::default();
        for value in ["321,423,423", "32,000", "-55,000", "+31,543"] {
            assert!(lib.is_integer_human(value), "expected match for {value}");
            assert!(lib.is_integer_human(&value.replace(',', " ")));
        }
        assert!(!lib.is_integer_human("32,00"));
    }

    #[test]
    fn decimal_pattern_accepts_scientific_notation() {
        let lib = PatternLibrary::default();
        assert!(lib.is_decimal("1.25"));
        assert!(lib.is_decimal(".5"));
        assert!(lib.is_decimal("-3.2e-4"));
        assert!(!lib.is_decimal("1,200.5"));
        assert!(lib.is_decimal_human("1,200.5"));
    }

    #[test]
    fn parse_integer_strips_group_separators() {
        let lib = PatternLibrary::default();
        assert_eq!(lib.parse_integer("32,000").unwrap(), 32_000);
        assert_eq!(lib.parse_integer("-55 000").unwrap(), -55_000);
        assert_eq!(lib.parse_integer("17").unwrap(), 17);
        assert!(lib.parse_integer("abc").is_err());
    }

    #[test]
    fn parse_date_defaults_to_day_first_with_warning() {
        let lib = PatternLibrary::default();
        let mut reporter = BufferedReporter::default();
        let parsed = lib.parse_date("03/04/2021", &mut reporter).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2021, 4, 3).unwrap());
        assert_eq!(reporter.messages.len(), 1);
        assert!(reporter.messages[0].contains("ambiguous"));

        let unambiguous = lib.parse_date("2021-04-03", &mut reporter).unwrap();
        assert_eq!(unambiguous, NaiveDate::from_ymd_opt(2021, 4, 3).unwrap());
        assert_eq!(reporter.messages.len(), 1);
    }

    #[test]
    fn parse_date_honours_month_first_policy() {
        let lib = PatternLibrary::new(DateOrder::MonthFirst);
        let mut reporter = BufferedReporter::default();
        let parsed = lib.parse_date("03/04/2021", &mut reporter).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
    }

    #[test]
    fn parse_time_supports_both_layouts() {
        let lib = PatternLibrary::default();
        assert_eq!(
            lib.parse_time("9:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            lib.parse_time("23:59:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
        assert!(lib.parse_time("9:30 pm").is_err());
    }

    #[test]
    fn boolean_pair_detection_ignores_numeric_flags() {
        let yn = vec!["n".to_string(), "y".to_string()];
        assert!(contains_boolean_pair(&yn));
        let zero_one = vec!["0".to_string(), "1".to_string()];
        assert!(!contains_boolean_pair(&zero_one));
        let mismatched = vec!["y".to_string(), "false".to_string()];
        assert!(!contains_boolean_pair(&mismatched));
    }
}
