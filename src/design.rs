//! Design-file serializer and parser.
//!
//! The design file is the human-editable intermediate between analysis and
//! downstream generation: a comma-delimited file of per-relation blocks, each
//! a relation-name header row, one row per field, and a blank separator row,
//! with every row padded to the file-wide maximum width.
//!
//! Within a cell, `;` separates null-value tokens or choice values and `;;`
//! separates multiple source column names.
//!
//! Parsing fails fast: either a relation parses and validates completely or
//! the whole parse returns a [`DesignError`]; no partial schema is produced.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::io_utils;
use crate::model::{DataType, DefaultValue, Relation, RelationField};
use crate::names::{field_identifier, standardize_data_type};
use crate::patterns::PatternLibrary;
use crate::report::Reporter;

/// Description cell the analyzer emits for the human to replace.
pub const DESCRIPTION_PLACEHOLDER: &str = "!fill me in!";

const SOURCE_NAME_SEPARATOR: &str = ";;";
const LIST_SEPARATOR: &str = "; ";
/// Fixed cells before the type-specific additional slots.
const FIXED_COLUMNS: usize = 8;

const HEADER_CELLS: &[&str] = &[
    "new field name",
    "data type",
    "nullable?",
    "null values",
    "default",
    "description",
    "show in table?",
    "additional fields...",
];

/// Schema errors raised while parsing a design file. Each names the relation
/// and field at fault so the user can fix the offending row.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error(
        "Unknown data type '{data_type}' specified for field '{field}' in relation '{relation}'"
    )]
    UnknownDataType {
        relation: String,
        field: String,
        data_type: String,
    },
    #[error(
        "More than one primary key (auto/manual key) specified for relation '{relation}' (offending field: '{field}'); please specify only one"
    )]
    DuplicateKeyField { relation: String, field: String },
    #[error(
        "Default value '{default}' for field '{field}' in relation '{relation}' does not match any available choice; available choices: {choices}"
    )]
    DefaultNotInChoices {
        relation: String,
        field: String,
        default: String,
        choices: String,
    },
    #[error(
        "Key field '{field}' in relation '{relation}' carries extra parameters that look like choice values; key fields cannot be enumerated"
    )]
    KeyFieldWithChoices { relation: String, field: String },
    #[error(
        "Field '{field}' in relation '{relation}' names multiple source columns, which data type '{data_type}' does not allow"
    )]
    MultipleSourceColumns {
        relation: String,
        field: String,
        data_type: String,
    },
    #[error("A field row in relation '{relation}' has no new field name")]
    EmptyFieldName { relation: String },
    #[error(
        "Invalid default value '{default}' for {data_type} field '{field}' in relation '{relation}': {message}"
    )]
    InvalidDefault {
        relation: String,
        field: String,
        data_type: String,
        default: String,
        message: String,
    },
}

/// Splits a `;`-separated list cell, trimming and dropping empty entries.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins list values for a design-file cell.
pub fn join_list(values: &[String]) -> String {
    values.join(LIST_SEPARATOR)
}

fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1"
    )
}

fn row_is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

// --- serialization ---------------------------------------------------------

fn relation_header_row(relation: &Relation) -> Vec<String> {
    let mut row = vec![relation.design_name.clone()];
    row.extend(HEADER_CELLS.iter().map(|cell| cell.to_string()));
    row
}

/// Emits one field in the fixed design-file column order.
pub fn field_row(field: &RelationField) -> Vec<String> {
    let mut row = vec![
        field.csv_names.join(SOURCE_NAME_SEPARATOR),
        field.name.clone(),
        field.data_type.as_str().to_string(),
        field.nullable.to_string(),
        join_list(&field.null_values),
        field.default.as_design_cell(),
        field.description.clone(),
        field.show_in_table.to_string(),
    ];
    row.extend(field.additional_fields.iter().cloned());
    row
}

/// Serializes relations to design-file rows, padded to a uniform width.
pub fn serialize_relations(relations: &[Relation]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for relation in relations {
        rows.push(relation_header_row(relation));
        for field in relation {
            rows.push(field_row(field));
        }
        rows.push(Vec::new());
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}

/// Writes the design file in one shot: rows are rendered to an in-memory
/// buffer first, so a failed run never leaves a partially written file.
pub fn write_design_file(path: &Path, relations: &[Relation]) -> Result<()> {
    let rows = serialize_relations(relations);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    for row in &rows {
        writer
            .write_record(row)
            .context("Serializing design file rows")?;
    }
    let buffer = writer.into_inner().context("Flushing design file buffer")?;

    if io_utils::is_dash(path) {
        use std::io::Write;
        std::io::stdout()
            .write_all(&buffer)
            .context("Writing design file to stdout")?;
    } else {
        std::fs::write(path, buffer)
            .with_context(|| format!("Writing design file {path:?}"))?;
    }
    Ok(())
}

// --- parsing ---------------------------------------------------------------

/// Parses and validates a design file into relations.
pub fn parse_design_file(
    path: &Path,
    gis_mode: bool,
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Result<Vec<Relation>> {
    let mut reader = io_utils::open_flexible_csv_reader_from_path(path, b',')?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Reading design file {path:?}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    parse_design_rows(&rows, gis_mode, patterns, reporter)
}

/// Parses pre-read design rows; the unit the round-trip tests exercise.
pub fn parse_design_rows(
    rows: &[Vec<String>],
    gis_mode: bool,
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Result<Vec<Relation>> {
    let mut relations = Vec::new();
    let mut index = 0;

    while index < rows.len() {
        if row_is_blank(&rows[index]) {
            index += 1;
            continue;
        }

        let design_name = rows[index]
            .first()
            .map(|cell| cell.trim())
            .unwrap_or("")
            .to_string();
        index += 1;

        let mut fields = Vec::new();
        while index < rows.len() && !row_is_blank(&rows[index]) {
            fields.push(parse_field_row(
                &rows[index],
                &design_name,
                gis_mode,
                patterns,
                reporter,
            )?);
            index += 1;
        }

        if fields.is_empty() {
            reporter.warn(&format!(
                "Relation '{design_name}' declares no fields; skipping it"
            ));
            continue;
        }

        relations.push(Relation::new(&design_name, fields)?);
    }

    Ok(relations)
}

fn parse_field_row(
    row: &[String],
    relation: &str,
    gis_mode: bool,
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Result<RelationField, DesignError> {
    let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

    let csv_names: Vec<String> = cell(0)
        .split(SOURCE_NAME_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let name = field_identifier(cell(1));
    if name.is_empty() {
        return Err(DesignError::EmptyFieldName {
            relation: relation.to_string(),
        });
    }

    let type_token = standardize_data_type(cell(2));
    let data_type =
        DataType::parse(&type_token, gis_mode).ok_or_else(|| DesignError::UnknownDataType {
            relation: relation.to_string(),
            field: name.clone(),
            data_type: type_token.clone(),
        })?;

    if csv_names.len() > 1 && !data_type.allows_multiple_sources() {
        return Err(DesignError::MultipleSourceColumns {
            relation: relation.to_string(),
            field: name.clone(),
            data_type: type_token,
        });
    }

    let nullable = parse_flag(cell(3));
    let null_values = split_list(cell(4));
    let show_in_table = cell(7).is_empty() || parse_flag(cell(7));

    let mut additional_fields: Vec<String> = row
        .iter()
        .skip(FIXED_COLUMNS)
        .map(|value| value.trim().to_string())
        .collect();
    while additional_fields.last().is_some_and(String::is_empty) {
        additional_fields.pop();
    }

    let populated = additional_fields
        .iter()
        .filter(|value| !value.is_empty())
        .count();
    let slots = data_type.additional_slots();
    if populated > slots.len() {
        if data_type.is_key() {
            // A key row with extra parameters almost always means choices
            // pasted onto the wrong row.
            return Err(DesignError::KeyFieldWithChoices {
                relation: relation.to_string(),
                field: name,
            });
        }
        reporter.warn(&format!(
            "Field '{name}' in relation '{relation}' has {populated} additional parameter(s) but data type '{type_token}' accepts {}; ignoring the excess",
            slots.len()
        ));
    }

    let choices = match data_type {
        DataType::Text => additional_fields
            .get(1)
            .map(|cell| split_list(cell))
            .filter(|parsed| !parsed.is_empty()),
        _ => None,
    };

    let raw_default = cell(5);
    let default = parse_default(
        raw_default,
        data_type,
        nullable,
        &null_values,
        patterns,
        reporter,
    )
    .map_err(|err| DesignError::InvalidDefault {
        relation: relation.to_string(),
        field: name.clone(),
        data_type: data_type.as_str().to_string(),
        default: raw_default.to_string(),
        message: err.to_string(),
    })?;

    if let Some(choice_values) = &choices
        && !raw_default.is_empty()
        && !choice_values.iter().any(|choice| choice == raw_default)
    {
        return Err(DesignError::DefaultNotInChoices {
            relation: relation.to_string(),
            field: name,
            default: raw_default.to_string(),
            choices: choice_values.join(", "),
        });
    }

    Ok(RelationField {
        csv_names,
        name,
        data_type,
        nullable,
        null_values,
        default,
        description: cell(6).to_string(),
        show_in_table,
        additional_fields,
        choices,
    })
}

/// Coerces a raw default cell to the field's declared type. Numeric parsing
/// tolerates thousands separators; booleans honour null tokens and blanks on
/// nullable fields.
fn parse_default(
    raw: &str,
    data_type: DataType,
    nullable: bool,
    null_values: &[String],
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Result<DefaultValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() && data_type != DataType::Boolean {
        return Ok(DefaultValue::Blank);
    }

    let numeric_literal = |value: &str| {
        if patterns.is_decimal_human(value) || patterns.is_integer_human(value) {
            patterns.strip_group_separators(value)
        } else {
            value.to_string()
        }
    };

    match data_type {
        DataType::Integer => Ok(DefaultValue::Integer(patterns.parse_integer(trimmed)?)),
        DataType::Float => {
            let literal = numeric_literal(trimmed);
            let parsed: f64 = literal
                .parse()
                .map_err(|_| anyhow::anyhow!("not a floating-point number"))?;
            Ok(DefaultValue::Float(parsed))
        }
        DataType::Decimal => {
            let literal = numeric_literal(trimmed);
            let parsed = Decimal::from_str(&literal)
                .map_err(|_| anyhow::anyhow!("not a decimal number"))?;
            Ok(DefaultValue::Decimal(parsed))
        }
        DataType::Date => Ok(DefaultValue::Date(patterns.parse_date(trimmed, reporter)?)),
        DataType::Time => Ok(DefaultValue::Time(patterns.parse_time(trimmed)?)),
        DataType::Boolean => {
            if trimmed.is_empty() || (nullable && null_values.iter().any(|nv| nv == trimmed)) {
                return Ok(DefaultValue::Blank);
            }
            Ok(DefaultValue::Boolean(patterns.parse_boolean(trimmed)?))
        }
        _ => Ok(DefaultValue::Text(trimmed.to_string())),
    }
}
