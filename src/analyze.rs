//! The `analyze` command: the two-pass orchestration around the inference
//! core.
//!
//! Pass one discovers each relation's key column; pass two classifies every
//! column with the key map in hand, so other unique-looking columns become
//! ordinary data instead of duplicate keys. The resulting design rows are
//! buffered and written as a whole.

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;

use crate::cli::AnalyzeArgs;
use crate::design::{self, DESCRIPTION_PLACEHOLDER, join_list};
use crate::infer::{Inference, KeyMap, infer_column_type};
use crate::io_utils;
use crate::keys::discover_keys;
use crate::model::{DataType, DefaultValue, Relation, RelationField};
use crate::names::field_identifier;
use crate::patterns::PatternLibrary;
use crate::report::{LogReporter, Reporter};
use crate::source::RelationSource;

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let duplicates: Vec<&str> = args
        .relations
        .iter()
        .map(|spec| spec.name.as_str())
        .duplicates()
        .collect();
    if !duplicates.is_empty() {
        bail!(
            "The same relation name cannot be used for more than one table: {}",
            duplicates.join(", ")
        );
    }

    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut sources = Vec::new();
    for spec in &args.relations {
        let source = RelationSource::load(&spec.name, &spec.path, encoding)
            .with_context(|| format!("Loading relation '{}' from {:?}", spec.name, spec.path))?;
        sources.push(source);
    }

    let patterns = PatternLibrary::new(args.date_order.into());
    let mut reporter = LogReporter;

    info!(
        "Pass 1: discovering key columns across {} relation(s)",
        sources.len()
    );
    let key_map = discover_keys(&sources, &patterns, &mut reporter);

    info!("Pass 2: classifying columns");
    let mut relations = Vec::new();
    for source in &sources {
        let fields = classify_relation(source, &key_map, &patterns, &mut reporter);
        relations.push(Relation::new(&source.name, fields)?);
    }

    design::write_design_file(&args.design, &relations)?;
    info!(
        "Design file with {} relation(s) written to {:?}; review and edit it before generation",
        relations.len(),
        args.design
    );
    Ok(())
}

fn classify_relation(
    source: &RelationSource,
    key_map: &KeyMap,
    patterns: &PatternLibrary,
    reporter: &mut dyn Reporter,
) -> Vec<RelationField> {
    let mut fields = Vec::new();
    if !key_map.contains_key(&source.name) {
        fields.push(surrogate_key_field(&source.headers));
    }

    for (index, header) in source.headers.iter().enumerate() {
        let field_name = field_identifier(header);
        let values = source.column(index);
        let inference = infer_column_type(
            &source.name,
            &field_name,
            &values,
            Some(key_map),
            patterns,
            reporter,
        );

        info!(
            "Detected type for field '{header}': '{}' (nullable: {}{}{})",
            inference.detected_label(),
            inference.nullable,
            if inference.choices.is_empty() {
                String::new()
            } else {
                format!(", choices: [{}]", inference.choices.join(", "))
            },
            if inference.include_alternate {
                ", with alternate"
            } else {
                ""
            }
        );

        let field = field_from_inference(header, &field_name, &inference);
        let alternate = inference
            .include_alternate
            .then(|| alternate_field_for(&field));
        fields.push(field);
        if let Some(alternate) = alternate {
            fields.push(alternate);
        }
    }

    fields
}

/// Builds the typed field definition from the classifier's inference record.
/// Unknown columns degrade to unbounded text (the classifier has already
/// warned about them).
pub fn field_from_inference(csv_name: &str, field_name: &str, inference: &Inference) -> RelationField {
    let data_type = inference.detected_type.unwrap_or(DataType::Text);

    let additional_fields = match data_type {
        DataType::Decimal => vec![
            inference.max_length.unwrap_or(0).max(2).to_string(),
            inference.max_seen_decimals.unwrap_or(0).max(1).to_string(),
        ],
        DataType::Text => {
            let mut extra = Vec::new();
            if let Some(max_length) = inference.max_length {
                extra.push(max_length.to_string());
            }
            if !inference.choices.is_empty() {
                if extra.is_empty() {
                    extra.push(String::new());
                }
                extra.push(join_list(&inference.choices));
            }
            extra
        }
        _ => Vec::new(),
    };

    RelationField {
        csv_names: vec![csv_name.to_string()],
        name: field_name.to_string(),
        data_type,
        nullable: inference.nullable,
        null_values: inference.null_values.clone(),
        default: DefaultValue::Blank,
        description: DESCRIPTION_PLACEHOLDER.to_string(),
        show_in_table: true,
        additional_fields,
        choices: (!inference.choices.is_empty()).then(|| inference.choices.clone()),
    }
}

/// The sibling text field that captures values the numeric primary field
/// cannot represent.
pub fn alternate_field_for(primary: &RelationField) -> RelationField {
    RelationField {
        csv_names: primary.csv_names.clone(),
        name: format!("{}_alt", primary.name),
        data_type: DataType::Text,
        nullable: false,
        null_values: Vec::new(),
        default: DefaultValue::Blank,
        description: primary.description.clone(),
        show_in_table: true,
        additional_fields: Vec::new(),
        choices: None,
    }
}

/// Surrogate auto-increment key for relations where no column qualified.
fn surrogate_key_field(headers: &[String]) -> RelationField {
    let mut name = "id".to_string();
    // Dodge a real source column that happens to be called "id".
    if headers.iter().any(|h| field_identifier(h) == name) {
        name = "generated_id".to_string();
    }
    RelationField {
        csv_names: Vec::new(),
        name,
        data_type: DataType::AutoKey,
        nullable: false,
        null_values: Vec::new(),
        default: DefaultValue::Blank,
        description: "Automatically generated record identifier".to_string(),
        show_in_table: true,
        additional_fields: Vec::new(),
        choices: None,
    }
}
