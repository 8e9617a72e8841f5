//! Relation and field value objects: the typed output of inference and
//! design-file parsing, consumed read-only by downstream tooling.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::design::DesignError;
use crate::names::{name_lower_for, relation_type_name};

/// The closed set of field data types. The GIS variants are only admitted
/// when the caller enables GIS mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    AutoKey,
    ManualKey,
    ForeignKey,
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Date,
    Time,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl DataType {
    pub const CORE: &'static [DataType] = &[
        DataType::AutoKey,
        DataType::ManualKey,
        DataType::ForeignKey,
        DataType::Integer,
        DataType::Float,
        DataType::Decimal,
        DataType::Boolean,
        DataType::Text,
        DataType::Date,
        DataType::Time,
    ];

    pub const GIS: &'static [DataType] = &[
        DataType::Point,
        DataType::LineString,
        DataType::Polygon,
        DataType::MultiPoint,
        DataType::MultiLineString,
        DataType::MultiPolygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::AutoKey => "auto key",
            DataType::ManualKey => "manual key",
            DataType::ForeignKey => "foreign key",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Point => "point",
            DataType::LineString => "line string",
            DataType::Polygon => "polygon",
            DataType::MultiPoint => "multi point",
            DataType::MultiLineString => "multi line string",
            DataType::MultiPolygon => "multi polygon",
        }
    }

    /// Looks up a standardized token (see [`crate::names::standardize_data_type`])
    /// against the set valid for the active mode.
    pub fn parse(token: &str, gis_mode: bool) -> Option<DataType> {
        let core = Self::CORE.iter().find(|dt| dt.as_str() == token).copied();
        if core.is_some() {
            return core;
        }
        if gis_mode {
            return Self::GIS.iter().find(|dt| dt.as_str() == token).copied();
        }
        None
    }

    pub fn is_key(&self) -> bool {
        matches!(self, DataType::AutoKey | DataType::ManualKey)
    }

    pub fn is_gis(&self) -> bool {
        Self::GIS.contains(self)
    }

    /// Names of the additional design-file slots the type accepts, in order.
    pub fn additional_slots(&self) -> &'static [&'static str] {
        match self {
            DataType::Decimal => &["max_length", "precision"],
            DataType::Text => &["max_length", "options"],
            DataType::ForeignKey => &["target"],
            _ => &[],
        }
    }

    /// Whether the type may aggregate several source columns into one field
    /// (composite coordinate fields).
    pub fn allows_multiple_sources(&self) -> bool {
        self.is_gis()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A field's default value, coerced to the field's declared type at parse
/// time. `Blank` means no default was supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Blank,
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Text(String),
}

impl DefaultValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, DefaultValue::Blank)
    }

    /// Serialized form for the design file.
    pub fn as_design_cell(&self) -> String {
        match self {
            DefaultValue::Blank => String::new(),
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Float(v) => v.to_string(),
            DefaultValue::Decimal(v) => v.to_string(),
            DefaultValue::Boolean(v) => v.to_string(),
            DefaultValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            DefaultValue::Time(v) => v.format("%H:%M:%S").to_string(),
            DefaultValue::Text(v) => v.clone(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_design_cell())
    }
}

impl Serialize for DefaultValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DefaultValue::Blank => serializer.serialize_none(),
            other => serializer.serialize_str(&other.as_design_cell()),
        }
    }
}

/// One column's resolved definition. Constructed by the classifier or the
/// design-file parser; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationField {
    /// Originating source column name(s); plural only for aggregating types.
    pub csv_names: Vec<String>,
    /// Sanitized identifier.
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Raw tokens that map to null in the source data.
    pub null_values: Vec<String>,
    pub default: DefaultValue,
    pub description: String,
    /// Display hint for downstream tables.
    pub show_in_table: bool,
    /// Type-specific extra parameters, packed positionally.
    pub additional_fields: Vec<String>,
    /// Allowed values for enumerated text fields.
    pub choices: Option<Vec<String>>,
}

impl RelationField {
    /// Parsed `max_length` slot, when the type carries one and it is numeric.
    pub fn max_length(&self) -> Option<usize> {
        match self.data_type {
            DataType::Decimal | DataType::Text => self
                .additional_fields
                .first()
                .and_then(|v| v.trim().parse().ok()),
            _ => None,
        }
    }
}

/// One logical table: the ordered fields plus derived naming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    /// Raw user-given name, trimmed.
    pub design_name: String,
    /// Prefixed, UpperCamel, singularized type name.
    pub name: String,
    /// Identifier-safe lowercase variant.
    pub name_lower: String,
    pub fields: Vec<RelationField>,
    /// `"integer"` for an auto key, `"text"` for a manual key, `""` when
    /// the relation has no key field.
    pub id_type: String,
}

impl Relation {
    /// Builds a relation, deriving names and the id type and enforcing the
    /// single-key invariant.
    pub fn new(design_name: &str, fields: Vec<RelationField>) -> Result<Self, DesignError> {
        let design_name = design_name.trim().to_string();
        let mut id_type = String::new();

        for field in &fields {
            if field.data_type.is_key() {
                if !id_type.is_empty() {
                    return Err(DesignError::DuplicateKeyField {
                        relation: design_name.clone(),
                        field: field.name.clone(),
                    });
                }
                id_type = match field.data_type {
                    DataType::AutoKey => "integer".to_string(),
                    _ => "text".to_string(),
                };
            }
        }

        let name = relation_type_name(&design_name);
        let name_lower = name_lower_for(&name);
        Ok(Self {
            design_name,
            name,
            name_lower,
            fields,
            id_type,
        })
    }

    pub fn key_field(&self) -> Option<&RelationField> {
        self.fields.iter().find(|f| f.data_type.is_key())
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a RelationField;
    type IntoIter = std::slice::Iter<'a, RelationField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
