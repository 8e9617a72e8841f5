use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::patterns::DateOrder;

#[derive(Debug, Parser)]
#[command(author, version, about = "Infer typed field definitions from raw CSV data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze CSV sources and write a human-editable design file
    Analyze(AnalyzeArgs),
    /// Parse and validate an edited design file
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Destination design file ('-' for stdout)
    #[arg(short = 'o', long = "design")]
    pub design: PathBuf,
    /// Relation sources as `name=path` pairs (repeatable)
    #[arg(
        short = 'r',
        long = "relation",
        required = true,
        value_parser = parse_relation_spec,
        action = clap::ArgAction::Append
    )]
    pub relations: Vec<RelationSpec>,
    /// Day/month order assumed for ambiguous dates
    #[arg(long = "date-order", value_enum, default_value = "day-first")]
    pub date_order: DateOrderArg,
    /// Character encoding of the source files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Design file to parse and validate ('-' for stdin)
    #[arg(short = 'd', long = "design")]
    pub design: PathBuf,
    /// Admit GIS data types (point, polygon, ...)
    #[arg(long)]
    pub gis: bool,
    /// Day/month order assumed for ambiguous date defaults
    #[arg(long = "date-order", value_enum, default_value = "day-first")]
    pub date_order: DateOrderArg,
    /// Write the validated schema as JSON to this path
    #[arg(long = "json")]
    pub json: Option<PathBuf>,
}

/// One `name=path` relation source pair.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    pub name: String,
    pub path: PathBuf,
}

pub fn parse_relation_spec(value: &str) -> Result<RelationSpec, String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("Relation '{value}' must use the form name=path"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Relation '{value}' has an empty name"));
    }
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("Relation '{name}' has an empty source path"));
    }
    Ok(RelationSpec {
        name: name.to_lowercase(),
        path: PathBuf::from(path),
    })
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum DateOrderArg {
    DayFirst,
    MonthFirst,
}

impl From<DateOrderArg> for DateOrder {
    fn from(value: DateOrderArg) -> Self {
        match value {
            DateOrderArg::DayFirst => DateOrder::DayFirst,
            DateOrderArg::MonthFirst => DateOrder::MonthFirst,
        }
    }
}
