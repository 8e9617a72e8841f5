//! The `check` command: parse and validate an edited design file, optionally
//! exporting the validated schema as JSON for downstream tooling.

use std::fs::File;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::cli::CheckArgs;
use crate::design;
use crate::patterns::PatternLibrary;
use crate::report::LogReporter;

pub fn execute(args: &CheckArgs) -> Result<()> {
    let patterns = PatternLibrary::new(args.date_order.into());
    let mut reporter = LogReporter;
    let relations = design::parse_design_file(&args.design, args.gis, &patterns, &mut reporter)?;

    let field_count: usize = relations.iter().map(|r| r.fields.len()).sum();
    info!(
        "Design file {:?} is valid: {} relation(s), {} field(s)",
        args.design,
        relations.len(),
        field_count
    );
    for relation in &relations {
        debug!(
            "Relation {} ('{}'): {} field(s), id type '{}'",
            relation.name,
            relation.design_name,
            relation.fields.len(),
            relation.id_type
        );
    }

    if let Some(json_path) = &args.json {
        let file = File::create(json_path)
            .with_context(|| format!("Creating schema JSON file {json_path:?}"))?;
        serde_json::to_writer_pretty(file, &relations).context("Writing schema JSON")?;
        info!("Validated schema written to {json_path:?}");
    }

    Ok(())
}
