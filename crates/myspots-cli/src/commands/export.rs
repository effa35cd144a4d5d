//! Export command handler
//!
//! Reads categories and places from the record store, assembles the KML
//! document, and writes it to stdout or a file. Skipped malformed records
//! are reported on stderr at the end of the run; any graph failure aborts
//! without emitting a partial document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use myspots_core::{build_document, AirtableClient, CategoryGraph, Config, ExportOptions};

use crate::output::Output;

pub struct ExportArgs {
    pub no_styles: bool,
    pub default_invisible: bool,
    pub hierarchical: bool,
    pub oldest_first: bool,
    pub output_path: Option<PathBuf>,
}

/// Run the export
pub async fn run(config: &Config, args: ExportArgs, output: &Output) -> Result<()> {
    let store = AirtableClient::new(config)?;

    let (categories, skipped_categories) = store.list_categories().await?;
    let (places, skipped_places) = store.list_places(args.oldest_first).await?;

    for record in skipped_categories.iter().chain(skipped_places.iter()) {
        warn!(id = %record.id, reason = %record.reason, "skipping malformed record");
    }

    let graph = CategoryGraph::build(categories)?;
    let options = ExportOptions {
        no_styles: args.no_styles,
        default_invisible: args.default_invisible,
        hierarchical: args.hierarchical,
    };
    let doc = build_document(&graph, &places, &options)?;
    let kml = doc.to_kml();

    match &args.output_path {
        Some(path) => {
            std::fs::write(path, &kml)
                .with_context(|| format!("Failed to write KML to {:?}", path))?;
            output.success(&format!(
                "Wrote {} marker(s) in {} folder(s) to {}",
                doc.marker_count(),
                doc.folders.len(),
                path.display()
            ));
        }
        None => {
            // stdout carries only the document; diagnostics go to stderr
            print!("{}", kml);
        }
    }

    let skipped: Vec<_> = skipped_categories
        .into_iter()
        .chain(skipped_places)
        .collect();
    output.print_skipped(&skipped);

    Ok(())
}
