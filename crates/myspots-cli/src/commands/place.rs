//! Place command handlers

use anyhow::{bail, Result};

use myspots_core::{AirtableClient, Config, PlaceCandidate, PlacesClient};

use crate::output::Output;

/// Search the places API and add selected results to the record store
pub async fn add(
    config: &Config,
    query: String,
    location: Option<String>,
    radius: Option<u32>,
    all: bool,
    output: &Output,
) -> Result<()> {
    let places = PlacesClient::new(config)?;
    let store = AirtableClient::new(config)?;

    let candidates = places
        .search(&query, location.as_deref(), radius)
        .await?;
    if candidates.is_empty() {
        bail!(
            "Query returned no results:\nquery: {}\nlocation: {}",
            query,
            location.as_deref().unwrap_or("(none)")
        );
    }

    output.print_candidates(&candidates);

    let selected = if output.should_prompt() && !all {
        select_candidates(&candidates)?
    } else {
        select_without_prompt(&candidates, all)?
    };

    let attempted = selected.len();
    let mut added = 0;
    for candidate in selected {
        if store.place_exists(&candidate.google_place_id).await? {
            output.message(&format!(
                "Already exists; skipping {}",
                candidate.google_place_id
            ));
            continue;
        }
        let details = places.details(&candidate.google_place_id).await?;
        store.create_place(&details, None).await?;
        output.message(&format!("Added {}", details.name));
        added += 1;
    }

    output.success(&format!("Added {} out of {} attempted", added, attempted));
    Ok(())
}

/// Prompt for a selection: 0 = all, -1 = abort, 1..N = single candidate
fn select_candidates(candidates: &[PlaceCandidate]) -> Result<Vec<&PlaceCandidate>> {
    use std::io::{self, Write};

    print!("Please select option (0 = all, -1 = abort): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let selection: i32 = input
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Did not understand selection: {}", input.trim()))?;

    match selection {
        -1 => bail!("Aborted; no changes to the record store."),
        0 => Ok(candidates.iter().collect()),
        n if n > 0 && (n as usize) <= candidates.len() => {
            Ok(vec![&candidates[n as usize - 1]])
        }
        other => bail!("Did not understand selection: {}", other),
    }
}

/// Candidate set for a run that cannot prompt
///
/// Inserting into the record store is a remote write, so without a prompt
/// every result is only taken when `--all` was passed explicitly.
fn select_without_prompt(
    candidates: &[PlaceCandidate],
    all: bool,
) -> Result<Vec<&PlaceCandidate>> {
    if all {
        return Ok(candidates.iter().collect());
    }
    bail!(
        "Found {} result(s) but no selection was possible. \
         Rerun without --json/--quiet to select, or pass --all to add every result.",
        candidates.len()
    )
}
