//! Config command handlers

use anyhow::{bail, Context, Result};

use myspots_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "google_api_key": mask(&config.google_api_key),
                    "airtable_api_key": mask(&config.airtable_api_key),
                    "airtable_base_id": config.airtable_base_id,
                    "places_table": config.places_table,
                    "categories_table": config.categories_table
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", Config::config_file_path().display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  google_api_key:   {}", mask(&config.google_api_key));
            println!("  airtable_api_key: {}", mask(&config.airtable_api_key));
            println!(
                "  airtable_base_id: {}",
                or_not_set(&config.airtable_base_id)
            );
            println!("  places_table:     {}", config.places_table);
            println!("  categories_table: {}", config.categories_table);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "google_api_key" => config.google_api_key = value.clone(),
        "airtable_api_key" => config.airtable_api_key = value.clone(),
        "airtable_base_id" => config.airtable_base_id = value.clone(),
        "places_table" => config.places_table = value.clone(),
        "categories_table" => config.categories_table = value.clone(),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: google_api_key, airtable_api_key, airtable_base_id, \
                 places_table, categories_table",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    // don't echo secrets back
    let shown = if key.ends_with("_key") {
        mask(&value).to_string()
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn or_not_set(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(not set)"
    } else {
        "(set)"
    }
}
