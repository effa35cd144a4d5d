//! Airtable record store client
//!
//! Reads the places and categories tables, checks place existence by Google
//! place id, and inserts new place records. Airtable returns sparse `fields`
//! objects (empty fields are simply absent), so parsing goes through
//! `serde_json::Value` with per-record validation: a record missing a
//! required field is skipped with a warning and collected for the end-of-run
//! report, never silently dropped.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::models::{CategoryRecord, Flag, PlaceRecord};
use crate::places::PlaceDetails;

const API_BASE: &str = "https://api.airtable.com/v0";

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 30;

/// One raw Airtable record
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<Record>,
    offset: Option<String>,
}

/// A record dropped during parsing, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

impl std::fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// Client for the Airtable REST API
pub struct AirtableClient {
    http: reqwest::Client,
    api_key: String,
    base_id: String,
    places_table: String,
    categories_table: String,
}

impl AirtableClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        if config.airtable_api_key.is_empty() || config.airtable_base_id.is_empty() {
            bail!(
                "Airtable is not configured. Set airtable_api_key and airtable_base_id in {:?}",
                Config::config_file_path()
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key: config.airtable_api_key.clone(),
            base_id: config.airtable_base_id.clone(),
            places_table: config.places_table.clone(),
            categories_table: config.categories_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", API_BASE, self.base_id, table)
    }

    /// List every record in a table, following pagination
    async fn list_table(&self, table: &str, sort_field: Option<&str>) -> Result<Vec<Record>> {
        let url = self.table_url(table);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.api_key);
            if let Some(field) = sort_field {
                request = request.query(&[
                    ("sort[0][field]", field),
                    ("sort[0][direction]", "asc"),
                ]);
            }
            if let Some(ref cursor) = offset {
                request = request.query(&[("offset", cursor.as_str())]);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Airtable request failed for table '{}'", table))?;
            if !response.status().is_success() {
                bail!(
                    "Airtable returned {} for table '{}'",
                    response.status(),
                    table
                );
            }
            let page: RecordPage = response
                .json()
                .await
                .with_context(|| format!("Failed to parse Airtable response for '{}'", table))?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(table, count = records.len(), "listed Airtable table");
        Ok(records)
    }

    /// Load all category records
    pub async fn list_categories(&self) -> Result<(Vec<CategoryRecord>, Vec<SkippedRecord>)> {
        let records = self.list_table(&self.categories_table, None).await?;
        parse_categories(records)
    }

    /// Load all place records
    ///
    /// With `oldest_first`, records are sorted by last-modified time so
    /// marker order is stable across runs.
    pub async fn list_places(
        &self,
        oldest_first: bool,
    ) -> Result<(Vec<PlaceRecord>, Vec<SkippedRecord>)> {
        let sort = if oldest_first {
            Some("last_modified")
        } else {
            None
        };
        let records = self.list_table(&self.places_table, sort).await?;
        Ok(parse_places(records))
    }

    /// Check whether a place with this Google place id already exists
    pub async fn place_exists(&self, google_place_id: &str) -> Result<bool> {
        let formula = format!(r#"{{google_place_id}} = "{}""#, google_place_id);
        let response = self
            .http
            .get(self.table_url(&self.places_table))
            .bearer_auth(&self.api_key)
            .query(&[
                ("filterByFormula", formula.as_str()),
                ("maxRecords", "1"),
            ])
            .send()
            .await
            .context("Airtable existence check failed")?;
        if !response.status().is_success() {
            bail!("Airtable returned {} for existence check", response.status());
        }
        let page: RecordPage = response
            .json()
            .await
            .context("Failed to parse Airtable response")?;
        Ok(!page.records.is_empty())
    }

    /// Insert a place record from provider details
    pub async fn create_place(&self, place: &PlaceDetails, notes: Option<&str>) -> Result<()> {
        let mut fields = json!({
            "name": place.name,
            "address": place.address,
            "latitude": place.latitude,
            "longitude": place.longitude,
            "google_place_id": place.google_place_id,
            "google_json_data": place.google_json_data,
        });
        if let Some(website) = &place.website {
            fields["website"] = json!(website);
        }
        if let Some(notes) = notes {
            fields["notes"] = json!(notes);
        }

        let body = json!({ "records": [{ "fields": fields }] });
        let response = self
            .http
            .post(self.table_url(&self.places_table))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Airtable insert failed")?;
        if !response.status().is_success() {
            bail!(
                "Airtable returned {} inserting '{}'",
                response.status(),
                place.name
            );
        }
        Ok(())
    }
}

/// Parse category records
///
/// A category missing its name is skipped and reported; a category with more
/// than one parent violates the single-parent model and fails the run.
pub fn parse_categories(
    records: Vec<Record>,
) -> Result<(Vec<CategoryRecord>, Vec<SkippedRecord>)> {
    let mut categories = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        let Some(name) = str_field(&record.fields, "category") else {
            skipped.push(SkippedRecord {
                id: record.id,
                reason: "missing category name".to_string(),
            });
            continue;
        };
        let parents = str_list_field(&record.fields, "parent");
        if parents.len() > 1 {
            bail!(
                "category '{}' has {} parents; the category model allows at most one",
                record.id,
                parents.len()
            );
        }
        categories.push(CategoryRecord {
            id: record.id,
            name,
            icon_code: str_field(&record.fields, "google_style_icon_code"),
            parent_id: parents.into_iter().next(),
        });
    }

    Ok((categories, skipped))
}

/// Parse place records, skipping any missing a required field
pub fn parse_places(records: Vec<Record>) -> (Vec<PlaceRecord>, Vec<SkippedRecord>) {
    let mut places = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        match parse_place(record) {
            Ok(place) => places.push(place),
            Err(skip) => skipped.push(skip),
        }
    }

    (places, skipped)
}

fn parse_place(record: Record) -> std::result::Result<PlaceRecord, SkippedRecord> {
    let skip = |reason: &str| SkippedRecord {
        id: record.id.clone(),
        reason: reason.to_string(),
    };

    let name = str_field(&record.fields, "name").ok_or_else(|| skip("missing name"))?;
    let latitude = f64_field(&record.fields, "latitude").ok_or_else(|| skip("missing latitude"))?;
    let longitude =
        f64_field(&record.fields, "longitude").ok_or_else(|| skip("missing longitude"))?;

    Ok(PlaceRecord {
        name,
        latitude,
        longitude,
        address: str_field(&record.fields, "address").unwrap_or_default(),
        website: str_field(&record.fields, "website"),
        google_place_id: str_field(&record.fields, "google_place_id").unwrap_or_default(),
        google_json_data: str_field(&record.fields, "google_json_data").unwrap_or_default(),
        category_ids: str_list_field(&record.fields, "primary_category"),
        tags: str_list_field(&record.fields, "tags"),
        flags: str_list_field(&record.fields, "flags")
            .into_iter()
            .map(Flag::from)
            .collect(),
        notes: str_field(&record.fields, "notes"),
        id: record.id,
    })
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn f64_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}

fn str_list_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
