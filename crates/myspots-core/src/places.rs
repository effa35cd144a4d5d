//! Google Places API client
//!
//! Text search (with optional geocoded location bias) and detailed place
//! lookup. Detailed results keep the raw provider payload as JSON text so
//! the record store retains everything the API returned.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 30;

/// A candidate from text search
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub google_place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A detailed place record from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub google_place_id: String,
    pub name: String,
    pub address: String,
    pub website: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Raw provider payload as JSON text
    pub google_json_data: String,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ApiGeometry {
    location: ApiLocation,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    place_id: String,
    name: String,
    #[serde(default)]
    formatted_address: String,
    geometry: ApiGeometry,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: ApiGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

/// Client for the Google Maps Places and Geocoding APIs
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
}

impl PlacesClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        if config.google_api_key.is_empty() {
            bail!(
                "Google Maps is not configured. Set google_api_key in {:?}",
                Config::config_file_path()
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key: config.google_api_key.clone(),
        })
    }

    /// Geocode a free-text location to coordinates
    ///
    /// Returns `None` when the location cannot be geocoded; search then
    /// proceeds without a location bias.
    pub async fn geocode(&self, location: &str) -> Result<Option<(f64, f64)>> {
        let response: GeocodeResponse = self
            .http
            .get(GEOCODE_URL)
            .query(&[("address", location), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Geocoding request failed")?
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match response.results.first() {
            Some(result) => {
                debug!(address = %result.formatted_address, "geocoded location");
                Ok(Some((
                    result.geometry.location.lat,
                    result.geometry.location.lng,
                )))
            }
            None => {
                warn!(location, status = %response.status, "no geocoding results");
                Ok(None)
            }
        }
    }

    /// Text search for places, with optional location bias
    pub async fn search(
        &self,
        query: &str,
        location: Option<&str>,
        radius: Option<u32>,
    ) -> Result<Vec<PlaceCandidate>> {
        let latlng = match location {
            Some(loc) => self.geocode(loc).await?,
            None => None,
        };

        let mut request = self
            .http
            .get(TEXT_SEARCH_URL)
            .query(&[("query", query), ("key", self.api_key.as_str())]);
        if let Some((lat, lng)) = latlng {
            request = request.query(&[("location", format!("{},{}", lat, lng).as_str())]);
        }
        if let Some(radius) = radius {
            request = request.query(&[("radius", radius.to_string().as_str())]);
        }

        let response: SearchResponse = request
            .send()
            .await
            .context("Places search request failed")?
            .json()
            .await
            .context("Failed to parse places search response")?;

        match response.status.as_str() {
            "OK" => Ok(response
                .results
                .into_iter()
                .map(|result| PlaceCandidate {
                    google_place_id: result.place_id,
                    name: result.name,
                    formatted_address: result.formatted_address,
                    latitude: result.geometry.location.lat,
                    longitude: result.geometry.location.lng,
                })
                .collect()),
            "ZERO_RESULTS" => Ok(Vec::new()),
            status => bail!("Places search failed for '{}': status {}", query, status),
        }
    }

    /// Fetch the detailed record for a place id
    pub async fn details(&self, place_id: &str) -> Result<PlaceDetails> {
        let response: Value = self
            .http
            .get(DETAILS_URL)
            .query(&[("place_id", place_id), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Place details request failed")?
            .json()
            .await
            .context("Failed to parse place details response")?;

        let status = response["status"].as_str().unwrap_or("UNKNOWN");
        if status != "OK" {
            bail!("Place details failed for '{}': status {}", place_id, status);
        }

        parse_details(&response["result"])
    }
}

/// Extract typed details from a raw `result` payload
fn parse_details(result: &Value) -> Result<PlaceDetails> {
    let field = |key: &str| {
        result[key]
            .as_str()
            .map(String::from)
            .with_context(|| format!("place details missing '{}'", key))
    };
    let coordinate = |key: &str| {
        result["geometry"]["location"][key]
            .as_f64()
            .with_context(|| format!("place details missing geometry '{}'", key))
    };

    Ok(PlaceDetails {
        google_place_id: field("place_id")?,
        name: field("name")?,
        address: field("formatted_address")?,
        website: result["website"].as_str().map(String::from),
        latitude: coordinate("lat")?,
        longitude: coordinate("lng")?,
        google_json_data: serde_json::to_string(result)
            .context("Failed to serialize provider payload")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_response_deserializes() {
        let response: SearchResponse = serde_json::from_value(json!({
            "status": "OK",
            "results": [{
                "place_id": "gp1",
                "name": "Tartine",
                "formatted_address": "600 Guerrero St",
                "geometry": { "location": { "lat": 37.76, "lng": -122.42 } }
            }]
        }))
        .unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].geometry.location.lng, -122.42);
    }

    #[test]
    fn test_zero_results_deserializes_empty() {
        let response: SearchResponse =
            serde_json::from_value(json!({ "status": "ZERO_RESULTS" })).unwrap();
        assert_eq!(response.status, "ZERO_RESULTS");
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_parse_details() {
        let result = json!({
            "place_id": "gp1",
            "name": "Tartine",
            "formatted_address": "600 Guerrero St",
            "website": "https://tartinebakery.com",
            "geometry": { "location": { "lat": 37.76, "lng": -122.42 } },
            "rating": 4.6
        });

        let details = parse_details(&result).unwrap();
        assert_eq!(details.google_place_id, "gp1");
        assert_eq!(details.website.as_deref(), Some("https://tartinebakery.com"));
        assert_eq!(details.latitude, 37.76);
        // raw payload is preserved, extra fields included
        assert!(details.google_json_data.contains("rating"));
    }

    #[test]
    fn test_parse_details_without_website() {
        let result = json!({
            "place_id": "gp1",
            "name": "Dolores Park",
            "formatted_address": "Dolores St",
            "geometry": { "location": { "lat": 37.759, "lng": -122.427 } }
        });

        let details = parse_details(&result).unwrap();
        assert!(details.website.is_none());
    }

    #[test]
    fn test_parse_details_missing_geometry_fails() {
        let result = json!({
            "place_id": "gp1",
            "name": "Broken",
            "formatted_address": "Nowhere"
        });
        assert!(parse_details(&result).is_err());
    }
}
