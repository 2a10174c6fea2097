//! Wikidata coordinate lookup
//!
//! Coordinates are read from the `P625` (coordinate location) statements
//! through the public SPARQL endpoint, one query per run.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::check_status;
use taxmap_core::{CoordinateLookup, GeoPoint, Result, TaxmapError, WikidataConfig};

const SERVICE: &str = "Wikidata SPARQL";

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Q[0-9]+$").expect("entity id pattern is valid"));

static WKT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Point\(\s*(?P<longitude>\S+)\s+(?P<latitude>[^\s)]+)\s*\)")
        .expect("point pattern is valid")
});

// ============================================================================
// SPARQL JSON results
// ============================================================================

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<CoordinateBinding>,
}

#[derive(Debug, Deserialize)]
struct CoordinateBinding {
    #[serde(rename = "locationUri")]
    location_uri: SparqlValue,
    coordinates: SparqlValue,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Trailing `Q<digits>` id of a Wikidata URI
pub fn entity_id(uri: &str) -> Option<&str> {
    ENTITY_ID.find(uri.trim()).map(|m| m.as_str())
}

/// Parse a WKT literal `Point(<longitude> <latitude>)`
///
/// Returns `(longitude, latitude)`.
pub fn parse_point(literal: &str) -> Option<(f64, f64)> {
    let caps = WKT_POINT.captures(literal)?;
    let longitude = caps["longitude"].parse().ok()?;
    let latitude = caps["latitude"].parse().ok()?;
    Some((longitude, latitude))
}

/// SPARQL query for the coordinates of the given entity ids
pub fn build_coordinate_query<S: AsRef<str>>(entity_ids: &[S]) -> String {
    let values: Vec<String> = entity_ids
        .iter()
        .map(|id| format!("wd:{}", id.as_ref()))
        .collect();

    format!(
        "SELECT ?locationUri ?coordinates {{\n    \
         VALUES ?locationUri {{ {} }}\n    \
         ?locationUri wdt:P625 ?coordinates\n}}",
        values.join(" ")
    )
}

/// Group the requested URIs by entity id, keeping first-seen id order
fn group_by_entity_id(uris: &[String]) -> (Vec<String>, HashMap<String, Vec<String>>) {
    let mut order = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();

    for uri in uris {
        let Some(id) = entity_id(uri) else {
            warn!(uri = %uri, "Skipping location without a Wikidata entity id");
            continue;
        };

        let group = groups.entry(id.to_string()).or_default();
        if group.is_empty() {
            order.push(id.to_string());
        }
        if !group.contains(uri) {
            group.push(uri.clone());
        }
    }

    (order, groups)
}

/// Turn result bindings into points keyed by the requested URIs
fn points_from_bindings(
    bindings: Vec<CoordinateBinding>,
    requested: &HashMap<String, Vec<String>>,
) -> Vec<GeoPoint> {
    let mut points = Vec::new();

    for binding in bindings {
        let Some(id) = entity_id(&binding.location_uri.value) else {
            warn!(uri = %binding.location_uri.value, "Result without entity id");
            continue;
        };
        let Some((longitude, latitude)) = parse_point(&binding.coordinates.value) else {
            warn!(
                uri = %binding.location_uri.value,
                coordinates = %binding.coordinates.value,
                "Skipping unparseable coordinates"
            );
            continue;
        };

        match requested.get(id) {
            Some(uris) => points.extend(uris.iter().map(|uri| GeoPoint {
                longitude,
                latitude,
                wikidata_uri: uri.clone(),
            })),
            None => points.push(GeoPoint {
                longitude,
                latitude,
                wikidata_uri: binding.location_uri.value.clone(),
            }),
        }
    }

    points
}

// ============================================================================
// Client
// ============================================================================

/// Wikidata SPARQL client
pub struct WikidataClient {
    client: Client,
    sparql_url: String,
}

impl WikidataClient {
    /// Create a new client
    pub fn new(
        sparql_url: impl Into<String>,
        user_agent: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.as_ref())
            .timeout(timeout)
            .build()
            .map_err(|e| TaxmapError::Http(format!("Failed to build Wikidata client: {e}")))?;

        Ok(Self {
            client,
            sparql_url: sparql_url.into(),
        })
    }

    /// Create from config
    pub fn from_config(config: &WikidataConfig) -> Result<Self> {
        Self::new(
            config.sparql_url.clone(),
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Run a SELECT query and return the raw JSON results
    async fn query(&self, query: &str) -> Result<SparqlResponse> {
        debug!(endpoint = %self.sparql_url, "Sending SPARQL query");

        let response = self
            .client
            .post(&self.sparql_url)
            .header("Accept", "application/sparql-results+json")
            .form(&[("query", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| TaxmapError::Http(format!("{SERVICE} request failed: {e}")))?;

        let response = check_status(SERVICE, response).await?;

        response
            .json()
            .await
            .map_err(|e| TaxmapError::InvalidResponse(format!("{SERVICE}: {e}")))
    }
}

#[async_trait]
impl CoordinateLookup for WikidataClient {
    async fn lookup(&self, wikidata_uris: &[String]) -> Result<Vec<GeoPoint>> {
        let (ids, requested) = group_by_entity_id(wikidata_uris);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        info!(entities = ids.len(), "Requesting coordinates from Wikidata");
        let response = self.query(&build_coordinate_query(&ids)).await?;

        let points = points_from_bindings(response.results.bindings, &requested);
        info!(points = points.len(), "Received coordinates");

        Ok(points)
    }

    fn name(&self) -> &str {
        "wikidata"
    }
}

// ============================================================================
// Tests
// ============================================================================
