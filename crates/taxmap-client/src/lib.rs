//! taxmap Client - HTTP collaborators
//!
//! - [`BiofidClient`]: BIOfid corpus API (term context, document metadata)
//! - [`WikidataClient`]: coordinate lookup through the Wikidata SPARQL endpoint

pub mod biofid;
pub mod wikidata;

pub use biofid::BiofidClient;
pub use wikidata::{build_coordinate_query, entity_id, parse_point, WikidataClient};

use reqwest::Response;
use tracing::error;

use taxmap_core::{Result, TaxmapError};

/// Turn a non-success response into an upstream error carrying the body
pub(crate) async fn check_status(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(service, status = status.as_u16(), body = %body, "Server responded with an error");

    Err(TaxmapError::Upstream {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}
