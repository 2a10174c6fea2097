//! Coordinate join
//!
//! Attaches Wikidata coordinates to relations and flattens them into
//! [`OutputRecord`]s. Points are matched to locations by comparing the
//! Wikidata URI verbatim; a location without a matching point keeps empty
//! coordinates.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use taxmap_core::{CoordinateLookup, GeoPoint, OutputRecord, Result, TaxonLocationRelation};

static QUERY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?query=.*").expect("query suffix pattern is valid"));

/// Remove a trailing `?query=...` search component from a page URL
pub fn strip_query(url: &str) -> String {
    QUERY_SUFFIX.replace(url, "").into_owned()
}

/// Distinct location URIs in first-seen order; locations without URI are skipped
pub fn distinct_location_uris(relations: &[TaxonLocationRelation]) -> Vec<String> {
    let mut seen = HashSet::new();
    relations
        .iter()
        .filter_map(|r| r.location.wikidata_uri.as_deref())
        .filter(|uri| seen.insert(*uri))
        .map(str::to_string)
        .collect()
}

/// Flatten one relation with its (optional) point
pub fn to_record(relation: &TaxonLocationRelation, point: Option<&GeoPoint>) -> OutputRecord {
    let document = relation.source.document();
    let page = relation.source.page();

    OutputRecord {
        taxon_label: relation.taxon.label.clone(),
        taxon_biofid_uri: relation.taxon.biofid_uri.clone(),
        taxon_wikidata_uri: relation.taxon.wikidata_uri.clone(),
        location_label: relation.location.label.clone(),
        location_wikidata_uri: relation.location.wikidata_uri.clone(),
        page_url: page.url.as_deref().map(strip_query),
        document_title: document.title.clone(),
        document_publication_year: document.publication_year,
        document_url: document.url.clone(),
        longitude: point.map(|p| p.longitude),
        latitude: point.map(|p| p.latitude),
    }
}

/// Join relations with already fetched points, keeping relation order
///
/// When several points share a URI the last one wins.
pub fn join_with_points(
    relations: &[TaxonLocationRelation],
    points: &[GeoPoint],
) -> Vec<OutputRecord> {
    let index: HashMap<&str, &GeoPoint> = points
        .iter()
        .map(|p| (p.wikidata_uri.as_str(), p))
        .collect();

    relations
        .iter()
        .map(|relation| {
            let point = relation
                .location
                .wikidata_uri
                .as_deref()
                .and_then(|uri| index.get(uri).copied());
            to_record(relation, point)
        })
        .collect()
}

/// Fetches coordinates for a relation set in one batch and joins them
pub struct CoordinateJoin<'a> {
    lookup: &'a dyn CoordinateLookup,
}

impl<'a> CoordinateJoin<'a> {
    pub fn new(lookup: &'a dyn CoordinateLookup) -> Self {
        Self { lookup }
    }

    pub async fn join(&self, relations: &[TaxonLocationRelation]) -> Result<Vec<OutputRecord>> {
        let uris = distinct_location_uris(relations);

        let points = if uris.is_empty() {
            Vec::new()
        } else {
            info!(
                lookup = self.lookup.name(),
                locations = uris.len(),
                "Looking up coordinates"
            );
            self.lookup.lookup(&uris).await?
        };

        let records = join_with_points(relations, &points);
        debug!(
            records = records.len(),
            located = records.iter().filter(|r| r.longitude.is_some()).count(),
            "Joined coordinates"
        );

        Ok(records)
    }
}
