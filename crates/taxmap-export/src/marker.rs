//! Map marker popups for located records

use serde::Serialize;

use crate::tsv::Tabular;
use taxmap_core::OutputRecord;

/// One located record ready for a map layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub popup: String,
}

impl Tabular for MapMarker {
    const COLUMNS: &'static [&'static str] = &["latitude", "longitude", "popup"];
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn link(href: Option<&str>, text: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_html(href.unwrap_or_default()),
        escape_html(text)
    )
}

/// HTML popup text describing where a taxon was found
pub fn marker_text(record: &OutputRecord) -> String {
    let year = record
        .document_publication_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "an unknown year".to_string());

    format!(
        "<p>Found hint for <b>{}</b> in <b>{}</b> in {}. <br><br><b>{}</b></p>",
        link(record.taxon_biofid_uri.as_deref(), &record.taxon_label),
        link(record.location_wikidata_uri.as_deref(), &record.location_label),
        year,
        link(record.page_url.as_deref(), "Source"),
    )
}

/// Markers for all records that carry coordinates
pub fn markers(records: &[OutputRecord]) -> Vec<MapMarker> {
    records
        .iter()
        .filter_map(|record| match (record.latitude, record.longitude) {
            (Some(latitude), Some(longitude)) => Some(MapMarker {
                latitude,
                longitude,
                popup: marker_text(record),
            }),
            _ => None,
        })
        .collect()
}
