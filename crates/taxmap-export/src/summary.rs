//! Per-document annotation counts

use serde::Serialize;
use tracing::debug;

use crate::tsv::Tabular;
use taxmap_core::{DocumentMetadata, SearchResponse};

/// Class markers counted as taxon annotations in a raw fragment
const TAXON_MARKERS: &[&str] = &["taxon", "plant_flora"];

/// Taxon annotation count of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub taxon_count: usize,
    pub document_publication_year: Option<i64>,
    pub document_title: Option<String>,
    pub document_url: Option<String>,
}

impl Tabular for DocumentSummary {
    const COLUMNS: &'static [&'static str] = &[
        "taxon_count",
        "document_publication_year",
        "document_title",
        "document_url",
    ];
}

fn count_taxon_fragments(metadata: &DocumentMetadata) -> usize {
    metadata
        .text_extracts
        .iter()
        .flat_map(|page| page.text_preview.iter())
        .filter(|fragment| TAXON_MARKERS.iter().any(|m| fragment.contains(m)))
        .count()
}

/// One summary per document, in response order
pub fn summarize_documents(response: &SearchResponse) -> Vec<DocumentSummary> {
    response
        .data
        .iter()
        .map(|metadata| {
            let taxon_count = count_taxon_fragments(metadata);
            debug!(title = ?metadata.title, taxon_count, "Summarized document");

            DocumentSummary {
                taxon_count,
                document_publication_year: metadata.publication_year,
                document_title: metadata.title.clone(),
                document_url: metadata.url.clone(),
            }
        })
        .collect()
}
