//! taxmap Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout taxmap:
//! - Corpus search response records (as delivered by the BIOfid API)
//! - Documents, pages and the page back-reference
//! - Taxon / location mentions and their relations
//! - Geographic points and flat output records
//! - Common error types
//! - The coordinate lookup collaborator trait
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, BiofidConfig, ConfigError, ExportConfig, ExtractionConfig, LoggingConfig,
    WikidataConfig,
};

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error type for taxmap operations
#[derive(Error, Debug)]
pub enum TaxmapError {
    /// An external service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Malformed markup on page {page}: {message}")]
    Markup { page: String, message: String },

    #[error("Unknown pairing strategy '{name}' (available: {})", .available.join(", "))]
    UnknownStrategy {
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaxmapError>;

// ============================================================================
// Corpus Search Response
// ============================================================================

/// Top-level search response of the BIOfid corpus API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Document metadata records, in result order
    #[serde(default)]
    pub data: Vec<DocumentMetadata>,
}

impl SearchResponse {
    /// Parse a raw JSON response body
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// One document record of a search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// Pipe-delimited author list
    #[serde(rename = "Authors")]
    pub authors: Option<String>,

    #[serde(rename = "Journal")]
    pub journal: Option<String>,

    #[serde(rename = "Title")]
    pub title: Option<String>,

    #[serde(rename = "URL")]
    pub url: Option<String>,

    #[serde(rename = "PublicationYear", deserialize_with = "lenient_year")]
    pub publication_year: Option<i64>,

    #[serde(rename = "TextExtracts")]
    pub text_extracts: Vec<PageMetadata>,
}

/// One page record inside a document record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    #[serde(rename = "Label")]
    pub label: Option<String>,

    #[serde(rename = "URL")]
    pub url: Option<String>,

    /// Marked-up text fragments of the page
    #[serde(rename = "TextPreview")]
    pub text_preview: Vec<String>,
}

/// Accepts a number, a numeric string or null
fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// ============================================================================
// Documents and Pages
// ============================================================================

/// A document of the corpus with the pages that matched the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub publication_year: Option<i64>,
    pub pages: Vec<Page>,
}

/// A single page of a document, holding its annotated snippets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub label: Option<String>,
    pub url: Option<String>,
    /// Raw snippets, possibly containing inline `<em>` markup
    pub snippets: Vec<String>,
}

/// Non-owning reference from a page to the document that owns it
///
/// A `PageRef` can only be obtained from [`PageRef::all`], so the referenced
/// page is always one of its document's own pages.
#[derive(Debug, Clone)]
pub struct PageRef {
    document: Arc<Document>,
    index: usize,
}

impl PageRef {
    /// References to every page of a document, in page order
    pub fn all(document: &Arc<Document>) -> Vec<PageRef> {
        (0..document.pages.len())
            .map(|index| PageRef {
                document: Arc::clone(document),
                index,
            })
            .collect()
    }

    /// The owning document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Shared handle to the owning document
    pub fn document_arc(&self) -> &Arc<Document> {
        &self.document
    }

    /// The referenced page
    pub fn page(&self) -> &Page {
        &self.document.pages[self.index]
    }

    /// Position of the page inside its document
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable page name for diagnostics
    pub fn describe(&self) -> String {
        let page = self.page();
        page.url
            .clone()
            .or_else(|| page.label.clone())
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

impl PartialEq for PageRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.document, &other.document) && self.index == other.index
    }
}

impl Eq for PageRef {}

// ============================================================================
// Entities and Relations
// ============================================================================

/// A taxon mentioned in the annotated text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taxon {
    pub label: String,
    /// BIOfid ontology URI, canonical form
    pub biofid_uri: Option<String>,
    pub wikidata_uri: Option<String>,
}

/// A place mentioned in the annotated text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub label: String,
    pub wikidata_uri: Option<String>,
}

/// A taxon and a location found together by a pairing strategy
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonLocationRelation {
    pub taxon: Taxon,
    pub location: Location,
    /// Page the pair was found on
    pub source: PageRef,
    /// Tag of the strategy that produced the pair
    pub strategy: String,
}

// ============================================================================
// Geography and Output
// ============================================================================

/// Coordinates of a Wikidata entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    /// Wikidata URI the point belongs to (join key)
    pub wikidata_uri: String,
}

/// Flat, map-ready record; one per relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub taxon_label: String,
    pub taxon_biofid_uri: Option<String>,
    pub taxon_wikidata_uri: Option<String>,
    pub location_label: String,
    pub location_wikidata_uri: Option<String>,
    pub page_url: Option<String>,
    pub document_title: Option<String>,
    pub document_publication_year: Option<i64>,
    pub document_url: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

// ============================================================================
// Traits
// ============================================================================

/// Source of geographic points for Wikidata entities
#[async_trait::async_trait]
pub trait CoordinateLookup: Send + Sync {
    /// Look up points for all given URIs in one batch
    ///
    /// URIs without coordinates are simply missing from the result.
    async fn lookup(&self, wikidata_uris: &[String]) -> Result<Vec<GeoPoint>>;

    /// Get lookup name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn document_with_pages(count: usize) -> Arc<Document> {
        Arc::new(Document {
            authors: vec!["A. Author".to_string()],
            journal: None,
            title: Some("Flora".to_string()),
            url: None,
            publication_year: Some(1905),
            pages: (0..count)
                .map(|i| Page {
                    label: Some(format!("p{i}")),
                    url: Some(format!("https://example.org/{i}")),
                    snippets: Vec::new(),
                })
                .collect(),
        })
    }

    #[test]
    fn test_page_refs_follow_page_order() {
        let doc = document_with_pages(3);
        let refs = PageRef::all(&doc);

        assert_eq!(refs.len(), 3);
        assert_eq!(refs[2].index(), 2);
        assert_eq!(refs[1].page().label.as_deref(), Some("p1"));
        assert_eq!(refs[0].document().title.as_deref(), Some("Flora"));
    }

    #[test]
    fn test_page_ref_identity() {
        let doc = document_with_pages(2);
        let twin = Arc::new((*doc).clone());

        let a = PageRef::all(&doc);
        let b = PageRef::all(&twin);

        assert_eq!(a[0], a[0].clone());
        assert_ne!(a[0], a[1]);
        // Equal content, different document
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn test_search_response_field_names() {
        let json = r#"{
            "data": [{
                "Authors": "Smith|Doe",
                "Journal": "Botanische Zeitung",
                "Title": "Über Abies",
                "URL": "https://example.org/doc",
                "PublicationYear": 1890,
                "TextExtracts": [{
                    "Label": "12",
                    "URL": "https://example.org/doc/12?query=abies",
                    "TextPreview": ["<em class=\"taxon\">Abies</em>"]
                }]
            }]
        }"#;

        let response = SearchResponse::from_json(json).unwrap();
        let doc = &response.data[0];

        assert_eq!(doc.authors.as_deref(), Some("Smith|Doe"));
        assert_eq!(doc.publication_year, Some(1890));
        assert_eq!(doc.text_extracts[0].label.as_deref(), Some("12"));
        assert_eq!(doc.text_extracts[0].text_preview.len(), 1);
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let response = SearchResponse::from_json(r#"{"data": [{"Title": "Untitled"}]}"#).unwrap();
        let doc = &response.data[0];

        assert!(doc.authors.is_none());
        assert!(doc.publication_year.is_none());
        assert!(doc.text_extracts.is_empty());
    }

    #[test]
    fn test_publication_year_variants() {
        let parse = |year: &str| {
            let json = format!(r#"{{"data": [{{"PublicationYear": {year}}}]}}"#);
            SearchResponse::from_json(&json).unwrap().data[0].publication_year
        };

        assert_eq!(parse("1901"), Some(1901));
        assert_eq!(parse("\"1901\""), Some(1901));
        assert_eq!(parse("null"), None);
        assert_eq!(parse("\"n.d.\""), None);
    }

    #[test]
    fn test_error_display() {
        let err = TaxmapError::UnknownStrategy {
            name: "window".to_string(),
            available: vec!["page".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown pairing strategy 'window' (available: page)"
        );

        let err = TaxmapError::Upstream {
            service: "BIOfid API".to_string(),
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(err.to_string(), "BIOfid API returned 503: down");
    }

    struct FixedLookup;

    #[async_trait::async_trait]
    impl CoordinateLookup for FixedLookup {
        async fn lookup(&self, wikidata_uris: &[String]) -> Result<Vec<GeoPoint>> {
            Ok(wikidata_uris
                .iter()
                .filter(|uri| uri.as_str() == "Q2")
                .map(|uri| GeoPoint {
                    longitude: 13.4,
                    latitude: 52.5,
                    wikidata_uri: uri.clone(),
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_lookup_as_trait_object() {
        let lookup: Box<dyn CoordinateLookup> = Box::new(FixedLookup);
        let uris = vec!["Q2".to_string(), "Q3".to_string()];

        let points = tokio_test::block_on(lookup.lookup(&uris)).unwrap();

        assert_eq!(lookup.name(), "fixed");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].wikidata_uri, "Q2");
    }
}
