//! End-to-end tests: search response -> relations -> coordinates -> table

use async_trait::async_trait;

use taxmap_core::{CoordinateLookup, GeoPoint, Result, SearchResponse};
use taxmap_export::{markers, summarize_documents, write_records, CoordinateJoin, DEFAULT_DELIMITER};
use taxmap_extractor::RelationPipeline;

/// In-memory coordinate source
struct StaticLookup {
    points: Vec<GeoPoint>,
}

#[async_trait]
impl CoordinateLookup for StaticLookup {
    async fn lookup(&self, wikidata_uris: &[String]) -> Result<Vec<GeoPoint>> {
        Ok(self
            .points
            .iter()
            .filter(|p| wikidata_uris.contains(&p.wikidata_uri))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

const CORPUS: &str = r#"{"data": [
    {
        "Authors": "Doe|Roe",
        "Journal": "Berichte",
        "Title": "Flora von Berlin",
        "URL": "https://example.org/doc/1",
        "PublicationYear": 1899,
        "TextExtracts": [{
            "Label": "12",
            "URL": "https://example.org/doc/1/12?query=abies",
            "TextPreview": [
                "<em class=\"taxon\" wikidata=\"Q1\" biofid-uri=\"https://www.biofid.de/bio-ontologies/Tracheophyta#GBIF_2685484\">Abies alba</em> near",
                "<em class=\"location_place\" wikidata=\"Q2\">Berlin</em>"
            ]
        }]
    },
    {
        "Title": "Reise",
        "TextExtracts": [{
            "URL": "https://example.org/doc/2/1",
            "TextPreview": ["<em class=\"taxon\">Picea</em> bei <em class=\"location_place\" wikidata=\"Q404\">Atlantis</em>"]
        }]
    }
]}"#;

fn lookup() -> StaticLookup {
    StaticLookup {
        points: vec![GeoPoint {
            longitude: 13.4,
            latitude: 52.5,
            wikidata_uri: "Q2".to_string(),
        }],
    }
}

#[tokio::test]
async fn test_corpus_to_records() {
    let response = SearchResponse::from_json(CORPUS).unwrap();
    let relations = RelationPipeline::default().extract_default(&response).unwrap();
    assert_eq!(relations.len(), 2);

    let lookup = lookup();
    let records = CoordinateJoin::new(&lookup).join(&relations).await.unwrap();

    assert_eq!(records.len(), 2);

    let berlin = &records[0];
    assert_eq!(berlin.taxon_label, "Abies alba");
    assert_eq!(berlin.taxon_wikidata_uri.as_deref(), Some("Q1"));
    assert_eq!(
        berlin.taxon_biofid_uri.as_deref(),
        Some("https://www.biofid.de/bio-ontologies/Tracheophyta/gbif/2685484")
    );
    assert_eq!(berlin.location_label, "Berlin");
    assert_eq!(berlin.location_wikidata_uri.as_deref(), Some("Q2"));
    assert_eq!(berlin.page_url.as_deref(), Some("https://example.org/doc/1/12"));
    assert_eq!(berlin.document_title.as_deref(), Some("Flora von Berlin"));
    assert_eq!(berlin.document_publication_year, Some(1899));
    assert_eq!(berlin.longitude, Some(13.4));
    assert_eq!(berlin.latitude, Some(52.5));

    let atlantis = &records[1];
    assert_eq!(atlantis.location_label, "Atlantis");
    assert_eq!(atlantis.taxon_biofid_uri, None);
    assert_eq!(atlantis.document_publication_year, None);
    assert_eq!(atlantis.longitude, None);
    assert_eq!(atlantis.latitude, None);
}

#[tokio::test]
async fn test_corpus_to_table() {
    let response = SearchResponse::from_json(CORPUS).unwrap();
    let relations = RelationPipeline::default().extract_default(&response).unwrap();
    let lookup = lookup();
    let records = CoordinateJoin::new(&lookup).join(&relations).await.unwrap();

    let mut buf = Vec::new();
    write_records(&mut buf, &records, DEFAULT_DELIMITER).unwrap();
    let table = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("taxon_label\ttaxon_biofid_uri\t"));
    assert!(lines[1].starts_with("Abies alba\t"));
    assert!(lines[1].ends_with("\t13.4\t52.5"));
    assert!(lines[2].ends_with("\t\t"));

    let markers = markers(&records);
    assert_eq!(markers.len(), 1);
    assert!(markers[0].popup.contains(">Berlin</a>"));
}

#[test]
fn test_corpus_summary() {
    let response = SearchResponse::from_json(CORPUS).unwrap();
    let summaries = summarize_documents(&response);

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].taxon_count, 1);
    assert_eq!(summaries[1].taxon_count, 1);
    assert_eq!(summaries[1].document_title.as_deref(), Some("Reise"));
}
