//! Document assembly from corpus search records

use std::sync::Arc;

use taxmap_core::{Document, DocumentMetadata, Page, PageMetadata};

/// Separator of the `Authors` field
pub const AUTHOR_SEPARATOR: char = '|';

/// Build a document with its pages from one search record
///
/// Missing fields stay absent. A missing or empty author field yields a
/// single empty author name.
pub fn assemble_document(metadata: &DocumentMetadata) -> Arc<Document> {
    let authors = metadata
        .authors
        .as_deref()
        .unwrap_or_default()
        .split(AUTHOR_SEPARATOR)
        .map(str::to_string)
        .collect();

    Arc::new(Document {
        authors,
        journal: metadata.journal.clone(),
        title: metadata.title.clone(),
        url: metadata.url.clone(),
        publication_year: metadata.publication_year,
        pages: metadata.text_extracts.iter().map(assemble_page).collect(),
    })
}

fn assemble_page(metadata: &PageMetadata) -> Page {
    Page {
        label: metadata.label.clone(),
        url: metadata.url.clone(),
        snippets: metadata.text_preview.clone(),
    }
}
