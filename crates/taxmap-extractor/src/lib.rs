//! taxmap Extractor - Taxon/location relation extraction
//!
//! Turns annotated BIOfid search results into taxon-location relations:
//! documents are assembled from the raw records, the `<em>` annotations of
//! every page are classified into taxon and location mentions, and a
//! pairing strategy combines them into relations.

use serde::{Deserialize, Serialize};

use taxmap_core::{PageRef, Result, TaxonLocationRelation};

pub mod assembler;
pub mod mention;
pub mod normalizer;
pub mod pipeline;
pub mod strategy;

pub use assembler::assemble_document;
pub use mention::{AnnotatedTextExtractor, Mention, MentionKind};
pub use normalizer::normalize_biofid_uri;
pub use pipeline::RelationPipeline;
pub use strategy::{SamePageCooccurrence, StrategyRegistry, SAME_PAGE_STRATEGY, SAME_PAGE_TAG};

/// Classified mentions of one page, each list in text order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMentions {
    pub taxa: Vec<Mention>,
    pub locations: Vec<Mention>,
}

/// Trait for page mention extractors
pub trait MentionExtractor: Send + Sync {
    fn extract(&self, page: &PageRef) -> Result<PageMentions>;
}

/// Trait for pairing strategies
pub trait PairingStrategy: Send + Sync {
    /// Registry name of the strategy
    fn name(&self) -> &'static str;

    /// Candidate relations for one page; every relation's source is `page`
    fn process(&self, page: &PageRef) -> Result<Vec<TaxonLocationRelation>>;
}
