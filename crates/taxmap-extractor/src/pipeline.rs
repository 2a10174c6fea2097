//! Relation extraction over a whole search response

use std::sync::Arc;

use tracing::{debug, info};

use crate::assembler::assemble_document;
use crate::strategy::{StrategyRegistry, SAME_PAGE_STRATEGY};
use crate::PairingStrategy;
use taxmap_core::{Document, PageRef, Result, SearchResponse, TaxonLocationRelation};

/// Drives document assembly and a pairing strategy across a corpus response
pub struct RelationPipeline {
    registry: StrategyRegistry,
}

impl RelationPipeline {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Assemble every record of the response, in response order
    pub fn documents(response: &SearchResponse) -> Vec<Arc<Document>> {
        response.data.iter().map(assemble_document).collect()
    }

    /// Extract relations with the default same-page strategy
    pub fn extract_default(&self, response: &SearchResponse) -> Result<Vec<TaxonLocationRelation>> {
        self.extract(response, SAME_PAGE_STRATEGY)
    }

    /// Extract relations for the whole response with the named strategy
    ///
    /// Relations are ordered by document, then page, then pairing order.
    /// An unknown strategy name fails before any document is processed.
    pub fn extract(
        &self,
        response: &SearchResponse,
        strategy_name: &str,
    ) -> Result<Vec<TaxonLocationRelation>> {
        let strategy = self.registry.get(strategy_name)?;
        let documents = Self::documents(response);

        info!(
            strategy = strategy_name,
            documents = documents.len(),
            "Extracting taxon-location relations"
        );

        let mut relations = Vec::new();
        for document in &documents {
            relations.extend(extract_from_document(document, strategy)?);
        }

        info!(relations = relations.len(), "Relation extraction finished");
        Ok(relations)
    }
}

impl Default for RelationPipeline {
    fn default() -> Self {
        Self::new(StrategyRegistry::with_defaults())
    }
}

/// Run a strategy on every page of one document
pub fn extract_from_document(
    document: &Arc<Document>,
    strategy: &dyn PairingStrategy,
) -> Result<Vec<TaxonLocationRelation>> {
    let mut relations = Vec::new();

    for page in PageRef::all(document) {
        relations.extend(strategy.process(&page)?);
    }

    debug!(
        title = document.title.as_deref().unwrap_or_default(),
        pages = document.pages.len(),
        relations = relations.len(),
        "Processed document"
    );

    Ok(relations)
}
