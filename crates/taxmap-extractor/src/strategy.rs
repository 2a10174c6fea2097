//! Pairing strategies
//!
//! A pairing strategy turns the mentions found on a page into candidate
//! taxon-location relations. Strategies are looked up by name in a
//! [`StrategyRegistry`].

use std::collections::BTreeMap;

use crate::mention::{AnnotatedTextExtractor, Mention};
use crate::{MentionExtractor, PairingStrategy};
use taxmap_core::{PageRef, Result, TaxmapError, TaxonLocationRelation};

/// Registry key of [`SamePageCooccurrence`]
pub const SAME_PAGE_STRATEGY: &str = "page";

/// Tag attached to relations produced by [`SamePageCooccurrence`]
pub const SAME_PAGE_TAG: &str = "SamePageOccurrence";

// ============================================================================
// Same-page co-occurrence
// ============================================================================

/// Pairs every taxon on a page with every location on the same page
pub struct SamePageCooccurrence {
    extractor: Box<dyn MentionExtractor>,
}

impl SamePageCooccurrence {
    pub fn new() -> Self {
        Self::with_extractor(Box::new(AnnotatedTextExtractor::new()))
    }

    pub fn with_extractor(extractor: Box<dyn MentionExtractor>) -> Self {
        Self { extractor }
    }
}

impl Default for SamePageCooccurrence {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingStrategy for SamePageCooccurrence {
    fn name(&self) -> &'static str {
        SAME_PAGE_STRATEGY
    }

    fn process(&self, page: &PageRef) -> Result<Vec<TaxonLocationRelation>> {
        let mentions = self.extractor.extract(page)?;
        Ok(cross_product(&mentions.taxa, &mentions.locations, page, SAME_PAGE_TAG))
    }
}

/// One relation per (taxon, location) pair, taxon-major order
pub fn cross_product(
    taxa: &[Mention],
    locations: &[Mention],
    page: &PageRef,
    tag: &str,
) -> Vec<TaxonLocationRelation> {
    if taxa.is_empty() || locations.is_empty() {
        return Vec::new();
    }

    let mut relations = Vec::with_capacity(taxa.len() * locations.len());
    for taxon in taxa {
        for location in locations {
            relations.push(TaxonLocationRelation {
                taxon: taxon.to_taxon(),
                location: location.to_location(),
                source: page.clone(),
                strategy: tag.to_string(),
            });
        }
    }

    relations
}

// ============================================================================
// Registry
// ============================================================================

/// Pairing strategies by name
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Box<dyn PairingStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Registry with the built-in strategies
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SamePageCooccurrence::new()));
        registry
    }

    /// Add a strategy under its own name, replacing any previous one
    pub fn register(&mut self, strategy: Box<dyn PairingStrategy>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    /// Look up a strategy by name
    pub fn get(&self, name: &str) -> Result<&dyn PairingStrategy> {
        self.strategies
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| TaxmapError::UnknownStrategy {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taxmap_core::{Document, Page};

    fn page_with(snippets: &[&str]) -> PageRef {
        let doc = Arc::new(Document {
            authors: vec![String::new()],
            journal: None,
            title: Some("Flora von Frankfurt".to_string()),
            url: None,
            publication_year: None,
            pages: vec![Page {
                label: Some("1".to_string()),
                url: Some("https://example.org/1".to_string()),
                snippets: snippets.iter().map(|s| s.to_string()).collect(),
            }],
        });
        PageRef::all(&doc).remove(0)
    }

    fn taxon(label: &str) -> String {
        format!(r#"<em class="taxon" wikidata="{label}-wd">{label}</em>"#)
    }

    fn place(label: &str) -> String {
        format!(r#"<em class="location_place" wikidata="{label}-wd">{label}</em>"#)
    }

    #[test]
    fn test_cross_product_size_and_order() {
        let text = format!(
            "{} {} near {} {} and {}",
            taxon("Abies"),
            taxon("Picea"),
            place("Berlin"),
            place("Potsdam"),
            place("Leipzig")
        );
        let page = page_with(&[&text]);

        let relations = SamePageCooccurrence::new().process(&page).unwrap();

        assert_eq!(relations.len(), 6);
        let pairs: Vec<(&str, &str)> = relations
            .iter()
            .map(|r| (r.taxon.label.as_str(), r.location.label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Abies", "Berlin"),
                ("Abies", "Potsdam"),
                ("Abies", "Leipzig"),
                ("Picea", "Berlin"),
                ("Picea", "Potsdam"),
                ("Picea", "Leipzig"),
            ]
        );
        assert!(relations.iter().all(|r| r.source == page));
        assert!(relations.iter().all(|r| r.strategy == SAME_PAGE_TAG));
    }

    #[test]
    fn test_no_locations_no_relations() {
        let page = page_with(&[&taxon("Abies")]);
        assert!(SamePageCooccurrence::new().process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_no_taxa_no_relations() {
        let page = page_with(&[&place("Berlin")]);
        assert!(SamePageCooccurrence::new().process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_empty_page() {
        let page = page_with(&[]);
        assert!(SamePageCooccurrence::new().process(&page).unwrap().is_empty());
    }

    #[test]
    fn test_mentions_span_snippets() {
        let t = taxon("Abies");
        let p = place("Berlin");
        let page = page_with(&[&t, &p]);

        let relations = SamePageCooccurrence::new().process(&page).unwrap();

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].taxon.wikidata_uri.as_deref(), Some("Abies-wd"));
        assert_eq!(relations[0].location.wikidata_uri.as_deref(), Some("Berlin-wd"));
    }

    #[test]
    fn test_malformed_page_fails() {
        let page = page_with(&["<em class=\"taxon\">Abies"]);
        assert!(matches!(
            SamePageCooccurrence::new().process(&page),
            Err(TaxmapError::Markup { .. })
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = StrategyRegistry::with_defaults();

        assert_eq!(registry.names(), vec!["page".to_string()]);
        assert_eq!(registry.get("page").unwrap().name(), "page");

        match registry.get("window") {
            Err(TaxmapError::UnknownStrategy { name, available }) => {
                assert_eq!(name, "window");
                assert_eq!(available, vec!["page".to_string()]);
            }
            _ => panic!("expected unknown strategy error"),
        }
    }

    #[test]
    fn test_registry_accepts_new_strategies() {
        struct Nothing;

        impl PairingStrategy for Nothing {
            fn name(&self) -> &'static str {
                "nothing"
            }

            fn process(&self, _page: &PageRef) -> Result<Vec<TaxonLocationRelation>> {
                Ok(Vec::new())
            }
        }

        let mut registry = StrategyRegistry::with_defaults();
        registry.register(Box::new(Nothing));

        assert_eq!(registry.names(), vec!["nothing".to_string(), "page".to_string()]);
        assert!(registry.get("nothing").is_ok());
    }
}
