//! BIOfid URI normalization
//!
//! Older annotations reference taxa as `.../bio-ontologies/Abies#GBIF_123`.
//! The current ontology uses `.../bio-ontologies/Abies/gbif/123`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Base of canonical BIOfid ontology URIs
pub const BIOFID_ONTOLOGY_BASE: &str = "https://www.biofid.de/bio-ontologies";

static LEGACY_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"bio-ontologies/(?P<taxon>[A-Z][a-z]+)#GBIF_(?P<id>[0-9]+)$")
        .expect("legacy URI pattern is valid")
});

/// Rewrite the first legacy-style URI in `uris` to its canonical form.
///
/// `uris` may hold several whitespace-separated candidates; they are
/// checked in order. Without a legacy candidate the input is returned as is.
pub fn normalize_biofid_uri(uris: &str) -> Cow<'_, str> {
    for candidate in uris.split_whitespace() {
        if let Some(caps) = LEGACY_URI.captures(candidate) {
            return Cow::Owned(format!(
                "{}/{}/gbif/{}",
                BIOFID_ONTOLOGY_BASE, &caps["taxon"], &caps["id"]
            ));
        }
    }

    Cow::Borrowed(uris)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_legacy_uri_is_rewritten() {
        assert_eq!(
            normalize_biofid_uri("https://www.biofid.de/bio-ontologies/Abies#GBIF_123"),
            "https://www.biofid.de/bio-ontologies/Abies/gbif/123"
        );
    }

    #[test]
    fn test_canonical_uri_is_untouched() {
        let uri = "https://www.biofid.de/bio-ontologies/Abies/gbif/123";
        assert!(matches!(normalize_biofid_uri(uri), Cow::Borrowed(u) if u == uri));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_biofid_uri(""), "");
    }

    #[test]
    fn test_first_legacy_candidate_wins() {
        let uris = "https://www.biofid.de/bio-ontologies/Abies/gbif/1 \
                    https://www.biofid.de/bio-ontologies/Picea#GBIF_2 \
                    https://www.biofid.de/bio-ontologies/Pinus#GBIF_3";

        assert_eq!(
            normalize_biofid_uri(uris),
            "https://www.biofid.de/bio-ontologies/Picea/gbif/2"
        );
    }

    #[test]
    fn test_pattern_must_end_candidate() {
        let uri = "https://www.biofid.de/bio-ontologies/Abies#GBIF_123/extra";
        assert_eq!(normalize_biofid_uri(uri), uri);
    }

    #[test]
    fn test_lowercase_genus_is_not_legacy() {
        let uri = "https://www.biofid.de/bio-ontologies/abies#GBIF_123";
        assert_eq!(normalize_biofid_uri(uri), uri);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(input in ".{0,80}") {
            let once = normalize_biofid_uri(&input).into_owned();
            let twice = normalize_biofid_uri(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn legacy_uris_are_idempotent(
            taxon in "[A-Z][a-z]{1,12}",
            id in "[0-9]{1,9}",
            prefix in "[a-z ]{0,10}",
        ) {
            let input = format!("{prefix} https://www.biofid.de/bio-ontologies/{taxon}#GBIF_{id}");
            let once = normalize_biofid_uri(&input).into_owned();
            prop_assert_eq!(&once, &format!("{BIOFID_ONTOLOGY_BASE}/{taxon}/gbif/{id}"));
            prop_assert_eq!(normalize_biofid_uri(&once).into_owned(), once);
        }
    }
}
