//! taxmap Export - Coordinate join and tabular output
//!
//! - [`join`]: attach Wikidata coordinates to relations
//! - [`tsv`]: delimited output with a header row
//! - [`marker`]: HTML popups for map layers
//! - [`summary`]: per-document taxon annotation counts

pub mod join;
pub mod marker;
pub mod summary;
pub mod tsv;

pub use join::{distinct_location_uris, join_with_points, strip_query, CoordinateJoin};
pub use marker::{marker_text, markers, MapMarker};
pub use summary::{summarize_documents, DocumentSummary};
pub use tsv::{
    delimiter_byte, render_records, write_records, write_records_to_path, write_tables, Tabular,
    DEFAULT_DELIMITER,
};
