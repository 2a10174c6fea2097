//! Delimited table writer
//!
//! Rows are serialized with `csv`; the header row comes from [`Tabular::COLUMNS`]
//! so that an empty table still carries its header.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use taxmap_core::{OutputRecord, Result, TaxmapError};

/// Default column delimiter
pub const DEFAULT_DELIMITER: char = '\t';

/// A row type with a fixed column order
pub trait Tabular: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl Tabular for OutputRecord {
    const COLUMNS: &'static [&'static str] = &[
        "taxon_label",
        "taxon_biofid_uri",
        "taxon_wikidata_uri",
        "location_label",
        "location_wikidata_uri",
        "page_url",
        "document_title",
        "document_publication_year",
        "document_url",
        "longitude",
        "latitude",
    ];
}

fn export_error(e: impl std::fmt::Display) -> TaxmapError {
    TaxmapError::Export(e.to_string())
}

/// The delimiter as a byte; only ASCII delimiters are supported
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(TaxmapError::Export(format!(
            "delimiter must be a single ASCII character, got {delimiter:?}"
        )))
    }
}

/// Write a header row followed by one row per record
pub fn write_records<W: Write, T: Tabular>(writer: W, rows: &[T], delimiter: char) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(T::COLUMNS).map_err(export_error)?;
    for row in rows {
        wtr.serialize(row).map_err(export_error)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Render a whole table in memory
pub fn render_records<T: Tabular>(rows: &[T], delimiter: char) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_records(&mut buf, rows, delimiter)?;
    Ok(buf)
}

/// Write a table to a file, replacing any existing content
///
/// The table is rendered before the file is touched, so a failure leaves
/// an existing file unchanged.
pub fn write_records_to_path<T: Tabular>(
    path: impl AsRef<Path>,
    rows: &[T],
    delimiter: char,
) -> Result<()> {
    let path = path.as_ref();
    let table = render_records(rows, delimiter)?;
    std::fs::write(path, table)?;

    info!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Write several rendered tables so that either all of them land or none
///
/// Each table goes to a temporary file next to its target first; targets
/// are replaced only once every temporary file is written.
pub fn write_tables<P: AsRef<Path>>(tables: &[(P, Vec<u8>)]) -> Result<()> {
    let mut staged = Vec::with_capacity(tables.len());
    for (path, table) in tables {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(table)?;
        file.flush()?;
        staged.push((file, path));
    }

    for (file, path) in staged {
        file.persist(path).map_err(|e| TaxmapError::Io(e.error))?;
        info!(path = %path.display(), "Wrote table");
    }

    Ok(())
}
