//! Entity mention extraction from annotated page text
//!
//! BIOfid text previews mark recognized entities inline:
//!
//! ```text
//! <em class="taxon" biofid-uri="..." wikidata="...">Abies alba</em>
//! grows in <em class="location_place" wikidata="...">Berlin</em>
//! ```
//!
//! All snippets of a page are parsed together and every `<em>` element
//! becomes a [`Mention`], classified by its `class` tokens.

use std::borrow::Cow;

use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalizer::normalize_biofid_uri;
use crate::{MentionExtractor, PageMentions};
use taxmap_core::{Location, PageRef, Result, Taxon, TaxmapError};

/// Class tokens marking a taxon annotation
pub const TAXON_CLASSES: [&str; 3] = ["taxon", "plant_flora", "animal_flora"];

/// Class token marking a place annotation
pub const LOCATION_CLASS: &str = "location_place";

const MENTION_TAG: &[u8] = b"em";
const ROOT_TAG: &str = "root";

/// HTML elements written without an end tag
const VOID_ELEMENTS: [&str; 4] = ["br", "hr", "img", "wbr"];

const ATTR_CLASS: &[u8] = b"class";
const ATTR_WIKIDATA: &[u8] = b"wikidata";
const ATTR_BIOFID: &[u8] = b"biofid-uri";
const ATTR_BIOFID_FALLBACK: &[u8] = b"biofid-uri-0";

// ============================================================================
// Classification
// ============================================================================

/// Kind of an annotated mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Taxon,
    Location,
    Unclassified,
}

impl MentionKind {
    /// Classify a set of class tokens; taxon tokens take precedence
    pub fn classify<S: AsRef<str>>(classes: &[S]) -> Self {
        if is_taxon(classes) {
            Self::Taxon
        } else if is_location(classes) {
            Self::Location
        } else {
            Self::Unclassified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taxon => "taxon",
            Self::Location => "location",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for MentionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True if any token is one of [`TAXON_CLASSES`]
pub fn is_taxon<S: AsRef<str>>(classes: &[S]) -> bool {
    classes
        .iter()
        .any(|c| TAXON_CLASSES.contains(&c.as_ref()))
}

/// True if any token is [`LOCATION_CLASS`]
pub fn is_location<S: AsRef<str>>(classes: &[S]) -> bool {
    classes.iter().any(|c| c.as_ref() == LOCATION_CLASS)
}

// ============================================================================
// Mentions
// ============================================================================

/// An annotated span of page text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Text content of the span
    pub label: String,
    /// Tokens of the `class` attribute
    pub classes: Vec<String>,
    pub wikidata_uri: Option<String>,
    /// Normalized BIOfid URI
    pub biofid_uri: Option<String>,
}

impl Mention {
    pub fn kind(&self) -> MentionKind {
        MentionKind::classify(&self.classes)
    }

    pub fn is_taxon(&self) -> bool {
        is_taxon(&self.classes)
    }

    pub fn is_location(&self) -> bool {
        is_location(&self.classes)
    }

    pub fn to_taxon(&self) -> Taxon {
        Taxon {
            label: self.label.clone(),
            biofid_uri: self.biofid_uri.clone(),
            wikidata_uri: self.wikidata_uri.clone(),
        }
    }

    pub fn to_location(&self) -> Location {
        Location {
            label: self.label.clone(),
            wikidata_uri: self.wikidata_uri.clone(),
        }
    }

    fn from_start(element: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let mut mention = Mention::default();
        let mut biofid = None;
        let mut biofid_fallback = None;

        for attr in element.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = attr
                .unescape_value_with(resolve_entity)
                .map_err(|e| e.to_string())?;

            match attr.key.as_ref() {
                ATTR_CLASS => {
                    mention.classes = value.split_whitespace().map(str::to_string).collect();
                }
                ATTR_WIKIDATA => mention.wikidata_uri = Some(value.into_owned()),
                ATTR_BIOFID => biofid = Some(value.into_owned()),
                ATTR_BIOFID_FALLBACK => biofid_fallback = Some(value.into_owned()),
                _ => {}
            }
        }

        // An empty primary attribute counts as missing
        mention.biofid_uri = biofid
            .filter(|uri| !uri.is_empty())
            .or(biofid_fallback)
            .map(|uri| normalize_biofid_uri(&uri).into_owned());

        Ok(mention)
    }
}

// ============================================================================
// Markup parsing
// ============================================================================

/// Join snippets the way they appear on the page and wrap them in one root
pub fn merge_snippets<S: AsRef<str>>(snippets: &[S]) -> String {
    let joined: Vec<&str> = snippets.iter().map(AsRef::as_ref).collect();
    format!("<{ROOT_TAG}>{}</{ROOT_TAG}>", joined.join(" "))
}

/// XML entities first, then the HTML5 named entities
fn resolve_entity(entity: &str) -> Option<&'static str> {
    resolve_predefined_entity(entity).or_else(|| resolve_html5_entity(entity))
}

/// True for HTML elements that never have content or an end tag
fn is_void_element(name: &[u8]) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.as_bytes().eq_ignore_ascii_case(name))
}

/// An element that is open while parsing
struct OpenElement {
    name: Vec<u8>,
    /// Index into the mention list when the element is a mention
    mention: Option<usize>,
}

/// Parse marked-up text and return every `<em>` span in document order
///
/// The markup is read the way previews are written: HTML named entities
/// are resolved and void elements such as `<br>` need no end tag. Any
/// other unbalanced element is an error.
///
/// Nested spans are reported too; an outer span's label includes the text
/// of the spans inside it.
pub fn parse_mentions(markup: &str) -> std::result::Result<Vec<Mention>, String> {
    let mut reader = Reader::from_str(markup);
    // End tags are matched against `open` below
    reader.config_mut().check_end_names = false;

    let mut mentions: Vec<Mention> = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) => {
                let name = e.name();
                if is_void_element(name.as_ref()) {
                    continue;
                }

                let mention = if name.as_ref() == MENTION_TAG {
                    mentions.push(Mention::from_start(e)?);
                    Some(mentions.len() - 1)
                } else {
                    None
                };
                open.push(OpenElement {
                    name: name.as_ref().to_vec(),
                    mention,
                });
            }
            Event::Empty(ref e) => {
                if e.name().as_ref() == MENTION_TAG {
                    mentions.push(Mention::from_start(e)?);
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape_with(resolve_entity).map_err(|e| e.to_string())?;
                append_text(&mut mentions, &open, &text);
            }
            Event::CData(ref c) => {
                let text = String::from_utf8_lossy(c.as_ref());
                append_text(&mut mentions, &open, &text);
            }
            Event::End(ref e) => {
                let name = e.name();
                if is_void_element(name.as_ref()) {
                    continue;
                }

                match open.pop() {
                    Some(element) if element.name == name.as_ref() => {}
                    Some(element) => {
                        return Err(format!(
                            "expected `</{}>`, but `</{}>` was found",
                            String::from_utf8_lossy(&element.name),
                            String::from_utf8_lossy(name.as_ref())
                        ));
                    }
                    None => {
                        return Err(format!(
                            "unexpected `</{}>`",
                            String::from_utf8_lossy(name.as_ref())
                        ));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(format!(
            "{} unclosed element(s) at end of text, innermost `<{}>`",
            open.len(),
            String::from_utf8_lossy(&element.name)
        ));
    }

    Ok(mentions)
}

fn append_text(mentions: &mut [Mention], open: &[OpenElement], text: &Cow<'_, str>) {
    for index in open.iter().filter_map(|element| element.mention) {
        mentions[index].label.push_str(text);
    }
}

// ============================================================================
// Page-level extractor
// ============================================================================

/// Extracts taxon and location mentions from `<em>`-annotated page text
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotatedTextExtractor;

impl AnnotatedTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split mentions into taxon and location lists, dropping the rest
    pub fn split(mentions: Vec<Mention>) -> PageMentions {
        let taxa: Vec<Mention> = mentions.iter().filter(|m| m.is_taxon()).cloned().collect();
        let locations: Vec<Mention> = mentions.into_iter().filter(|m| m.is_location()).collect();

        PageMentions { taxa, locations }
    }
}

impl MentionExtractor for AnnotatedTextExtractor {
    fn extract(&self, page: &PageRef) -> Result<PageMentions> {
        let markup = merge_snippets(&page.page().snippets);

        let mentions = parse_mentions(&markup).map_err(|message| TaxmapError::Markup {
            page: page.describe(),
            message,
        })?;

        let split = Self::split(mentions);
        debug!(
            page = %page.describe(),
            taxa = split.taxa.len(),
            locations = split.locations.len(),
            "Extracted page mentions"
        );

        Ok(split)
    }
}

// ============================================================================
// Tests
// ============================================================================
