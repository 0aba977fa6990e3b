//! XML feed document parsing and format detection.
//!
//! Feeds arrive with wildly inconsistent namespace usage (`media:thumbnail`
//! vs `thumbnail`, default Atom namespaces, publisher-specific prefixes), so
//! the tree built here keeps only the local part of every element and
//! attribute name. All downstream lookups are namespace-agnostic.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Errors that can occur while turning raw bytes into a feed document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The document ended with elements still open
    #[error("Unexpected end of document")]
    Truncated,
    /// No root element was found (empty or whitespace-only body)
    #[error("Document has no root element")]
    NoRoot,
    /// The root is neither an RSS nor an Atom document
    #[error("Unknown feed format: <{0}> is neither <rss> nor <feed>")]
    UnknownFormat(String),
}

/// Which syndication dialect a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

/// A parsed XML element with namespace prefixes stripped.
///
/// `name` and attribute keys hold local names only: `<media:thumbnail>`
/// becomes `thumbnail`. Text and CDATA sections are merged into `text`.
#[derive(Debug, Default)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Value of the attribute with the given local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content of this element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// First descendant with the given local name, depth-first in document
    /// order. Mirrors the `at()`-style lookup the extraction rules are
    /// written against.
    pub fn first(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.first(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given local name, in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }
}

/// Parse raw feed bytes into a namespace-stripped element tree.
///
/// # Errors
///
/// Returns [`ParseError::Xml`] for malformed markup, [`ParseError::Truncated`]
/// when the document ends inside an open element, and [`ParseError::NoRoot`]
/// for bodies with no element at all.
pub fn parse_document(bytes: &[u8]) -> Result<Element, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                stack.push(element_from_start(&start));
            }
            Event::Empty(start) => {
                let element = element_from_start(&start);
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut root, done);
                }
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text.unescape().unwrap_or_default());
                }
            }
            Event::CData(cdata) => {
                if let Some(open) = stack.last_mut() {
                    open.text
                        .push_str(&String::from_utf8_lossy(cdata.as_ref()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, PIs and doctypes carry no feed data
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ParseError::Truncated);
    }
    root.ok_or(ParseError::NoRoot)
}

/// Detect whether a parsed document is RSS or Atom.
///
/// Presence of an `rss` element selects RSS; `feed` selects Atom. Anything
/// else (RDF feeds, HTML error pages served with a 200, ...) is an
/// [`ParseError::UnknownFormat`] and the feed is skipped.
pub fn detect_kind(root: &Element) -> Result<FeedKind, ParseError> {
    if root.name == "rss" || root.first("rss").is_some() {
        Ok(FeedKind::Rss)
    } else if root.name == "feed" || root.first("feed").is_some() {
        Ok(FeedKind::Atom)
    } else {
        Err(ParseError::UnknownFormat(root.name.clone()))
    }
}

fn element_from_start(start: &quick_xml::events::BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.name().local_name().as_ref()).into_owned();
    let attrs = start
        .attributes()
        .filter_map(|attr| attr.ok())
        .filter_map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect();

    Element {
        name,
        attrs,
        text: String::new(),
        children: Vec::new(),
    }
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        // Only the first top-level element counts as the root
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
