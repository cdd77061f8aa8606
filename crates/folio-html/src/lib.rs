//! Folio HTML
//!
//! HTML5 parsing built on html5ever plus a serializer for the
//! `folio-dom` tree. The runtime uses both directions: fetched pages are
//! parsed into documents, and lazy slots capture their markup as strings
//! that are parsed back in when the slot mounts.

mod parser;
mod serialize;

pub use parser::HtmlParser;
pub use serialize::{inner_html, outer_html, to_html};

use folio_dom::{Document, DomTree, NodeId};

/// Parse an HTML string into a document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// Parse markup and append the resulting nodes to `parent`
pub fn append_fragment(tree: &mut DomTree, parent: NodeId, markup: &str) -> Result<usize, ParseError> {
    HtmlParser::new().append_fragment(tree, parent, markup)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOM construction failed: {0}")]
    Dom(#[from] folio_dom::DomError),
}
