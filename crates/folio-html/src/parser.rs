//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to the folio arena tree.

use folio_dom::{Document, DomTree, ElementData, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseError;

/// HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, ParseError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, ParseError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = Self::read(html)?;

        let mut document = Document::empty(url);
        let root = document.tree().root();
        Self::convert_node(&dom.document, document.tree_mut(), root)?;
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse a markup fragment in body context and append it to `parent`.
    ///
    /// Returns the number of top-level nodes appended.
    pub fn append_fragment(&self, tree: &mut DomTree, parent: NodeId, markup: &str) -> Result<usize, ParseError> {
        // An explicit <body> keeps head-only tags (style, meta) where they were written
        let wrapped = format!("<!DOCTYPE html><body>{markup}");
        let dom = Self::read(&wrapped)?;

        let Some(body) = Self::find_body(&dom.document) else {
            return Ok(0);
        };
        let children: Vec<Handle> = body.children.borrow().iter().cloned().collect();
        for child in &children {
            Self::convert_node(child, tree, parent)?;
        }
        Ok(children.len())
    }

    fn read(html: &str) -> Result<RcDom, ParseError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;
        Ok(dom)
    }

    fn find_body(handle: &Handle) -> Option<Handle> {
        for child in handle.children.borrow().iter() {
            if let RcNodeData::Element { name, .. } = &child.data {
                if &*name.local == "body" {
                    return Some(child.clone());
                }
            }
            if let Some(found) = Self::find_body(child) {
                return Some(found);
            }
        }
        None
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), ParseError> {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    Self::convert_node(child, tree, parent)?;
                }
            }
            RcNodeData::Doctype { name, public_id, system_id } => {
                let id = tree.create_doctype(name, public_id, system_id);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if parent == tree.root() && text.trim().is_empty() {
                    return Ok(());
                }
                let id = tree.create_text(&text);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let mut elem = ElementData::new(&name.local);
                for attr in attrs.borrow().iter() {
                    elem.set_attr(&attr.name.local, &attr.value);
                }

                let id = tree.create_element_with(elem);
                tree.append_child(parent, id)?;

                for child in handle.children.borrow().iter() {
                    Self::convert_node(child, tree, id)?;
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Not meaningful in HTML documents
            }
        }
        Ok(())
    }
}
