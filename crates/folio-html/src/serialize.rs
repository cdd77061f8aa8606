//! HTML serialisation
//!
//! Writes `folio-dom` trees back to markup. Output follows the HTML
//! fragment serialisation rules closely enough for a parse → serialise →
//! parse round trip to be stable.

use folio_dom::{Document, DomTree, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe", "xmp"];

/// Serialise a whole document
pub fn to_html(doc: &Document) -> String {
    inner_html(doc.tree(), doc.tree().root())
}

/// Serialise the children of a node
pub fn inner_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    let raw = tree.tag_name(id).is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
    for child in tree.child_ids(id) {
        write_node(tree, child, raw, &mut out);
    }
    out
}

/// Serialise a node including its own tag
pub fn outer_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, false, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, raw_parent: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for child in tree.child_ids(id) {
                write_node(tree, child, false, out);
            }
        }
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => {
            if raw_parent {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(elem) => {
            out.push('<');
            out.push_str(&elem.tag);
            for attr in &elem.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attr(&attr.value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str());
            for child in tree.child_ids(id) {
                write_node(tree, child, raw, out);
            }

            out.push_str("</");
            out.push_str(&elem.tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
