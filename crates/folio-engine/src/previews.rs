//! Project previews
//!
//! Project cards marked `.project-preview` get a live iframe of the project
//! (a direct URL, or a Figma file through Figma's embed endpoint).

use folio_dom::{Document, DomError, NodeId, SimpleSelector};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub const PREVIEW_CLASS: &str = "project-preview";
const LABEL_CLASS: &str = "preview-label";
const ACTIONS_CLASS: &str = "preview-actions";
const FIGMA_EMBED: &str = "https://www.figma.com/embed?embed_host=share&url=";
const DEFAULT_TITLE: &str = "Live preview";

/// Characters a URI component escapes; `-_.!~*'()` pass through
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Iframe source for a preview element, if it has one
pub fn preview_source(document: &Document, preview: NodeId) -> Option<String> {
    let tree = document.tree();
    if tree.dataset(preview, "type") == Some("figma") {
        let raw = tree.dataset(preview, "figmaUrl").unwrap_or("");
        return Some(format!("{FIGMA_EMBED}{}", utf8_percent_encode(raw, COMPONENT)));
    }

    tree.dataset(preview, "previewSrc")
        .filter(|src| !src.is_empty())
        .map(str::to_string)
}

/// Inject iframes into every preview not yet loaded; returns how many
pub fn load_previews(document: &mut Document) -> Result<usize, DomError> {
    let mut loaded = 0;

    for preview in document.elements_by_class(PREVIEW_CLASS) {
        if document.tree().dataset(preview, "loaded") == Some("true") {
            continue;
        }
        let Some(src) = preview_source(document, preview) else {
            continue;
        };

        let title = document
            .query_first(preview, &SimpleSelector::Class(LABEL_CLASS.to_string()))
            .map(|label| document.tree().text_content(label).trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let actions = document.query_first(preview, &SimpleSelector::Class(ACTIONS_CLASS.to_string()));

        let tree = document.tree_mut();
        let iframe = tree.create_element("iframe");
        tree.set_attr(iframe, "src", &src)?;
        tree.set_attr(iframe, "loading", "eager")?;
        tree.set_attr(iframe, "allowfullscreen", "")?;
        tree.set_attr(iframe, "referrerpolicy", "no-referrer-when-downgrade")?;
        tree.set_attr(iframe, "title", &title)?;
        tree.append_child(preview, iframe)?;

        // Keep the action row below the frame
        if let Some(actions) = actions {
            tree.append_child(preview, actions)?;
        }

        tree.set_dataset(preview, "loaded", "true")?;
        loaded += 1;
    }

    if loaded > 0 {
        tracing::debug!("Loaded {} project previews", loaded);
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(markup: &str) -> Document {
        folio_html::parse(markup).unwrap()
    }

    #[test]
    fn test_direct_source() {
        let mut doc = doc(r#"<div class="project-preview" data-preview-src="https://demo.test/">
            <span class="preview-label"> Demo app </span>
            <div class="preview-actions"><a href="/work/demo">Case study</a></div>
        </div>"#);

        assert_eq!(load_previews(&mut doc).unwrap(), 1);

        let preview = doc.elements_by_class(PREVIEW_CLASS)[0];
        let iframe = doc.query_first(preview, &SimpleSelector::Tag("iframe".into())).unwrap();
        let tree = doc.tree();
        assert_eq!(tree.get_attr(iframe, "src"), Some("https://demo.test/"));
        assert_eq!(tree.get_attr(iframe, "title"), Some("Demo app"));
        assert_eq!(tree.get_attr(iframe, "loading"), Some("eager"));
        assert_eq!(tree.get_attr(iframe, "referrerpolicy"), Some("no-referrer-when-downgrade"));
        assert_eq!(tree.dataset(preview, "loaded"), Some("true"));

        // Actions moved after the iframe
        let elements: Vec<&str> = tree
            .child_ids(preview)
            .filter_map(|c| tree.tag_name(c))
            .collect();
        assert_eq!(elements, vec!["span", "iframe", "div"]);
    }

    #[test]
    fn test_figma_source_is_encoded() {
        let doc = doc(r#"<div class="project-preview" data-type="figma"
            data-figma-url="https://www.figma.com/file/abc/Site?node-id=1:2"></div>"#);
        let preview = doc.elements_by_class(PREVIEW_CLASS)[0];
        assert_eq!(
            preview_source(&doc, preview).as_deref(),
            Some("https://www.figma.com/embed?embed_host=share&url=https%3A%2F%2Fwww.figma.com%2Ffile%2Fabc%2FSite%3Fnode-id%3D1%3A2")
        );
    }

    #[test]
    fn test_figma_encoding_keeps_component_marks() {
        let doc = doc(r#"<div class="project-preview" data-type="figma"
            data-figma-url="https://f.test/My File~v2 (draft)!*'"></div>"#);
        let preview = doc.elements_by_class(PREVIEW_CLASS)[0];
        assert_eq!(
            preview_source(&doc, preview).as_deref(),
            Some("https://www.figma.com/embed?embed_host=share&url=https%3A%2F%2Ff.test%2FMy%20File~v2%20(draft)!*'")
        );
    }

    #[test]
    fn test_skips_loaded_and_sourceless() {
        let mut doc = doc(r#"
            <div class="project-preview"></div>
            <div class="project-preview" data-loaded="true" data-preview-src="https://a.test/"></div>
            <div class="project-preview" data-preview-src="https://b.test/"></div>"#);

        assert_eq!(load_previews(&mut doc).unwrap(), 1);
        // Second run is a no-op
        let generation = doc.tree().generation();
        assert_eq!(load_previews(&mut doc).unwrap(), 0);
        assert_eq!(doc.tree().generation(), generation);

        let previews = doc.elements_by_class(PREVIEW_CLASS);
        let iframe = doc.query_first(previews[2], &SimpleSelector::Tag("iframe".into())).unwrap();
        assert_eq!(doc.tree().get_attr(iframe, "title"), Some("Live preview"));
    }
}
