//! Navigation link binding
//!
//! Every `a[href]` in the document is bound once per page. A click is only
//! turned into an animated transition when the browser would otherwise
//! perform a plain same-tab, same-origin page load.

use std::collections::HashMap;

use folio_dom::{Document, NodeId, SimpleSelector};
use url::Url;

/// Keyboard modifiers held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

/// A click delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkClick {
    pub target: NodeId,
    /// 0 = primary
    pub button: u16,
    pub modifiers: Modifiers,
}

impl LinkClick {
    /// Plain primary-button click
    pub fn primary(target: NodeId) -> Self {
        Self {
            target,
            button: 0,
            modifiers: Modifiers::default(),
        }
    }
}

/// Why a click was left to the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    Unbound,
    NotPrimaryButton,
    Modified,
    NewTab,
    Download,
    BadHref(String),
    CrossOrigin,
    SameDocumentHash,
}

/// Anchors of the current document
#[derive(Debug, Default)]
pub struct LinkBindings {
    links: HashMap<NodeId, String>,
}

impl LinkBindings {
    /// Bind every `a[href]`
    pub fn bind(document: &Document) -> Self {
        let anchors = document.query_all(document.tree().root(), &SimpleSelector::Tag("a".to_string()));
        let links: HashMap<NodeId, String> = anchors
            .into_iter()
            .filter_map(|a| Some((a, document.tree().get_attr(a, "href")?.to_string())))
            .collect();
        tracing::debug!("Bound {} navigation links", links.len());
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.links.contains_key(&node)
    }

    /// Destination of a click that should become a transition
    pub fn resolve(&self, document: &Document, click: &LinkClick, current: &Url) -> Result<Url, Ineligible> {
        let href = self.links.get(&click.target).ok_or(Ineligible::Unbound)?;
        if click.button != 0 {
            return Err(Ineligible::NotPrimaryButton);
        }
        if click.modifiers.any() {
            return Err(Ineligible::Modified);
        }

        let tree = document.tree();
        if tree.get_attr(click.target, "target").is_some_and(|t| t.eq_ignore_ascii_case("_blank")) {
            return Err(Ineligible::NewTab);
        }
        if tree.get_attr(click.target, "download").is_some() {
            return Err(Ineligible::Download);
        }

        let destination = current.join(href.trim()).map_err(|e| Ineligible::BadHref(e.to_string()))?;
        if destination.origin() != current.origin() {
            return Err(Ineligible::CrossOrigin);
        }
        if destination.fragment().is_some() && without_fragment(&destination) == without_fragment(current) {
            return Err(Ineligible::SameDocumentHash);
        }
        Ok(destination)
    }
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
