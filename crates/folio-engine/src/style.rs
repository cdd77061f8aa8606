//! Inline style declarations
//!
//! The scheduler only ever touches a couple of properties (`min-height`,
//! `transition-duration`); everything else in the `style` attribute is kept
//! as written.

use folio_dom::{DomResult, DomTree, NodeId};

/// Set (`Some`) or remove (`None`) one property in the `style` attribute
pub(crate) fn set_style_property(
    tree: &mut DomTree,
    node: NodeId,
    property: &str,
    value: Option<&str>,
) -> DomResult<()> {
    let current = tree.get_attr(node, "style").unwrap_or("");
    let mut declarations: Vec<(String, String)> = current
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect();

    match (declarations.iter().position(|(n, _)| n.eq_ignore_ascii_case(property)), value) {
        (Some(i), Some(value)) => declarations[i].1 = value.to_string(),
        (Some(i), None) => {
            declarations.remove(i);
        }
        (None, Some(value)) => declarations.push((property.to_string(), value.to_string())),
        (None, None) => return Ok(()),
    }

    if declarations.is_empty() {
        tree.remove_attr(node, "style")
    } else {
        let joined = declarations
            .iter()
            .map(|(n, v)| format!("{n}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        tree.set_attr(node, "style", &joined)
    }
}

/// Read one property from the `style` attribute
pub(crate) fn style_property<'a>(tree: &'a DomTree, node: NodeId, property: &str) -> Option<&'a str> {
    tree.get_attr(node, "style")?
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attr(div, "style", "color: red").unwrap();

        set_style_property(&mut tree, div, "min-height", Some("320px")).unwrap();
        assert_eq!(tree.get_attr(div, "style"), Some("color: red; min-height: 320px"));
        assert_eq!(style_property(&tree, div, "min-height"), Some("320px"));

        set_style_property(&mut tree, div, "min-height", Some("100px")).unwrap();
        assert_eq!(tree.get_attr(div, "style"), Some("color: red; min-height: 100px"));

        set_style_property(&mut tree, div, "color", None).unwrap();
        set_style_property(&mut tree, div, "min-height", None).unwrap();
        assert_eq!(tree.get_attr(div, "style"), None);
    }

    #[test]
    fn test_unchanged_value_leaves_generation() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        set_style_property(&mut tree, div, "transition-duration", Some("80ms")).unwrap();
        let generation = tree.generation();

        set_style_property(&mut tree, div, "transition-duration", Some("80ms")).unwrap();
        set_style_property(&mut tree, div, "opacity", None).unwrap();
        assert_eq!(tree.generation(), generation);
    }
}
