//! Fingerprint builder: turns a picked element into a structural + content descriptor.

use std::collections::BTreeMap;

use log::debug;

use crate::dom::ElementHandle;
use crate::error::Error;
use crate::types::{Fingerprint, PathNode, UniqueFeatures};

/// Attributes that identify an element well enough to search for verbatim,
/// in the priority order the locator tries them.
pub const SPECIAL_ATTRIBUTES: [&str; 4] = ["src", "href", "alt", "title"];

/// Attribute prefixes that are captured alongside [`SPECIAL_ATTRIBUTES`].
const SPECIAL_PREFIXES: [&str; 2] = ["data-", "aria-"];

/// Maximum characters of descendant text used as key text.
const KEY_TEXT_CHARS: usize = 50;

/// Build a fingerprint for `element`.
///
/// Walks from the element up to, but not including, the content root, recording
/// each level's position among all siblings and among same-tag siblings.
///
/// # Errors
///
/// Returns `Error::InvalidTarget` if `element` is the content root itself or
/// is not attached beneath it.
pub fn build_fingerprint<E: ElementHandle>(element: &E) -> Result<Fingerprint, Error> {
    if element.is_content_root() {
        return Err(Error::InvalidTarget {
            reason: "the content root cannot be edited".to_string(),
        });
    }

    let tree_path = collect_tree_path(element)?;
    let attributes: BTreeMap<String, String> = element.attributes().into_iter().collect();
    let direct_text = element.direct_text().trim().to_string();
    let text_content = element.text_content();

    let key_text = if direct_text.is_empty() {
        text_content.trim().chars().take(KEY_TEXT_CHARS).collect()
    } else {
        direct_text.clone()
    };

    let fingerprint = Fingerprint {
        class_name: attributes.get("class").cloned(),
        id: attributes.get("id").cloned(),
        key_text,
        tag_name: element.tag_name().to_ascii_lowercase(),
        tree_path,
        unique_features: UniqueFeatures {
            all_text: text_content.clone(),
            direct_text,
            inner_html: element.inner_html(),
            outer_html: element.outer_html(),
            special_attributes: collect_special_attributes(&attributes),
        },
        text_content,
    };

    debug!(
        "fingerprint <{}> depth={} key_text={:?}",
        fingerprint.tag_name,
        fingerprint.tree_path.len(),
        fingerprint.key_text
    );
    return Ok(fingerprint);
}

/// Whether an attribute name is in the special allow-list.
pub fn is_special_attribute(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    return SPECIAL_ATTRIBUTES.contains(&lowered.as_str())
        || SPECIAL_PREFIXES.iter().any(|prefix| return lowered.starts_with(prefix));
}

/// Walk ancestors up to the content root, returning the path root-first.
///
/// # Errors
///
/// Returns `Error::InvalidTarget` if the walk runs out of parents before
/// reaching the content root.
fn collect_tree_path<E: ElementHandle>(element: &E) -> Result<Vec<PathNode>, Error> {
    let mut path = Vec::new();
    let mut current = element.clone();

    while !current.is_content_root() {
        let Some(parent) = current.parent() else {
            return Err(Error::InvalidTarget {
                reason: format!("<{}> is not attached to the content root", element.tag_name()),
            });
        };
        path.push(describe_level(&current, &parent));
        current = parent;
    }

    path.reverse();
    return Ok(path);
}

/// Record one element's position among its parent's children.
fn describe_level<E: ElementHandle>(element: &E, parent: &E) -> PathNode {
    let tag_name = element.tag_name().to_ascii_lowercase();
    let siblings = parent.child_elements();
    let same_tag: Vec<&E> = siblings
        .iter()
        .filter(|sibling| return sibling.tag_name().eq_ignore_ascii_case(&tag_name))
        .collect();

    let attributes: BTreeMap<String, String> = element.attributes().into_iter().collect();

    return PathNode {
        child_index: siblings.iter().position(|sibling| return sibling == element).unwrap_or(0),
        class_name: attributes.get("class").cloned(),
        id: attributes.get("id").cloned(),
        tag_child_index: same_tag.iter().position(|sibling| return *sibling == element).unwrap_or(0),
        tag_name,
        total_children: siblings.len(),
        total_tag_children: same_tag.len(),
        attributes,
    };
}

/// Keep only allow-listed identity attributes.
fn collect_special_attributes(attributes: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    return attributes
        .iter()
        .filter(|(name, _)| return is_special_attribute(name))
        .map(|(name, value)| return (name.to_ascii_lowercase(), value.clone()))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tree;

    fn gallery() -> (Tree, crate::dom::NodeId) {
        let mut tree = Tree::new();
        let section = tree.append_element(tree.root(), "section", &[("id", "gallery")]);
        let heading = tree.append_element(section, "h2", &[]);
        tree.append_text(heading, "Photos");
        tree.append_element(section, "img", &[("class", "photo"), ("src", "a.jpg")]);
        let second = tree.append_element(
            section,
            "img",
            &[("class", "photo"), ("src", "b.jpg"), ("data-index", "2"), ("loading", "lazy")],
        );
        return (tree, second);
    }

    #[test]
    fn records_sibling_ordinals_per_level() {
        let (tree, second) = gallery();
        let fingerprint = build_fingerprint(&tree.element(second).unwrap()).unwrap();

        assert_eq!(fingerprint.tag_name, "img");
        assert_eq!(fingerprint.tree_path.len(), 2);

        let section = &fingerprint.tree_path[0];
        assert_eq!(section.tag_name, "section");
        assert_eq!(section.id.as_deref(), Some("gallery"));

        let target = fingerprint.target().unwrap();
        assert_eq!(target.child_index, 2);
        assert_eq!(target.tag_child_index, 1);
        assert_eq!(target.total_children, 3);
        assert_eq!(target.total_tag_children, 2);
        assert_eq!(target.attributes.get("loading").map(String::as_str), Some("lazy"));
    }

    #[test]
    fn captures_only_allow_listed_attributes() {
        let (tree, second) = gallery();
        let fingerprint = build_fingerprint(&tree.element(second).unwrap()).unwrap();
        let special = &fingerprint.unique_features.special_attributes;

        assert_eq!(special.get("src").map(String::as_str), Some("b.jpg"));
        assert_eq!(special.get("data-index").map(String::as_str), Some("2"));
        assert!(!special.contains_key("loading"));
        assert!(!special.contains_key("class"));
    }

    #[test]
    fn separates_direct_text_from_descendant_text() {
        let mut tree = Tree::new();
        let p = tree.append_element(tree.root(), "P", &[]);
        tree.append_text(p, "  Call ");
        let strong = tree.append_element(p, "strong", &[]);
        tree.append_text(strong, "now");

        let fingerprint = build_fingerprint(&tree.element(p).unwrap()).unwrap();
        assert_eq!(fingerprint.tag_name, "p");
        assert_eq!(fingerprint.unique_features.direct_text, "Call");
        assert_eq!(fingerprint.unique_features.all_text, "  Call now");
        assert_eq!(fingerprint.key_text, "Call");
        assert_eq!(fingerprint.unique_features.inner_html, "  Call <strong>now</strong>");
    }

    #[test]
    fn key_text_falls_back_to_descendant_text() {
        let mut tree = Tree::new();
        let div = tree.append_element(tree.root(), "div", &[]);
        let span = tree.append_element(div, "span", &[]);
        tree.append_text(span, "nested only");

        let fingerprint = build_fingerprint(&tree.element(div).unwrap()).unwrap();
        assert_eq!(fingerprint.unique_features.direct_text, "");
        assert_eq!(fingerprint.key_text, "nested only");
    }

    #[test]
    fn rejects_content_root() {
        let tree = Tree::new();
        let err = build_fingerprint(&tree.element(tree.root()).unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn rejects_detached_element() {
        let mut tree = Tree::new();
        let text = tree.append_text(tree.root(), "text");
        let orphan = tree.append_element(text, "span", &[]);
        let err = build_fingerprint(&tree.element(orphan).unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }
}
