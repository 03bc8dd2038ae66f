//! Core domain types: element fingerprints, match results, and edit intents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative certainty attached to a located line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// A single unambiguous signal (sole candidate, unique id or attribute).
    Exact,
    /// A unique class hit, or an attribute hit narrowed by position.
    High,
    /// Positional fallback into the candidate list; the caller should warn.
    Low,
    /// A class hit narrowed by position, or a direct-text hit.
    Medium,
}

impl Confidence {
    /// Numeric rank where higher means more certain. `Exact` is 3, `Low` is 0.
    pub const fn rank(self) -> u8 {
        return match self {
            Confidence::Exact => 3,
            Confidence::High => 2,
            Confidence::Medium => 1,
            Confidence::Low => 0,
        };
    }

    /// Whether the caller should surface a warning before trusting the match.
    pub const fn is_weak(self) -> bool {
        return matches!(self, Confidence::Low);
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Exact => "exact",
            Confidence::High => "high",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
        };
        return f.write_str(label);
    }
}

/// One ancestor level of a picked element, from the content root downwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    /// Every attribute present on the element at this level.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Ordinal among all element siblings.
    pub child_index: usize,
    /// Value of the `class` attribute, if any.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Value of the `id` attribute, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Ordinal among siblings sharing this tag name.
    pub tag_child_index: usize,
    /// Lower-cased tag name.
    pub tag_name: String,
    /// Number of element siblings, the element included.
    pub total_children: usize,
    /// Number of same-tag siblings, the element included.
    pub total_tag_children: usize,
}

/// Content signals captured alongside the structural path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueFeatures {
    /// Full descendant text.
    #[serde(default)]
    pub all_text: String,
    /// Text owned directly by the element, trimmed.
    #[serde(default)]
    pub direct_text: String,
    /// Rendered inner markup at pick time.
    #[serde(default, rename = "innerHTML")]
    pub inner_html: String,
    /// Rendered outer markup at pick time.
    #[serde(default, rename = "outerHTML")]
    pub outer_html: String,
    /// Allow-listed identity attributes (`src`, `href`, `alt`, `title`, `data-*`, `aria-*`).
    #[serde(default)]
    pub special_attributes: BTreeMap<String, String>,
}

/// Structural and content descriptor of a picked element.
///
/// Deliberately not `Clone`: a fingerprint describes one click against one
/// rendering and is moved into [`crate::locator::locate`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    /// `class` attribute of the target.
    #[serde(default)]
    pub class_name: Option<String>,
    /// `id` attribute of the target.
    #[serde(default)]
    pub id: Option<String>,
    /// Short text used in log lines and diagnostics.
    #[serde(default)]
    pub key_text: String,
    /// Lower-cased tag name of the target.
    pub tag_name: String,
    /// Full descendant text of the target.
    #[serde(default)]
    pub text_content: String,
    /// Path from the content root down to the target, target last.
    pub tree_path: Vec<PathNode>,
    /// Content signals used by the text and attribute tiers.
    #[serde(default)]
    pub unique_features: UniqueFeatures,
}

impl Fingerprint {
    /// The deepest path node, which describes the target itself.
    pub fn target(&self) -> Option<&PathNode> {
        return self.tree_path.last();
    }

    /// Same-tag ordinal of the target, or zero when the path is empty.
    pub fn tag_ordinal(&self) -> usize {
        return self.target().map_or(0, |node| return node.tag_child_index);
    }

    /// Id of the target, preferring the path node over the top-level field.
    pub fn target_id(&self) -> Option<&str> {
        return self
            .target()
            .and_then(|node| return node.id.as_deref())
            .or(self.id.as_deref())
            .filter(|id| return !id.trim().is_empty());
    }

    /// Class of the target, preferring the path node over the top-level field.
    pub fn target_class(&self) -> Option<&str> {
        return self
            .target()
            .and_then(|node| return node.class_name.as_deref())
            .or(self.class_name.as_deref())
            .map(str::trim)
            .filter(|class| return !class.is_empty());
    }
}

/// Where a fingerprint landed in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Set when the pick survived every tie-break only by falling back to order.
    pub ambiguous: bool,
    /// Attribute text (e.g. `id="hero"`) that singled out the opening tag on the line.
    pub anchor: Option<String>,
    /// Certainty of the match.
    pub confidence: Confidence,
    /// Zero-based index of the matched line.
    pub line_index: usize,
    /// Which opening tag of `tag_name` on that line, zero-based in source order.
    pub occurrence: usize,
    /// Name of the locator strategy that produced the match.
    pub strategy: &'static str,
    /// Tag name the patch applier must edit on that line.
    pub tag_name: String,
}

/// The one edit a patch call performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EditIntent {
    /// Set or insert an attribute, including image references.
    Attribute {
        /// Attribute name.
        name: String,
        /// Raw (unescaped) attribute value.
        value: String,
    },
    /// Replace inner markup; nested tags are allowed but newlines are not.
    InnerHtml {
        /// Replacement markup.
        value: String,
    },
    /// Set one inline style property with `!important` priority.
    StyleProperty {
        /// Property name, camelCase or kebab-case.
        name: String,
        /// Also drop utility classes that would fight the property.
        #[serde(default)]
        prune_classes: bool,
        /// Property value without `!important`.
        value: String,
    },
    /// Replace text content; the value is escaped.
    TextContent {
        /// Replacement text.
        value: String,
    },
}

impl EditIntent {
    /// Short label for logs and error messages, e.g. `style color`.
    pub fn describe(&self) -> String {
        return match self {
            EditIntent::Attribute { name, .. } => format!("attribute {name}"),
            EditIntent::InnerHtml { .. } => "innerHTML".to_string(),
            EditIntent::StyleProperty { name, .. } => format!("style {name}"),
            EditIntent::TextContent { .. } => "textContent".to_string(),
        };
    }

    /// The raw value the edit writes.
    pub fn value(&self) -> &str {
        return match self {
            EditIntent::Attribute { value, .. }
            | EditIntent::InnerHtml { value }
            | EditIntent::StyleProperty { value, .. }
            | EditIntent::TextContent { value } => value,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_ranks_are_ordered() {
        assert!(Confidence::Exact.rank() > Confidence::High.rank());
        assert!(Confidence::High.rank() > Confidence::Medium.rank());
        assert!(Confidence::Medium.rank() > Confidence::Low.rank());
        assert!(Confidence::Low.is_weak());
        assert!(!Confidence::Medium.is_weak());
    }

    #[test]
    fn fingerprint_json_uses_dom_field_names() {
        let json = r#"{
            "tagName": "img",
            "className": "photo",
            "treePath": [
                {"tagName": "img", "childIndex": 3, "tagChildIndex": 1,
                 "totalChildren": 4, "totalTagChildren": 2, "className": "photo"}
            ],
            "uniqueFeatures": {"directText": "", "innerHTML": "", "specialAttributes": {"alt": "Sea"}}
        }"#;
        let fingerprint: Fingerprint = serde_json::from_str(json).unwrap();
        assert_eq!(fingerprint.tag_ordinal(), 1);
        assert_eq!(fingerprint.target_class(), Some("photo"));
        assert_eq!(fingerprint.target_id(), None);
        assert_eq!(
            fingerprint.unique_features.special_attributes.get("alt").map(String::as_str),
            Some("Sea")
        );
    }

    #[test]
    fn edit_intent_is_tagged_by_kind() {
        let intent: EditIntent =
            serde_json::from_str(r#"{"kind": "styleProperty", "name": "fontSize", "value": "18px"}"#)
                .unwrap();
        assert_eq!(
            intent,
            EditIntent::StyleProperty {
                name: "fontSize".to_string(),
                prune_classes: false,
                value: "18px".to_string(),
            }
        );
        assert_eq!(intent.describe(), "style fontSize");
    }
}
