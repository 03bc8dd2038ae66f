//! Inline `style` attribute editing and utility-class conflict pruning.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix that makes an inline declaration win over authored rules.
const IMPORTANT: &str = "!important";

/// Tailwind-style palette used by the color and background utilities.
const PALETTE: &str = "(?:gray|red|blue|green|yellow|purple|pink|indigo)-(?:50|[1-9]00)";

/// Utility classes that set the same CSS property an inline edit is about to
/// set, keyed by kebab-case property name.
static UTILITY_CONFLICTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let table = [
        ("background-color", format!("^bg-(?:black|white|transparent|{PALETTE})$")),
        ("border-radius", "^rounded(?:-(?:none|sm|md|lg|xl|2xl|3xl|full))?$".to_string()),
        ("color", format!("^text-(?:black|white|{PALETTE})$")),
        ("display", "^(?:block|inline-block|inline|flex|inline-flex|grid|inline-grid|hidden)$".to_string()),
        ("font-size", "^text-(?:xs|sm|base|lg|xl|[2-9]xl)$".to_string()),
        ("font-weight", "^font-(?:thin|extralight|light|normal|medium|semibold|bold|extrabold|black)$".to_string()),
        ("margin", "^m[xytblr]?-\\d+$".to_string()),
        ("padding", "^p[xytblr]?-\\d+$".to_string()),
        ("text-align", "^text-(?:left|center|right|justify)$".to_string()),
    ];
    return table
        .into_iter()
        .filter_map(|(property, pattern)| return Regex::new(&pattern).ok().map(|re| return (property, re)))
        .collect();
});

/// Parsed inline style: declarations in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    /// `(property, value)` pairs; values keep any `!important` suffix.
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute value: split on `;`, then on the first `:`.
    /// Fragments without a colon or with an empty property are dropped.
    pub fn parse(text: &str) -> Self {
        let declarations = text
            .split(';')
            .filter_map(|part| {
                let (property, value) = part.split_once(':')?;
                let property = property.trim();
                if property.is_empty() {
                    return None;
                }
                return Some((property.to_string(), value.trim().to_string()));
            })
            .collect();
        return Self { declarations };
    }

    /// Value of a property, matched case-insensitively.
    pub fn get(&self, property: &str) -> Option<&str> {
        return self
            .declarations
            .iter()
            .find(|(name, _)| return name.eq_ignore_ascii_case(property))
            .map(|(_, value)| return value.as_str());
    }

    /// Set a property with `!important` priority, replacing it in place if it
    /// already exists and appending it otherwise.
    pub fn set_important(&mut self, property: &str, value: &str) {
        let value = value.trim();
        let value = if value.ends_with(IMPORTANT) {
            value.to_string()
        } else {
            format!("{value} {IMPORTANT}")
        };

        let existing = self
            .declarations
            .iter_mut()
            .find(|(name, _)| return name.eq_ignore_ascii_case(property));
        match existing {
            Some((_, current)) => *current = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    /// Serialize as `a: b; c: d;`.
    pub fn serialize(&self) -> String {
        return self
            .declarations
            .iter()
            .map(|(property, value)| return format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
    }
}

/// Convert a camelCase property name to kebab-case. Names already in
/// kebab-case pass through unchanged.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len().saturating_add(4));
    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    return out;
}

/// Remove utility classes from a `class` value that would fight an inline
/// `property`. Returns `None` when nothing was removed.
pub fn prune_conflicting_classes(class_value: &str, property: &str) -> Option<String> {
    let pattern = UTILITY_CONFLICTS
        .iter()
        .find(|(name, _)| return *name == property)
        .map(|(_, pattern)| return pattern)?;

    let classes: Vec<&str> = class_value.split_whitespace().collect();
    let kept: Vec<&str> = classes.iter().copied().filter(|c| return !pattern.is_match(c)).collect();
    if kept.len() == classes.len() {
        return None;
    }
    return Some(kept.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_in_order() {
        let style = InlineStyle::parse("color: red; margin:0 auto;; background: url(a.png)");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("MARGIN"), Some("0 auto"));
        assert_eq!(style.serialize(), "color: red; margin: 0 auto; background: url(a.png);");
    }

    #[test]
    fn value_keeps_everything_after_first_colon() {
        let style = InlineStyle::parse("background-image: url(http://x/y.png)");
        assert_eq!(style.get("background-image"), Some("url(http://x/y.png)"));
    }

    #[test]
    fn set_overrides_in_place_and_is_idempotent() {
        let mut style = InlineStyle::parse("color: red; padding: 4px");
        style.set_important("color", "blue");
        let once = style.serialize();
        assert_eq!(once, "color: blue !important; padding: 4px;");

        let mut again = InlineStyle::parse(&once);
        again.set_important("color", "blue");
        assert_eq!(again.serialize(), once);
    }

    #[test]
    fn set_appends_new_property() {
        let mut style = InlineStyle::default();
        style.set_important("font-size", "18px !important");
        assert_eq!(style.serialize(), "font-size: 18px !important;");
    }

    #[test]
    fn kebab_case_conversion() {
        assert_eq!(to_kebab_case("fontSize"), "font-size");
        assert_eq!(to_kebab_case("backgroundColor"), "background-color");
        assert_eq!(to_kebab_case("line-height"), "line-height");
        assert_eq!(to_kebab_case("color"), "color");
    }

    #[test]
    fn prunes_only_conflicting_utilities() {
        assert_eq!(
            prune_conflicting_classes("card text-lg font-bold", "font-size").as_deref(),
            Some("card font-bold")
        );
        assert_eq!(
            prune_conflicting_classes("p-4 px-2 shadow", "padding").as_deref(),
            Some("shadow")
        );
        assert_eq!(
            prune_conflicting_classes("text-center text-red-500", "color").as_deref(),
            Some("text-center")
        );
        assert_eq!(prune_conflicting_classes("card", "font-size"), None);
        assert_eq!(prune_conflicting_classes("text-lg", "letter-spacing"), None);
    }
}
