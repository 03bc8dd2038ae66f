//! Patch applier: rewrite exactly one source line to realize an edit intent.
//!
//! Every edit works on the opening tag the locator picked on the located line,
//! so the rest of the document is never touched. Attributes are read with
//! [`crate::markup::scan_attributes`] and rewritten according to how their value
//! is written; if the line's actual syntax fits no rewrite the edit fails
//! instead of silently doing nothing.

use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::dom::{escape_attribute, escape_text};
use crate::error::Error;
use crate::markup::{OpenTag, ValueSyntax, opening_tag_pattern, opening_tags, scan_attributes};
use crate::style::{InlineStyle, prune_conflicting_classes, to_kebab_case};
use crate::types::{EditIntent, MatchResult};

/// Valid attribute names for inserted or rewritten attributes.
static ATTRIBUTE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| return Regex::new(r"^[A-Za-z_:][-A-Za-z0-9_:.]*$").ok());

/// Valid CSS property names after kebab-case conversion.
static PROPERTY_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| return Regex::new(r"^-?[A-Za-z][-A-Za-z0-9]*$").ok());

/// The located line plus enough context to describe a failure.
struct LineEdit<'a> {
    /// Attribute text the locator matched on the opening tag, if any.
    anchor: Option<&'a str>,
    /// Short label of the edit, for errors and logs.
    edit: String,
    /// Current content of the line.
    line: &'a str,
    /// Zero-based index of the line.
    line_index: usize,
    /// Which opening tag of `tag` on the line to edit.
    occurrence: usize,
    /// Lower-cased tag name being edited.
    tag: &'a str,
}

impl LineEdit<'_> {
    /// Build a pattern-mismatch error for this edit.
    fn mismatch(&self, reason: &str) -> Error {
        return Error::PatchPatternMismatch {
            edit: self.edit.clone(),
            line: self.line_index,
            reason: reason.to_string(),
            tag: self.tag.to_string(),
        };
    }

    /// Build an unsupported-edit error for this edit.
    fn unsupported(&self, reason: &str) -> Error {
        return Error::UnsupportedEdit {
            edit: self.edit.clone(),
            reason: reason.to_string(),
            tag: self.tag.to_string(),
        };
    }
}

/// Apply `intent` to the line `target` points at and return the new lines.
/// Every line other than `target.line_index` is carried over byte for byte.
///
/// # Errors
///
/// Returns `Error::LineOutOfRange` if the target line does not exist,
/// `Error::PatchPatternMismatch` if no pattern fits the line, or
/// `Error::UnsupportedEdit` for edits that cannot stay on one line.
pub fn apply_patch(lines: &[String], target: &MatchResult, intent: &EditIntent) -> Result<Vec<String>, Error> {
    let Some(line) = lines.get(target.line_index) else {
        return Err(Error::LineOutOfRange { len: lines.len(), line: target.line_index });
    };

    let tag = target.tag_name.to_ascii_lowercase();
    let edit = LineEdit {
        anchor: target.anchor.as_deref(),
        edit: intent.describe(),
        line,
        line_index: target.line_index,
        occurrence: target.occurrence,
        tag: &tag,
    };
    let patched = patch_line(&edit, intent)?;

    let mut out = lines.to_vec();
    if let Some(slot) = out.get_mut(target.line_index) {
        *slot = patched;
    }
    info!("patched line {}: {} on <{tag}>", target.line_index.saturating_add(1), edit.edit);
    return Ok(out);
}

/// Dispatch one edit intent to its line rewrite.
///
/// # Errors
///
/// Returns the error of the specific rewrite.
fn patch_line(edit: &LineEdit<'_>, intent: &EditIntent) -> Result<String, Error> {
    if intent.value().contains('\n') {
        return Err(edit.unsupported("value spans multiple lines"));
    }

    let open = find_open_tag(edit)?;
    return match intent {
        EditIntent::Attribute { name, value } => set_attribute(edit, open, name, value),
        EditIntent::InnerHtml { value } => replace_content(edit, open, value, true),
        EditIntent::StyleProperty { name, prune_classes, value } => {
            set_style_property(edit, open, name, value, *prune_classes)
        },
        EditIntent::TextContent { value } => replace_content(edit, open, &escape_text(value), false),
    };
}

/// The opening tag the locator picked: the `occurrence`-th of its name on the line.
///
/// # Errors
///
/// Returns `Error::PatchPatternMismatch` if the line has no such opening tag,
/// or if the attribute the locator matched is no longer on it.
fn find_open_tag(edit: &LineEdit<'_>) -> Result<OpenTag, Error> {
    let tags = opening_tags(&opening_tag_pattern(edit.tag)?, edit.line);
    let Some(open) = tags.get(edit.occurrence).copied() else {
        return Err(edit.mismatch(&format!(
            "the line has {} opening tag(s) of this name, wanted number {}",
            tags.len(),
            edit.occurrence.saturating_add(1)
        )));
    };

    if let Some(anchor) = edit.anchor {
        let still_there = edit.line.get(open.start..open.end).is_some_and(|text| return text.contains(anchor));
        if !still_there {
            return Err(edit.mismatch(&format!("the opening tag no longer carries {anchor}")));
        }
    }
    return Ok(open);
}

/// Replace `start..end` of `text` with `replacement`.
fn splice(text: &str, start: usize, end: usize, replacement: &str) -> Option<String> {
    let head = text.get(..start)?;
    let tail = text.get(end..)?;
    let mut out = String::with_capacity(head.len().saturating_add(replacement.len()).saturating_add(tail.len()));
    out.push_str(head);
    out.push_str(replacement);
    out.push_str(tail);
    return Some(out);
}

/// Replace the opening tag's text on the line.
///
/// # Errors
///
/// Returns `Error::PatchPatternMismatch` if the span no longer lines up with the line.
fn replace_open_tag(edit: &LineEdit<'_>, open: OpenTag, new_tag: &str) -> Result<String, Error> {
    return splice(edit.line, open.start, open.end, new_tag)
        .ok_or_else(|| return edit.mismatch("opening tag span is not on a character boundary"));
}

/// Text of the opening tag.
///
/// # Errors
///
/// Returns `Error::PatchPatternMismatch` if the span no longer lines up with the line.
fn open_tag_text<'a>(edit: &LineEdit<'a>, open: OpenTag) -> Result<&'a str, Error> {
    return edit
        .line
        .get(open.start..open.end)
        .ok_or_else(|| return edit.mismatch("opening tag span is not on a character boundary"));
}

/// Split a closed opening tag into its body and closer (`>` or `/>`), dropping
/// whitespace before a `/>` into the returned gap.
fn split_closer(tag_text: &str) -> (&str, &str, &str) {
    let (body, closer) = match tag_text.strip_suffix("/>") {
        Some(body) => (body, "/>"),
        None => (tag_text.strip_suffix('>').unwrap_or(tag_text), ">"),
    };
    let trimmed = body.trim_end();
    let gap = body.get(trimmed.len()..).unwrap_or("");
    return (trimmed, gap, closer);
}

// ── Attributes ─────────────────────────────────────────────────────────

/// Set an attribute on the opening tag, inserting it after the tag name if absent.
///
/// # Errors
///
/// Returns `Error::UnsupportedEdit` for invalid attribute names, or
/// `Error::PatchPatternMismatch` if the attribute list cannot be read.
fn set_attribute(edit: &LineEdit<'_>, open: OpenTag, name: &str, value: &str) -> Result<String, Error> {
    let valid = ATTRIBUTE_NAME.as_ref().is_some_and(|re| return re.is_match(name));
    if !valid {
        return Err(edit.unsupported("invalid attribute name"));
    }

    let tag_text = open_tag_text(edit, open)?;
    let attributes = scan_attributes(tag_text);
    let escaped = escape_attribute(value);

    if let Some(span) = attributes.find(tag_text, name) {
        debug!("patch <{}>: attribute {name} via {}", edit.tag, span.syntax.label());
        let rewritten = match span.syntax {
            ValueSyntax::Valueless => {
                splice(tag_text, span.name_start, span.end, &format!("{}=\"{escaped}\"", span.name(tag_text)))
            },
            ValueSyntax::Bare | ValueSyntax::DoubleQuoted | ValueSyntax::SingleQuoted => {
                splice(tag_text, span.value_start, span.end, &format!("\"{escaped}\""))
            },
        };
        let new_tag = rewritten.ok_or_else(|| return edit.mismatch("attribute is not on a character boundary"))?;
        return replace_open_tag(edit, open, &new_tag);
    }

    if !attributes.complete {
        return Err(edit.mismatch("the attribute list could not be read to the end of the tag"));
    }
    debug!("patch <{}>: attribute {name} inserted after tag name", edit.tag);
    let name_end = open.start.saturating_add(1).saturating_add(edit.tag.len());
    return splice(edit.line, name_end, name_end, &format!(" {name}=\"{escaped}\""))
        .ok_or_else(|| return edit.mismatch("tag name is not on a character boundary"));
}

// ── Inline style ───────────────────────────────────────────────────────

/// Set one inline style property with `!important`, creating the `style`
/// attribute before the tag's closing `>` when there is none.
///
/// # Errors
///
/// Returns `Error::UnsupportedEdit` for invalid property names or values, or
/// `Error::PatchPatternMismatch` if the opening tag does not close on this line.
fn set_style_property(
    edit: &LineEdit<'_>,
    open: OpenTag,
    name: &str,
    value: &str,
    prune_classes: bool,
) -> Result<String, Error> {
    let property = to_kebab_case(name);
    let valid = PROPERTY_NAME.as_ref().is_some_and(|re| return re.is_match(&property));
    if !valid {
        return Err(edit.unsupported("invalid CSS property name"));
    }
    if value.contains(';') || value.trim().is_empty() {
        return Err(edit.unsupported("style value must be a single non-empty declaration value"));
    }

    let mut tag_text = open_tag_text(edit, open)?.to_string();
    if prune_classes {
        tag_text = prune_class_attribute(&tag_text, &property);
    }

    let attributes = scan_attributes(&tag_text);
    let new_tag = if let Some(span) = attributes.find(&tag_text, "style") {
        let quote = span.syntax.quote();
        let mut style = InlineStyle::parse(span.value(&tag_text));
        style.set_important(&property, value);
        let css = match quote {
            '"' => style.serialize().replace('"', "'"),
            _ => style.serialize().replace('\'', "\""),
        };
        let equals = if span.syntax == ValueSyntax::Valueless { "=" } else { "" };
        debug!("patch <{}>: style {property} rewritten in {} attribute", edit.tag, span.syntax.label());
        splice(&tag_text, span.value_start, span.end, &format!("{equals}{quote}{css}{quote}"))
            .ok_or_else(|| return edit.mismatch("style attribute is not on a character boundary"))?
    } else {
        if !open.closed {
            return Err(edit.mismatch("opening tag does not close on this line"));
        }
        if !attributes.complete {
            return Err(edit.mismatch("the attribute list could not be read to the end of the tag"));
        }
        let mut style = InlineStyle::default();
        style.set_important(&property, value);
        let css = style.serialize().replace('"', "'");
        let (body, gap, closer) = split_closer(&tag_text);
        debug!("patch <{}>: style attribute synthesized for {property}", edit.tag);
        format!("{body} style=\"{css}\"{gap}{closer}")
    };

    return replace_open_tag(edit, open, &new_tag);
}

/// Drop utility classes that conflict with `property` from the tag's class attribute.
fn prune_class_attribute(tag_text: &str, property: &str) -> String {
    let Some(span) = scan_attributes(tag_text).find(tag_text, "class") else {
        return tag_text.to_string();
    };
    let Some(pruned) = prune_conflicting_classes(span.value(tag_text), property) else {
        return tag_text.to_string();
    };
    let quote = span.syntax.quote();
    let equals = if span.syntax == ValueSyntax::Valueless { "=" } else { "" };
    debug!("patch: pruned utility classes conflicting with {property}");
    return splice(tag_text, span.value_start, span.end, &format!("{equals}{quote}{pruned}{quote}"))
        .unwrap_or_else(|| return tag_text.to_string());
}

// ── Content ────────────────────────────────────────────────────────────

/// Replace everything between the opening tag and the first matching closing
/// tag on the line. A self-closing tag is expanded into an open/close pair.
/// `markup` selects innerHTML semantics, where multi-line content is
/// unsupported rather than a pattern mismatch.
///
/// # Errors
///
/// Returns `Error::PatchPatternMismatch` or `Error::UnsupportedEdit` if the
/// content does not sit between an open/close pair on this line.
fn replace_content(edit: &LineEdit<'_>, open: OpenTag, content: &str, markup: bool) -> Result<String, Error> {
    if !open.closed {
        return Err(if markup {
            edit.unsupported("opening tag spans multiple lines")
        } else {
            edit.mismatch("opening tag does not close on this line")
        });
    }

    let tag_text = open_tag_text(edit, open)?;
    if tag_text.ends_with("/>") {
        let (body, _, _) = split_closer(tag_text);
        debug!("patch <{}>: expanding self-closing tag", edit.tag);
        return replace_open_tag(edit, open, &format!("{body}>{content}</{}>", edit.tag));
    }

    let rest = edit.line.get(open.end..).unwrap_or("");
    let close_pattern = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(edit.tag)))?;
    let Some(close) = close_pattern.find(rest) else {
        return Err(if markup {
            edit.unsupported("multi-line innerHTML replacement")
        } else {
            edit.mismatch("no closing tag on this line")
        });
    };

    let inner = rest.get(..close.start()).unwrap_or("");
    if opening_tag_pattern(edit.tag)?.is_match(inner) {
        return Err(edit.mismatch("a nested element with the same tag name makes the closing tag ambiguous"));
    }

    let content_end = open.end.saturating_add(close.start());
    return splice(edit.line, open.end, content_end, content)
        .ok_or_else(|| return edit.mismatch("content span is not on a character boundary"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;

    fn at(line_index: usize, tag: &str) -> MatchResult {
        return MatchResult {
            ambiguous: false,
            anchor: None,
            confidence: Confidence::Exact,
            line_index,
            occurrence: 0,
            strategy: "test",
            tag_name: tag.to_string(),
        };
    }

    fn lines(source: &str) -> Vec<String> {
        return source.split('\n').map(String::from).collect();
    }

    fn style(name: &str, value: &str) -> EditIntent {
        return EditIntent::StyleProperty { name: name.to_string(), prune_classes: false, value: value.to_string() };
    }

    fn text(value: &str) -> EditIntent {
        return EditIntent::TextContent { value: value.to_string() };
    }

    fn attr(name: &str, value: &str) -> EditIntent {
        return EditIntent::Attribute { name: name.to_string(), value: value.to_string() };
    }

    fn html(value: &str) -> EditIntent {
        return EditIntent::InnerHtml { value: value.to_string() };
    }

    fn patch_one(line: &str, tag: &str, intent: &EditIntent) -> Result<String, Error> {
        let out = apply_patch(&[line.to_string()], &at(0, tag), intent)?;
        return Ok(out.into_iter().next().unwrap());
    }

    #[test]
    fn replaces_text_inside_nested_heading() {
        let out = patch_one("<div class=\"card\"><h1>Hello</h1></div>", "h1", &text("Hi")).unwrap();
        assert_eq!(out, "<div class=\"card\"><h1>Hi</h1></div>");
    }

    #[test]
    fn only_the_target_line_changes() {
        let source = lines("<ul>\n  <li>One</li>\n  <li>Two</li>\n</ul>");
        let out = apply_patch(&source, &at(2, "li"), &style("color", "red")).unwrap();
        assert_eq!(out.len(), source.len());
        let changed: Vec<usize> = (0..out.len()).filter(|&i| out[i] != source[i]).collect();
        assert_eq!(changed, [2]);
        assert_eq!(out[2], "  <li style=\"color: red !important;\">Two</li>");
    }

    #[test]
    fn style_edit_is_idempotent() {
        let source = lines("<p class=\"lead\" style=\"margin: 0\">x</p>");
        let once = apply_patch(&source, &at(0, "p"), &style("fontSize", "18px")).unwrap();
        let twice = apply_patch(&once, &at(0, "p"), &style("fontSize", "18px")).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once[0], "<p class=\"lead\" style=\"margin: 0; font-size: 18px !important;\">x</p>");
    }

    #[test]
    fn style_overrides_existing_property_in_single_quotes() {
        let out = patch_one("<span style='color: blue; font-family: \"A\"'>x</span>", "span", &style("color", "red"))
            .unwrap();
        assert_eq!(out, "<span style='color: red !important; font-family: \"A\";'>x</span>");
    }

    #[test]
    fn style_is_synthesized_before_self_closing_slash() {
        let out = patch_one("<img src=\"a.png\" />", "img", &style("width", "50%")).unwrap();
        assert_eq!(out, "<img src=\"a.png\" style=\"width: 50% !important;\" />");
    }

    #[test]
    fn style_on_unterminated_tag_is_a_mismatch() {
        let err = patch_one("<div class=\"wide\"", "div", &style("color", "red")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));
    }

    #[test]
    fn style_prunes_conflicting_utility_classes_when_asked() {
        let intent = EditIntent::StyleProperty {
            name: "fontSize".to_string(),
            prune_classes: true,
            value: "20px".to_string(),
        };
        let out = patch_one("<h2 class=\"text-lg font-bold\">T</h2>", "h2", &intent).unwrap();
        assert_eq!(out, "<h2 class=\"font-bold\" style=\"font-size: 20px !important;\">T</h2>");
    }

    #[test]
    fn rejects_style_value_with_semicolon() {
        let err = patch_one("<p>x</p>", "p", &style("color", "red; display: none")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEdit { .. }));
    }

    #[test]
    fn text_is_escaped() {
        let out = patch_one("<p>old</p>", "p", &text("a < b & c")).unwrap();
        assert_eq!(out, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn text_expands_self_closing_tag() {
        let out = patch_one("<span class=\"x\" />", "span", &text("now")).unwrap();
        assert_eq!(out, "<span class=\"x\">now</span>");
    }

    #[test]
    fn text_without_closing_tag_is_a_mismatch() {
        let err = patch_one("<p>starts here", "p", &text("x")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));
    }

    #[test]
    fn nested_same_tag_is_refused() {
        let err = patch_one("<div>a<div>b</div></div>", "div", &text("x")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));
    }

    #[test]
    fn inner_html_keeps_markup() {
        let out = patch_one("<p class=\"a\">old <b>x</b></p>", "p", &html("new <em>y</em>")).unwrap();
        assert_eq!(out, "<p class=\"a\">new <em>y</em></p>");
    }

    #[test]
    fn multi_line_inner_html_is_unsupported() {
        let err = patch_one("<section>", "section", &html("x")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEdit { .. }));

        let err = patch_one("<p>x</p>", "p", &html("a\nb")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEdit { .. }));
    }

    #[test]
    fn attribute_rewrites_each_value_syntax() {
        assert_eq!(patch_one("<img src=\"a.png\">", "img", &attr("src", "b.png")).unwrap(), "<img src=\"b.png\">");
        assert_eq!(patch_one("<img src='a.png'>", "img", &attr("src", "b.png")).unwrap(), "<img src=\"b.png\">");
        assert_eq!(patch_one("<img src=a.png alt=x>", "img", &attr("src", "b.png")).unwrap(), "<img src=\"b.png\" alt=x>");
        assert_eq!(
            patch_one("<input disabled>", "input", &attr("disabled", "disabled")).unwrap(),
            "<input disabled=\"disabled\">"
        );
    }

    #[test]
    fn attribute_is_inserted_after_tag_name_when_absent() {
        let out = patch_one("<img class=\"photo\">", "img", &attr("src", "x.png?a=1&b=2")).unwrap();
        assert_eq!(out, "<img src=\"x.png?a=1&amp;b=2\" class=\"photo\">");
    }

    #[test]
    fn attribute_does_not_touch_prefixed_names() {
        let out = patch_one("<img data-src=\"lazy.png\" src=\"a.png\">", "img", &attr("src", "b.png")).unwrap();
        assert_eq!(out, "<img data-src=\"lazy.png\" src=\"b.png\">");
    }

    #[test]
    fn occurrence_selects_the_right_tag_on_a_shared_line() {
        let mut target = at(0, "img");
        target.occurrence = 1;
        target.anchor = Some("src=\"b.png\"".to_string());
        let source = vec!["<img src=\"a.png\"><img src=\"b.png\">".to_string()];
        let out = apply_patch(&source, &target, &attr("alt", "Second")).unwrap();
        assert_eq!(out[0], "<img src=\"a.png\"><img alt=\"Second\" src=\"b.png\">");
    }

    #[test]
    fn missing_occurrence_or_moved_anchor_is_a_mismatch() {
        let source = vec!["<img src=\"a.png\"><img src=\"b.png\">".to_string()];

        let mut beyond = at(0, "img");
        beyond.occurrence = 2;
        let err = apply_patch(&source, &beyond, &attr("alt", "x")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));

        let mut moved = at(0, "img");
        moved.anchor = Some("src=\"b.png\"".to_string());
        let err = apply_patch(&source, &moved, &attr("alt", "x")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));
    }

    #[test]
    fn text_edit_lands_on_the_located_tag_of_a_shared_line() {
        use crate::config::LocatorConfig;
        use crate::dom::Tree;
        use crate::fingerprint::build_fingerprint;
        use crate::locator::locate;

        let source = lines("<ul>\n  <li>Plans</li>\n  <li>Home</li><li>About us</li>\n</ul>");
        let mut tree = Tree::new();
        let ul = tree.append_element(tree.root(), "ul", &[]);
        for label in ["Plans", "Home"] {
            let li = tree.append_element(ul, "li", &[]);
            tree.append_text(li, label);
        }
        let about = tree.append_element(ul, "li", &[]);
        tree.append_text(about, "About us");

        let fingerprint = build_fingerprint(&tree.element(about).unwrap()).unwrap();
        let target = locate(fingerprint, &source, &LocatorConfig::default()).unwrap();
        let out = apply_patch(&source, &target, &text("Contact")).unwrap();
        assert_eq!(out[2], "  <li>Home</li><li>Contact</li>");
    }

    #[test]
    fn absent_attribute_named_inside_another_value_is_inserted() {
        let out = patch_one("<img title=\"see alt text\" src=\"a.png\">", "img", &attr("alt", "Sea")).unwrap();
        assert_eq!(out, "<img alt=\"Sea\" title=\"see alt text\" src=\"a.png\">");

        let out = patch_one("<a title=\"x href=y\" href=\"/\">go</a>", "a", &attr("href", "/home")).unwrap();
        assert_eq!(out, "<a title=\"x href=y\" href=\"/home\">go</a>");
    }

    #[test]
    fn style_named_inside_another_value_gets_its_own_attribute() {
        let out = patch_one("<p data-note=\"see style='color: blue'\">x</p>", "p", &style("color", "red")).unwrap();
        assert_eq!(out, "<p data-note=\"see style='color: blue'\" style=\"color: red !important;\">x</p>");
    }

    #[test]
    fn unreadable_attribute_list_refuses_to_insert() {
        let err = patch_one("<img alt=\"a\"title=\"b\">", "img", &attr("src", "c.png")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));
    }

    #[test]
    fn slash_closed_tags_without_space_are_editable() {
        assert_eq!(patch_one("<br/>", "br", &attr("class", "x")).unwrap(), "<br class=\"x\"/>");
        assert_eq!(
            patch_one("<img/>", "img", &style("width", "1px")).unwrap(),
            "<img style=\"width: 1px !important;\"/>"
        );
    }

    #[test]
    fn carriage_return_stays_at_line_end() {
        let out = patch_one("<h1>a</h1>\r", "h1", &style("color", "red")).unwrap();
        assert_eq!(out, "<h1 style=\"color: red !important;\">a</h1>\r");
    }

    #[test]
    fn missing_tag_and_bad_index_fail_loudly() {
        let err = patch_one("<p>x</p>", "span", &text("y")).unwrap_err();
        assert!(matches!(err, Error::PatchPatternMismatch { .. }));

        let err = apply_patch(&["<p>x</p>".to_string()], &at(3, "p"), &text("y")).unwrap_err();
        assert!(matches!(err, Error::LineOutOfRange { len: 1, line: 3 }));
    }
}
