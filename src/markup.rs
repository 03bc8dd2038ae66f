//! Single-line markup scanning: opening tags and the attributes inside them.
//!
//! Nothing here builds a tree. The locator and the patch applier both read one
//! source line at a time, and they must agree on where each opening tag starts
//! and ends and which bytes belong to which attribute.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// One attribute at the start of the remaining tag text: whitespace, name,
/// then an optional `=` with a double-quoted, single-quoted, or bare value.
static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    return Regex::new(r#"^\s+([^\s"'<>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#).ok();
});

/// Byte span of one opening tag on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTag {
    /// Whether the tag's closing `>` is on this line.
    pub closed: bool,
    /// Byte offset just past the tag (past `>` when closed, end of line otherwise).
    pub end: usize,
    /// Byte offset of the `<`.
    pub start: usize,
}

/// How an attribute's value is written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSyntax {
    /// `name=value`
    Bare,
    /// `name="value"`
    DoubleQuoted,
    /// `name='value'`
    SingleQuoted,
    /// `name` alone.
    Valueless,
}

impl ValueSyntax {
    /// Label used in debug logs.
    pub const fn label(self) -> &'static str {
        return match self {
            ValueSyntax::Bare => "bare",
            ValueSyntax::DoubleQuoted => "double-quoted",
            ValueSyntax::SingleQuoted => "single-quoted",
            ValueSyntax::Valueless => "valueless",
        };
    }

    /// Quote character to write when rewriting the value. Bare and valueless
    /// attributes are rewritten double-quoted.
    pub const fn quote(self) -> char {
        return match self {
            ValueSyntax::SingleQuoted => '\'',
            ValueSyntax::Bare | ValueSyntax::DoubleQuoted | ValueSyntax::Valueless => '"',
        };
    }
}

/// Byte offsets of one attribute, relative to the opening tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpan {
    /// Offset just past the attribute (past the closing quote when quoted).
    pub end: usize,
    /// Offset just past the name.
    pub name_end: usize,
    /// Offset of the first byte of the name.
    pub name_start: usize,
    /// How the value is written.
    pub syntax: ValueSyntax,
    /// Offset of the value, opening quote included; equal to `end` when valueless.
    pub value_start: usize,
}

impl AttributeSpan {
    /// The attribute name as written.
    pub fn name<'a>(&self, tag_text: &'a str) -> &'a str {
        return tag_text.get(self.name_start..self.name_end).unwrap_or("");
    }

    /// The whole attribute as written, e.g. `src="a.png"`.
    pub fn text<'a>(&self, tag_text: &'a str) -> &'a str {
        return tag_text.get(self.name_start..self.end).unwrap_or("");
    }

    /// The value without its quotes; empty when valueless.
    pub fn value<'a>(&self, tag_text: &'a str) -> &'a str {
        let raw = tag_text.get(self.value_start..self.end).unwrap_or("");
        return match self.syntax {
            ValueSyntax::DoubleQuoted => raw.trim_start_matches('"').trim_end_matches('"'),
            ValueSyntax::SingleQuoted => raw.trim_start_matches('\'').trim_end_matches('\''),
            ValueSyntax::Bare | ValueSyntax::Valueless => raw,
        };
    }
}

/// Attributes of one opening tag, in source order.
#[derive(Debug, Default)]
pub struct Attributes {
    /// Whether scanning reached the end of the tag. When false, something
    /// after the last span could not be read as an attribute.
    pub complete: bool,
    /// Every attribute read, in source order.
    pub spans: Vec<AttributeSpan>,
}

impl Attributes {
    /// First attribute named `name`, compared case-insensitively.
    pub fn find(&self, tag_text: &str, name: &str) -> Option<AttributeSpan> {
        return self
            .spans
            .iter()
            .find(|span| return span.name(tag_text).eq_ignore_ascii_case(name))
            .copied();
    }
}

/// Pattern for one opening tag named `tag`: `<tag` followed by whitespace or
/// `/` and the attribute text, up to `>` or the end of the line. Quoted values
/// may contain `>`.
///
/// # Errors
///
/// Returns `Error::Pattern` if the pattern cannot be compiled.
pub fn opening_tag_pattern(tag: &str) -> Result<Regex, Error> {
    return Ok(Regex::new(&format!(
        r#"(?i)<{}(?:[\s/](?:"[^"]*"|'[^']*'|[^>])*)?(?:>|$)"#,
        regex::escape(tag)
    ))?);
}

/// Every opening tag `pattern` finds on `line`, in order.
pub fn opening_tags(pattern: &Regex, line: &str) -> Vec<OpenTag> {
    return pattern
        .find_iter(line)
        .map(|m| return OpenTag { closed: m.as_str().ends_with('>'), end: m.end(), start: m.start() })
        .collect();
}

/// Read the attributes of an opening tag, `tag_text` starting at its `<`.
///
/// Scanning moves from one attribute to the next, so text inside a quoted
/// value is never mistaken for an attribute name.
pub fn scan_attributes(tag_text: &str) -> Attributes {
    let Some(attribute) = ATTRIBUTE.as_ref() else {
        return Attributes::default();
    };

    let name_end = tag_text
        .char_indices()
        .skip(1)
        .find(|(_, c)| return c.is_whitespace() || *c == '/' || *c == '>')
        .map_or(tag_text.len(), |(i, _)| return i);

    let mut spans = Vec::new();
    let mut pos = name_end;
    while let Some(rest) = tag_text.get(pos..) {
        let Some(caps) = attribute.captures(rest) else {
            break;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let value = caps.get(2);
        // `name="unterminated` leaves `=` behind; that is not a valueless attribute.
        let dangling = value.is_none()
            && rest.get(whole.end()..).is_some_and(|after| return after.trim_start().starts_with('='));
        if dangling {
            break;
        }

        let syntax = match value.and_then(|v| return v.as_str().chars().next()) {
            None => ValueSyntax::Valueless,
            Some('"') => ValueSyntax::DoubleQuoted,
            Some('\'') => ValueSyntax::SingleQuoted,
            Some(_) => ValueSyntax::Bare,
        };
        let end = pos.saturating_add(whole.end());
        spans.push(AttributeSpan {
            end,
            name_end: pos.saturating_add(name.end()),
            name_start: pos.saturating_add(name.start()),
            syntax,
            value_start: value.map_or(end, |v| return pos.saturating_add(v.start())),
        });
        pos = end;
    }

    let rest: String = tag_text.get(pos..).unwrap_or("").chars().filter(|c| return !c.is_whitespace()).collect();
    return Attributes { complete: matches!(rest.as_str(), "" | "/" | ">" | "/>"), spans };
}
