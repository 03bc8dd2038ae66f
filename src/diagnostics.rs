use std::fmt::Write as _;

use crate::config::CONFIG_FILE;
use crate::error::Error;
use crate::types::Confidence;

/// ANSI bold, applied to markdown headings on stderr.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the user can
/// act on it, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::AmbiguousMatch { best, confidence, lines, tag } => render_ambiguous_match(*best, *confidence, lines, tag),
        Error::NotFound { candidates, reason, tag } => render_not_found(*candidates, reason, tag),
        Error::PatchPatternMismatch { edit, line, reason, tag } => render_pattern_mismatch(edit, *line, reason, tag),
        Error::StaleBaseline { current_generation, edit_generation } => {
            render_stale_baseline(*current_generation, *edit_generation)
        },
        Error::UnsupportedEdit { edit, reason, tag } => render_unsupported_edit(edit, reason, tag),
        Error::FileNotFound { .. }
        | Error::InvalidTarget { .. }
        | Error::Io(_)
        | Error::Json(_)
        | Error::LineOutOfRange { .. }
        | Error::Pattern(_)
        | Error::TomlDe(_)
        | Error::Watch { .. } => render_generic(e),
    };
}

/// Short variants without a dedicated layout.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!(
            "\
# Error: File Not Found

`{}` does not exist.
",
            path.display()
        ),

        Error::InvalidTarget { reason } => format!(
            "\
# Error: Invalid Target

{reason}

## Fix

Pick an element inside the page content, not the page body itself.
"
        ),

        Error::Json(e) => format!(
            "\
# Error: Invalid JSON

{e}

## Fix

A fingerprint needs at least `tagName` and `treePath`.
"
        ),

        Error::LineOutOfRange { len, line } => format!(
            "\
# Error: Line Out Of Range

Line {} was requested but the document has {len} lines.
",
            line.saturating_add(1)
        ),

        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Check `{CONFIG_FILE}`. Known keys: `[locator] min_text_len, strict` and
`[preview] fragment_width, container_class`.
"
        ),

        Error::Watch { reason } => format!(
            "\
# Error: Watch Failed

{reason}
"
        ),

        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// No line reached a usable confidence.
fn render_not_found(candidates: usize, reason: &str, tag: &str) -> String {
    let mut out = format!(
        "\
# Error: Element Not Found

No source line matches `<{tag}>`: {reason}.
"
    );

    if candidates == 0 {
        let _ = write!(
            out,
            "\
\n## Fix

The source has no `<{tag}>` opening tag at all. If the page is generated,
regenerate it and pick the element again.
"
        );
    } else {
        let _ = write!(
            out,
            "\
\n## Fix

{candidates} lines open `<{tag}>` but none could be told apart. Give the
element an `id` in the source, or pick a nearby element that has one.
"
        );
    }
    return out;
}

/// Strict mode refused a best-effort pick.
fn render_ambiguous_match(best: usize, confidence: Confidence, lines: &[usize], tag: &str) -> String {
    let mut out = format!(
        "\
# Error: Ambiguous Match

`<{tag}>` matches several source lines equally well.

## Candidates

"
    );
    for line in lines {
        let marker = if *line == best { " (best guess)" } else { "" };
        let _ = writeln!(out, "- line {}{marker}", line.saturating_add(1));
    }

    let _ = write!(
        out,
        "\
\n## Fix

The best guess carries `{confidence}` confidence. Add an `id` to the element,
or accept flagged guesses by setting this in `{CONFIG_FILE}`:

    [locator]
    strict = false
"
    );
    return out;
}

/// No patch pattern fit the line.
fn render_pattern_mismatch(edit: &str, line: usize, reason: &str, tag: &str) -> String {
    return format!(
        "\
# Error: Patch Pattern Mismatch

Cannot apply `{edit}` to `<{tag}>` on line {}: {reason}.

The source was left unchanged.

## Fix

Patches edit one line at a time. Put the element's opening tag (and, for text
edits, its closing tag) on a single line and try again.
",
        line.saturating_add(1)
    );
}

/// The edit lost a race with regenerated content.
fn render_stale_baseline(current_generation: u64, edit_generation: u64) -> String {
    return format!(
        "\
# Error: Stale Edit Discarded

The edit was made against generation {edit_generation}, but the source has since
moved to generation {current_generation}. Regenerated content wins and the edit
was not merged.

## Fix

Pick the element again in the refreshed preview and repeat the edit.
"
    );
}

/// The edit cannot be expressed as a single-line change.
fn render_unsupported_edit(edit: &str, reason: &str, tag: &str) -> String {
    return format!(
        "\
# Error: Unsupported Edit

`{edit}` on `<{tag}>` is not supported: {reason}.

The source was left unchanged.
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_without_candidates_suggests_regenerating() {
        let md = render_error(&Error::NotFound {
            candidates: 0,
            reason: "no line opens the tag".to_string(),
            tag: "section".to_string(),
        });
        assert!(md.starts_with("# Error: Element Not Found"));
        assert!(md.contains("no `<section>` opening tag"));
    }

    #[test]
    fn ambiguous_match_marks_best_guess() {
        let md = render_error(&Error::AmbiguousMatch {
            best: 4,
            confidence: Confidence::Low,
            lines: vec![2, 4],
            tag: "li".to_string(),
        });
        assert!(md.contains("- line 3\n"));
        assert!(md.contains("- line 5 (best guess)"));
        assert!(md.contains("strict = false"));
    }

    #[test]
    fn pattern_mismatch_uses_one_based_lines() {
        let md = render_error(&Error::PatchPatternMismatch {
            edit: "textContent".to_string(),
            line: 0,
            reason: "no closing tag on this line".to_string(),
            tag: "p".to_string(),
        });
        assert!(md.contains("on line 1: no closing tag"));
    }

    #[test]
    fn generic_variants_render_a_heading() {
        let md = render_error(&Error::Watch { reason: "inotify limit".to_string() });
        assert!(md.starts_with("# Error: Watch Failed"));
        let md = render_error(&Error::LineOutOfRange { len: 2, line: 9 });
        assert!(md.contains("Line 10 was requested"));
    }
}
