//! Preview reconciler: bring a live rendering up to date with new markup
//! without a full reload, keeping the reader's scroll position.

use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::config::PreviewConfig;
use crate::dom::escape_attribute;

/// Attribute that tags style nodes injected by [`reconcile`].
pub const INJECTED_MARKER: &str = "data-pinpatch-injected";

/// Head content added to every rebuilt document.
const BASE_HEAD: &str = concat!(
    "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">",
    "<style>html, body { min-height: 100%; margin: 0; padding: 0; width: 100%; overflow-x: hidden; }</style>",
);

/// `<!doctype` or `<html` anywhere in the markup.
static DOCUMENT_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)<!doctype|<html").ok());

/// Opening `<body>` tag.
static BODY_OPEN: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)<body(?:\s[^>]*)?>").ok());

/// Closing `</body>` tag.
static BODY_CLOSE: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)</body\s*>").ok());

/// Opening `<head>` tag.
static HEAD_OPEN: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)<head(?:\s[^>]*)?>").ok());

/// Closing `</head>` tag.
static HEAD_CLOSE: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)</head\s*>").ok());

/// Opening `<html>` tag.
static HTML_OPEN: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)<html(?:\s[^>]*)?>").ok());

/// Closing `</html>` tag.
static HTML_CLOSE: LazyLock<Option<Regex>> = LazyLock::new(|| return Regex::new(r"(?i)</html\s*>").ok());

/// `<style>` elements and `<link rel="stylesheet">` tags.
static STYLE_ELEMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    return Regex::new(
        r#"(?is)<style(?:\s[^>]*)?>.*?</style\s*>|<link\s[^>]*\brel\s*=\s*["']?stylesheet\b[^>]*>"#,
    )
    .ok();
});

/// Scroll position of a rendering, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

/// A live rendering the reconciler can update in place.
///
/// A browser host implements this over its preview frame; [`HeadlessSurface`]
/// is the in-memory implementation used by the CLI and tests.
pub trait PreviewSurface {
    /// Restore `offset` after the next rendering frame. A later call replaces
    /// an earlier pending one.
    fn defer_scroll_restore(&mut self, offset: ScrollOffset);
    /// Append a style or stylesheet link node to the head.
    fn inject_style(&mut self, markup: &str);
    /// Whether the surface is attached and can be updated incrementally.
    fn is_ready(&self) -> bool;
    /// Replace the whole rendering with a complete document.
    fn rebuild(&mut self, document: &str);
    /// Remove every head node carrying `marker`, returning how many went.
    fn remove_injected_styles(&mut self, marker: &str) -> usize;
    /// Replace the body's inner markup.
    fn replace_body(&mut self, markup: &str);
    /// Current scroll position.
    fn scroll_offset(&self) -> ScrollOffset;
}

/// How [`sync`] brought the surface up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Updated in place by [`reconcile`].
    Incremental,
    /// Fell back to a full rebuild.
    Rebuilt,
}

/// Whether `markup` is a complete document rather than a fragment.
pub fn is_full_document(markup: &str) -> bool {
    return DOCUMENT_MARKER.as_ref().is_some_and(|re| return re.is_match(markup));
}

/// Update `surface` in place with `markup`. Returns `false`, leaving the
/// surface untouched, when it is not ready or a full document has no body;
/// the caller should rebuild instead.
pub fn reconcile<S: PreviewSurface>(surface: &mut S, markup: &str, config: &PreviewConfig) -> bool {
    if !surface.is_ready() {
        debug!("reconcile: surface not ready");
        return false;
    }
    let scroll = surface.scroll_offset();

    if is_full_document(markup) {
        let Some(body) = body_inner(markup) else {
            debug!("reconcile: full document has no <body>");
            return false;
        };
        let styles = head_styles(markup);
        let removed = surface.remove_injected_styles(INJECTED_MARKER);
        for style in &styles {
            surface.inject_style(&mark_injected(style));
        }
        surface.replace_body(body);
        info!("reconciled full document ({} styles replaced {removed})", styles.len());
    } else {
        surface.replace_body(&wrap_fragment(markup, config));
        info!("reconciled fragment");
    }

    surface.defer_scroll_restore(scroll);
    return true;
}

/// Reconcile incrementally, falling back to a full rebuild of the prepared document.
pub fn sync<S: PreviewSurface>(surface: &mut S, markup: &str, config: &PreviewConfig) -> SyncOutcome {
    if reconcile(surface, markup, config) {
        return SyncOutcome::Incremental;
    }
    info!("incremental update unavailable, rebuilding preview");
    surface.rebuild(&prepare_document(markup));
    return SyncOutcome::Rebuilt;
}

/// Turn markup into a complete document carrying the preview base styles:
/// inserted after `<head>`, in a new head after `<html>`, or around the whole
/// fragment.
pub fn prepare_document(markup: &str) -> String {
    if let Some(head) = find(&HEAD_OPEN, markup) {
        return insert_at(markup, head.end(), BASE_HEAD);
    }
    if let Some(html) = find(&HTML_OPEN, markup) {
        return insert_at(markup, html.end(), &format!("<head>{BASE_HEAD}</head>"));
    }
    return format!("<!DOCTYPE html>\n<html>\n<head>{BASE_HEAD}</head>\n<body>\n{markup}\n</body>\n</html>\n");
}

/// First match of a lazily compiled pattern.
fn find<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str) -> Option<regex::Match<'t>> {
    return pattern.as_ref().and_then(|re| return re.find(text));
}

/// Last match of a lazily compiled pattern.
fn find_last<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str) -> Option<regex::Match<'t>> {
    return pattern.as_ref().and_then(|re| return re.find_iter(text).last());
}

/// Insert `insertion` at byte offset `at`.
fn insert_at(text: &str, at: usize, insertion: &str) -> String {
    let (head, tail) = text.split_at_checked(at).unwrap_or((text, ""));
    return format!("{head}{insertion}{tail}");
}

/// Inner markup of `<body>`, up to the last `</body>` or the end of the text.
fn body_inner(markup: &str) -> Option<&str> {
    let open = find(&BODY_OPEN, markup)?;
    let rest = markup.get(open.end()..)?;
    let end = find_last(&BODY_CLOSE, rest).map_or(rest.len(), |close| return close.start());
    return rest.get(..end);
}

/// Style and stylesheet link elements in the head portion (everything before `<body`).
fn head_styles(markup: &str) -> Vec<String> {
    let head_end = find(&BODY_OPEN, markup).map_or(markup.len(), |body| return body.start());
    let head = markup.get(..head_end).unwrap_or(markup);
    return STYLE_ELEMENT
        .as_ref()
        .map(|re| return re.find_iter(head).map(|m| return m.as_str().to_string()).collect())
        .unwrap_or_default();
}

/// Add the injected marker right after the element's tag name.
fn mark_injected(element: &str) -> String {
    let name_len = element
        .chars()
        .skip(1)
        .take_while(char::is_ascii_alphanumeric)
        .count();
    return insert_at(element, name_len.saturating_add(1), &format!(" {INJECTED_MARKER}=\"\""));
}

/// Center a fragment in a fixed-width container.
fn wrap_fragment(markup: &str, config: &PreviewConfig) -> String {
    return format!(
        "<div class=\"{}\" style=\"max-width: {}; margin: 0 auto;\">{markup}</div>",
        escape_attribute(&config.container_class),
        escape_attribute(&config.fragment_width),
    );
}

// ── Headless surface ───────────────────────────────────────────────────

/// In-memory rendering with explicit frame ticks.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    /// Whether a document has been loaded and not detached since.
    attached: bool,
    /// Body inner markup.
    body: String,
    /// Authored head markup from the last rebuild.
    head: String,
    /// Style nodes added through [`PreviewSurface::inject_style`].
    injected: Vec<String>,
    /// Restore waiting for the next frame.
    pending_restore: Option<ScrollOffset>,
    /// Number of full rebuilds performed.
    rebuilds: usize,
    /// Current scroll position.
    scroll: ScrollOffset,
}

impl HeadlessSurface {
    /// A detached surface with nothing loaded.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Body inner markup.
    pub fn body(&self) -> &str {
        return &self.body;
    }

    /// Drop the rendering; incremental updates fail until the next rebuild.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Injected style nodes, in injection order.
    pub fn injected_styles(&self) -> &[String] {
        return &self.injected;
    }

    /// Number of full rebuilds so far.
    pub const fn rebuild_count(&self) -> usize {
        return self.rebuilds;
    }

    /// Serialize the current rendering as a complete document.
    pub fn render(&self) -> String {
        return format!(
            "<!DOCTYPE html>\n<html>\n<head>{}{}</head>\n<body>{}</body>\n</html>\n",
            self.head,
            self.injected.concat(),
            self.body
        );
    }

    /// Scroll as the reader would.
    pub fn scroll_to(&mut self, offset: ScrollOffset) {
        self.scroll = offset;
    }

    /// Advance one rendering frame, running any deferred scroll restore.
    pub fn tick_frame(&mut self) {
        if let Some(offset) = self.pending_restore.take() {
            self.scroll = offset;
        }
    }
}

impl PreviewSurface for HeadlessSurface {
    fn defer_scroll_restore(&mut self, offset: ScrollOffset) {
        self.pending_restore = Some(offset);
    }

    fn inject_style(&mut self, markup: &str) {
        self.injected.push(markup.to_string());
    }

    fn is_ready(&self) -> bool {
        return self.attached;
    }

    fn rebuild(&mut self, document: &str) {
        let head_inner = find(&HEAD_OPEN, document).and_then(|open| {
            let rest = document.get(open.end()..)?;
            let end = find(&HEAD_CLOSE, rest).map_or(rest.len(), |close| return close.start());
            return rest.get(..end);
        });
        self.head = head_inner.unwrap_or_default().to_string();
        self.body = body_inner(document).map_or_else(|| return implied_body(document), str::to_string);
        self.injected.clear();
        self.pending_restore = None;
        self.scroll = ScrollOffset::default();
        self.attached = true;
        self.rebuilds = self.rebuilds.saturating_add(1);
    }

    fn remove_injected_styles(&mut self, marker: &str) -> usize {
        let before = self.injected.len();
        self.injected.retain(|node| return !node.contains(marker));
        return before.saturating_sub(self.injected.len());
    }

    fn replace_body(&mut self, markup: &str) {
        self.body = markup.to_string();
        self.scroll = ScrollOffset::default();
    }

    fn scroll_offset(&self) -> ScrollOffset {
        return self.scroll;
    }
}

/// Content a parser would place in an omitted `<body>`: whatever follows the
/// head (or the `<html>` tag), up to `</html>`.
fn implied_body(document: &str) -> String {
    let start = find(&HEAD_CLOSE, document)
        .or_else(|| return find(&HTML_OPEN, document))
        .map_or(0, |m| return m.end());
    let rest = document.get(start..).unwrap_or_default();
    let end = find_last(&HTML_CLOSE, rest).map_or(rest.len(), |close| return close.start());
    return rest.get(..end).unwrap_or_default().trim().to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html>\n<html>\n<head>\n<style>h1 { color: red; }</style>\n\
        <link rel=\"stylesheet\" href=\"site.css\">\n</head>\n<body class=\"x\">\n<h1>Hi</h1>\n\
        <style>.inline {}</style>\n</body>\n</html>\n";

    fn attached() -> HeadlessSurface {
        let mut surface = HeadlessSurface::new();
        surface.rebuild(&prepare_document("<p>start</p>"));
        return surface;
    }

    #[test]
    fn detects_full_documents() {
        assert!(is_full_document("<!doctype html><p>x</p>"));
        assert!(is_full_document("  <HTML lang=\"en\">"));
        assert!(!is_full_document("<div>fragment</div>"));
    }

    #[test]
    fn detached_surface_is_not_reconciled() {
        let mut surface = HeadlessSurface::new();
        assert!(!reconcile(&mut surface, PAGE, &PreviewConfig::default()));
        assert_eq!(surface.body(), "");
        assert!(surface.injected_styles().is_empty());

        let mut surface = attached();
        surface.detach();
        assert!(!reconcile(&mut surface, "<p>x</p>", &PreviewConfig::default()));
        assert_eq!(surface.body(), "\n<p>start</p>\n");
    }

    #[test]
    fn full_document_replaces_body_and_head_styles() {
        let mut surface = attached();
        assert!(reconcile(&mut surface, PAGE, &PreviewConfig::default()));

        assert_eq!(surface.body(), "\n<h1>Hi</h1>\n<style>.inline {}</style>\n");
        assert_eq!(
            surface.injected_styles(),
            [
                "<style data-pinpatch-injected=\"\">h1 { color: red; }</style>",
                "<link data-pinpatch-injected=\"\" rel=\"stylesheet\" href=\"site.css\">",
            ]
        );
    }

    #[test]
    fn repeated_reconcile_does_not_duplicate_styles() {
        let mut surface = HeadlessSurface::new();
        assert!(!reconcile(&mut surface, PAGE, &PreviewConfig::default()));
        surface.rebuild(&prepare_document(PAGE));
        for _ in 0..3 {
            assert!(reconcile(&mut surface, PAGE, &PreviewConfig::default()));
        }
        assert_eq!(surface.injected_styles().len(), 2);
    }

    #[test]
    fn fragment_is_wrapped_in_configured_container() {
        let mut surface = attached();
        let config = PreviewConfig { container_class: "frame".to_string(), fragment_width: "960px".to_string() };
        assert!(reconcile(&mut surface, "<p>x</p>", &config));
        assert_eq!(surface.body(), "<div class=\"frame\" style=\"max-width: 960px; margin: 0 auto;\"><p>x</p></div>");
    }

    #[test]
    fn scroll_is_restored_one_frame_later() {
        let mut surface = attached();
        let offset = ScrollOffset { x: 0.0, y: 420.0 };
        surface.scroll_to(offset);

        assert!(reconcile(&mut surface, "<p>x</p>", &PreviewConfig::default()));
        assert_eq!(surface.scroll_offset(), ScrollOffset::default());
        surface.tick_frame();
        assert_eq!(surface.scroll_offset(), offset);
        surface.tick_frame();
        assert_eq!(surface.scroll_offset(), offset);
    }

    #[test]
    fn later_restore_wins() {
        let mut surface = attached();
        surface.scroll_to(ScrollOffset { x: 0.0, y: 100.0 });
        assert!(reconcile(&mut surface, "<p>a</p>", &PreviewConfig::default()));
        surface.scroll_to(ScrollOffset { x: 0.0, y: 250.0 });
        assert!(reconcile(&mut surface, "<p>b</p>", &PreviewConfig::default()));
        surface.tick_frame();
        assert_eq!(surface.scroll_offset(), ScrollOffset { x: 0.0, y: 250.0 });
    }

    #[test]
    fn document_without_body_falls_back_to_rebuild() {
        let mut surface = attached();
        let markup = "<html><p>bare</p></html>";
        assert!(!reconcile(&mut surface, markup, &PreviewConfig::default()));
        assert_eq!(sync(&mut surface, markup, &PreviewConfig::default()), SyncOutcome::Rebuilt);
        assert_eq!(surface.body(), "<p>bare</p>");
        assert_eq!(surface.rebuild_count(), 2);
        assert_eq!(sync(&mut surface, "<p>next</p>", &PreviewConfig::default()), SyncOutcome::Incremental);
    }

    #[test]
    fn prepare_document_places_base_head() {
        let with_head = prepare_document("<html><HEAD><title>t</title></HEAD><body></body></html>");
        assert!(with_head.starts_with(&format!("<html><HEAD>{BASE_HEAD}<title>")));

        let with_html = prepare_document("<html lang=\"en\"><body>x</body></html>");
        assert!(with_html.starts_with(&format!("<html lang=\"en\"><head>{BASE_HEAD}</head><body>")));

        let fragment = prepare_document("<p>x</p>");
        assert!(fragment.starts_with("<!DOCTYPE html>"));
        assert!(fragment.contains("<body>\n<p>x</p>\n</body>"));
    }

    #[test]
    fn rendered_document_contains_head_and_injected_styles() {
        let mut surface = HeadlessSurface::new();
        surface.rebuild(&prepare_document(PAGE));
        assert!(reconcile(&mut surface, PAGE, &PreviewConfig::default()));
        let rendered = surface.render();
        assert!(rendered.contains(BASE_HEAD));
        assert!(rendered.contains(INJECTED_MARKER));
        assert!(rendered.contains("<h1>Hi</h1>"));
    }
}
