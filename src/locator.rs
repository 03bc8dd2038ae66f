//! Source locator: re-find a fingerprinted element in raw source lines.
//!
//! The source is never parsed into a tree. Instead every line that opens the
//! target's tag becomes a candidate, and an ordered list of strategies
//! narrows the candidates using id, identity attributes, class, direct text,
//! and finally sibling position. The first strategy with a decisive answer wins.

use log::{debug, warn};

use crate::config::LocatorConfig;
use crate::dom::{escape_attribute, escape_text};
use crate::error::Error;
use crate::fingerprint::SPECIAL_ATTRIBUTES;
use crate::markup::{OpenTag, opening_tag_pattern, opening_tags, scan_attributes};
use crate::types::{Confidence, Fingerprint, MatchResult};

/// One opening tag of the target's name somewhere in the source.
#[derive(Debug, Clone, Copy)]
struct Site {
    /// Zero-based line index.
    line_index: usize,
    /// Ordinal among same-name opening tags on that line.
    occurrence: usize,
    /// Where the tag sits on the line.
    span: OpenTag,
}

/// What a strategy looks at.
struct Probe<'a> {
    /// Indices of lines that open the target tag, in document order.
    candidates: Vec<usize>,
    /// Locator tuning.
    config: &'a LocatorConfig,
    /// The element being located.
    fingerprint: &'a Fingerprint,
    /// The whole document.
    lines: &'a [String],
    /// Every opening tag of the target's name, in document order.
    sites: Vec<Site>,
}

impl Probe<'_> {
    /// Source text of a site's opening tag.
    fn tag_text(&self, site: Site) -> &str {
        return self
            .lines
            .get(site.line_index)
            .and_then(|line| return line.get(site.span.start..site.span.end))
            .unwrap_or("");
    }
}

/// A decisive answer from one strategy.
struct Hit {
    /// Attribute text that singled out the tag.
    anchor: Option<String>,
    /// Certainty of the answer.
    confidence: Confidence,
    /// The opening tag picked.
    site: Site,
    /// Lines that tied with the pick; empty when the pick was unambiguous.
    tied: Vec<usize>,
}

/// A named locator tier.
pub struct Strategy {
    /// Stable name reported in match results and logs.
    pub name: &'static str,
    /// `Ok(None)` means "nothing decisive, try the next tier".
    run: fn(&Probe<'_>) -> Result<Option<Hit>, Error>,
}

/// Locator tiers in evaluation order.
pub const STRATEGIES: [Strategy; 6] = [
    Strategy { name: "sole-candidate", run: sole_candidate },
    Strategy { name: "id", run: by_id },
    Strategy { name: "special-attribute", run: by_special_attribute },
    Strategy { name: "class", run: by_class },
    Strategy { name: "direct-text", run: by_direct_text },
    Strategy { name: "position", run: by_position },
];

/// Find the source line that renders `fingerprint`.
///
/// # Errors
///
/// Returns `Error::NotFound` when no line opens the tag or every tier comes up
/// empty, `Error::AmbiguousMatch` when `config.strict` is set and the best
/// answer is a tie-broken guess, or `Error::Pattern` if a search pattern
/// cannot be built.
pub fn locate(
    fingerprint: Fingerprint,
    lines: &[String],
    config: &LocatorConfig,
) -> Result<MatchResult, Error> {
    let tag = fingerprint.tag_name.trim().to_ascii_lowercase();
    if tag.is_empty() {
        return Err(Error::NotFound {
            candidates: 0,
            reason: "fingerprint has no tag name".to_string(),
            tag,
        });
    }

    let sites = collect_sites(&tag, lines)?;
    if sites.is_empty() {
        return Err(Error::NotFound {
            candidates: 0,
            reason: "no line opens this tag".to_string(),
            tag,
        });
    }
    let mut candidates: Vec<usize> = sites.iter().map(|site| return site.line_index).collect();
    candidates.dedup();

    let probe = Probe { candidates, config, fingerprint: &fingerprint, lines, sites };
    for strategy in &STRATEGIES {
        match (strategy.run)(&probe)? {
            None => debug!("locate <{tag}>: {} inconclusive", strategy.name),
            Some(hit) => return finish(&probe, &tag, strategy.name, hit),
        }
    }

    return Err(Error::NotFound {
        candidates: probe.candidates.len(),
        reason: format!(
            "no identifying signal matched and same-tag position {} is beyond the {} opening tags",
            fingerprint.tag_ordinal(),
            probe.sites.len()
        ),
        tag,
    });
}

/// Names of the locator tiers, in evaluation order.
pub fn strategy_names() -> Vec<&'static str> {
    return STRATEGIES.iter().map(|s| return s.name).collect();
}

/// Turn a hit into a match result, enforcing strict mode and logging weak picks.
///
/// # Errors
///
/// Returns `Error::AmbiguousMatch` if the hit was tie-broken and strict mode is on.
fn finish(probe: &Probe<'_>, tag: &str, strategy: &'static str, hit: Hit) -> Result<MatchResult, Error> {
    let ambiguous = !hit.tied.is_empty();
    let line_index = hit.site.line_index;
    let line_number = line_index.saturating_add(1);

    if ambiguous {
        if probe.config.strict {
            return Err(Error::AmbiguousMatch {
                best: line_index,
                confidence: hit.confidence,
                lines: hit.tied,
                tag: tag.to_string(),
            });
        }
        warn!(
            "locate <{tag}> {:?}: {} lines tie, taking line {line_number} via {strategy} ({})",
            probe.fingerprint.key_text,
            hit.tied.len(),
            hit.confidence
        );
    } else {
        debug!("locate <{tag}>: line {line_number} via {strategy} ({})", hit.confidence);
    }

    return Ok(MatchResult {
        ambiguous,
        anchor: hit.anchor,
        confidence: hit.confidence,
        line_index,
        occurrence: hit.site.occurrence,
        strategy,
        tag_name: tag.to_string(),
    });
}

/// Every opening tag named `tag`, line by line.
///
/// # Errors
///
/// Returns `Error::Pattern` if the tag pattern cannot be compiled.
fn collect_sites(tag: &str, lines: &[String]) -> Result<Vec<Site>, Error> {
    let pattern = opening_tag_pattern(tag)?;
    let mut sites = Vec::new();
    for (line_index, line) in lines.iter().enumerate() {
        for (occurrence, span) in opening_tags(&pattern, line).into_iter().enumerate() {
            sites.push(Site { line_index, occurrence, span });
        }
    }
    return Ok(sites);
}

/// Sites whose opening tag carries `name` with exactly `value`, raw or
/// attribute-escaped, each with the attribute text as written.
fn attribute_hits(probe: &Probe<'_>, name: &str, value: &str) -> Vec<(Site, String)> {
    let escaped = escape_attribute(value);
    return probe
        .sites
        .iter()
        .filter_map(|&site| {
            let tag_text = probe.tag_text(site);
            let span = scan_attributes(tag_text).find(tag_text, name)?;
            let found = span.value(tag_text);
            if found != value && found != escaped {
                return None;
            }
            return Some((site, span.text(tag_text).to_string()));
        })
        .collect();
}

/// Narrow attribute hits: unique hit at `unique`, else index by same-tag ordinal at `narrowed`.
fn narrow_attribute_hits(
    probe: &Probe<'_>,
    hits: Vec<(Site, String)>,
    unique: Confidence,
    narrowed: Confidence,
) -> Option<Hit> {
    let (confidence, position) = if hits.len() == 1 {
        (unique, 0)
    } else {
        (narrowed, probe.fingerprint.tag_ordinal())
    };
    let (site, anchor) = hits.into_iter().nth(position)?;
    return Some(Hit { anchor: Some(anchor), confidence, site, tied: Vec::new() });
}

/// The site whose opening tag ends last at or before `offset` on `line_index`.
fn site_before(probe: &Probe<'_>, line_index: usize, offset: usize) -> Option<Site> {
    return probe
        .sites
        .iter()
        .rev()
        .find(|site| return site.line_index == line_index && site.span.end <= offset)
        .copied();
}

// ── Strategies ─────────────────────────────────────────────────────────

/// Tier 1: the tag is opened exactly once in the whole source.
fn sole_candidate(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let [site] = probe.sites.as_slice() else {
        return Ok(None);
    };
    return Ok(Some(Hit { anchor: None, confidence: Confidence::Exact, site: *site, tied: Vec::new() }));
}

/// Tier 2: a unique tag carries the target's id. Duplicate ids fall through.
fn by_id(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let Some(id) = probe.fingerprint.target_id() else {
        return Ok(None);
    };
    let hits = attribute_hits(probe, "id", id);
    let [(site, anchor)] = hits.as_slice() else {
        if hits.len() > 1 {
            debug!("locate: id {id:?} appears on {} tags", hits.len());
        }
        return Ok(None);
    };
    return Ok(Some(Hit {
        anchor: Some(anchor.clone()),
        confidence: Confidence::Exact,
        site: *site,
        tied: Vec::new(),
    }));
}

/// Tier 3: identity attributes in priority order; unique is exact, narrowed is high.
fn by_special_attribute(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let special = &probe.fingerprint.unique_features.special_attributes;
    for name in SPECIAL_ATTRIBUTES {
        let Some(value) = special.get(name).filter(|v| return !v.is_empty()) else {
            continue;
        };
        let hits = attribute_hits(probe, name, value);
        if hits.is_empty() {
            continue;
        }
        if let Some(hit) = narrow_attribute_hits(probe, hits, Confidence::Exact, Confidence::High) {
            return Ok(Some(hit));
        }
    }
    return Ok(None);
}

/// Tier 4: the verbatim class value; unique is high, narrowed is medium.
fn by_class(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let Some(class) = probe.fingerprint.target_class() else {
        return Ok(None);
    };
    let hits = attribute_hits(probe, "class", class);
    if hits.is_empty() {
        return Ok(None);
    }
    return Ok(narrow_attribute_hits(probe, hits, Confidence::High, Confidence::Medium));
}

/// Tier 5: the element's own text, if long enough to be telling. Each
/// occurrence is credited to the nearest same-name opening tag before it.
fn by_direct_text(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let text = probe.fingerprint.unique_features.direct_text.trim();
    if text.chars().count() <= probe.config.min_text_len {
        return Ok(None);
    }
    let escaped = escape_text(text);

    let mut hits: Vec<Site> = Vec::new();
    for &line_index in &probe.candidates {
        let Some(line) = probe.lines.get(line_index) else {
            continue;
        };
        let mut offsets: Vec<usize> = line.match_indices(text).map(|(i, _)| return i).collect();
        if escaped != text {
            offsets.extend(line.match_indices(escaped.as_str()).map(|(i, _)| return i));
            offsets.sort_unstable();
        }
        for offset in offsets {
            let Some(site) = site_before(probe, line_index, offset) else {
                continue;
            };
            let seen = hits
                .iter()
                .any(|hit| return hit.line_index == site.line_index && hit.occurrence == site.occurrence);
            if !seen {
                hits.push(site);
            }
        }
    }

    let Some(&first) = hits.first() else {
        return Ok(None);
    };
    let tied = if hits.len() > 1 {
        let mut lines: Vec<usize> = hits.iter().map(|site| return site.line_index).collect();
        lines.dedup();
        lines
    } else {
        Vec::new()
    };
    return Ok(Some(Hit { anchor: None, confidence: Confidence::Medium, site: first, tied }));
}

/// Tier 6: index straight into the opening tags by same-tag ordinal.
fn by_position(probe: &Probe<'_>) -> Result<Option<Hit>, Error> {
    let Some(&site) = probe.sites.get(probe.fingerprint.tag_ordinal()) else {
        return Ok(None);
    };
    return Ok(Some(Hit {
        anchor: None,
        confidence: Confidence::Low,
        site,
        tied: probe.candidates.clone(),
    }));
}
