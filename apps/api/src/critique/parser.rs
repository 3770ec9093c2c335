//! Section grammar for the model's free-text critique reply.
//!
//! The reply is split by scanning lines against a fixed table of recognized
//! headings. Every section is optional, sections may appear in any order,
//! and the first occurrence of a heading wins. A reply with no recognizable
//! structure parses to an empty `Critique`; the caller always keeps the raw
//! reply alongside, so the client is never left with nothing.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Rating,
    Suggestions,
    KeywordGaps,
    ImprovedSummary,
    ImprovedBullets,
    PriorityFixes,
}

const SECTION_COUNT: usize = 6;

/// Recognized headings, matched case-insensitively at the start of a line.
/// A heading is the label, an optional `(...)` qualifier (e.g.
/// `(comma-separated)`, `(10/10)`), and a `:` or `-` separator. Text after
/// the separator is the first line of the section body.
const HEADINGS: &[(Section, &str)] = &[
    (Section::Rating, "rating"),
    (Section::Suggestions, "suggestions"),
    (Section::KeywordGaps, "keyword gaps"),
    (Section::ImprovedSummary, "improved summary"),
    (Section::ImprovedBullets, "improved bullet examples"),
    (Section::PriorityFixes, "priority fix order"),
];

/// Best-effort structured view of a critique reply. Every field is optional;
/// a missing section is valid and simply stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Critique {
    pub rating: Option<String>,
    pub suggestions: Option<String>,
    pub keyword_gaps: Option<String>,
    pub improved_summary: Option<String>,
    pub improved_bullets: Option<String>,
    pub priority_fixes: Option<String>,
}

/// Parses a critique reply into named sections.
pub fn parse_critique(text: &str) -> Critique {
    let mut bodies: [Option<Vec<String>>; SECTION_COUNT] = Default::default();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        if let Some((section, remainder)) = match_heading(line) {
            let idx = section as usize;
            if bodies[idx].is_none() {
                let mut body = Vec::new();
                if !remainder.trim().is_empty() {
                    body.push(remainder.trim().to_string());
                }
                bodies[idx] = Some(body);
                current = Some(idx);
            } else {
                // Repeated heading: the first occurrence wins and the
                // duplicate's body is discarded.
                current = None;
            }
            continue;
        }
        if let Some(idx) = current {
            if let Some(body) = bodies[idx].as_mut() {
                body.push(line.to_string());
            }
        }
    }

    Critique {
        rating: bodies[Section::Rating as usize]
            .as_deref()
            .and_then(leading_rating),
        suggestions: bodies[Section::Suggestions as usize]
            .as_deref()
            .and_then(clean_section),
        keyword_gaps: bodies[Section::KeywordGaps as usize]
            .as_deref()
            .and_then(normalized_keywords),
        improved_summary: bodies[Section::ImprovedSummary as usize]
            .as_deref()
            .and_then(clean_section),
        improved_bullets: bodies[Section::ImprovedBullets as usize]
            .as_deref()
            .and_then(clean_section),
        priority_fixes: bodies[Section::PriorityFixes as usize]
            .as_deref()
            .and_then(clean_section),
    }
}

fn match_heading(line: &str) -> Option<(Section, &str)> {
    let trimmed = line.trim_start();
    for &(section, label) in HEADINGS {
        if let Some(rest) = strip_prefix_ignore_ascii_case(trimmed, label) {
            if let Some(remainder) = strip_heading_tail(rest) {
                return Some((section, remainder));
            }
        }
    }
    None
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// After the label: optional spaces, an optional `(...)` qualifier, optional
/// spaces, then a required `:` or `-` separator. Requiring the separator keeps
/// prose like "suggestions were vague" from being mistaken for a heading.
fn strip_heading_tail(rest: &str) -> Option<&str> {
    let mut s = rest.trim_start();
    if let Some(after_open) = s.strip_prefix('(') {
        let close = after_open.find(')')?;
        s = after_open[close + 1..].trim_start();
    }
    s.strip_prefix(':').or_else(|| s.strip_prefix('-'))
}

/// Rating value: the leading one- or two-digit number of the first non-empty
/// body line. "8/10" yields "8"; a non-numeric body or a longer run of
/// digits yields nothing.
fn leading_rating(body: &[String]) -> Option<String> {
    let line = body.iter().find(|l| !l.trim().is_empty())?;
    let digits: String = line
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() || digits.len() > 2 {
        None
    } else {
        Some(digits)
    }
}

/// Keyword gaps: the first non-empty body line, with comma spacing normalized
/// to `", "` and empty entries dropped.
fn normalized_keywords(body: &[String]) -> Option<String> {
    let line = body.iter().find(|l| !l.trim().is_empty())?;
    let keywords: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        None
    } else {
        Some(keywords.join(", "))
    }
}

/// Joins body lines, trimming the ends and collapsing runs of blank lines to
/// a single blank line. An all-blank body yields nothing.
fn clean_section(body: &[String]) -> Option<String> {
    let mut out: Vec<&str> = Vec::new();
    let mut blanks = 0usize;
    for line in body {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks == 1 {
                out.push("");
            }
        } else {
            blanks = 0;
            out.push(line.trim_end());
        }
    }
    while out.first() == Some(&"") {
        out.remove(0);
    }
    while out.last() == Some(&"") {
        out.pop();
    }
    if out.is_empty() {
        None
    } else {
        Some(out.join("\n"))
    }
}
