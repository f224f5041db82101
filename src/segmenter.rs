use once_cell::sync::Lazy;
use regex::Regex;

use crate::shapes::Shape;

pub(crate) static BETWEEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bbetween\b").unwrap());

/// Shortest clause worth handing to the clause parser.
const MIN_CLAUSE_CHARS: usize = 3;

/// Split one "and"-free part of the input into candidate clauses.
///
/// Commas are not reliable separators because a rep list uses them too, so
/// boundaries are found by recognizing where a complete shape ends. At every
/// position the shapes are tried against the start of the remaining text; if
/// none fits, one character moves into a skip buffer and the next position is
/// tried. Skipped text is prepended to the next recognized span, and whatever
/// is left at the end becomes a final (usually unparseable) candidate.
#[must_use]
pub fn segment(part: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut skipped = String::new();
    let mut rest = part;

    while !rest.is_empty() {
        let matched = Shape::PRIORITY
            .iter()
            .find_map(|shape| shape.prefix_len(rest));

        if let Some(len) = matched {
            let (span, tail) = rest.split_at(len);
            let span = span.trim_end();
            skipped.push_str(span.strip_suffix(',').unwrap_or(span));
            candidates.push(std::mem::take(&mut skipped));
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                skipped.push(c);
            }
            rest = chars.as_str();
        }
    }

    if !skipped.is_empty() {
        candidates.push(skipped);
    }

    candidates
        .into_iter()
        .filter_map(|c| clean_clause(&c))
        .collect()
}

/// Remove the "between" marker and drop fragments too short to mean anything.
fn clean_clause(candidate: &str) -> Option<String> {
    let stripped = BETWEEN_RE.replace_all(candidate, "");
    let trimmed = stripped.trim();
    if trimmed.chars().count() < MIN_CLAUSE_CHARS {
        tracing::trace!(fragment = %candidate, "dropping short fragment");
        return None;
    }
    Some(trimmed.to_string())
}
