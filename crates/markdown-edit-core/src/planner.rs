//! C6 EditPlanner: resolves each intent in a batch to a `PlannedOperation`
//! against the pre-edit document snapshot, normalizes replacement content,
//! and orders the result for non-overlapping, in-order application. The
//! sort-then-overlap-check shape is the same one the teacher's
//! `engine::apply_edits` uses on line ranges, generalized here to
//! SID/content-match-resolved byte ranges.

use crate::ast::ByteSpan;
use crate::error::ErrorKind;
use crate::intent::{EditIntent, EditTarget, IntentKind, MatchPosition};
use crate::matcher::{self, MatchDiagnostic};
use crate::parser::LineIndex;
use crate::structure::{SectionTree, ROOT_SID};

#[derive(Debug, Clone)]
pub struct PlannedOperation {
    pub byte_start: usize,
    pub byte_end: usize,
    pub replacement: String,
    pub intent_index: usize,
    pub priority: i64,
}

/// Appends a trailing newline to non-empty replacement text that lacks one.
/// Never touches an empty replacement (a delete has nothing to normalize).
fn normalize_replacement(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}

fn closest_sid(tree: &SectionTree, sid: &str) -> Option<String> {
    tree.all_sids()
        .into_iter()
        .min_by_key(|candidate| levenshtein(candidate, sid))
        .map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let tmp = row[j + 1];
            row[j + 1] = if ca == cb {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j + 1])
            };
            prev = tmp;
        }
    }
    row[b.len()]
}

fn resolve_line_range(
    line_index: &LineIndex,
    body: ByteSpan,
    heading_line: usize,
    body_end_line: usize,
    start_line: usize,
    end_line: usize,
) -> Result<ByteSpan, ErrorKind> {
    if start_line <= heading_line || end_line > body_end_line || start_line > end_line {
        return Err(ErrorKind::LineRangeOutOfSection);
    }
    let start = line_index.line_start_byte(start_line).max(body.start);
    let end = line_index.line_start_byte(end_line + 1).min(body.end);
    Ok(ByteSpan::new(start, end))
}

struct Resolved {
    span: ByteSpan,
    replacement: String,
}

fn resolve_intent(
    tree: &SectionTree,
    line_index: &LineIndex,
    text: &str,
    intent: &EditIntent,
) -> Result<Resolved, ErrorKind> {
    let target: &EditTarget = &intent.target;
    let view = tree.resolve(&target.sid).ok_or_else(|| ErrorKind::SectionNotFound {
        closest_sid: closest_sid(tree, &target.sid),
    })?;

    match intent.kind {
        IntentKind::ReplaceSectionAndTitle => {
            if view.sid == ROOT_SID {
                return Err(ErrorKind::InvalidIntent(
                    "cannot replace heading and title of the document root".into(),
                ));
            }
            Ok(Resolved {
                span: ByteSpan::new(view.heading_byte_span.start, view.body_byte_span.end),
                replacement: normalize_replacement(&intent.content),
            })
        }
        IntentKind::DeleteSectionAndTitle => {
            if view.sid == ROOT_SID {
                return Err(ErrorKind::InvalidIntent(
                    "cannot delete the document root".into(),
                ));
            }
            let mut end = view.body_byte_span.end;
            if text.as_bytes().get(end) == Some(&b'\n') {
                end += 1;
            }
            Ok(Resolved {
                span: ByteSpan::new(view.heading_byte_span.start, end),
                replacement: String::new(),
            })
        }
        IntentKind::ReplaceSectionContentOnly => {
            let span = resolve_content_span(
                line_index,
                text,
                view.body_byte_span,
                view.heading_line,
                view.body_end_line,
                target,
            )?;
            Ok(Resolved {
                span,
                replacement: normalize_replacement(&intent.content),
            })
        }
        IntentKind::DeleteSectionContentOnly => {
            let content_match = target
                .content_match
                .as_ref()
                .ok_or(ErrorKind::ContentMatchRequired)?;
            let body_text = &text[view.body_byte_span.start..view.body_byte_span.end];
            let range = matcher::find_unique(
                body_text,
                &content_match.match_content,
                content_match.context_before.as_deref(),
                content_match.context_after.as_deref(),
            )
            .map_err(diagnostic_to_error)?;
            Ok(Resolved {
                span: ByteSpan::new(
                    view.body_byte_span.start + range.start,
                    view.body_byte_span.start + range.end,
                ),
                replacement: String::new(),
            })
        }
        IntentKind::InsertSectionAndTitle => {
            let position = target
                .insertion_position
                .ok_or_else(|| ErrorKind::InvalidIntent("insertionPosition is required".into()))?;
            let anchor = match position {
                crate::intent::InsertionPosition::Before => view.heading_byte_span.start,
                crate::intent::InsertionPosition::After => view.body_byte_span.end,
                crate::intent::InsertionPosition::Inside => view.body_byte_span.start,
            };
            Ok(Resolved {
                span: ByteSpan::new(anchor, anchor),
                replacement: normalize_replacement(&intent.content),
            })
        }
        IntentKind::InsertSectionContentOnly => {
            let anchor = if let Some(content_match) = &target.content_match {
                let body_text = &text[view.body_byte_span.start..view.body_byte_span.end];
                let range = matcher::find_unique(
                    body_text,
                    &content_match.match_content,
                    content_match.context_before.as_deref(),
                    content_match.context_after.as_deref(),
                )
                .map_err(diagnostic_to_error)?;
                match content_match.position.unwrap_or(MatchPosition::After) {
                    MatchPosition::Before => view.body_byte_span.start + range.start,
                    MatchPosition::After => view.body_byte_span.start + range.end,
                }
            } else if let Some(line_range) = &target.line_range {
                if line_range.start_line != line_range.end_line {
                    return Err(ErrorKind::LineRangeOutOfSection);
                }
                let span = resolve_line_range(
                    line_index,
                    view.body_byte_span,
                    view.heading_line,
                    view.body_end_line,
                    line_range.start_line,
                    line_range.end_line,
                )?;
                span.start
            } else {
                return Err(ErrorKind::InvalidIntent(
                    "insert-section-content-only requires contentMatch or lineRange".into(),
                ));
            };
            Ok(Resolved {
                span: ByteSpan::new(anchor, anchor),
                replacement: normalize_replacement(&intent.content),
            })
        }
    }
}

fn resolve_content_span(
    line_index: &LineIndex,
    text: &str,
    body: ByteSpan,
    heading_line: usize,
    body_end_line: usize,
    target: &EditTarget,
) -> Result<ByteSpan, ErrorKind> {
    if let Some(line_range) = &target.line_range {
        return resolve_line_range(
            line_index,
            body,
            heading_line,
            body_end_line,
            line_range.start_line,
            line_range.end_line,
        );
    }
    if let Some(content_match) = &target.content_match {
        let body_text = &text[body.start..body.end];
        let range = matcher::find_unique(
            body_text,
            &content_match.match_content,
            content_match.context_before.as_deref(),
            content_match.context_after.as_deref(),
        )
        .map_err(diagnostic_to_error)?;
        return Ok(ByteSpan::new(body.start + range.start, body.start + range.end));
    }
    // Neither specified: replace the whole body.
    Ok(body)
}

fn diagnostic_to_error(diag: MatchDiagnostic) -> ErrorKind {
    match diag {
        MatchDiagnostic::NotFound { .. } => ErrorKind::MatchNotFound,
        MatchDiagnostic::MultipleMatches { matches, .. } => ErrorKind::MultipleMatches {
            count: matches.len(),
        },
    }
}

pub struct PlanOutcome {
    pub operations: Vec<PlannedOperation>,
    pub failures: Vec<(usize, ErrorKind)>,
}

/// Processing order: delete-section-and-title intents first (stable within
/// the group, original submission order preserved), then the rest ordered
/// by descending priority with submission order as the tie-break. Each
/// intent resolves independently against the same unmutated document
/// snapshot, so this order affects only the bookkeeping below, not the
/// computed byte ranges.
fn processing_order(intents: &[EditIntent]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..intents.len()).collect();
    order.sort_by(|&a, &b| {
        let a_delete = intents[a].kind == IntentKind::DeleteSectionAndTitle;
        let b_delete = intents[b].kind == IntentKind::DeleteSectionAndTitle;
        b_delete
            .cmp(&a_delete)
            .then_with(|| intents[b].priority.cmp(&intents[a].priority))
            .then_with(|| a.cmp(&b))
    });
    order
}

pub fn plan_batch(
    tree: &SectionTree,
    line_index: &LineIndex,
    text: &str,
    intents: &[EditIntent],
) -> PlanOutcome {
    let mut operations = Vec::new();
    let mut failures = Vec::new();
    // P7 (idempotent deletes): two delete-section-and-title intents on the
    // same SID don't error at validation; the first one to plan wins and
    // every later one on that SID reports SECTION_NOT_FOUND here, rather
    // than resolving to the same byte range and tripping the overlap check.
    let mut deleted_and_titled: std::collections::HashSet<&str> = std::collections::HashSet::new();

    for idx in processing_order(intents) {
        let intent = &intents[idx];
        if intent.kind == IntentKind::DeleteSectionAndTitle
            && !deleted_and_titled.insert(intent.target.sid.as_str())
        {
            failures.push((idx, ErrorKind::SectionNotFound { closest_sid: None }));
            continue;
        }
        match resolve_intent(tree, line_index, text, intent) {
            Ok(resolved) => operations.push(PlannedOperation {
                byte_start: resolved.span.start,
                byte_end: resolved.span.end,
                replacement: resolved.replacement,
                intent_index: idx,
                priority: intent.priority,
            }),
            Err(err) => failures.push((idx, err)),
        }
    }

    // Sorted by start offset; ties broken by priority (descending) then
    // original submission order.
    operations.sort_by(|a, b| {
        a.byte_start
            .cmp(&b.byte_start)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.intent_index.cmp(&b.intent_index))
    });

    if failures.is_empty() {
        if let Some(overlap_at) = find_overlap(&operations) {
            failures.push((
                operations[overlap_at - 1].intent_index,
                ErrorKind::OverlappingEdits,
            ));
            failures.push((
                operations[overlap_at].intent_index,
                ErrorKind::OverlappingEdits,
            ));
            return PlanOutcome {
                operations: Vec::new(),
                failures,
            };
        }
    }

    PlanOutcome {
        operations,
        failures,
    }
}

fn find_overlap(operations: &[PlannedOperation]) -> Option<usize> {
    for i in 1..operations.len() {
        if operations[i].byte_start < operations[i - 1].byte_end {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::EditTarget;
    use crate::parser::parse_document;

    fn simple_intent(sid: &str, kind: IntentKind, content: &str) -> EditIntent {
        EditIntent {
            kind,
            target: EditTarget {
                sid: sid.to_string(),
                line_range: None,
                content_match: None,
                insertion_position: None,
            },
            content: content.to_string(),
            reason: String::new(),
            priority: 0,
            validate_only: false,
        }
    }

    #[test]
    fn plans_single_replace() {
        let text = "# Intro\n\nhello\n\n## Details\n\nworld\n";
        let parsed = parse_document(text.as_bytes());
        let tree = SectionTree::build(&parsed);
        let intents = vec![simple_intent(
            "/intro/details",
            IntentKind::ReplaceSectionContentOnly,
            "updated body",
        )];
        let outcome = plan_batch(&tree, &parsed.line_index, &parsed.text, &intents);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.operations.len(), 1);
        assert_eq!(outcome.operations[0].replacement, "updated body\n");
    }

    #[test]
    fn reports_section_not_found() {
        let text = "# Intro\n";
        let parsed = parse_document(text.as_bytes());
        let tree = SectionTree::build(&parsed);
        let intents = vec![simple_intent(
            "/nope",
            IntentKind::ReplaceSectionContentOnly,
            "x",
        )];
        let outcome = plan_batch(&tree, &parsed.line_index, &parsed.text, &intents);
        assert_eq!(outcome.operations.len(), 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].1, ErrorKind::SectionNotFound { .. }));
    }

    #[test]
    fn second_delete_and_title_on_same_sid_reports_section_not_found_not_overlap() {
        let text = "# Intro\n\nhello\n\n## Gone\n\nbye\n";
        let parsed = parse_document(text.as_bytes());
        let tree = SectionTree::build(&parsed);
        let intents = vec![
            simple_intent("/intro/gone", IntentKind::DeleteSectionAndTitle, ""),
            simple_intent("/intro/gone", IntentKind::DeleteSectionAndTitle, ""),
        ];
        let outcome = plan_batch(&tree, &parsed.line_index, &parsed.text, &intents);
        assert_eq!(outcome.operations.len(), 1, "first delete resolves cleanly");
        assert_eq!(outcome.failures.len(), 1, "only the redundant delete fails");
        assert!(matches!(
            outcome.failures[0].1,
            ErrorKind::SectionNotFound { .. }
        ));
    }
}
