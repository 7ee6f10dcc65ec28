//! C4 ContentMatcher: locate a literal content match inside a section body,
//! with optional context windows to disambiguate repeated text, and
//! diagnostics (not-found / multiple-matches) good enough to point a caller
//! at a fix without ever reaching for a regex engine.
//!
//! Matching is literal substring search (`str::match_indices`), which is
//! the Non-goal-compliant equivalent of the teacher's closest-match idiom
//! (`markdown-doc-ops/src/lint.rs` uses `strsim::normalized_levenshtein` to
//! suggest a near-miss anchor); here the "did you mean" hint is a
//! hand-rolled bigram Jaccard score instead, since the corpus of candidate
//! lines is always local to one section body.

use std::collections::HashSet;

const PREVIEW_MAX_BYTES: usize = 300;
const CONTEXT_WINDOW_SLACK: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub range: MatchRange,
    pub line: usize,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub enum MatchDiagnostic {
    NotFound {
        preview: String,
        did_you_mean: Option<String>,
    },
    MultipleMatches {
        matches: Vec<MatchInfo>,
        suggested_context: Option<(String, String)>,
    },
}

fn safe_prefix(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn line_number_at(body: &str, byte_offset: usize) -> usize {
    body.as_bytes()[..byte_offset].iter().filter(|&&b| b == b'\n').count() + 1
}

fn line_snippet(body: &str, byte_offset: usize) -> String {
    let line_start = body[..byte_offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = body[byte_offset..]
        .find('\n')
        .map(|i| byte_offset + i)
        .unwrap_or(body.len());
    body[line_start..line_end].to_string()
}

fn context_window_contains(body: &str, start: usize, end: usize, before: bool, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let window = if before {
        let window_start = start.saturating_sub(needle.len() + CONTEXT_WINDOW_SLACK);
        let window_start = floor_char_boundary(body, window_start);
        &body[window_start..start.min(body.len())]
    } else {
        let window_end = (end + needle.len() + CONTEXT_WINDOW_SLACK).min(body.len());
        let window_end = ceil_char_boundary(body, window_end);
        &body[end.min(body.len())..window_end]
    };
    window.contains(needle)
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 {
        return chars.iter().map(|&c| (c, '\0')).collect();
    }
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn jaccard(a: &HashSet<(char, char)>, b: &HashSet<(char, char)>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

const DID_YOU_MEAN_THRESHOLD: f64 = 0.5;

fn did_you_mean(body: &str, needle: &str) -> Option<String> {
    let needle_bigrams = bigrams(needle);
    body.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| (l, jaccard(&needle_bigrams, &bigrams(l))))
        .filter(|(_, score)| *score >= DID_YOU_MEAN_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(l, _)| l.to_string())
}

/// Finds the unique occurrence of `match_content` in `body`, optionally
/// constrained by literal context windows immediately surrounding it.
pub fn find_unique(
    body: &str,
    match_content: &str,
    context_before: Option<&str>,
    context_after: Option<&str>,
) -> Result<MatchRange, MatchDiagnostic> {
    if match_content.is_empty() {
        return Err(MatchDiagnostic::NotFound {
            preview: safe_prefix(body, PREVIEW_MAX_BYTES).to_string(),
            did_you_mean: None,
        });
    }

    let mut candidates: Vec<MatchRange> = body
        .match_indices(match_content)
        .map(|(start, matched)| MatchRange {
            start,
            end: start + matched.len(),
        })
        .filter(|range| {
            context_before
                .map(|c| context_window_contains(body, range.start, range.end, true, c))
                .unwrap_or(true)
                && context_after
                    .map(|c| context_window_contains(body, range.start, range.end, false, c))
                    .unwrap_or(true)
        })
        .collect();

    match candidates.len() {
        0 => Err(MatchDiagnostic::NotFound {
            preview: safe_prefix(body, PREVIEW_MAX_BYTES).to_string(),
            did_you_mean: did_you_mean(body, match_content),
        }),
        1 => Ok(candidates.remove(0)),
        _ => {
            let matches = candidates
                .iter()
                .map(|r| MatchInfo {
                    range: r.clone(),
                    line: line_number_at(body, r.start),
                    snippet: line_snippet(body, r.start),
                })
                .collect::<Vec<_>>();
            let first = &candidates[0];
            let suggested_context = {
                let before_line = if first.start > 0 {
                    Some(line_snippet(body, first.start.saturating_sub(1)))
                } else {
                    None
                };
                let after_line = if first.end < body.len() {
                    Some(line_snippet(body, first.end))
                } else {
                    None
                };
                match (before_line, after_line) {
                    (Some(b), Some(a)) => Some((b, a)),
                    _ => None,
                }
            };
            Err(MatchDiagnostic::MultipleMatches {
                matches,
                suggested_context,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_single_match() {
        let body = "alpha\nbeta\ngamma\n";
        let result = find_unique(body, "beta", None, None).unwrap();
        assert_eq!(result, MatchRange { start: 6, end: 10 });
    }

    #[test]
    fn disambiguates_with_context() {
        let body = "x\nfoo\ntarget\nbar\ny\nfoo\ntarget\nbaz\n";
        let result = find_unique(body, "target", Some("bar"), None);
        assert!(matches!(result, Err(MatchDiagnostic::MultipleMatches { .. })));
        let result = find_unique(body, "target", None, Some("baz"));
        assert!(result.is_ok());
    }

    #[test]
    fn not_found_offers_did_you_mean() {
        let body = "The quick brown fox jumps over the lazy dog\n";
        let diag = find_unique(body, "The quikc brown fox", None, None).unwrap_err();
        match diag {
            MatchDiagnostic::NotFound { did_you_mean, .. } => assert!(did_you_mean.is_some()),
            _ => panic!("expected NotFound"),
        }
    }
}
