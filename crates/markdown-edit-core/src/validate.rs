//! C5 IntentValidator: per-intent schema checks, run before any section
//! lookup, plus the one batch-level rule that needs the whole batch in view
//! at once (a section can't be both deleted and modified in the same
//! batch).

use crate::error::ErrorKind;
use crate::intent::{EditIntent, IntentKind};

/// Checks the shape of a single intent in isolation: exactly one of
/// `lineRange`/`contentMatch`/`insertionPosition` for the kinds that need
/// one, a non-empty SID, and a sane priority.
pub fn validate_intent_schema(intent: &EditIntent) -> Result<(), ErrorKind> {
    if intent.target.sid.is_empty() {
        return Err(ErrorKind::InvalidIntent("target.sid must not be empty".into()));
    }

    let targeting_methods = [
        intent.target.line_range.is_some(),
        intent.target.content_match.is_some(),
        intent.target.insertion_position.is_some(),
    ]
    .iter()
    .filter(|&&present| present)
    .count();

    if targeting_methods > 1 {
        return Err(ErrorKind::InvalidIntent(
            "at most one of lineRange, contentMatch, insertionPosition may be set".into(),
        ));
    }

    match intent.kind {
        IntentKind::DeleteSectionContentOnly if intent.target.content_match.is_none() => {
            return Err(ErrorKind::ContentMatchRequired);
        }
        IntentKind::InsertSectionContentOnly
            if intent.target.content_match.is_none() && intent.target.line_range.is_none() =>
        {
            return Err(ErrorKind::InvalidIntent(
                "insert-section-content-only requires contentMatch or lineRange".into(),
            ));
        }
        _ => {}
    }

    if intent.priority < 0 {
        return Err(ErrorKind::InvalidIntent("priority must not be negative".into()));
    }

    Ok(())
}

/// Batch-level `DELETE_THEN_MODIFY_SAME_SID` check: a section SID may not
/// be targeted by both a delete intent and a modify (replace/insert)
/// intent within the same batch. Returns the set of SIDs that violate the
/// rule, empty if the batch is clean.
pub fn conflicting_delete_modify_sids(intents: &[EditIntent]) -> std::collections::HashSet<String> {
    use std::collections::HashSet;

    let mut deleted: HashSet<&str> = HashSet::new();
    let mut modified: HashSet<&str> = HashSet::new();

    for intent in intents {
        let sid = intent.target.sid.as_str();
        if intent.kind.is_delete() {
            deleted.insert(sid);
        } else {
            modified.insert(sid);
        }
    }

    deleted
        .intersection(&modified)
        .map(|s| s.to_string())
        .collect()
}

pub fn validate_batch(intents: &[EditIntent]) -> Result<(), ErrorKind> {
    if conflicting_delete_modify_sids(intents).is_empty() {
        Ok(())
    } else {
        Err(ErrorKind::DeleteThenModifySameSid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{ContentMatchSpec, EditTarget};

    fn base_intent(kind: IntentKind) -> EditIntent {
        EditIntent {
            kind,
            target: EditTarget {
                sid: "/intro".into(),
                line_range: None,
                content_match: None,
                insertion_position: None,
            },
            content: "hello\n".into(),
            reason: String::new(),
            priority: 0,
            validate_only: false,
        }
    }

    #[test]
    fn rejects_missing_content_match_for_delete_content_only() {
        let intent = base_intent(IntentKind::DeleteSectionContentOnly);
        assert_eq!(
            validate_intent_schema(&intent),
            Err(ErrorKind::ContentMatchRequired)
        );
    }

    #[test]
    fn rejects_multiple_targeting_methods() {
        let mut intent = base_intent(IntentKind::ReplaceSectionContentOnly);
        intent.target.content_match = Some(ContentMatchSpec {
            match_content: "x".into(),
            context_before: None,
            context_after: None,
            position: None,
        });
        intent.target.line_range = Some(crate::intent::LineRange {
            start_line: 1,
            end_line: 2,
        });
        assert!(validate_intent_schema(&intent).is_err());
    }

    #[test]
    fn rejects_delete_then_modify_same_sid() {
        let intents = vec![
            base_intent(IntentKind::DeleteSectionAndTitle),
            base_intent(IntentKind::ReplaceSectionContentOnly),
        ];
        assert_eq!(
            validate_batch(&intents),
            Err(ErrorKind::DeleteThenModifySameSid)
        );
    }

    #[test]
    fn allows_distinct_sids() {
        let mut second = base_intent(IntentKind::ReplaceSectionContentOnly);
        second.target.sid = "/other".into();
        let intents = vec![base_intent(IntentKind::DeleteSectionAndTitle), second];
        assert!(validate_batch(&intents).is_ok());
    }
}
