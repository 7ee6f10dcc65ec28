//! C8 EditEngineFacade: the one public entry point a host drives. Wires C2
//! through C7 together, and defines the `Host`/`LogSink` trait boundary
//! that keeps the core free of any filesystem assumption — the same split
//! the teacher's `main.rs` draws informally between `handle_success`/
//! `handle_error` and the engine functions they call, made explicit here as
//! traits so any host (not just the bundled CLI) can drive the engine.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::applier;
use crate::error::{EditError, ErrorKind};
use crate::intent::{AppliedIntent, BatchMetadata, BatchResult, EditIntent, FailedIntent};
use crate::parser::parse_document;
use crate::planner::plan_batch;
use crate::structure::SectionTree;
use crate::toc::{build_toc, trim_toc, ToCNode, ToCNodeTrimmed};
use crate::validate::{conflicting_delete_modify_sids, validate_intent_schema};

/// A document source and sink. The bundled CLI implements this over the
/// filesystem; any other host (an editor extension, a test harness) only
/// needs to implement this trait to drive the engine.
pub trait Host {
    fn read_document(&self, target_file: &str) -> std::io::Result<Vec<u8>>;
    fn apply_document(&self, target_file: &str, new_contents: &str) -> std::io::Result<()>;
}

/// Audit-relevant log events the host may want to intercept, separate from
/// the engine's own `tracing` diagnostics.
pub trait LogSink {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

pub struct AnalyzeResult {
    pub toc: Vec<ToCNode>,
    pub toc_trimmed: Vec<ToCNodeTrimmed>,
    pub warnings: Vec<String>,
}

/// C2 + C3: parse a document and return its table of contents, without
/// touching any host at all (used by read-only "analyze structure" calls).
pub fn analyze_structure(bytes: &[u8]) -> AnalyzeResult {
    let parsed = parse_document(bytes);
    let tree = SectionTree::build(&parsed);
    let toc = build_toc(&tree, &parsed.utf16_index);
    let toc_trimmed = trim_toc(&toc);
    AnalyzeResult {
        toc,
        toc_trimmed,
        warnings: parsed.warnings,
    }
}

fn suggestion_for(error: &ErrorKind) -> String {
    match error {
        ErrorKind::SectionNotFound { closest_sid: Some(sid) } => {
            format!("did you mean \"{sid}\"?")
        }
        ErrorKind::SectionNotFound { closest_sid: None } => {
            "check the SID against the document's table of contents".to_string()
        }
        ErrorKind::MatchNotFound => {
            "narrow or correct matchContent; it must appear verbatim in the section body".to_string()
        }
        ErrorKind::MultipleMatches { .. } => {
            "add contextBefore/contextAfter to disambiguate which occurrence to target".to_string()
        }
        ErrorKind::LineRangeOutOfSection => {
            "lineRange must fall strictly inside the target section's body".to_string()
        }
        ErrorKind::ContentMatchRequired => {
            "provide target.contentMatch for this intent kind".to_string()
        }
        ErrorKind::OverlappingEdits => {
            "split the batch so no two intents touch the same byte range".to_string()
        }
        ErrorKind::DeleteThenModifySameSid => {
            "remove either the delete or the modify intent for this SID".to_string()
        }
        ErrorKind::ApplyEditFailed => {
            "retry the batch; if it persists, check the host's write permissions".to_string()
        }
        ErrorKind::UnsafePath => {
            "targetFile must resolve under the project or workspace root".to_string()
        }
        ErrorKind::NoWorkspace => {
            "pass an absolute targetFile, or configure a project/workspace root".to_string()
        }
        ErrorKind::Cancelled => "resubmit the batch".to_string(),
        ErrorKind::InvalidIntent(msg) => msg.clone(),
        ErrorKind::Io(msg) => msg.clone(),
    }
}

fn unix_millis_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn metadata_for(
    started: Instant,
    document_utf16_length: usize,
    conflict_rule: Option<&str>,
) -> BatchMetadata {
    BatchMetadata {
        execution_millis: started.elapsed().as_millis(),
        document_utf16_length,
        timestamp_unix_millis: unix_millis_now(),
        conflict_rule: conflict_rule.map(str::to_string),
    }
}

/// C5-C7: validate, plan, and apply one batch of intents against
/// `target_file`, reading and writing it through `host`. Atomic: on any
/// failure the document is left byte-identical to how `host` returned it.
pub fn execute_batch(
    host: &dyn Host,
    log: &dyn LogSink,
    target_file: &str,
    intents: &[EditIntent],
) -> Result<BatchResult, EditError> {
    let started = Instant::now();
    tracing::debug!(target_file, intents = intents.len(), "executing edit batch");

    let bytes = host.read_document(target_file).map_err(EditError::Io)?;
    let parsed = parse_document(&bytes);
    let utf16_len = parsed.text.encode_utf16().count();

    let mut failed: Vec<FailedIntent> = Vec::new();
    for intent in intents {
        if let Err(err) = validate_intent_schema(intent) {
            let suggestion = suggestion_for(&err);
            failed.push(FailedIntent::new(intent.clone(), err, suggestion));
        }
    }
    if !failed.is_empty() {
        log.warn("batch rejected: one or more intents failed schema validation");
        let metadata = metadata_for(started, utf16_len, None);
        return Ok(BatchResult::rejected(
            intents.len(),
            failed,
            parsed.warnings,
            metadata,
        ));
    }

    let conflicts = conflicting_delete_modify_sids(intents);
    if !conflicts.is_empty() {
        log.warn("batch rejected: delete and modify both target the same section");
        let failed = intents
            .iter()
            .filter(|intent| conflicts.contains(&intent.target.sid))
            .map(|intent| {
                let suggestion = suggestion_for(&ErrorKind::DeleteThenModifySameSid);
                FailedIntent::new(intent.clone(), ErrorKind::DeleteThenModifySameSid, suggestion)
            })
            .collect();
        let metadata = metadata_for(started, utf16_len, Some("DELETE_THEN_MODIFY_SAME_SID"));
        return Ok(BatchResult::rejected(
            intents.len(),
            failed,
            parsed.warnings,
            metadata,
        ));
    }

    let tree = SectionTree::build(&parsed);
    let outcome = plan_batch(&tree, &parsed.line_index, &parsed.text, intents);

    if !outcome.failures.is_empty() {
        log.warn("batch rejected: one or more intents failed to resolve");
        let failed = outcome
            .failures
            .into_iter()
            .map(|(idx, err)| {
                let suggestion = suggestion_for(&err);
                FailedIntent::new(intents[idx].clone(), err, suggestion)
            })
            .collect();
        let metadata = metadata_for(started, utf16_len, None);
        return Ok(BatchResult::rejected(
            intents.len(),
            failed,
            parsed.warnings,
            metadata,
        ));
    }

    let new_contents = applier::apply(&parsed.text, &outcome.operations);
    host.apply_document(target_file, &new_contents).map_err(|io_err| {
        log.warn("host refused the atomic apply");
        EditError::Io(io_err)
    })?;

    log.info(&format!(
        "applied {} intent(s) to {target_file}",
        outcome.operations.len()
    ));

    let applied = outcome
        .operations
        .iter()
        .map(|op| AppliedIntent {
            index: op.intent_index,
            sid: intents[op.intent_index].target.sid.clone(),
        })
        .collect();

    let metadata = metadata_for(started, utf16_len, None);
    Ok(BatchResult::applied(
        intents.len(),
        applied,
        parsed.warnings,
        metadata,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{EditTarget, IntentKind};
    use std::cell::RefCell;

    struct MemoryHost {
        contents: RefCell<Vec<u8>>,
    }

    impl Host for MemoryHost {
        fn read_document(&self, _target_file: &str) -> std::io::Result<Vec<u8>> {
            Ok(self.contents.borrow().clone())
        }

        fn apply_document(&self, _target_file: &str, new_contents: &str) -> std::io::Result<()> {
            *self.contents.borrow_mut() = new_contents.as_bytes().to_vec();
            Ok(())
        }
    }

    fn intent(sid: &str, kind: IntentKind, content: &str) -> EditIntent {
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
    fn applies_successful_batch_and_rewrites_host_contents() {
        let host = MemoryHost {
            contents: RefCell::new(b"# Intro\n\nold body\n".to_vec()),
        };
        let log = NullLogSink;
        let intents = vec![intent(
            "/intro",
            IntentKind::ReplaceSectionContentOnly,
            "new body",
        )];
        let result = execute_batch(&host, &log, "doc.md", &intents).unwrap();
        assert!(result.success);
        assert_eq!(
            String::from_utf8(host.contents.borrow().clone()).unwrap(),
            "# Intro\n\nnew body\n"
        );
    }

    #[test]
    fn leaves_document_untouched_on_rejected_batch() {
        let original = b"# Intro\n\nold body\n".to_vec();
        let host = MemoryHost {
            contents: RefCell::new(original.clone()),
        };
        let log = NullLogSink;
        let intents = vec![intent(
            "/does-not-exist",
            IntentKind::ReplaceSectionContentOnly,
            "new body",
        )];
        let result = execute_batch(&host, &log, "doc.md", &intents).unwrap();
        assert!(!result.success);
        assert_eq!(*host.contents.borrow(), original);
    }
}
