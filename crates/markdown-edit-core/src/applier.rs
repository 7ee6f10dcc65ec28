//! C7 TransactionApplier: one linear walk over the document, splicing in
//! each planned operation's replacement text, producing a brand-new byte
//! sequence. Applying is all-or-nothing by construction: the caller only
//! reaches this module once every intent in the batch has resolved
//! successfully and the operations have been checked for overlap, so there
//! is nothing left here that can fail partway through.

use crate::planner::PlannedOperation;

/// Splices `operations` (already sorted by `byte_start`, non-overlapping)
/// into `text`, returning the new document contents.
pub fn apply(text: &str, operations: &[PlannedOperation]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for op in operations {
        out.push_str(&text[cursor..op.byte_start]);
        out.push_str(&op.replacement);
        cursor = op.byte_end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(start: usize, end: usize, replacement: &str) -> PlannedOperation {
        PlannedOperation {
            byte_start: start,
            byte_end: end,
            replacement: replacement.to_string(),
            intent_index: 0,
            priority: 0,
        }
    }

    #[test]
    fn splices_single_operation() {
        let text = "# Intro\n\nold\n";
        let result = apply(text, &[op(9, 13, "new\n")]);
        assert_eq!(result, "# Intro\n\nnew\n");
    }

    #[test]
    fn applies_multiple_non_overlapping_operations_in_order() {
        let text = "AAAABBBBCCCC";
        let result = apply(text, &[op(0, 4, "x"), op(8, 12, "y")]);
        assert_eq!(result, "xBBBBy");
    }

    #[test]
    fn zero_width_operation_inserts_without_consuming() {
        let text = "abc";
        let result = apply(text, &[op(1, 1, "-")]);
        assert_eq!(result, "a-bc");
    }
}
