pub mod applier;
pub mod ast;
pub mod error;
pub mod facade;
pub mod fs;
pub mod intent;
pub mod matcher;
pub mod parser;
pub mod planner;
pub mod slug;
pub mod structure;
pub mod toc;
pub mod validate;

pub use error::{EditError, ErrorKind, ExitCode};
pub use facade::{analyze_structure, execute_batch, AnalyzeResult, Host, LogSink, NullLogSink};
pub use intent::{
    AppliedIntent, BatchMetadata, BatchResult, ContentMatchSpec, EditBatch, EditIntent,
    EditTarget, FailedIntent, InsertionPosition, IntentKind, LineRange, MatchPosition,
};
pub use parser::{parse_document, LineIndex, ParsedDocument, Utf16Index};
pub use structure::{Section, SectionTree, ROOT_SID};
pub use toc::{build_toc, trim_toc, ToCNode, ToCNodeTrimmed};
