//! Error surface: the public `ErrorKind` enum callers see inside a
//! `FailedIntent`/`BatchResult`, and the internal `EditError` the engine's
//! own functions return. Keeps the teacher's `ExitCode` discriminant for the
//! CLI's process exit status, mapped from `ErrorKind` instead of the
//! teacher's original five cases.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// Error codes a `FailedIntent` or whole-batch rejection can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    SectionNotFound { closest_sid: Option<String> },
    MatchNotFound,
    MultipleMatches { count: usize },
    LineRangeOutOfSection,
    ContentMatchRequired,
    OverlappingEdits,
    DeleteThenModifySameSid,
    ApplyEditFailed,
    UnsafePath,
    NoWorkspace,
    Cancelled,
    /// Schema-shape violations the rest of the table doesn't name: a
    /// missing `target.sid`, more than one of
    /// `lineRange`/`contentMatch`/`insertionPosition` supplied, or an
    /// out-of-range `priority`. Mirrors the teacher's own
    /// `EditError::Validation(String)` catch-all.
    InvalidIntent(String),
    Io(String),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionNotFound { closest_sid } => match closest_sid {
                Some(sid) => write!(f, "section not found (did you mean {sid}?)"),
                None => write!(f, "section not found"),
            },
            Self::MatchNotFound => write!(f, "no matching content found in section"),
            Self::MultipleMatches { count } => {
                write!(f, "content match is ambiguous ({count} matches)")
            }
            Self::LineRangeOutOfSection => write!(f, "line range falls outside the target section"),
            Self::ContentMatchRequired => write!(f, "contentMatch is required for this intent kind"),
            Self::OverlappingEdits => write!(f, "edit overlaps another edit in the same batch"),
            Self::DeleteThenModifySameSid => {
                write!(f, "batch both deletes and modifies the same section")
            }
            Self::ApplyEditFailed => write!(f, "host refused the atomic apply"),
            Self::UnsafePath => write!(f, "targetFile resolves outside any permitted root"),
            Self::NoWorkspace => write!(
                f,
                "targetFile is relative but neither a project root nor a workspace root is known"
            ),
            Self::Cancelled => write!(f, "batch cancelled before commit"),
            Self::InvalidIntent(msg) => write!(f, "invalid intent: {msg}"),
            Self::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl ErrorKind {
    /// The `SCREAMING_SNAKE_CASE` code spec.md's error table names, used for
    /// `failedIntents[*].errorKind` independent of the `errorMessage` text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SectionNotFound { .. } => "SECTION_NOT_FOUND",
            Self::MatchNotFound => "MATCH_NOT_FOUND",
            Self::MultipleMatches { .. } => "MULTIPLE_MATCHES",
            Self::LineRangeOutOfSection => "LINE_RANGE_OUT_OF_SECTION",
            Self::ContentMatchRequired => "CONTENT_MATCH_REQUIRED",
            Self::OverlappingEdits => "OVERLAPPING_EDITS",
            Self::DeleteThenModifySameSid => "DELETE_THEN_MODIFY_SAME_SID",
            Self::ApplyEditFailed => "APPLY_EDIT_FAILED",
            Self::UnsafePath => "UNSAFE_PATH",
            Self::NoWorkspace => "NO_WORKSPACE",
            Self::Cancelled => "CANCELLED",
            Self::InvalidIntent(_) => "INVALID_INTENT",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    SectionNotFound = 1,
    AmbiguousMatch = 2,
    InvalidBatch = 3,
    Io = 4,
    ContentRejected = 5,
    Validation = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::SectionNotFound),
            2 => Some(Self::AmbiguousMatch),
            3 => Some(Self::InvalidBatch),
            4 => Some(Self::Io),
            5 => Some(Self::ContentRejected),
            6 => Some(Self::Validation),
            _ => None,
        }
    }

    /// Inverse of [`ErrorKind::code`], for hosts (like the CLI) that only
    /// have the serialized `errorKind` string left to look at.
    pub fn from_error_code(code: &str) -> Self {
        match code {
            "SECTION_NOT_FOUND" => Self::SectionNotFound,
            "MATCH_NOT_FOUND" | "MULTIPLE_MATCHES" => Self::AmbiguousMatch,
            "LINE_RANGE_OUT_OF_SECTION" | "CONTENT_MATCH_REQUIRED" => Self::ContentRejected,
            "OVERLAPPING_EDITS" | "DELETE_THEN_MODIFY_SAME_SID" | "APPLY_EDIT_FAILED"
            | "CANCELLED" => Self::Validation,
            "IO_ERROR" => Self::Io,
            _ => Self::InvalidBatch,
        }
    }
}

impl ErrorKind {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::SectionNotFound { .. } => ExitCode::SectionNotFound,
            Self::MatchNotFound | Self::MultipleMatches { .. } => ExitCode::AmbiguousMatch,
            Self::LineRangeOutOfSection | Self::ContentMatchRequired => ExitCode::ContentRejected,
            Self::OverlappingEdits
            | Self::DeleteThenModifySameSid
            | Self::ApplyEditFailed
            | Self::Cancelled => ExitCode::Validation,
            Self::InvalidIntent(_) | Self::UnsafePath | Self::NoWorkspace => ExitCode::InvalidBatch,
            Self::Io(_) => ExitCode::Io,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("{0}")]
    Kind(ErrorKind),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("batch rejected: {0}")]
    BatchRejected(ErrorKind),
}

pub type EditResult<T> = Result<T, EditError>;
