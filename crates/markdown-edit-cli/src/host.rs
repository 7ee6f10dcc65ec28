//! Filesystem-backed `Host`/`LogSink` and the small path-resolution layer
//! the spec calls out as an external-collaborator concern: `targetFile` is
//! resolved relative to a project root, falling back to a workspace root,
//! the same override-then-default precedence `markdown-doc-config`'s
//! loader uses, scoped down to the two settings this CLI actually needs.

use std::path::{Path, PathBuf};

use markdown_edit_core::{fs::write_atomic, Host, LogSink};

pub struct FileHost {
    pub backup: bool,
}

impl Host for FileHost {
    fn read_document(&self, target_file: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(target_file)
    }

    fn apply_document(&self, target_file: &str, new_contents: &str) -> std::io::Result<()> {
        write_atomic(Path::new(target_file), new_contents, self.backup)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))
    }
}

pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// `project_root` / `workspace_root`: the only two settings path
/// resolution needs. Populated from `--project-root`/`--workspace-root`
/// flags if given, else left unset (`NO_WORKSPACE`).
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub project_root: Option<PathBuf>,
    pub workspace_root: Option<PathBuf>,
}

pub enum ResolvedPath {
    Path(PathBuf),
    NoWorkspace,
    Unsafe,
}

const FORBIDDEN_ROOTS: &[&str] = &["/etc", "/bin", "/sbin", "/usr/bin", "/root"];

fn is_unsafe(path: &Path) -> bool {
    if path.components().any(|c| c.as_os_str() == "..") {
        return true;
    }
    FORBIDDEN_ROOTS
        .iter()
        .any(|root| path.starts_with(root))
}

/// Absolute path wins outright; otherwise resolve relative to the project
/// base dir, then the workspace root, in that order. Any candidate
/// containing `..` or resolving under a system directory is rejected
/// before it ever reaches the filesystem.
pub fn resolve_target_file(raw: &str, config: &WorkspaceConfig) -> ResolvedPath {
    let candidate = Path::new(raw);
    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else if let Some(project_root) = &config.project_root {
        project_root.join(candidate)
    } else if let Some(workspace_root) = &config.workspace_root {
        workspace_root.join(candidate)
    } else {
        return ResolvedPath::NoWorkspace;
    };

    if is_unsafe(&resolved) {
        return ResolvedPath::Unsafe;
    }
    ResolvedPath::Path(resolved)
}
