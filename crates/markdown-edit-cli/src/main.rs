mod host;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use markdown_edit_core::{analyze_structure, execute_batch, EditBatch, ExitCode};

use host::{resolve_target_file, FileHost, ResolvedPath, TracingLogSink, WorkspaceConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "SID-addressed markdown structure and edit engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base directory a relative target file is resolved against first
    #[arg(long = "project-root", global = true, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Fallback base directory if --project-root is not set
    #[arg(long = "workspace-root", global = true, value_name = "DIR")]
    workspace_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a document and print its table of contents as JSON
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Emit the trimmed ToC (no line/content-classification metadata)
        #[arg(long)]
        trimmed: bool,
    },
    /// Apply a batch of SID-targeted edit intents, read from a JSON file
    Apply {
        /// Markdown file the batch targets
        #[arg(value_name = "FILE")]
        file: String,

        /// JSON file containing an array of edit intents
        #[arg(long = "batch", value_name = "PATH")]
        batch: PathBuf,

        /// Skip writing a .bak copy of the file before overwriting it
        #[arg(long = "no-backup")]
        no_backup: bool,
    },
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(code) => std::process::ExitCode::from(code as u8),
    }
}

fn run(cli: Cli) -> Result<ExitCode, ExitCode> {
    let config = WorkspaceConfig {
        project_root: cli.project_root.clone(),
        workspace_root: cli.workspace_root.clone(),
    };

    match cli.command {
        Command::Analyze { file, trimmed } => run_analyze(&file, &config, trimmed),
        Command::Apply {
            file,
            batch,
            no_backup,
        } => run_apply(&file, &batch, &config, !no_backup),
    }
}

fn resolve_or_fail(raw: &str, config: &WorkspaceConfig) -> Result<PathBuf, ExitCode> {
    match resolve_target_file(raw, config) {
        ResolvedPath::Path(path) => Ok(path),
        ResolvedPath::NoWorkspace => {
            eprintln!(
                "'{raw}' is a relative path but neither --project-root nor --workspace-root was given"
            );
            Err(ExitCode::InvalidBatch)
        }
        ResolvedPath::Unsafe => {
            eprintln!("'{raw}' resolves outside any permitted root");
            Err(ExitCode::InvalidBatch)
        }
    }
}

fn run_analyze(file: &std::path::Path, config: &WorkspaceConfig, trimmed: bool) -> Result<ExitCode, ExitCode> {
    let resolved = resolve_or_fail(&file.to_string_lossy(), config)?;
    let bytes = std::fs::read(&resolved).map_err(|err| {
        eprintln!("failed to read {}: {err}", resolved.display());
        ExitCode::Io
    })?;

    let analysis = analyze_structure(&bytes);
    let json = if trimmed {
        serde_json::to_string_pretty(&analysis.toc_trimmed)
    } else {
        serde_json::to_string_pretty(&analysis.toc)
    }
    .expect("table of contents always serializes");

    println!("{json}");
    for warning in &analysis.warnings {
        eprintln!("{warning}");
    }
    Ok(ExitCode::Success)
}

fn run_apply(
    file: &str,
    batch_path: &std::path::Path,
    config: &WorkspaceConfig,
    backup: bool,
) -> Result<ExitCode, ExitCode> {
    let resolved = resolve_or_fail(file, config)?;
    let resolved_str = resolved.to_string_lossy().into_owned();

    let batch_bytes = std::fs::read(batch_path).map_err(|err| {
        eprintln!("failed to read batch file {}: {err}", batch_path.display());
        ExitCode::Io
    })?;
    let batch: EditBatch = serde_json::from_slice(&batch_bytes).map_err(|err| {
        eprintln!("invalid edit batch JSON: {err}");
        ExitCode::InvalidBatch
    })?;

    let host = FileHost { backup };
    let log = TracingLogSink;

    let result = execute_batch(&host, &log, &resolved_str, &batch.intents).map_err(|err| {
        eprintln!("{err}");
        ExitCode::Io
    })?;

    let json = serde_json::to_string_pretty(&result).expect("batch result always serializes");
    println!("{json}");

    if result.success {
        Ok(ExitCode::Success)
    } else {
        let worst = result
            .failed_intents
            .iter()
            .map(|f| ExitCode::from_error_code(&f.error_kind))
            .max_by_key(|code| *code as u8)
            .unwrap_or(ExitCode::Validation);
        Err(worst)
    }
}
