#![deny(missing_docs)]

//! # Check Command
//!
//! Loads a workspace and prints either its diagnostics or a short summary.

use std::io::Write;
use std::path::PathBuf;

use fern_loader_core::{
    load_api_workspace, ListMergePolicy, LoaderOptions, Workspace, WorkspaceDefinition,
    WorkspaceLoadResult,
};

use crate::error::CliResult;

/// Arguments shared by every command that loads a workspace.
#[derive(clap::Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Workspace root (contains `definition/` or `openapi/`).
    #[clap(default_value = ".")]
    pub workspace: PathBuf,

    /// Name to record on the loaded workspace.
    #[clap(long)]
    pub workspace_name: Option<String>,

    /// How list fields in package markers combine with inherited values.
    #[clap(long, env = "FERN_LOADER_LIST_MERGE", default_value = "concatenate")]
    pub list_merge: ListMergePolicy,

    /// Worker threads used for parsing.
    #[clap(long)]
    pub threads: Option<usize>,
}

impl WorkspaceArgs {
    /// Loader options derived from the flags.
    pub fn options(&self) -> LoaderOptions {
        LoaderOptions {
            list_merge_policy: self.list_merge,
            parse_threads: self.threads,
            ..LoaderOptions::default()
        }
    }

    /// Loads the workspace.
    pub fn load(&self) -> WorkspaceLoadResult {
        load_api_workspace(&self.workspace, self.workspace_name.clone(), &self.options())
    }
}

/// Output format for `check`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per diagnostic.
    #[default]
    Text,
    /// The diagnostics as a JSON array.
    Json,
}

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    #[clap(flatten)]
    pub workspace: WorkspaceArgs,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Executes the check, returning whether the workspace loaded.
pub fn execute(args: &CheckArgs) -> CliResult<bool> {
    let result = args.workspace.load();
    let stdout = std::io::stdout();
    render(&result, args.format, &mut stdout.lock())?;
    Ok(result.did_succeed())
}

fn summary(workspace: &Workspace) -> String {
    match &workspace.definition {
        WorkspaceDefinition::OpenApi(def) => format!(
            "Loaded OpenAPI workspace '{}' ({}, {} paths, {} schemas)",
            workspace.name,
            def.file,
            def.paths.len(),
            def.schemas.len()
        ),
        WorkspaceDefinition::Fern(def) => format!(
            "Loaded workspace '{}' ({} definition files, {} packages, {} imports)",
            workspace.name,
            def.named_definition_files.len(),
            def.package_markers.len(),
            def.imported_definitions.len()
        ),
    }
}

fn render(result: &WorkspaceLoadResult, format: OutputFormat, out: &mut impl Write) -> CliResult<()> {
    match (result, format) {
        (WorkspaceLoadResult::Success(workspace), OutputFormat::Text) => {
            writeln!(out, "{}", summary(workspace))?;
            for warning in &workspace.warnings {
                writeln!(out, "{}", warning)?;
            }
        }
        (WorkspaceLoadResult::Failure(diagnostics), OutputFormat::Text) => {
            for diagnostic in diagnostics {
                writeln!(out, "{}", diagnostic)?;
            }
        }
        (_, OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string_pretty(result.diagnostics())?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(root: PathBuf, format: OutputFormat) -> CheckArgs {
        CheckArgs {
            workspace: WorkspaceArgs {
                workspace: root,
                workspace_name: None,
                list_merge: ListMergePolicy::Concatenate,
                threads: Some(2),
            },
            format,
        }
    }

    fn rendered(args: &CheckArgs) -> String {
        let mut out = Vec::new();
        render(&args.workspace.load(), args.format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_check_summary() {
        let dir = tempdir().unwrap();
        let def = dir.path().join("definition");
        fs::create_dir_all(&def).unwrap();
        fs::write(def.join("api.yml"), "name: petstore\n").unwrap();
        fs::write(def.join("pets.yml"), "types:\n  Pet:\n    properties:\n      name: string\n").unwrap();

        let out = rendered(&args(dir.path().to_path_buf(), OutputFormat::Text));
        assert_eq!(
            out,
            "Loaded workspace 'petstore' (1 definition files, 1 packages, 0 imports)\n"
        );
    }

    #[test]
    fn test_check_prints_warnings_after_summary() {
        let dir = tempdir().unwrap();
        let def = dir.path().join("definition");
        fs::create_dir_all(&def).unwrap();
        fs::write(def.join("api.yml"), "name: petstore\nimports:\n  p: pets.yml\n").unwrap();
        fs::write(def.join("pets.yml"), "types:\n  Pet: string\n").unwrap();

        let out = rendered(&args(dir.path().to_path_buf(), OutputFormat::Text));
        assert_eq!(
            out,
            "Loaded workspace 'petstore' (1 definition files, 1 packages, 1 imports)\n\
             api.yml: warning[UnusedImport]: import 'p' ('pets.yml') is never used\n"
        );
    }

    #[test]
    fn test_check_reports_diagnostics() {
        let dir = tempdir().unwrap();
        let def = dir.path().join("definition");
        fs::create_dir_all(&def).unwrap();
        fs::write(def.join("api.yml"), "name: petstore\n").unwrap();
        fs::write(def.join("pets.yml"), "imports:\n  c: commons.yml\n").unwrap();

        let text = rendered(&args(dir.path().to_path_buf(), OutputFormat::Text));
        assert!(text.starts_with("pets.yml: error[DanglingImportError]: "), "{}", text);

        let json = rendered(&args(dir.path().to_path_buf(), OutputFormat::Json));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["kind"], "danglingImportError");
    }
}
