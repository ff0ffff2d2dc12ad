#![deny(missing_docs)]

//! # IR Command
//!
//! Prints the complete load result, success or failure, as pretty JSON.

use crate::check::WorkspaceArgs;
use crate::error::CliResult;

/// Arguments for the ir command.
#[derive(clap::Args, Debug, Clone)]
pub struct IrArgs {
    #[clap(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Executes the command, returning whether the workspace loaded.
pub fn execute(args: &IrArgs) -> CliResult<bool> {
    let result = args.workspace.load();
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.did_succeed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fern_loader_core::ListMergePolicy;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_ir_output_is_stable() {
        let dir = tempdir().unwrap();
        let def = dir.path().join("definition");
        fs::create_dir_all(def.join("users")).unwrap();
        fs::write(def.join("api.yml"), "name: demo\n").unwrap();
        fs::write(def.join("commons.yml"), "types:\n  Id: string\n").unwrap();
        fs::write(
            def.join("users/users.yml"),
            "imports:\n  c: ../commons.yml\ntypes:\n  User:\n    properties:\n      id: c.Id\n",
        )
        .unwrap();

        let args = IrArgs {
            workspace: WorkspaceArgs {
                workspace: dir.path().to_path_buf(),
                workspace_name: None,
                list_merge: ListMergePolicy::Concatenate,
                threads: None,
            },
        };
        let first = serde_json::to_string_pretty(&args.workspace.load()).unwrap();
        let second = serde_json::to_string_pretty(&args.workspace.load()).unwrap();
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["didSucceed"], true);
        assert_eq!(
            value["workspace"]["definition"]["importedDefinitions"][0]["from"],
            "users/users.yml"
        );
    }
}
