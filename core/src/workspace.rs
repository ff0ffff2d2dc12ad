#![deny(missing_docs)]

//! # Workspace Assembly
//!
//! Entry point of the loader. Detects the workspace kind from its reserved
//! subdirectories, runs the matching pipeline and returns one
//! [`WorkspaceLoadResult`]:
//!
//! ```text
//! Start -> KindDetected(OpenApi) -> Loading -> Validating                    -> Assembled
//!       -> KindDetected(Fern)    -> Discovering -> Parsing -> Validating
//!                                -> ResolvingImports -> ComposingMarkers     -> Assembled
//! any stage                                                                  -> Failed
//! ```
//!
//! A failing stage stops the pipeline; its diagnostics are returned unchanged.

use crate::collaborators::{
    DependenciesConfiguration, DependenciesConfigurationLoader, FileDependenciesConfigurationLoader,
    FileGeneratorsConfigurationLoader, GeneratorsConfiguration, GeneratorsConfigurationLoader,
};
use crate::config::LoaderOptions;
use crate::diagnostics::{sort_diagnostics, Diagnostic};
use crate::discovery::list_files;
use crate::document::{load_documents, DiskReader, SourceReader};
use crate::error::AppError;
use crate::ir::{NamedDefinitionFile, RootApiFile};
use crate::openapi::{load_openapi_definition, OpenApiDefinition};
use crate::package_markers::{
    compose_markers, resolve_import_graph, ComposedPackageMarker, ImportedDefinition,
};
use crate::paths::{AbsoluteFilePath, RelativeFilePath};
use crate::validation::validate_structure_of_files;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, info_span, warn};

/// A declarative definition after every stage succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FernDefinition {
    /// Absolute path of the definition directory.
    pub absolute_filepath: AbsoluteFilePath,
    /// The root API file.
    pub root_api_file: RootApiFile,
    /// Named definition files by identifier.
    pub named_definition_files: BTreeMap<RelativeFilePath, NamedDefinitionFile>,
    /// Composed package marker per directory.
    pub package_markers: BTreeMap<RelativeFilePath, ComposedPackageMarker>,
    /// Import edges ordered by `(from, alias)`.
    pub imported_definitions: Vec<ImportedDefinition>,
    /// Loaded dependencies configuration.
    pub dependencies_configuration: DependenciesConfiguration,
}

impl FernDefinition {
    /// The effective package marker for the directory containing `file`.
    pub fn package_marker_for(&self, file: &RelativeFilePath) -> Option<&ComposedPackageMarker> {
        self.package_markers.get(&file.dirname())
    }
}

/// The two workspace kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkspaceDefinition {
    /// A single OpenAPI document.
    OpenApi(OpenApiDefinition),
    /// A declarative multi-file definition.
    Fern(FernDefinition),
}

/// A fully loaded workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Absolute path of the workspace root.
    pub absolute_filepath: AbsoluteFilePath,
    /// API name: the root file's `name`, or `api` for OpenAPI workspaces.
    pub name: String,
    /// Caller supplied override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    /// Opaque generators configuration.
    pub generators_configuration: GeneratorsConfiguration,
    /// Warnings reported while loading.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
    /// The definition.
    pub definition: WorkspaceDefinition,
}

/// Outcome of a workspace load.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceLoadResult {
    /// Every stage succeeded.
    Success(Box<Workspace>),
    /// A stage failed with these diagnostics.
    Failure(Vec<Diagnostic>),
}

impl WorkspaceLoadResult {
    /// True on success.
    pub fn did_succeed(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Diagnostics of a failed load, or the warnings of a successful one.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Success(workspace) => &workspace.warnings,
            Self::Failure(diagnostics) => diagnostics,
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<Workspace, Vec<Diagnostic>> {
        match self {
            Self::Success(workspace) => Ok(*workspace),
            Self::Failure(diagnostics) => Err(diagnostics),
        }
    }
}

impl Serialize for WorkspaceLoadResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("WorkspaceLoadResult", 2)?;
        match self {
            Self::Success(workspace) => {
                state.serialize_field("didSucceed", &true)?;
                state.serialize_field("workspace", workspace)?;
            }
            Self::Failure(diagnostics) => {
                state.serialize_field("didSucceed", &false)?;
                state.serialize_field("diagnostics", diagnostics)?;
            }
        }
        state.end()
    }
}

/// Workspace kind, detected from the reserved subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    /// `openapi/` is present.
    OpenApi,
    /// Only `definition/` is present.
    Fern,
}

/// Pipeline states, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// The workspace kind was determined.
    KindDetected(WorkspaceKind),
    /// Reading the OpenAPI document.
    Loading,
    /// Listing definition files.
    Discovering,
    /// Reading and parsing definition files.
    Parsing,
    /// Structural validation.
    Validating,
    /// Resolving imports and checking for cycles.
    ResolvingImports,
    /// Composing package markers.
    ComposingMarkers,
    /// Terminal success.
    Assembled,
    /// Terminal failure.
    Failed,
}

/// Loads workspaces with a fixed set of options and collaborators.
pub struct WorkspaceLoader {
    options: LoaderOptions,
    generators: Box<dyn GeneratorsConfigurationLoader>,
    dependencies: Box<dyn DependenciesConfigurationLoader>,
    reader: Box<dyn SourceReader>,
}

impl WorkspaceLoader {
    /// A loader reading configuration and sources from disk.
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            generators: Box::new(FileGeneratorsConfigurationLoader {
                file_name: options.generators_file.clone(),
            }),
            dependencies: Box::new(FileDependenciesConfigurationLoader {
                file_name: options.dependencies_file.clone(),
            }),
            reader: Box::new(DiskReader),
            options,
        }
    }

    /// Replaces the generators configuration loader.
    pub fn with_generators_loader(
        mut self,
        loader: impl GeneratorsConfigurationLoader + 'static,
    ) -> Self {
        self.generators = Box::new(loader);
        self
    }

    /// Replaces the dependencies configuration loader.
    pub fn with_dependencies_loader(
        mut self,
        loader: impl DependenciesConfigurationLoader + 'static,
    ) -> Self {
        self.dependencies = Box::new(loader);
        self
    }

    /// Replaces the source reader.
    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// Loads the workspace at `root`.
    pub fn load(&self, root: &Path, workspace_name: Option<String>) -> WorkspaceLoadResult {
        self.run(root, workspace_name, &mut |_| {})
    }

    /// Loads the workspace at `root`, also returning every stage entered.
    pub fn load_recording(
        &self,
        root: &Path,
        workspace_name: Option<String>,
    ) -> (WorkspaceLoadResult, Vec<LoadStage>) {
        let mut stages = Vec::new();
        let result = self.run(root, workspace_name, &mut |stage| stages.push(stage));
        (result, stages)
    }

    fn run(
        &self,
        root: &Path,
        workspace_name: Option<String>,
        record: &mut dyn FnMut(LoadStage),
    ) -> WorkspaceLoadResult {
        let span = info_span!("load_workspace", root = %root.display());
        let _guard = span.enter();

        let mut enter = |stage: LoadStage| {
            info!(?stage, "entering stage");
            record(stage);
        };

        let outcome = AbsoluteFilePath::of_existing_dir(root)
            .map_err(|e| vec![Diagnostic::from_app_error(root.display().to_string(), &e)])
            .and_then(|root| {
                if root.child(&self.options.openapi_directory).as_path().is_dir() {
                    enter(LoadStage::KindDetected(WorkspaceKind::OpenApi));
                    self.load_openapi(root, workspace_name, &mut enter)
                } else {
                    self.load_fern(root, workspace_name, &mut enter)
                }
            });

        match outcome {
            Ok(workspace) => {
                enter(LoadStage::Assembled);
                info!(name = %workspace.name, warnings = workspace.warnings.len(), "workspace loaded");
                WorkspaceLoadResult::Success(Box::new(workspace))
            }
            Err(mut diagnostics) => {
                enter(LoadStage::Failed);
                sort_diagnostics(&mut diagnostics);
                warn!(count = diagnostics.len(), "workspace failed to load");
                WorkspaceLoadResult::Failure(diagnostics)
            }
        }
    }

    fn load_openapi(
        &self,
        root: AbsoluteFilePath,
        workspace_name: Option<String>,
        enter: &mut dyn FnMut(LoadStage),
    ) -> Result<Workspace, Vec<Diagnostic>> {
        enter(LoadStage::Loading);
        let openapi_dir = root.child(&self.options.openapi_directory);
        let generators = self.generators.load(&root);

        enter(LoadStage::Validating);
        let definition = load_openapi_definition(&openapi_dir, &self.options, self.reader.as_ref());

        match (generators, definition) {
            (Ok(generators_configuration), Ok(definition)) => Ok(Workspace {
                absolute_filepath: root,
                name: "api".to_string(),
                workspace_name,
                generators_configuration,
                warnings: Vec::new(),
                definition: WorkspaceDefinition::OpenApi(definition),
            }),
            (generators, definition) => {
                let mut diagnostics: Vec<Diagnostic> = generators.err().into_iter().collect();
                diagnostics.extend(definition.err().into_iter().flatten());
                Err(diagnostics)
            }
        }
    }

    fn load_fern(
        &self,
        root: AbsoluteFilePath,
        workspace_name: Option<String>,
        enter: &mut dyn FnMut(LoadStage),
    ) -> Result<Workspace, Vec<Diagnostic>> {
        let definition_dir = root.child(&self.options.definition_directory);
        if !definition_dir.as_path().is_dir() {
            let err = AppError::DirectoryNotFound(definition_dir.as_path().to_path_buf());
            return Err(vec![Diagnostic::from_app_error(
                self.options.definition_directory.as_str(),
                &err,
            )]);
        }
        enter(LoadStage::KindDetected(WorkspaceKind::Fern));

        enter(LoadStage::Discovering);
        let ((generators, dependencies), files) = rayon::join(
            || {
                rayon::join(
                    || self.generators.load(&root),
                    || self.dependencies.load(&root),
                )
            },
            || list_files(definition_dir.as_path(), &self.options.definition_extensions),
        );

        let mut diagnostics = Vec::new();
        let generators = generators.map_err(|d| diagnostics.push(d)).ok();
        let dependencies = dependencies.map_err(|d| diagnostics.push(d)).ok();
        let files = files
            .map_err(|e| {
                diagnostics.push(Diagnostic::from_app_error(
                    self.options.definition_directory.as_str(),
                    &e,
                ))
            })
            .ok();
        let (Some(generators_configuration), Some(dependencies_configuration), Some(mut files)) =
            (generators, dependencies, files)
        else {
            return Err(diagnostics);
        };
        files.sort();
        debug!(count = files.len(), "discovered definition files");

        enter(LoadStage::Parsing);
        let documents = load_documents(
            definition_dir.as_path(),
            &files,
            self.reader.as_ref(),
            self.options.parse_threads,
        )
        .into_documents()?;

        enter(LoadStage::Validating);
        let validated = validate_structure_of_files(&documents, &self.options)?;

        enter(LoadStage::ResolvingImports);
        let imports = resolve_import_graph(&validated)?;

        enter(LoadStage::ComposingMarkers);
        let package_markers =
            compose_markers(&validated, &dependencies_configuration, &self.options)?;

        Ok(Workspace {
            absolute_filepath: root,
            name: validated.root_api_file.contents.name.clone(),
            workspace_name,
            generators_configuration,
            warnings: imports.warnings,
            definition: WorkspaceDefinition::Fern(FernDefinition {
                absolute_filepath: definition_dir,
                root_api_file: validated.root_api_file,
                named_definition_files: validated.named_definition_files,
                package_markers,
                imported_definitions: imports.imported_definitions,
                dependencies_configuration,
            }),
        })
    }
}

/// Loads the workspace at `root` with file-based collaborators.
pub fn load_api_workspace(
    root: &Path,
    workspace_name: Option<String>,
    options: &LoaderOptions,
) -> WorkspaceLoadResult {
    WorkspaceLoader::new(options.clone()).load(root, workspace_name)
}
