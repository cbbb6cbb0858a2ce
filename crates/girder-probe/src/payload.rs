//! Wire types for the JSON document the injected init script emits.
//!
//! Field names and absence semantics are pinned: the Groovy side is
//! best-effort, so every enrichment field is optional and every collection
//! defaults to empty. Only project identity is mandatory — a payload missing
//! it cannot name a build target and is rejected at deserialization time.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

/// The complete document for one aggregation: the root build plus everything
/// reachable through included builds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePayload {
    /// Version of the Gradle instance that executed the init script.
    pub gradle_version: String,
    pub root_build: BuildPayload,
}

/// One Gradle build: a root project name and its project payloads, plus the
/// builds it pulls in. `editable_builds` is populated on Gradle ≥ 4.10,
/// `included_builds` on ≥ 3.3; on older versions both keys are absent.
///
/// Projects stay untyped here: a project whose extraction failed Gradle-side
/// arrives as `{ "projectPath": ..., "error": ... }` and must only take down
/// that project, so each entry is parsed (or rejected) individually.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    pub root_project_name: String,
    #[serde(default)]
    pub projects: Vec<Value>,
    #[serde(default)]
    pub editable_builds: Option<Vec<BuildPayload>>,
    #[serde(default)]
    pub included_builds: Option<Vec<BuildPayload>>,
}

/// Everything the init script could read from one live `Project`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub project_name: String,
    pub project_path: String,
    pub project_dir: PathBuf,
    pub root_dir: PathBuf,
    pub gradle_version: String,
    #[serde(default)]
    pub java_home: Option<PathBuf>,
    #[serde(default)]
    pub source_sets: Vec<SourceSetPayload>,
    /// Raw Android model when the `android` extension is present. The shape
    /// varies across Android Gradle Plugin versions, so it stays untyped and
    /// is probed member by member.
    #[serde(default)]
    pub android: Option<Value>,
}

/// One declared source set of a JVM project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSetPayload {
    pub name: String,
    /// Unqualified names; the probe prefixes the project path.
    #[serde(default)]
    pub classes_task_name: Option<String>,
    #[serde(default)]
    pub task_names: Vec<String>,
    /// Declared source directories across all languages, including
    /// additionally registered ones.
    #[serde(default)]
    pub source_dirs: Vec<PathBuf>,
    /// Paths the compile tasks actually consume. Entries not covered by a
    /// declared source dir are inferred to be generated.
    #[serde(default)]
    pub compile_task_sources: Vec<PathBuf>,
    #[serde(default)]
    pub resource_dirs: Vec<PathBuf>,
    /// Per-language classes output directories.
    #[serde(default)]
    pub source_output_dirs: Vec<PathBuf>,
    /// The `processResources` destination, when the task exists.
    #[serde(default)]
    pub resource_output_dir: Option<PathBuf>,
    #[serde(default)]
    pub archives: Vec<ArchivePayload>,
    #[serde(default)]
    pub compile_classpath: Vec<PathBuf>,
    #[serde(default)]
    pub module_dependencies: Vec<ModuleDependencyPayload>,
    /// Languages that contributed source dirs (BSP ids).
    #[serde(default)]
    pub languages: Vec<String>,
    /// The test task consuming this source set's output, when one exists.
    #[serde(default)]
    pub test_task: Option<TestTaskPayload>,
    #[serde(default)]
    pub java: Option<JavaCompilePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTaskPayload {
    pub name: String,
    #[serde(default)]
    pub has_sources: bool,
}

/// An archive task's output plus the class directories it bundles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePayload {
    pub file: PathBuf,
    #[serde(default)]
    pub class_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDependencyPayload {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub artifacts: Vec<ArtifactPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPayload {
    pub uri: String,
    #[serde(default)]
    pub classifier: Option<String>,
}

/// Java compile configuration of one source set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JavaCompilePayload {
    pub source_compatibility: Option<String>,
    pub target_compatibility: Option<String>,
    /// Toolchain language version, when a toolchain is configured.
    pub toolchain_version: Option<String>,
    /// Structured compile options. Absent when the script could not read
    /// them (old Gradle); the probe then falls back to the declared args.
    pub compile_options: Option<CompileOptionsPayload>,
    /// User-declared `compilerArgs`, as raw JSON scalars: Groovy builds hand
    /// over GStrings, numbers, and booleans alike.
    pub declared_compiler_args: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptionsPayload {
    pub release: Option<u32>,
    pub encoding: Option<String>,
    pub debug: Option<bool>,
    pub deprecation: Option<bool>,
    pub warnings: Option<bool>,
}
