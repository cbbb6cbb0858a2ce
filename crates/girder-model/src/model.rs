use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// One resolved artifact file of a module dependency.
///
/// `classifier` is `None` for the main artifact, `"sources"`/`"javadoc"` for
/// the usual secondary artifacts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

/// An external (non-project) dependency of a source set, keyed by Maven
/// coordinates with the file URIs of every resolved classifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDependency {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl ModuleDependency {
    /// Placeholder coordinates used for files Gradle resolves outside of any
    /// repository (Android SDK bootclasspath jars, generated `R.jar`).
    pub const UNKNOWN: &'static str = "UNKNOWN";

    /// A dependency with `UNKNOWN` coordinates wrapping a single file.
    pub fn unknown(uri: Url) -> Self {
        Self {
            group: Self::UNKNOWN.to_string(),
            name: Self::UNKNOWN.to_string(),
            version: Self::UNKNOWN.to_string(),
            artifacts: vec![Artifact {
                uri,
                classifier: None,
            }],
        }
    }
}

/// Identity of a sibling source set: the owning project directory plus the
/// source-set name. This pair, not the display name, is what dependency edges
/// and build-target URIs are derived from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargetDependency {
    pub project_dir: PathBuf,
    pub source_set_name: String,
}

impl BuildTargetDependency {
    pub fn new(project_dir: impl Into<PathBuf>, source_set_name: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            source_set_name: source_set_name.into(),
        }
    }
}

/// Java language configuration of a source set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JavaExtension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_home: Option<PathBuf>,
    /// Effective language level: the toolchain version when one is configured,
    /// otherwise derived from the compile task.
    pub java_version: String,
    pub source_compatibility: String,
    pub target_compatibility: String,
    /// Fully-expanded `javac` argument list.
    pub compiler_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalaExtension {
    pub compiler_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KotlinExtension {
    pub compiler_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroovyExtension {}

/// Per-language capability data attached to a source set.
///
/// Only the Java extension is fully populated today; the others mark language
/// presence (they contribute to `languageIds`) and carry compiler args when
/// the build exposes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "language", rename_all = "lowercase")]
pub enum LanguageExtension {
    Java(JavaExtension),
    Scala(ScalaExtension),
    Kotlin(KotlinExtension),
    Groovy(GroovyExtension),
}

impl LanguageExtension {
    /// The BSP language id this extension belongs under.
    pub fn language_id(&self) -> &'static str {
        match self {
            LanguageExtension::Java(_) => crate::languages::JAVA,
            LanguageExtension::Scala(_) => crate::languages::SCALA,
            LanguageExtension::Kotlin(_) => crate::languages::KOTLIN,
            LanguageExtension::Groovy(_) => crate::languages::GROOVY,
        }
    }

    pub fn as_java(&self) -> Option<&JavaExtension> {
        match self {
            LanguageExtension::Java(ext) => Some(ext),
            _ => None,
        }
    }
}

/// Everything the build server knows about one (project, source set) pair.
///
/// Field names are pinned: instances are serialized across the init-script
/// boundary and re-serialized by the aggregator's copy step. Missing optional
/// collections deserialize as empty, never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSetModel {
    pub gradle_version: String,
    /// Stable human-readable name, `"<project> [<sourceSet>]"`.
    pub display_name: String,
    pub project_name: String,
    /// Gradle project path, e.g. `:app` or `:` for the root project.
    pub project_path: String,
    pub project_dir: PathBuf,
    pub root_dir: PathBuf,
    pub source_set_name: String,

    /// Task that produces this source set's classes, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes_task_name: Option<String>,
    pub clean_task_name: String,
    /// Compile/assemble tasks relevant to this source set.
    #[serde(default)]
    pub task_names: BTreeSet<String>,

    #[serde(default)]
    pub source_dirs: BTreeSet<PathBuf>,
    #[serde(default)]
    pub generated_source_dirs: BTreeSet<PathBuf>,
    #[serde(default)]
    pub resource_dirs: BTreeSet<PathBuf>,
    #[serde(default)]
    pub source_output_dirs: BTreeSet<PathBuf>,
    #[serde(default)]
    pub resource_output_dirs: BTreeSet<PathBuf>,

    /// Archives assembled from this source set's outputs, mapped to the class
    /// directories each one bundles.
    #[serde(default)]
    pub archive_output_files: BTreeMap<PathBuf, Vec<PathBuf>>,

    /// Ordered compile classpath (jars and class directories).
    #[serde(default)]
    pub compile_classpath: Vec<PathBuf>,

    #[serde(default)]
    pub module_dependencies: BTreeSet<ModuleDependency>,
    /// Sibling source sets this one compiles against. Populated by the linker.
    #[serde(default)]
    pub build_target_dependencies: BTreeSet<BuildTargetDependency>,

    #[serde(default)]
    pub has_tests: bool,

    /// Language name (BSP id) to extension record.
    #[serde(default)]
    pub extensions: BTreeMap<String, LanguageExtension>,
}

impl SourceSetModel {
    /// The identity other models use to reference this one.
    pub fn identity(&self) -> BuildTargetDependency {
        BuildTargetDependency {
            project_dir: self.project_dir.clone(),
            source_set_name: self.source_set_name.clone(),
        }
    }

    pub fn java_extension(&self) -> Option<&JavaExtension> {
        self.extensions
            .get(crate::languages::JAVA)
            .and_then(LanguageExtension::as_java)
    }
}
