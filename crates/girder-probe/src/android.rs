//! The Android variant path.
//!
//! The Android Gradle Plugin has no stable model API, so the init script
//! dumps whatever members it can reach into an untyped blob and this module
//! probes it through `Option`-returning capability queries: a missing member
//! skips that enrichment, it never fails the variant. Only a variant missing
//! its name is dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde_json::Value;
use url::Url;

use girder_model::{
    GradleVersion, JavaExtension, LanguageExtension, ModuleDependency, SourceSetModel,
};

use crate::java::{build_compiler_args, find_first_compiler_arg, generated_source_paths};
use crate::names::{capitalize, display_name, full_task_name};
use crate::payload::{JavaCompilePayload, ModuleDependencyPayload, ProjectPayload};

/// Android plugin kinds, identified by the applied plugin id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AndroidProjectKind {
    Application,
    Library,
    DynamicFeature,
    InstantAppFeature,
    Test,
}

impl AndroidProjectKind {
    fn from_plugins(plugins: &[&str]) -> Option<Self> {
        let has = |id: &str| plugins.contains(&id);
        if has("com.android.application") {
            Some(Self::Application)
        } else if has("com.android.library") {
            Some(Self::Library)
        } else if has("com.android.dynamic-feature") {
            Some(Self::DynamicFeature)
        } else if has("com.android.feature") {
            Some(Self::InstantAppFeature)
        } else if has("com.android.test") {
            Some(Self::Test)
        } else {
            None
        }
    }

    /// The variant collections this kind exposes, by member name.
    fn variant_collections(self) -> &'static [&'static str] {
        match self {
            Self::Application | Self::DynamicFeature => &["applicationVariants", "testVariants"],
            Self::Library => &["libraryVariants", "testVariants"],
            Self::InstantAppFeature => &["featureVariants", "testVariants"],
            Self::Test => &["testVariants"],
        }
    }

    /// Plain test plugins have no unit-test variants of their own.
    fn has_unit_test_variants(self) -> bool {
        !matches!(self, Self::Test)
    }
}

/// Converts every reachable build variant into a [`SourceSetModel`].
pub(crate) fn probe_variants(project: &ProjectPayload, android: &Value) -> Vec<SourceSetModel> {
    let plugins: Vec<&str> = str_list(android, "plugins");
    let Some(kind) = AndroidProjectKind::from_plugins(&plugins) else {
        tracing::debug!(
            project = %project.project_path,
            "android extension present but no recognized android plugin"
        );
        return Vec::new();
    };

    let boot_classpath = path_list(android, "bootClasspath").unwrap_or_default();

    let mut models = Vec::new();
    for collection in kind.variant_collections() {
        for variant in variants_in(android, collection) {
            if let Some(model) = variant_model(project, variant, &boot_classpath, false) {
                models.push(model);
            }
        }
    }
    if kind.has_unit_test_variants() {
        for variant in variants_in(android, "unitTestVariants") {
            if let Some(model) = variant_model(project, variant, &boot_classpath, true) {
                models.push(model);
            }
        }
    }
    models
}

fn variant_model(
    project: &ProjectPayload,
    variant: &Value,
    boot_classpath: &[PathBuf],
    is_unit_test: bool,
) -> Option<SourceSetModel> {
    let Some(variant_name) = variant.get("name").and_then(Value::as_str) else {
        tracing::debug!(project = %project.project_path, "skipping android variant without a name");
        return None;
    };

    let path = project.project_path.as_str();
    let capitalized = capitalize(variant_name);

    let (source_dirs, resource_dirs) = source_and_resource_dirs(variant, is_unit_test);
    let resource_output_dirs = resource_outputs(variant, is_unit_test);

    let java_compile = variant.get("javaCompileProvider");
    let source_output_dirs: BTreeSet<PathBuf> = java_compile
        .and_then(|compile| path_field(compile, "destinationDir"))
        .into_iter()
        .collect();
    let compile_sources = java_compile
        .and_then(|compile| path_list(compile, "sources"))
        .unwrap_or_default();
    let generated_source_dirs = generated_source_paths(&compile_sources, &source_dirs);

    let compile_classpath = variant
        .get("compileConfiguration")
        .and_then(|config| path_list(config, "files"))
        .unwrap_or_default();

    let extensions = java_extension(project, java_compile);

    Some(SourceSetModel {
        gradle_version: project.gradle_version.clone(),
        display_name: display_name(path, &project.project_name, variant_name),
        project_name: project.project_name.clone(),
        project_path: path.to_string(),
        project_dir: project.project_dir.clone(),
        root_dir: project.root_dir.clone(),
        source_set_name: variant_name.to_string(),
        classes_task_name: Some(full_task_name(path, &format!("assemble{capitalized}"))),
        clean_task_name: full_task_name(path, "clean"),
        task_names: [full_task_name(path, &format!("compile{capitalized}JavaWithJavac"))]
            .into_iter()
            .collect(),
        source_dirs,
        generated_source_dirs,
        resource_dirs,
        source_output_dirs,
        resource_output_dirs,
        // Archives play no role for android variants.
        archive_output_files: BTreeMap::new(),
        compile_classpath,
        module_dependencies: module_dependencies(variant, boot_classpath),
        build_target_dependencies: BTreeSet::new(),
        has_tests: variant.get("testedVariant").is_some(),
        extensions,
    })
}

/// Unions `javaDirectories`, `resDirectories`, and `resourcesDirectories`
/// over the variant's source-set objects. Unit-test variants skip
/// `resDirectories`.
fn source_and_resource_dirs(
    variant: &Value,
    is_unit_test: bool,
) -> (BTreeSet<PathBuf>, BTreeSet<PathBuf>) {
    let mut source_dirs = BTreeSet::new();
    let mut resource_dirs = BTreeSet::new();

    if let Some(source_sets) = variant.get("sourceSets").and_then(Value::as_array) {
        for source_set in source_sets {
            if let Some(dirs) = path_list(source_set, "javaDirectories") {
                source_dirs.extend(dirs);
            }
            if !is_unit_test {
                if let Some(dirs) = path_list(source_set, "resDirectories") {
                    resource_dirs.extend(dirs);
                }
            }
            if let Some(dirs) = path_list(source_set, "resourcesDirectories") {
                resource_dirs.extend(dirs);
            }
        }
    }

    (source_dirs, resource_dirs)
}

fn resource_outputs(variant: &Value, is_unit_test: bool) -> BTreeSet<PathBuf> {
    let mut outputs = BTreeSet::new();
    if let Some(dir) = variant
        .get("processJavaResourcesProvider")
        .and_then(|task| path_field(task, "destinationDir"))
    {
        outputs.insert(dir);
    }
    if !is_unit_test {
        if let Some(dir) = variant
            .get("mergeResourcesProvider")
            .and_then(|task| path_field(task, "outputDir"))
        {
            outputs.insert(dir);
        }
    }
    outputs
}

/// Resolved dependencies plus the synthetic SDK entries: bootclasspath jars
/// and the variant's `R.jar`, all under `UNKNOWN` coordinates.
fn module_dependencies(variant: &Value, boot_classpath: &[PathBuf]) -> BTreeSet<ModuleDependency> {
    let mut dependencies: BTreeSet<ModuleDependency> = variant
        .get("moduleDependencies")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|entry| {
                    serde_json::from_value::<ModuleDependencyPayload>(entry.clone()).ok()
                })
                .map(|payload| crate::java::module_dependency(&payload))
                .collect()
        })
        .unwrap_or_default();

    for jar in boot_classpath {
        if let Some(dependency) = unknown_dependency(jar) {
            dependencies.insert(dependency);
        }
    }
    if let Some(r_jar) = path_field(variant, "rClassOutputJar") {
        if let Some(dependency) = unknown_dependency(&r_jar) {
            dependencies.insert(dependency);
        }
    }

    dependencies
}

fn unknown_dependency(file: &std::path::Path) -> Option<ModuleDependency> {
    match Url::from_file_path(file) {
        Ok(uri) => Some(ModuleDependency::unknown(uri)),
        Err(()) => {
            tracing::debug!(path = %file.display(), "skipping non-absolute sdk classpath entry");
            None
        }
    }
}

fn java_extension(
    project: &ProjectPayload,
    java_compile: Option<&Value>,
) -> BTreeMap<String, LanguageExtension> {
    let payload: JavaCompilePayload = java_compile
        .and_then(|compile| serde_json::from_value(compile.clone()).ok())
        .unwrap_or_default();

    let gradle_version = GradleVersion::parse(&project.gradle_version);
    let compiler_args = build_compiler_args(&payload, gradle_version.as_ref());
    let source_compatibility =
        find_first_compiler_arg(&compiler_args, &["-source", "--source", "--release"])
            .or_else(|| payload.source_compatibility.clone())
            .unwrap_or_default();
    let target_compatibility =
        find_first_compiler_arg(&compiler_args, &["-target", "--target", "--release"])
            .or_else(|| payload.target_compatibility.clone())
            .unwrap_or_default();

    let extension = JavaExtension {
        java_home: project.java_home.clone(),
        java_version: target_compatibility.clone(),
        source_compatibility,
        target_compatibility,
        compiler_args,
    };

    [(
        girder_model::languages::JAVA.to_string(),
        LanguageExtension::Java(extension),
    )]
    .into_iter()
    .collect()
}

fn str_list<'a>(value: &'a Value, key: &str) -> Vec<&'a str> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn path_field(value: &Value, key: &str) -> Option<PathBuf> {
    value.get(key).and_then(Value::as_str).map(PathBuf::from)
}

fn path_list(value: &Value, key: &str) -> Option<Vec<PathBuf>> {
    let list = value.get(key)?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(PathBuf::from)
            .collect(),
    )
}

fn variants_in<'a>(android: &'a Value, collection: &str) -> impl Iterator<Item = &'a Value> {
    android
        .get(collection)
        .and_then(Value::as_array)
        .map(|list| list.iter())
        .unwrap_or_default()
}
