//! The statically-typed JVM path: one [`SourceSetModel`] per declared source
//! set, plus the `javac` argument reconstruction.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde_json::Value;
use url::Url;

use girder_model::{
    Artifact, GradleVersion, GroovyExtension, JavaExtension, KotlinExtension, LanguageExtension,
    ModuleDependency, ScalaExtension, SourceSetModel,
};

use crate::names::{display_name, full_task_name};
use crate::payload::{
    ArtifactPayload, JavaCompilePayload, ModuleDependencyPayload, ProjectPayload, SourceSetPayload,
};

pub(crate) fn probe_source_sets(project: &ProjectPayload) -> Vec<SourceSetModel> {
    project
        .source_sets
        .iter()
        .map(|source_set| source_set_model(project, source_set))
        .collect()
}

fn source_set_model(project: &ProjectPayload, source_set: &SourceSetPayload) -> SourceSetModel {
    let path = project.project_path.as_str();

    let source_dirs: BTreeSet<PathBuf> = source_set.source_dirs.iter().cloned().collect();
    let generated_source_dirs =
        generated_source_paths(&source_set.compile_task_sources, &source_dirs);

    let mut archive_output_files = BTreeMap::new();
    for archive in &source_set.archives {
        archive_output_files
            .entry(archive.file.clone())
            .or_insert_with(Vec::new)
            .extend(archive.class_dirs.iter().cloned());
    }

    let gradle_version = GradleVersion::parse(&project.gradle_version);
    let extensions = build_extensions(project, source_set, gradle_version.as_ref());

    SourceSetModel {
        gradle_version: project.gradle_version.clone(),
        display_name: display_name(path, &project.project_name, &source_set.name),
        project_name: project.project_name.clone(),
        project_path: path.to_string(),
        project_dir: project.project_dir.clone(),
        root_dir: project.root_dir.clone(),
        source_set_name: source_set.name.clone(),
        classes_task_name: source_set
            .classes_task_name
            .as_deref()
            .map(|task| full_task_name(path, task)),
        clean_task_name: full_task_name(path, "clean"),
        task_names: source_set
            .task_names
            .iter()
            .map(|task| full_task_name(path, task))
            .collect(),
        source_dirs,
        generated_source_dirs,
        resource_dirs: source_set.resource_dirs.iter().cloned().collect(),
        source_output_dirs: source_set.source_output_dirs.iter().cloned().collect(),
        resource_output_dirs: source_set.resource_output_dir.iter().cloned().collect(),
        archive_output_files,
        compile_classpath: source_set.compile_classpath.clone(),
        module_dependencies: source_set
            .module_dependencies
            .iter()
            .map(module_dependency)
            .collect(),
        build_target_dependencies: BTreeSet::new(),
        has_tests: source_set
            .test_task
            .as_ref()
            .is_some_and(|task| task.has_sources),
        extensions,
    }
}

/// Compile-task inputs not covered by a declared source dir are generated
/// (annotation processor output, codegen plugins). "Covered by" is
/// component-wise path-prefix containment, and entries already covered by a
/// previously inferred generated path are skipped.
pub(crate) fn generated_source_paths(
    compile_sources: &[PathBuf],
    source_dirs: &BTreeSet<PathBuf>,
) -> BTreeSet<PathBuf> {
    let mut generated: Vec<PathBuf> = Vec::new();
    for path in compile_sources {
        if source_dirs.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        if generated.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        generated.push(path.clone());
    }
    generated.into_iter().collect()
}

pub(crate) fn module_dependency(payload: &ModuleDependencyPayload) -> ModuleDependency {
    ModuleDependency {
        group: payload.group.clone(),
        name: payload.name.clone(),
        version: payload.version.clone(),
        artifacts: payload.artifacts.iter().filter_map(artifact).collect(),
    }
}

fn artifact(payload: &ArtifactPayload) -> Option<Artifact> {
    match Url::parse(&payload.uri) {
        Ok(uri) => Some(Artifact {
            uri,
            classifier: payload.classifier.clone(),
        }),
        Err(err) => {
            tracing::debug!(uri = %payload.uri, %err, "skipping artifact with unparseable uri");
            None
        }
    }
}

fn build_extensions(
    project: &ProjectPayload,
    source_set: &SourceSetPayload,
    gradle_version: Option<&GradleVersion>,
) -> BTreeMap<String, LanguageExtension> {
    let mut extensions = BTreeMap::new();

    if let Some(java) = &source_set.java {
        extensions.insert(
            girder_model::languages::JAVA.to_string(),
            LanguageExtension::Java(java_extension(project, java, gradle_version)),
        );
    }

    for language in &source_set.languages {
        let extension = match language.as_str() {
            girder_model::languages::SCALA => {
                LanguageExtension::Scala(ScalaExtension::default())
            }
            girder_model::languages::KOTLIN => {
                LanguageExtension::Kotlin(KotlinExtension::default())
            }
            girder_model::languages::GROOVY => {
                LanguageExtension::Groovy(GroovyExtension::default())
            }
            _ => continue,
        };
        extensions.entry(language.clone()).or_insert(extension);
    }

    extensions
}

fn java_extension(
    project: &ProjectPayload,
    java: &JavaCompilePayload,
    gradle_version: Option<&GradleVersion>,
) -> JavaExtension {
    let compiler_args = build_compiler_args(java, gradle_version);

    let source_compatibility =
        find_first_compiler_arg(&compiler_args, &["-source", "--source", "--release"])
            .or_else(|| java.source_compatibility.clone())
            .unwrap_or_default();
    let target_compatibility =
        find_first_compiler_arg(&compiler_args, &["-target", "--target", "--release"])
            .or_else(|| java.target_compatibility.clone())
            .unwrap_or_default();

    // Toolchain wins; otherwise the task's target level is the effective one.
    let java_version = java
        .toolchain_version
        .clone()
        .or_else(|| java.target_compatibility.clone())
        .or_else(|| java.source_compatibility.clone())
        .unwrap_or_default();

    JavaExtension {
        java_home: project.java_home.clone(),
        java_version,
        source_compatibility,
        target_compatibility,
        compiler_args,
    }
}

/// Reconstructs the full `javac` argument list the way Gradle's compile-spec
/// builder would.
///
/// Declared `-source`/`--source`/`-target`/`--target`/`--release` args are
/// honored and never overwritten. On Gradle ≥ 6.6 with a configured
/// `release`, `--release` is emitted alone; otherwise the task's
/// compatibility levels fill `-source`/`-target`. When the structured
/// options block is absent the declared args are returned as-is, coerced to
/// strings.
pub(crate) fn build_compiler_args(
    java: &JavaCompilePayload,
    gradle_version: Option<&GradleVersion>,
) -> Vec<String> {
    let declared = coerce_to_strings(&java.declared_compiler_args);

    let Some(options) = &java.compile_options else {
        return declared;
    };

    let mut args = Vec::new();

    let preset_source = find_first_compiler_arg(&declared, &["-source", "--source", "--release"]);
    let preset_target = find_first_compiler_arg(&declared, &["-target", "--target", "--release"]);

    if preset_source.is_none() || preset_target.is_none() {
        let release_supported = gradle_version
            .is_some_and(|version| *version >= GradleVersion::parse("6.6").expect("valid version"));
        match options.release {
            Some(release) if release_supported => {
                args.push("--release".to_string());
                args.push(release.to_string());
            }
            _ => {
                if preset_source.is_none() {
                    if let Some(source) = &java.source_compatibility {
                        args.push("-source".to_string());
                        args.push(source.clone());
                    }
                }
                if preset_target.is_none() {
                    if let Some(target) = &java.target_compatibility {
                        args.push("-target".to_string());
                        args.push(target.clone());
                    }
                }
            }
        }
    }

    if let Some(encoding) = &options.encoding {
        args.push("-encoding".to_string());
        args.push(encoding.clone());
    }
    match options.debug {
        Some(false) => args.push("-g:none".to_string()),
        _ => args.push("-g".to_string()),
    }
    if options.deprecation == Some(true) {
        args.push("-deprecation".to_string());
    }
    if options.warnings == Some(false) {
        args.push("-nowarn".to_string());
    }

    args.extend(declared);
    args
}

/// Groovy builds can declare compiler args as GStrings, numbers, or booleans;
/// everything is carried over as a string.
fn coerce_to_strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// The value following the first of `flags` present in `args`.
pub(crate) fn find_first_compiler_arg(args: &[String], flags: &[&str]) -> Option<String> {
    for flag in flags {
        if let Some(idx) = args.iter().position(|arg| arg == flag) {
            if let Some(value) = args.get(idx + 1) {
                return Some(value.clone());
            }
        }
    }
    None
}
