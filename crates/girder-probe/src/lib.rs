//! Per-project model extraction.
//!
//! The injected init script walks the live Gradle build and emits one JSON
//! document; this crate turns one project's slice of that document into
//! [`SourceSetModel`]s. JVM projects go through a statically-typed path (one
//! model per declared source set); projects with the `android` extension go
//! through a capability-probing path over the untyped variant blob instead,
//! one model per build variant.
//!
//! A probe failure is scoped to its project: the aggregator logs it and
//! drops that project, the aggregation itself carries on.

mod android;
mod java;
mod names;
pub mod payload;

use girder_model::SourceSetModel;

pub use payload::{BuildPayload, ProjectPayload, WorkspacePayload};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("project payload is structurally invalid: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },
}

/// Extracts every source-set model one project payload describes.
///
/// Projects with the `android` extension yield variant models only, matching
/// how the variant API supersedes plain source sets there. An empty result
/// is normal for aggregator-only projects that apply no JVM plugin.
pub fn probe_project(payload: &ProjectPayload) -> Vec<SourceSetModel> {
    match &payload.android {
        Some(android) => android::probe_variants(payload, android),
        None => java::probe_source_sets(payload),
    }
}

/// Deserializes one raw project value into its typed payload.
///
/// Identity fields are mandatory; anything else missing degrades to empty
/// collections inside [`probe_project`].
pub fn parse_project_payload(value: serde_json::Value) -> Result<ProjectPayload, ProbeError> {
    serde_json::from_value(value).map_err(|source| ProbeError::MalformedPayload { source })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn java_project_yields_one_model_per_source_set() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "projectName": "app",
            "projectPath": ":app",
            "projectDir": "/ws/app",
            "rootDir": "/ws",
            "gradleVersion": "8.5",
            "sourceSets": [
                {
                    "name": "main",
                    "classesTaskName": "classes",
                    "taskNames": ["compileJava", "processResources"],
                    "sourceDirs": ["/ws/app/src/main/java"],
                    "sourceOutputDirs": ["/ws/app/build/classes/java/main"],
                    "resourceOutputDir": "/ws/app/build/resources/main",
                    "languages": ["java"],
                    "java": { "sourceCompatibility": "17", "targetCompatibility": "17" },
                },
                {
                    "name": "test",
                    "classesTaskName": "testClasses",
                    "taskNames": ["compileTestJava"],
                    "sourceDirs": ["/ws/app/src/test/java"],
                    "testTask": { "name": "test", "hasSources": true },
                    "languages": ["java"],
                    "java": {},
                },
            ],
        }))
        .unwrap();

        let models = probe_project(&payload);
        assert_eq!(models.len(), 2);

        let main = &models[0];
        assert_eq!(main.display_name, "app [main]");
        assert_eq!(main.classes_task_name.as_deref(), Some(":app:classes"));
        assert_eq!(main.clean_task_name, ":app:clean");
        assert_eq!(
            main.task_names,
            BTreeSet::from([":app:compileJava".to_string(), ":app:processResources".to_string()])
        );
        assert_eq!(
            main.resource_output_dirs,
            BTreeSet::from([PathBuf::from("/ws/app/build/resources/main")])
        );
        assert!(!main.has_tests);

        let test = &models[1];
        assert!(test.has_tests);
        assert_eq!(test.source_set_name, "test");
    }

    #[test]
    fn test_task_without_sources_does_not_mark_tests() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "projectName": "app",
            "projectPath": ":app",
            "projectDir": "/ws/app",
            "rootDir": "/ws",
            "gradleVersion": "8.5",
            "sourceSets": [{
                "name": "test",
                "testTask": { "name": "test", "hasSources": false },
            }],
        }))
        .unwrap();

        let models = probe_project(&payload);
        assert!(!models[0].has_tests);
    }

    #[test]
    fn archive_payloads_merge_by_file() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "projectName": "lib",
            "projectPath": ":lib",
            "projectDir": "/ws/lib",
            "rootDir": "/ws",
            "gradleVersion": "8.5",
            "sourceSets": [{
                "name": "main",
                "archives": [
                    { "file": "/ws/lib/build/libs/lib.jar", "classDirs": ["/ws/lib/build/classes/java/main"] },
                    { "file": "/ws/lib/build/libs/lib.jar", "classDirs": ["/ws/lib/build/resources/main"] },
                ],
            }],
        }))
        .unwrap();

        let models = probe_project(&payload);
        assert_eq!(
            models[0].archive_output_files[&PathBuf::from("/ws/lib/build/libs/lib.jar")],
            vec![
                PathBuf::from("/ws/lib/build/classes/java/main"),
                PathBuf::from("/ws/lib/build/resources/main"),
            ]
        );
    }

    #[test]
    fn module_dependencies_carry_classifier_artifacts() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "projectName": "app",
            "projectPath": ":app",
            "projectDir": "/ws/app",
            "rootDir": "/ws",
            "gradleVersion": "8.5",
            "sourceSets": [{
                "name": "main",
                "moduleDependencies": [{
                    "group": "com.google.guava",
                    "name": "guava",
                    "version": "33.0.0-jre",
                    "artifacts": [
                        { "uri": "file:///repo/guava.jar" },
                        { "uri": "file:///repo/guava-sources.jar", "classifier": "sources" },
                    ],
                }],
            }],
        }))
        .unwrap();

        let models = probe_project(&payload);
        let dependency = models[0].module_dependencies.iter().next().unwrap();
        assert_eq!(dependency.group, "com.google.guava");
        assert_eq!(dependency.artifacts.len(), 2);
        assert_eq!(dependency.artifacts[1].classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn malformed_project_payload_is_rejected() {
        let result = parse_project_payload(json!({ "projectName": "app" }));
        assert!(result.is_err());
    }
}
