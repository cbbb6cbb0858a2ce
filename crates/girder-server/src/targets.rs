//! The build-target graph: the server's single piece of shared state.
//!
//! `store` converts a linked model list into BSP build targets and publishes
//! them as one immutable snapshot behind an `RwLock<Arc<..>>`. Readers clone
//! the `Arc` and keep a consistent view; a store never leaves the graph
//! partially updated.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use url::Url;

use girder_model::SourceSetModel;

use crate::bsp::{
    tag, BuildTarget, BuildTargetCapabilities, BuildTargetIdentifier, JvmBuildTargetEx,
    DATA_KIND_JVM,
};
use crate::uri::build_target_uri;
use crate::TargetError;

/// One stored target: the BSP-facing record plus the model it came from.
#[derive(Debug, Clone)]
pub struct GradleBuildTarget {
    pub build_target: BuildTarget,
    pub model: SourceSetModel,
}

#[derive(Debug, Default)]
struct Snapshot {
    /// Discovery order: root build first, then included builds.
    targets: Vec<Arc<GradleBuildTarget>>,
    by_uri: HashMap<String, usize>,
    by_project_and_source_set: HashMap<(String, String), usize>,
}

/// Holds the current snapshot of build targets.
#[derive(Debug, Default)]
pub struct TargetGraph {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl TargetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot wholesale and returns the new target list.
    ///
    /// Dependency edges pointing outside the snapshot (a sibling whose probe
    /// failed) are dropped so that every stored edge resolves.
    pub fn store(&self, models: Vec<SourceSetModel>) -> Vec<Arc<GradleBuildTarget>> {
        let mut uris = Vec::with_capacity(models.len());
        let mut known: HashSet<String> = HashSet::with_capacity(models.len());
        for model in &models {
            let uri = match build_target_uri(&model.project_dir, &model.source_set_name) {
                Ok(uri) => uri,
                Err(err) => {
                    tracing::warn!(
                        display_name = %model.display_name,
                        %err,
                        "dropping source set without addressable project dir"
                    );
                    uris.push(None);
                    continue;
                }
            };
            known.insert(uri.as_str().to_string());
            uris.push(Some(uri));
        }

        let mut snapshot = Snapshot::default();
        for (model, uri) in models.into_iter().zip(uris) {
            let Some(uri) = uri else { continue };
            if snapshot.by_uri.contains_key(uri.as_str()) {
                tracing::warn!(uri = %uri, "duplicate target id; keeping the first occurrence");
                continue;
            }
            let target = Arc::new(GradleBuildTarget {
                build_target: build_target(&model, uri.clone(), &known),
                model,
            });

            let idx = snapshot.targets.len();
            snapshot.by_uri.insert(uri.as_str().to_string(), idx);
            snapshot.by_project_and_source_set.insert(
                (
                    target.model.project_path.clone(),
                    target.model.source_set_name.clone(),
                ),
                idx,
            );
            snapshot.targets.push(target);
        }

        let targets = snapshot.targets.clone();
        *self.snapshot.write().expect("target graph lock poisoned") = Arc::new(snapshot);
        targets
    }

    pub fn get_all(&self) -> Vec<Arc<GradleBuildTarget>> {
        self.current().targets.clone()
    }

    pub fn get_by_uri(&self, uri: &str) -> Result<Arc<GradleBuildTarget>, TargetError> {
        let snapshot = self.current();
        snapshot
            .by_uri
            .get(uri)
            .map(|&idx| snapshot.targets[idx].clone())
            .ok_or_else(|| TargetError::NotFound {
                uri: uri.to_string(),
            })
    }

    pub fn get_by_project_and_source_set(
        &self,
        project_path: &str,
        source_set_name: &str,
    ) -> Result<Arc<GradleBuildTarget>, TargetError> {
        let snapshot = self.current();
        snapshot
            .by_project_and_source_set
            .get(&(project_path.to_string(), source_set_name.to_string()))
            .map(|&idx| snapshot.targets[idx].clone())
            .ok_or_else(|| TargetError::NotFound {
                uri: format!("{project_path} [{source_set_name}]"),
            })
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .expect("target graph lock poisoned")
            .clone()
    }
}

fn build_target(model: &SourceSetModel, uri: Url, known: &HashSet<String>) -> BuildTarget {
    let tags = target_tags(model);

    let dependencies = model
        .build_target_dependencies
        .iter()
        .filter_map(|dependency| {
            build_target_uri(&dependency.project_dir, &dependency.source_set_name).ok()
        })
        .map(|uri| uri.as_str().to_string())
        .filter(|uri| known.contains(uri))
        .map(|uri| BuildTargetIdentifier { uri })
        .collect();

    let (data_kind, data) = target_data(model);

    let capabilities = BuildTargetCapabilities {
        can_compile: model.classes_task_name.is_some(),
        can_test: model.has_tests,
        can_run: tags.iter().any(|t| t == tag::APPLICATION),
        can_debug: false,
    };

    BuildTarget {
        id: BuildTargetIdentifier {
            uri: uri.as_str().to_string(),
        },
        display_name: Some(model.display_name.clone()),
        base_directory: Url::from_file_path(&model.project_dir)
            .ok()
            .map(|url| url.as_str().to_string()),
        tags,
        language_ids: model.extensions.keys().cloned().collect(),
        dependencies,
        capabilities,
        data_kind,
        data,
    }
}

fn target_tags(model: &SourceSetModel) -> Vec<String> {
    let mut tags = Vec::new();

    if is_test_source_set(model) {
        tags.push(tag::TEST.to_string());
    } else if !model.source_dirs.is_empty() && is_library_source_set(model) {
        tags.push(tag::LIBRARY.to_string());
    }

    // The application plugin contributes a `run` task to the main source set.
    let run_task = if model.project_path == ":" {
        ":run".to_string()
    } else {
        format!("{}:run", model.project_path)
    };
    if model.task_names.contains(&run_task) {
        tags.push(tag::APPLICATION.to_string());
    }

    tags
}

fn is_test_source_set(model: &SourceSetModel) -> bool {
    if model.has_tests {
        return true;
    }
    let name = model.source_set_name.as_str();
    name == "test" || name == "androidTest" || name == "unitTest" || name.ends_with("Test")
}

fn is_library_source_set(model: &SourceSetModel) -> bool {
    // Android variants carry `assemble<Variant>` classes tasks; any non-test
    // variant plays the role `main` plays for plain JVM projects.
    model.source_set_name == "main"
        || model
            .classes_task_name
            .as_deref()
            .is_some_and(|task| task.contains(":assemble"))
}

fn target_data(model: &SourceSetModel) -> (Option<String>, Option<serde_json::Value>) {
    // Precedence scala > kotlin > java once those payloads exist; today only
    // the jvm payload is materialized.
    let Some(java) = model.java_extension() else {
        return (None, None);
    };

    let payload = JvmBuildTargetEx {
        java_home: java
            .java_home
            .as_ref()
            .and_then(|home| Url::from_file_path(home).ok())
            .map(|url| url.as_str().to_string()),
        java_version: java.java_version.clone(),
        gradle_version: model.gradle_version.clone(),
        source_compatibility: java.source_compatibility.clone(),
        target_compatibility: java.target_compatibility.clone(),
    };

    match serde_json::to_value(&payload) {
        Ok(data) => (Some(DATA_KIND_JVM.to_string()), Some(data)),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize jvm target data");
            (None, None)
        }
    }
}
