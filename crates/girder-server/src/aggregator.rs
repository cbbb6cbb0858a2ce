//! Workspace aggregation.
//!
//! One aggregation drives a single composite fetch through the connection,
//! walks the returned build tree (root build first, included builds in
//! encounter order, de-duplicated by root project name), probes every
//! project, and links the flat model list. A failed project only removes
//! that project; cancellation and structurally invalid models fail the
//! aggregation as a whole, leaving the caller's previous snapshot intact.

use std::collections::HashSet;

use girder_gradle::{compat, CancellationToken, DriverError, GradleConnection};
use girder_model::{link, SourceSetModel};
use girder_probe::{parse_project_payload, probe_project, BuildPayload, ProbeError};

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error(transparent)]
    Gradle(DriverError),

    #[error(
        "Gradle {version} is not supported; the oldest supported version is {minimum}. \
         Configure a newer Gradle version or wrapper for this project."
    )]
    UnsupportedGradleVersion { version: String, minimum: String },

    #[error("aggregation was cancelled")]
    Cancelled,

    #[error("a project model is structurally invalid: {source}")]
    ModelDeserialization {
        #[source]
        source: ProbeError,
    },
}

impl From<DriverError> for AggregationError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Cancelled => AggregationError::Cancelled,
            other => AggregationError::Gradle(other),
        }
    }
}

/// Drives one aggregation over a connection.
#[derive(Debug)]
pub struct BuildAggregator<C> {
    connection: C,
}

impl<C: GradleConnection> BuildAggregator<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Fetches, probes, and links the full model list. Blocks until Gradle
    /// returns; results appear atomically or not at all.
    pub fn run(&self, cancel: &CancellationToken) -> Result<Vec<SourceSetModel>, AggregationError> {
        let payload = self.connection.fetch_workspace(cancel)?;

        if !compat::is_supported_gradle_version(&payload.gradle_version) {
            return Err(AggregationError::UnsupportedGradleVersion {
                version: payload.gradle_version.clone(),
                minimum: compat::minimum_supported_gradle_version().to_string(),
            });
        }

        let mut models = Vec::new();
        for build in collect_builds(&payload.root_build) {
            for raw_project in &build.projects {
                if let Some(error) = raw_project.get("error").and_then(|v| v.as_str()) {
                    let project = raw_project
                        .get("projectPath")
                        .and_then(|v| v.as_str())
                        .unwrap_or("<unknown>");
                    tracing::warn!(project, error, "probe failed; omitting project");
                    continue;
                }

                // Proxy decoupling happens here: the raw value is parsed into
                // an owned payload and never referenced again.
                let project = parse_project_payload(raw_project.clone())
                    .map_err(|source| AggregationError::ModelDeserialization { source })?;
                models.extend(probe_project(&project));
            }
        }

        if cancel.is_cancelled() {
            return Err(AggregationError::Cancelled);
        }

        link::link_source_sets(&mut models);
        Ok(models)
    }
}

/// Flattens the build tree, root build first. Included builds are visited in
/// encounter order, preferring `editable_builds` (Gradle ≥ 4.10) over
/// `included_builds` (≥ 3.3), and de-duplicated by root project name — a
/// diamond of includes contributes each build once.
fn collect_builds(root: &BuildPayload) -> Vec<&BuildPayload> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut builds = Vec::new();
    visit_build(root, &mut seen, &mut builds);
    builds
}

fn visit_build<'a>(
    build: &'a BuildPayload,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<&'a BuildPayload>,
) {
    if !seen.insert(build.root_project_name.as_str()) {
        return;
    }
    out.push(build);

    let children = build
        .editable_builds
        .as_ref()
        .or(build.included_builds.as_ref());
    if let Some(children) = children {
        for child in children {
            visit_build(child, seen, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(name: &str) -> BuildPayload {
        serde_json::from_value(json!({ "rootProjectName": name })).unwrap()
    }

    #[test]
    fn prefers_editable_builds_over_included() {
        let mut root = build("root");
        root.editable_builds = Some(vec![build("editable")]);
        root.included_builds = Some(vec![build("included")]);

        let names: Vec<&str> = collect_builds(&root)
            .iter()
            .map(|b| b.root_project_name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "editable"]);
    }

    #[test]
    fn falls_back_to_included_builds() {
        let mut root = build("root");
        root.included_builds = Some(vec![build("util")]);

        let names: Vec<&str> = collect_builds(&root)
            .iter()
            .map(|b| b.root_project_name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "util"]);
    }

    #[test]
    fn deduplicates_diamond_includes_by_root_name() {
        let mut shared_a = build("shared");
        let shared_b = build("shared");
        shared_a.included_builds = Some(vec![build("leaf")]);

        let mut root = build("root");
        root.included_builds = Some(vec![shared_a, shared_b]);

        let names: Vec<&str> = collect_builds(&root)
            .iter()
            .map(|b| b.root_project_name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "shared", "leaf"]);
    }
}
