//! The connection surface the aggregator consumes.
//!
//! A connection produces the raw [`WorkspacePayload`] for one aggregation.
//! The process-backed implementation injects the init script and parses the
//! sentinel-delimited JSON blocks out of Gradle's (noisy) output: the root
//! build prints the first block, included builds print one block each.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use girder_probe::{BuildPayload, WorkspacePayload};

use crate::command::{format_command, CommandOutput, CommandRunner};
use crate::init::{PluginInjector, BUILD_JSON_BEGIN, BUILD_JSON_END, WORKSPACE_MODEL_TASK};
use crate::{CancellationToken, DriverError};

pub trait GradleConnection: Send + Sync + std::fmt::Debug {
    /// Blocks until Gradle has produced the workspace payload. A cancelled
    /// token yields [`DriverError::Cancelled`] and no partial payload.
    fn fetch_workspace(&self, cancel: &CancellationToken) -> Result<WorkspacePayload, DriverError>;
}

/// A connection that launches the configured Gradle executable.
#[derive(Debug)]
pub struct ProcessConnection {
    project_root: PathBuf,
    program: PathBuf,
    base_args: Vec<String>,
    envs: Vec<(String, String)>,
    runner: Arc<dyn CommandRunner>,
    injector: PluginInjector,
}

impl ProcessConnection {
    pub(crate) fn new(
        project_root: PathBuf,
        program: PathBuf,
        base_args: Vec<String>,
        envs: Vec<(String, String)>,
        runner: Arc<dyn CommandRunner>,
        injector: PluginInjector,
    ) -> Self {
        Self {
            project_root,
            program,
            base_args,
            envs,
            runner,
            injector,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn run_workspace_model_task(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(String, CommandOutput), DriverError> {
        let init_script = self.injector.init_script_path()?;

        let mut args: Vec<String> = vec![
            "--no-daemon".into(),
            "--console=plain".into(),
            "-q".into(),
            "--init-script".into(),
            init_script.to_string_lossy().into_owned(),
        ];
        args.extend(self.base_args.iter().cloned());
        args.push(WORKSPACE_MODEL_TASK.into());

        let command = format_command(&self.program, &args);
        let output = self
            .runner
            .run(&self.project_root, &self.program, &args, &self.envs, cancel)
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::Interrupted => DriverError::Cancelled,
                _ => DriverError::Io {
                    path: self.program.clone(),
                    source: err,
                },
            })?;
        Ok((command, output))
    }
}

impl GradleConnection for ProcessConnection {
    fn fetch_workspace(&self, cancel: &CancellationToken) -> Result<WorkspacePayload, DriverError> {
        let (command, output) = self.run_workspace_model_task(cancel)?;

        if !output.status.success() {
            return Err(DriverError::CommandFailed {
                command,
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        assemble_workspace_payload(&output.combined())
    }
}

/// One build's sentinel-delimited block.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildBlock {
    gradle_version: String,
    root_project_name: String,
    #[serde(default)]
    projects: Vec<Value>,
}

/// Parses every build block out of Gradle's combined output and assembles
/// the workspace payload: first block is the root build, the rest are its
/// included builds.
pub(crate) fn assemble_workspace_payload(output: &str) -> Result<WorkspacePayload, DriverError> {
    let mut blocks = extract_build_blocks(output)
        .into_iter()
        .map(|block| {
            serde_json::from_str::<BuildBlock>(&block)
                .map_err(|source| DriverError::MalformedPayload { source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if blocks.is_empty() {
        return Err(DriverError::PayloadMissing);
    }

    // The root task depends on the included builds' tasks, so Gradle prints
    // the included blocks first and the root block last.
    let root = blocks.pop().expect("non-empty blocks");
    let included: Vec<BuildPayload> = blocks
        .into_iter()
        .map(|block| BuildPayload {
            root_project_name: block.root_project_name,
            projects: block.projects,
            editable_builds: None,
            included_builds: None,
        })
        .collect();

    Ok(WorkspacePayload {
        gradle_version: root.gradle_version,
        root_build: BuildPayload {
            root_project_name: root.root_project_name,
            projects: root.projects,
            editable_builds: None,
            included_builds: (!included.is_empty()).then_some(included),
        },
    })
}

fn extract_build_blocks(output: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed == BUILD_JSON_BEGIN {
            current = Some(String::new());
            continue;
        }
        if trimmed == BUILD_JSON_END {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        if let Some(block) = &mut current {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_blocks_from_noisy_output() {
        let output = r#"
> Task :girderWorkspaceModel
Deprecated feature warning
GIRDER_BUILD_JSON_BEGIN
{"gradleVersion":"8.5","rootProjectName":"util","projects":[]}
GIRDER_BUILD_JSON_END
GIRDER_BUILD_JSON_BEGIN
{"gradleVersion":"8.5","rootProjectName":"app","projects":[]}
GIRDER_BUILD_JSON_END
BUILD SUCCESSFUL in 2s
"#;
        let payload = assemble_workspace_payload(output).unwrap();
        assert_eq!(payload.gradle_version, "8.5");
        assert_eq!(payload.root_build.root_project_name, "app");
        let included = payload.root_build.included_builds.unwrap();
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].root_project_name, "util");
    }

    #[test]
    fn single_block_has_no_included_builds() {
        let output = "GIRDER_BUILD_JSON_BEGIN\n{\"gradleVersion\":\"8.0\",\"rootProjectName\":\"solo\"}\nGIRDER_BUILD_JSON_END\n";
        let payload = assemble_workspace_payload(output).unwrap();
        assert_eq!(payload.root_build.root_project_name, "solo");
        assert!(payload.root_build.included_builds.is_none());
    }

    #[test]
    fn missing_markers_is_payload_missing() {
        let err = assemble_workspace_payload("BUILD SUCCESSFUL\n").unwrap_err();
        assert!(matches!(err, DriverError::PayloadMissing));
    }

    #[test]
    fn malformed_block_is_reported() {
        let output = "GIRDER_BUILD_JSON_BEGIN\n{not json}\nGIRDER_BUILD_JSON_END\n";
        let err = assemble_workspace_payload(output).unwrap_err();
        assert!(matches!(err, DriverError::MalformedPayload { .. }));
    }
}
