//! Build and test execution contract.
//!
//! Compilation and testing are delegated to Gradle launchers; the core only
//! sees this surface. Events are forwarded as they are parsed so callers can
//! stream progress to a client.

use std::path::PathBuf;
use std::sync::Arc;

use crate::command::{format_command, CommandRunner};
use crate::{CancellationToken, DriverError};

/// One observed step of a Gradle invocation. Opaque to the model core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    TaskStarted { task: String },
    Output { line: String },
}

/// Selects tests to run within one build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSelector {
    /// The test task to invoke, fully qualified (e.g. `:app:test`).
    pub task: String,
    /// Fully-qualified class names; empty means the whole task.
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
}

pub trait BuildInvoker: Send + Sync {
    fn run_build(
        &self,
        task_names: &[String],
        args: &[String],
        envs: &[(String, String)],
        on_progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, DriverError>;

    fn run_tests(
        &self,
        selectors: &[TestSelector],
        on_progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, DriverError>;
}

/// Launches tasks through the same executable the connection uses.
#[derive(Debug)]
pub struct ProcessBuildInvoker {
    project_root: PathBuf,
    program: PathBuf,
    base_args: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl ProcessBuildInvoker {
    pub fn new(
        project_root: PathBuf,
        program: PathBuf,
        base_args: Vec<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            project_root,
            program,
            base_args,
            runner,
        }
    }

    fn run(
        &self,
        args: Vec<String>,
        envs: &[(String, String)],
        on_progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, DriverError> {
        let command = format_command(&self.program, &args);
        let output = self
            .runner
            .run(&self.project_root, &self.program, &args, envs, cancel)
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::Interrupted => DriverError::Cancelled,
                _ => DriverError::Io {
                    path: self.program.clone(),
                    source: err,
                },
            })?;

        for line in output.combined().lines() {
            match line.strip_prefix("> Task ") {
                Some(task) => on_progress(ProgressEvent::TaskStarted {
                    task: task.split_whitespace().next().unwrap_or(task).to_string(),
                }),
                None => on_progress(ProgressEvent::Output {
                    line: line.to_string(),
                }),
            }
        }

        tracing::debug!(%command, code = ?output.status.code(), "gradle invocation finished");
        Ok(BuildOutcome {
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}

impl BuildInvoker for ProcessBuildInvoker {
    fn run_build(
        &self,
        task_names: &[String],
        args: &[String],
        envs: &[(String, String)],
        on_progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, DriverError> {
        let mut all_args = vec!["--console=plain".to_string()];
        all_args.extend(self.base_args.iter().cloned());
        all_args.extend(args.iter().cloned());
        all_args.extend(task_names.iter().cloned());
        self.run(all_args, envs, on_progress, cancel)
    }

    fn run_tests(
        &self,
        selectors: &[TestSelector],
        on_progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome, DriverError> {
        let mut all_args = vec!["--console=plain".to_string()];
        all_args.extend(self.base_args.iter().cloned());
        for selector in selectors {
            all_args.push(selector.task.clone());
            for class in &selector.classes {
                all_args.push("--tests".to_string());
                all_args.push(class.clone());
            }
        }
        self.run(all_args, envs_empty(), on_progress, cancel)
    }
}

fn envs_empty() -> &'static [(String, String)] {
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct StaticRunner {
        invocations: Mutex<Vec<Vec<String>>>,
        output: CommandOutput,
    }

    impl CommandRunner for StaticRunner {
        fn run(
            &self,
            _cwd: &Path,
            _program: &Path,
            args: &[String],
            _envs: &[(String, String)],
            _cancel: &CancellationToken,
        ) -> std::io::Result<CommandOutput> {
            self.invocations
                .lock()
                .expect("lock poisoned")
                .push(args.to_vec());
            Ok(self.output.clone())
        }
    }

    fn exit_status(code: i32) -> std::process::ExitStatus {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(code << 8)
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(code as u32)
        }
    }

    #[test]
    fn build_invocation_streams_task_events() {
        let runner = Arc::new(StaticRunner {
            invocations: Mutex::new(Vec::new()),
            output: CommandOutput {
                status: exit_status(0),
                stdout: "> Task :app:compileJava\nnote\n".into(),
                stderr: String::new(),
                truncated: false,
            },
        });
        let invoker = ProcessBuildInvoker::new(
            PathBuf::from("/ws"),
            PathBuf::from("gradle"),
            Vec::new(),
            runner.clone(),
        );

        let mut events = Vec::new();
        let outcome = invoker
            .run_build(
                &[":app:classes".into()],
                &[],
                &[],
                &mut |event| events.push(event),
                &CancellationToken::new(),
            )
            .unwrap();

        assert!(outcome.success);
        assert_eq!(
            events[0],
            ProgressEvent::TaskStarted {
                task: ":app:compileJava".into()
            }
        );
        let args = runner.invocations.lock().unwrap()[0].clone();
        assert!(args.contains(&":app:classes".to_string()));
    }

    #[test]
    fn test_selectors_expand_to_tests_filters() {
        let runner = Arc::new(StaticRunner {
            invocations: Mutex::new(Vec::new()),
            output: CommandOutput {
                status: exit_status(0),
                stdout: String::new(),
                stderr: String::new(),
                truncated: false,
            },
        });
        let invoker = ProcessBuildInvoker::new(
            PathBuf::from("/ws"),
            PathBuf::from("gradle"),
            Vec::new(),
            runner.clone(),
        );

        invoker
            .run_tests(
                &[TestSelector {
                    task: ":app:test".into(),
                    classes: vec!["com.example.AppTest".into()],
                }],
                &mut |_| {},
                &CancellationToken::new(),
            )
            .unwrap();

        let args = runner.invocations.lock().unwrap()[0].clone();
        let idx = args.iter().position(|a| a == ":app:test").unwrap();
        assert_eq!(args[idx + 1], "--tests");
        assert_eq!(args[idx + 2], "com.example.AppTest");
    }
}
