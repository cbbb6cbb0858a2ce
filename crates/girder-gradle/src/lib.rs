//! Gradle driver: how the build server reaches a Gradle project.
//!
//! - [`Preferences`] + [`effective_build_kind`] decide which distribution
//!   runs a build (wrapper, pinned version, explicit installation, or the
//!   system default), with installation discovery over `PATH` and
//!   `GRADLE_HOME`.
//! - [`PluginInjector`] keeps the probe init script on disk.
//! - [`GradleConnection`] is the surface the aggregator consumes; the
//!   process-backed implementation parses sentinel-delimited JSON out of the
//!   injected task's output.
//! - [`compat`] carries the Gradle ↔ JDK compatibility matrix.
//! - [`BuildInvoker`] is the opaque compile/test execution contract.

pub mod compat;
mod command;
mod connection;
mod driver;
mod init;
mod invoker;
mod wrapper;

use std::path::PathBuf;

pub use command::{CommandOutput, CommandRunner, DefaultCommandRunner};
pub use connection::{GradleConnection, ProcessConnection};
pub use driver::{
    effective_build_kind, gradle_home, resolved_gradle_user_home, GradleBuildKind, GradleDriver,
    Preferences,
};
pub use init::{PluginInjector, BUILD_JSON_BEGIN, BUILD_JSON_END, WORKSPACE_MODEL_TASK};
pub use invoker::{BuildInvoker, BuildOutcome, ProcessBuildInvoker, ProgressEvent, TestSelector};
pub use wrapper::wrapper_gradle_version;

pub use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(
        "Gradle {version} is not supported; the oldest supported version is {minimum}. \
         Configure a newer Gradle version or wrapper for this project."
    )]
    UnsupportedGradleVersion { version: String, minimum: String },

    #[error("no usable Gradle installation found (preferences, PATH, or GRADLE_HOME)")]
    NoGradleInstallation,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gradle invocation failed with exit code {code:?}: {command}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("gradle output contained no workspace payload")]
    PayloadMissing,

    #[error("workspace payload is malformed: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    #[error("gradle invocation was cancelled")]
    Cancelled,
}
