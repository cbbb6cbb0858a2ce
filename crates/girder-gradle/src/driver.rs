//! Connector preferences and effective build-kind resolution.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::{CommandRunner, DefaultCommandRunner};
use crate::connection::ProcessConnection;
use crate::init::PluginInjector;
use crate::DriverError;

/// User preferences controlling how Gradle is located and launched.
#[derive(Debug, Clone)]
pub struct Preferences {
    /// Explicit Gradle version to run with (downloaded distribution).
    pub gradle_version: Option<String>,
    /// Explicit Gradle installation directory.
    pub gradle_home: Option<PathBuf>,
    /// Gradle user home (`~/.gradle`) override.
    pub gradle_user_home: Option<PathBuf>,
    /// JVM to run Gradle itself on.
    pub gradle_java_home: Option<PathBuf>,
    /// Extra JVM arguments for the Gradle daemon.
    pub gradle_jvm_arguments: Vec<String>,
    /// Extra command-line arguments for every invocation.
    pub gradle_arguments: Vec<String>,
    /// Prefer the project wrapper when one is present.
    pub wrapper_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            gradle_version: None,
            gradle_home: None,
            gradle_user_home: None,
            gradle_java_home: None,
            gradle_jvm_arguments: Vec::new(),
            gradle_arguments: Vec::new(),
            wrapper_enabled: true,
        }
    }
}

/// How the effective Gradle distribution is chosen, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradleBuildKind {
    /// The project's own wrapper (`gradle/wrapper/gradle-wrapper.properties`).
    Wrapper,
    /// A version named in the preferences.
    SpecifiedVersion,
    /// An installation directory named in the preferences or discovered from
    /// the environment.
    SpecifiedInstallation,
    /// Whatever distribution the tooling default resolves to.
    SystemDefault,
}

/// Entry point for opening connections against a Gradle project.
#[derive(Debug)]
pub struct GradleDriver {
    runner: Arc<dyn CommandRunner>,
    injector: PluginInjector,
}

impl GradleDriver {
    pub fn new(injector: PluginInjector) -> Self {
        Self::with_runner(injector, Arc::new(DefaultCommandRunner::default()))
    }

    pub fn with_runner(injector: PluginInjector, runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner, injector }
    }

    /// Opens a connection configured per the effective build kind.
    ///
    /// When the wrapper pins a Gradle version we can already tell is
    /// unsupported, fail here with an actionable message instead of paying
    /// for a doomed invocation.
    pub fn connect(
        &self,
        project_root: &Path,
        preferences: &Preferences,
    ) -> Result<ProcessConnection, DriverError> {
        let kind = effective_build_kind(project_root, preferences);
        if kind == GradleBuildKind::Wrapper {
            if let Some(version) = crate::wrapper::wrapper_gradle_version(project_root) {
                if !crate::compat::is_supported_gradle_version(&version) {
                    return Err(DriverError::UnsupportedGradleVersion {
                        version,
                        minimum: crate::compat::minimum_supported_gradle_version().to_string(),
                    });
                }
            }
        }
        let program = match kind {
            GradleBuildKind::Wrapper => wrapper_executable(project_root),
            GradleBuildKind::SpecifiedInstallation => {
                let home = gradle_home(preferences.gradle_home.as_deref())
                    .ok_or(DriverError::NoGradleInstallation)?;
                home.join("bin").join(gradle_executable_name())
            }
            // A pinned version launches through whatever `gradle` resolves on
            // PATH; the aggregator rejects unsupported versions from the
            // payload either way.
            GradleBuildKind::SpecifiedVersion | GradleBuildKind::SystemDefault => {
                PathBuf::from(gradle_executable_name())
            }
        };

        let mut args = Vec::new();
        if let Some(user_home) = resolved_gradle_user_home(preferences) {
            args.push("--gradle-user-home".to_string());
            args.push(user_home.to_string_lossy().into_owned());
        }
        if !preferences.gradle_jvm_arguments.is_empty() {
            args.push(format!(
                "-Dorg.gradle.jvmargs={}",
                preferences.gradle_jvm_arguments.join(" ")
            ));
        }
        args.extend(preferences.gradle_arguments.iter().cloned());

        let mut envs = Vec::new();
        if let Some(java_home) = &preferences.gradle_java_home {
            if java_home.is_dir() {
                envs.push((
                    "JAVA_HOME".to_string(),
                    java_home.to_string_lossy().into_owned(),
                ));
            }
        }

        Ok(ProcessConnection::new(
            project_root.to_path_buf(),
            program,
            args,
            envs,
            self.runner.clone(),
            self.injector.clone(),
        ))
    }
}

/// The effective build kind for a project, in the priority order the
/// preferences define.
pub fn effective_build_kind(project_root: &Path, preferences: &Preferences) -> GradleBuildKind {
    if preferences.wrapper_enabled {
        let wrapper_properties = project_root
            .join("gradle")
            .join("wrapper")
            .join("gradle-wrapper.properties");
        if wrapper_properties.is_file() {
            return GradleBuildKind::Wrapper;
        }
    }

    if preferences
        .gradle_version
        .as_deref()
        .is_some_and(|version| !version.trim().is_empty())
    {
        return GradleBuildKind::SpecifiedVersion;
    }

    if gradle_home(preferences.gradle_home.as_deref()).is_some() {
        return GradleBuildKind::SpecifiedInstallation;
    }

    GradleBuildKind::SystemDefault
}

/// Resolves the Gradle installation directory: explicit preference, then a
/// `PATH` scan, then the `GRADLE_HOME` environment variable.
pub fn gradle_home(preference: Option<&Path>) -> Option<PathBuf> {
    gradle_home_from(
        preference,
        std::env::var_os("PATH").as_deref(),
        std::env::var_os("GRADLE_HOME").as_deref(),
    )
}

fn gradle_home_from(
    preference: Option<&Path>,
    path_var: Option<&OsStr>,
    env_home: Option<&OsStr>,
) -> Option<PathBuf> {
    if let Some(home) = preference {
        if home.is_dir() {
            return Some(home.to_path_buf());
        }
    }

    if let Some(path_var) = path_var {
        for dir in std::env::split_paths(path_var) {
            if let Some(home) = installation_above_bin(&dir) {
                return Some(home);
            }
        }
    }

    env_home
        .map(PathBuf::from)
        .filter(|home| home.is_dir())
}

/// A `PATH` entry counts as a Gradle installation's `bin/` when it holds a
/// `gradle` executable and the sibling `lib/` holds `gradle-launcher-*.jar`.
fn installation_above_bin(bin_dir: &Path) -> Option<PathBuf> {
    if bin_dir.file_name() != Some(OsStr::new("bin")) {
        return None;
    }
    let gradle = bin_dir.join(gradle_executable_name());
    if !gradle.is_file() {
        return None;
    }

    let home = bin_dir.parent()?;
    let lib = home.join("lib");
    let entries = std::fs::read_dir(&lib).ok()?;
    let has_launcher = entries.filter_map(Result::ok).any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.starts_with("gradle-launcher-") && name.ends_with(".jar")
    });

    has_launcher.then(|| home.to_path_buf())
}

/// Gradle user home: explicit preference, then `GRADLE_USER_HOME`.
pub fn resolved_gradle_user_home(preferences: &Preferences) -> Option<PathBuf> {
    if let Some(home) = &preferences.gradle_user_home {
        if home.is_dir() {
            return Some(home.clone());
        }
    }
    std::env::var_os("GRADLE_USER_HOME")
        .map(PathBuf::from)
        .filter(|home| home.is_dir())
}

fn wrapper_executable(project_root: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        project_root.join("gradlew.bat")
    }
    #[cfg(not(windows))]
    {
        project_root.join("gradlew")
    }
}

fn gradle_executable_name() -> &'static str {
    #[cfg(windows)]
    {
        "gradle.bat"
    }
    #[cfg(not(windows))]
    {
        "gradle"
    }
}
