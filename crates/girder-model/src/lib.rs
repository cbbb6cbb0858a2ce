//! Shared source-set model for the Gradle build server.
//!
//! This crate holds the records that cross the init-script boundary: one
//! [`SourceSetModel`] per (project, source set or Android variant), plus the
//! linking pass that turns a flat list of models into a graph:
//! - classpath entries pointing at sibling archives are replaced by the class
//!   directories those archives bundle
//! - classpath entries pointing at sibling outputs become
//!   [`BuildTargetDependency`] edges
//!
//! Models are plain owned data. They are produced once per aggregation,
//! rewritten in place by [`link::link_source_sets`], and immutable after the
//! target graph publishes them.

pub mod link;
mod model;
mod version;

pub use model::{
    Artifact, BuildTargetDependency, GroovyExtension, JavaExtension, KotlinExtension,
    LanguageExtension, ModuleDependency, ScalaExtension, SourceSetModel,
};
pub use version::GradleVersion;

/// BSP language ids the model can carry extensions for.
pub mod languages {
    pub const JAVA: &str = "java";
    pub const SCALA: &str = "scala";
    pub const KOTLIN: &str = "kotlin";
    pub const GROOVY: &str = "groovy";
}
