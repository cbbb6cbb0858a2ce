//! Build-target graph construction over Gradle workspaces.
//!
//! The pipeline behind `workspace/buildTargets`: [`BuildAggregator`] drives
//! one composite fetch and probes every project, the linker (in
//! `girder-model`) rewrites classpaths into dependency edges, and
//! [`TargetGraph::store`] publishes the result as BSP build targets keyed by
//! URI and by (project path, source set). JSON-RPC framing and request
//! dispatch live elsewhere; this crate is the model core they call into.

mod aggregator;
pub mod bsp;
mod service;
mod targets;
pub mod uri;

pub use aggregator::{AggregationError, BuildAggregator};
pub use service::WorkspaceService;
pub use targets::{GradleBuildTarget, TargetGraph};

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Lookup against the current snapshot missed; surfaced to the client as
    /// a protocol error.
    #[error("no build target with id {uri}")]
    NotFound { uri: String },

    #[error("invalid build target uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
}
