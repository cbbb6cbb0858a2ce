//! Ties the pipeline together for request handlers.

use std::sync::Arc;

use girder_gradle::{CancellationToken, GradleConnection};
use girder_model::SourceSetModel;

use crate::aggregator::{AggregationError, BuildAggregator};
use crate::targets::{GradleBuildTarget, TargetGraph};

/// The `workspace/buildTargets` entry point: aggregate, link, publish.
///
/// The graph is only touched on success; a failed or cancelled aggregation
/// leaves the previous snapshot in place for readers.
#[derive(Debug)]
pub struct WorkspaceService<C> {
    aggregator: BuildAggregator<C>,
    graph: Arc<TargetGraph>,
}

impl<C: GradleConnection> WorkspaceService<C> {
    pub fn new(connection: C, graph: Arc<TargetGraph>) -> Self {
        Self {
            aggregator: BuildAggregator::new(connection),
            graph,
        }
    }

    pub fn graph(&self) -> &Arc<TargetGraph> {
        &self.graph
    }

    /// Rebuilds the snapshot from a fresh aggregation and returns the new
    /// target list.
    pub fn reload_targets(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<GradleBuildTarget>>, AggregationError> {
        let models: Vec<SourceSetModel> = self.aggregator.run(cancel)?;
        tracing::debug!(count = models.len(), "aggregation finished; publishing snapshot");
        Ok(self.graph.store(models))
    }
}
