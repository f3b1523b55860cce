use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::NodeId;

use super::{ArtifactSetId, TaskDependency, VisitedArtifactSet};

/// Order in which the linearization stage emits node artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Default,
    ConsumerFirst,
    DependencyFirst,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown sort order `{0}`, expected one of default, consumer_first, dependency_first")]
pub struct UnknownSortOrder(String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.to_ascii_lowercase().replace('-', "_");
        match value.as_str() {
            "default" => Ok(SortOrder::Default),
            "consumer_first" => Ok(SortOrder::ConsumerFirst),
            "dependency_first" => Ok(SortOrder::DependencyFirst),
            _ => Err(UnknownSortOrder(value)),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Default => f.write_str("default"),
            SortOrder::ConsumerFirst => f.write_str("consumer_first"),
            SortOrder::DependencyFirst => f.write_str("dependency_first"),
        }
    }
}

/// Snapshot of everything collected while visiting a resolved graph, handed to
/// the stage that orders and flattens the artifacts.
#[derive(Debug, Clone)]
pub struct VisitedArtifactsResults {
    sort_order: SortOrder,
    sorted_node_ids: IndexMap<NodeId, IndexSet<ArtifactSetId>>,
    artifact_sets_by_id: Vec<VisitedArtifactSet>,
}

impl VisitedArtifactsResults {
    pub(crate) fn new(
        sort_order: SortOrder,
        sorted_node_ids: IndexMap<NodeId, IndexSet<ArtifactSetId>>,
        artifact_sets_by_id: Vec<VisitedArtifactSet>,
    ) -> Self {
        VisitedArtifactsResults {
            sort_order,
            sorted_node_ids,
            artifact_sets_by_id,
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Node ids in the order the nodes were visited.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.sorted_node_ids.keys().copied()
    }

    pub fn artifact_set_ids(&self, node: NodeId) -> Option<&IndexSet<ArtifactSetId>> {
        self.sorted_node_ids.get(&node)
    }

    pub fn artifact_set(&self, id: ArtifactSetId) -> Option<&VisitedArtifactSet> {
        self.artifact_sets_by_id.get(id.index())
    }

    /// All artifact sets, indexed by id.
    pub fn artifact_sets(&self) -> &[VisitedArtifactSet] {
        &self.artifact_sets_by_id
    }

    pub fn artifacts_for(&self, node: NodeId) -> impl Iterator<Item = &VisitedArtifactSet> + '_ {
        self.sorted_node_ids
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.artifact_sets_by_id.get(id.index()))
    }

    pub fn build_dependencies(&self) -> IndexSet<&TaskDependency> {
        self.artifact_sets_by_id
            .iter()
            .flat_map(|set| set.build_dependencies())
            .collect()
    }
}
