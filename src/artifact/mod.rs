pub mod builder;
pub mod results;

use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    sync::Arc,
};

use thiserror::Error;

use crate::graph::{DependencyGraphNode, LocalFileDependency, NodeId};

/// Index of an artifact set in the id space shared by all edges of one
/// resolution. Ids are assigned from zero without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ArtifactSetId(pub usize);

impl ArtifactSetId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ArtifactSetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedArtifact {
    pub name: String,
    pub file: PathBuf,
}

impl ResolvedArtifact {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        ResolvedArtifact {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// A task that has to run before the files of an artifact set exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TaskDependency(String);

impl TaskDependency {
    pub fn new(path: impl Into<String>) -> Self {
        TaskDependency(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The files produced for one graph edge, together with what builds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    id: ArtifactSetId,
    artifacts: Vec<ResolvedArtifact>,
    build_dependencies: Vec<TaskDependency>,
}

impl ArtifactSet {
    pub fn new(
        id: ArtifactSetId,
        artifacts: Vec<ResolvedArtifact>,
        build_dependencies: Vec<TaskDependency>,
    ) -> Self {
        ArtifactSet {
            id,
            artifacts,
            build_dependencies,
        }
    }

    pub fn id(&self) -> ArtifactSetId {
        self.id
    }

    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        &self.artifacts
    }

    pub fn build_dependencies(&self) -> &[TaskDependency] {
        &self.build_dependencies
    }
}

/// An artifact set as recorded for an edge: either complete, or with its build
/// dependencies left out. The stripped view keeps the id and the files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitedArtifactSet {
    Full(Arc<ArtifactSet>),
    NoBuildDependencies(Arc<ArtifactSet>),
}

impl VisitedArtifactSet {
    pub fn id(&self) -> ArtifactSetId {
        self.inner().id()
    }

    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        self.inner().artifacts()
    }

    pub fn build_dependencies(&self) -> &[TaskDependency] {
        match self {
            VisitedArtifactSet::Full(set) => set.build_dependencies(),
            VisitedArtifactSet::NoBuildDependencies(_) => &[],
        }
    }

    pub fn without_build_dependencies(self) -> Self {
        match self {
            VisitedArtifactSet::Full(set) => VisitedArtifactSet::NoBuildDependencies(set),
            stripped => stripped,
        }
    }

    pub fn is_stripped(&self) -> bool {
        matches!(self, VisitedArtifactSet::NoBuildDependencies(_))
    }

    fn inner(&self) -> &ArtifactSet {
        match self {
            VisitedArtifactSet::Full(set) | VisitedArtifactSet::NoBuildDependencies(set) => {
                set.as_ref()
            }
        }
    }
}

impl From<Arc<ArtifactSet>> for VisitedArtifactSet {
    fn from(set: Arc<ArtifactSet>) -> Self {
        VisitedArtifactSet::Full(set)
    }
}

/// Internal consistency faults raised while collecting artifacts. None of them
/// is recoverable: the resolution pass has to be abandoned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VisitError {
    #[error(
        "Artifact set {id} visited out of sequence: {registered} sets are registered, \
        so a new id must be {registered}"
    )]
    UnexpectedArtifactSetId { id: ArtifactSetId, registered: usize },
    #[error("Artifacts visited for node {0} before the node was visited")]
    UnknownNode(NodeId),
    #[error("Node {0} visited more than once")]
    NodeAlreadyVisited(NodeId),
    #[error("Resolved artifacts have already been completed")]
    Completed,
}

/// Visitation protocol driven by the graph traversal once resolution is done.
///
/// `start_artifacts` is called once, then `visit_node` for every node before any
/// artifacts are recorded for it, then `finish_artifacts` once.
pub trait DependencyArtifactsVisitor {
    fn start_artifacts(&mut self, root: &DependencyGraphNode) -> Result<(), VisitError>;

    fn visit_node(&mut self, node: &DependencyGraphNode) -> Result<(), VisitError>;

    /// Artifacts of a file dependency declared by `from`.
    fn visit_file_artifacts(
        &mut self,
        from: &DependencyGraphNode,
        file_dependency: &LocalFileDependency,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<(), VisitError>;

    /// Artifacts of the edge `from -> to`.
    fn visit_artifacts(
        &mut self,
        from: &DependencyGraphNode,
        to: &DependencyGraphNode,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<(), VisitError>;

    fn finish_artifacts(&mut self) -> Result<(), VisitError>;
}
