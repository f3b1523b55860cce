use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    sync::Arc,
};

use indexmap::{map::Entry, IndexMap};
use log::debug;
use thiserror::Error;

use crate::{
    artifact::{ArtifactSet, DependencyArtifactsVisitor, VisitError},
    model::selector::ComponentIdentifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The resolved configuration of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationMetadata {
    pub name: String,
    /// Whether the configuration belongs to a project of a participating build
    /// rather than to a published module.
    pub local: bool,
}

impl ConfigurationMetadata {
    pub fn local(name: impl Into<String>) -> Self {
        ConfigurationMetadata {
            name: name.into(),
            local: true,
        }
    }

    pub fn external(name: impl Into<String>) -> Self {
        ConfigurationMetadata {
            name: name.into(),
            local: false,
        }
    }

    pub fn is_local(&self) -> bool {
        self.local
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraphNode {
    id: NodeId,
    owner: ComponentIdentifier,
    metadata: ConfigurationMetadata,
}

impl DependencyGraphNode {
    pub fn new(id: NodeId, owner: ComponentIdentifier, metadata: ConfigurationMetadata) -> Self {
        DependencyGraphNode {
            id,
            owner,
            metadata,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn owner(&self) -> &ComponentIdentifier {
        &self.owner
    }

    pub fn metadata(&self) -> &ConfigurationMetadata {
        &self.metadata
    }
}

/// Files a node depends on directly, without a component in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileDependency {
    pub files: Vec<PathBuf>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node {0} is already part of the graph")]
    DuplicateNode(NodeId),
    #[error("Edge references node {0}, which is not part of the graph")]
    UnknownNode(NodeId),
}

#[derive(Debug, Clone)]
enum Edge {
    Node {
        from: NodeId,
        to: NodeId,
        artifacts: Arc<ArtifactSet>,
    },
    File {
        from: NodeId,
        dependency: LocalFileDependency,
        artifacts: Arc<ArtifactSet>,
    },
}

/// A resolved graph held in memory, able to drive a [`DependencyArtifactsVisitor`].
///
/// Every node is visited first, root first and then in insertion order. The
/// edges follow in the order they were added: node-to-node artifacts are
/// reported for their target node, file dependency artifacts for the
/// declaring node. Edges may only reference nodes already in the graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    root: NodeId,
    nodes: IndexMap<NodeId, DependencyGraphNode>,
    edges: Vec<Edge>,
}

impl DependencyGraph {
    pub fn new(root: DependencyGraphNode) -> Self {
        DependencyGraph {
            root: root.id,
            nodes: IndexMap::from([(root.id, root)]),
            edges: Vec::new(),
        }
    }

    pub fn root(&self) -> &DependencyGraphNode {
        &self.nodes[&self.root]
    }

    pub fn add_node(&mut self, node: DependencyGraphNode) -> Result<&mut Self, GraphError> {
        match self.nodes.entry(node.id) {
            Entry::Occupied(_) => return Err(GraphError::DuplicateNode(node.id)),
            Entry::Vacant(entry) => {
                entry.insert(node);
            }
        }
        Ok(self)
    }

    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<&mut Self, GraphError> {
        self.require_node(from)?;
        self.require_node(to)?;
        self.edges.push(Edge::Node {
            from,
            to,
            artifacts,
        });
        Ok(self)
    }

    pub fn add_file_dependency(
        &mut self,
        from: NodeId,
        dependency: LocalFileDependency,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<&mut Self, GraphError> {
        self.require_node(from)?;
        self.edges.push(Edge::File {
            from,
            dependency,
            artifacts,
        });
        Ok(self)
    }

    fn require_node(&self, id: NodeId) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&DependencyGraphNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &DependencyGraphNode> + '_ {
        self.nodes.values()
    }

    pub fn visit(&self, visitor: &mut dyn DependencyArtifactsVisitor) -> Result<(), VisitError> {
        debug!(
            "Visiting artifacts of {} nodes and {} edges",
            self.nodes.len(),
            self.edges.len()
        );
        let lookup = |id: NodeId| self.nodes.get(&id).ok_or(VisitError::UnknownNode(id));

        visitor.start_artifacts(self.root())?;
        for node in self.nodes.values() {
            visitor.visit_node(node)?;
        }

        for edge in &self.edges {
            match edge {
                Edge::Node {
                    from,
                    to,
                    artifacts,
                } => visitor.visit_artifacts(lookup(*from)?, lookup(*to)?, artifacts.clone())?,
                Edge::File {
                    from,
                    dependency,
                    artifacts,
                } => visitor.visit_file_artifacts(lookup(*from)?, dependency, artifacts.clone())?,
            }
        }
        visitor.finish_artifacts()
    }
}
