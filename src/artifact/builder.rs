use std::{cmp::Ordering, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::graph::{DependencyGraphNode, LocalFileDependency, NodeId};

use super::{
    results::{SortOrder, VisitedArtifactsResults},
    ArtifactSet, ArtifactSetId, DependencyArtifactsVisitor, VisitError, VisitedArtifactSet,
};

/// Collects the artifact sets of every edge of a resolved graph, together with
/// their build dependencies.
///
/// The builder is single use: once [`ResolvedArtifactsBuilder::complete`] has
/// returned the results, every further call fails with [`VisitError::Completed`].
pub struct ResolvedArtifactsBuilder {
    build_project_dependencies: bool,
    sort_order: SortOrder,
    state: State,
}

enum State {
    Open(Collected),
    Completed,
}

#[derive(Default)]
struct Collected {
    sorted_node_ids: IndexMap<NodeId, IndexSet<ArtifactSetId>>,
    artifact_sets_by_id: Vec<VisitedArtifactSet>,
}

impl Collected {
    /// Artifact sets are stored using their id as index. A new id has to be
    /// the next free index, known ids reuse the stored set.
    fn collect_artifacts_for(
        &mut self,
        node: NodeId,
        artifacts: VisitedArtifactSet,
    ) -> Result<(), VisitError> {
        let id = artifacts.id();
        let node_ids = self
            .sorted_node_ids
            .get_mut(&node)
            .ok_or(VisitError::UnknownNode(node))?;

        let registered = self.artifact_sets_by_id.len();
        match id.index().cmp(&registered) {
            Ordering::Equal => {
                trace!("Registering artifact set {} for node {}", id, node);
                self.artifact_sets_by_id.push(artifacts);
            }
            Ordering::Less => trace!("Reusing artifact set {} for node {}", id, node),
            Ordering::Greater => {
                return Err(VisitError::UnexpectedArtifactSetId { id, registered });
            }
        }
        node_ids.insert(id);
        Ok(())
    }
}

impl ResolvedArtifactsBuilder {
    pub fn new(build_project_dependencies: bool, sort_order: SortOrder) -> Self {
        ResolvedArtifactsBuilder {
            build_project_dependencies,
            sort_order,
            state: State::Open(Collected::default()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, State::Completed)
    }

    fn collected(&mut self) -> Result<&mut Collected, VisitError> {
        match &mut self.state {
            State::Open(collected) => Ok(collected),
            State::Completed => Err(VisitError::Completed),
        }
    }

    /// Whether the build dependencies of the edge `from -> to` are left out.
    ///
    /// When project build dependencies are honoured, they are only dropped for
    /// a project-to-project edge whose source project belongs to a build other
    /// than the current one. Such an edge can close a task graph cycle spanning
    /// several builds that the current build cannot detect, and dropping it
    /// lets the cross-build cycle detection report the problem instead. This
    /// does not catch every such cycle.
    fn strips_build_dependencies(
        &self,
        from: &DependencyGraphNode,
        to: &DependencyGraphNode,
    ) -> bool {
        if !self.build_project_dependencies {
            return true;
        }
        to.metadata().is_local()
            && from
                .owner()
                .as_project()
                .is_some_and(|(build, _)| !build.is_current_build())
    }

    pub fn complete(&mut self) -> Result<VisitedArtifactsResults, VisitError> {
        match std::mem::replace(&mut self.state, State::Completed) {
            State::Open(collected) => {
                debug!(
                    "Collected {} artifact sets for {} nodes",
                    collected.artifact_sets_by_id.len(),
                    collected.sorted_node_ids.len()
                );
                Ok(VisitedArtifactsResults::new(
                    self.sort_order,
                    collected.sorted_node_ids,
                    collected.artifact_sets_by_id,
                ))
            }
            State::Completed => Err(VisitError::Completed),
        }
    }
}

impl DependencyArtifactsVisitor for ResolvedArtifactsBuilder {
    fn start_artifacts(&mut self, _root: &DependencyGraphNode) -> Result<(), VisitError> {
        self.collected().map(|_| ())
    }

    fn visit_node(&mut self, node: &DependencyGraphNode) -> Result<(), VisitError> {
        let collected = self.collected()?;
        if collected.sorted_node_ids.contains_key(&node.id()) {
            return Err(VisitError::NodeAlreadyVisited(node.id()));
        }
        collected.sorted_node_ids.insert(node.id(), IndexSet::new());
        Ok(())
    }

    fn visit_file_artifacts(
        &mut self,
        from: &DependencyGraphNode,
        _file_dependency: &LocalFileDependency,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<(), VisitError> {
        self.collected()?
            .collect_artifacts_for(from.id(), VisitedArtifactSet::Full(artifacts))
    }

    fn visit_artifacts(
        &mut self,
        from: &DependencyGraphNode,
        to: &DependencyGraphNode,
        artifacts: Arc<ArtifactSet>,
    ) -> Result<(), VisitError> {
        let strip = self.strips_build_dependencies(from, to);
        let collected = self.collected()?;
        if !collected.sorted_node_ids.contains_key(&from.id()) {
            return Err(VisitError::UnknownNode(from.id()));
        }

        let mut visited = VisitedArtifactSet::Full(artifacts);
        if strip {
            debug!(
                "Leaving out build dependencies of artifact set {} for {} -> {}",
                visited.id(),
                from.owner(),
                to.owner()
            );
            visited = visited.without_build_dependencies();
        }
        collected.collect_artifacts_for(to.id(), visited)
    }

    fn finish_artifacts(&mut self) -> Result<(), VisitError> {
        self.collected().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        artifact::{ResolvedArtifact, TaskDependency},
        graph::ConfigurationMetadata,
        model::selector::{BuildIdentifier, ComponentIdentifier, ModuleIdentifier},
    };

    use pretty_assertions::assert_eq;

    fn project_node(id: u64, build: BuildIdentifier, path: &str) -> DependencyGraphNode {
        DependencyGraphNode::new(
            NodeId(id),
            ComponentIdentifier::Project {
                build,
                path: path.to_string(),
            },
            ConfigurationMetadata::local("runtimeElements"),
        )
    }

    fn module_node(id: u64, name: &str) -> DependencyGraphNode {
        DependencyGraphNode::new(
            NodeId(id),
            ComponentIdentifier::Module {
                module: ModuleIdentifier::new("org", name),
                version: "1.0".to_string(),
            },
            ConfigurationMetadata::external("runtime"),
        )
    }

    fn artifact_set(id: usize) -> Arc<ArtifactSet> {
        Arc::new(ArtifactSet::new(
            ArtifactSetId(id),
            vec![ResolvedArtifact::new(
                format!("set{id}"),
                format!("build/libs/set{id}.jar"),
            )],
            vec![TaskDependency::new(format!(":set{id}:jar"))],
        ))
    }

    fn ids(results: &VisitedArtifactsResults, node: u64) -> Vec<usize> {
        results
            .artifact_set_ids(NodeId(node))
            .unwrap()
            .iter()
            .map(|id| id.index())
            .collect()
    }

    #[test]
    fn shared_artifact_set_is_stored_once() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n2 = module_node(2, "a");
        let n3 = module_node(3, "b");
        let shared = artifact_set(0);

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.start_artifacts(&n1).unwrap();
        builder.visit_node(&n1).unwrap();
        builder.visit_node(&n2).unwrap();
        builder.visit_node(&n3).unwrap();
        builder.visit_artifacts(&n1, &n2, shared.clone()).unwrap();
        builder.visit_artifacts(&n1, &n3, shared.clone()).unwrap();
        builder.finish_artifacts().unwrap();

        let results = builder.complete().unwrap();
        assert_eq!(results.artifact_sets().len(), 1);
        // Edge artifacts are collected into the target node, not the source.
        assert_eq!(ids(&results, 1), Vec::<usize>::new());
        assert_eq!(ids(&results, 2), vec![0]);
        assert_eq!(ids(&results, 3), vec![0]);
    }

    #[test]
    fn shared_file_artifact_set_is_recorded_once_per_node() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let files = LocalFileDependency { files: vec![] };

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        builder
            .visit_file_artifacts(&n1, &files, artifact_set(0))
            .unwrap();
        builder
            .visit_file_artifacts(&n1, &files, artifact_set(0))
            .unwrap();

        let results = builder.complete().unwrap();
        assert_eq!(results.artifact_sets().len(), 1);
        assert_eq!(ids(&results, 1), vec![0]);
    }

    #[test]
    fn node_sets_keep_first_insertion_order() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n2 = module_node(2, "a");
        let n3 = module_node(3, "b");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::ConsumerFirst);
        builder.visit_node(&n1).unwrap();
        builder.visit_node(&n3).unwrap();
        builder.visit_node(&n2).unwrap();
        builder.visit_artifacts(&n1, &n3, artifact_set(0)).unwrap();
        builder.visit_artifacts(&n1, &n3, artifact_set(1)).unwrap();
        builder.visit_artifacts(&n2, &n3, artifact_set(2)).unwrap();
        builder.visit_artifacts(&n1, &n3, artifact_set(0)).unwrap();
        builder.visit_artifacts(&n1, &n2, artifact_set(1)).unwrap();

        let results = builder.complete().unwrap();
        assert_eq!(results.sort_order(), SortOrder::ConsumerFirst);
        assert_eq!(
            results.node_ids().collect::<Vec<_>>(),
            vec![NodeId(1), NodeId(3), NodeId(2)]
        );
        assert_eq!(ids(&results, 3), vec![0, 1, 2]);
        assert_eq!(ids(&results, 2), vec![1]);
        assert_eq!(results.artifact_sets().len(), 3);
    }

    #[test]
    fn id_beyond_registry_is_a_fault() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n2 = module_node(2, "a");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        builder.visit_node(&n2).unwrap();
        builder.visit_artifacts(&n1, &n2, artifact_set(0)).unwrap();
        assert_eq!(
            builder.visit_artifacts(&n1, &n2, artifact_set(2)),
            Err(VisitError::UnexpectedArtifactSetId {
                id: ArtifactSetId(2),
                registered: 1
            })
        );
    }

    #[test]
    fn artifacts_for_unvisited_node_is_a_fault() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n2 = module_node(2, "a");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        assert_eq!(
            builder.visit_artifacts(&n1, &n2, artifact_set(0)),
            Err(VisitError::UnknownNode(NodeId(2)))
        );
        // The failed call must not register the set.
        builder.visit_node(&n2).unwrap();
        builder.visit_artifacts(&n1, &n2, artifact_set(0)).unwrap();
        assert_eq!(builder.complete().unwrap().artifact_sets().len(), 1);
    }

    #[test]
    fn artifacts_from_unvisited_node_is_a_fault() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n99 = module_node(99, "ghost");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        assert_eq!(
            builder.visit_artifacts(&n99, &n1, artifact_set(0)),
            Err(VisitError::UnknownNode(NodeId(99)))
        );
        assert!(builder.complete().unwrap().artifact_sets().is_empty());
    }

    #[test]
    fn visiting_a_node_twice_is_a_fault() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        assert_eq!(
            builder.visit_node(&n1),
            Err(VisitError::NodeAlreadyVisited(NodeId(1)))
        );
    }

    #[test]
    fn builder_is_single_use() {
        let n1 = project_node(1, BuildIdentifier::current("main"), ":");
        let n2 = module_node(2, "a");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&n1).unwrap();
        builder.complete().unwrap();
        assert!(builder.is_completed());

        assert_eq!(builder.complete().unwrap_err(), VisitError::Completed);
        assert_eq!(builder.start_artifacts(&n1), Err(VisitError::Completed));
        assert_eq!(builder.visit_node(&n2), Err(VisitError::Completed));
        assert_eq!(
            builder.visit_artifacts(&n1, &n2, artifact_set(0)),
            Err(VisitError::Completed)
        );
        let files = LocalFileDependency { files: vec![] };
        assert_eq!(
            builder.visit_file_artifacts(&n1, &files, artifact_set(0)),
            Err(VisitError::Completed)
        );
        assert_eq!(builder.finish_artifacts(), Err(VisitError::Completed));
    }

    #[test]
    fn build_dependencies_dropped_when_not_honoured() {
        let app = project_node(1, BuildIdentifier::current("main"), ":app");
        let lib = project_node(2, BuildIdentifier::current("main"), ":lib");
        let files = LocalFileDependency { files: vec![] };

        let mut builder = ResolvedArtifactsBuilder::new(false, SortOrder::Default);
        builder.visit_node(&app).unwrap();
        builder.visit_node(&lib).unwrap();
        builder.visit_artifacts(&app, &lib, artifact_set(0)).unwrap();
        builder
            .visit_file_artifacts(&app, &files, artifact_set(1))
            .unwrap();

        let results = builder.complete().unwrap();
        let edge = results.artifact_set(ArtifactSetId(0)).unwrap();
        assert!(edge.is_stripped());
        assert!(edge.build_dependencies().is_empty());
        assert_eq!(edge.artifacts().len(), 1);

        let file = results.artifact_set(ArtifactSetId(1)).unwrap();
        assert!(!file.is_stripped());
        assert_eq!(file.build_dependencies(), &[TaskDependency::new(":set1:jar")]);
    }

    #[test]
    fn cross_build_project_edge_drops_build_dependencies() {
        let included = project_node(1, BuildIdentifier::included("tools"), ":cli");
        let lib = project_node(2, BuildIdentifier::current("main"), ":lib");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&included).unwrap();
        builder.visit_node(&lib).unwrap();
        builder.visit_artifacts(&included, &lib, artifact_set(0)).unwrap();

        let results = builder.complete().unwrap();
        assert!(results.artifact_set(ArtifactSetId(0)).unwrap().is_stripped());
    }

    #[test]
    fn same_build_project_edge_keeps_build_dependencies() {
        let app = project_node(1, BuildIdentifier::current("main"), ":app");
        let lib = project_node(2, BuildIdentifier::current("main"), ":lib");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&app).unwrap();
        builder.visit_node(&lib).unwrap();
        builder.visit_artifacts(&app, &lib, artifact_set(0)).unwrap();

        let results = builder.complete().unwrap();
        let set = results.artifact_set(ArtifactSetId(0)).unwrap();
        assert!(!set.is_stripped());
        assert_eq!(set.build_dependencies(), &[TaskDependency::new(":set0:jar")]);
    }

    #[test]
    fn cross_build_edge_to_external_metadata_keeps_build_dependencies() {
        let included = project_node(1, BuildIdentifier::included("tools"), ":cli");
        let external = module_node(2, "a");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&included).unwrap();
        builder.visit_node(&external).unwrap();
        builder
            .visit_artifacts(&included, &external, artifact_set(0))
            .unwrap();

        let results = builder.complete().unwrap();
        assert!(!results.artifact_set(ArtifactSetId(0)).unwrap().is_stripped());
    }

    #[test]
    fn module_owner_never_drops_build_dependencies() {
        let external = module_node(1, "a");
        let lib = project_node(2, BuildIdentifier::current("main"), ":lib");

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&external).unwrap();
        builder.visit_node(&lib).unwrap();
        builder.visit_artifacts(&external, &lib, artifact_set(0)).unwrap();

        let results = builder.complete().unwrap();
        assert!(!results.artifact_set(ArtifactSetId(0)).unwrap().is_stripped());
    }

    #[test]
    fn first_recorded_view_of_a_set_is_kept() {
        let included = project_node(1, BuildIdentifier::included("tools"), ":cli");
        let app = project_node(2, BuildIdentifier::current("main"), ":app");
        let lib = project_node(3, BuildIdentifier::current("main"), ":lib");
        let shared = artifact_set(0);

        let mut builder = ResolvedArtifactsBuilder::new(true, SortOrder::Default);
        builder.visit_node(&included).unwrap();
        builder.visit_node(&app).unwrap();
        builder.visit_node(&lib).unwrap();
        builder
            .visit_artifacts(&included, &lib, shared.clone())
            .unwrap();
        builder.visit_artifacts(&app, &lib, shared).unwrap();

        let results = builder.complete().unwrap();
        assert_eq!(results.artifact_sets().len(), 1);
        assert!(results.artifact_set(ArtifactSetId(0)).unwrap().is_stripped());
        assert_eq!(ids(&results, 3), vec![0]);
    }
}
