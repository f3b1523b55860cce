use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, error};
use serde::Deserialize;

use crate::{
    artifact::{ArtifactSet, ArtifactSetId, ResolvedArtifact, TaskDependency},
    graph::{
        ConfigurationMetadata, DependencyGraph, DependencyGraphNode, LocalFileDependency, NodeId,
    },
    model::{
        selector::{BuildIdentifier, ComponentIdentifier, ComponentSelector},
        ParseError,
    },
    notation::{ComponentSelectorParser, NotationParser, TargetNotation},
    substitution::rules::{DependencySubstitutionRules, SelectorSubstitution},
};

const DEFAULT_BUILD_NAME: &str = "main";
const DEFAULT_CONFIGURATION: &str = "default";

/// A requested dependency that substitution rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub selector: ComponentSelector,
    pub reason: Option<String>,
}

/// A resolution described in a TOML file: the dependencies to run the
/// substitution rules against, and an already resolved graph whose artifacts
/// get collected.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub current_build: BuildIdentifier,
    pub requests: Vec<Request>,
    pub substitutions: Vec<SelectorSubstitution>,
    pub graph: DependencyGraph,
}

#[derive(Debug, Deserialize)]
struct RawScenario {
    current_build: Option<String>,
    #[serde(default)]
    requests: Vec<RawRequest>,
    #[serde(default)]
    substitutions: Vec<RawSubstitution>,
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    artifact_sets: Vec<RawArtifactSet>,
    #[serde(default)]
    edges: Vec<RawEdge>,
    #[serde(default)]
    file_dependencies: Vec<RawFileDependency>,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    selector: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubstitution {
    from: String,
    to: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: u64,
    component: String,
    configuration: Option<String>,
    local: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawArtifactSet {
    id: usize,
    #[serde(default)]
    artifacts: Vec<PathBuf>,
    #[serde(default)]
    tasks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    from: u64,
    to: u64,
    artifacts: usize,
}

#[derive(Debug, Deserialize)]
struct RawFileDependency {
    from: u64,
    #[serde(default)]
    files: Vec<PathBuf>,
    artifacts: usize,
}

impl Scenario {
    /// Loads a scenario file. `current_build`, when given, takes precedence over
    /// the `current_build` key of the file.
    pub fn from_file(path: &Path, current_build: Option<&str>) -> Result<Scenario, ParseError> {
        debug!("Attempting to read scenario from file {}", path.display());
        let contents = std::fs::read_to_string(path)?;

        let scenario = Scenario::from_toml_str(&contents, current_build);
        if let Err(err) = &scenario {
            error!("Could not build a valid scenario from {}: {err}", path.display())
        }
        scenario
    }

    pub fn from_toml_str(data: &str, current_build: Option<&str>) -> Result<Scenario, ParseError> {
        let raw = toml::from_str::<RawScenario>(data)?;

        let current_build = BuildIdentifier::current(
            current_build
                .map(str::to_string)
                .or(raw.current_build)
                .unwrap_or_else(|| DEFAULT_BUILD_NAME.to_string()),
        );
        let parser = ComponentSelectorParser::new(current_build.clone());

        let requests = raw
            .requests
            .into_iter()
            .map(|request| {
                Ok(Request {
                    selector: parser.parse_notation(&request.selector.into())?,
                    reason: request.reason,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let substitutions = raw
            .substitutions
            .into_iter()
            .map(|substitution| parse_substitution(&parser, substitution))
            .collect::<Result<Vec<_>, _>>()?;

        let artifact_sets = parse_artifact_sets(raw.artifact_sets)?;
        let graph = parse_graph(
            &parser,
            raw.nodes,
            raw.edges,
            raw.file_dependencies,
            &artifact_sets,
        )?;

        Ok(Scenario {
            current_build,
            requests,
            substitutions,
            graph,
        })
    }

    pub fn substitution_rules(&self) -> DependencySubstitutionRules {
        let mut rules = DependencySubstitutionRules::new();
        for substitution in &self.substitutions {
            rules.substitute(substitution.clone());
        }
        rules
    }
}

fn parse_substitution(
    parser: &ComponentSelectorParser,
    raw: RawSubstitution,
) -> Result<SelectorSubstitution, ParseError> {
    let from = parser.parse_notation(&raw.from.into())?;
    // The target stays a notation: it is only interpreted when the rule runs.
    let substitution = SelectorSubstitution::new(from, TargetNotation::Text(raw.to));
    Ok(match raw.reason {
        Some(reason) => substitution.because(reason),
        None => substitution,
    })
}

fn parse_artifact_sets(
    raw: Vec<RawArtifactSet>,
) -> Result<HashMap<usize, Arc<ArtifactSet>>, ParseError> {
    let mut sets = HashMap::new();
    for set in raw {
        let artifacts = set
            .artifacts
            .into_iter()
            .map(|file| {
                let name = file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();
                ResolvedArtifact::new(name, file)
            })
            .collect();
        let tasks = set.tasks.into_iter().map(TaskDependency::new).collect();
        let artifact_set = ArtifactSet::new(ArtifactSetId(set.id), artifacts, tasks);
        if sets.insert(set.id, Arc::new(artifact_set)).is_some() {
            return Err(ParseError::DuplicateArtifactSet(set.id));
        }
    }
    Ok(sets)
}

fn parse_node(
    parser: &ComponentSelectorParser,
    raw: RawNode,
) -> Result<DependencyGraphNode, ParseError> {
    let owner = match parser.parse_notation(&raw.component.clone().into())? {
        ComponentSelector::Module {
            module,
            version: Some(version),
        } => ComponentIdentifier::Module { module, version },
        ComponentSelector::Module { version: None, .. } => {
            return Err(ParseError::UnversionedComponent(raw.component));
        }
        ComponentSelector::Project { build, path } => ComponentIdentifier::Project { build, path },
    };

    let configuration = raw
        .configuration
        .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string());
    let local = raw.local.unwrap_or(owner.as_project().is_some());
    let metadata = ConfigurationMetadata {
        name: configuration,
        local,
    };

    Ok(DependencyGraphNode::new(NodeId(raw.id), owner, metadata))
}

fn parse_graph(
    parser: &ComponentSelectorParser,
    nodes: Vec<RawNode>,
    edges: Vec<RawEdge>,
    file_dependencies: Vec<RawFileDependency>,
    artifact_sets: &HashMap<usize, Arc<ArtifactSet>>,
) -> Result<DependencyGraph, ParseError> {
    let mut nodes = nodes.into_iter();
    let root = nodes
        .next()
        .ok_or_else(|| ParseError::MissingKey("nodes".to_string()))?;

    let mut graph = DependencyGraph::new(parse_node(parser, root)?);
    for node in nodes {
        graph.add_node(parse_node(parser, node)?)?;
    }

    let artifact_set = |id: usize| {
        artifact_sets
            .get(&id)
            .cloned()
            .ok_or(ParseError::UnknownArtifactSet(id))
    };

    for edge in edges {
        graph.add_edge(
            NodeId(edge.from),
            NodeId(edge.to),
            artifact_set(edge.artifacts)?,
        )?;
    }
    for file_dependency in file_dependencies {
        graph.add_file_dependency(
            NodeId(file_dependency.from),
            LocalFileDependency {
                files: file_dependency.files,
            },
            artifact_set(file_dependency.artifacts)?,
        )?;
    }

    Ok(graph)
}
