use log::{info, warn};
use thiserror::Error;

use crate::{
    artifact::{
        builder::ResolvedArtifactsBuilder,
        results::{SortOrder, VisitedArtifactsResults},
        VisitError,
    },
    model::{scenario::Scenario, selector::ComponentSelector},
    notation::ComponentSelectorParser,
    substitution::{rules::DependencySubstitutionRules, SubstitutionError, SubstitutionResult},
};

mod builder;

pub use builder::ResolutionCoreBuilder;

pub struct ResolutionCore {
    parser: ComponentSelectorParser,
    sort_order: SortOrder,
    build_project_dependencies: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
    #[error("Could not collect resolved artifacts: {0}")]
    Artifacts(#[from] VisitError),
}

/// Outcome of running a [`Scenario`]: the substitution result of every
/// request, in request order, and the artifacts collected from its graph.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub substitutions: Vec<SubstitutionResult>,
    pub artifacts: VisitedArtifactsResults,
}

impl ResolutionCore {
    pub fn builder() -> ResolutionCoreBuilder {
        ResolutionCoreBuilder::default()
    }

    /// Parser for target notations, bound to the current build.
    pub fn parser(&self) -> &ComponentSelectorParser {
        &self.parser
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn build_project_dependencies(&self) -> bool {
        self.build_project_dependencies
    }

    /// Runs `rules` against a single requested dependency
    pub fn substitute(
        &self,
        rules: &DependencySubstitutionRules,
        requested: ComponentSelector,
        reason: Option<String>,
    ) -> Result<SubstitutionResult, SubstitutionError> {
        rules.apply(requested, reason, &self.parser)
    }

    /// A fresh artifacts builder, to be driven by one graph traversal.
    pub fn artifacts_builder(&self) -> ResolvedArtifactsBuilder {
        ResolvedArtifactsBuilder::new(self.build_project_dependencies, self.sort_order)
    }

    pub fn resolve(&self, scenario: &Scenario) -> Result<ScenarioReport, ResolveError> {
        if &scenario.current_build != self.parser.current_build() {
            warn!(
                "Scenario was loaded for build {}, resolving it in build {}",
                scenario.current_build,
                self.parser.current_build()
            );
        }

        let rules = scenario.substitution_rules();
        let substitutions = scenario
            .requests
            .iter()
            .map(|request| {
                self.substitute(&rules, request.selector.clone(), request.reason.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = self.artifacts_builder();
        scenario.graph.visit(&mut builder)?;
        let artifacts = builder.complete()?;

        info!(
            "Resolved {} requests ({} substituted) and {} artifact sets",
            substitutions.len(),
            substitutions.iter().filter(|s| s.is_updated()).count(),
            artifacts.artifact_sets().len()
        );

        Ok(ScenarioReport {
            substitutions,
            artifacts,
        })
    }
}
