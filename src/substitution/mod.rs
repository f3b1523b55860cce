pub mod descriptor;
pub mod rules;

use log::debug;
use thiserror::Error;

use crate::{
    model::selector::ComponentSelector,
    notation::{NotationError, NotationParser, TargetNotation},
};

use descriptor::{ComponentSelectionCause, ComponentSelectionDescriptor};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("Invalid substitution target: {0}")]
    InvalidNotation(#[from] NotationError),
    #[error("Must specify version for target of dependency substitution, got `{target}`")]
    MissingTargetVersion { target: ComponentSelector },
    #[error("Dependency substitution rule failed for `{requested}`: {source}")]
    RuleFailed {
        requested: ComponentSelector,
        source: Box<SubstitutionError>,
    },
}

/// The substitution decision for a single unresolved dependency edge.
///
/// Created when rule evaluation starts for the edge and mutated by each rule in
/// turn. Only `target` and the selection descriptor ever change, and they
/// always change together.
pub struct DependencySubstitution<'a> {
    requested: ComponentSelector,
    target: ComponentSelector,
    selection_description: ComponentSelectionDescriptor,
    parser: &'a dyn NotationParser,
}

impl<'a> DependencySubstitution<'a> {
    pub fn new(
        requested: ComponentSelector,
        reason: Option<String>,
        parser: &'a dyn NotationParser,
    ) -> Self {
        let selection_description = match reason {
            Some(reason) => ComponentSelectionDescriptor::requested().with_reason(reason),
            None => ComponentSelectionDescriptor::requested(),
        };
        DependencySubstitution {
            target: requested.clone(),
            requested,
            selection_description,
            parser,
        }
    }

    pub fn requested(&self) -> &ComponentSelector {
        &self.requested
    }

    pub fn target(&self) -> &ComponentSelector {
        &self.target
    }

    pub fn selection_description(&self) -> &ComponentSelectionDescriptor {
        &self.selection_description
    }

    pub fn is_updated(&self) -> bool {
        self.selection_description.cause() != ComponentSelectionCause::Requested
    }

    pub fn use_target(
        &mut self,
        notation: impl Into<TargetNotation>,
    ) -> Result<(), SubstitutionError> {
        self.use_target_with(notation, ComponentSelectionDescriptor::selected_by_rule())
    }

    pub fn use_target_because(
        &mut self,
        notation: impl Into<TargetNotation>,
        reason: impl Into<String>,
    ) -> Result<(), SubstitutionError> {
        self.use_target_with(
            notation,
            ComponentSelectionDescriptor::selected_by_rule().with_reason(reason),
        )
    }

    /// Replaces target and descriptor in one step.
    ///
    /// The notation is parsed and the resulting selector validated before
    /// anything is modified, so a failed call leaves the previous state intact.
    pub fn use_target_with(
        &mut self,
        notation: impl Into<TargetNotation>,
        selection_description: ComponentSelectionDescriptor,
    ) -> Result<(), SubstitutionError> {
        let target = self.parser.parse_notation(&notation.into())?;
        validate_target(&target)?;

        debug!(
            "Substituting {} with {} ({})",
            self.requested, target, selection_description
        );
        self.target = target;
        self.selection_description = selection_description;
        Ok(())
    }

    pub fn into_result(self) -> SubstitutionResult {
        SubstitutionResult {
            requested: self.requested,
            target: self.target,
            selection_description: self.selection_description,
        }
    }
}

/// A substitution target has to pin what gets resolved. Requested dependencies
/// may leave the version to platforms or BOMs, substitution targets may not.
pub fn validate_target(selector: &ComponentSelector) -> Result<(), SubstitutionError> {
    if selector.is_unversioned_module() {
        return Err(SubstitutionError::MissingTargetVersion {
            target: selector.clone(),
        });
    }
    Ok(())
}

/// Outcome of rule evaluation for one edge, as read by the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub requested: ComponentSelector,
    pub target: ComponentSelector,
    pub selection_description: ComponentSelectionDescriptor,
}

impl SubstitutionResult {
    pub fn is_updated(&self) -> bool {
        self.selection_description.cause() != ComponentSelectionCause::Requested
    }
}
