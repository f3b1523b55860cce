use log::trace;

use crate::{
    model::selector::ComponentSelector,
    notation::{NotationParser, TargetNotation},
};

use super::{DependencySubstitution, SubstitutionError, SubstitutionResult};

pub trait SubstitutionRule {
    fn apply(
        &self,
        substitution: &mut DependencySubstitution<'_>,
    ) -> Result<(), SubstitutionError>;
}

impl<F> SubstitutionRule for F
where
    F: Fn(&mut DependencySubstitution<'_>) -> Result<(), SubstitutionError>,
{
    fn apply(
        &self,
        substitution: &mut DependencySubstitution<'_>,
    ) -> Result<(), SubstitutionError> {
        self(substitution)
    }
}

/// Replaces every requested dependency matched by `from` with `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSubstitution {
    from: ComponentSelector,
    to: TargetNotation,
    reason: Option<String>,
}

impl SelectorSubstitution {
    pub fn new(from: ComponentSelector, to: impl Into<TargetNotation>) -> Self {
        SelectorSubstitution {
            from,
            to: to.into(),
            reason: None,
        }
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl SubstitutionRule for SelectorSubstitution {
    fn apply(
        &self,
        substitution: &mut DependencySubstitution<'_>,
    ) -> Result<(), SubstitutionError> {
        if !self.from.matches(substitution.requested()) {
            return Ok(());
        }
        match &self.reason {
            Some(reason) => substitution.use_target_because(self.to.clone(), reason.as_str()),
            None => substitution.use_target(self.to.clone()),
        }
    }
}

/// Ordered substitution rules, evaluated serially against each dependency edge.
#[derive(Default)]
pub struct DependencySubstitutionRules {
    rules: Vec<Box<dyn SubstitutionRule>>,
}

impl DependencySubstitutionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule that sees every dependency edge.
    pub fn all<F>(&mut self, rule: F) -> &mut Self
    where
        F: Fn(&mut DependencySubstitution<'_>) -> Result<(), SubstitutionError> + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn substitute(&mut self, rule: SelectorSubstitution) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Runs every rule against a fresh substitution for `requested`. Each rule
    /// starts from the target and descriptor left by the previous one.
    pub fn apply(
        &self,
        requested: ComponentSelector,
        reason: Option<String>,
        parser: &dyn NotationParser,
    ) -> Result<SubstitutionResult, SubstitutionError> {
        let mut substitution = DependencySubstitution::new(requested, reason, parser);
        for rule in &self.rules {
            rule.apply(&mut substitution)
                .map_err(|source| SubstitutionError::RuleFailed {
                    requested: substitution.requested().clone(),
                    source: Box::new(source),
                })?;
        }
        trace!(
            "Evaluated {} substitution rules for {}",
            self.rules.len(),
            substitution.requested()
        );
        Ok(substitution.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        model::selector::BuildIdentifier,
        notation::ComponentSelectorParser,
        substitution::descriptor::{ComponentSelectionCause, ComponentSelectionDescriptor},
    };

    use pretty_assertions::assert_eq;

    fn parser() -> ComponentSelectorParser {
        ComponentSelectorParser::new(BuildIdentifier::current("main"))
    }

    #[test]
    fn no_rules_keeps_requested() {
        let rules = DependencySubstitutionRules::new();
        let requested = ComponentSelector::module("org", "lib", "1.0");
        let result = rules.apply(requested.clone(), None, &parser()).unwrap();
        assert_eq!(result.target, requested);
        assert!(!result.is_updated());
        assert!(rules.is_empty());
    }

    #[test]
    fn selector_rule_only_touches_matches() {
        let mut rules = DependencySubstitutionRules::new();
        rules.substitute(
            SelectorSubstitution::new(
                ComponentSelector::unversioned_module("org", "closed"),
                "org:open:2.0",
            )
            .because("prefer open variant"),
        );

        let result = rules
            .apply(ComponentSelector::module("org", "closed", "1.3"), None, &parser())
            .unwrap();
        assert_eq!(result.target, ComponentSelector::module("org", "open", "2.0"));
        assert_eq!(
            result.selection_description,
            ComponentSelectionDescriptor::selected_by_rule().with_reason("prefer open variant")
        );

        let untouched = rules
            .apply(ComponentSelector::module("org", "other", "1.0"), None, &parser())
            .unwrap();
        assert!(!untouched.is_updated());
    }

    #[test]
    fn rules_chain_and_last_wins() {
        let mut rules = DependencySubstitutionRules::new();
        rules
            .substitute(SelectorSubstitution::new(
                ComponentSelector::unversioned_module("org", "a"),
                "org:b:1.0",
            ))
            .all(|details| {
                if details.target() == &ComponentSelector::module("org", "b", "1.0") {
                    details.use_target_with(
                        "project(':b')",
                        ComponentSelectionDescriptor::new(
                            ComponentSelectionCause::CompositeBuild,
                            None,
                        ),
                    )?;
                }
                Ok(())
            });
        assert_eq!(rules.len(), 2);

        let result = rules
            .apply(ComponentSelector::module("org", "a", "0.1"), None, &parser())
            .unwrap();
        assert_eq!(result.requested, ComponentSelector::module("org", "a", "0.1"));
        assert_eq!(
            result.target,
            ComponentSelector::project(BuildIdentifier::current("main"), ":b")
        );
        assert_eq!(
            result.selection_description.cause(),
            ComponentSelectionCause::CompositeBuild
        );
    }

    #[test]
    fn failing_rule_reports_requested() {
        let mut rules = DependencySubstitutionRules::new();
        rules.all(|details| details.use_target("org:unpinned"));

        let requested = ComponentSelector::module("org", "lib", "1.0");
        let err = rules.apply(requested.clone(), None, &parser()).unwrap_err();
        assert_eq!(
            err,
            SubstitutionError::RuleFailed {
                requested,
                source: Box::new(SubstitutionError::MissingTargetVersion {
                    target: ComponentSelector::unversioned_module("org", "unpinned")
                }),
            }
        );
    }
}
