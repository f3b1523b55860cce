use std::fmt::{Display, Formatter};

/// Why a component was selected for a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ComponentSelectionCause {
    Requested,
    Root,
    Forced,
    ConflictResolution,
    SelectedByRule,
    CompositeBuild,
    Rejection,
    Constraint,
    ByAncestor,
}

impl ComponentSelectionCause {
    pub fn default_reason(&self) -> &'static str {
        match self {
            ComponentSelectionCause::Requested => "requested",
            ComponentSelectionCause::Root => "root",
            ComponentSelectionCause::Forced => "forced",
            ComponentSelectionCause::ConflictResolution => "conflict resolution",
            ComponentSelectionCause::SelectedByRule => "selected by rule",
            ComponentSelectionCause::CompositeBuild => "composite build substitution",
            ComponentSelectionCause::Rejection => "rejection",
            ComponentSelectionCause::Constraint => "constraint",
            ComponentSelectionCause::ByAncestor => "by ancestor",
        }
    }
}

impl Display for ComponentSelectionCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_reason())
    }
}

/// Immutable audit record of a selection. Every rewrite builds a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentSelectionDescriptor {
    cause: ComponentSelectionCause,
    reason: Option<String>,
}

impl ComponentSelectionDescriptor {
    pub fn new(cause: ComponentSelectionCause, reason: Option<String>) -> Self {
        ComponentSelectionDescriptor { cause, reason }
    }

    pub fn requested() -> Self {
        Self::new(ComponentSelectionCause::Requested, None)
    }

    pub fn selected_by_rule() -> Self {
        Self::new(ComponentSelectionCause::SelectedByRule, None)
    }

    pub fn with_reason(&self, reason: impl Into<String>) -> Self {
        Self::new(self.cause, Some(reason.into()))
    }

    pub fn cause(&self) -> ComponentSelectionCause {
        self.cause
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn has_custom_description(&self) -> bool {
        self.reason.is_some()
    }

    /// The custom reason if one was given, otherwise the cause's default text.
    pub fn description(&self) -> &str {
        self.reason
            .as_deref()
            .unwrap_or_else(|| self.cause.default_reason())
    }
}

impl Display for ComponentSelectionDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.cause, reason),
            None => write!(f, "{}", self.cause),
        }
    }
}
