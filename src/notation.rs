use regex_lite::Regex;
use thiserror::Error;

use crate::model::selector::{BuildIdentifier, ComponentSelector};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotationError {
    #[error("Empty notation cannot be converted to a component selector")]
    Empty,
    #[error(
        "Cannot convert `{0}` to a component selector. Supported notations are \
        `group:module`, `group:module:version` and `project(':path')`"
    )]
    Unsupported(String),
}

/// An untyped substitution target, as handed to a substitution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetNotation {
    Selector(ComponentSelector),
    Text(String),
}

impl From<ComponentSelector> for TargetNotation {
    fn from(selector: ComponentSelector) -> Self {
        TargetNotation::Selector(selector)
    }
}

impl From<&str> for TargetNotation {
    fn from(s: &str) -> Self {
        TargetNotation::Text(s.to_string())
    }
}

impl From<String> for TargetNotation {
    fn from(s: String) -> Self {
        TargetNotation::Text(s)
    }
}

pub trait NotationParser {
    fn parse_notation(
        &self,
        notation: &TargetNotation,
    ) -> Result<ComponentSelector, NotationError>;
}

/// Parses textual notations relative to the build currently executing.
pub struct ComponentSelectorParser {
    current_build: BuildIdentifier,
    module: Regex,
    project: Regex,
}

impl ComponentSelectorParser {
    pub fn new(current_build: BuildIdentifier) -> Self {
        ComponentSelectorParser {
            current_build,
            module: Regex::new(
                r"^(?P<group>[^:\s'()]+):(?P<name>[^:\s'()]+)(?::(?P<version>[^:\s'()]+))?$",
            )
            .unwrap(),
            project: Regex::new(
                r"^project\(\s*'(?P<path>:[^']*)'\s*(?:,\s*'(?P<build>[^']+)'\s*)?\)$",
            )
            .unwrap(),
        }
    }

    pub fn current_build(&self) -> &BuildIdentifier {
        &self.current_build
    }

    fn parse_text(&self, text: &str) -> Result<ComponentSelector, NotationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NotationError::Empty);
        }

        if let Some(captures) = self.project.captures(text) {
            let build = match captures.name("build") {
                Some(build) if build.as_str() != self.current_build.name() => {
                    BuildIdentifier::included(build.as_str())
                }
                _ => self.current_build.clone(),
            };
            return Ok(ComponentSelector::project(build, &captures["path"]));
        }

        if let Some(captures) = self.module.captures(text) {
            let group = &captures["group"];
            let name = &captures["name"];
            return Ok(match captures.name("version") {
                Some(version) => ComponentSelector::module(group, name, version.as_str()),
                None => ComponentSelector::unversioned_module(group, name),
            });
        }

        Err(NotationError::Unsupported(text.to_string()))
    }
}

impl NotationParser for ComponentSelectorParser {
    fn parse_notation(
        &self,
        notation: &TargetNotation,
    ) -> Result<ComponentSelector, NotationError> {
        match notation {
            TargetNotation::Selector(selector) => Ok(selector.clone()),
            TargetNotation::Text(text) => self.parse_text(text),
        }
    }
}
