use std::fmt::{Display, Formatter};

/// Identifies a build taking part in a (possibly composite) resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct BuildIdentifier {
    name: String,
    current: bool,
}

impl BuildIdentifier {
    /// The build that is currently executing.
    pub fn current(name: impl Into<String>) -> Self {
        BuildIdentifier {
            name: name.into(),
            current: true,
        }
    }

    /// A build other than the one currently executing, e.g. an included build.
    pub fn included(name: impl Into<String>) -> Self {
        BuildIdentifier {
            name: name.into(),
            current: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_current_build(&self) -> bool {
        self.current
    }
}

impl Display for BuildIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

impl ModuleIdentifier {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        ModuleIdentifier {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl Display for ModuleIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// What to resolve for a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ComponentSelector {
    /// An external module. A missing version leaves the choice to external
    /// version resolution (platforms, BOMs).
    Module {
        module: ModuleIdentifier,
        version: Option<String>,
    },
    /// A project of a build taking part in the resolution.
    Project { build: BuildIdentifier, path: String },
}

impl ComponentSelector {
    pub fn module(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ComponentSelector::Module {
            module: ModuleIdentifier::new(group, name),
            version: Some(version.into()),
        }
    }

    pub fn unversioned_module(group: impl Into<String>, name: impl Into<String>) -> Self {
        ComponentSelector::Module {
            module: ModuleIdentifier::new(group, name),
            version: None,
        }
    }

    pub fn project(build: BuildIdentifier, path: impl Into<String>) -> Self {
        ComponentSelector::Project {
            build,
            path: path.into(),
        }
    }

    pub fn is_unversioned_module(&self) -> bool {
        matches!(self, ComponentSelector::Module { version: None, .. })
    }

    /// Whether `other` is covered by this selector when used as a rule pattern.
    ///
    /// A module pattern without a version matches every version of the module.
    pub fn matches(&self, other: &ComponentSelector) -> bool {
        match (self, other) {
            (
                ComponentSelector::Module {
                    module,
                    version: None,
                },
                ComponentSelector::Module { module: other, .. },
            ) => module == other,
            (ComponentSelector::Module { .. }, ComponentSelector::Module { .. }) => self == other,
            (
                ComponentSelector::Project { build, path },
                ComponentSelector::Project {
                    build: other_build,
                    path: other_path,
                },
            ) => build.name() == other_build.name() && path == other_path,
            _ => false,
        }
    }
}

impl Display for ComponentSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentSelector::Module {
                module,
                version: Some(version),
            } => write!(f, "{}:{}", module, version),
            ComponentSelector::Module {
                module,
                version: None,
            } => write!(f, "{}", module),
            ComponentSelector::Project { build, path } if build.is_current_build() => {
                write!(f, "project '{}'", path)
            }
            ComponentSelector::Project { build, path } => {
                write!(f, "project '{}' (build '{}')", path, build)
            }
        }
    }
}

/// Identity of a resolved component, i.e. the owner of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ComponentIdentifier {
    Module {
        module: ModuleIdentifier,
        version: String,
    },
    Project { build: BuildIdentifier, path: String },
}

impl ComponentIdentifier {
    /// Build and path of a project component, `None` for external modules.
    pub fn as_project(&self) -> Option<(&BuildIdentifier, &str)> {
        match self {
            ComponentIdentifier::Project { build, path } => Some((build, path)),
            ComponentIdentifier::Module { .. } => None,
        }
    }
}

impl Display for ComponentIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentIdentifier::Module { module, version } => write!(f, "{}:{}", module, version),
            ComponentIdentifier::Project { build, path } if build.is_current_build() => {
                write!(f, "project '{}'", path)
            }
            ComponentIdentifier::Project { build, path } => {
                write!(f, "project '{}' (build '{}')", path, build)
            }
        }
    }
}
