use std::error::Error;

use crate::{
    artifact::results::SortOrder, config::ResolutionConfig, model::selector::BuildIdentifier,
    notation::ComponentSelectorParser, ResolutionCore,
};

const DEFAULT_BUILD_NAME: &str = "main";

#[derive(Default)]
pub struct ResolutionCoreBuilder {
    current_build: Option<String>,
    sort_order: Option<SortOrder>,
    build_project_dependencies: Option<bool>,
}

impl ResolutionCoreBuilder {
    /// Name of the build the resolution runs in. Project selectors naming
    /// another build refer to an included build.
    ///
    /// Defaults to `main`.
    pub fn current_build(mut self, name: impl Into<String>) -> Self {
        self.current_build = Some(name.into());
        self
    }

    /// Order requested from the artifact linearization stage.
    ///
    /// Defaults to `RESOLUTION_CORE_ARTIFACTS__SORT_ORDER`, or `default`.
    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Whether build dependencies of project artifacts are collected.
    ///
    /// Defaults to `RESOLUTION_CORE_ARTIFACTS__BUILD_PROJECT_DEPENDENCIES`, or `true`.
    pub fn build_project_dependencies(mut self, enabled: bool) -> Self {
        self.build_project_dependencies = Some(enabled);
        self
    }

    pub fn try_build(self) -> Result<ResolutionCore, Box<dyn Error>> {
        let Self {
            current_build,
            sort_order,
            build_project_dependencies,
        } = self;

        let (sort_order, build_project_dependencies) =
            match (sort_order, build_project_dependencies) {
                (Some(sort_order), Some(enabled)) => (sort_order, enabled),
                (sort_order, enabled) => {
                    let config = ResolutionConfig::load()?;
                    (
                        sort_order.or(config.sort_order).unwrap_or_default(),
                        enabled.or(config.build_project_dependencies).unwrap_or(true),
                    )
                }
            };

        let current_build = BuildIdentifier::current(
            current_build.unwrap_or_else(|| DEFAULT_BUILD_NAME.to_string()),
        );

        Ok(ResolutionCore {
            parser: ComponentSelectorParser::new(current_build),
            sort_order,
            build_project_dependencies,
        })
    }
}
