use std::collections::HashMap;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::artifact::results::SortOrder;

pub struct ResolutionConfig {
    pub sort_order: Option<SortOrder>,
    pub build_project_dependencies: Option<bool>,
}

impl ResolutionConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            sort_order: raw_config.artifacts.sort_order,
            build_project_dependencies: raw_config.artifacts.build_project_dependencies,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    artifacts: ArtifactsConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct ArtifactsConfig {
    sort_order: Option<SortOrder>,
    build_project_dependencies: Option<bool>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("RESOLUTION_CORE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
