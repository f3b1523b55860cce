use std::{error::Error, io::Write, path::Path};

use log::{debug, info};

use crate::{
    api::ScenarioReport,
    artifact::results::SortOrder,
    model::scenario::Scenario,
    ResolutionCore,
};

/// Settings taken from the command line. `None` leaves the choice to the
/// environment configuration.
#[derive(Debug, Default, Clone)]
pub struct CoreOptions {
    pub current_build: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub build_project_dependencies: Option<bool>,
}

/// Handler to substitutions command
pub fn do_substitutions(
    options: &CoreOptions,
    scenario_path: &Path,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let report = resolve(options, scenario_path)?;

    for result in &report.substitutions {
        if result.is_updated() {
            writeln!(
                out,
                "{} -> {} ({})",
                result.requested, result.target, result.selection_description
            )?;
        } else {
            writeln!(out, "{} ({})", result.requested, result.selection_description)?;
        }
    }
    Ok(())
}

/// Handler to artifacts command
pub fn do_artifacts(
    options: &CoreOptions,
    scenario_path: &Path,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let report = resolve(options, scenario_path)?;
    let artifacts = &report.artifacts;

    writeln!(out, "sort order: {}", artifacts.sort_order())?;
    for node in artifacts.node_ids() {
        let ids = artifacts
            .artifact_set_ids(node)
            .map(|ids| {
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        writeln!(out, "node {node}: [{ids}]")?;
    }

    for set in artifacts.artifact_sets() {
        let files = set
            .artifacts()
            .iter()
            .map(|artifact| artifact.file.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let stripped = if set.is_stripped() {
            " (no build dependencies)"
        } else {
            ""
        };
        writeln!(out, "artifact set {}{stripped}: [{files}]", set.id())?;
    }

    let tasks = artifacts
        .build_dependencies()
        .into_iter()
        .map(|task| task.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "build dependencies: [{tasks}]")?;
    Ok(())
}

fn resolve(options: &CoreOptions, scenario_path: &Path) -> Result<ScenarioReport, Box<dyn Error>> {
    let scenario = Scenario::from_file(scenario_path, options.current_build.as_deref())?;
    debug!(
        "Loaded scenario {} for build {}",
        scenario_path.display(),
        scenario.current_build
    );

    let mut builder = ResolutionCore::builder().current_build(scenario.current_build.name());
    if let Some(sort_order) = options.sort_order {
        builder = builder.sort_order(sort_order);
    }
    if let Some(enabled) = options.build_project_dependencies {
        builder = builder.build_project_dependencies(enabled);
    }
    let core = builder.try_build()?;

    info!("Resolving scenario {}", scenario_path.display());
    Ok(core.resolve(&scenario)?)
}
