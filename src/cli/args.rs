use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::artifact::results::SortOrder;

/// Diagnostics for dependency substitution and resolved artifact collection.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Name of the current build, overriding `current_build` of the scenario
    #[clap(long, global = true)]
    pub current_build: Option<String>,
    /// Order requested from artifact linearization: default, consumer_first or dependency_first
    #[clap(long, global = true)]
    pub sort_order: Option<SortOrder>,
    /// Leave out the build dependencies of every project artifact
    #[clap(long, global = true)]
    pub no_build_project_dependencies: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    ///Runs the substitution rules of a scenario against its requested dependencies
    Substitutions {
        #[clap(default_value = "scenario.toml")]
        scenario: PathBuf,
    },
    ///Collects the artifacts of the resolved graph of a scenario
    Artifacts {
        #[clap(default_value = "scenario.toml")]
        scenario: PathBuf,
    },
}

impl Command {
    pub fn scenario(&self) -> &PathBuf {
        match self {
            Command::Substitutions { scenario } | Command::Artifacts { scenario } => scenario,
        }
    }
}
