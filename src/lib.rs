pub mod artifact;
pub mod cli;
pub mod config;
pub mod graph;
pub mod model;
pub mod notation;
pub mod substitution;

mod api;

pub use api::{ResolutionCore, ResolutionCoreBuilder, ResolveError, ScenarioReport};
