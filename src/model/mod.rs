use thiserror::Error;

use crate::{graph::GraphError, notation::NotationError};

pub mod scenario;
pub mod selector;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading scenario toml: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid notation: {0}")]
    Notation(#[from] NotationError),
    #[error("Missing TOML key `{0}` while parsing")]
    MissingKey(String),
    #[error("Component `{0}` of a graph node must have a version")]
    UnversionedComponent(String),
    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),
    #[error("Artifact set {0} is declared more than once")]
    DuplicateArtifactSet(usize),
    #[error("Edge references unknown artifact set {0}")]
    UnknownArtifactSet(usize),
}
