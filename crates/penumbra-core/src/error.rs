use thiserror::Error;

use crate::scene::NodeId;

/// Errors raised while building or editing a scene graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PenumbraError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),
}
