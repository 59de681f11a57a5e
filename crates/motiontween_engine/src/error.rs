use thiserror::Error;

use crate::node::NodeId;

/// Errors returned when building or scheduling tween trees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenError {
    /// The handle points to a node that has already been freed.
    #[error("{0:?} refers to a node that no longer exists")]
    StaleNode(NodeId),
    /// The node is already live, or already queued as a
    /// continuation of another node.
    #[error("{0:?} is already scheduled")]
    AlreadyScheduled(NodeId),
    /// The node, or one of its ancestors, has already finished and
    /// will never be updated again.
    #[error("{0:?} has already finished")]
    Finished(NodeId),
    /// Attaching the continuation would make a tree continue into
    /// itself.
    #[error("{0:?} cannot be a continuation of its own tree")]
    SelfContinuation(NodeId),
}

/// Error returned when parsing an unknown [`Ease`](crate::ease::Ease)
/// name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown easing function `{name}`")]
pub struct ParseEaseError {
    pub name: String,
}
