//! The scheduler owning every tween tree and advancing the live ones.

use core::cell::RefCell;
use core::fmt;
use core::mem;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::accessor::Accessor;
use crate::builder::{Bound, TweenBuilder, Untyped, Value};
use crate::error::TweenError;
use crate::id::{TweenId, TweenIdAllocator};
use crate::interpolation::Interpolation;
use crate::node::{
    NodeArena, NodeId, NodeKind, NodeState, TweenNode, ValueTween,
};

/// Owns every tween tree and ticks the submitted ones.
///
/// Trees are built with [`tween`](Self::tween), [`group`](Self::group)
/// or [`bind`](Self::bind), submitted with [`submit`](Self::submit),
/// and advanced by calling [`tick`](Self::tick) once per frame.
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use motiontween_engine::prelude::*;
///
/// let mut scheduler = TweenScheduler::new();
/// let opacity = Rc::new(Cell::new(0.0_f32));
///
/// scheduler
///     .tween(Accessor::cell(&opacity), 0.0)
///     .value(0.0, 1.0, 2.0)
///     .with_ease(Ease::Linear)
///     .submit()
///     .unwrap();
///
/// scheduler.tick(1.0);
/// assert_eq!(opacity.get(), 0.5);
/// scheduler.tick(1.0);
/// assert_eq!(opacity.get(), 1.0);
/// assert_eq!(scheduler.live_count(), 0);
/// ```
pub struct TweenScheduler {
    pub(crate) nodes: NodeArena,
    /// Live roots in insertion order.
    roots: Vec<NodeId>,
    ids: TweenIdAllocator,
    commands: Commands,
    is_playing: bool,
    time_scale: f32,
}

impl TweenScheduler {
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::default(),
            roots: Vec::new(),
            ids: TweenIdAllocator::new(),
            commands: Commands::default(),
            is_playing: true,
            time_scale: 1.0,
        }
    }

    pub fn with_playing(mut self, playing: bool) -> Self {
        self.is_playing = playing;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn set_playing(&mut self, playing: bool) -> &mut Self {
        self.is_playing = playing;
        self
    }

    pub fn set_time_scale(&mut self, time_scale: f32) -> &mut Self {
        self.time_scale = time_scale;
        self
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    fn spawn_root(&mut self, kind: NodeKind, delay: f32) -> NodeId {
        let id = self.ids.next_id();
        self.nodes.insert(TweenNode::new(id, delay, kind))
    }

    pub(crate) fn spawn_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        delay: f32,
    ) -> NodeId {
        let id = self
            .nodes
            .get(parent)
            .map(|node| node.id)
            .unwrap_or_else(|| self.ids.peek());
        let child = self.nodes.insert(TweenNode::new(id, delay, kind));
        self.nodes.attach(parent, child);
        child
    }

    /// Starts a new tree whose root drives `accessor`.
    pub fn tween<T: Interpolation + 'static>(
        &mut self,
        accessor: Accessor<T>,
        delay: f32,
    ) -> TweenBuilder<'_, Value<T>> {
        let root = self.spawn_root(
            NodeKind::Value(Box::new(ValueTween::new(accessor, T::interp))),
            delay,
        );
        TweenBuilder::new(self, root)
    }

    /// Starts a new tree with an empty group root.
    pub fn group(&mut self, delay: f32) -> TweenBuilder<'_, Untyped> {
        let root = self.spawn_root(NodeKind::Group, delay);
        TweenBuilder::new(self, root)
    }

    /// Starts a new tree whose root lives as long as `target`.
    pub fn bind<S: 'static>(
        &mut self,
        target: &Rc<RefCell<S>>,
        delay: f32,
    ) -> TweenBuilder<'_, Bound<S>> {
        let root =
            self.spawn_root(NodeKind::Bound(Box::new(Rc::downgrade(target))), delay);
        TweenBuilder::new(self, root)
    }

    /// Reopens an existing node for editing. Fails once the node or
    /// any of its ancestors has finished, as nothing added below it
    /// would ever run.
    pub fn edit(
        &mut self,
        node: NodeId,
    ) -> Result<TweenBuilder<'_, Untyped>, TweenError> {
        if !self.nodes.contains(node) {
            return Err(TweenError::StaleNode(node));
        }
        if let Some(finished) = self.nodes.finished_ancestor(node) {
            return Err(TweenError::Finished(finished));
        }
        Ok(TweenBuilder::new(self, node))
    }

    /// Submits the tree containing `node`. The tree starts running on
    /// the next [`tick`](Self::tick).
    pub fn submit(&mut self, node: NodeId) -> Result<TweenId, TweenError> {
        if !self.nodes.contains(node) {
            return Err(TweenError::StaleNode(node));
        }

        let root = self.nodes.root_of(node);
        let root_node = self
            .nodes
            .get_mut(root)
            .ok_or(TweenError::StaleNode(root))?;
        if root_node.scheduled {
            return Err(TweenError::AlreadyScheduled(root));
        }

        root_node.scheduled = true;
        let id = root_node.id;
        self.roots.push(root);
        debug!(tween_id = %id, ?root, "submitted tween");

        Ok(id)
    }

    /// Drops an unsubmitted tree and everything attached to it.
    pub fn discard(&mut self, node: NodeId) -> Result<(), TweenError> {
        if !self.nodes.contains(node) {
            return Err(TweenError::StaleNode(node));
        }

        let root = self.nodes.root_of(node);
        if self.nodes.get(root).is_some_and(|n| n.scheduled) {
            return Err(TweenError::AlreadyScheduled(root));
        }
        self.nodes.free_tree(root, true);

        Ok(())
    }

    /// Cancels every live tree of the group `id` without running
    /// callbacks. Queued continuations are dropped. Returns the number
    /// of trees removed.
    pub fn cancel(&mut self, id: TweenId) -> usize {
        self.cancel_group(id, false)
    }

    /// Cancels every live tree of the group `id`, running the
    /// callbacks of roots that had not completed yet.
    pub fn cancel_notify(&mut self, id: TweenId) -> usize {
        self.cancel_group(id, true)
    }

    fn cancel_group(&mut self, id: TweenId, trigger_callback: bool) -> usize {
        let (dropped, kept) =
            mem::take(&mut self.roots).into_iter().partition::<Vec<_>, _>(
                |root| self.nodes.get(*root).is_some_and(|n| n.id == id),
            );
        self.roots = kept;

        for &root in dropped.iter() {
            self.nodes.cancel(root, trigger_callback);
            self.nodes.free_tree(root, true);
        }

        if !dropped.is_empty() {
            debug!(tween_id = %id, count = dropped.len(), "cancelled tween group");
        }
        dropped.len()
    }

    /// Cancels a single node. A cancelled root is dropped on the next
    /// sweep together with its continuations, a cancelled child counts
    /// as finished for its parent.
    pub fn cancel_node(
        &mut self,
        node: NodeId,
        trigger_callback: bool,
    ) -> Result<(), TweenError> {
        if !self.nodes.contains(node) {
            return Err(TweenError::StaleNode(node));
        }
        self.nodes.cancel(node, trigger_callback);
        debug!(?node, trigger_callback, "cancelled tween node");

        Ok(())
    }

    /// Advances every live tree by `dt` seconds scaled by the time
    /// scale, then applies the queued [`Commands`].
    pub fn tick(&mut self, dt: f32) {
        if self.is_playing {
            self.advance(dt * self.time_scale);
        }
        self.apply_commands();
    }

    fn advance(&mut self, dt: f32) {
        for root in self.roots.clone() {
            self.nodes.update(root, dt);
        }

        let mut promoted = Vec::new();
        let mut live = Vec::with_capacity(self.roots.len());
        for root in mem::take(&mut self.roots) {
            let Some(node) = self.nodes.get(root) else {
                continue;
            };

            if !node.need_removed {
                live.push(root);
                continue;
            }

            if !node.canceled {
                let start = promoted.len();
                self.nodes.collect_continuations(root, &mut promoted);
                for next in &promoted[start..] {
                    debug!(?root, ?next, "promoted continuation");
                }
            }
            self.nodes.free_tree(root, false);
        }

        live.append(&mut promoted);
        self.roots = live;

        trace!(
            dt,
            live = self.roots.len(),
            nodes = self.nodes.len(),
            "ticked tweens"
        );
    }

    /// Applies every queued command, including those queued while
    /// applying.
    pub fn apply_commands(&mut self) {
        loop {
            let command = self.commands.queue.borrow_mut().pop_front();
            match command {
                Some(command) => command(self),
                None => break,
            }
        }
    }

    /// A handle for queueing work from inside callbacks.
    pub fn commands(&self) -> Commands {
        self.commands.clone()
    }

    /// Whether any live tree belongs to the group `id`.
    pub fn is_live(&self, id: TweenId) -> bool {
        self.roots
            .iter()
            .any(|root| self.nodes.get(*root).is_some_and(|n| n.id == id))
    }

    /// Number of live roots.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.roots.len()
    }

    /// Number of nodes held, submitted or not.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Lifecycle state of `node`, `None` once it has been freed.
    pub fn node_state(&self, node: NodeId) -> Option<NodeState> {
        self.nodes.get(node).map(TweenNode::state)
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }
}

impl Default for TweenScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TweenScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenScheduler")
            .field("roots", &self.roots)
            .field("nodes", &self.nodes.len())
            .field("is_playing", &self.is_playing)
            .field("time_scale", &self.time_scale)
            .finish()
    }
}

type Command = Box<dyn FnOnce(&mut TweenScheduler)>;

/// Shared queue of deferred scheduler operations.
///
/// Callbacks run while the scheduler is mid-tick and cannot borrow
/// it. They capture a [`Commands`] handle instead, the queued
/// operations run once the tick has swept its trees.
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use motiontween_engine::prelude::*;
///
/// let mut scheduler = TweenScheduler::new();
/// let value = Rc::new(Cell::new(0.0_f32));
/// let commands = scheduler.commands();
///
/// let follow_up = scheduler
///     .tween(Accessor::cell(&value), 0.0)
///     .value(10.0, 20.0, 1.0)
///     .id();
///
/// scheduler
///     .group(0.0)
///     .on_complete(move || commands.submit(follow_up))
///     .submit()
///     .unwrap();
///
/// scheduler.tick(0.5);
/// assert_eq!(scheduler.live_count(), 1);
/// scheduler.tick(0.5);
/// assert_eq!(value.get(), 15.0);
/// ```
#[derive(Clone, Default)]
pub struct Commands {
    queue: Rc<RefCell<VecDeque<Command>>>,
}

impl Commands {
    pub fn add(&self, command: impl FnOnce(&mut TweenScheduler) + 'static) {
        self.queue.borrow_mut().push_back(Box::new(command));
    }

    pub fn submit(&self, node: NodeId) {
        self.add(move |scheduler| {
            if let Err(err) = scheduler.submit(node) {
                warn!(%err, "deferred submit failed");
            }
        });
    }

    pub fn cancel(&self, id: TweenId) {
        self.add(move |scheduler| {
            scheduler.cancel(id);
        });
    }

    pub fn cancel_notify(&self, id: TweenId) {
        self.add(move |scheduler| {
            scheduler.cancel_notify(id);
        });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands").field("len", &self.len()).finish()
    }
}
