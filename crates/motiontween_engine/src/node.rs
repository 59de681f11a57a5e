//! Tween nodes and the arena that owns them.
//!
//! A tween tree is made of [`TweenNode`]s linked by [`NodeId`]s:
//! children run in parallel with their parent, while `next` points
//! at the root of a continuation tree that is scheduled once the
//! whole tree has finished. Nodes never own each other, the
//! [`NodeArena`] owns every node and handles are plain indices.

use core::any::Any;
use core::cell::RefCell;
use core::mem;
use std::rc::Weak;

use smallvec::SmallVec;
use tracing::debug;

use crate::accessor::Accessor;
use crate::ease::{self, Ease};
use crate::id::TweenId;
use crate::interpolation::InterpFn;

/// Durations shorter than this are treated as this, avoiding
/// division by zero for instant tweens.
pub const MIN_DURATION: f32 = 1e-4;

/// A zero-argument callback, invoked at most once.
pub type Callback = Box<dyn FnOnce()>;

/// Handle to a node inside a [`TweenScheduler`].
///
/// Handles are generational: once the node is freed, the handle is
/// stale and every lookup with it fails, even if the slot is reused.
///
/// [`TweenScheduler`]: crate::scheduler::TweenScheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Observable lifecycle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Waiting for its delay to run out.
    Pending,
    /// Interpolating, or waiting on its children.
    Active,
    /// Its own step is done, children may still be running.
    Complete,
    /// The node and its whole subtree have finished.
    Removed,
    /// The node was cancelled.
    Cancelled,
}

/// The start and end value of a value tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<T> {
    /// The starting value.
    pub start: T,
    /// The ending value.
    pub end: T,
}

impl<T> Segment<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }
}

/// Type-erased leaf tween.
pub(crate) trait Tweenable: Any {
    /// Advances the tween by `dt` seconds. Returns `true` once done.
    fn step(&mut self, dt: f32) -> bool;

    fn is_alive(&self) -> bool;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Interpolates an accessor's value from a [`Segment`] start to end.
pub(crate) struct ValueTween<T> {
    pub(crate) accessor: Accessor<T>,
    pub(crate) segment: Option<Segment<T>>,
    pub(crate) ease: Ease,
    pub(crate) interp: InterpFn<T>,
    inv_duration: f32,
    elapsed: f32,
}

impl<T: 'static> ValueTween<T> {
    pub(crate) fn new(accessor: Accessor<T>, interp: InterpFn<T>) -> Self {
        Self {
            accessor,
            segment: None,
            ease: Ease::Linear,
            interp,
            inv_duration: 1.0 / MIN_DURATION,
            elapsed: 0.0,
        }
    }

    pub(crate) fn set_segment(&mut self, segment: Segment<T>, duration: f32) {
        self.segment = Some(segment);
        self.inv_duration = 1.0 / duration.max(MIN_DURATION);
    }
}

impl<T: 'static> Tweenable for ValueTween<T> {
    fn step(&mut self, dt: f32) -> bool {
        // Nothing to interpolate.
        let Some(segment) = &self.segment else {
            return true;
        };

        self.elapsed += dt;
        let progress = self.elapsed * self.inv_duration;

        let t = ease::evaluate(progress, &self.ease);
        self.accessor
            .set((self.interp)(&segment.start, &segment.end, t));

        progress >= 1.0
    }

    fn is_alive(&self) -> bool {
        self.accessor.is_alive()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A weakly held target that bound nodes animate fields of.
pub(crate) trait BoundTarget: Any {
    fn is_alive(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<S: 'static> BoundTarget for Weak<RefCell<S>> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) enum NodeKind {
    /// A branch without an effect of its own.
    Group,
    /// A branch tied to the lifetime of an external target.
    Bound(Box<dyn BoundTarget>),
    /// A leaf interpolating a single value.
    Value(Box<dyn Tweenable>),
}

impl NodeKind {
    fn is_alive(&self) -> bool {
        match self {
            NodeKind::Group => true,
            NodeKind::Bound(target) => target.is_alive(),
            NodeKind::Value(tween) => tween.is_alive(),
        }
    }

    fn step(&mut self, dt: f32) -> bool {
        match self {
            NodeKind::Group | NodeKind::Bound(_) => true,
            NodeKind::Value(tween) => tween.step(dt),
        }
    }
}

pub(crate) struct TweenNode {
    /// Group id, shared with the root of the tree.
    pub(crate) id: TweenId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    /// Root of the continuation tree.
    pub(crate) next: Option<NodeId>,
    /// Remaining delay in seconds.
    pub(crate) delay: f32,
    pub(crate) done: bool,
    pub(crate) canceled: bool,
    pub(crate) need_removed: bool,
    /// Whether this (root) node is live or queued as a continuation.
    pub(crate) scheduled: bool,
    pub(crate) callbacks: SmallVec<[Callback; 1]>,
    pub(crate) kind: NodeKind,
}

impl TweenNode {
    pub(crate) fn new(id: TweenId, delay: f32, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            children: SmallVec::new(),
            next: None,
            delay,
            done: false,
            canceled: false,
            need_removed: false,
            scheduled: false,
            callbacks: SmallVec::new(),
            kind,
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        if self.canceled {
            NodeState::Cancelled
        } else if self.need_removed {
            NodeState::Removed
        } else if self.done {
            NodeState::Complete
        } else if self.delay > 0.0 {
            NodeState::Pending
        } else {
            NodeState::Active
        }
    }

    /// Marks the node as finished and hands back the callbacks that
    /// should run.
    fn finish(&mut self) -> SmallVec<[Callback; 1]> {
        self.need_removed = true;
        mem::take(&mut self.callbacks)
    }
}

struct Slot {
    generation: u32,
    node: Option<TweenNode>,
}

/// Generational storage for every [`TweenNode`].
#[derive(Default)]
pub(crate) struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl NodeArena {
    pub(crate) fn insert(&mut self, node: TweenNode) -> NodeId {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });

        NodeId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<TweenNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }

        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;

        Some(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&TweenNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .node
            .as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TweenNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .node
            .as_mut()
    }

    #[inline]
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of nodes currently stored.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Walks up the parent chain to find the root of `id`'s tree.
    pub(crate) fn root_of(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.get(id).and_then(|n| n.parent) {
            id = parent;
        }
        id
    }

    /// The first node from `id` up to its root that has finished.
    pub(crate) fn finished_ancestor(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            let node = self.get(id)?;
            if node.need_removed {
                return Some(id);
            }
            id = node.parent?;
        }
    }

    /// Adds `child` to `parent`'s children.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Overwrites the group id of `id`, its descendants and every
    /// continuation reachable from them.
    pub(crate) fn propagate_id(&mut self, id: NodeId, tween_id: TweenId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            node.id = tween_id;
            stack.extend(node.children.iter().copied());
            stack.extend(node.next);
        }
    }

    /// Whether `target` can be reached from `from` through children
    /// or continuation links.
    pub(crate) fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().copied());
                stack.extend(node.next);
            }
        }
        false
    }

    /// Pushes the continuations found in `root`'s tree, those of the
    /// children before the node's own. Cancelled branches never
    /// continue.
    pub(crate) fn collect_continuations(
        &self,
        root: NodeId,
        out: &mut Vec<NodeId>,
    ) {
        let Some(node) = self.get(root) else {
            return;
        };
        if node.canceled {
            return;
        }

        for &child in node.children.iter() {
            self.collect_continuations(child, out);
        }
        out.extend(node.next);
    }

    /// Frees `root` and its descendants. Continuations are freed too
    /// when `with_continuations` is set or when they hang below a
    /// cancelled node, otherwise they are left for promotion.
    pub(crate) fn free_tree(
        &mut self,
        root: NodeId,
        with_continuations: bool,
    ) -> usize {
        let mut freed = 0;
        let mut stack = vec![(root, with_continuations)];
        while let Some((id, discard)) = stack.pop() {
            let Some(node) = self.remove(id) else {
                continue;
            };
            freed += 1;

            let discard = discard || node.canceled;
            stack.extend(node.children.into_iter().map(|c| (c, discard)));
            if discard {
                stack.extend(node.next.map(|n| (n, true)));
            }
        }
        freed
    }

    /// Runs one tick of the node state machine on `id` and its
    /// subtree.
    pub(crate) fn update(&mut self, id: NodeId, dt: f32) {
        let Some(node) = self.get_mut(id) else {
            return;
        };

        // Finished nodes are never touched again.
        if node.need_removed {
            return;
        }

        if !node.kind.is_alive() {
            node.done = true;
            node.need_removed = true;
            debug!(tween_id = %node.id, ?id, "tween target is gone, removing");
            return;
        }

        if node.delay > 0.0 {
            node.delay -= dt;
            return;
        }

        if !node.done {
            node.done = node.kind.step(dt);
        }

        let children = node.children.clone();
        let mut children_complete = true;
        for child in children {
            self.update(child, dt);

            if self.get(child).is_some_and(|c| !c.need_removed) {
                children_complete = false;
            }
        }

        let Some(node) = self.get_mut(id) else {
            return;
        };

        if children_complete && node.done {
            for callback in node.finish() {
                callback();
            }
        }
    }

    /// Cancels a single node. Its callbacks run only when
    /// `trigger_callback` is set and the node had not completed.
    pub(crate) fn cancel(&mut self, id: NodeId, trigger_callback: bool) {
        let Some(node) = self.get_mut(id) else {
            return;
        };

        let callbacks = if !node.done && trigger_callback {
            node.finish()
        } else {
            node.need_removed = true;
            node.callbacks.clear();
            SmallVec::new()
        };
        node.done = true;
        node.canceled = true;

        for callback in callbacks {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::rc::Rc;

    use crate::id::TweenIdAllocator;
    use crate::interpolation::Interpolation;

    use super::*;

    fn value_node(
        ids: &mut TweenIdAllocator,
        target: &Rc<Cell<f32>>,
        from: f32,
        to: f32,
        duration: f32,
    ) -> TweenNode {
        let mut tween = ValueTween::new(Accessor::cell(target), f32::interp);
        tween.set_segment(Segment::new(from, to), duration);
        TweenNode::new(ids.next_id(), 0.0, NodeKind::Value(Box::new(tween)))
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce()) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn slots_are_reused_with_new_generation() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let a = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        assert!(arena.remove(a).is_some());
        assert!(!arena.contains(a));

        let b = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_some());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn leaf_interpolates_and_completes() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let leaf = arena.insert(value_node(&mut ids, &target, 0.0, 10.0, 2.0));
        let (fired, callback) = counter();
        arena.get_mut(leaf).unwrap().callbacks.push(Box::new(callback));

        arena.update(leaf, 1.0);
        assert_eq!(target.get(), 5.0);
        assert_eq!(arena.get(leaf).unwrap().state(), NodeState::Active);

        arena.update(leaf, 1.0);
        assert_eq!(target.get(), 10.0);
        assert_eq!(arena.get(leaf).unwrap().state(), NodeState::Removed);
        assert_eq!(fired.get(), 1);

        // Further ticks neither write nor call back again.
        target.set(-1.0);
        arena.update(leaf, 1.0);
        assert_eq!(target.get(), -1.0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn non_positive_duration_completes_immediately() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let leaf = arena.insert(value_node(&mut ids, &target, 0.0, 3.0, -1.0));
        arena.update(leaf, 0.016);

        assert_eq!(target.get(), 3.0);
        assert!(arena.get(leaf).unwrap().need_removed);
    }

    #[test]
    fn delay_holds_node_and_children() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let parent = arena.insert(TweenNode::new(ids.next_id(), 1.0, NodeKind::Group));
        let child = arena.insert(value_node(&mut ids, &target, 0.0, 1.0, 1.0));
        arena.attach(parent, child);

        assert_eq!(arena.get(parent).unwrap().state(), NodeState::Pending);
        arena.update(parent, 0.5);
        arena.update(parent, 0.5);
        // Child is held back while the parent waits.
        assert_eq!(target.get(), 0.0);

        arena.update(parent, 0.5);
        assert_eq!(target.get(), 0.5);
    }

    #[test]
    fn parent_waits_for_every_child() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let (a, b) = (Rc::new(Cell::new(0.0)), Rc::new(Cell::new(0.0)));

        let parent = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let short = arena.insert(value_node(&mut ids, &a, 0.0, 1.0, 1.0));
        let long = arena.insert(value_node(&mut ids, &b, 0.0, 1.0, 3.0));
        arena.attach(parent, short);
        arena.attach(parent, long);

        arena.update(parent, 1.0);
        assert!(arena.get(short).unwrap().need_removed);
        assert!(!arena.get(parent).unwrap().need_removed);
        assert_eq!(arena.get(parent).unwrap().state(), NodeState::Complete);

        arena.update(parent, 1.0);
        assert!(!arena.get(parent).unwrap().need_removed);

        arena.update(parent, 1.0);
        assert!(arena.get(long).unwrap().need_removed);
        assert!(arena.get(parent).unwrap().need_removed);
    }

    #[test]
    fn dead_target_removes_without_callback() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let leaf = arena.insert(value_node(&mut ids, &target, 0.0, 1.0, 1.0));
        let (fired, callback) = counter();
        arena.get_mut(leaf).unwrap().callbacks.push(Box::new(callback));

        drop(target);
        arena.update(leaf, 0.5);

        assert!(arena.get(leaf).unwrap().need_removed);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn cancel_only_notifies_unfinished_nodes() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let silent = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let (silent_fired, callback) = counter();
        arena.get_mut(silent).unwrap().callbacks.push(Box::new(callback));
        arena.cancel(silent, false);
        assert_eq!(silent_fired.get(), 0);
        assert_eq!(arena.get(silent).unwrap().state(), NodeState::Cancelled);

        let notified = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let (notified_fired, callback) = counter();
        arena.get_mut(notified).unwrap().callbacks.push(Box::new(callback));
        arena.cancel(notified, true);
        arena.cancel(notified, true);
        assert_eq!(notified_fired.get(), 1);
    }

    #[test]
    fn propagate_id_covers_children_and_continuations() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let root = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let child = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let next = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        arena.attach(root, child);
        arena.get_mut(child).unwrap().next = Some(next);

        let group = ids.next_id();
        arena.propagate_id(root, group);

        for id in [root, child, next] {
            assert_eq!(arena.get(id).unwrap().id, group);
        }
        assert!(arena.reaches(root, next));
        assert!(!arena.reaches(next, root));
    }

    #[test]
    fn free_tree_optionally_keeps_continuations() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let root = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let child = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let next = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        arena.attach(root, child);
        arena.get_mut(root).unwrap().next = Some(next);

        let mut continuations = Vec::new();
        arena.collect_continuations(root, &mut continuations);
        assert_eq!(continuations, vec![next]);

        assert_eq!(arena.free_tree(root, false), 2);
        assert!(arena.contains(next));
        assert_eq!(arena.free_tree(next, true), 1);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn cancelled_branches_drop_their_continuations() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let root = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let kept = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let dropped = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let child = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let grandchild = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        arena.attach(root, child);
        arena.attach(child, grandchild);
        arena.get_mut(root).unwrap().next = Some(kept);
        arena.get_mut(grandchild).unwrap().next = Some(dropped);

        arena.cancel(child, false);

        let mut continuations = Vec::new();
        arena.collect_continuations(root, &mut continuations);
        assert_eq!(continuations, vec![kept]);

        assert_eq!(arena.free_tree(root, false), 4);
        assert!(arena.contains(kept));
        assert!(!arena.contains(dropped));
    }

    #[test]
    fn continuations_list_children_before_own() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();

        let root = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let child = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let own_next = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        let child_next = arena.insert(TweenNode::new(ids.next_id(), 0.0, NodeKind::Group));
        arena.attach(root, child);
        arena.get_mut(root).unwrap().next = Some(own_next);
        arena.get_mut(child).unwrap().next = Some(child_next);

        let mut continuations = Vec::new();
        arena.collect_continuations(root, &mut continuations);
        assert_eq!(continuations, vec![child_next, own_next]);
    }

    #[test]
    fn child_waits_out_its_own_delay_once_parent_runs() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let parent = arena.insert(TweenNode::new(ids.next_id(), 1.0, NodeKind::Group));
        let mut leaf = value_node(&mut ids, &target, 0.0, 1.0, 1.0);
        leaf.delay = 0.5;
        let child = arena.insert(leaf);
        arena.attach(parent, child);

        // Parent delay.
        arena.update(parent, 0.5);
        arena.update(parent, 0.5);
        assert_eq!(target.get(), 0.0);
        assert_eq!(arena.get(child).unwrap().state(), NodeState::Pending);

        // Child delay, only counted once the parent runs.
        arena.update(parent, 0.5);
        assert_eq!(target.get(), 0.0);
        assert_eq!(arena.get(parent).unwrap().state(), NodeState::Complete);
        assert_eq!(arena.get(child).unwrap().state(), NodeState::Active);

        arena.update(parent, 0.5);
        assert_eq!(target.get(), 0.5);
        arena.update(parent, 0.5);
        assert_eq!(target.get(), 1.0);
        assert!(arena.get(parent).unwrap().need_removed);
    }

    #[test]
    fn leftover_delay_is_not_carried_over() {
        let mut arena = NodeArena::default();
        let mut ids = TweenIdAllocator::new();
        let target = Rc::new(Cell::new(0.0));

        let parent = arena.insert(TweenNode::new(ids.next_id(), 1.0, NodeKind::Group));
        let mut leaf = value_node(&mut ids, &target, 0.0, 1.0, 1.0);
        leaf.delay = 0.5;
        let child = arena.insert(leaf);
        arena.attach(parent, child);

        // Overshoots the parent delay by 0.5.
        arena.update(parent, 0.75);
        arena.update(parent, 0.75);
        // Overshoots the child delay by 0.25.
        arena.update(parent, 0.75);
        assert_eq!(target.get(), 0.0);

        // Only this tick's time reaches the tween.
        arena.update(parent, 0.75);
        assert_eq!(target.get(), 0.75);
    }
}
