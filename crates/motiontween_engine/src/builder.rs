//! Fluent construction of tween trees.
//!
//! Every builder holds a mutable borrow of the [`TweenScheduler`] and
//! a handle to the node it edits. Creating a child consumes the
//! builder and returns a builder for the child, so a chain always
//! edits the most recently created node. Keep the [`NodeId`] from
//! [`TweenBuilder::id`] to come back to a node later with
//! [`TweenScheduler::edit`].

use core::any::type_name;
use core::cell::RefCell;
use core::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::accessor::{Accessor, FieldAccessor};
use crate::ease::Ease;
use crate::error::TweenError;
use crate::id::TweenId;
use crate::interpolation::{InterpFn, Interpolation};
use crate::node::{
    NodeId, NodeKind, Segment, TweenNode, ValueTween,
};
use crate::scheduler::TweenScheduler;

/// Marker for group nodes and nodes reopened through
/// [`TweenScheduler::edit`].
pub struct Untyped;

/// Marker for value leaves interpolating a `T`.
pub struct Value<T>(PhantomData<T>);

/// Marker for nodes bound to a shared `S` target.
pub struct Bound<S>(PhantomData<S>);

/// Fluent handle for editing one node of a tween tree.
pub struct TweenBuilder<'s, K> {
    scheduler: &'s mut TweenScheduler,
    node: NodeId,
    _marker: PhantomData<fn() -> K>,
}

impl<'s, K> TweenBuilder<'s, K> {
    pub(crate) fn new(
        scheduler: &'s mut TweenScheduler,
        node: NodeId,
    ) -> Self {
        Self {
            scheduler,
            node,
            _marker: PhantomData,
        }
    }

    fn retype<L>(self, node: NodeId) -> TweenBuilder<'s, L> {
        TweenBuilder::new(self.scheduler, node)
    }

    fn node_mut(&mut self) -> &mut TweenNode {
        self.scheduler
            .nodes
            .get_mut(self.node)
            .expect("Builder nodes stay alive while borrowed!")
    }

    /// Handle of the node being edited.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.node
    }

    /// Group id of the node being edited.
    pub fn tween_id(&self) -> TweenId {
        self.scheduler
            .nodes
            .get(self.node)
            .map(|node| node.id)
            .expect("Builder nodes stay alive while borrowed!")
    }

    /// Registers a callback fired once this node and all of its
    /// children have completed. Multiple callbacks run in
    /// registration order.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.node_mut().callbacks.push(Box::new(callback));
        self
    }

    /// Schedules the tree containing `next` to start once this node
    /// and its subtree have completed. The continuation tree takes
    /// over this node's group id.
    ///
    /// Attaching a new continuation replaces the previous one, which
    /// becomes a regular unscheduled tree again.
    pub fn then(mut self, next: NodeId) -> Result<Self, TweenError> {
        let nodes = &self.scheduler.nodes;
        if !nodes.contains(next) {
            return Err(TweenError::StaleNode(next));
        }

        let next_root = nodes.root_of(next);
        let next_node = nodes
            .get(next_root)
            .ok_or(TweenError::StaleNode(next_root))?;
        if next_node.scheduled {
            return Err(TweenError::AlreadyScheduled(next_root));
        }
        if nodes.reaches(next_root, self.node) {
            return Err(TweenError::SelfContinuation(next_root));
        }

        let tween_id = self.tween_id();
        let previous = self.node_mut().next.replace(next_root);
        if let Some(previous) = previous
            .and_then(|previous| self.scheduler.nodes.get_mut(previous))
        {
            previous.scheduled = false;
        }

        let nodes = &mut self.scheduler.nodes;
        if let Some(next_node) = nodes.get_mut(next_root) {
            next_node.scheduled = true;
        }
        nodes.propagate_id(next_root, tween_id);

        Ok(self)
    }

    /// Adds a value leaf child driving `accessor`.
    pub fn tween<T: Interpolation + 'static>(
        self,
        accessor: Accessor<T>,
        delay: f32,
    ) -> TweenBuilder<'s, Value<T>> {
        let node = self.node;
        let child = self.scheduler.spawn_child(
            node,
            NodeKind::Value(Box::new(ValueTween::new(accessor, T::interp))),
            delay,
        );
        self.retype(child)
    }

    /// Adds an empty group child.
    pub fn group(self, delay: f32) -> TweenBuilder<'s, Untyped> {
        let node = self.node;
        let child = self.scheduler.spawn_child(node, NodeKind::Group, delay);
        self.retype(child)
    }

    /// Adds a child bound to the lifetime of `target`.
    pub fn bind<S: 'static>(
        self,
        target: &Rc<RefCell<S>>,
        delay: f32,
    ) -> TweenBuilder<'s, Bound<S>> {
        let node = self.node;
        let child = self.scheduler.spawn_child(
            node,
            NodeKind::Bound(Box::new(Rc::downgrade(target))),
            delay,
        );
        self.retype(child)
    }

    /// Moves up to the parent node, `None` on a root.
    pub fn parent(self) -> Option<TweenBuilder<'s, Untyped>> {
        let parent = self.scheduler.nodes.get(self.node)?.parent?;
        Some(self.retype(parent))
    }

    /// Moves up to the root of the tree.
    pub fn root(self) -> TweenBuilder<'s, Untyped> {
        let root = self.scheduler.nodes.root_of(self.node);
        self.retype(root)
    }

    /// Submits the tree containing this node to the scheduler.
    pub fn submit(self) -> Result<TweenId, TweenError> {
        self.scheduler.submit(self.node)
    }
}

impl<T: Interpolation + 'static> TweenBuilder<'_, Value<T>> {
    fn value_tween(&mut self) -> &mut ValueTween<T> {
        match &mut self.node_mut().kind {
            NodeKind::Value(tween) => tween
                .as_any_mut()
                .downcast_mut::<ValueTween<T>>()
                .expect("Value builders point at value tweens!"),
            _ => unreachable!("Value builders point at value tweens!"),
        }
    }

    /// Interpolates from `from` to `to` over `duration` seconds.
    pub fn value(mut self, from: T, to: T, duration: f32) -> Self {
        self.value_tween()
            .set_segment(Segment::new(from, to), duration);
        self
    }

    /// Interpolates from the current value to `to` over `duration`
    /// seconds. The current value is read now, not when the tween
    /// starts.
    pub fn value_to(mut self, to: T, duration: f32) -> Self {
        let tween = self.value_tween();
        match tween.accessor.get() {
            Some(from) => tween.set_segment(Segment::new(from, to), duration),
            None => warn!(
                value_type = type_name::<T>(),
                "cannot read the start value, tween left unconfigured"
            ),
        }
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.value_tween().ease = ease;
        self
    }

    /// Replaces the default [`Interpolation`] of `T`.
    pub fn with_interp(mut self, interp: InterpFn<T>) -> Self {
        self.value_tween().interp = interp;
        self
    }
}

impl<'s, S: 'static> TweenBuilder<'s, Bound<S>> {
    fn target(&mut self) -> Weak<RefCell<S>> {
        match &self.node_mut().kind {
            NodeKind::Bound(target) => target
                .as_any()
                .downcast_ref::<Weak<RefCell<S>>>()
                .cloned()
                .expect("Bound builders point at bound nodes!"),
            _ => unreachable!("Bound builders point at bound nodes!"),
        }
    }

    fn spawn_field<T: Interpolation + Clone + 'static>(
        &mut self,
        field: FieldAccessor<S, T>,
        from: Option<T>,
        to: T,
        duration: f32,
        ease: Ease,
    ) {
        let target = self.target();
        let accessor = Accessor::field_weak(target, field);
        let from = from.or_else(|| accessor.get());

        let mut tween = ValueTween::new(accessor, T::interp);
        tween.ease = ease;
        match from {
            Some(from) => tween.set_segment(Segment::new(from, to), duration),
            None => warn!(
                target_type = type_name::<S>(),
                "cannot read the start value, tween left unconfigured"
            ),
        }

        let node = self.node;
        self.scheduler
            .spawn_child(node, NodeKind::Value(Box::new(tween)), 0.0);
    }

    /// Adds a child animating a field of the target from `from` to
    /// `to`.
    pub fn field<T: Interpolation + Clone + 'static>(
        mut self,
        field: FieldAccessor<S, T>,
        from: T,
        to: T,
        duration: f32,
        ease: Ease,
    ) -> Self {
        self.spawn_field(field, Some(from), to, duration, ease);
        self
    }

    /// Adds a child animating a field of the target from its current
    /// value to `to`.
    pub fn field_to<T: Interpolation + Clone + 'static>(
        mut self,
        field: FieldAccessor<S, T>,
        to: T,
        duration: f32,
        ease: Ease,
    ) -> Self {
        self.spawn_field(field, None, to, duration, ease);
        self
    }
}

#[cfg(feature = "transform")]
mod transform {
    use bevy_math::{Quat, Vec3};
    use bevy_transform::components::Transform;

    use super::*;
    use crate::field;

    impl TweenBuilder<'_, Bound<Transform>> {
        pub fn translate(self, to: Vec3, duration: f32, ease: Ease) -> Self {
            self.field_to(field!(<Transform>::translation), to, duration, ease)
        }

        pub fn translate_from(
            self,
            from: Vec3,
            to: Vec3,
            duration: f32,
            ease: Ease,
        ) -> Self {
            self.field(field!(<Transform>::translation), from, to, duration, ease)
        }

        pub fn rotate(self, to: Quat, duration: f32, ease: Ease) -> Self {
            self.field_to(field!(<Transform>::rotation), to, duration, ease)
        }

        pub fn rotate_from(
            self,
            from: Quat,
            to: Quat,
            duration: f32,
            ease: Ease,
        ) -> Self {
            self.field(field!(<Transform>::rotation), from, to, duration, ease)
        }

        pub fn scale(self, to: Vec3, duration: f32, ease: Ease) -> Self {
            self.field_to(field!(<Transform>::scale), to, duration, ease)
        }

        pub fn scale_from(
            self,
            from: Vec3,
            to: Vec3,
            duration: f32,
            ease: Ease,
        ) -> Self {
            self.field(field!(<Transform>::scale), from, to, duration, ease)
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use crate::node::NodeState;

    use super::*;

    #[derive(Debug, Default)]
    struct Sprite {
        alpha: f32,
        offset: (f32, f32),
    }

    #[test]
    fn children_share_the_root_id() {
        let mut scheduler = TweenScheduler::new();
        let value = Rc::new(Cell::new(0.0_f32));

        let root = scheduler.group(0.0);
        let root_id = root.tween_id();
        let leaf = root.tween(Accessor::cell(&value), 0.5).value(0.0, 1.0, 1.0);

        assert_eq!(leaf.tween_id(), root_id);
        let leaf_node = leaf.id();
        let parent = leaf.parent().map(|p| p.id());
        assert_eq!(parent, Some(scheduler.nodes.root_of(leaf_node)));
    }

    #[test]
    fn value_to_reads_the_current_value() {
        let mut scheduler = TweenScheduler::new();
        let value = Rc::new(Cell::new(4.0_f32));

        scheduler
            .tween(Accessor::cell(&value), 0.0)
            .value_to(8.0, 1.0)
            .submit()
            .unwrap();

        value.set(100.0);
        scheduler.tick(0.5);
        assert_eq!(value.get(), 6.0);
    }

    #[test]
    fn ease_and_interp_overrides_apply() {
        let mut scheduler = TweenScheduler::new();
        let value = Rc::new(Cell::new(0.0_f32));

        scheduler
            .tween(Accessor::cell(&value), 0.0)
            .value(0.0, 1.0, 1.0)
            .with_ease(Ease::InQuad)
            .submit()
            .unwrap();
        scheduler.tick(0.5);
        assert_eq!(value.get(), 0.25);

        let stepped = Rc::new(Cell::new(0.0_f32));
        scheduler
            .tween(Accessor::cell(&stepped), 0.0)
            .value(0.0, 1.0, 1.0)
            .with_interp(|a, b, t| if t < 1.0 { *a } else { *b })
            .submit()
            .unwrap();
        scheduler.tick(0.5);
        assert_eq!(stepped.get(), 0.0);
        scheduler.tick(0.5);
        assert_eq!(stepped.get(), 1.0);
    }

    #[test]
    fn bound_fields_follow_the_target() {
        let mut scheduler = TweenScheduler::new();
        let sprite = Rc::new(RefCell::new(Sprite {
            alpha: 1.0,
            ..Default::default()
        }));

        let node = scheduler
            .bind(&sprite, 0.0)
            .field_to(crate::field!(<Sprite>::alpha), 0.0, 2.0, Ease::Linear)
            .field(crate::field!(<Sprite>::offset::1), 0.0, 4.0, 1.0, Ease::Linear)
            .id();
        scheduler.submit(node).unwrap();

        scheduler.tick(1.0);
        assert_eq!(sprite.borrow().alpha, 0.5);
        assert_eq!(sprite.borrow().offset.1, 4.0);
        assert_eq!(scheduler.node_state(node), Some(NodeState::Complete));

        drop(sprite);
        scheduler.tick(1.0);
        assert_eq!(scheduler.live_count(), 0);
    }

    #[test]
    fn then_rejects_invalid_continuations() {
        let mut scheduler = TweenScheduler::new();

        let first = scheduler.group(0.0).id();
        let child = scheduler.edit(first).unwrap().group(0.0).id();

        // A tree cannot continue into itself.
        let err = scheduler.edit(child).unwrap().then(first).err();
        assert_eq!(err, Some(TweenError::SelfContinuation(first)));

        let second = scheduler.group(0.0).id();
        scheduler.edit(first).unwrap().then(second).unwrap();

        // Already attached to `first`.
        let third = scheduler.group(0.0).id();
        let err = scheduler.edit(third).unwrap().then(second).err();
        assert_eq!(err, Some(TweenError::AlreadyScheduled(second)));

        // Closing the loop back onto `first` is a cycle.
        let err = scheduler.edit(second).unwrap().then(first).err();
        assert_eq!(err, Some(TweenError::SelfContinuation(first)));

        // Live trees cannot be attached either.
        scheduler.submit(third).unwrap();
        let err = scheduler.edit(first).unwrap().then(third).err();
        assert_eq!(err, Some(TweenError::AlreadyScheduled(third)));
    }

    #[test]
    fn then_propagates_the_group_id() {
        let mut scheduler = TweenScheduler::new();

        let second = scheduler.group(0.0).group(0.0).id();
        let first = scheduler.group(0.0);
        let first_id = first.tween_id();
        first.then(second).unwrap();

        let root = scheduler.nodes.root_of(second);
        assert_eq!(scheduler.edit(root).unwrap().tween_id(), first_id);
        assert_eq!(scheduler.edit(second).unwrap().tween_id(), first_id);
    }

    #[cfg(feature = "transform")]
    #[test]
    fn transform_helpers_animate_components() {
        use bevy_math::{Quat, Vec3};
        use bevy_transform::components::Transform;

        let mut scheduler = TweenScheduler::new();
        let transform = Rc::new(RefCell::new(Transform::default()));

        scheduler
            .bind(&transform, 0.0)
            .translate(Vec3::new(2.0, 0.0, 0.0), 1.0, Ease::Linear)
            .scale_from(Vec3::ZERO, Vec3::splat(2.0), 1.0, Ease::Linear)
            .rotate(Quat::from_rotation_z(1.0), 1.0, Ease::Linear)
            .submit()
            .unwrap();

        scheduler.tick(0.5);
        {
            let transform = transform.borrow();
            assert_eq!(transform.translation, Vec3::new(1.0, 0.0, 0.0));
            assert_eq!(transform.scale, Vec3::ONE);
        }

        scheduler.tick(0.5);
        let transform = transform.borrow();
        assert_eq!(transform.translation, Vec3::new(2.0, 0.0, 0.0));
        assert!(transform.rotation.angle_between(Quat::from_rotation_z(1.0)) < 1e-4);
    }
}
