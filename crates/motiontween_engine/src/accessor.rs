//! Bindings between a tween and the value it animates.
//!
//! An [`Accessor`] is a get/set pair over a single external value,
//! plus an optional liveness probe telling the scheduler whether the
//! backing object still exists. The engine never owns the animated
//! value, it only reads it when a tween is built and writes it once
//! per active tick.
//!
//! [`FieldAccessor`] projects a field out of a larger structure and
//! is created with the [`field!`] macro.

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

/// A typed accessor to a field of type `T` within a source type `S`.
///
/// This holds both immutable and mutable function pointers, which
/// allows retrieving references to the target field inside a source.
///
/// # Example
/// ```
/// use motiontween_engine::accessor::FieldAccessor;
///
/// #[derive(Default)]
/// struct Foo { value: i32 }
///
/// fn ref_fn(s: &Foo) -> &i32 { &s.value }
/// fn mut_fn(s: &mut Foo) -> &mut i32 { &mut s.value }
///
/// let accessor = FieldAccessor { ref_fn, mut_fn };
/// let mut foo = Foo { value: 42 };
///
/// assert_eq!(*accessor.get_ref(&foo), 42);
/// *accessor.get_mut(&mut foo) = 999;
/// assert_eq!(foo.value, 999);
/// ```
pub struct FieldAccessor<S: 'static, T: 'static> {
    pub ref_fn: fn(&S) -> &T,
    pub mut_fn: fn(&mut S) -> &mut T,
}

impl<S, T> FieldAccessor<S, T> {
    pub const fn new(
        ref_fn: fn(&S) -> &T,
        mut_fn: fn(&mut S) -> &mut T,
    ) -> Self {
        Self { ref_fn, mut_fn }
    }

    #[inline]
    pub fn get_ref<'a>(&self, source: &'a S) -> &'a T {
        (self.ref_fn)(source)
    }

    #[inline]
    pub fn get_mut<'a>(&self, source: &'a mut S) -> &'a mut T {
        (self.mut_fn)(source)
    }
}

impl<S, T> Copy for FieldAccessor<S, T> {}

impl<S, T> Clone for FieldAccessor<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> fmt::Debug for FieldAccessor<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("source", &core::any::type_name::<S>())
            .field("target", &core::any::type_name::<T>())
            .finish()
    }
}

/// Creates a [`FieldAccessor`] from a field path.
///
/// # Example
///
/// ```
/// use motiontween_engine::accessor::{field, FieldAccessor};
///
/// struct Inner { x: f32 }
/// struct Outer { inner: Inner, scale: (f32, f32) }
///
/// let x: FieldAccessor<Outer, f32> = field!(<Outer>::inner::x);
/// let sy: FieldAccessor<Outer, f32> = field!(<Outer>::scale::1);
///
/// let mut outer = Outer { inner: Inner { x: 1.0 }, scale: (2.0, 3.0) };
/// *x.get_mut(&mut outer) = 5.0;
///
/// assert_eq!(outer.inner.x, 5.0);
/// assert_eq!(*sy.get_ref(&outer), 3.0);
/// ```
#[macro_export]
macro_rules! field {
    (<$source:ty>$(::$field:tt)*) => {
        $crate::accessor::FieldAccessor::new(
            |source: &$source| &source$(.$field)*,
            |source: &mut $source| &mut source$(.$field)*,
        )
    };
}
pub use field;

type GetFn<T> = Box<dyn Fn() -> Option<T>>;
type SetFn<T> = Box<dyn Fn(T)>;
type ProbeFn = Box<dyn Fn() -> bool>;

/// A get/set binding over a single external value of type `T`.
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use motiontween_engine::accessor::Accessor;
///
/// let value = Rc::new(Cell::new(1.0_f32));
/// let accessor = Accessor::cell(&value);
///
/// accessor.set(4.0);
/// assert_eq!(value.get(), 4.0);
/// assert!(accessor.is_alive());
///
/// drop(value);
/// assert!(!accessor.is_alive());
/// assert_eq!(accessor.get(), None);
/// ```
pub struct Accessor<T> {
    get: GetFn<T>,
    set: SetFn<T>,
    probe: Option<ProbeFn>,
}

impl<T: 'static> Accessor<T> {
    /// An always-alive accessor built from a getter and a setter.
    pub fn new(
        get: impl Fn() -> T + 'static,
        set: impl Fn(T) + 'static,
    ) -> Self {
        Self {
            get: Box::new(move || Some(get())),
            set: Box::new(set),
            probe: None,
        }
    }

    /// Replace the liveness probe. The scheduler removes the tween,
    /// without running callbacks, once the probe returns `false`.
    pub fn with_liveness(
        mut self,
        probe: impl Fn() -> bool + 'static,
    ) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Weakly binds to a shared [`Cell`]. The accessor is alive as
    /// long as the cell has a strong owner.
    pub fn cell(cell: &Rc<Cell<T>>) -> Self
    where
        T: Copy,
    {
        let get_cell = Rc::downgrade(cell);
        let set_cell = Rc::downgrade(cell);
        let probe_cell = Rc::downgrade(cell);

        Self {
            get: Box::new(move || get_cell.upgrade().map(|c| c.get())),
            set: Box::new(move |value| {
                if let Some(c) = set_cell.upgrade() {
                    c.set(value);
                }
            }),
            probe: Some(Box::new(move || probe_cell.strong_count() > 0)),
        }
    }

    /// Weakly binds to a field of a shared target.
    pub fn field<S: 'static>(
        target: &Rc<RefCell<S>>,
        field: FieldAccessor<S, T>,
    ) -> Self
    where
        T: Clone,
    {
        Self::field_weak(Rc::downgrade(target), field)
    }

    pub(crate) fn field_weak<S: 'static>(
        target: Weak<RefCell<S>>,
        field: FieldAccessor<S, T>,
    ) -> Self
    where
        T: Clone,
    {
        let get_target = target.clone();
        let set_target = target.clone();
        let probe_target = target;

        Self {
            get: Box::new(move || {
                let target = get_target.upgrade()?;
                let source = target.try_borrow().ok()?;
                Some(field.get_ref(&source).clone())
            }),
            set: Box::new(move |value| {
                let Some(target) = set_target.upgrade() else {
                    return;
                };
                let Ok(mut source) = target.try_borrow_mut() else {
                    warn!(
                        target_type = core::any::type_name::<S>(),
                        "tween target is already borrowed, skipping write"
                    );
                    return;
                };
                *field.get_mut(&mut source) = value;
            }),
            probe: Some(Box::new(move || probe_target.strong_count() > 0)),
        }
    }

    /// Reads the current value, `None` if the target is gone or
    /// cannot be borrowed.
    #[inline]
    pub fn get(&self) -> Option<T> {
        (self.get)()
    }

    #[inline]
    pub fn set(&self, value: T) {
        (self.set)(value)
    }

    /// Whether the backing object is still alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.probe.as_ref().is_none_or(|probe| probe())
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("value", &core::any::type_name::<T>())
            .field("probed", &self.probe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Foo {
        x: i32,
        nested: Bar,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Bar {
        y: f32,
    }

    #[test]
    fn field_macro_projects_nested_fields() {
        let y = field!(<Foo>::nested::y);
        let mut foo = Foo::default();

        *y.get_mut(&mut foo) = 2.5;
        assert_eq!(foo.nested.y, 2.5);
        assert_eq!(*y.get_ref(&foo), 2.5);
    }

    #[test]
    fn closure_accessor_is_always_alive() {
        let shared = Rc::new(Cell::new(0));
        let (get, set) = (shared.clone(), shared.clone());
        let accessor = Accessor::new(move || get.get(), move |v| set.set(v));

        accessor.set(7);
        assert_eq!(accessor.get(), Some(7));
        assert!(accessor.is_alive());
    }

    #[test]
    fn liveness_probe_overrides_default() {
        let alive = Rc::new(Cell::new(true));
        let probe = alive.clone();
        let accessor =
            Accessor::new(|| 0.0_f32, |_| {}).with_liveness(move || probe.get());

        assert!(accessor.is_alive());
        alive.set(false);
        assert!(!accessor.is_alive());
    }

    #[test]
    fn field_accessor_reads_and_writes_target() {
        let target = Rc::new(RefCell::new(Foo {
            x: 3,
            ..Default::default()
        }));
        let accessor = Accessor::field(&target, field!(<Foo>::x));

        assert_eq!(accessor.get(), Some(3));
        accessor.set(10);
        assert_eq!(target.borrow().x, 10);
    }

    #[test]
    fn field_accessor_dies_with_target() {
        let target = Rc::new(RefCell::new(Foo::default()));
        let accessor = Accessor::field(&target, field!(<Foo>::nested::y));

        drop(target);
        assert!(!accessor.is_alive());
        assert_eq!(accessor.get(), None);
        // Writing to a dead target is a no-op.
        accessor.set(1.0);
    }

    #[test]
    fn borrowed_target_skips_write() {
        let target = Rc::new(RefCell::new(Foo::default()));
        let accessor = Accessor::field(&target, field!(<Foo>::x));

        let guard = target.borrow();
        accessor.set(5);
        drop(guard);

        assert_eq!(target.borrow().x, 0);
    }
}
