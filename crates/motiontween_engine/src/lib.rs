//! [`TweenScheduler`]: scheduler::TweenScheduler
//! [`TweenBuilder`]: builder::TweenBuilder
//! [`Accessor`]: accessor::Accessor
//! [`Ease`]: ease::Ease
//! [`TweenId`]: id::TweenId
//! [`Commands`]: scheduler::Commands
//! [`TweenScheduler::cancel`]: scheduler::TweenScheduler::cancel
//!
//! # MotionTween Engine
//!
//! A tick-driven tweening runtime. Tweens are organized as trees:
//!
//! - **Value leaves** interpolate one external value, reached through
//!   an [`Accessor`], from a start to an end value along an [`Ease`]
//!   curve.
//! - **Children** run in parallel with their parent. A node is only
//!   finished once its own step and every child have finished, at
//!   which point its completion callbacks fire.
//! - **Continuations** (`then`) are whole trees that start on the
//!   tick after their predecessor finishes.
//!
//! Every tree carries a [`TweenId`] shared with its continuations,
//! which is what [`TweenScheduler::cancel`] matches on.
//!
//! Trees are built through [`TweenBuilder`]s borrowed from the
//! [`TweenScheduler`], and callbacks talk back to the scheduler
//! through [`Commands`].
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use motiontween_engine::prelude::*;
//!
//! let mut scheduler = TweenScheduler::new();
//! let x = Rc::new(Cell::new(0.0_f32));
//! let y = Rc::new(Cell::new(0.0_f32));
//!
//! // Slide `y` once `x` is done.
//! let slide_y = scheduler
//!     .tween(Accessor::cell(&y), 0.0)
//!     .value(0.0, 1.0, 1.0)
//!     .id();
//!
//! let id = scheduler
//!     .tween(Accessor::cell(&x), 0.0)
//!     .value(0.0, 2.0, 1.0)
//!     .with_ease(Ease::InOutCubic)
//!     .then(slide_y)
//!     .unwrap()
//!     .submit()
//!     .unwrap();
//!
//! scheduler.tick(1.0);
//! assert_eq!(x.get(), 2.0);
//! assert_eq!(y.get(), 0.0);
//!
//! scheduler.tick(0.5);
//! assert_eq!(y.get(), 0.5);
//!
//! scheduler.cancel(id);
//! assert_eq!(scheduler.live_count(), 0);
//! ```

pub mod accessor;
pub mod builder;
pub mod ease;
pub mod error;
pub mod id;
pub mod interpolation;
pub mod node;
pub mod scheduler;

pub mod prelude {
    pub use crate::accessor::{field, Accessor, FieldAccessor};
    pub use crate::builder::TweenBuilder;
    pub use crate::ease::{Ease, EaseFn};
    pub use crate::error::TweenError;
    pub use crate::id::TweenId;
    pub use crate::interpolation::{InterpFn, Interpolation};
    pub use crate::node::{NodeId, NodeState};
    pub use crate::scheduler::{Commands, TweenScheduler};
}
