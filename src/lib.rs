//! [Bevy]: https://bevyengine.org/
//! [`TweenScheduler`]: motiontween_engine::scheduler::TweenScheduler
//! [`Ease`]: motiontween_engine::ease::Ease
//! [`TweenPlugin`]: bevy_motiontween::TweenPlugin
//!
//! MotionTween is a code-driven tweening runtime. It animates
//! external values over time along easing curves, runs tweens in
//! parallel or in sequence, and cancels whole groups of them by id.
//!
//! The core of this crate is the [`TweenScheduler`]:
//! - Trees of tweens are built with fluent builders borrowed from it.
//! - It is ticked once per frame with the elapsed time.
//! - Finished trees hand over to their continuations on the next tick.
//!
//! Curves come from the [`Ease`] catalogue or any `fn(f32) -> f32`.
//!
//! With the `bevy` feature, [`TweenPlugin`] ticks a scheduler from
//! [Bevy]'s frame time.

pub use motiontween_engine;

#[cfg(feature = "bevy")]
pub use bevy_motiontween;

pub mod prelude {
    pub use motiontween_engine::prelude::*;

    #[cfg(feature = "bevy")]
    pub use bevy_motiontween::prelude::*;
}
