//! [Bevy]: https://bevyengine.org/
//! [MotionTween]: motiontween_engine
//!
//! A [Bevy] integration of [MotionTween].
//!
//! [`TweenPlugin`] stores a [`TweenScheduler`] as a non-send
//! resource (tweens hold `Rc` bindings) and ticks it once per frame
//! in [`PostUpdate`] with the frame's [`Time`] delta. Systems reach
//! the scheduler through [`NonSendMut`].

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_time::prelude::*;
use motiontween_engine::scheduler::TweenScheduler;
use tracing::debug;

pub mod prelude {
    pub use crate::{TweenPlugin, TweenSet};
}

pub struct TweenPlugin;

impl Plugin for TweenPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_non_send::<TweenScheduler>() {
            app.insert_non_send_resource(TweenScheduler::new());
        }

        app.configure_sets(PostUpdate, TweenSet::Tick).add_systems(
            PostUpdate,
            tick_scheduler.in_set(TweenSet::Tick),
        );

        debug!("tween scheduler installed");
    }
}

fn tick_scheduler(
    mut scheduler: NonSendMut<TweenScheduler>,
    time: Res<Time>,
) {
    scheduler.tick(time.delta_secs());
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenSet {
    /// Advances the [`TweenScheduler`].
    Tick,
}
