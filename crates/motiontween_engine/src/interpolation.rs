//! Blending between a start and an end value.

use bevy_math::{Quat, Vec2, Vec3, Vec4};

/// Blends `start` into `end` by a progress `t`.
pub type InterpFn<T> = fn(start: &T, end: &T, t: f32) -> T;

/// Types a value tween can drive.
///
/// `t` is never clamped, so overshooting easings (back, elastic) may
/// push the result past either end. At `t == 1.0` the result is
/// exactly `b`.
pub trait Interpolation<T = Self, U = Self> {
    fn interp(a: &Self, b: &T, t: f32) -> U;
}

/// Weighted sum `a * (1 - t) + b * t` for types with component-wise
/// arithmetic.
macro_rules! impl_lerp {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Interpolation for $ty {
                #[inline]
                fn interp(a: &Self, b: &Self, t: f32) -> Self {
                    *a * (1.0 - t) + *b * t
                }
            }
        )+
    };
}

impl_lerp!(f32, Vec2, Vec3, Vec4);

impl Interpolation for Quat {
    /// Shortest-path slerp.
    #[inline]
    fn interp(a: &Self, b: &Self, t: f32) -> Self {
        a.slerp(*b, t)
    }
}

impl Interpolation for bool {
    #[inline]
    fn interp(a: &Self, b: &Self, t: f32) -> Self {
        step(*a, *b, t)
    }
}

/// Rounded and saturated, for 8-bit channels.
impl Interpolation for u8 {
    fn interp(a: &Self, b: &Self, t: f32) -> Self {
        let (a, b) = (*a as f32, *b as f32);
        (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(feature = "color")]
mod color {
    use bevy_color::{Color, LinearRgba, Mix, Oklaba, Srgba};

    use super::Interpolation;

    impl_lerp!(LinearRgba, Srgba, Oklaba);

    /// Mixed in the color space of `a`.
    impl Interpolation for Color {
        #[inline]
        fn interp(a: &Self, b: &Self, t: f32) -> Self {
            a.mix(b, t)
        }
    }
}

#[cfg(feature = "transform")]
mod transform {
    use bevy_transform::components::Transform;

    use super::Interpolation;

    impl Interpolation for Transform {
        fn interp(a: &Self, b: &Self, t: f32) -> Self {
            Transform {
                translation: Interpolation::interp(&a.translation, &b.translation, t),
                rotation: Interpolation::interp(&a.rotation, &b.rotation, t),
                scale: Interpolation::interp(&a.scale, &b.scale, t),
            }
        }
    }
}

/// Holds `a` until `t` reaches `1.0`, then switches to `b`.
#[inline]
pub fn step<T>(a: T, b: T, t: f32) -> T {
    if t < 1.0 {
        a
    } else {
        b
    }
}
