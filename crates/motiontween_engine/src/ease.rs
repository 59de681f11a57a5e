//! Easing functions that map normalized progress to eased progress.
//!
//! Every curve family lives in its own module and exposes
//! `ease_in`, `ease_out` and `ease_in_out` as plain [`EaseFn`]s, so
//! they can be passed around as function pointers:
//!
//! ```
//! use motiontween_engine::ease;
//!
//! let curves: [ease::EaseFn; 3] = [
//!     ease::linear,
//!     ease::cubic::ease_in_out,
//!     ease::bounce::ease_out,
//! ];
//!
//! for curve in curves {
//!     assert!((curve(0.0) - 0.0).abs() < 1e-5);
//!     assert!((curve(1.0) - 1.0).abs() < 1e-5);
//! }
//! ```
//!
//! The functions themselves never clamp their input, allowing
//! extrapolation past the nominal `[0, 1]` range. Use [`evaluate`]
//! to clamp the input first, or [`evaluate_unclamped`] to keep it.
//!
//! For data-driven selection (config files, inspectors, ...) the
//! [`Ease`] enum names every built-in curve and can be parsed from a
//! string.

use core::fmt;
use core::str::FromStr;

use crate::error::ParseEaseError;

/// Easing function on a [`f32`] progress.
pub type EaseFn = fn(t: f32) -> f32;

/// Evaluate `ease` with `t` clamped to `[0, 1]`.
#[inline]
pub fn evaluate(t: f32, ease: &Ease) -> f32 {
    ease.evaluate(t.clamp(0.0, 1.0))
}

/// Evaluate `ease` without clamping `t`, allowing curves to be
/// extrapolated beyond the nominal range.
#[inline]
pub fn evaluate_unclamped(t: f32, ease: &Ease) -> f32 {
    ease.evaluate(t)
}

#[inline]
pub fn linear(t: f32) -> f32 {
    t
}

/// Power curves with a real valued exponent.
///
/// [`quad`], [`cubic`], [`quart`] and [`quint`] are this family with
/// an exponent of 2 to 5.
pub mod power {
    #[inline]
    pub fn ease_in(t: f32, exponent: f32) -> f32 {
        t.powf(exponent)
    }

    #[inline]
    pub fn ease_out(t: f32, exponent: f32) -> f32 {
        1.0 - (1.0 - t).powf(exponent)
    }

    #[inline]
    pub fn ease_in_out(t: f32, exponent: f32) -> f32 {
        if t < 0.5 {
            0.5 * (2.0 * t).powf(exponent)
        } else {
            1.0 - 0.5 * (2.0 - 2.0 * t).powf(exponent)
        }
    }
}

macro_rules! power_family {
    ($name:ident, $exponent:literal) => {
        pub mod $name {
            #[inline]
            pub fn ease_in(t: f32) -> f32 {
                super::power::ease_in(t, $exponent)
            }

            #[inline]
            pub fn ease_out(t: f32) -> f32 {
                super::power::ease_out(t, $exponent)
            }

            #[inline]
            pub fn ease_in_out(t: f32) -> f32 {
                super::power::ease_in_out(t, $exponent)
            }
        }
    };
}

power_family!(quad, 2.0);
power_family!(cubic, 3.0);
power_family!(quart, 4.0);
power_family!(quint, 5.0);

pub mod sine {
    use core::f32::consts::{FRAC_PI_2, PI};

    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        1.0 - (t * FRAC_PI_2).cos()
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        (t * FRAC_PI_2).sin()
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        0.5 - 0.5 * (t * PI).cos()
    }
}

/// Exponential curves. The `pow` singularities at the ends are
/// pinned to exactly 0 and 1.
pub mod expo {
    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        if t <= 0.0 {
            0.0
        } else {
            2.0_f32.powf(10.0 * (t - 1.0))
        }
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        if t >= 1.0 {
            1.0
        } else {
            1.0 - 2.0_f32.powf(-10.0 * t)
        }
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        if t < 0.5 {
            if t <= 0.0 {
                0.0
            } else {
                2.0_f32.powf(20.0 * t - 11.0)
            }
        } else if t >= 1.0 {
            1.0
        } else {
            1.0 - 2.0_f32.powf(-20.0 * t + 9.0)
        }
    }
}

pub mod circ {
    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        1.0 - (1.0 - t * t).sqrt()
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        let a = 1.0 - t;
        (1.0 - a * a).sqrt()
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        if t < 0.5 {
            0.5 * (1.0 - (1.0 - 4.0 * t * t).sqrt())
        } else {
            let a = 2.0 - 2.0 * t;
            0.5 * (1.0 + (1.0 - a * a).sqrt())
        }
    }
}

/// Curves that pull back before moving forward (or overshoot the
/// end).
pub mod back {
    const OVERSHOOT: f32 = 1.70158;
    const OVERSHOOT_IN_OUT: f32 = OVERSHOOT * 1.525;

    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        t * t * ((OVERSHOOT + 1.0) * t - OVERSHOOT)
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        let a = t - 1.0;
        1.0 + a * a * ((OVERSHOOT + 1.0) * a + OVERSHOOT)
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        const S: f32 = OVERSHOOT_IN_OUT;

        if t < 0.5 {
            2.0 * t * t * (2.0 * t * (S + 1.0) - S)
        } else {
            let a = t - 1.0;
            2.0 * a * a * (2.0 * a * (S + 1.0) + S) + 1.0
        }
    }
}

/// Oscillating curves with a period of a third (or, for
/// `ease_in_out`, 4.5ths) of the unit interval.
pub mod elastic {
    use core::f32::consts::TAU;

    const PERIOD: f32 = TAU / 3.0;
    const PERIOD_IN_OUT: f32 = TAU / 4.5;

    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        if t <= 0.0 {
            0.0
        } else if t >= 1.0 {
            1.0
        } else {
            -(2.0_f32.powf(10.0 * t - 10.0))
                * (PERIOD * (10.0 * t - 10.75)).sin()
        }
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        if t <= 0.0 {
            0.0
        } else if t >= 1.0 {
            1.0
        } else {
            2.0_f32.powf(-10.0 * t) * (PERIOD * (10.0 * t - 0.75)).sin()
                + 1.0
        }
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        if t <= 0.0 {
            0.0
        } else if t >= 1.0 {
            1.0
        } else if t < 0.5 {
            -(2.0_f32.powf(20.0 * t - 11.0))
                * (PERIOD_IN_OUT * (20.0 * t - 11.125)).sin()
        } else {
            2.0_f32.powf(-20.0 * t + 9.0)
                * (PERIOD_IN_OUT * (20.0 * t - 11.125)).sin()
                + 1.0
        }
    }
}

/// Piecewise quadratic bouncing curves.
pub mod bounce {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;

    #[inline]
    pub fn ease_in(t: f32) -> f32 {
        1.0 - ease_out(1.0 - t)
    }

    #[inline]
    pub fn ease_out(t: f32) -> f32 {
        if t < 1.0 / D {
            N * t * t
        } else if t < 2.0 / D {
            let t = t - 1.5 / D;
            N * t * t + 0.75
        } else if t < 2.5 / D {
            let t = t - 2.25 / D;
            N * t * t + 0.9375
        } else {
            let t = t - 2.625 / D;
            N * t * t + 0.984375
        }
    }

    #[inline]
    pub fn ease_in_out(t: f32) -> f32 {
        if t < 0.5 {
            0.5 - 0.5 * ease_out(1.0 - 2.0 * t)
        } else {
            0.5 + 0.5 * ease_out(2.0 * t - 1.0)
        }
    }
}

macro_rules! named_eases {
    ($($variant:ident => $name:literal => $func:path,)*) => {
        /// A named easing curve.
        ///
        /// Covers every curve in this module, the power family with
        /// an arbitrary exponent and user provided [`EaseFn`]s.
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub enum Ease {
            #[default]
            $($variant,)*
            /// [`power::ease_in`] with the given exponent.
            InPower(f32),
            /// [`power::ease_out`] with the given exponent.
            OutPower(f32),
            /// [`power::ease_in_out`] with the given exponent.
            InOutPower(f32),
            Custom(EaseFn),
        }

        impl Ease {
            /// Every named (non parameterized) curve.
            pub const ALL: &'static [Ease] = &[$(Ease::$variant,)*];

            /// Evaluate the curve at `t` without clamping.
            pub fn evaluate(&self, t: f32) -> f32 {
                match self {
                    $(Ease::$variant => $func(t),)*
                    Ease::InPower(exponent) => power::ease_in(t, *exponent),
                    Ease::OutPower(exponent) => power::ease_out(t, *exponent),
                    Ease::InOutPower(exponent) => {
                        power::ease_in_out(t, *exponent)
                    }
                    Ease::Custom(f) => f(t),
                }
            }

            /// The kebab-case name of the curve.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Ease::$variant => $name,)*
                    Ease::InPower(_) => "in-power",
                    Ease::OutPower(_) => "out-power",
                    Ease::InOutPower(_) => "in-out-power",
                    Ease::Custom(_) => "custom",
                }
            }
        }
    };
}

named_eases! {
    Linear => "linear" => linear,
    InSine => "in-sine" => sine::ease_in,
    OutSine => "out-sine" => sine::ease_out,
    InOutSine => "in-out-sine" => sine::ease_in_out,
    InQuad => "in-quad" => quad::ease_in,
    OutQuad => "out-quad" => quad::ease_out,
    InOutQuad => "in-out-quad" => quad::ease_in_out,
    InCubic => "in-cubic" => cubic::ease_in,
    OutCubic => "out-cubic" => cubic::ease_out,
    InOutCubic => "in-out-cubic" => cubic::ease_in_out,
    InQuart => "in-quart" => quart::ease_in,
    OutQuart => "out-quart" => quart::ease_out,
    InOutQuart => "in-out-quart" => quart::ease_in_out,
    InQuint => "in-quint" => quint::ease_in,
    OutQuint => "out-quint" => quint::ease_out,
    InOutQuint => "in-out-quint" => quint::ease_in_out,
    InExpo => "in-expo" => expo::ease_in,
    OutExpo => "out-expo" => expo::ease_out,
    InOutExpo => "in-out-expo" => expo::ease_in_out,
    InCirc => "in-circ" => circ::ease_in,
    OutCirc => "out-circ" => circ::ease_out,
    InOutCirc => "in-out-circ" => circ::ease_in_out,
    InBack => "in-back" => back::ease_in,
    OutBack => "out-back" => back::ease_out,
    InOutBack => "in-out-back" => back::ease_in_out,
    InElastic => "in-elastic" => elastic::ease_in,
    OutElastic => "out-elastic" => elastic::ease_out,
    InOutElastic => "in-out-elastic" => elastic::ease_in_out,
    InBounce => "in-bounce" => bounce::ease_in,
    OutBounce => "out-bounce" => bounce::ease_out,
    InOutBounce => "in-out-bounce" => bounce::ease_in_out,
}

impl From<EaseFn> for Ease {
    fn from(f: EaseFn) -> Self {
        Ease::Custom(f)
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::InPower(e) | Ease::OutPower(e) | Ease::InOutPower(e) => {
                write!(f, "{}({e})", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Parses the named curves. Matching ignores case, `-` and `_`, so
/// `"in-out-cubic"`, `"InOutCubic"` and `"in_out_cubic"` are all
/// [`Ease::InOutCubic`].
impl FromStr for Ease {
    type Err = ParseEaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |name: &str| -> String {
            name.chars()
                .filter(|c| *c != '-' && *c != '_')
                .flat_map(char::to_lowercase)
                .collect()
        };

        let wanted = normalize(s.trim());
        Ease::ALL
            .iter()
            .find(|ease| normalize(ease.name()) == wanted)
            .copied()
            .ok_or_else(|| ParseEaseError {
                name: s.to_owned(),
            })
    }
}
