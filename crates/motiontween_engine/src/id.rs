//! Group identifiers used for mass cancellation.

use core::fmt;

/// Identifies a tween group: a root tree together with every node and
/// continuation spawned from it.
///
/// Ids live in `[0, 65536)` and wrap around, so an id may be reused
/// once 65536 newer groups have been created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct TweenId(u16);

impl TweenId {
    /// Returns the raw id value.
    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TweenId({})", self.0)
    }
}

/// Issues [`TweenId`]s in increasing order, wrapping back to 0 after
/// `65535`. There is no collision detection.
#[derive(Debug, Default, Clone)]
pub struct TweenIdAllocator {
    next: u16,
}

impl TweenIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current id and advances the counter.
    pub fn next_id(&mut self) -> TweenId {
        let id = TweenId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Peeks at the id that [`Self::next_id`] will return.
    pub fn peek(&self) -> TweenId {
        TweenId(self.next)
    }
}
