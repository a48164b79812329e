//! Node handles and the index-width abstraction.
//!
//! A [`Handle`] is a plain, copyable identifier for one node slot inside a
//! [`StackPool`](crate::StackPool). The raw value `0` is reserved as the
//! end-of-stack sentinel; handle `h` with raw value `r > 0` designates slot
//! `r - 1` of the backing store. Handles carry no ownership: copying one,
//! or holding several into the same pool, is always fine.

use core::fmt;
use core::hash::Hash;

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer types usable as the handle width of a pool.
///
/// The width bounds how many nodes a pool can ever address: a `u16` pool
/// tops out at `u16::MAX` nodes, a `usize` pool (the default) at the
/// address-space limit. The trait is sealed; it is implemented for `u8`,
/// `u16`, `u32`, `u64` and `usize`.
pub trait PoolIndex: Copy + Eq + Ord + Hash + fmt::Debug + sealed::Sealed {
    /// Raw representation of the end-of-stack sentinel.
    const END: Self;

    /// Largest number of node slots this width can address.
    const MAX_SLOTS: usize;

    /// Convert a slot index into a raw handle value (`slot + 1`).
    ///
    /// Returns `None` when `slot + 1` does not fit in `Self`.
    fn from_slot(slot: usize) -> Option<Self>;

    /// Convert a raw handle value back into its slot index (`raw - 1`).
    ///
    /// Must not be called on [`Self::END`].
    fn slot(self) -> usize;
}

macro_rules! impl_pool_index {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl PoolIndex for $ty {
            const END: Self = 0;
            const MAX_SLOTS: usize = <$ty>::MAX as usize;

            #[inline]
            fn from_slot(slot: usize) -> Option<Self> {
                if slot < Self::MAX_SLOTS {
                    Some((slot as $ty) + 1)
                } else {
                    None
                }
            }

            #[inline]
            fn slot(self) -> usize {
                debug_assert!(self != Self::END, "sentinel has no slot");
                self as usize - 1
            }
        }
    )*};
}

impl_pool_index!(u8, u16, u32, u64, usize);

/// Identifier of a node in a [`StackPool`](crate::StackPool).
///
/// A whole stack is identified by the handle of its top node; the empty
/// stack is [`Handle::END`]. Handles are meaningful only for the pool that
/// issued them, and only until the node they designate is freed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle<N: PoolIndex = usize>(N);

impl<N: PoolIndex> Handle<N> {
    /// The end-of-stack sentinel, shared by every stack in a pool.
    ///
    /// This is also what [`new_stack`](crate::StackPool::new_stack) returns:
    /// an empty stack costs nothing.
    pub const END: Self = Handle(N::END);

    /// Whether this handle is the end-of-stack sentinel.
    #[inline]
    pub fn is_end(self) -> bool {
        self.0 == N::END
    }

    /// The raw index value backing this handle.
    #[inline]
    pub fn raw(self) -> N {
        self.0
    }

    #[inline]
    pub(crate) fn from_slot(slot: usize) -> Option<Self> {
        N::from_slot(slot).map(Handle)
    }

    /// Slot index of the designated node. Must not be called on the sentinel.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0.slot()
    }
}

impl<N: PoolIndex> Default for Handle<N> {
    fn default() -> Self {
        Self::END
    }
}

impl<N: PoolIndex> fmt::Debug for Handle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("Handle(END)")
        } else {
            write!(f, "Handle({:?})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_zero() {
        let end: Handle<usize> = Handle::END;
        assert!(end.is_end());
        assert_eq!(end.raw(), 0);
        assert_eq!(Handle::<u16>::default(), Handle::END);
    }

    #[test]
    fn slot_roundtrip() {
        for slot in [0usize, 1, 7, 1000] {
            let h = Handle::<usize>::from_slot(slot).unwrap();
            assert!(!h.is_end());
            assert_eq!(h.slot(), slot);
            assert_eq!(h.raw(), slot + 1);
        }
    }

    #[test]
    fn narrow_width_limits() {
        assert!(Handle::<u8>::from_slot(254).is_some());
        assert!(Handle::<u8>::from_slot(255).is_none());
        assert_eq!(u8::MAX_SLOTS, 255);
        assert_eq!(u16::MAX_SLOTS, 65535);
    }

    #[test]
    fn handles_are_plain_values() {
        let a = Handle::<u32>::from_slot(3).unwrap();
        let b = a;
        assert_eq!(a, b);
        assert!(Handle::<u32>::END < a);
        assert_eq!(format!("{a:?}"), "Handle(4)");
        assert_eq!(format!("{:?}", Handle::<u32>::END), "Handle(END)");
    }
}
