//! Traversal cursors over one stack's chain.
//!
//! Cursors are thin views over pool state, not owning traversals: they can
//! be copied freely, restarted from any head handle, and two of them
//! compare equal exactly when they sit on the same handle. The sentinel
//! position is the shared end for every stack in a pool. Iterating never
//! mutates the pool; a cursor held across a structural mutation of its
//! chain observes the mutated state, so don't.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::handle::{Handle, PoolIndex};
use crate::pool::{Node, StackPool};

/// Forward cursor yielding shared references to a chain's values.
///
/// Created by [`StackPool::iter`]. A chain that was freed underneath the
/// cursor ends early instead of walking into the free list.
pub struct StackIter<'a, T, N: PoolIndex = usize> {
    pool: &'a StackPool<T, N>,
    cur: Handle<N>,
}

impl<'a, T, N: PoolIndex> StackIter<'a, T, N> {
    pub(crate) fn new(pool: &'a StackPool<T, N>, head: Handle<N>) -> Self {
        StackIter { pool, cur: head }
    }

    /// Handle of the node the cursor currently sits on.
    ///
    /// The sentinel once the chain is exhausted.
    pub fn handle(&self) -> Handle<N> {
        self.cur
    }
}

impl<'a, T, N: PoolIndex> Iterator for StackIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur.is_end() {
            return None;
        }
        let node = &self.pool.nodes[self.cur.slot()];
        match node.slot.as_ref() {
            Some(value) => {
                self.cur = node.next;
                Some(value)
            }
            // Chain freed under the cursor: stop rather than wander the
            // free list.
            None => {
                self.cur = Handle::END;
                None
            }
        }
    }
}

impl<T, N: PoolIndex> FusedIterator for StackIter<'_, T, N> {}

impl<T, N: PoolIndex> Clone for StackIter<'_, T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, N: PoolIndex> Copy for StackIter<'_, T, N> {}

impl<T, N: PoolIndex> PartialEq for StackIter<'_, T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.cur == other.cur
    }
}

impl<T, N: PoolIndex> Eq for StackIter<'_, T, N> {}

impl<T, N: PoolIndex> fmt::Debug for StackIter<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackIter").field("at", &self.cur).finish()
    }
}

/// Cursor yielding the handles of a chain instead of its values.
///
/// Created by [`StackPool::handles`]. This is the checked route for
/// mutating along a chain: walk the handles, then borrow each value
/// through [`StackPool::value_mut`].
pub struct Handles<'a, T, N: PoolIndex = usize> {
    pool: &'a StackPool<T, N>,
    cur: Handle<N>,
}

impl<'a, T, N: PoolIndex> Handles<'a, T, N> {
    pub(crate) fn new(pool: &'a StackPool<T, N>, head: Handle<N>) -> Self {
        Handles { pool, cur: head }
    }
}

impl<'a, T, N: PoolIndex> Iterator for Handles<'a, T, N> {
    type Item = Handle<N>;

    fn next(&mut self) -> Option<Handle<N>> {
        if self.cur.is_end() {
            return None;
        }
        let node = &self.pool.nodes[self.cur.slot()];
        if node.slot.is_none() {
            self.cur = Handle::END;
            return None;
        }
        let current = self.cur;
        self.cur = node.next;
        Some(current)
    }
}

impl<T, N: PoolIndex> FusedIterator for Handles<'_, T, N> {}

impl<T, N: PoolIndex> Clone for Handles<'_, T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, N: PoolIndex> Copy for Handles<'_, T, N> {}

/// Forward cursor yielding mutable references to a chain's values.
///
/// Created by [`StackPool::iter_mut`], whose safety contract (each node
/// reached at most once) is what keeps the yielded borrows disjoint.
pub struct StackIterMut<'a, T, N: PoolIndex = usize> {
    nodes: *mut Node<T, N>,
    len: usize,
    cur: Handle<N>,
    _pool: PhantomData<&'a mut StackPool<T, N>>,
}

impl<'a, T, N: PoolIndex> StackIterMut<'a, T, N> {
    pub(crate) fn new(pool: &'a mut StackPool<T, N>, head: Handle<N>) -> Self {
        StackIterMut {
            nodes: pool.nodes.as_mut_ptr(),
            len: pool.nodes.len(),
            cur: head,
            _pool: PhantomData,
        }
    }

    /// Handle of the node the cursor currently sits on.
    pub fn handle(&self) -> Handle<N> {
        self.cur
    }
}

impl<'a, T, N: PoolIndex> Iterator for StackIterMut<'a, T, N> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.cur.is_end() {
            return None;
        }
        let slot = self.cur.slot();
        assert!(slot < self.len, "handle out of range");
        // SAFETY: slot is bounds-checked above and the pool is exclusively
        // borrowed for 'a; the construction contract of `iter_mut` makes
        // the chain reach each node at most once, so the borrows handed
        // out never alias.
        let node = unsafe { &mut *self.nodes.add(slot) };
        match node.slot.as_mut() {
            Some(value) => {
                self.cur = node.next;
                Some(value)
            }
            None => {
                self.cur = Handle::END;
                None
            }
        }
    }
}

impl<T, N: PoolIndex> FusedIterator for StackIterMut<'_, T, N> {}
