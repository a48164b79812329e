//! The pool: one growable arena holding every node of every stack.

use core::fmt;

use crate::error::{PoolError, Result};
use crate::handle::{Handle, PoolIndex};
use crate::iter::{Handles, StackIter, StackIterMut};
#[cfg(feature = "stats")]
use crate::stats::PoolStats;

/// One slot of the backing store.
///
/// `next` is a single field serving two mutually exclusive roles over the
/// node's lifetime: successor in a live stack, or successor in the free
/// list. `slot` is `Some` exactly while the node is live; `None` marks it
/// as sitting on the free list, which is what lets the checked accessors
/// detect stale handles.
pub(crate) struct Node<T, N: PoolIndex> {
    pub(crate) slot: Option<T>,
    pub(crate) next: Handle<N>,
}

/// A pool of singly-linked stacks sharing one contiguous backing store.
///
/// Nodes live in a single growable arena and are identified by small
/// integer [`Handle`]s instead of addresses. A stack is nothing but the
/// handle of its top node; callers may hold any number of heads into the
/// same pool. Freed nodes go onto an internal free list, threaded through
/// the same `next` field live chains use, and are reused by later pushes
/// before any new storage is grown.
///
/// `N` selects the handle width (default `usize`); a narrower width makes
/// nodes smaller at the price of capping how many nodes the pool can
/// address.
///
/// # Example
/// ```
/// use stack_pool::StackPool;
///
/// let mut pool: StackPool<i32> = StackPool::new();
/// let mut head = pool.new_stack();
/// head = pool.push(10, head);
/// head = pool.push(20, head);
/// head = pool.push(30, head);
///
/// let values: Vec<i32> = pool.iter(head).copied().collect();
/// assert_eq!(values, [30, 20, 10]);
/// ```
///
/// # Aliasing between stacks
///
/// Nothing prevents two heads from converging onto a shared tail, for
/// example after partial pops from a common ancestor chain. This is
/// supported for traversal, but it is *not* tracked: [`free_stack`] on one
/// head frees nodes the other still references, leaving the second head
/// dangling into the free list. Detecting that is the caller's job; the
/// checked accessors report such nodes as [`PoolError::StaleHandle`] until
/// they are reused.
///
/// [`free_stack`]: StackPool::free_stack
pub struct StackPool<T, N: PoolIndex = usize> {
    pub(crate) nodes: Vec<Node<T, N>>,
    free_head: Handle<N>,
    #[cfg(feature = "stats")]
    stats: PoolStats,
}

impl<T, N: PoolIndex> StackPool<T, N> {
    /// Create an empty pool with no backing storage.
    pub fn new() -> Self {
        StackPool {
            nodes: Vec::new(),
            free_head: Handle::END,
            #[cfg(feature = "stats")]
            stats: PoolStats::default(),
        }
    }

    /// Create an empty pool with storage pre-allocated for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self::new();
        pool.nodes = Vec::with_capacity(capacity);
        pool
    }

    /// Start a new, empty stack.
    ///
    /// Returns the end-of-stack sentinel; no node is allocated until the
    /// first push.
    #[inline]
    pub fn new_stack(&self) -> Handle<N> {
        Handle::END
    }

    /// Whether the stack identified by `head` is empty.
    #[inline]
    pub fn is_empty(&self, head: Handle<N>) -> bool {
        head.is_end()
    }

    /// Ensure capacity for at least `n` nodes in total.
    ///
    /// Purely an optimization to amortize growth when the final size is
    /// known up front; never shrinks.
    pub fn reserve(&mut self, n: usize) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            requested = n,
            capacity = self.nodes.capacity(),
            "reserving node storage"
        );
        self.nodes.reserve(n.saturating_sub(self.nodes.len()));
    }

    /// Current capacity of the backing store, in nodes.
    ///
    /// Monotonically non-decreasing over the life of the pool.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of node slots ever created, live or free.
    ///
    /// Storage is recycled, never returned, so this too only grows.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Number of freed nodes currently awaiting reuse.
    ///
    /// Walks the free list; O(free nodes).
    pub fn available(&self) -> usize {
        let mut n = 0;
        let mut cur = self.free_head;
        while !cur.is_end() {
            n += 1;
            cur = self.nodes[cur.slot()].next;
        }
        n
    }

    fn node(&self, handle: Handle<N>) -> Result<&Node<T, N>> {
        if handle.is_end() {
            return Err(PoolError::InvalidHandle { handle: 0, allocated: self.nodes.len() });
        }
        let slot = handle.slot();
        self.nodes.get(slot).ok_or(PoolError::InvalidHandle {
            handle: slot + 1,
            allocated: self.nodes.len(),
        })
    }

    fn node_mut(&mut self, handle: Handle<N>) -> Result<&mut Node<T, N>> {
        if handle.is_end() {
            return Err(PoolError::InvalidHandle { handle: 0, allocated: self.nodes.len() });
        }
        let slot = handle.slot();
        let allocated = self.nodes.len();
        self.nodes
            .get_mut(slot)
            .ok_or(PoolError::InvalidHandle { handle: slot + 1, allocated })
    }

    /// Value stored at `handle`.
    ///
    /// Fails with [`PoolError::InvalidHandle`] for the sentinel or an
    /// out-of-range handle, and [`PoolError::StaleHandle`] when the node is
    /// detectably on the free list.
    pub fn value(&self, handle: Handle<N>) -> Result<&T> {
        let node = self.node(handle)?;
        node.slot
            .as_ref()
            .ok_or(PoolError::StaleHandle { handle: handle.slot() + 1 })
    }

    /// Mutable access to the value stored at `handle`.
    ///
    /// Same error contract as [`value`](StackPool::value).
    pub fn value_mut(&mut self, handle: Handle<N>) -> Result<&mut T> {
        let node = self.node_mut(handle)?;
        node.slot
            .as_mut()
            .ok_or(PoolError::StaleHandle { handle: handle.slot() + 1 })
    }

    /// Successor of `handle` in whichever chain it currently belongs to:
    /// the next stack element for a live node, the next free node for one
    /// on the free list.
    ///
    /// Fails with [`PoolError::InvalidHandle`] for the sentinel or an
    /// out-of-range handle.
    pub fn next_of(&self, handle: Handle<N>) -> Result<Handle<N>> {
        Ok(self.node(handle)?.next)
    }

    /// Value stored at `handle`, without any checking.
    ///
    /// # Safety
    /// `handle` must designate a currently live node of this pool. In
    /// particular it must not be the sentinel, a handle from another pool,
    /// or a handle whose node was freed.
    #[inline]
    pub unsafe fn value_unchecked(&self, handle: Handle<N>) -> &T {
        // SAFETY: a live handle's slot is in range and holds Some (caller
        // contract).
        unsafe {
            self.nodes
                .get_unchecked(handle.slot())
                .slot
                .as_ref()
                .unwrap_unchecked()
        }
    }

    /// Mutable access to the value stored at `handle`, without any checking.
    ///
    /// # Safety
    /// Same contract as [`value_unchecked`](StackPool::value_unchecked).
    #[inline]
    pub unsafe fn value_unchecked_mut(&mut self, handle: Handle<N>) -> &mut T {
        // SAFETY: a live handle's slot is in range and holds Some (caller
        // contract).
        unsafe {
            self.nodes
                .get_unchecked_mut(handle.slot())
                .slot
                .as_mut()
                .unwrap_unchecked()
        }
    }

    /// Successor of `handle`, without any checking.
    ///
    /// # Safety
    /// `handle` must be a non-sentinel handle designating a slot of this
    /// pool (live or on the free list).
    #[inline]
    pub unsafe fn next_unchecked(&self, handle: Handle<N>) -> Handle<N> {
        // SAFETY: slot in range (caller contract).
        unsafe { self.nodes.get_unchecked(handle.slot()).next }
    }

    /// Push `value` on top of the stack whose head is `head`, returning the
    /// new head.
    ///
    /// A node is popped off the free list when one is available; otherwise
    /// one fresh slot is appended to the backing store, growing it
    /// geometrically. Amortized O(1).
    ///
    /// # Panics
    /// Panics if `head` is neither the sentinel nor a live handle of this
    /// pool, or if the handle width cannot address one more node. Use
    /// [`try_push`](StackPool::try_push) to handle these as errors instead.
    pub fn push(&mut self, value: T, head: Handle<N>) -> Handle<N> {
        match self.try_push(value, head) {
            Ok(new_head) => new_head,
            Err(err) => panic!("stack-pool push failed: {err}"),
        }
    }

    /// Checked variant of [`push`](StackPool::push).
    pub fn try_push(&mut self, value: T, head: Handle<N>) -> Result<Handle<N>> {
        // A dead head would thread the new node into the free list and
        // corrupt both chains, so it is rejected here.
        if !head.is_end() {
            self.node(head)?
                .slot
                .as_ref()
                .ok_or(PoolError::StaleHandle { handle: head.slot() + 1 })?;
        }

        let new_head = if self.free_head.is_end() {
            let Some(handle) = Handle::from_slot(self.nodes.len()) else {
                return Err(PoolError::HandleOverflow { limit: N::MAX_SLOTS });
            };
            #[cfg(feature = "tracing")]
            if self.nodes.len() == self.nodes.capacity() {
                tracing::trace!(allocated = self.nodes.len(), "growing node storage");
            }
            self.nodes.push(Node { slot: Some(value), next: head });
            #[cfg(feature = "stats")]
            self.stats.record_push(false);
            handle
        } else {
            let handle = self.free_head;
            let node = &mut self.nodes[handle.slot()];
            self.free_head = node.next;
            node.slot = Some(value);
            node.next = head;
            #[cfg(feature = "stats")]
            self.stats.record_push(true);
            handle
        };
        Ok(new_head)
    }

    /// Push without validating `head`.
    ///
    /// # Safety
    /// `head` must be the sentinel or a live handle of this pool. Still
    /// panics on handle-width exhaustion, like [`push`](StackPool::push).
    pub unsafe fn push_unchecked(&mut self, value: T, head: Handle<N>) -> Handle<N> {
        if self.free_head.is_end() {
            let Some(handle) = Handle::from_slot(self.nodes.len()) else {
                panic!("stack-pool push failed: handle width exhausted");
            };
            self.nodes.push(Node { slot: Some(value), next: head });
            #[cfg(feature = "stats")]
            self.stats.record_push(false);
            handle
        } else {
            let handle = self.free_head;
            // SAFETY: free-list handles always designate slots of this pool.
            let node = unsafe { self.nodes.get_unchecked_mut(handle.slot()) };
            self.free_head = node.next;
            node.slot = Some(value);
            node.next = head;
            #[cfg(feature = "stats")]
            self.stats.record_push(true);
            handle
        }
    }

    /// Pop the top node of the stack whose head is `head`.
    ///
    /// Returns the popped value together with the new head, and splices the
    /// detached node onto the front of the free list. O(1).
    ///
    /// Fails with [`PoolError::EmptyStack`] on the sentinel, and with
    /// [`PoolError::InvalidHandle`]/[`PoolError::StaleHandle`] for a handle
    /// that does not designate a live node.
    pub fn pop(&mut self, head: Handle<N>) -> Result<(T, Handle<N>)> {
        if head.is_end() {
            return Err(PoolError::EmptyStack);
        }
        let free_head = self.free_head;
        let node = self.node_mut(head)?;
        let value = node
            .slot
            .take()
            .ok_or(PoolError::StaleHandle { handle: head.slot() + 1 })?;
        let new_head = node.next;
        node.next = free_head;
        self.free_head = head;
        #[cfg(feature = "stats")]
        self.stats.record_pop();
        Ok((value, new_head))
    }

    /// Pop without any checking.
    ///
    /// # Safety
    /// `head` must be a live, non-sentinel handle of this pool.
    pub unsafe fn pop_unchecked(&mut self, head: Handle<N>) -> (T, Handle<N>) {
        // SAFETY: a live handle's slot is in range and holds Some (caller
        // contract).
        let node = unsafe { self.nodes.get_unchecked_mut(head.slot()) };
        let value = unsafe { node.slot.take().unwrap_unchecked() };
        let new_head = node.next;
        node.next = self.free_head;
        self.free_head = head;
        #[cfg(feature = "stats")]
        self.stats.record_pop();
        (value, new_head)
    }

    /// Release an entire stack back to the free list.
    ///
    /// Returns the sentinel, representing the now-empty stack; calling it
    /// on the sentinel is a no-op. Every value in the chain is dropped.
    ///
    /// The walk to the tail makes this O(length of the stack) rather than
    /// O(1): the whole chain is spliced in one step, by linking the chain's
    /// *tail* to the current free-list head and repointing the free head at
    /// the chain's head, so future free-list pops stay O(1) without a
    /// second pointer.
    ///
    /// # Panics
    /// Panics if the chain contains an out-of-range handle, which can only
    /// happen with a handle from another pool.
    pub fn free_stack(&mut self, head: Handle<N>) -> Handle<N> {
        if head.is_end() {
            return head;
        }
        debug_assert!(
            self.nodes.get(head.slot()).is_some_and(|node| node.slot.is_some()),
            "free_stack called with a dead handle"
        );

        #[cfg(any(feature = "stats", feature = "tracing"))]
        let mut freed = 0usize;

        let mut tail = head;
        loop {
            let node = &mut self.nodes[tail.slot()];
            node.slot = None;
            #[cfg(any(feature = "stats", feature = "tracing"))]
            {
                freed += 1;
            }
            if node.next.is_end() {
                break;
            }
            tail = node.next;
        }

        // Single splice: the chain's tail takes over the current free list
        // and the chain's head becomes the new free head.
        self.nodes[tail.slot()].next = self.free_head;
        self.free_head = head;

        #[cfg(feature = "stats")]
        self.stats.record_free_stack(freed);
        #[cfg(feature = "tracing")]
        tracing::trace!(nodes = freed, "stack released");

        Handle::END
    }

    /// Drop every node and reset the free list, keeping the backing
    /// storage.
    ///
    /// Invalidates every outstanding handle of this pool.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_head = Handle::END;
        #[cfg(feature = "stats")]
        self.stats.record_clear();
        #[cfg(feature = "tracing")]
        tracing::trace!(capacity = self.nodes.capacity(), "pool cleared");
    }

    /// Forward traversal cursor over the chain starting at `head`.
    ///
    /// Non-consuming and restartable: iterating borrows the pool shared,
    /// and a fresh cursor can always be built from the same head.
    pub fn iter(&self, head: Handle<N>) -> StackIter<'_, T, N> {
        StackIter::new(self, head)
    }

    /// Iterator over the handles of the chain starting at `head`.
    ///
    /// The safe way to mutate along a chain: collect or step handles here,
    /// then go through [`value_mut`](StackPool::value_mut).
    pub fn handles(&self, head: Handle<N>) -> Handles<'_, T, N> {
        Handles::new(self, head)
    }

    /// Mutable traversal cursor over the chain starting at `head`.
    ///
    /// # Safety
    /// The chain starting at `head` must not reach any node twice. Chains
    /// stay acyclic under normal use; the exception is the aliasing misuse
    /// described on [`StackPool`], where a freed shared tail is re-pushed
    /// into one of its own dangling chains. In that case this cursor could
    /// hand out two `&mut` borrows of one node.
    pub unsafe fn iter_mut(&mut self, head: Handle<N>) -> StackIterMut<'_, T, N> {
        StackIterMut::new(self, head)
    }

    /// Operation counters for this pool.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

impl<T, N: PoolIndex> Default for StackPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, N: PoolIndex> fmt::Debug for StackPool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackPool")
            .field("allocated", &self.nodes.len())
            .field("capacity", &self.nodes.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_costs_nothing() {
        let pool: StackPool<u32> = StackPool::new();
        let head = pool.new_stack();
        assert!(pool.is_empty(head));
        assert_eq!(pool.allocated(), 0);
        assert_eq!(pool.capacity(), 0);
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut pool: StackPool<u32> = StackPool::new();
        let mut head = pool.new_stack();
        for v in [1, 2, 3] {
            head = pool.push(v, head);
            assert!(!pool.is_empty(head));
        }

        let (v, head) = pool.pop(head).unwrap();
        assert_eq!(v, 3);
        let (v, head) = pool.pop(head).unwrap();
        assert_eq!(v, 2);
        let (v, head) = pool.pop(head).unwrap();
        assert_eq!(v, 1);
        assert!(pool.is_empty(head));
        assert_eq!(pool.pop(head), Err(PoolError::EmptyStack));
    }

    #[test]
    fn pop_then_push_reuses_the_node() {
        let mut pool: StackPool<&str> = StackPool::new();
        let head = pool.push("a", pool.new_stack());
        let top = pool.push("b", head);

        let (_, rest) = pool.pop(top).unwrap();
        assert_eq!(pool.available(), 1);

        let reused = pool.push("c", rest);
        assert_eq!(reused, top, "free list must be consulted before growth");
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.allocated(), 2);
    }

    #[test]
    fn free_stack_splices_the_whole_chain() {
        let mut pool: StackPool<i64> = StackPool::new();
        let mut head = pool.new_stack();
        for v in 0..5 {
            head = pool.push(v, head);
        }
        assert_eq!(pool.available(), 0);

        let empty = pool.free_stack(head);
        assert!(empty.is_end());
        assert_eq!(pool.available(), 5);

        // The freed chain is reused top-first, without growing storage.
        let capacity = pool.capacity();
        let mut head = pool.new_stack();
        for v in 0..5 {
            head = pool.push(v, head);
        }
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.capacity(), capacity);
        assert_eq!(pool.allocated(), 5);
        let _ = head;
    }

    #[test]
    fn free_stack_on_sentinel_is_a_noop() {
        let mut pool: StackPool<u8> = StackPool::new();
        let head = pool.new_stack();
        assert!(pool.free_stack(head).is_end());
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn freed_nodes_are_reused_head_first() {
        let mut pool: StackPool<u32> = StackPool::new();
        let mut head = pool.new_stack();
        head = pool.push(10, head);
        head = pool.push(20, head);
        let top = pool.push(30, head);

        pool.free_stack(top);
        // The chain's head became the free head, so the first reuse gets
        // the slot that held 30.
        let reused = pool.push(99, pool.new_stack());
        assert_eq!(reused, top);
    }

    #[test]
    fn checked_access_reports_misuse() {
        let mut pool: StackPool<u32> = StackPool::new();
        let head = pool.push(7, pool.new_stack());

        // Sentinel where a live handle is required.
        let end = pool.new_stack();
        assert_eq!(
            pool.value(end),
            Err(PoolError::InvalidHandle { handle: 0, allocated: 1 })
        );

        // Out of range: handle minted by a bigger pool.
        let mut other: StackPool<u32> = StackPool::new();
        let mut foreign = other.new_stack();
        for v in 0..4 {
            foreign = other.push(v, foreign);
        }
        assert_eq!(
            pool.value(foreign),
            Err(PoolError::InvalidHandle { handle: 4, allocated: 1 })
        );

        // Stale: freed but not yet reused.
        let (_, _) = pool.pop(head).unwrap();
        assert_eq!(pool.value(head), Err(PoolError::StaleHandle { handle: 1 }));
        assert_eq!(pool.pop(head), Err(PoolError::StaleHandle { handle: 1 }));
        assert_eq!(
            pool.try_push(1, head),
            Err(PoolError::StaleHandle { handle: 1 })
        );

        // next_of still answers for free-list nodes: it reports the free
        // successor, here the end of the (one-node) free list.
        assert_eq!(pool.next_of(head), Ok(Handle::END));
    }

    #[test]
    fn narrow_width_exhausts_cleanly() {
        let mut pool: StackPool<u8, u8> = StackPool::new();
        let mut head = pool.new_stack();
        for v in 0..255u16 {
            head = pool.push(v as u8, head);
        }
        assert_eq!(pool.allocated(), 255);
        assert_eq!(
            pool.try_push(0, head),
            Err(PoolError::HandleOverflow { limit: 255 })
        );

        // Freeing makes room again without growing.
        let (_, head) = pool.pop(head).unwrap();
        assert!(pool.try_push(1, head).is_ok());
    }

    #[test]
    fn unchecked_access_matches_checked() {
        let mut pool: StackPool<String> = StackPool::new();
        let h1 = pool.push("bottom".to_string(), pool.new_stack());
        let h2 = pool.push("top".to_string(), h1);

        // SAFETY: h1 and h2 are live handles of this pool.
        unsafe {
            assert_eq!(pool.value_unchecked(h2), "top");
            assert_eq!(pool.next_unchecked(h2), h1);
            pool.value_unchecked_mut(h1).push_str(" node");
        }
        assert_eq!(pool.value(h1).unwrap(), "bottom node");

        // SAFETY: h2 is live.
        let (v, rest) = unsafe { pool.pop_unchecked(h2) };
        assert_eq!(v, "top");
        assert_eq!(rest, h1);

        // SAFETY: h1 is live; the freed h2 slot is reused.
        let reused = unsafe { pool.push_unchecked("again".to_string(), h1) };
        assert_eq!(reused, h2);
    }

    #[test]
    fn reserve_is_total_and_never_shrinks() {
        let mut pool: StackPool<u32> = StackPool::with_capacity(8);
        assert!(pool.capacity() >= 8);

        let before = pool.capacity();
        pool.reserve(4);
        assert!(pool.capacity() >= before);

        pool.reserve(64);
        assert!(pool.capacity() >= 64);
    }

    #[test]
    fn clear_keeps_storage() {
        let mut pool: StackPool<u32> = StackPool::new();
        let mut head = pool.new_stack();
        for v in 0..16 {
            head = pool.push(v, head);
        }
        let capacity = pool.capacity();

        pool.clear();
        assert_eq!(pool.allocated(), 0);
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.capacity(), capacity);
        assert!(pool.value(head).is_err());
    }

    #[test]
    fn values_drop_when_freed() {
        use std::rc::Rc;

        let witness = Rc::new(());
        let mut pool: StackPool<Rc<()>> = StackPool::new();
        let mut head = pool.new_stack();
        for _ in 0..3 {
            head = pool.push(Rc::clone(&witness), head);
        }
        assert_eq!(Rc::strong_count(&witness), 4);

        let (value, head) = pool.pop(head).unwrap();
        drop(value);
        assert_eq!(Rc::strong_count(&witness), 3);

        pool.free_stack(head);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn stats_track_reuse() {
        let mut pool: StackPool<u32> = StackPool::new();
        let mut head = pool.new_stack();
        for v in 0..4 {
            head = pool.push(v, head);
        }
        let (_, head) = pool.pop(head).unwrap();
        let _ = pool.push(9, head);

        let stats = pool.stats();
        assert_eq!(stats.pushes(), 5);
        assert_eq!(stats.pops(), 1);
        assert_eq!(stats.reuse_hits(), 1);
        assert_eq!(stats.fresh_nodes(), 4);
        assert_eq!(stats.peak_live(), 4);

        pool.free_stack(pool.new_stack());
        assert_eq!(pool.stats().stacks_freed(), 0);
    }
}
