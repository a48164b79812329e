//! Operation counters for stack pools.
//!
//! Plain counters, not atomics: every recording path takes `&mut self`
//! through the pool, which is single-threaded by design.

/// Counters recorded by a [`StackPool`](crate::StackPool).
#[derive(Debug, Default, Clone)]
pub struct PoolStats {
    pushes: u64,
    pops: u64,
    reuse_hits: u64,
    fresh_nodes: u64,
    stacks_freed: u64,
    nodes_freed: u64,
    clears: u64,
    live_nodes: usize,
    peak_live: usize,
}

impl PoolStats {
    /// Total pushes, across every stack of the pool.
    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    /// Total pops.
    pub fn pops(&self) -> u64 {
        self.pops
    }

    /// Pushes served by recycling a free-list node.
    pub fn reuse_hits(&self) -> u64 {
        self.reuse_hits
    }

    /// Pushes that had to grow the backing store by one slot.
    pub fn fresh_nodes(&self) -> u64 {
        self.fresh_nodes
    }

    /// Whole-stack releases via `free_stack` (the sentinel no-op not
    /// counted).
    pub fn stacks_freed(&self) -> u64 {
        self.stacks_freed
    }

    /// Nodes returned to the free list by `free_stack`.
    pub fn nodes_freed(&self) -> u64 {
        self.nodes_freed
    }

    /// Pool-wide resets via `clear`.
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Nodes currently live (pushed and not yet freed).
    pub fn live_nodes(&self) -> usize {
        self.live_nodes
    }

    /// Highest number of simultaneously live nodes observed.
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    pub(crate) fn record_push(&mut self, reused: bool) {
        self.pushes += 1;
        if reused {
            self.reuse_hits += 1;
        } else {
            self.fresh_nodes += 1;
        }
        self.live_nodes += 1;
        if self.live_nodes > self.peak_live {
            self.peak_live = self.live_nodes;
        }
    }

    pub(crate) fn record_pop(&mut self) {
        self.pops += 1;
        self.live_nodes -= 1;
    }

    pub(crate) fn record_free_stack(&mut self, nodes: usize) {
        self.stacks_freed += 1;
        self.nodes_freed += nodes as u64;
        self.live_nodes -= nodes;
    }

    pub(crate) fn record_clear(&mut self) {
        self.clears += 1;
        self.live_nodes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_tracks_high_water_mark() {
        let mut stats = PoolStats::default();
        stats.record_push(false);
        stats.record_push(false);
        stats.record_pop();
        stats.record_push(true);

        assert_eq!(stats.pushes(), 3);
        assert_eq!(stats.fresh_nodes(), 2);
        assert_eq!(stats.reuse_hits(), 1);
        assert_eq!(stats.live_nodes(), 2);
        assert_eq!(stats.peak_live(), 2);

        stats.record_free_stack(2);
        assert_eq!(stats.live_nodes(), 0);
        assert_eq!(stats.nodes_freed(), 2);
        assert_eq!(stats.peak_live(), 2);
    }
}
