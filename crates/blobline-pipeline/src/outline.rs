//! Partial boundary chains under construction during a trace.
//!
//! A [`Chain`] is one open rectilinear boundary being stitched together
//! row by row: a double-ended vertex sequence that grows at both ends and
//! run-length-compresses straight edges as it grows. Chains live in a
//! [`ChainArena`] and are addressed by [`ChainId`] handles; the tracer's
//! per-column slot array stores handles rather than owning references, so
//! two slots can designate the same chain without aliasing. Handles are
//! allocated monotonically and never reused within a trace, so a stale
//! handle can never accidentally resolve to a newer chain.

use std::collections::VecDeque;

use crate::types::{GridPoint, RawPolygon};

/// Whether three grid points lie on one straight line.
///
/// Exact integer cross-product test; no floating-point tolerance.
pub(crate) const fn collinear(a: GridPoint, b: GridPoint, c: GridPoint) -> bool {
    (b.x - a.x) * (c.y - b.y) == (b.y - a.y) * (c.x - b.x)
}

/// One open boundary chain: an ordered, growable sequence of grid
/// vertices.
///
/// Between any three consecutive stored vertices, no three are collinear;
/// `append`/`prepend` maintain this by replacing the end vertex when the
/// new point extends a straight edge.
#[derive(Debug, Default)]
pub(crate) struct Chain {
    points: VecDeque<GridPoint>,
}

impl Chain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Add a vertex at the tail, replacing the current tail vertex when
    /// the new point is collinear with the last two.
    pub(crate) fn append(&mut self, p: GridPoint) {
        let n = self.points.len();
        if n >= 2 && collinear(self.points[n - 2], self.points[n - 1], p) {
            self.points[n - 1] = p;
        } else {
            self.points.push_back(p);
        }
    }

    /// Add a vertex at the head, replacing the current head vertex when
    /// the new point is collinear with the first two.
    pub(crate) fn prepend(&mut self, p: GridPoint) {
        if self.points.len() >= 2 && collinear(self.points[1], self.points[0], p) {
            self.points[0] = p;
        } else {
            self.points.push_front(p);
        }
    }

    /// Splice another chain onto this one's tail, compressing straight
    /// edges across the junction. The other chain is consumed.
    pub(crate) fn append_chain(&mut self, other: Self) {
        for p in other.points {
            self.append(p);
        }
    }

    /// Splice another chain onto this one's head, compressing straight
    /// edges across the junction. The other chain is consumed.
    pub(crate) fn prepend_chain(&mut self, other: Self) {
        for p in other.points.into_iter().rev() {
            self.prepend(p);
        }
    }

    /// Finalize the chain into a closed polygon.
    ///
    /// Runs one more collinearity pass over the interior and across the
    /// wrap-around (last-to-first) edge, trimming redundant vertices that
    /// merges may have introduced at the closure point.
    pub(crate) fn into_polygon(self) -> RawPolygon {
        let mut ring: Vec<GridPoint> = Vec::with_capacity(self.points.len());
        for p in self.points {
            ring.push(p);
            let n = ring.len();
            if n >= 3 && collinear(ring[n - 3], ring[n - 2], ring[n - 1]) {
                ring.remove(n - 2);
            }
        }
        // Wrap-around: the closure edge may make the last or first vertex
        // redundant.
        let n = ring.len();
        if n > 2 && collinear(ring[n - 2], ring[n - 1], ring[0]) {
            ring.pop();
        }
        let n = ring.len();
        if n > 2 && collinear(ring[n - 1], ring[0], ring[1]) {
            ring.remove(0);
        }
        RawPolygon::new(ring)
    }

    #[cfg(test)]
    pub(crate) fn vertices(&self) -> Vec<GridPoint> {
        self.points.iter().copied().collect()
    }
}

/// Handle to a chain stored in a [`ChainArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChainId(usize);

/// Owner of all chains alive during one trace.
///
/// Slots are never reused: consuming a chain leaves a tombstone, and any
/// later access through its handle is a tracer bug that aborts the trace.
#[derive(Debug, Default)]
pub(crate) struct ChainArena {
    chains: Vec<Option<Chain>>,
}

impl ChainArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store a chain and return its handle.
    pub(crate) fn alloc(&mut self, chain: Chain) -> ChainId {
        self.chains.push(Some(chain));
        ChainId(self.chains.len() - 1)
    }

    /// Borrow a live chain mutably.
    pub(crate) fn get_mut(&mut self, id: ChainId) -> &mut Chain {
        match self.chains[id.0].as_mut() {
            Some(chain) => chain,
            None => unreachable!("outline chain {} referenced after being consumed", id.0),
        }
    }

    /// Remove a chain from the arena, transferring ownership to the
    /// caller. The handle becomes permanently dead.
    pub(crate) fn take(&mut self, id: ChainId) -> Chain {
        match self.chains[id.0].take() {
            Some(chain) => chain,
            None => unreachable!("outline chain {} consumed twice", id.0),
        }
    }
}
