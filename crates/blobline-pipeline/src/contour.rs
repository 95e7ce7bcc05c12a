//! Contour tracing: extract closed rectilinear polygons from a binary
//! mask.
//!
//! One top-to-bottom, left-to-right sweep over the mask classifies every
//! 2x2 pixel neighborhood into boundary edge events (upper, lower, left,
//! right) and stitches the resulting segments into closed polygons using
//! open [`Chain`]s indexed by grid column. Rows `0..=h` and columns
//! `0..=w` run one past the pixel range so bottom and right edges flush
//! without special cases; a one-pixel lookahead fills the current row
//! buffer before its values are consumed.
//!
//! Foreground blobs are 8-connected: two pixels touching only diagonally
//! belong to one blob, and their shared grid corner is a pinch point the
//! boundary passes through twice. The "lower-right corner" state tracks
//! that configuration so one contour is not spuriously split in two.
//!
//! Inner hole boundaries are detected but discarded: each blob is
//! reported as the simple polygon of its outer boundary only.

use crate::mask::BinaryMask;
use crate::outline::{Chain, ChainArena, ChainId};
use crate::types::{GridPoint, RawPolygon};

/// Trace the outer boundary of every foreground blob in the mask.
///
/// Returns one closed [`RawPolygon`] per 8-connected blob, in the order
/// their bottom edges complete during the scan. Deterministic; a pure
/// function of the mask contents.
///
/// # Panics
///
/// Panics if an internal transition-table invariant is violated. This
/// indicates a bug in the tracer, never bad input data; a wrong polygon
/// would be silent corruption, so the trace aborts instead.
#[must_use]
pub fn trace(mask: &BinaryMask) -> Vec<RawPolygon> {
    Tracer::new(mask).run()
}

/// Narrowing helper for buffer indices; mask widths fit in usize on all
/// supported targets.
#[allow(clippy::cast_possible_truncation)]
const fn idx(x: u32) -> usize {
    x as usize
}

struct Tracer<'a> {
    mask: &'a BinaryMask,
    arena: ChainArena,
    /// `slots[x]` holds the open chain currently touching grid line `x`
    /// at the scan row, if any.
    slots: Vec<Option<ChainId>>,
    /// Foreground state of the previous pixel row, padded with a false
    /// sentinel at both ends: `prev_row[x + 1]` is pixel `(x, y - 1)`.
    prev_row: Vec<bool>,
    /// Same layout for the current row, filled one pixel ahead of the
    /// processing column.
    this_row: Vec<bool>,
    polygons: Vec<RawPolygon>,
    /// Set after a lower-right-corner event: the column where two
    /// boundary segments of the remembered chain meet diagonally, and
    /// the second chain to re-engage there. Reset every row.
    corner: Option<(u32, ChainId)>,
}

impl<'a> Tracer<'a> {
    fn new(mask: &'a BinaryMask) -> Self {
        let w = idx(mask.width());
        Self {
            mask,
            arena: ChainArena::new(),
            slots: vec![None; w + 1],
            prev_row: vec![false; w + 2],
            this_row: vec![false; w + 2],
            polygons: Vec::new(),
            corner: None,
        }
    }

    fn run(mut self) -> Vec<RawPolygon> {
        let w = self.mask.width();
        let h = self.mask.height();
        for y in 0..=h {
            std::mem::swap(&mut self.prev_row, &mut self.this_row);
            self.corner = None;
            self.this_row[1] = y < h && self.mask.is_set(0, y);
            for x in 0..=w {
                // Read one pixel ahead so this_row[x + 1] is valid when
                // consumed below. Cells 0 and w + 1 stay false forever.
                if x + 1 < w {
                    self.this_row[idx(x) + 2] = y < h && self.mask.is_set(x + 1, y);
                }
                if self.this_row[idx(x) + 1] {
                    // Pixel (x, y) is foreground.
                    if !self.prev_row[idx(x) + 1] {
                        self.upper_edge(x, y, w, h);
                    }
                    if !self.this_row[idx(x)] {
                        self.left_edge(x, y);
                    }
                } else {
                    // Pixel (x, y) is background.
                    if self.prev_row[idx(x) + 1] {
                        self.lower_edge(x, y, w, h);
                    }
                    if self.this_row[idx(x)] {
                        self.right_edge(x, y);
                    }
                }
            }
        }
        self.polygons
    }

    /// The chain remembered by a lower-right-corner event at column `x`,
    /// if the event happened at exactly this column.
    fn corner_chain(&self, x: u32) -> Option<ChainId> {
        self.corner.and_then(|(cx, id)| (cx == x).then_some(id))
    }

    /// Horizontal boundary along the top of foreground pixel `(x, y)`:
    /// the pixel above is background.
    fn upper_edge(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let left_pt = GridPoint::new(i64::from(x), i64::from(y));
        let right_pt = GridPoint::new(i64::from(x) + 1, i64::from(y));
        match (self.slots[idx(x)], self.slots[idx(x) + 1]) {
            (None, None) => {
                // Fresh segment: start a new chain spanning both columns.
                let mut chain = Chain::new();
                chain.append(right_pt);
                chain.append(left_pt);
                let id = self.arena.alloc(chain);
                self.slots[idx(x)] = Some(id);
                self.slots[idx(x) + 1] = Some(id);
            }
            (None, Some(right)) => {
                // Extend the chain at the right column leftwards.
                self.slots[idx(x)] = Some(right);
                self.slots[idx(x) + 1] = None;
                self.arena.get_mut(right).append(left_pt);
            }
            (Some(left), None) => {
                self.slots[idx(x) + 1] = Some(left);
                if let Some(other) = self.corner_chain(x) {
                    // Two boundary segments leave the remembered corner:
                    // re-engage the second chain at this column.
                    self.slots[idx(x)] = Some(other);
                    self.arena.get_mut(other).append(left_pt);
                } else {
                    self.slots[idx(x)] = None;
                }
                self.arena.get_mut(left).prepend(right_pt);
            }
            (Some(left), Some(right)) if left == right => {
                if x + 1 < w
                    && y < h
                    && self.corner_chain(x).is_none()
                    && !self.this_row[idx(x) + 2]
                    && self.prev_row[idx(x) + 2]
                {
                    // Lower-right corner of the background area above:
                    // the chain touches this grid corner diagonally and
                    // continues at the next column instead of closing.
                    self.slots[idx(x)] = None;
                    self.arena.get_mut(left).prepend(right_pt);
                    self.corner = Some((x + 1, left));
                } else {
                    // An inner hole boundary closed. Holes are not
                    // reported; drop the chain.
                    drop(self.arena.take(left));
                    self.slots[idx(x) + 1] = None;
                    self.slots[idx(x)] = self.corner_chain(x);
                }
            }
            (Some(left), Some(right)) => {
                // Two distinct chains meet above this segment: merge.
                let consumed = self.arena.take(right);
                self.arena.get_mut(left).prepend_chain(consumed);
                self.rewire_after_merge(x, right, left);
            }
        }
    }

    /// Horizontal boundary along the bottom of the foreground pixel above
    /// `(x, y)`: this pixel is background, the pixel above is not.
    fn lower_edge(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let left_pt = GridPoint::new(i64::from(x), i64::from(y));
        let right_pt = GridPoint::new(i64::from(x) + 1, i64::from(y));
        match (self.slots[idx(x)], self.slots[idx(x) + 1]) {
            (None, None) => {
                let mut chain = Chain::new();
                chain.append(left_pt);
                chain.append(right_pt);
                let id = self.arena.alloc(chain);
                self.slots[idx(x)] = Some(id);
                self.slots[idx(x) + 1] = Some(id);
            }
            (None, Some(right)) => {
                self.slots[idx(x)] = Some(right);
                self.slots[idx(x) + 1] = None;
                self.arena.get_mut(right).prepend(left_pt);
            }
            (Some(left), None) => {
                self.slots[idx(x) + 1] = Some(left);
                if let Some(other) = self.corner_chain(x) {
                    self.slots[idx(x)] = Some(other);
                    self.arena.get_mut(other).prepend(left_pt);
                } else {
                    self.slots[idx(x)] = None;
                }
                self.arena.get_mut(left).append(right_pt);
            }
            (Some(left), Some(right)) if left == right => {
                if x + 1 < w
                    && y < h
                    && self.corner_chain(x).is_none()
                    && self.this_row[idx(x) + 2]
                    && !self.prev_row[idx(x) + 2]
                {
                    // Lower-right corner of the blob: the next pixel is
                    // foreground touching diagonally, so the boundary
                    // continues rather than closing here.
                    self.slots[idx(x)] = None;
                    self.arena.get_mut(left).append(right_pt);
                    self.corner = Some((x + 1, left));
                } else {
                    // The outer boundary closed: emit the polygon.
                    let chain = self.arena.take(left);
                    self.polygons.push(chain.into_polygon());
                    self.slots[idx(x) + 1] = None;
                    self.slots[idx(x)] = self.corner_chain(x);
                }
            }
            (Some(left), Some(right)) => {
                if x + 1 < w
                    && y < h
                    && self.corner_chain(x).is_none()
                    && self.this_row[idx(x) + 2]
                    && !self.prev_row[idx(x) + 2]
                {
                    // Diagonal continuation with two distinct chains:
                    // both pass through the corner; remember the left one
                    // and keep the right one armed at the next column.
                    self.arena.get_mut(left).append(right_pt);
                    self.arena.get_mut(right).prepend(right_pt);
                    self.corner = Some((x + 1, left));
                    self.slots[idx(x)] = None;
                    // slots[x + 1] unchanged.
                } else {
                    let consumed = self.arena.take(right);
                    self.arena.get_mut(left).append_chain(consumed);
                    self.rewire_after_merge(x, right, left);
                }
            }
        }
    }

    /// Vertical boundary on grid line `x`: pixel `(x, y)` is foreground
    /// and its left neighbor is not. Grows the chain downwards at the
    /// tail.
    fn left_edge(&mut self, x: u32, y: u32) {
        let Some(id) = self.slots[idx(x)] else {
            unreachable!("left edge at column {x}, row {y} with no open chain");
        };
        self.arena
            .get_mut(id)
            .append(GridPoint::new(i64::from(x), i64::from(y) + 1));
    }

    /// Vertical boundary on grid line `x`: pixel `(x - 1, y)` is
    /// foreground and pixel `(x, y)` is not. Grows the chain downwards at
    /// the head.
    fn right_edge(&mut self, x: u32, y: u32) {
        let Some(id) = self.slots[idx(x)] else {
            unreachable!("right edge at column {x}, row {y} with no open chain");
        };
        self.arena
            .get_mut(id)
            .prepend(GridPoint::new(i64::from(x), i64::from(y) + 1));
    }

    /// After a merge consumed chain `old`, exactly one other slot must
    /// still reference it; repoint that slot to `new` and clear this
    /// event's columns.
    fn rewire_after_merge(&mut self, x: u32, old: ChainId, new: ChainId) {
        let skip = idx(x) + 1;
        let found = self.slots.iter_mut().enumerate().any(|(i, slot)| {
            if i != skip && *slot == Some(old) {
                *slot = Some(new);
                true
            } else {
                false
            }
        });
        assert!(
            found,
            "merged outline chain at column {x} had no second slot reference",
        );
        self.slots[skip] = None;
        self.slots[idx(x)] = self.corner_chain(x);
    }
}
