//! Statement tree simplifier.
//!
//! Two structural cleanups run before scheduling:
//! - Unit loop removal: a loop with a trip count of one is replaced by its
//!   body with the loop variable bound to the lower bound
//! - Block flattening: blocks nested directly inside blocks are spliced
//!   into their parent
//!
//! Shape inference may reintroduce extent-one loops (e.g. for `keepdim`
//! axes) that reduction schedules assume are absent, so schedule stages run
//! both passes on every root before merging.

pub mod blocks;
pub mod fold;
pub mod for_loops;
pub mod subst;

pub use blocks::simplify_blocks;
pub use for_loops::simplify_for_loops;

use crate::Expr;

/// Statistics from a simplification run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplifyStats {
    /// Number of unit loops removed.
    pub loops_removed: usize,
    /// Number of nested blocks spliced into their parent.
    pub blocks_flattened: usize,
}

impl SimplifyStats {
    /// Returns true if any transformation was applied.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.loops_removed > 0 || self.blocks_flattened > 0
    }

    /// Accumulates another run's statistics.
    pub fn merge(&mut self, other: &SimplifyStats) {
        self.loops_removed += other.loops_removed;
        self.blocks_flattened += other.blocks_flattened;
    }
}

/// Run unit loop removal followed by block flattening, in place.
pub fn simplify(expr: &mut Expr) -> SimplifyStats {
    let loops_removed = simplify_for_loops(expr);
    let blocks_flattened = simplify_blocks(expr);
    SimplifyStats {
        loops_removed,
        blocks_flattened,
    }
}
