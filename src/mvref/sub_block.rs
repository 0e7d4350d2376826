use crate::data::{
    block::{BPredictionMode, MacroblockInfo, RefSlot, SUB_BLOCKS},
    grid::{MbOffset, ModeInfoGrid, Neighbor},
    motion::MotionVector,
};

/// Left and above lookups for the 4×4 sub-blocks of one macroblock.
///
/// Sub-blocks inside the macroblock are read from `current`, which may be
/// partially filled while the macroblock is being coded; lookups only ever
/// touch sub-blocks that precede the requested one in raster order.
#[derive(Debug, Clone, Copy)]
pub struct SubBlockNeighbors<'a> {
    grid: &'a ModeInfoGrid,
    mbo: MbOffset,
    current: &'a MacroblockInfo,
}

impl<'a> SubBlockNeighbors<'a> {
    /// Lookups for the macroblock at `mbo` whose state so far is `current`.
    #[inline]
    pub const fn new(grid: &'a ModeInfoGrid, mbo: MbOffset, current: &'a MacroblockInfo) -> Self {
        Self { grid, mbo, current }
    }

    /// Vector of the sub-block left of `b`.
    #[inline]
    pub fn left_mv(&self, b: usize, slot: RefSlot) -> MotionVector {
        debug_assert!(b < SUB_BLOCKS);
        if b & 3 != 0 {
            return self.current.block_mv(b - 1, slot);
        }

        // On the left edge, get from the macroblock to the left
        let left = self.grid.neighbor(self.mbo, Neighbor::Left);
        if left.mode.is_split() {
            left.block_mv(b + 3, slot)
        } else {
            left.mb_mv(slot)
        }
    }

    /// Vector of the sub-block above `b`.
    #[inline]
    pub fn above_mv(&self, b: usize, slot: RefSlot) -> MotionVector {
        debug_assert!(b < SUB_BLOCKS);
        if b >> 2 != 0 {
            return self.current.block_mv(b - 4, slot);
        }

        // On the top edge, get from the macroblock above
        let above = self.grid.neighbor(self.mbo, Neighbor::Above);
        if above.mode.is_split() {
            above.block_mv(b + 12, slot)
        } else {
            above.mb_mv(slot)
        }
    }

    /// Intra mode of the sub-block left of `b`.
    #[inline]
    pub fn left_mode(&self, b: usize) -> BPredictionMode {
        debug_assert!(b < SUB_BLOCKS);
        if b & 3 != 0 {
            return self.current.blocks[b - 1].modes[0];
        }

        let left = self.grid.neighbor(self.mbo, Neighbor::Left);
        left.mode
            .edge_sub_block_mode()
            .unwrap_or(left.blocks[b + 3].modes[0])
    }

    /// Intra mode of the sub-block above `b`.
    #[inline]
    pub fn above_mode(&self, b: usize) -> BPredictionMode {
        debug_assert!(b < SUB_BLOCKS);
        if b >> 2 != 0 {
            return self.current.blocks[b - 4].modes[0];
        }

        let above = self.grid.neighbor(self.mbo, Neighbor::Above);
        above
            .mode
            .edge_sub_block_mode()
            .unwrap_or(above.blocks[b + 12].modes[0])
    }
}
