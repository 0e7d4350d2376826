use std::ops::{Index, IndexMut};

use thiserror::Error;

use crate::data::block::MacroblockInfo;

/// Offset of a macroblock inside the visible frame, in macroblocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MbOffset {
    /// Macroblock row.
    pub row: usize,
    /// Macroblock column.
    pub col: usize,
}

/// Already-decoded spatial neighbors consulted for prediction context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Neighbor {
    /// The macroblock directly above.
    Above,
    /// The macroblock directly to the left.
    Left,
    /// The macroblock diagonally above and to the left.
    AboveLeft,
}

/// Errors from building a [`ModeInfoGrid`] out of raster data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// The grid has no visible macroblocks.
    #[error("grid must be at least one macroblock wide and tall, got {cols}x{rows}")]
    Empty {
        /// Requested width.
        cols: usize,
        /// Requested height.
        rows: usize,
    },
    /// The number of macroblocks does not match the dimensions.
    #[error("expected {expected} macroblocks for a {cols}x{rows} grid, got {actual}")]
    SizeMismatch {
        /// Requested width.
        cols: usize,
        /// Requested height.
        rows: usize,
        /// `cols * rows`.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
}

/// Mode info of every macroblock in a frame.
///
/// Stored in one row-major buffer with a border row above and a border
/// column to the left of the visible area, so that the above, left and
/// above-left neighbors of every visible macroblock are addressable.
/// Border entries never provide a usable candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeInfoGrid {
    entries: Box<[MacroblockInfo]>,
    cols: usize,
    rows: usize,
    stride: usize,
}

impl ModeInfoGrid {
    /// Allocates a grid of intra `DC_PRED` macroblocks.
    ///
    /// # Panics
    ///
    /// - If either dimension is zero
    #[inline]
    pub fn new(cols: usize, rows: usize) -> Self {
        assert!(cols > 0 && rows > 0, "empty macroblock grid");
        let stride = cols + 1;
        // dynamic allocation: once per frame
        let mut entries = vec![MacroblockInfo::default(); stride * (rows + 1)].into_boxed_slice();
        for border in entries[..stride].iter_mut() {
            *border = MacroblockInfo::border();
        }
        for row in entries.chunks_exact_mut(stride).skip(1) {
            row[0] = MacroblockInfo::border();
        }

        Self {
            entries,
            cols,
            rows,
            stride,
        }
    }

    /// Builds a grid from macroblocks in raster order.
    ///
    /// # Errors
    ///
    /// - Returns `GridError::Empty` if either dimension is zero.
    /// - Returns `GridError::SizeMismatch` if `mbs` does not hold exactly
    ///   `cols * rows` entries.
    #[inline]
    pub fn from_raster(
        cols: usize,
        rows: usize,
        mbs: Vec<MacroblockInfo>,
    ) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::Empty { cols, rows });
        }
        if mbs.len() != cols * rows {
            return Err(GridError::SizeMismatch {
                cols,
                rows,
                expected: cols * rows,
                actual: mbs.len(),
            });
        }

        let mut grid = Self::new(cols, rows);
        for (i, mb) in mbs.into_iter().enumerate() {
            grid.set(
                MbOffset {
                    row: i / cols,
                    col: i % cols,
                },
                mb,
            );
        }
        Ok(grid)
    }

    /// Width in macroblocks.
    #[inline]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Height in macroblocks.
    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Distance between vertically adjacent entries, border included.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn index_of(&self, mbo: MbOffset) -> usize {
        debug_assert!(mbo.row < self.rows && mbo.col < self.cols);
        (mbo.row + 1) * self.stride + mbo.col + 1
    }

    /// Stores the final mode info of the macroblock at `mbo`.
    #[inline]
    pub fn set(&mut self, mbo: MbOffset, mut info: MacroblockInfo) {
        info.available = true;
        let idx = self.index_of(mbo);
        self.entries[idx] = info;
    }

    /// The given neighbor of `mbo`, which is a border entry when `mbo` sits
    /// on the corresponding frame edge.
    #[inline]
    pub fn neighbor(&self, mbo: MbOffset, neighbor: Neighbor) -> &MacroblockInfo {
        let idx = self.index_of(mbo);
        &self.entries[match neighbor {
            Neighbor::Above => idx - self.stride,
            Neighbor::Left => idx - 1,
            Neighbor::AboveLeft => idx - self.stride - 1,
        }]
    }

    /// Visible macroblocks in raster order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (MbOffset, &MacroblockInfo)> + '_ {
        self.entries
            .chunks_exact(self.stride)
            .skip(1)
            .enumerate()
            .flat_map(|(row, entries)| {
                entries[1..]
                    .iter()
                    .enumerate()
                    .map(move |(col, mb)| (MbOffset { row, col }, mb))
            })
    }
}

impl Index<MbOffset> for ModeInfoGrid {
    type Output = MacroblockInfo;

    #[inline]
    fn index(&self, mbo: MbOffset) -> &Self::Output {
        &self.entries[self.index_of(mbo)]
    }
}

impl IndexMut<MbOffset> for ModeInfoGrid {
    #[inline]
    fn index_mut(&mut self, mbo: MbOffset) -> &mut Self::Output {
        let idx = self.index_of(mbo);
        &mut self.entries[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        block::{PredictionMode, RefType},
        motion::MotionVector,
    };

    fn numbered_grid(cols: usize, rows: usize) -> ModeInfoGrid {
        let mbs = (0..cols * rows)
            .map(|i| {
                MacroblockInfo::inter(
                    PredictionMode::NEWMV,
                    RefType::LAST_FRAME,
                    MotionVector::new(i as i16, 0),
                )
            })
            .collect();
        ModeInfoGrid::from_raster(cols, rows, mbs).unwrap()
    }

    #[test]
    fn neighbors_resolve_inside_frame() {
        let grid = numbered_grid(3, 2);
        let mbo = MbOffset { row: 1, col: 2 };
        assert_eq!(grid.neighbor(mbo, Neighbor::Above).mvs[0].row, 2);
        assert_eq!(grid.neighbor(mbo, Neighbor::Left).mvs[0].row, 4);
        assert_eq!(grid.neighbor(mbo, Neighbor::AboveLeft).mvs[0].row, 1);
        assert!(grid.neighbor(mbo, Neighbor::AboveLeft).is_available());
    }

    #[test]
    fn frame_edges_hit_border_entries() {
        let grid = numbered_grid(3, 2);
        let origin = MbOffset::default();
        for n in [Neighbor::Above, Neighbor::Left, Neighbor::AboveLeft] {
            assert!(!grid.neighbor(origin, n).is_available(), "{n:?}");
        }
        let left_col = MbOffset { row: 1, col: 0 };
        assert!(grid.neighbor(left_col, Neighbor::Above).is_available());
        assert!(!grid.neighbor(left_col, Neighbor::Left).is_available());
        assert!(!grid.neighbor(left_col, Neighbor::AboveLeft).is_available());
    }

    #[test]
    fn iter_is_raster_order() {
        let grid = numbered_grid(3, 2);
        let rows: Vec<_> = grid.iter().map(|(mbo, mb)| (mbo, mb.mvs[0].row)).collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[4], (MbOffset { row: 1, col: 1 }, 4));
        assert!(rows.iter().enumerate().all(|(i, &(_, n))| n == i as i16));
    }

    #[test]
    fn from_raster_rejects_bad_sizes() {
        assert_eq!(
            ModeInfoGrid::from_raster(2, 2, vec![MacroblockInfo::default(); 3]),
            Err(GridError::SizeMismatch {
                cols: 2,
                rows: 2,
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            ModeInfoGrid::from_raster(0, 2, Vec::new()),
            Err(GridError::Empty { cols: 0, rows: 2 })
        );
    }

    #[test]
    fn set_marks_entry_available() {
        let mut grid = ModeInfoGrid::new(1, 1);
        let mut border = grid.neighbor(MbOffset::default(), Neighbor::Above).clone();
        border.mode = PredictionMode::V_PRED;
        grid.set(MbOffset::default(), border);
        assert!(grid[MbOffset::default()].is_available());
        assert_eq!(grid[MbOffset::default()].mode, PredictionMode::V_PRED);
    }
}
