use std::ops::{self, Index, IndexMut};

use crate::data::{
    block::{REF_FRAMES, RefType},
    grid::MbOffset,
};

/// Distance a predictor may point past the visible frame, one macroblock
/// in eighth-pel units.
pub const MV_BORDER_MARGIN: i32 = 16 << 3;

/// Width and height of a macroblock in eighth-pel units.
const MB_SIZE_EIGHTH_PEL: i32 = 16 << 3;

/// A motion vector in eighth-pel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionVector {
    /// Vertical displacement.
    pub row: i16,
    /// Horizontal displacement.
    pub col: i16,
}

impl MotionVector {
    /// The zero displacement.
    pub const ZERO: MotionVector = MotionVector { row: 0, col: 0 };

    /// Creates a vector from its row and column components.
    #[inline]
    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    /// Whether both components are zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.row == 0 && self.col == 0
    }

    /// Saturates each component into its bound independently.
    ///
    /// Bounds are inclusive: afterwards `left <= col <= right` and
    /// `top <= row <= bottom`.
    #[inline]
    pub fn clamp(&mut self, left: i32, right: i32, top: i32, bottom: i32) {
        debug_assert!(left <= right && top <= bottom);
        self.col = saturate_component(self.col, left, right);
        self.row = saturate_component(self.row, top, bottom);
    }

    /// Clamps to the frame edges widened by [`MV_BORDER_MARGIN`] on every
    /// side.
    #[inline]
    pub fn clamp_with_margin(&mut self, edges: &FrameEdges) {
        let bounds = edges.with_margin(MV_BORDER_MARGIN);
        self.clamp(
            bounds.to_left,
            bounds.to_right,
            bounds.to_top,
            bounds.to_bottom,
        );
    }

    /// Returns a copy clamped with [`MotionVector::clamp_with_margin`].
    #[inline]
    #[must_use]
    pub fn clamped_with_margin(mut self, edges: &FrameEdges) -> Self {
        self.clamp_with_margin(edges);
        self
    }

    /// Whether the vector lies outside the inclusive box.
    ///
    /// This is `false` exactly when [`MotionVector::clamp`] with the same
    /// bounds would leave the vector untouched.
    #[inline]
    pub fn is_out_of_bounds(self, left: i32, right: i32, top: i32, bottom: i32) -> bool {
        let (row, col) = (i32::from(self.row), i32::from(self.col));
        col < left || col > right || row < top || row > bottom
    }

    /// Mirrors the vector when the frame it was measured against has a
    /// different sign bias than `ref_frame`.
    ///
    /// Applying this twice with the same arguments restores the vector.
    #[inline]
    pub fn normalize_sign_bias(
        &mut self,
        neighbor_bias: bool,
        ref_frame: RefType,
        sign_bias: &SignBias,
    ) {
        if neighbor_bias != sign_bias[ref_frame] {
            *self = -*self;
        }
    }

    /// Integer pel displacement, rounding eighth-pel positions to the
    /// nearest full pel with ties toward zero.
    #[inline]
    pub const fn to_fullpel(self) -> (isize, isize) {
        const fn round(v: i16) -> isize {
            let v = v as isize;
            if v > 0 { (v + 3) >> 3 } else { (v + 4) >> 3 }
        }

        (round(self.row), round(self.col))
    }
}

fn saturate_component(v: i16, low: i32, high: i32) -> i16 {
    let v = i32::from(v).max(low).min(high);
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl ops::Neg for MotionVector {
    type Output = MotionVector;

    #[inline]
    fn neg(self) -> MotionVector {
        MotionVector {
            row: self.row.wrapping_neg(),
            col: self.col.wrapping_neg(),
        }
    }
}

/// Signed distances from a macroblock to the visible frame boundaries, in
/// eighth-pel units.
///
/// `to_left` and `to_top` are zero or negative, `to_right` and `to_bottom`
/// zero or positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameEdges {
    /// Distance to the left edge.
    pub to_left: i32,
    /// Distance to the right edge.
    pub to_right: i32,
    /// Distance to the top edge.
    pub to_top: i32,
    /// Distance to the bottom edge.
    pub to_bottom: i32,
}

impl FrameEdges {
    /// Edges of the macroblock at `mbo` in a frame `mb_cols` by `mb_rows`
    /// macroblocks large.
    #[inline]
    pub fn for_macroblock(mbo: MbOffset, mb_cols: usize, mb_rows: usize) -> Self {
        debug_assert!(mbo.col < mb_cols && mbo.row < mb_rows);
        let dist = |n: usize| n as i32 * MB_SIZE_EIGHTH_PEL;

        Self {
            to_left: -dist(mbo.col),
            to_right: dist(mb_cols - 1 - mbo.col),
            to_top: -dist(mbo.row),
            to_bottom: dist(mb_rows - 1 - mbo.row),
        }
    }

    /// The edges pushed outward by `margin` in all four directions.
    #[inline]
    #[must_use]
    pub const fn with_margin(self, margin: i32) -> Self {
        Self {
            to_left: self.to_left - margin,
            to_right: self.to_right + margin,
            to_top: self.to_top - margin,
            to_bottom: self.to_bottom + margin,
        }
    }
}

/// Per-frame sign bias of every reference frame.
///
/// Set from the frame header before any macroblock is processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SignBias([bool; REF_FRAMES]);

impl SignBias {
    /// Intra and last frames never carry a bias; golden and altref take
    /// theirs from the frame header.
    #[inline]
    pub const fn new(golden: bool, altref: bool) -> Self {
        Self([false, false, golden, altref])
    }
}

impl Index<RefType> for SignBias {
    type Output = bool;

    #[inline]
    fn index(&self, index: RefType) -> &Self::Output {
        &self.0[index.to_index()]
    }
}

impl IndexMut<RefType> for SignBias {
    #[inline]
    fn index_mut(&mut self, index: RefType) -> &mut Self::Output {
        &mut self.0[index.to_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOXES: [(i32, i32, i32, i32); 4] = [
        (-64, 64, -32, 32),
        (0, 0, 0, 0),
        (-200, -100, 100, 300),
        (-1000, 1000, -1000, 1000),
    ];

    fn sample_mvs() -> impl Iterator<Item = MotionVector> {
        (-300..=300)
            .step_by(37)
            .flat_map(|row| (-300..=300).step_by(41).map(move |col| MotionVector::new(row, col)))
    }

    #[test]
    fn clamp_lands_inside_box() {
        for (l, r, t, b) in BOXES {
            for mv in sample_mvs() {
                let mut c = mv;
                c.clamp(l, r, t, b);
                assert!((l..=r).contains(&i32::from(c.col)), "{mv:?} -> {c:?}");
                assert!((t..=b).contains(&i32::from(c.row)), "{mv:?} -> {c:?}");
            }
        }
    }

    #[test]
    fn clamp_is_idempotent() {
        for (l, r, t, b) in BOXES {
            for mv in sample_mvs() {
                let mut once = mv;
                once.clamp(l, r, t, b);
                let mut twice = once;
                twice.clamp(l, r, t, b);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn bounds_check_matches_clamp() {
        for (l, r, t, b) in BOXES {
            for mv in sample_mvs() {
                let mut c = mv;
                c.clamp(l, r, t, b);
                assert_eq!(mv.is_out_of_bounds(l, r, t, b), c != mv, "{mv:?}");
            }
        }
    }

    #[test]
    fn clamp_axes_are_independent() {
        let mut mv = MotionVector::new(10, 500);
        mv.clamp(-100, 100, -100, 100);
        assert_eq!(mv, MotionVector::new(10, 100));
    }

    #[test]
    fn margin_widens_every_edge() {
        let edges = FrameEdges {
            to_left: -16,
            to_right: 80,
            to_top: 0,
            to_bottom: 40,
        };
        let mut far = MotionVector::new(-1000, 1000);
        far.clamp_with_margin(&edges);
        assert_eq!(far, MotionVector::new(-128, 80 + MV_BORDER_MARGIN as i16));

        let mut near = MotionVector::new(100, -100);
        near.clamp_with_margin(&edges);
        assert_eq!(near, MotionVector::new(100, -100));
    }

    #[test]
    fn edges_follow_macroblock_position() {
        let edges = FrameEdges::for_macroblock(MbOffset { row: 1, col: 2 }, 4, 3);
        assert_eq!(edges, FrameEdges {
            to_left: -256,
            to_right: 128,
            to_top: -128,
            to_bottom: 128,
        });

        let corner = FrameEdges::for_macroblock(MbOffset { row: 0, col: 0 }, 1, 1);
        assert_eq!(corner, FrameEdges::default());
    }

    #[test]
    fn sign_mismatch_mirrors_vector() {
        let bias = SignBias::new(false, true);
        let mut mv = MotionVector::new(10, -6);
        // neighbor measured against altref (biased), current uses last
        mv.normalize_sign_bias(bias[RefType::ALTREF_FRAME], RefType::LAST_FRAME, &bias);
        assert_eq!(mv, MotionVector::new(-10, 6));
    }

    #[test]
    fn sign_match_keeps_vector() {
        let bias = SignBias::new(true, true);
        let mut mv = MotionVector::new(10, -6);
        mv.normalize_sign_bias(bias[RefType::GOLDEN_FRAME], RefType::ALTREF_FRAME, &bias);
        assert_eq!(mv, MotionVector::new(10, -6));
    }

    #[test]
    fn normalize_is_involution() {
        let bias = SignBias::new(true, false);
        for mv in sample_mvs() {
            let mut v = mv;
            v.normalize_sign_bias(false, RefType::GOLDEN_FRAME, &bias);
            v.normalize_sign_bias(false, RefType::GOLDEN_FRAME, &bias);
            assert_eq!(v, mv);
        }
    }

    #[test]
    fn fullpel_rounds_half_toward_zero() {
        assert_eq!(MotionVector::new(4, -4).to_fullpel(), (0, 0));
        assert_eq!(MotionVector::new(5, -5).to_fullpel(), (1, -1));
        assert_eq!(MotionVector::new(16, -17).to_fullpel(), (2, -2));
        assert_eq!(MotionVector::new(-12, 12).to_fullpel(), (-1, 1));
    }
}
