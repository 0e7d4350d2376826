//! Motion vector reference context: neighbor voting, probabilities and
//! sub-block neighbor lookups.

mod probs;
mod search;
mod sub_block;


use std::ops::Index;

use arrayvec::ArrayVec;
use log::trace;

pub use self::{
    probs::{
        MODE_CONTEXTS,
        MV_REF_COUNT,
        SUB_MV_REF_PROBS,
        SubMvRefContext,
        mv_ref_probs,
        sub_mv_ref_context,
        sub_mv_ref_probs,
    },
    search::{BestRefMvSearch, PixelContext, PixelScoredSearch, PositionalSearch},
    sub_block::SubBlockNeighbors,
};
use crate::data::{
    block::{RefSlot, RefType},
    grid::{MbOffset, ModeInfoGrid, Neighbor},
    motion::{FrameEdges, MotionVector, SignBias},
};

/// Neighbors in discovery order with their vote weights.
const MV_REF_NEIGHBORS: [(Neighbor, u8); 3] = [
    (Neighbor::Above, 2),
    (Neighbor::Left, 2),
    (Neighbor::AboveLeft, 1),
];

/// Where a ranked candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum CandidateSource {
    /// First discovered at this neighbor.
    Neighbor(Neighbor),
    /// The zero vector, weighted by the intra tally.
    ZeroFallback,
}

/// A distinct candidate vector with its accumulated vote weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct CandidateMv {
    /// Sign-bias normalized vector, before clamping.
    pub mv: MotionVector,
    /// Sum of the position weights that voted for `mv`.
    pub weight: u8,
    /// Discovery position, which breaks ties.
    pub source: CandidateSource,
}

/// Vote counts of a macroblock's neighborhood:
/// `[intra, nearest, near, split]`.
///
/// Only neighbor voting produces counts, so each stays within the weight
/// of all three neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MvRefCounts(pub(crate) [u8; 4]);

impl MvRefCounts {
    /// Total weight of the above, left and above-left positions.
    pub const MAX_COUNT: u8 = 5;

    /// The counts as `[intra, nearest, near, split]`.
    #[inline]
    pub const fn get(&self) -> [u8; 4] {
        self.0
    }

    /// Weight of intra neighbors and zero vectors.
    pub const CNT_INTRA: usize = 0;
    /// Weight of the nearest candidate.
    pub const CNT_NEAREST: usize = 1;
    /// Weight of the near candidate.
    pub const CNT_NEAR: usize = 2;
    /// Weight of neighbors coded with `SPLITMV`.
    pub const CNT_SPLITMV: usize = 3;
}

impl Index<usize> for MvRefCounts {
    type Output = u8;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Inputs for deriving the vector prediction context of one macroblock.
#[derive(Debug, Clone, Copy)]
pub struct MvRefContext<'a> {
    /// The macroblock being coded.
    pub mbo: MbOffset,
    /// Co-located macroblock in the previous frame. Reserved for temporal
    /// candidates; neighbor voting does not read it.
    pub colocated: Option<MbOffset>,
    /// Reference frame of the vector being predicted.
    pub ref_frame: RefType,
    /// Predict the second vector of a compound macroblock.
    pub slot: RefSlot,
    /// Sign bias of the current frame's references.
    pub sign_bias: &'a SignBias,
    /// Distances from `mbo` to the frame edges.
    pub edges: FrameEdges,
}

impl<'a> MvRefContext<'a> {
    /// Context for the first reference of the macroblock at `mbo`, with
    /// frame edges derived from the grid dimensions.
    #[inline]
    pub fn new(
        grid: &ModeInfoGrid,
        mbo: MbOffset,
        ref_frame: RefType,
        sign_bias: &'a SignBias,
    ) -> Self {
        Self {
            mbo,
            colocated: None,
            ref_frame,
            slot: RefSlot::First,
            sign_bias,
            edges: FrameEdges::for_macroblock(mbo, grid.cols(), grid.rows()),
        }
    }
}

/// Ranked vector predictors of a macroblock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct NearMvs {
    /// Highest ranked candidate, clamped with margin.
    pub nearest: MotionVector,
    /// Second ranked candidate, clamped with margin.
    pub near: MotionVector,
    /// Seed for vector search, not clamped.
    pub best: MotionVector,
    /// Vote counts that select the mode probabilities.
    pub counts: MvRefCounts,
    /// Every candidate in rank order, zero fallback included.
    pub candidates: ArrayVec<CandidateMv, 4>,
}

/// Collects the above, left and above-left vectors of `ctx.mbo` into ranked
/// predictors.
///
/// Intra neighbors and neighbors whose normalized vector is zero vote for
/// the zero fallback. Border entries do not vote.
#[inline]
pub fn find_near_mvs(grid: &ModeInfoGrid, ctx: &MvRefContext<'_>) -> NearMvs {
    let mut candidates: ArrayVec<CandidateMv, 4> = ArrayVec::new();
    let mut cnt = [0u8; 4];

    for &(neighbor, weight) in MV_REF_NEIGHBORS.iter() {
        let mb = grid.neighbor(ctx.mbo, neighbor);
        if !mb.is_available() {
            continue;
        }
        if mb.mode.is_split() {
            cnt[MvRefCounts::CNT_SPLITMV] += weight;
        }

        let Some((neighbor_ref, mut mv)) = mb.reference_mv(ctx.slot) else {
            cnt[MvRefCounts::CNT_INTRA] += weight;
            continue;
        };
        mv.normalize_sign_bias(ctx.sign_bias[neighbor_ref], ctx.ref_frame, ctx.sign_bias);

        if mv.is_zero() {
            cnt[MvRefCounts::CNT_INTRA] += weight;
        } else if let Some(cand) = candidates.iter_mut().find(|cand| cand.mv == mv) {
            cand.weight += weight;
        } else {
            candidates.push(CandidateMv {
                mv,
                weight,
                source: CandidateSource::Neighbor(neighbor),
            });
        }
    }

    candidates.push(CandidateMv {
        mv: MotionVector::ZERO,
        weight: cnt[MvRefCounts::CNT_INTRA],
        source: CandidateSource::ZeroFallback,
    });
    // stable, so equal weights keep discovery order
    candidates.sort_by(|a, b| b.weight.cmp(&a.weight));

    let vote = |cand: Option<&CandidateMv>| match cand {
        Some(cand) if cand.source != CandidateSource::ZeroFallback => (cand.mv, cand.weight),
        _ => (MotionVector::ZERO, 0),
    };
    let (nearest, nearest_weight) = vote(candidates.first());
    let (near, near_weight) = vote(candidates.get(1));
    cnt[MvRefCounts::CNT_NEAREST] = nearest_weight;
    cnt[MvRefCounts::CNT_NEAR] = near_weight;

    let near_mvs = NearMvs {
        nearest: nearest.clamped_with_margin(&ctx.edges),
        near: near.clamped_with_margin(&ctx.edges),
        best: nearest,
        counts: MvRefCounts(cnt),
        candidates,
    };
    trace!(
        "[MV-Ref] MB ({}, {}) {:?}: nearest={:?} near={:?} best={:?} cnt={:?}",
        ctx.mbo.row,
        ctx.mbo.col,
        ctx.ref_frame,
        near_mvs.nearest,
        near_mvs.near,
        near_mvs.best,
        cnt
    );

    near_mvs
}
