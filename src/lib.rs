//! Motion vector and intra mode prediction context for VP8 style
//! macroblock grids.
//!
//! For every macroblock the already coded above, left and above-left
//! neighbors are reduced to ranked vector predictors (`nearest`, `near`,
//! `best`), vote counts selecting the inter mode probabilities, and the
//! per sub-block vector and intra mode context used by split and
//! sub-block predicted macroblocks.

mod analyze;
mod data;
mod mvref;

pub use v_frame::{self, pixel::Pixel, plane::Plane};

pub use crate::{
    analyze::{FrameAnalysis, MacroblockAnalysis, MvPredictor, MvRefPrediction, analyze_grid},
    data::{
        block::{
            BPredictionMode,
            BlockInfo,
            MBSPLIT_OFFSET,
            MacroblockInfo,
            PredictionMode,
            REF_FRAMES,
            RefSlot,
            RefType,
            SUB_BLOCKS,
            SplitMvPartitioning,
        },
        grid::{GridError, MbOffset, ModeInfoGrid, Neighbor},
        motion::{FrameEdges, MV_BORDER_MARGIN, MotionVector, SignBias},
    },
    mvref::{
        BestRefMvSearch,
        CandidateMv,
        CandidateSource,
        MODE_CONTEXTS,
        MV_REF_COUNT,
        MvRefContext,
        MvRefCounts,
        NearMvs,
        PixelContext,
        PixelScoredSearch,
        PositionalSearch,
        SUB_MV_REF_PROBS,
        SubBlockNeighbors,
        SubMvRefContext,
        find_near_mvs,
        mv_ref_probs,
        sub_mv_ref_context,
        sub_mv_ref_probs,
    },
};

/// Options determining how prediction context is derived.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionOptions {
    /// How the `best` reference vector is chosen.
    pub ref_mv_search: RefMvSearch,
}

/// Strategy for choosing the `best` reference vector of a macroblock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "binary", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RefMvSearch {
    /// `best` is the highest voted neighbor vector.
    #[default]
    Positional,
    /// `best` is the candidate whose displaced reference pixels best match
    /// the reconstructed edge of the macroblock. Needs pixel planes;
    /// behaves as `Positional` without them.
    PixelScored,
}
