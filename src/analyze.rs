use log::debug;
use v_frame::pixel::Pixel;

use crate::{
    PredictionOptions,
    RefMvSearch,
    data::{
        block::{BPredictionMode, PredictionMode, RefSlot, RefType, SUB_BLOCKS},
        grid::{MbOffset, ModeInfoGrid},
        motion::SignBias,
    },
    mvref::{
        BestRefMvSearch,
        MV_REF_COUNT,
        MvRefContext,
        NearMvs,
        PixelContext,
        PixelScoredSearch,
        PositionalSearch,
        SubBlockNeighbors,
        SubMvRefContext,
        mv_ref_probs,
        sub_mv_ref_context,
    },
};

/// Prediction context of one inter reference of a macroblock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MvRefPrediction {
    /// Reference frame the predictors were normalized for.
    pub ref_frame: RefType,
    /// Ranked predictors and vote counts.
    pub near_mvs: NearMvs,
    /// Inter mode tree probabilities selected by the vote counts.
    pub mode_probs: [u8; MV_REF_COUNT - 1],
}

/// Everything the entropy model needs from the neighborhood of one
/// macroblock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct MacroblockAnalysis {
    /// Position in the frame.
    pub mbo: MbOffset,
    /// Coded mode of the macroblock.
    pub mode: PredictionMode,
    /// Context of the primary reference, for inter macroblocks.
    pub first: Option<MvRefPrediction>,
    /// Context of the second reference, for compound macroblocks.
    pub second: Option<MvRefPrediction>,
    /// Left/above vector context of every sub-block, for `SPLITMV`.
    pub sub_mv_contexts: Option<[SubMvRefContext; SUB_BLOCKS]>,
    /// `(above, left)` intra modes of every sub-block, for sub-block
    /// predicted intra macroblocks.
    pub sub_block_mode_contexts: Option<[(BPredictionMode, BPredictionMode); SUB_BLOCKS]>,
}

/// Per-macroblock analysis of a frame, in raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct FrameAnalysis {
    /// Width in macroblocks.
    pub cols: usize,
    /// Height in macroblocks.
    pub rows: usize,
    /// One entry per macroblock.
    pub macroblocks: Vec<MacroblockAnalysis>,
}

/// Derives motion vector and intra mode prediction context for the
/// macroblocks of a frame.
///
/// The best reference vector strategy is chosen once, from the options.
pub struct MvPredictor<T: Pixel> {
    options: PredictionOptions,
    search: Box<dyn BestRefMvSearch<T>>,
}

impl<T: Pixel> MvPredictor<T> {
    /// Creates a predictor using the strategy named in `options`.
    #[inline]
    pub fn new(options: PredictionOptions) -> Self {
        let search: Box<dyn BestRefMvSearch<T>> = match options.ref_mv_search {
            RefMvSearch::Positional => Box::new(PositionalSearch),
            RefMvSearch::PixelScored => Box::new(PixelScoredSearch),
        };

        Self { options, search }
    }

    /// The options this predictor was created with.
    #[inline]
    pub const fn options(&self) -> &PredictionOptions {
        &self.options
    }

    /// Ranked predictors for one macroblock reference.
    ///
    /// Every macroblock above and left of `ctx.mbo` must already hold its
    /// final mode info.
    #[inline]
    pub fn near_mvs(
        &self,
        grid: &ModeInfoGrid,
        ctx: &MvRefContext<'_>,
        pixels: Option<&PixelContext<'_, T>>,
    ) -> NearMvs {
        self.search.search(grid, ctx, pixels)
    }

    /// Predictors and inter mode probabilities for one macroblock reference.
    #[inline]
    pub fn predict(
        &self,
        grid: &ModeInfoGrid,
        ctx: &MvRefContext<'_>,
        pixels: Option<&PixelContext<'_, T>>,
    ) -> MvRefPrediction {
        let near_mvs = self.near_mvs(grid, ctx, pixels);
        MvRefPrediction {
            ref_frame: ctx.ref_frame,
            mode_probs: mv_ref_probs(&near_mvs.counts),
            near_mvs,
        }
    }

    /// Walks a fully coded grid in raster order and reports the context
    /// every macroblock was coded with.
    #[inline]
    pub fn analyze_frame(
        &self,
        grid: &ModeInfoGrid,
        sign_bias: &SignBias,
        pixels: Option<&PixelContext<'_, T>>,
    ) -> FrameAnalysis {
        let mut macroblocks = Vec::with_capacity(grid.cols() * grid.rows());
        let (mut inter, mut split, mut compound) = (0usize, 0usize, 0usize);

        for (mbo, mb) in grid.iter() {
            let (first, second) = if mb.mode.is_inter() {
                inter += 1;
                let mut ctx = MvRefContext::new(grid, mbo, mb.ref_frame, sign_bias);
                let first = self.predict(grid, &ctx, pixels);
                let second = mb.second_ref_frame.map(|second_ref| {
                    compound += 1;
                    ctx.ref_frame = second_ref;
                    ctx.slot = RefSlot::Second;
                    self.predict(grid, &ctx, pixels)
                });
                (Some(first), second)
            } else {
                (None, None)
            };

            let neighbors = SubBlockNeighbors::new(grid, mbo, mb);
            let sub_mv_contexts = mb.mode.is_split().then(|| {
                split += 1;
                split_contexts(&neighbors)
            });
            let sub_block_mode_contexts = mb
                .mode
                .has_sub_block_modes()
                .then(|| mode_contexts(&neighbors));

            macroblocks.push(MacroblockAnalysis {
                mbo,
                mode: mb.mode,
                first,
                second,
                sub_mv_contexts,
                sub_block_mode_contexts,
            });
        }

        debug!(
            "[MV-Ref] Frame {}x{}: {} inter MBs ({} compound, {} split), search={:?}",
            grid.cols(),
            grid.rows(),
            inter,
            compound,
            split,
            self.options.ref_mv_search
        );

        FrameAnalysis {
            cols: grid.cols(),
            rows: grid.rows(),
            macroblocks,
        }
    }
}

fn split_contexts(neighbors: &SubBlockNeighbors<'_>) -> [SubMvRefContext; SUB_BLOCKS] {
    std::array::from_fn(|b| {
        sub_mv_ref_context(
            neighbors.left_mv(b, RefSlot::First),
            neighbors.above_mv(b, RefSlot::First),
        )
    })
}

fn mode_contexts(neighbors: &SubBlockNeighbors<'_>) -> [(BPredictionMode, BPredictionMode); SUB_BLOCKS] {
    std::array::from_fn(|b| (neighbors.above_mode(b), neighbors.left_mode(b)))
}

/// Convenience for one-off analysis of a grid with the default options.
#[inline]
pub fn analyze_grid(grid: &ModeInfoGrid, sign_bias: &SignBias) -> FrameAnalysis {
    MvPredictor::<u8>::new(PredictionOptions::default()).analyze_frame(grid, sign_bias, None)
}
