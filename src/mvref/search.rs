use arrayvec::ArrayVec;
use log::trace;
use v_frame::{
    pixel::Pixel,
    plane::{Plane, PlaneOffset},
};

use crate::{
    data::{grid::ModeInfoGrid, motion::MotionVector, sad::get_sad},
    mvref::{MvRefContext, NearMvs, find_near_mvs},
};

const MB_SIZE: usize = 16;
/// Rows above and columns left of the macroblock that are compared.
const EDGE_STRIP: usize = 2;

/// Pixels available to a best reference vector search.
#[derive(Debug, Clone, Copy)]
pub struct PixelContext<'a, T: Pixel> {
    /// Reconstruction of the current frame, complete up to the macroblock
    /// being coded.
    pub recon: &'a Plane<T>,
    /// Luma plane of the reference frame. Needs at least 32 pixels of
    /// padding on every side.
    pub reference: &'a Plane<T>,
}

/// Strategy that derives the ranked predictors of a macroblock.
pub trait BestRefMvSearch<T: Pixel> {
    /// Predictors for `ctx.mbo`. Strategies that score pixels fall back to
    /// neighbor voting when `pixels` is `None`.
    fn search(
        &self,
        grid: &ModeInfoGrid,
        ctx: &MvRefContext<'_>,
        pixels: Option<&PixelContext<'_, T>>,
    ) -> NearMvs;
}

/// Ranks candidates by neighbor votes alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalSearch;

impl<T: Pixel> BestRefMvSearch<T> for PositionalSearch {
    #[inline]
    fn search(
        &self,
        grid: &ModeInfoGrid,
        ctx: &MvRefContext<'_>,
        _pixels: Option<&PixelContext<'_, T>>,
    ) -> NearMvs {
        find_near_mvs(grid, ctx)
    }
}

/// Picks `best` as the candidate whose displaced reference pixels best
/// match the reconstructed strip above and left of the macroblock.
///
/// `nearest`, `near` and the vote counts are those of neighbor voting, so
/// mode probabilities do not depend on the strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelScoredSearch;

impl PixelScoredSearch {
    fn edge_sad<T: Pixel>(
        ctx: &MvRefContext<'_>,
        pixels: &PixelContext<'_, T>,
        mv: MotionVector,
    ) -> u32 {
        let x = (ctx.mbo.col * MB_SIZE) as isize;
        let y = (ctx.mbo.row * MB_SIZE) as isize;
        let (dy, dx) = mv.to_fullpel();
        let strip = EDGE_STRIP as isize;
        let mut sad = 0;

        if ctx.mbo.row > 0 {
            let org = pixels.recon.slice(PlaneOffset { x, y: y - strip });
            let rf = pixels.reference.slice(PlaneOffset {
                x: x + dx,
                y: y + dy - strip,
            });
            sad += get_sad(&org, &rf, MB_SIZE, EDGE_STRIP);
        }
        if ctx.mbo.col > 0 {
            let org = pixels.recon.slice(PlaneOffset { x: x - strip, y });
            let rf = pixels.reference.slice(PlaneOffset {
                x: x + dx - strip,
                y: y + dy,
            });
            sad += get_sad(&org, &rf, EDGE_STRIP, MB_SIZE);
        }
        sad
    }
}

impl<T: Pixel> BestRefMvSearch<T> for PixelScoredSearch {
    #[inline]
    fn search(
        &self,
        grid: &ModeInfoGrid,
        ctx: &MvRefContext<'_>,
        pixels: Option<&PixelContext<'_, T>>,
    ) -> NearMvs {
        let mut near_mvs = find_near_mvs(grid, ctx);
        let Some(pixels) = pixels else {
            return near_mvs;
        };
        if ctx.mbo.row == 0 && ctx.mbo.col == 0 {
            return near_mvs;
        }

        let mut scored: ArrayVec<(MotionVector, u32), 4> = ArrayVec::new();
        for mv in near_mvs.candidates.iter().map(|cand| cand.mv) {
            let mv = mv.clamped_with_margin(&ctx.edges);
            if scored.iter().any(|&(seen, _)| seen == mv) {
                continue;
            }
            scored.push((mv, Self::edge_sad(ctx, pixels, mv)));
        }
        // first lowest score wins, so ties keep rank order
        if let Some(&(best, sad)) = scored.iter().min_by_key(|&&(_, sad)| sad) {
            trace!(
                "[MV-Ref] MB ({}, {}) pixel search: best={:?} sad={} of {} candidates",
                ctx.mbo.row,
                ctx.mbo.col,
                best,
                sad,
                scored.len()
            );
            near_mvs.best = best;
        }

        near_mvs
    }
}
