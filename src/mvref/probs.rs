use crate::{data::motion::MotionVector, mvref::MvRefCounts};

/// Number of macroblock inter modes: `ZEROMV`, `NEARESTMV`, `NEARMV`,
/// `NEWMV` and `SPLITMV`.
pub const MV_REF_COUNT: usize = 5;

/// Mode probabilities indexed by `[count][tree node]`.
pub const MODE_CONTEXTS: [[u8; MV_REF_COUNT - 1]; MvRefCounts::MAX_COUNT as usize + 1] = [
    [7, 1, 1, 143],
    [14, 18, 14, 107],
    [135, 64, 57, 68],
    [60, 56, 128, 65],
    [159, 134, 128, 34],
    [234, 188, 128, 28],
];

/// Probabilities of the inter mode tree given the neighborhood votes.
///
/// Each tree node takes its probability from the row selected by the
/// matching count, so stronger agreement makes that branch cheaper.
#[inline]
pub fn mv_ref_probs(counts: &MvRefCounts) -> [u8; MV_REF_COUNT - 1] {
    let mut probs = [0; MV_REF_COUNT - 1];
    for (i, p) in probs.iter_mut().enumerate() {
        let count = usize::from(counts[i]);
        *p = MODE_CONTEXTS[count][i];
    }
    probs
}

/// Relationship between the left and above vectors of a split sub-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[expect(non_camel_case_types)]
pub enum SubMvRefContext {
    /// Distinct, both nonzero.
    SUBMVREF_NORMAL = 0,
    /// Left is zero, above is not.
    SUBMVREF_LEFT_ZED = 1,
    /// Above is zero, left is not.
    SUBMVREF_ABOVE_ZED = 2,
    /// Equal and nonzero.
    SUBMVREF_LEFT_ABOVE_SAME = 3,
    /// Both zero.
    SUBMVREF_LEFT_ABOVE_ZED = 4,
}

/// Sub-block mode probabilities (`LEFT4X4`, `ABOVE4X4`, `ZERO4X4`/`NEW4X4`
/// tree) indexed by [`SubMvRefContext`].
pub const SUB_MV_REF_PROBS: [[u8; 3]; 5] = [
    [147, 136, 18],
    [106, 145, 1],
    [179, 121, 1],
    [223, 1, 34],
    [208, 1, 1],
];

/// Classifies the left and above vectors of a split sub-block.
#[inline]
pub fn sub_mv_ref_context(left: MotionVector, above: MotionVector) -> SubMvRefContext {
    let lez = left.is_zero();
    let aez = above.is_zero();
    let lea = left == above;

    if lea && lez {
        SubMvRefContext::SUBMVREF_LEFT_ABOVE_ZED
    } else if lea {
        SubMvRefContext::SUBMVREF_LEFT_ABOVE_SAME
    } else if aez {
        SubMvRefContext::SUBMVREF_ABOVE_ZED
    } else if lez {
        SubMvRefContext::SUBMVREF_LEFT_ZED
    } else {
        SubMvRefContext::SUBMVREF_NORMAL
    }
}

/// Sub-block mode probabilities for `ctx`.
#[inline]
pub fn sub_mv_ref_probs(ctx: SubMvRefContext) -> [u8; 3] {
    SUB_MV_REF_PROBS[ctx as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probs_follow_each_count() {
        let probs = mv_ref_probs(&MvRefCounts([2, 2, 0, 0]));
        assert_eq!(probs, [135, 64, 1, 143]);

        let probs = mv_ref_probs(&MvRefCounts([0, 5, 0, 5]));
        assert_eq!(probs, [7, 188, 1, 28]);
    }

    #[test]
    fn probs_are_deterministic() {
        let counts = MvRefCounts([1, 3, 1, 2]);
        assert_eq!(mv_ref_probs(&counts), mv_ref_probs(&counts));
        assert_eq!(mv_ref_probs(&counts), [14, 56, 14, 68]);
    }

    #[test]
    fn higher_consensus_favors_zero_branch() {
        let weak = mv_ref_probs(&MvRefCounts([0, 0, 0, 0]))[0];
        let strong = mv_ref_probs(&MvRefCounts([5, 0, 0, 0]))[0];
        assert!(strong > weak);
    }

    #[test]
    fn sub_mv_contexts() {
        let zero = MotionVector::ZERO;
        let a = MotionVector::new(4, 8);
        let b = MotionVector::new(-4, 8);
        assert_eq!(sub_mv_ref_context(zero, zero), SubMvRefContext::SUBMVREF_LEFT_ABOVE_ZED);
        assert_eq!(sub_mv_ref_context(a, a), SubMvRefContext::SUBMVREF_LEFT_ABOVE_SAME);
        assert_eq!(sub_mv_ref_context(a, zero), SubMvRefContext::SUBMVREF_ABOVE_ZED);
        assert_eq!(sub_mv_ref_context(zero, b), SubMvRefContext::SUBMVREF_LEFT_ZED);
        assert_eq!(sub_mv_ref_context(a, b), SubMvRefContext::SUBMVREF_NORMAL);
        assert_eq!(sub_mv_ref_probs(SubMvRefContext::SUBMVREF_LEFT_ABOVE_SAME), [223, 1, 34]);
    }
}
