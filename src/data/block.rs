use crate::data::motion::MotionVector;

/// Number of sub-blocks in a macroblock, a 4×4 raster.
pub const SUB_BLOCKS: usize = 16;
/// Number of [`RefType`] values, intra included.
pub const REF_FRAMES: usize = 4;
/// Number of [`PredictionMode`] values.
pub const MB_MODE_COUNT: usize = 11;

/// Reference frame a macroblock predicts from.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[expect(non_camel_case_types)]
pub enum RefType {
    /// No reference; the macroblock is intra coded.
    #[default]
    INTRA_FRAME = 0,
    /// The previous frame.
    LAST_FRAME = 1,
    /// The golden frame.
    GOLDEN_FRAME = 2,
    /// The alternate reference frame.
    ALTREF_FRAME = 3,
}

impl RefType {
    /// Slot of this frame in per-reference tables.
    #[inline]
    pub const fn to_index(self) -> usize {
        self as usize
    }

    /// Whether this is one of the inter references.
    #[inline]
    pub const fn is_inter(self) -> bool {
        !matches!(self, RefType::INTRA_FRAME)
    }
}

/// Whole-macroblock prediction mode.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[expect(non_camel_case_types)]
pub enum PredictionMode {
    /// Average of the above and left edges.
    #[default]
    DC_PRED,
    /// Vertical
    V_PRED,
    /// Horizontal
    H_PRED,
    /// True motion
    TM_PRED,
    /// Each 4x4 sub-block has its own mode.
    B_PRED,
    /// Modes per 8x8 quadrant, stored per 4x4 sub-block.
    I8X8_PRED,
    /// The `nearest` predictor.
    NEARESTMV,
    /// The `near` predictor.
    NEARMV,
    /// The zero vector.
    ZEROMV,
    /// An explicitly coded vector relative to `best`.
    NEWMV,
    /// One vector per partition of the macroblock.
    SPLITMV,
}

/// Sub-block mode a left or above neighbor exposes across the macroblock
/// edge.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum EdgeMode {
    Fixed(BPredictionMode),
    FromSubBlock,
}

// indexed by PredictionMode
const MB_EDGE_MODES: [EdgeMode; MB_MODE_COUNT] = [
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
    EdgeMode::Fixed(BPredictionMode::B_VE_PRED),
    EdgeMode::Fixed(BPredictionMode::B_HE_PRED),
    EdgeMode::Fixed(BPredictionMode::B_TM_PRED),
    EdgeMode::FromSubBlock,
    EdgeMode::FromSubBlock,
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
    EdgeMode::Fixed(BPredictionMode::B_DC_PRED),
];

impl PredictionMode {
    /// Whether the mode predicts from the current frame.
    #[inline]
    pub const fn is_intra(self) -> bool {
        (self as usize) <= (PredictionMode::I8X8_PRED as usize)
    }

    /// Whether the mode predicts from a reference frame.
    #[inline]
    pub const fn is_inter(self) -> bool {
        !self.is_intra()
    }

    /// Whether the mode is `SPLITMV`.
    #[inline]
    pub const fn is_split(self) -> bool {
        matches!(self, PredictionMode::SPLITMV)
    }

    /// Whether sub-block records hold individually coded intra modes.
    #[inline]
    pub const fn has_sub_block_modes(self) -> bool {
        matches!(self, PredictionMode::B_PRED | PredictionMode::I8X8_PRED)
    }

    /// The sub-block mode this whole-macroblock mode is equivalent to, or
    /// `None` when the sub-block records must be read instead.
    #[inline]
    pub const fn edge_sub_block_mode(self) -> Option<BPredictionMode> {
        match MB_EDGE_MODES[self as usize] {
            EdgeMode::Fixed(mode) => Some(mode),
            EdgeMode::FromSubBlock => None,
        }
    }
}

/// Sub-block prediction mode: the directional intra modes followed by the
/// split vector modes.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[expect(non_camel_case_types)]
pub enum BPredictionMode {
    /// Average of the above and left edges.
    #[default]
    B_DC_PRED,
    /// True motion
    B_TM_PRED,
    /// Vertical, smoothed
    B_VE_PRED,
    /// Horizontal, smoothed
    B_HE_PRED,
    /// Down and left
    B_LD_PRED,
    /// Down and right
    B_RD_PRED,
    /// Vertical, leaning right
    B_VR_PRED,
    /// Vertical, leaning left
    B_VL_PRED,
    /// Horizontal, leaning down
    B_HD_PRED,
    /// Horizontal, leaning up
    B_HU_PRED,
    /// Vector of the sub-block to the left.
    LEFT4X4,
    /// Vector of the sub-block above.
    ABOVE4X4,
    /// The zero vector.
    ZERO4X4,
    /// An explicitly coded vector.
    NEW4X4,
}

/// Per sub-block state: a vector and a mode for each of the two
/// references.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct BlockInfo {
    /// First and second reference vectors.
    pub mvs: [MotionVector; 2],
    /// First and second modes.
    pub modes: [BPredictionMode; 2],
}

/// Which of a macroblock's two references a lookup is for.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RefSlot {
    /// The primary reference.
    #[default]
    First,
    /// The second reference of a compound macroblock.
    Second,
}

/// Mode info of one decoded macroblock.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct MacroblockInfo {
    /// Whole-macroblock prediction mode.
    pub mode: PredictionMode,
    /// Primary reference frame.
    pub ref_frame: RefType,
    /// Second reference frame of a compound predicted macroblock.
    pub second_ref_frame: Option<RefType>,
    /// Macroblock-level vectors. For `SPLITMV` the first is the vector of
    /// the last sub-block.
    pub mvs: [MotionVector; 2],
    /// Sub-block records in raster order.
    pub blocks: [BlockInfo; SUB_BLOCKS],
    // false for grid border entries
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub(crate) available: bool,
}

impl Default for MacroblockInfo {
    fn default() -> Self {
        Self::intra(PredictionMode::DC_PRED)
    }
}

impl MacroblockInfo {
    /// Sentinel stored outside the visible frame.
    pub(crate) fn border() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// A whole-macroblock intra macroblock. Sub-block modes are filled with
    /// the mode's edge equivalent.
    ///
    /// # Panics
    ///
    /// - If `mode` is not a whole-macroblock intra mode
    #[inline]
    pub fn intra(mode: PredictionMode) -> Self {
        assert!(mode.is_intra() && !mode.has_sub_block_modes());
        let bmode = mode
            .edge_sub_block_mode()
            .unwrap_or(BPredictionMode::B_DC_PRED);

        Self {
            mode,
            ref_frame: RefType::INTRA_FRAME,
            second_ref_frame: None,
            mvs: [MotionVector::ZERO; 2],
            blocks: [BlockInfo {
                mvs: [MotionVector::ZERO; 2],
                modes: [bmode; 2],
            }; SUB_BLOCKS],
            available: true,
        }
    }

    /// A `B_PRED` macroblock with one mode per sub-block.
    #[inline]
    pub fn with_sub_block_modes(modes: [BPredictionMode; SUB_BLOCKS]) -> Self {
        let mut mb = Self {
            mode: PredictionMode::B_PRED,
            ..Self::default()
        };
        for (block, mode) in mb.blocks.iter_mut().zip(modes) {
            block.modes = [mode; 2];
        }
        mb
    }

    /// A single-vector inter macroblock. Every sub-block carries `mv`.
    ///
    /// # Panics
    ///
    /// - If `mode` is intra or `SPLITMV`, or `ref_frame` is intra
    #[inline]
    pub fn inter(mode: PredictionMode, ref_frame: RefType, mv: MotionVector) -> Self {
        assert!(mode.is_inter() && !mode.is_split());
        assert!(ref_frame.is_inter());

        Self {
            mode,
            ref_frame,
            second_ref_frame: None,
            mvs: [mv, MotionVector::ZERO],
            blocks: [BlockInfo {
                mvs: [mv, MotionVector::ZERO],
                modes: [BPredictionMode::B_DC_PRED; 2],
            }; SUB_BLOCKS],
            available: true,
        }
    }

    /// Adds a second reference and its vector to an inter macroblock.
    #[inline]
    #[must_use]
    pub fn with_second_ref(mut self, ref_frame: RefType, mv: MotionVector) -> Self {
        debug_assert!(ref_frame.is_inter());
        self.second_ref_frame = Some(ref_frame);
        self.mvs[1] = mv;
        if !self.mode.is_split() {
            for block in &mut self.blocks {
                block.mvs[1] = mv;
            }
        }
        self
    }

    /// A `SPLITMV` macroblock with one vector per partition.
    ///
    /// # Panics
    ///
    /// - If `part_mvs` does not hold one vector per partition
    #[inline]
    pub fn split(
        ref_frame: RefType,
        partitioning: SplitMvPartitioning,
        part_mvs: &[MotionVector],
    ) -> Self {
        assert_eq!(part_mvs.len(), partitioning.partition_count());
        let mut mvs = [MotionVector::ZERO; SUB_BLOCKS];
        for (b, mv) in mvs.iter_mut().enumerate() {
            *mv = part_mvs[partitioning.block_partition(b)];
        }
        Self::split_from_blocks(ref_frame, mvs)
    }

    /// A `SPLITMV` macroblock from explicit per sub-block vectors.
    #[inline]
    pub fn split_from_blocks(ref_frame: RefType, block_mvs: [MotionVector; SUB_BLOCKS]) -> Self {
        debug_assert!(ref_frame.is_inter());
        let mut mb = Self {
            mode: PredictionMode::SPLITMV,
            ref_frame,
            ..Self::default()
        };
        for (block, mv) in mb.blocks.iter_mut().zip(block_mvs) {
            block.mvs[0] = mv;
            block.modes = [BPredictionMode::B_DC_PRED; 2];
        }
        mb.mvs[0] = block_mvs[SUB_BLOCKS - 1];
        mb
    }

    /// Whether the entry is a real macroblock rather than grid padding.
    #[inline]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Whether the macroblock is compound predicted.
    #[inline]
    pub const fn has_second_ref(&self) -> bool {
        self.second_ref_frame.is_some()
    }

    /// Reference frame and macroblock-level vector for `slot`.
    ///
    /// Second-slot lookups fall back to the first reference when the
    /// macroblock is not compound predicted. `None` for intra macroblocks.
    #[inline]
    pub fn reference_mv(&self, slot: RefSlot) -> Option<(RefType, MotionVector)> {
        if !self.ref_frame.is_inter() {
            return None;
        }
        match (slot, self.second_ref_frame) {
            (RefSlot::Second, Some(second)) => Some((second, self.mvs[1])),
            _ => Some((self.ref_frame, self.mvs[0])),
        }
    }

    /// Vector of sub-block `b` for `slot`, with the same fallback as
    /// [`MacroblockInfo::reference_mv`].
    #[inline]
    pub fn block_mv(&self, b: usize, slot: RefSlot) -> MotionVector {
        let block = &self.blocks[b];
        match slot {
            RefSlot::Second if self.has_second_ref() => block.mvs[1],
            _ => block.mvs[0],
        }
    }

    /// Macroblock-level vector for `slot`, with the same fallback as
    /// [`MacroblockInfo::reference_mv`].
    #[inline]
    pub fn mb_mv(&self, slot: RefSlot) -> MotionVector {
        match slot {
            RefSlot::Second if self.has_second_ref() => self.mvs[1],
            _ => self.mvs[0],
        }
    }
}

/// How a `SPLITMV` macroblock is partitioned.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[expect(non_camel_case_types)]
pub enum SplitMvPartitioning {
    /// Top and bottom halves.
    SPLIT_16X8,
    /// Left and right halves.
    SPLIT_8X16,
    /// Four quadrants.
    SPLIT_8X8,
    /// Every sub-block on its own.
    SPLIT_4X4,
}

const MBSPLITS: [[u8; SUB_BLOCKS]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1],
    [0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
];

const MBSPLIT_COUNT: [usize; 4] = [2, 2, 4, 16];

/// First sub-block of each partition.
pub const MBSPLIT_OFFSET: [[u8; SUB_BLOCKS]; 4] = [
    [0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 2, 8, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
];

impl SplitMvPartitioning {
    /// Number of partitions, each carrying one vector.
    #[inline]
    pub const fn partition_count(self) -> usize {
        MBSPLIT_COUNT[self as usize]
    }

    /// Partition that sub-block `b` belongs to.
    #[inline]
    pub const fn block_partition(self, b: usize) -> usize {
        MBSPLITS[self as usize][b] as usize
    }

    /// The sub-block whose neighbors give the coding context of partition
    /// `part`.
    #[inline]
    pub const fn first_block(self, part: usize) -> usize {
        debug_assert!(part < self.partition_count());
        MBSPLIT_OFFSET[self as usize][part] as usize
    }
}
