use v_frame::{
    pixel::{CastFromPrimitive, Pixel},
    plane::PlaneSlice,
};

/// Sum of absolute differences between two `w`×`h` areas.
///
/// Both slices may start inside the plane padding, as long as the whole
/// area stays inside the allocation.
pub(crate) fn get_sad<T: Pixel>(
    plane_org: &PlaneSlice<'_, T>,
    plane_ref: &PlaneSlice<'_, T>,
    w: usize,
    h: usize,
) -> u32 {
    (0..h)
        .map(|y| {
            plane_org[y][..w]
                .iter()
                .zip(&plane_ref[y][..w])
                .map(|(&p1, &p2)| i32::cast_from(p1).abs_diff(i32::cast_from(p2)))
                .sum::<u32>()
        })
        .sum()
}
