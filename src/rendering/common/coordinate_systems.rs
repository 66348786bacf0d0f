use glam::{Quat, Vec3, Vec4};
use lvl_files::common::types::{C3Vector, C4Quaternion};

// LVL data is right handed (Y Up, -Z forward), the render space is left handed (Y Up, +Z forward).
// Mirroring X converts between the two, which is why every index buffer also needs its winding reversed.

#[inline]
pub fn lvl_to_render(source: Vec3) -> Vec3 {
    Vec3::new(-source.x, source.y, source.z)
}

#[inline]
pub fn lvl_vec_to_render(source: &C3Vector) -> Vec3 {
    lvl_to_render(Vec3::new(source.x, source.y, source.z))
}

/// Mirroring a rotation keeps the angle, but the axis is mirrored and flipped (det = -1).
/// `None` if the record can't be normalized, i.e. it is zero or not finite.
#[inline]
pub fn lvl_rot_to_render(source: &C4Quaternion) -> Option<Quat> {
    Vec4::new(source.x, -source.y, -source.z, source.w)
        .try_normalize()
        .map(Quat::from_vec4)
}
