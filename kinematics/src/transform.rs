//! Homogeneous rigid transforms.
//!
//! A [`Transform`] is a plain 4x4 `nalgebra` matrix indexed `(row, column)`:
//! the top-left 3x3 block is the rotation, column 3 holds the translation and
//! the last row is `[0, 0, 0, 1]`. The helpers here only assume that layout and
//! an orthonormal rotation block; they never validate it.

use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

pub type Transform = Matrix4<f64>;

/// Inverse of a rigid transform: `[R | p]^-1 = [R^T | -R^T p]`.
pub fn rigid_inverse(transform: &Transform) -> Transform {
    let rotation_t = transform.fixed_view::<3, 3>(0, 0).transpose();
    let translation = transform.fixed_view::<3, 1>(0, 3).into_owned();

    let mut inverse = Transform::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation_t);
    inverse
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&(-(rotation_t * translation)));
    inverse
}

/// Applies the transform to a point (implicit homogeneous coordinate of 1).
pub fn transform_point(transform: &Transform, point: &Point3<f64>) -> Point3<f64> {
    let rotated = transform.fixed_view::<3, 3>(0, 0) * point.coords;
    Point3::from(rotated + transform.fixed_view::<3, 1>(0, 3))
}

pub fn translation(transform: &Transform) -> Vector3<f64> {
    transform.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Builds a transform from 16 scalars listed row by row.
pub fn from_row_major(elements: &[f64; 16]) -> Transform {
    Transform::from_row_slice(elements)
}

/// Builds a transform from 16 scalars listed column by column, the layout used
/// by most graphics engines.
pub fn from_column_major(elements: &[f64; 16]) -> Transform {
    Transform::from_column_slice(elements)
}

pub fn from_isometry(pose: &Isometry3<f64>) -> Transform {
    pose.to_homogeneous()
}

pub fn to_isometry(transform: &Transform) -> Isometry3<f64> {
    let rotation = Rotation3::from_matrix_unchecked(transform.fixed_view::<3, 3>(0, 0).into_owned());
    Isometry3::from_parts(
        Translation3::from(translation(transform)),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

/// Distance between two poses as `(translation error in meters, rotation error in radians)`.
pub fn pose_error(a: &Transform, b: &Transform) -> (f64, f64) {
    let a = to_isometry(a);
    let b = to_isometry(b);
    let translation_diff = (a.translation.vector - b.translation.vector).norm();
    let rotation_diff = a.rotation.angle_to(&b.rotation);
    (translation_diff, rotation_diff)
}
