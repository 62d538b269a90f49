use std::f64::consts::{PI, TAU};

use crate::Joints;

/// Wraps an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Shortest signed rotation taking `to` onto `from`, in `(-PI, PI]`.
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_angle(from - to)
}

/// Total joint travel between two configurations, each joint taking the short way round.
pub fn joint_distance(a: &Joints, b: &Joints) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| angle_difference(*x, *y).abs())
        .sum()
}
