//! Denavit-Hartenberg parameters and the per-joint homogeneous transform.
//!
//! Standard (distal) convention: `T = Rz(theta) * Tz(d) * Tx(a) * Rx(alpha)`.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;
use crate::Joints;

/// One row of the DH table. Theta is the joint variable and is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DhParameters {
    /// Link length (m).
    pub a: f64,
    /// Link twist (rad).
    pub alpha: f64,
    /// Link offset (m).
    pub d: f64,
}

impl DhParameters {
    pub const fn new(a: f64, alpha: f64, d: f64) -> Self {
        Self { a, alpha, d }
    }

    /// Homogeneous transform from the previous frame to this joint's frame at angle `theta`.
    #[rustfmt::skip]
    pub fn transform(&self, theta: f64) -> Transform {
        let (s_th, c_th) = theta.sin_cos();
        let (s_al, c_al) = self.alpha.sin_cos();

        Transform::new(
            c_th, -s_th * c_al, s_th * s_al, self.a * c_th,
            s_th, c_th * c_al, -c_th * s_al, self.a * s_th,
            0.0, s_al, c_al, self.d,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// The six DH rows of a 6R arm, base to flange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DhTable {
    joints: [DhParameters; 6],
}

impl DhTable {
    pub const fn new(joints: [DhParameters; 6]) -> Self {
        Self { joints }
    }

    /// UR-series layout: only `d1`, `a2`, `a3`, `d4`, `d5` and `d6` vary between models.
    const fn universal_robot(d1: f64, a2: f64, a3: f64, d4: f64, d5: f64, d6: f64) -> Self {
        Self::new([
            DhParameters::new(0.0, FRAC_PI_2, d1),
            DhParameters::new(a2, 0.0, 0.0),
            DhParameters::new(a3, 0.0, 0.0),
            DhParameters::new(0.0, FRAC_PI_2, d4),
            DhParameters::new(0.0, -FRAC_PI_2, d5),
            DhParameters::new(0.0, 0.0, d6),
        ])
    }

    pub const fn ur3e() -> Self {
        Self::universal_robot(0.15185, -0.24355, -0.2132, 0.13105, 0.08535, 0.0921)
    }

    pub const fn ur5e() -> Self {
        Self::universal_robot(0.1625, -0.425, -0.3922, 0.1333, 0.0997, 0.0996)
    }

    pub const fn ur10e() -> Self {
        Self::universal_robot(0.1807, -0.6127, -0.57155, 0.17415, 0.11985, 0.11655)
    }

    pub const fn ur16e() -> Self {
        Self::universal_robot(0.1807, -0.4784, -0.36, 0.17415, 0.11985, 0.11655)
    }

    pub fn joints(&self) -> &[DhParameters; 6] {
        &self.joints
    }

    /// DH row of joint `index` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `index > 5`.
    pub fn joint(&self, index: usize) -> &DhParameters {
        &self.joints[index]
    }

    /// Transform contributed by joint `index` (0-based) at angle `theta`.
    ///
    /// # Panics
    ///
    /// Panics if `index > 5`.
    pub fn joint_transform(&self, index: usize, theta: f64) -> Transform {
        self.joints[index].transform(theta)
    }

    /// Flange pose in the base frame: `T01 * T12 * ... * T56`.
    pub fn forward_kinematics(&self, joints: &Joints) -> Transform {
        self.joints
            .iter()
            .zip(joints.iter())
            .fold(Transform::identity(), |pose, (row, &theta)| pose * row.transform(theta))
    }
}

impl Default for DhTable {
    fn default() -> Self {
        Self::ur16e()
    }
}
