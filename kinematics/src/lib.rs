//! Kinematics for UR-style 6R arms described by Denavit-Hartenberg parameters.
//!
//! ```text
//! DhTable ──► UrKinematics ──► IkSolutions (6 joints x 8 branches)
//! ```
//!
//! Poses are [`Transform`]s: 4x4 homogeneous matrices indexed `(row, column)`.

use nalgebra::Isometry3;

pub mod angles;
pub mod dh;
pub mod error;
pub mod solutions;
pub mod transform;
pub mod ur_kinematics;

pub use dh::{DhParameters, DhTable};
pub use error::KinematicsError;
pub use solutions::{BranchConfig, Elbow, IkSolutions, Shoulder, Wrist, SOLUTION_COUNT};
pub use transform::Transform;
pub use ur_kinematics::UrKinematics;

/// One angle per joint, base to flange, in radians.
pub type Joints = [f64; 6];

pub type Pose = Isometry3<f64>;

pub trait ForwardKinematics {
    fn forward_kinematics(&self, joints: &Joints) -> Transform;

    fn forward_pose(&self, joints: &Joints) -> Pose {
        transform::to_isometry(&self.forward_kinematics(joints))
    }
}

pub trait InverseKinematics {
    /// Every closed-form branch for `target`. Unsolved cells are `None`.
    fn inverse_kinematics(&self, target: &Transform) -> IkSolutions;
}
