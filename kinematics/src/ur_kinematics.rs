//! Closed-form inverse kinematics for UR-style 6R arms.
//!
//! Joints 2, 3 and 4 have parallel axes and joints 5 and 6 sit on a wrist with
//! offsets `d5` and `d6`. That lets the solver decouple the problem: joint 1
//! follows from the wrist-center azimuth, joints 5 and 6 from the target
//! orientation, and joints 2, 3 and 4 from a planar two-link problem. Solve
//! order is 1, 5, 6, 3, 2, 4.

use std::f64::consts::FRAC_PI_2;

use log::{debug, trace};
use nalgebra::Point3;

use crate::angles::normalize_angle;
use crate::dh::DhTable;
use crate::error::KinematicsError;
use crate::solutions::{BranchConfig, Elbow, IkSolutions, Shoulder, Wrist};
use crate::transform::{pose_error, rigid_inverse, transform_point, Transform};
use crate::{ForwardKinematics, InverseKinematics, Joints};

/// `|sin(theta5)|` below this is treated as the wrist singularity; theta6 is then 0.
pub const SINGULARITY_EPSILON: f64 = 1e-6;

/// How far the law-of-cosines argument may leave `[-1, 1]` before the elbow
/// is considered unable to reach, rather than off by rounding.
const REACH_TOLERANCE: f64 = 1e-6;

const VERIFY_TOLERANCE: f64 = 1e-4;

/// Link twists of the UR joint layout, base to flange.
const UR_TWISTS: [f64; 6] = [FRAC_PI_2, 0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, 0.0];

/// Slack allowed when comparing a table against the UR layout.
const STRUCTURE_TOLERANCE: f64 = 1e-9;

fn clamp_unit(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrKinematics {
    dh: DhTable,
}

impl UrKinematics {
    /// Rejects tables outside the UR joint layout, and tables the closed form
    /// would divide by zero on.
    ///
    /// The layout fixes every link twist to `(pi/2, 0, 0, pi/2, -pi/2, 0)` and
    /// `a1 = a4 = a5 = a6 = 0`. Link lengths `a2`, `a3` and all offsets are free.
    pub fn new(dh: DhTable) -> Result<Self, KinematicsError> {
        for (joint, row) in dh.joints().iter().enumerate() {
            if !(row.a.is_finite() && row.alpha.is_finite() && row.d.is_finite()) {
                return Err(KinematicsError::InvalidParameter {
                    joint,
                    message: "parameters must be finite".into(),
                });
            }
        }
        for (joint, (row, twist)) in dh.joints().iter().zip(UR_TWISTS).enumerate() {
            if (row.alpha - twist).abs() > STRUCTURE_TOLERANCE {
                return Err(KinematicsError::InvalidParameter {
                    joint,
                    message: format!("link twist must be {twist:.6} rad"),
                });
            }
        }
        for joint in [0, 3, 4, 5] {
            if dh.joint(joint).a.abs() > STRUCTURE_TOLERANCE {
                return Err(KinematicsError::InvalidParameter {
                    joint,
                    message: "link length a must be zero".into(),
                });
            }
        }
        for joint in [1, 2] {
            if dh.joint(joint).a == 0.0 {
                return Err(KinematicsError::InvalidParameter {
                    joint,
                    message: "link length a must be non-zero".into(),
                });
            }
        }
        if dh.joint(5).d == 0.0 {
            return Err(KinematicsError::InvalidParameter {
                joint: 5,
                message: "flange offset d must be non-zero".into(),
            });
        }

        debug!("UR kinematics ready: {:?}", dh.joints());
        Ok(Self { dh })
    }

    pub fn ur16e() -> Self {
        Self { dh: DhTable::ur16e() }
    }

    pub fn dh(&self) -> &DhTable {
        &self.dh
    }

    /// Transform contributed by joint `index` (0-based) at angle `theta`.
    pub fn joint_transform(&self, index: usize, theta: f64) -> Transform {
        self.dh.joint_transform(index, theta)
    }

    /// All closed-form solutions for `target`, the flange pose in the base frame.
    ///
    /// An unreachable or non-finite target yields a table with every cell
    /// unsolved. Each solved angle is wrapped into `(-pi, pi]`.
    pub fn solve(&self, target: &Transform) -> IkSolutions {
        let mut solutions = IkSolutions::unsolved();

        if !target.iter().all(|value| value.is_finite()) {
            debug!("Target pose has non-finite entries");
            return solutions;
        }

        let Some((left, right)) = self.solve_shoulder(target) else {
            debug!("Target unreachable: wrist center is inside the shoulder offset cylinder");
            return solutions;
        };

        let target_inverse = rigid_inverse(target);

        for config in BranchConfig::all() {
            let branch = config.index();
            let theta1 = match config.shoulder {
                Shoulder::Left => left,
                Shoulder::Right => right,
            };
            let theta5 = self.solve_wrist_bend(target, theta1, config.wrist);
            let theta6 = self.solve_wrist_roll(&target_inverse, theta1, theta5);

            solutions.set(0, branch, theta1);
            solutions.set(4, branch, theta5);
            solutions.set(5, branch, theta6);

            match self.solve_arm(target, theta1, theta5, theta6, config.elbow) {
                Some((theta2, theta3, theta4)) => {
                    solutions.set(1, branch, theta2);
                    solutions.set(2, branch, theta3);
                    solutions.set(3, branch, theta4);
                }
                None => trace!("Branch {branch}: elbow cannot span the distance to the wrist"),
            }
        }

        solutions.map_solved(normalize_angle);
        solutions
    }

    /// Checks that `solution` drives the flange onto `target`.
    pub fn verify_solution(&self, target: &Transform, solution: &Joints) -> bool {
        let fk_pose = self.dh.forward_kinematics(solution);
        let (translation_diff, rotation_diff) = pose_error(target, &fk_pose);

        translation_diff < VERIFY_TOLERANCE && rotation_diff < VERIFY_TOLERANCE
    }

    /// `d2 + d3 + d4`: distance from the base axis that the wrist center keeps
    /// along joint 1's z axis.
    fn shoulder_offset(&self) -> f64 {
        self.dh.joint(1).d + self.dh.joint(2).d + self.dh.joint(3).d
    }

    /// Theta1 for both shoulder branches, or `None` if the wrist center lies
    /// closer to the base axis than the shoulder offset.
    fn solve_shoulder(&self, target: &Transform) -> Option<(f64, f64)> {
        let d6 = self.dh.joint(5).d;
        let wrist_center = transform_point(target, &Point3::new(0.0, 0.0, -d6));

        let psi = wrist_center.y.atan2(wrist_center.x);
        let phi_num = self.shoulder_offset();
        let phi_den = wrist_center.x.hypot(wrist_center.y);
        if phi_den < phi_num.abs() {
            return None;
        }

        let ratio = if phi_den > 0.0 { phi_num / phi_den } else { 0.0 };
        let phi = clamp_unit(ratio).acos();
        Some((psi + phi + FRAC_PI_2, psi - phi + FRAC_PI_2))
    }

    fn solve_wrist_bend(&self, target: &Transform, theta1: f64, wrist: Wrist) -> f64 {
        let (s1, c1) = theta1.sin_cos();
        let d6 = self.dh.joint(5).d;

        let t5 = (target[(0, 3)] * s1 - target[(1, 3)] * c1 - self.shoulder_offset()) / d6;
        let theta5 = clamp_unit(t5).acos();
        match wrist {
            Wrist::Positive => theta5,
            Wrist::Negative => -theta5,
        }
    }

    /// Theta6 from the base z axis of joint 1 seen from the flange frame.
    fn solve_wrist_roll(&self, target_inverse: &Transform, theta1: f64, theta5: f64) -> f64 {
        let s5 = theta5.sin();
        if s5.abs() < SINGULARITY_EPSILON {
            trace!("Wrist singularity (theta5 = {theta5}); theta6 set to 0");
            return 0.0;
        }

        let (s1, c1) = theta1.sin_cos();
        let ti = target_inverse;
        let s6 = (-ti[(1, 0)] * s1 + ti[(1, 1)] * c1) / s5;
        let c6 = (ti[(0, 0)] * s1 - ti[(0, 1)] * c1) / s5;
        s6.atan2(c6)
    }

    /// Theta2, theta3 and theta4 once the shoulder and wrist are fixed.
    fn solve_arm(
        &self,
        target: &Transform,
        theta1: f64,
        theta5: f64,
        theta6: f64,
        elbow: Elbow,
    ) -> Option<(f64, f64, f64)> {
        let a2 = self.dh.joint(1).a;
        let a3 = self.dh.joint(2).a;
        let d4 = self.dh.joint(3).d;

        let t01 = self.joint_transform(0, theta1);
        let t45 = self.joint_transform(4, theta5);
        let t56 = self.joint_transform(5, theta6);
        let t14 = rigid_inverse(&t01) * target * rigid_inverse(&(t45 * t56));

        // Origin of frame 3 expressed in frame 1.
        let p13 = transform_point(&t14, &Point3::new(0.0, -d4, 0.0));
        let reach_sq = p13.x * p13.x + p13.y * p13.y;

        let t3 = (reach_sq - a2 * a2 - a3 * a3) / (2.0 * a2 * a3);
        if t3.abs() > 1.0 + REACH_TOLERANCE {
            return None;
        }
        let theta3 = match elbow {
            Elbow::Up => clamp_unit(t3).acos(),
            Elbow::Down => -clamp_unit(t3).acos(),
        };

        // Frame 3 sits at R(theta2) * (a2 + a3*c3, a3*s3) in the joint 2 plane.
        let (s3, c3) = theta3.sin_cos();
        let theta2 = p13.y.atan2(p13.x) - (a3 * s3).atan2(a2 + a3 * c3);

        let t13 = self.joint_transform(1, theta2) * self.joint_transform(2, theta3);
        let t34 = rigid_inverse(&t13) * t14;
        let theta4 = t34[(1, 0)].atan2(t34[(0, 0)]);

        Some((theta2, theta3, theta4))
    }
}

impl Default for UrKinematics {
    fn default() -> Self {
        Self::ur16e()
    }
}

impl ForwardKinematics for UrKinematics {
    fn forward_kinematics(&self, joints: &Joints) -> Transform {
        self.dh.forward_kinematics(joints)
    }
}

impl InverseKinematics for UrKinematics {
    fn inverse_kinematics(&self, target: &Transform) -> IkSolutions {
        self.solve(target)
    }
}
