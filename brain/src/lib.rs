use kinematics::angles::joint_distance;
use kinematics::{IkSolutions, InverseKinematics, Joints, KinematicsError, Transform, UrKinematics};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How one configuration is picked out of the IK branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchSelection {
    /// Lowest complete branch index.
    First,
    /// Least total joint travel from the reference configuration.
    #[default]
    Nearest,
}

impl BranchSelection {
    pub fn select(&self, solutions: &IkSolutions, reference: &Joints) -> Option<Joints> {
        match self {
            BranchSelection::First => solutions.iter().next().map(|(_, joints)| joints),
            BranchSelection::Nearest => solutions
                .iter()
                .min_by(|(_, a), (_, b)| {
                    joint_distance(a, reference).total_cmp(&joint_distance(b, reference))
                })
                .map(|(_, joints)| joints),
        }
    }
}

/// Joint-space goals in the order they were planned.
#[derive(Debug, Default)]
pub struct Planner {
    trajectory: VecDeque<Joints>,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            trajectory: VecDeque::new(),
        }
    }

    pub fn add_waypoint(&mut self, joints: Joints) {
        self.trajectory.push_back(joints);
    }

    pub fn next_step(&mut self) -> Option<Joints> {
        self.trajectory.pop_front()
    }

    pub fn last_waypoint(&self) -> Option<&Joints> {
        self.trajectory.back()
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }
}

pub struct RobotBrain<K = UrKinematics> {
    kinematics: K,
    selection: BranchSelection,
    planner: Planner,
    current: Joints,
}

impl<K: InverseKinematics> RobotBrain<K> {
    pub fn new(kinematics: K, selection: BranchSelection) -> Self {
        Self {
            kinematics,
            selection,
            planner: Planner::new(),
            current: [0.0; 6],
        }
    }

    pub fn kinematics(&self) -> &K {
        &self.kinematics
    }

    /// Measured configuration of the arm; the next plan is chosen relative to it
    /// unless goals are still queued.
    pub fn set_current_joints(&mut self, joints: Joints) {
        self.current = joints;
    }

    pub fn current_joints(&self) -> Joints {
        self.current
    }

    /// Solves IK for `target`, picks a branch and queues it.
    ///
    /// The branch is chosen relative to the last queued goal, or to the current
    /// joints when nothing is queued.
    pub fn plan_motion(&mut self, target: &Transform) -> Result<Joints, KinematicsError> {
        let solutions = self.kinematics.inverse_kinematics(target);
        let reference = self.planner.last_waypoint().copied().unwrap_or(self.current);

        let Some(goal) = self.selection.select(&solutions, &reference) else {
            warn!(
                "No complete IK branch for target translation [{:.4}, {:.4}, {:.4}]",
                target[(0, 3)],
                target[(1, 3)],
                target[(2, 3)]
            );
            return Err(KinematicsError::Unreachable);
        };

        debug!(
            "Planned {:?} out of {} branches ({:?} selection)",
            goal,
            solutions.len(),
            self.selection
        );
        self.planner.add_waypoint(goal);
        Ok(goal)
    }

    pub fn execute_next_step(&mut self) -> Option<Joints> {
        let step = self.planner.next_step()?;
        self.current = step;
        Some(step)
    }

    pub fn pending_steps(&self) -> usize {
        self.planner.len()
    }
}

impl Default for RobotBrain<UrKinematics> {
    fn default() -> Self {
        Self::new(UrKinematics::default(), BranchSelection::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinematics::ForwardKinematics;

    const START: Joints = [0.3, -1.2, 1.1, -0.6, 0.9, 0.4];

    fn unreachable_target() -> Transform {
        let mut target = Transform::identity();
        target[(0, 3)] = 0.1;
        target[(2, 3)] = 0.5;
        target
    }

    #[test]
    fn test_planner() {
        let mut planner = Planner::new();
        planner.add_waypoint([1.0; 6]);
        planner.add_waypoint([2.0; 6]);

        assert_eq!(planner.len(), 2);
        assert_eq!(planner.last_waypoint(), Some(&[2.0; 6]));
        assert_eq!(planner.next_step(), Some([1.0; 6]));
        assert_eq!(planner.next_step(), Some([2.0; 6]));
        assert!(planner.next_step().is_none());
        assert!(planner.is_empty());
    }

    #[test]
    fn test_nearest_selection_keeps_current_branch() {
        let mut brain: RobotBrain = RobotBrain::default();
        brain.set_current_joints(START);
        let target = brain.kinematics().forward_kinematics(&START);

        let goal = brain.plan_motion(&target).unwrap();
        for (planned, expected) in goal.iter().zip(START.iter()) {
            assert_relative_eq!(*planned, *expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_first_selection_takes_lowest_branch() {
        let kinematics = UrKinematics::ur16e();
        let target = kinematics.forward_kinematics(&[-1.0, -0.8, -1.4, 0.5, -1.1, 2.0]);
        let expected = kinematics.solve(&target).solution(0).unwrap();

        let mut brain = RobotBrain::new(kinematics, BranchSelection::First);
        assert_eq!(brain.plan_motion(&target), Ok(expected));
    }

    #[test]
    fn test_planned_goal_reaches_target() {
        let mut brain: RobotBrain = RobotBrain::default();
        let target = brain.kinematics().forward_kinematics(&[2.5, -2.0, 0.7, 1.3, 0.6, -2.8]);

        let goal = brain.plan_motion(&target).unwrap();
        assert!(brain.kinematics().verify_solution(&target, &goal));
    }

    #[test]
    fn test_selection_chains_from_last_queued_goal() {
        let kinematics = UrKinematics::ur16e();
        let second = [0.35, -1.15, 1.05, -0.55, 0.95, 0.45];
        let first_target = kinematics.forward_kinematics(&START);
        let second_target = kinematics.forward_kinematics(&second);

        let mut brain = RobotBrain::new(kinematics, BranchSelection::Nearest);
        brain.set_current_joints(START);
        brain.plan_motion(&first_target).unwrap();
        // A measurement on another branch does not override the queued goal.
        brain.set_current_joints([-2.3, -2.3, -1.0, 0.7, 1.8, -3.1]);
        let goal = brain.plan_motion(&second_target).unwrap();

        for (planned, expected) in goal.iter().zip(second.iter()) {
            assert_relative_eq!(*planned, *expected, epsilon = 1e-6);
        }
        assert_eq!(brain.pending_steps(), 2);
    }

    #[test]
    fn test_unreachable_target_is_not_queued() {
        let mut brain: RobotBrain = RobotBrain::default();
        assert_eq!(
            brain.plan_motion(&unreachable_target()),
            Err(KinematicsError::Unreachable)
        );
        assert_eq!(brain.pending_steps(), 0);
    }

    #[test]
    fn test_execute_updates_current_joints() {
        let mut brain: RobotBrain = RobotBrain::default();
        let target = brain.kinematics().forward_kinematics(&START);
        let goal = brain.plan_motion(&target).unwrap();

        let next_step = brain.execute_next_step();
        assert_eq!(next_step, Some(goal));
        assert_eq!(brain.current_joints(), goal);
        assert!(brain.execute_next_step().is_none());
    }

    #[test]
    fn test_selection_on_empty_table() {
        let solutions = IkSolutions::unsolved();
        assert!(BranchSelection::First.select(&solutions, &START).is_none());
        assert!(BranchSelection::Nearest.select(&solutions, &START).is_none());
    }
}
