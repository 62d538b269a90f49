//! The 6x8 joint-angle table returned by the inverse solver.
//!
//! Column `i` is one IK branch. Its index encodes three binary choices:
//!
//! ```text
//! i:        0  1  2  3  4  5  6  7
//! shoulder  L  L  L  L  R  R  R  R     i < 4
//! wrist     +  +  -  -  +  +  -  -     i % 4 < 2
//! elbow     U  D  U  D  U  D  U  D     i % 2 == 0
//! ```

use crate::Joints;

pub const SOLUTION_COUNT: usize = 8;

/// Which of the two shoulder (joint 1) angles a branch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shoulder {
    /// `theta1 = psi + phi + pi/2`
    Left,
    /// `theta1 = psi - phi + pi/2`
    Right,
}

/// Sign of the wrist bend (joint 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrist {
    Positive,
    Negative,
}

/// Sign of the elbow angle (joint 3). `Up` is the positive root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Elbow {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchConfig {
    pub shoulder: Shoulder,
    pub wrist: Wrist,
    pub elbow: Elbow,
}

impl BranchConfig {
    /// # Panics
    ///
    /// Panics if `index >= SOLUTION_COUNT`.
    pub fn from_index(index: usize) -> Self {
        assert!(index < SOLUTION_COUNT, "branch index {index} out of range");
        Self {
            shoulder: if index < 4 { Shoulder::Left } else { Shoulder::Right },
            wrist: if index % 4 < 2 { Wrist::Positive } else { Wrist::Negative },
            elbow: if index % 2 == 0 { Elbow::Up } else { Elbow::Down },
        }
    }

    pub fn index(&self) -> usize {
        let shoulder = match self.shoulder {
            Shoulder::Left => 0,
            Shoulder::Right => 4,
        };
        let wrist = match self.wrist {
            Wrist::Positive => 0,
            Wrist::Negative => 2,
        };
        let elbow = match self.elbow {
            Elbow::Up => 0,
            Elbow::Down => 1,
        };
        shoulder + wrist + elbow
    }

    pub fn all() -> impl Iterator<Item = BranchConfig> {
        (0..SOLUTION_COUNT).map(Self::from_index)
    }
}

/// Up to eight IK solutions, one column per branch. `None` marks an unsolved cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSolutions {
    angles: [[Option<f64>; SOLUTION_COUNT]; 6],
}

impl IkSolutions {
    pub const fn unsolved() -> Self {
        Self {
            angles: [[None; SOLUTION_COUNT]; 6],
        }
    }

    pub(crate) fn set(&mut self, joint: usize, branch: usize, angle: f64) {
        self.angles[joint][branch] = Some(angle);
    }

    pub(crate) fn map_solved(&mut self, f: impl Fn(f64) -> f64) {
        for cell in self.angles.iter_mut().flatten() {
            *cell = cell.map(&f);
        }
    }

    /// Angle of `joint` (0-based) in `branch`, if that cell was solved.
    pub fn angle(&self, joint: usize, branch: usize) -> Option<f64> {
        self.angles[joint][branch]
    }

    /// The branch's six angles, only when every joint was solved.
    pub fn solution(&self, branch: usize) -> Option<Joints> {
        let mut joints = [0.0; 6];
        for (joint, angle) in joints.iter_mut().enumerate() {
            *angle = self.angles[joint][branch]?;
        }
        Some(joints)
    }

    /// Complete columns in branch order.
    pub fn iter(&self) -> impl Iterator<Item = (BranchConfig, Joints)> + '_ {
        (0..SOLUTION_COUNT)
            .filter_map(|branch| self.solution(branch).map(|joints| (BranchConfig::from_index(branch), joints)))
    }

    /// Number of complete columns.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when not a single cell was solved, i.e. the wrist center is out of reach.
    pub fn is_unreachable(&self) -> bool {
        self.angles.iter().flatten().all(Option::is_none)
    }

    /// Flat table with `NaN` in unsolved cells, indexed `[joint][branch]`.
    pub fn to_nan_table(&self) -> [[f64; SOLUTION_COUNT]; 6] {
        self.angles.map(|row| row.map(|cell| cell.unwrap_or(f64::NAN)))
    }
}

impl Default for IkSolutions {
    fn default() -> Self {
        Self::unsolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_index_layout() {
        for index in 0..SOLUTION_COUNT {
            assert_eq!(BranchConfig::from_index(index).index(), index);
        }
        assert_eq!(
            BranchConfig::from_index(6),
            BranchConfig {
                shoulder: Shoulder::Right,
                wrist: Wrist::Negative,
                elbow: Elbow::Up,
            }
        );
        assert_eq!(BranchConfig::all().count(), SOLUTION_COUNT);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_branch_index_out_of_range() {
        BranchConfig::from_index(SOLUTION_COUNT);
    }

    #[test]
    fn test_unsolved_table() {
        let table = IkSolutions::unsolved();
        assert!(table.is_unreachable());
        assert!(table.is_empty());
        assert!(table.solution(0).is_none());
        assert!(table.to_nan_table().iter().flatten().all(|a| a.is_nan()));
    }

    #[test]
    fn test_partial_column_is_not_a_solution() {
        let mut table = IkSolutions::unsolved();
        for joint in 0..5 {
            table.set(joint, 3, 0.5);
        }
        assert!(!table.is_unreachable());
        assert_eq!(table.angle(2, 3), Some(0.5));
        assert!(table.solution(3).is_none());

        table.set(5, 3, -0.5);
        assert_eq!(table.solution(3), Some([0.5, 0.5, 0.5, 0.5, 0.5, -0.5]));
        assert_eq!(table.len(), 1);

        let (config, joints) = table.iter().next().unwrap();
        assert_eq!(config.index(), 3);
        assert_eq!(joints[5], -0.5);

        let flat = table.to_nan_table();
        assert_eq!(flat[5][3], -0.5);
        assert!(flat[5][2].is_nan());
    }

    #[test]
    fn test_map_solved_skips_empty_cells() {
        let mut table = IkSolutions::unsolved();
        table.set(0, 0, 1.0);
        table.map_solved(|a| a * 2.0);
        assert_eq!(table.angle(0, 0), Some(2.0));
        assert_eq!(table.angle(0, 1), None);
    }
}
