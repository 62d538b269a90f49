use std::path::Path;
use std::time::Duration;

use brain::BranchSelection;
use kinematics::{DhTable, Transform};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_step_period_ms() -> u64 {
    100
}
const fn default_state_timeout_ms() -> u64 {
    500
}
fn default_joint_state_key() -> String {
    "rt/robot/joint_states".into()
}
fn default_joint_command_key() -> String {
    "rt/robot/joint_commands".into()
}
fn default_frame_id() -> String {
    "base_link".into()
}
fn default_targets() -> Vec<TargetPose> {
    vec![
        TargetPose {
            position: [-0.575, -0.436, 0.63],
            rpy: [1.04, 0.071, -0.509],
        },
        TargetPose {
            position: [0.301, -0.274, 0.726],
            rpy: [0.486, 1.082, 1.24],
        },
        TargetPose {
            position: [-0.36, 0.18, 0.678],
            rpy: [-3.111, 0.271, 0.579],
        },
    ]
}

/// Zenoh key expressions and the ROS frame stamped on outgoing messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_joint_state_key")]
    pub joint_state_key: String,

    #[serde(default = "default_joint_command_key")]
    pub joint_command_key: String,

    #[serde(default = "default_frame_id")]
    pub frame_id: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            joint_state_key: default_joint_state_key(),
            joint_command_key: default_joint_command_key(),
            frame_id: default_frame_id(),
        }
    }
}

/// Flange pose in the robot base frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPose {
    /// Translation in meters.
    pub position: [f64; 3],

    /// Roll, pitch, yaw in radians; `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.
    #[serde(default)]
    pub rpy: [f64; 3],
}

impl TargetPose {
    pub fn to_transform(&self) -> Transform {
        let [x, y, z] = self.position;
        let [roll, pitch, yaw] = self.rpy;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
        .to_homogeneous()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// How a branch is picked among the IK solutions.
    #[serde(default)]
    pub selection: BranchSelection,

    /// Pause between published joint commands.
    #[serde(default = "default_step_period_ms")]
    pub step_period_ms: u64,

    /// How long to wait for a measured joint state before planning.
    #[serde(default = "default_state_timeout_ms")]
    pub state_timeout_ms: u64,

    #[serde(default)]
    pub topics: TopicConfig,

    /// DH rows of the arm (defaults to a UR16e).
    #[serde(default)]
    pub arm: DhTable,

    #[serde(default = "default_targets")]
    pub targets: Vec<TargetPose>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            selection: BranchSelection::default(),
            step_period_ms: default_step_period_ms(),
            state_timeout_ms: default_state_timeout_ms(),
            topics: TopicConfig::default(),
            arm: DhTable::default(),
            targets: default_targets(),
        }
    }
}

impl InterfaceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_period_ms == 0 {
            return Err(invalid("step_period_ms", "must be > 0"));
        }
        if self.topics.joint_state_key.is_empty() {
            return Err(invalid("topics.joint_state_key", "must not be empty"));
        }
        if self.topics.joint_command_key.is_empty() {
            return Err(invalid("topics.joint_command_key", "must not be empty"));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if !target.position.iter().chain(target.rpy.iter()).all(|v| v.is_finite()) {
                return Err(invalid(&format!("targets[{i}]"), "values must be finite"));
            }
        }
        Ok(())
    }

    pub fn step_period(&self) -> Duration {
        Duration::from_millis(self.step_period_ms)
    }

    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinematics::{DhParameters, UrKinematics};

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = InterfaceConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterfaceConfig::default());
        assert_eq!(config.selection, BranchSelection::Nearest);
        assert_eq!(config.arm, DhTable::ur16e());
        assert_eq!(config.step_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_parses_full_file() {
        let config = InterfaceConfig::from_toml_str(
            r#"
            selection = "first"
            step_period_ms = 250

            [topics]
            joint_command_key = "rt/ur/joint_commands"

            [[arm]]
            a = 0.0
            alpha = 1.5707963267948966
            d = 0.1625
            [[arm]]
            a = -0.425
            alpha = 0.0
            d = 0.0
            [[arm]]
            a = -0.3922
            alpha = 0.0
            d = 0.0
            [[arm]]
            a = 0.0
            alpha = 1.5707963267948966
            d = 0.1333
            [[arm]]
            a = 0.0
            alpha = -1.5707963267948966
            d = 0.0997
            [[arm]]
            a = 0.0
            alpha = 0.0
            d = 0.0996

            [[targets]]
            position = [0.4, -0.1, 0.3]
            "#,
        )
        .unwrap();

        assert_eq!(config.selection, BranchSelection::First);
        assert_eq!(config.step_period_ms, 250);
        assert_eq!(config.topics.joint_command_key, "rt/ur/joint_commands");
        assert_eq!(config.topics.joint_state_key, "rt/robot/joint_states");
        assert_eq!(config.arm, DhTable::ur5e());
        assert_eq!(config.arm.joint(3), &DhParameters::new(0.0, std::f64::consts::FRAC_PI_2, 0.1333));
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].rpy, [0.0; 3]);
    }

    #[test]
    fn test_example_file_parses() {
        let config = InterfaceConfig::from_toml_str(include_str!("../robot.toml")).unwrap();
        assert_eq!(config.arm, DhTable::ur16e());
        assert_eq!(config.targets, default_targets()[..2].to_vec());
    }

    #[test]
    fn test_rejects_short_dh_table() {
        let result = InterfaceConfig::from_toml_str(
            r#"
            [[arm]]
            a = 0.0
            alpha = 0.0
            d = 0.1
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_rejects_zero_step_period() {
        let result = InterfaceConfig::from_toml_str("step_period_ms = 0");
        match result {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "step_period_ms"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_selection() {
        let result = InterfaceConfig::from_toml_str(r#"selection = "random""#);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = InterfaceConfig::load("/nonexistent/arm.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_target_pose_to_transform() {
        let target = TargetPose {
            position: [0.1, 0.2, 0.3],
            rpy: [0.0, 0.0, std::f64::consts::FRAC_PI_2],
        };
        let t = target.to_transform();
        assert_relative_eq!(t[(0, 3)], 0.1);
        assert_relative_eq!(t[(2, 3)], 0.3);
        assert_relative_eq!(t[(1, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[(0, 1)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_targets_are_reachable() {
        let kinematics = UrKinematics::new(InterfaceConfig::default().arm).unwrap();
        for target in default_targets() {
            let solutions = kinematics.solve(&target.to_transform());
            assert_eq!(solutions.len(), kinematics::SOLUTION_COUNT, "{target:?}");
        }
    }
}
