use zenoh::Session;
use edgefirst_schemas::std_msgs::Header;
use edgefirst_schemas::builtin_interfaces::Time;
use serde::{Deserialize, Serialize};
use kinematics::Joints;
use log::{debug, warn};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::TopicConfig;
use crate::error::InterfaceError;

/// UR joint names, base to flange.
pub const JOINT_NAMES: [&str; 6] = [
    "shoulder_pan_joint",
    "shoulder_lift_joint",
    "elbow_joint",
    "wrist_1_joint",
    "wrist_2_joint",
    "wrist_3_joint",
];

/// `sensor_msgs/JointState`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JointState {
    pub header: Header,
    pub name: Vec<String>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

impl Default for JointState {
    fn default() -> Self {
        Self {
            header: Header {
                stamp: Time::new(0, 0),
                frame_id: String::new(),
            },
            name: Vec::new(),
            position: Vec::new(),
            velocity: Vec::new(),
            effort: Vec::new(),
        }
    }
}

fn zenoh_error(e: impl std::fmt::Display) -> InterfaceError {
    InterfaceError::Zenoh(e.to_string())
}

pub struct CommunicationLayer {
    session: Session,
    joint_state_key: String,
    joint_command_key: String,
    frame_id: String,
}

impl CommunicationLayer {
    pub async fn new(topics: &TopicConfig) -> Result<Self, InterfaceError> {
        let config = zenoh::config::Config::default();
        let session = zenoh::open(config).await.map_err(zenoh_error)?;

        Ok(Self {
            session,
            joint_state_key: topics.joint_state_key.clone(),
            joint_command_key: topics.joint_command_key.clone(),
            frame_id: topics.frame_id.clone(),
        })
    }

    pub async fn publish_joint_command(&self, joints: &Joints) -> Result<(), InterfaceError> {
        let msg = joint_command_message(joints, &self.frame_id);
        let payload = encode_joint_state(&msg)?;
        self.session.put(&self.joint_command_key, payload).await.map_err(zenoh_error)?;
        debug!("Published joint command on {}", self.joint_command_key);
        Ok(())
    }

    /// Calls `callback` with every decodable joint state published on the state key.
    pub async fn subscribe_joint_state<F>(&self, callback: F) -> Result<(), InterfaceError>
    where F: Fn(Joints) + Send + Sync + 'static
    {
        let subscriber = self.session.declare_subscriber(&self.joint_state_key).await.map_err(zenoh_error)?;

        tokio::spawn(async move {
            while let Ok(sample) = subscriber.recv_async().await {
                let payload = sample.payload().to_bytes();
                match decode_joint_state(&payload) {
                    Ok(msg) => match joints_from_message(&msg) {
                        Some(joints) => callback(joints),
                        None => warn!("JointState carries {} positions, need 6", msg.position.len()),
                    },
                    Err(e) => warn!("Failed to deserialize JointState: {e}"),
                }
            }
        });
        Ok(())
    }
}

/// CDR little-endian, including the 4-byte encapsulation header ROS 2 expects.
pub fn encode_joint_state(msg: &JointState) -> Result<Vec<u8>, InterfaceError> {
    Ok(cdr::serialize::<_, _, cdr::CdrLe>(msg, cdr::Infinite)?)
}

/// Reads the encapsulation header to pick the byte order.
pub fn decode_joint_state(payload: &[u8]) -> Result<JointState, InterfaceError> {
    Ok(cdr::deserialize::<JointState>(payload)?)
}

pub fn joint_command_message(joints: &Joints, frame_id: &str) -> JointState {
    let mut msg = JointState::default();

    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    msg.header.stamp = Time::new(stamp_seconds(now), now.subsec_nanos());
    msg.header.frame_id = frame_id.to_string();

    msg.name = JOINT_NAMES.iter().map(|name| name.to_string()).collect();
    msg.position = joints.to_vec();
    msg
}

/// `builtin_interfaces/Time` seconds are an `i32`; later instants saturate.
fn stamp_seconds(since_epoch: Duration) -> i32 {
    i32::try_from(since_epoch.as_secs()).unwrap_or(i32::MAX)
}

/// Joint angles in base-to-flange order. Matched by name when every UR joint
/// name is present, otherwise the first six positions are taken as they come.
pub fn joints_from_message(msg: &JointState) -> Option<Joints> {
    joints_by_name(msg).or_else(|| msg.position.get(..6)?.try_into().ok())
}

fn joints_by_name(msg: &JointState) -> Option<Joints> {
    let mut joints = [0.0; 6];
    for (angle, name) in joints.iter_mut().zip(JOINT_NAMES) {
        let index = msg.name.iter().position(|n| n == name)?;
        *angle = *msg.position.get(index)?;
    }
    Some(joints)
}
