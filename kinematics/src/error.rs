use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    #[error("Invalid DH parameter for joint {joint}: {message}")]
    InvalidParameter { joint: usize, message: String },

    #[error("Target pose is unreachable")]
    Unreachable,
}
