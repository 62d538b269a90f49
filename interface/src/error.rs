use kinematics::KinematicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("CDR error: {0}")]
    Cdr(#[from] cdr::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
