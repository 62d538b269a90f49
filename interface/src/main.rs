mod communication;
mod config;
mod error;

use brain::RobotBrain;
use communication::CommunicationLayer;
use config::InterfaceConfig;
use error::InterfaceError;
use kinematics::{Joints, UrKinematics};
use log::{error, info, warn};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

/// Environment variable naming the TOML configuration file.
const CONFIG_ENV: &str = "ARM_CONFIG";

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), InterfaceError> {
    info!("Initializing arm control interface...");

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            info!("Loading configuration from {}", path.to_string_lossy());
            InterfaceConfig::load(path)?
        }
        None => InterfaceConfig::default(),
    };

    let kinematics = UrKinematics::new(config.arm)?;
    let mut brain = RobotBrain::new(kinematics, config.selection);
    let comms = CommunicationLayer::new(&config.topics).await?;

    let (measured_tx, mut measured_rx) = watch::channel(None::<Joints>);
    comms
        .subscribe_joint_state(move |joints| {
            measured_tx.send_replace(Some(joints));
        })
        .await?;

    match timeout(config.state_timeout(), measured_rx.changed()).await {
        Ok(Ok(())) => {
            if let Some(measured) = *measured_rx.borrow() {
                info!("Measured joint state: {:?}", measured);
                brain.set_current_joints(measured);
            }
        }
        _ => warn!("No joint state received; planning from the zero configuration"),
    }

    for target in &config.targets {
        match brain.plan_motion(&target.to_transform()) {
            Ok(goal) => info!("Planned motion to {:?}: {:?}", target, goal),
            Err(e) => warn!("Skipping target {:?}: {e}", target),
        }
    }

    // Simulation loop
    while let Some(step) = brain.execute_next_step() {
        info!("Executing step: {:?}", step);
        comms.publish_joint_command(&step).await?;
        sleep(config.step_period()).await;
    }

    info!("Motion complete.");
    Ok(())
}
