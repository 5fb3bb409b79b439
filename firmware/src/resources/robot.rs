/*
    Robot Aggregate
    - Constructed once at startup, lives for the whole power cycle
    - Passed by reference to every task at spawn time
*/

// Resources
use crate::control::odometry::Pose;
use crate::resources::chassis_resources::Chassis;
use crate::resources::chassis_resources::Driver;
use crate::resources::config::RobotConfig;
use crate::resources::error::ConfigError;
use crate::resources::error::Error;
use crate::resources::flywheel_resources::FlywheelHandler;
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;
use crate::resources::mechanism_resources::FireRequest;
use crate::resources::mechanism_resources::Indexer;
use crate::resources::mechanism_resources::Intake;
use crate::resources::mechanism_resources::Piston;
use crate::resources::odom_resources::OdomHandler;
use crate::tasks::chassis::Drive;

// Library
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

pub const FIRE_CHANNEL_SIZE: usize = 4;

/* --------------------------- Parts -------------------------- */
/// Actuators owned by the aggregate. Sensors and the flywheel motor belong to
/// their background tasks instead.
pub struct RobotParts<M: Motor, S: Solenoid> {
    pub left: M,
    pub right: M,
    pub intake: M,
    pub indexer: S,
    pub angle_changer: S,
    pub endgame: S,
}

/* --------------------------- Robot -------------------------- */
pub struct Robot<M: Motor, S: Solenoid> {
    pub config: RobotConfig,
    pub odometry: OdomHandler,
    pub chassis: Chassis<M>,
    pub flywheel: FlywheelHandler,
    pub intake: Intake<M>,
    pub indexer: Indexer<S>,
    pub angle_changer: Piston<S>,
    pub endgame: Piston<S>,
    pub fire_requests: Channel<CriticalSectionRawMutex, FireRequest, FIRE_CHANNEL_SIZE>,
}

impl<M: Motor, S: Solenoid> Robot<M, S> {
    pub fn new(config: RobotConfig, parts: RobotParts<M, S>) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            odometry: OdomHandler::new(),
            chassis: Chassis::new(parts.left, parts.right, config.chassis),
            flywheel: FlywheelHandler::new(),
            intake: Intake::new(parts.intake),
            indexer: Indexer::new(parts.indexer, config.indexer),
            angle_changer: Piston::new(parts.angle_changer),
            endgame: Piston::new(parts.endgame),
            fire_requests: Channel::new(),
        })
    }

    /// Exclusive chassis control for `driver`; fails fast if another task drives.
    pub fn drive(&self, driver: Driver) -> Result<Drive<'_, M>, Error> {
        self.chassis.acquire(driver, &self.odometry)
    }

    pub fn position(&self) -> Pose {
        self.odometry.position()
    }

    /// Flips the launcher angle and retargets the flywheel to match.
    pub async fn toggle_angle(&self) {
        let angled = self.angle_changer.toggle().await;
        let rpm = if angled { self.config.flywheel.angled_launch_rpm } else { self.config.flywheel.launch_rpm };
        self.flywheel.move_rpm(rpm);
    }

    pub fn request_fire(&self, request: FireRequest) {
        if self.fire_requests.try_send(request).is_err() {
            log::warn!("fire request {:?} dropped, queue full", request);
        }
    }
}
