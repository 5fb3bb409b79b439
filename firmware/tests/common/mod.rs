#![allow(dead_code)]

use core::future::Future;

use embassy_futures::select::select;
use embassy_futures::select::Either;
use launcher_firmware::control::Pose;
use launcher_firmware::resources::config::RobotConfig;
use launcher_firmware::resources::config::FLYWHEEL_FILTER_WINDOW;
use launcher_firmware::resources::OdomHandler;
use launcher_firmware::resources::Robot;
use launcher_firmware::sim::sim_robot_config;
use launcher_firmware::sim::EncoderPort;
use launcher_firmware::sim::MotorPort;
use launcher_firmware::sim::SimConfig;
use launcher_firmware::sim::SimEncoder;
use launcher_firmware::sim::SimGyro;
use launcher_firmware::sim::SimMotor;
use launcher_firmware::sim::SimSolenoid;
use launcher_firmware::sim::SimWorld;
use launcher_firmware::tasks::flywheel::FlywheelController;
use launcher_firmware::tasks::odometry::OdometryTracker;

pub type SimRobot = Robot<SimMotor, SimSolenoid>;
pub type SimTracker = OdometryTracker<SimEncoder, SimGyro>;
pub type SimFlywheel = FlywheelController<SimMotor, SimEncoder, FLYWHEEL_FILTER_WINDOW>;

pub struct Bench {
    pub world: SimWorld,
    pub robot: SimRobot,
    pub tracker: SimTracker,
}

pub fn bench() -> Bench {
    bench_with(sim_robot_config(), Pose::origin())
}

pub fn bench_with(config: RobotConfig, initial: Pose) -> Bench {
    let world = SimWorld::new(SimConfig::for_robot(&config));
    let robot = Robot::new(config, world.parts()).unwrap();
    let tracker = OdometryTracker::new(
        world.encoder(EncoderPort::Forward),
        world.encoder(EncoderPort::Lateral),
        world.gyro(),
        config.odometry,
        initial,
    )
    .unwrap();

    Bench { world, robot, tracker }
}

pub fn flywheel(world: &SimWorld, config: &RobotConfig) -> SimFlywheel {
    FlywheelController::new(world.motor(MotorPort::Flywheel), world.encoder(EncoderPort::Flywheel), config.flywheel)
        .unwrap()
}

/// Runs `fut` while the odometry loop keeps publishing the pose.
pub async fn with_odometry<F: Future>(tracker: &mut SimTracker, odom: &OdomHandler, fut: F) -> F::Output {
    match select(tracker.run_odometry_task(odom), fut).await {
        Either::First(()) => panic!("odometry loop exited"),
        Either::Second(output) => output,
    }
}
