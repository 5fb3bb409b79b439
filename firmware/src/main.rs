/*
* Launcher Simulator
*  - Runs the firmware tasks on the host against the simulated robot
*  - Autonomous script first, then a scripted teleop session
*  - RUST_LOG selects the log level (default info)
*/

// Resources
use launcher_firmware::resources::config::FLYWHEEL_FILTER_WINDOW;
use launcher_firmware::resources::MotionCommand;
use launcher_firmware::resources::FireRequest;
use launcher_firmware::resources::IntakeDirection;
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

// Control
use launcher_firmware::control::Pose;

// Tasks
use launcher_firmware::tasks::autonomous::run_autonomous_task;
use launcher_firmware::tasks::autonomous::CancelToken;
use launcher_firmware::tasks::autonomous::Step;
use launcher_firmware::tasks::drive::run_drive_task;
use launcher_firmware::tasks::drive::OperatorFrame;
use launcher_firmware::tasks::drive::OperatorInput;
use launcher_firmware::tasks::fire::run_fire_task;
use launcher_firmware::tasks::flywheel::FlywheelController;
use launcher_firmware::tasks::odometry::OdometryTracker;
use launcher_firmware::tasks::telemetry::run_telemetry_task;
use launcher_firmware::tasks::telemetry::Telemetry;
use launcher_firmware::tasks::telemetry::TELEMETRY_LINE_SIZE;

// Library
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embassy_time::Instant;
use embassy_time::Timer;
use static_cell::StaticCell;

type SimRobot = Robot<SimMotor, SimSolenoid>;

static ROBOT: StaticCell<SimRobot> = StaticCell::new();
static CANCEL: CancelToken = CancelToken::new();
static AUTONOMOUS_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

const RUN_TIME_MS: u64 = 14_000;

const AUTONOMOUS_SCRIPT: [Step; 10] = [
    Step::FlywheelMove(2_000.0),
    Step::FlywheelEnable,
    Step::Motion(MotionCommand::DriveToPoint { x: 60.0, y: 30.0, reverse: false }),
    Step::Motion(MotionCommand::TurnToAngle(-307.0)),
    Step::Wait(500),
    Step::Repeat { count: 3, timeout_ms: None, inter_pulse_ms: None },
    Step::SetVoltagePercent(50),
    Step::Intake(IntakeDirection::Forward),
    Step::Motion(MotionCommand::DriveDistanceTimeout { delta_cm: -40.0, timeout_ms: 2_500, max_mv: None }),
    Step::Intake(IntakeDirection::Stop),
];

/* --------------------------- Operator -------------------------- */
/// Replays a fixed teleop session keyed on time since the first read.
struct ScriptedOperator {
    start: Option<Instant>,
    fired: bool,
    angled: bool,
}

impl OperatorInput for ScriptedOperator {
    fn read(&mut self) -> OperatorFrame {
        let start = *self.start.get_or_insert_with(Instant::now);
        let t = start.elapsed().as_millis();
        let mut frame = OperatorFrame::idle();

        match t {
            0..=999 => frame.power = 0.5,
            1_000..=1_499 => frame.turn = 0.25,
            1_500..=2_499 => frame.intake = IntakeDirection::Forward,
            _ => {}
        }
        if t >= 1_500 && !self.angled {
            self.angled = true;
            frame.toggle_angle = true;
        }
        if t >= 2_500 && !self.fired {
            self.fired = true;
            frame.fire = Some(FireRequest::Single);
        }

        return frame;
    }
}

/* --------------------------- Tasks -------------------------- */
#[embassy_executor::task]
async fn odometry_task(mut tracker: OdometryTracker<SimEncoder, SimGyro>, robot: &'static SimRobot) {
    tracker.run_odometry_task(&robot.odometry).await;
}

#[embassy_executor::task]
async fn flywheel_task(
    mut controller: FlywheelController<SimMotor, SimEncoder, FLYWHEEL_FILTER_WINDOW>,
    robot: &'static SimRobot,
) {
    controller.run_flywheel_task(&robot.flywheel).await;
}

#[embassy_executor::task]
async fn fire_task(robot: &'static SimRobot) {
    run_fire_task(robot).await;
}

#[embassy_executor::task]
async fn telemetry_task(robot: &'static SimRobot) {
    run_telemetry_task(robot).await;
}

#[embassy_executor::task]
async fn autonomous_task(robot: &'static SimRobot) {
    match run_autonomous_task(robot, &AUTONOMOUS_SCRIPT, &CANCEL).await {
        Ok(outcome) => log::info!("autonomous: {:?}", outcome),
        Err(e) => log::error!("autonomous could not start: {}", e),
    }
    AUTONOMOUS_DONE.signal(());
}

#[embassy_executor::task]
async fn drive_task(robot: &'static SimRobot) {
    AUTONOMOUS_DONE.wait().await;
    let mut input = ScriptedOperator { start: None, fired: false, angled: false };
    run_drive_task(robot, &mut input).await;
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = sim_robot_config();
    let world = SimWorld::new(SimConfig::for_robot(&config));

    let robot: &'static SimRobot = match Robot::new(config, world.parts()) {
        Ok(robot) => ROBOT.init(robot),
        Err(e) => {
            log::error!("invalid robot config: {}", e);
            std::process::exit(1);
        }
    };

    let tracker = match OdometryTracker::new(
        world.encoder(EncoderPort::Forward),
        world.encoder(EncoderPort::Lateral),
        world.gyro(),
        config.odometry,
        Pose::origin(),
    ) {
        Ok(tracker) => tracker,
        Err(e) => {
            log::error!("invalid odometry config: {}", e);
            std::process::exit(1);
        }
    };

    let flywheel = match FlywheelController::new(
        world.motor(MotorPort::Flywheel),
        world.encoder(EncoderPort::Flywheel),
        config.flywheel,
    ) {
        Ok(flywheel) => flywheel,
        Err(e) => {
            log::error!("invalid flywheel config: {}", e);
            std::process::exit(1);
        }
    };

    spawner.must_spawn(odometry_task(tracker, robot));
    spawner.must_spawn(flywheel_task(flywheel, robot));
    spawner.must_spawn(fire_task(robot));
    spawner.must_spawn(telemetry_task(robot));
    spawner.must_spawn(autonomous_task(robot));
    spawner.must_spawn(drive_task(robot));

    let start = Instant::now();
    Timer::after(Duration::from_millis(RUN_TIME_MS)).await;

    let mut line = heapless::String::<TELEMETRY_LINE_SIZE>::new();
    let _ = Telemetry::capture(robot, start.elapsed().as_millis()).write_to_buffer(&mut line);
    log::info!("final: {}", line);
    log::info!("true pose: {:?}", world.true_pose());
    std::process::exit(0);
}
