/*
    Host Simulation
    - First-order drivetrain and flywheel driven by commanded voltage
    - State is integrated up to "now" on every access, so readers and
      writers see physics that advanced with the embassy clock
    - Tracking wheels see the offset roll during rotation, like the real ones
*/

// Resources
use crate::resources::config::RobotConfig;
use crate::resources::config::MAX_VOLTAGE_MV;
use crate::resources::hardware::BrakeMode;
use crate::resources::hardware::Gyro;
use crate::resources::hardware::Motor;
use crate::resources::hardware::RotationSensor;
use crate::resources::hardware::Solenoid;
use crate::resources::robot::RobotParts;

// Control
use crate::control::angle::rad_to_deg;
use crate::control::odometry::OdomConfig;
use crate::control::odometry::Pose;
use crate::control::pid_control::PIDConfig;

// Library
use embassy_time::Instant;
use libm::cosf;
use libm::expf;
use libm::sinf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

const STEP_S: f32 = 0.001;

/* --------------------------- Sim Config -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SimConfig {
    /// Wheel speed at full voltage.
    pub max_speed_cm_s: f32,
    pub drive_tau_s: f32,
    pub track_width_cm: f32,
    /// Steady-state flywheel speed per millivolt.
    pub flywheel_rpm_per_mv: f32,
    pub flywheel_tau_s: f32,
    pub flywheel_ticks_per_rev: u32,
    pub odometry: OdomConfig,
}

impl SimConfig {
    pub fn for_robot(config: &RobotConfig) -> Self {
        Self {
            max_speed_cm_s: 150.0,
            drive_tau_s: 0.03,
            track_width_cm: 30.0,
            flywheel_rpm_per_mv: 1.0 / 3.0,
            flywheel_tau_s: 0.25,
            flywheel_ticks_per_rev: config.flywheel.ticks_per_rev,
            odometry: config.odometry,
        }
    }
}

/// Gains tuned for the simulated drivetrain. The flywheel defaults already fit.
pub fn sim_robot_config() -> RobotConfig {
    let mut config = RobotConfig::default();
    config.chassis.heading_pid = PIDConfig::new(120.0, 0.0, 0.0)
        .with_tolerance(1.0, 5)
        .with_period(config.chassis.heading_pid.period_ms);
    config.chassis.distance_pid = PIDConfig::new(400.0, 0.0, 0.0)
        .with_tolerance(1.0, 5)
        .with_period(config.chassis.distance_pid.period_ms);
    config
}

/* --------------------------- Physics -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotorPort {
    DriveLeft,
    DriveRight,
    Flywheel,
    Intake,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EncoderPort {
    Forward,
    Lateral,
    Flywheel,
}

struct SolenoidLog {
    name: &'static str,
    extended: bool,
    transitions: Vec<bool>,
}

struct SimState {
    config: SimConfig,
    last: Instant,
    left_mv: i32,
    right_mv: i32,
    flywheel_mv: i32,
    intake_mv: i32,
    brake_mode: Option<BrakeMode>,
    v_left: f32,
    v_right: f32,
    x: f32,
    y: f32,
    theta: f32,
    travel_cm: f32,
    jammed: bool,
    flywheel_rpm: f32,
    flywheel_revs: f64,
    drive_mv_range: (i32, i32),
    solenoids: Vec<SolenoidLog>,
}

impl SimState {
    fn advance(&mut self, now: Instant) {
        let mut remaining = (now - self.last).as_micros() as f32 / 1_000_000.0;
        self.last = now;

        while remaining > 0.0 {
            let dt = remaining.min(STEP_S);
            remaining -= dt;
            self.step(dt);
        }
    }

    fn step(&mut self, dt: f32) {
        let config = self.config;
        let per_mv = config.max_speed_cm_s / MAX_VOLTAGE_MV as f32;
        let blend = 1.0 - expf(-dt / config.drive_tau_s);

        if self.jammed {
            self.v_left = 0.0;
            self.v_right = 0.0;
        } else {
            self.v_left += (self.left_mv as f32 * per_mv - self.v_left) * blend;
            self.v_right += (self.right_mv as f32 * per_mv - self.v_right) * blend;
        }

        let v = 0.5 * (self.v_left + self.v_right);
        let omega = (self.v_right - self.v_left) / config.track_width_cm;
        let mid = self.theta + 0.5 * omega * dt;

        self.x += v * cosf(mid) * dt;
        self.y += v * sinf(mid) * dt;
        self.theta += omega * dt;
        self.travel_cm += v * dt;

        let target_rpm = self.flywheel_mv as f32 * config.flywheel_rpm_per_mv;
        self.flywheel_rpm += (target_rpm - self.flywheel_rpm) * (1.0 - expf(-dt / config.flywheel_tau_s));
        self.flywheel_revs += (self.flywheel_rpm * dt / 60.0) as f64;
    }

    fn encoder_ticks(&self, port: EncoderPort) -> i32 {
        let odom = self.config.odometry;
        let cm = match port {
            EncoderPort::Forward => self.travel_cm + odom.forward_offset_cm * self.theta,
            EncoderPort::Lateral => odom.lateral_offset_cm * self.theta,
            EncoderPort::Flywheel => {
                let ticks = self.flywheel_revs * self.config.flywheel_ticks_per_rev as f64;
                return ticks as i64 as i32;
            }
        };
        return (cm / odom.cm_per_tick()) as i64 as i32;
    }
}

/* --------------------------- Sim World -------------------------- */
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                config,
                last: Instant::now(),
                left_mv: 0,
                right_mv: 0,
                flywheel_mv: 0,
                intake_mv: 0,
                brake_mode: None,
                v_left: 0.0,
                v_right: 0.0,
                x: 0.0,
                y: 0.0,
                theta: 0.0,
                travel_cm: 0.0,
                jammed: false,
                flywheel_rpm: 0.0,
                flywheel_revs: 0.0,
                drive_mv_range: (0, 0),
                solenoids: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.advance(Instant::now());
        state
    }

    pub fn motor(&self, port: MotorPort) -> SimMotor {
        SimMotor { world: self.clone(), port }
    }

    pub fn encoder(&self, port: EncoderPort) -> SimEncoder {
        SimEncoder { world: self.clone(), port }
    }

    pub fn gyro(&self) -> SimGyro {
        SimGyro { world: self.clone() }
    }

    pub fn solenoid(&self, name: &'static str) -> SimSolenoid {
        let mut state = self.lock();
        state.solenoids.push(SolenoidLog { name, extended: false, transitions: Vec::new() });
        SimSolenoid { world: self.clone(), id: state.solenoids.len() - 1 }
    }

    /// Blocks the wheels, as when the robot is pinned against a field element.
    pub fn set_jammed(&self, jammed: bool) {
        self.lock().jammed = jammed;
    }

    pub fn true_pose(&self) -> Pose {
        let state = self.lock();
        Pose::new(state.x, state.y, rad_to_deg(state.theta))
    }

    pub fn flywheel_rpm(&self) -> f32 {
        self.lock().flywheel_rpm
    }

    pub fn drive_mv(&self) -> (i32, i32) {
        let state = self.lock();
        (state.left_mv, state.right_mv)
    }

    pub fn intake_mv(&self) -> i32 {
        self.lock().intake_mv
    }

    pub fn brake_mode(&self) -> Option<BrakeMode> {
        self.lock().brake_mode
    }

    /// Lowest and highest voltage written to either drive side since the last reset.
    pub fn drive_mv_range(&self) -> (i32, i32) {
        self.lock().drive_mv_range
    }

    pub fn reset_drive_mv_range(&self) {
        self.lock().drive_mv_range = (0, 0);
    }

    /// Every state change written to the named solenoid, oldest first.
    pub fn solenoid_transitions(&self, name: &str) -> Vec<bool> {
        let state = self.lock();
        state
            .solenoids
            .iter()
            .find(|log| log.name == name)
            .map(|log| log.transitions.clone())
            .unwrap_or_default()
    }

    pub fn parts(&self) -> RobotParts<SimMotor, SimSolenoid> {
        RobotParts {
            left: self.motor(MotorPort::DriveLeft),
            right: self.motor(MotorPort::DriveRight),
            intake: self.motor(MotorPort::Intake),
            indexer: self.solenoid("indexer"),
            angle_changer: self.solenoid("angle_changer"),
            endgame: self.solenoid("endgame"),
        }
    }
}

/* --------------------------- Devices -------------------------- */
pub struct SimMotor {
    world: SimWorld,
    port: MotorPort,
}

impl Motor for SimMotor {
    fn set_voltage(&mut self, mv: i32) {
        let mv = mv.clamp(-MAX_VOLTAGE_MV, MAX_VOLTAGE_MV);
        let mut state = self.world.lock();
        match self.port {
            MotorPort::DriveLeft => state.left_mv = mv,
            MotorPort::DriveRight => state.right_mv = mv,
            MotorPort::Flywheel => state.flywheel_mv = mv,
            MotorPort::Intake => state.intake_mv = mv,
        }
        if matches!(self.port, MotorPort::DriveLeft | MotorPort::DriveRight) {
            let (low, high) = state.drive_mv_range;
            state.drive_mv_range = (low.min(mv), high.max(mv));
        }
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        self.world.lock().brake_mode = Some(mode);
    }
}

pub struct SimEncoder {
    world: SimWorld,
    port: EncoderPort,
}

impl RotationSensor for SimEncoder {
    fn position_ticks(&mut self) -> i32 {
        self.world.lock().encoder_ticks(self.port)
    }
}

pub struct SimGyro {
    world: SimWorld,
}

impl Gyro for SimGyro {
    fn rotation_deg(&mut self) -> f32 {
        rad_to_deg(self.world.lock().theta)
    }
}

pub struct SimSolenoid {
    world: SimWorld,
    id: usize,
}

impl Solenoid for SimSolenoid {
    fn set_extended(&mut self, extended: bool) {
        let mut state = self.world.lock();
        if let Some(log) = state.solenoids.get_mut(self.id) {
            if log.extended != extended {
                log.extended = extended;
                log.transitions.push(extended);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> SimWorld {
        SimWorld::new(SimConfig::for_robot(&sim_robot_config()))
    }

    #[test]
    fn test_encoders_follow_travel_and_offset_roll() {
        let world = world();
        let odom = world.lock().config.odometry;
        {
            let mut state = world.lock();
            state.travel_cm = 10.0;
            state.theta = 1.0;
        }

        let forward = world.encoder(EncoderPort::Forward).position_ticks() as f32 * odom.cm_per_tick();
        let lateral = world.encoder(EncoderPort::Lateral).position_ticks() as f32 * odom.cm_per_tick();
        assert_relative_eq!(forward, 10.0 + odom.forward_offset_cm, epsilon = 1e-2);
        assert_relative_eq!(lateral, odom.lateral_offset_cm, epsilon = 1e-2);
        assert_relative_eq!(world.gyro().rotation_deg(), rad_to_deg(1.0), epsilon = 1e-3);
    }

    #[test]
    fn test_equal_voltage_drives_straight() {
        let world = world();
        let mut state = world.lock();
        state.left_mv = 6_000;
        state.right_mv = 6_000;
        for _ in 0..1_000 {
            state.step(STEP_S);
        }
        // 75 cm/s after a 30 ms lag
        assert!(state.x > 70.0 && state.x < 75.0);
        assert_relative_eq!(state.y, 0.0);
        assert_relative_eq!(state.theta, 0.0);
    }

    #[test]
    fn test_solenoid_records_edges_only() {
        let world = world();
        let mut solenoid = world.solenoid("indexer");
        solenoid.set_extended(false);
        solenoid.set_extended(true);
        solenoid.set_extended(true);
        solenoid.set_extended(false);
        assert_eq!(world.solenoid_transitions("indexer"), [true, false]);
        assert!(world.solenoid_transitions("missing").is_empty());
    }
}
