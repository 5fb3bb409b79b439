/*
*  Default Robot Config
*
*  Drivetrain
*  - Two 2.75 in tracking wheels (forward, lateral) on rotation sensors, 36000 ticks/rev
*  - Gyro supplies the heading delta
*  Launcher
*  - Flywheel on a rotation sensor, velocity PID with voltage feedforward
*  - Indexer plunger on a single solenoid
*/

// Resources
use crate::control::odometry::OdomConfig;
use crate::control::pid_control::Feedforward;
use crate::control::pid_control::PIDConfig;
use crate::resources::error::ConfigError;
use crate::resources::hardware::BrakeMode;

/* --------------------------- Units -------------------------- */
pub const INCH_TO_CM: f32 = 2.54;
pub const MAX_VOLTAGE_MV: i32 = 12_000;

/* --------------------------- Task Periods -------------------------- */
pub const DRIVE_SAMPLING_MS: u64 = 10;
pub const TELEOP_SAMPLING_MS: u64 = 5;
pub const ODOM_SAMPLING_MS: u64 = 10;
pub const FLYWHEEL_SAMPLING_MS: u64 = 10;
pub const TELEMETRY_SAMPLING_MS: u64 = 20;
pub const TELEMETRY_REPORT_EVERY: u32 = 25; // one log line every 500 ms
pub const CHASSIS_RETRY_MS: u64 = 100;

/* --------------------------- Chassis PID Config -------------------------- */
pub const DEFAULT_HEADING_PID: PIDConfig = PIDConfig::new(500.0, 0.0, 40.0)
    .with_integral_band(5.0, 2_000.0)
    .with_tolerance(1.0, 5)
    .with_period(DRIVE_SAMPLING_MS);

pub const DEFAULT_DISTANCE_PID: PIDConfig = PIDConfig::new(175.0, 0.0, 13.5)
    .with_integral_band(5.0, 2_000.0)
    .with_tolerance(1.0, 5)
    .with_period(DRIVE_SAMPLING_MS);

pub const TURN_TIMEOUT_MS: u64 = 3_000;

/* --------------------------- Odometry Config -------------------------- */
pub const DEFAULT_ODOM_CONFIG: OdomConfig = OdomConfig {
    wheel_diameter_cm: 2.75 * INCH_TO_CM,
    ticks_per_rev: 36_000,
    forward_offset_cm: 0.0,
    lateral_offset_cm: 5.3 * INCH_TO_CM,
};

/* --------------------------- Flywheel Config -------------------------- */
pub const DEFAULT_FLYWHEEL_PID: PIDConfig = PIDConfig::new(10.5, 0.0, 0.0)
    .with_feedforward(Feedforward::Linear(3.0))
    .with_integral_band(800.0, 4_000.0)
    .with_tolerance(50.0, 10)
    .with_period(FLYWHEEL_SAMPLING_MS);

pub const FLYWHEEL_FILTER_WINDOW: usize = 1 << 3;
pub const LAUNCH_RPM: f32 = 2_000.0;
pub const ANGLED_LAUNCH_RPM: f32 = 1_900.0;

/* --------------------------- Indexer Config -------------------------- */
pub const INDEXER_PULSE_MS: u64 = 50;
pub const INDEXER_INTER_PULSE_MS: u64 = 350;
pub const INDEXER_PULSE_TIMEOUT_MS: u64 = 500;
pub const INDEXER_BURST_COUNT: u32 = 3;

/* --------------------------- Runtime Config -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChassisConfig {
    pub heading_pid: PIDConfig,
    pub distance_pid: PIDConfig,
    pub turn_timeout_ms: u64,
    pub max_voltage_mv: i32,
    pub brake_mode: BrakeMode,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            heading_pid: DEFAULT_HEADING_PID,
            distance_pid: DEFAULT_DISTANCE_PID,
            turn_timeout_ms: TURN_TIMEOUT_MS,
            max_voltage_mv: MAX_VOLTAGE_MV,
            brake_mode: BrakeMode::Brake,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlywheelConfig {
    pub pid: PIDConfig,
    pub ticks_per_rev: u32,
    pub launch_rpm: f32,
    pub angled_launch_rpm: f32,
}

impl Default for FlywheelConfig {
    fn default() -> Self {
        Self {
            pid: DEFAULT_FLYWHEEL_PID,
            ticks_per_rev: 36_000,
            launch_rpm: LAUNCH_RPM,
            angled_launch_rpm: ANGLED_LAUNCH_RPM,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndexerConfig {
    pub pulse_ms: u64,
    pub inter_pulse_ms: u64,
    pub pulse_timeout_ms: u64,
    pub burst_count: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            pulse_ms: INDEXER_PULSE_MS,
            inter_pulse_ms: INDEXER_INTER_PULSE_MS,
            pulse_timeout_ms: INDEXER_PULSE_TIMEOUT_MS,
            burst_count: INDEXER_BURST_COUNT,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RobotConfig {
    pub chassis: ChassisConfig,
    pub odometry: OdomConfig,
    pub flywheel: FlywheelConfig,
    pub indexer: IndexerConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            chassis: ChassisConfig::default(),
            odometry: DEFAULT_ODOM_CONFIG,
            flywheel: FlywheelConfig::default(),
            indexer: IndexerConfig::default(),
        }
    }
}

impl RobotConfig {
    /// Checked once at construction; a failure is a programming error in the caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chassis.heading_pid.validate("heading")?;
        self.chassis.distance_pid.validate("distance")?;
        if self.chassis.max_voltage_mv <= 0 || self.chassis.max_voltage_mv > MAX_VOLTAGE_MV {
            return Err(ConfigError::InvalidVoltage("chassis"));
        }
        if self.chassis.turn_timeout_ms == 0 {
            return Err(ConfigError::ZeroPeriod("turn timeout"));
        }

        self.odometry.validate()?;

        self.flywheel.pid.validate("flywheel")?;
        if self.flywheel.ticks_per_rev == 0 {
            return Err(ConfigError::ZeroTicksPerRevolution("flywheel"));
        }

        if self.indexer.pulse_timeout_ms == 0 {
            return Err(ConfigError::ZeroPeriod("indexer"));
        }
        Ok(())
    }
}
