/*
    Chassis Resources
    - The chassis is driven by exactly one task at a time (teleop XOR autonomous)
    - acquire() fails fast with ChassisBusy instead of waiting or racing
*/

// Resources
use crate::control::pid_control::PIDcontrol;
use crate::resources::config::ChassisConfig;
use crate::resources::error::Error;
use crate::resources::hardware::Motor;
use crate::resources::odom_resources::OdomHandler;
use crate::tasks::chassis::Drive;

// Library
use core::sync::atomic::AtomicI32;
use core::sync::atomic::AtomicU8;
use core::sync::atomic::Ordering;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/* --------------------------- Driver -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Driver {
    None = 0,
    Teleop = 1,
    Autonomous = 2,
}

impl Driver {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Driver::Teleop,
            2 => Driver::Autonomous,
            _ => Driver::None,
        }
    }
}

/* --------------------------- Motion Command -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionCommand {
    TurnToAngle(f32),
    DriveToPoint { x: f32, y: f32, reverse: bool },
    DriveDistance { delta_cm: f32, max_mv: Option<i32> },
    DriveDistanceTimeout { delta_cm: f32, timeout_ms: u64, max_mv: Option<i32> },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionOutcome {
    Settled,
    TimedOut,
}

impl MotionOutcome {
    pub const fn is_settled(&self) -> bool {
        matches!(self, MotionOutcome::Settled)
    }

    /// Settled only if both phases settled.
    pub const fn and(self, other: MotionOutcome) -> MotionOutcome {
        match (self, other) {
            (MotionOutcome::Settled, MotionOutcome::Settled) => MotionOutcome::Settled,
            _ => MotionOutcome::TimedOut,
        }
    }
}

/* --------------------------- Chassis State -------------------------- */
pub struct ChassisState<M: Motor> {
    pub(crate) left: M,
    pub(crate) right: M,
    pub(crate) heading_pid: PIDcontrol,
    pub(crate) distance_pid: PIDcontrol,
}

/* --------------------------- Chassis Handle -------------------------- */
pub struct Chassis<M: Motor> {
    state: Mutex<CriticalSectionRawMutex, ChassisState<M>>,
    pub(crate) config: ChassisConfig,
    owner: AtomicU8,
    voltage_percent: AtomicU8,
    commanded_left_mv: AtomicI32,
    commanded_right_mv: AtomicI32,
}

impl<M: Motor> Chassis<M> {
    pub fn new(mut left: M, mut right: M, config: ChassisConfig) -> Self {
        left.set_brake_mode(config.brake_mode);
        right.set_brake_mode(config.brake_mode);

        Self {
            state: Mutex::new(ChassisState {
                left,
                right,
                heading_pid: PIDcontrol::new(config.heading_pid),
                distance_pid: PIDcontrol::new(config.distance_pid),
            }),
            config,
            owner: AtomicU8::new(Driver::None as u8),
            voltage_percent: AtomicU8::new(100),
            commanded_left_mv: AtomicI32::new(0),
            commanded_right_mv: AtomicI32::new(0),
        }
    }

    /// Takes exclusive control of the chassis for `driver`.
    pub fn acquire<'a>(&'a self, driver: Driver, odom: &'a OdomHandler) -> Result<Drive<'a, M>, Error> {
        match self.state.try_lock() {
            Ok(state) => {
                self.owner.store(driver as u8, Ordering::Relaxed);
                log::info!("chassis acquired by {:?}", driver);
                Ok(Drive::new(state, self, odom, driver))
            }
            Err(_) => Err(Error::ChassisBusy { owner: self.owner() }),
        }
    }

    pub(crate) fn release(&self, driver: Driver) {
        self.owner.store(Driver::None as u8, Ordering::Relaxed);
        log::info!("chassis released by {:?}", driver);
    }

    pub fn owner(&self) -> Driver {
        return Driver::from_u8(self.owner.load(Ordering::Relaxed));
    }

    pub fn config(&self) -> &ChassisConfig {
        &self.config
    }

    /// Scales every closed-loop primitive's output, 0..=100.
    pub fn set_voltage_percent(&self, percent: u8) {
        self.voltage_percent.store(percent.min(100), Ordering::Relaxed);
    }

    pub fn get_voltage_percent(&self) -> u8 {
        return self.voltage_percent.load(Ordering::Relaxed);
    }

    pub(crate) fn set_commanded_mv(&self, left: i32, right: i32) {
        self.commanded_left_mv.store(left, Ordering::Relaxed);
        self.commanded_right_mv.store(right, Ordering::Relaxed);
    }

    pub fn get_commanded_mv(&self) -> (i32, i32) {
        return (
            self.commanded_left_mv.load(Ordering::Relaxed),
            self.commanded_right_mv.load(Ordering::Relaxed),
        );
    }
}
