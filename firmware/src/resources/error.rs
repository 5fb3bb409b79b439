/*
* Error Types
*/

// Resources
use crate::resources::chassis_resources::Driver;

// Library
use core::fmt;

/* --------------------------- Construction Errors -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroTicksPerRevolution(&'static str),
    NonPositiveWheelDiameter,
    NegativeGain(&'static str),
    NegativeBound(&'static str),
    ZeroSettleSamples(&'static str),
    ZeroPeriod(&'static str),
    InvalidVoltage(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTicksPerRevolution(sensor) => write!(f, "{}: ticks per revolution must be non-zero", sensor),
            ConfigError::NonPositiveWheelDiameter => write!(f, "odometry: wheel diameter must be positive"),
            ConfigError::NegativeGain(axis) => write!(f, "{}: gains must not be negative", axis),
            ConfigError::NegativeBound(axis) => write!(f, "{}: tolerance and integral bounds must not be negative", axis),
            ConfigError::ZeroSettleSamples(axis) => write!(f, "{}: settle samples must be non-zero", axis),
            ConfigError::ZeroPeriod(axis) => write!(f, "{}: sampling period must be non-zero", axis),
            ConfigError::InvalidVoltage(axis) => write!(f, "{}: voltage limit out of range", axis),
        }
    }
}

/* --------------------------- Runtime Errors -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The chassis lock is held. `owner` is `Driver::None` while ownership is
    /// being taken or handed back.
    ChassisBusy { owner: Driver },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChassisBusy { owner: Driver::None } => write!(f, "chassis is changing hands"),
            Error::ChassisBusy { owner } => write!(f, "chassis is already driven by {:?}", owner),
        }
    }
}
