/*
    Mechanism Resources
    - Intake roller (open loop)
    - Pistons (angle changer, endgame)
    - Indexer plunger, sequenced by tasks::indexer
*/

// Resources
use crate::resources::config::IndexerConfig;
use crate::resources::config::MAX_VOLTAGE_MV;
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;

// Library
use core::sync::atomic::AtomicBool;
use core::sync::atomic::AtomicI32;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/* --------------------------- Fire Request -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FireRequest {
    Single,
    Burst,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntakeDirection {
    Forward,
    Reverse,
    Stop,
}

/* --------------------------- Intake -------------------------- */
pub struct Intake<M: Motor> {
    motor: Mutex<CriticalSectionRawMutex, M>,
    commanded_mv: AtomicI32,
}

impl<M: Motor> Intake<M> {
    pub fn new(motor: M) -> Self {
        Self {
            motor: Mutex::new(motor),
            commanded_mv: AtomicI32::new(0),
        }
    }

    pub async fn move_voltage(&self, mv: i32) {
        let mv = mv.clamp(-MAX_VOLTAGE_MV, MAX_VOLTAGE_MV);
        self.motor.lock().await.set_voltage(mv);
        self.commanded_mv.store(mv, Ordering::Relaxed);
    }

    pub async fn run(&self, direction: IntakeDirection) {
        let mv = match direction {
            IntakeDirection::Forward => MAX_VOLTAGE_MV,
            IntakeDirection::Reverse => -MAX_VOLTAGE_MV,
            IntakeDirection::Stop => 0,
        };
        // skip redundant writes from the 5 ms teleop loop
        if self.get_commanded_mv() != mv {
            self.move_voltage(mv).await;
        }
    }

    pub async fn forward(&self) {
        self.run(IntakeDirection::Forward).await;
    }

    pub async fn reverse(&self) {
        self.run(IntakeDirection::Reverse).await;
    }

    pub async fn stop(&self) {
        self.move_voltage(0).await;
    }

    pub fn get_commanded_mv(&self) -> i32 {
        return self.commanded_mv.load(Ordering::Relaxed);
    }
}

/* --------------------------- Piston -------------------------- */
pub struct Piston<S: Solenoid> {
    solenoid: Mutex<CriticalSectionRawMutex, S>,
    extended: AtomicBool,
    latched: AtomicBool,
}

impl<S: Solenoid> Piston<S> {
    pub fn new(mut solenoid: S) -> Self {
        solenoid.set_extended(false);
        Self {
            solenoid: Mutex::new(solenoid),
            extended: AtomicBool::new(false),
            latched: AtomicBool::new(false),
        }
    }

    pub async fn set(&self, extended: bool) {
        if self.latched.load(Ordering::Relaxed) {
            return;
        }
        self.solenoid.lock().await.set_extended(extended);
        self.extended.store(extended, Ordering::Relaxed);
    }

    pub async fn toggle(&self) -> bool {
        let extended = !self.is_extended();
        self.set(extended).await;
        return self.is_extended();
    }

    /// One-shot release: extends and ignores every later command.
    pub async fn fire(&self) {
        self.set(true).await;
        if !self.latched.swap(true, Ordering::Relaxed) {
            log::info!("piston fired and latched");
        }
    }

    pub fn is_extended(&self) -> bool {
        return self.extended.load(Ordering::Relaxed);
    }
}

/* --------------------------- Indexer -------------------------- */
pub struct Indexer<S: Solenoid> {
    pub(crate) solenoid: Mutex<CriticalSectionRawMutex, S>,
    pub(crate) extended: AtomicBool,
    pub(crate) pulses: AtomicU32,
    pub(crate) config: IndexerConfig,
}

impl<S: Solenoid> Indexer<S> {
    pub fn new(mut solenoid: S, config: IndexerConfig) -> Self {
        solenoid.set_extended(false);
        Self {
            solenoid: Mutex::new(solenoid),
            extended: AtomicBool::new(false),
            pulses: AtomicU32::new(0),
            config,
        }
    }

    pub fn is_extended(&self) -> bool {
        return self.extended.load(Ordering::Relaxed);
    }

    /// Completed extend/retract cycles since power-up.
    pub fn pulse_count(&self) -> u32 {
        return self.pulses.load(Ordering::Relaxed);
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}
