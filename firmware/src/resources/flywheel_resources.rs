/*
    Flywheel Resources
    - Written by API callers (teleop, scripts), read every tick by the flywheel task
    - Only the flywheel task touches the velocity PID; it resets it on every new setpoint
*/

// Library
use core::cell::Cell;
use core::sync::atomic::AtomicI32;
use core::sync::atomic::Ordering;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::AtomicF32;

/* --------------------------- Mechanism State -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MechanismState {
    pub enabled: bool,
    pub target_rpm: f32,
    pub use_feedforward: bool,
    /// Bumped by every move_rpm, including a repeat of the same target.
    pub setpoint_revision: u32,
}

/* --------------------------- Flywheel Handle -------------------------- */
pub struct FlywheelHandler {
    state: Mutex<CriticalSectionRawMutex, Cell<MechanismState>>,
    current_rpm: AtomicF32,
    commanded_mv: AtomicI32,
}

impl FlywheelHandler {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(MechanismState {
                enabled: false,
                target_rpm: 0.0,
                use_feedforward: true,
                setpoint_revision: 0,
            })),
            current_rpm: AtomicF32::new(0.0),
            commanded_mv: AtomicI32::new(0),
        }
    }

    fn update(&self, f: impl FnOnce(&mut MechanismState)) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
        });
    }

    pub fn state(&self) -> MechanismState {
        return self.state.lock(|cell| cell.get());
    }

    pub fn enable(&self) {
        self.update(|s| s.enabled = true);
    }

    pub fn disable(&self) {
        self.update(|s| s.enabled = false);
    }

    pub fn toggle(&self) {
        self.update(|s| s.enabled = !s.enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// New velocity setpoint in rpm.
    pub fn move_rpm(&self, target_rpm: f32) {
        self.update(|s| {
            s.target_rpm = target_rpm;
            s.setpoint_revision = s.setpoint_revision.wrapping_add(1);
        });
        log::debug!("flywheel target {} rpm", target_rpm);
    }

    pub fn target(&self) -> f32 {
        self.state().target_rpm
    }

    pub fn use_pidf(&self, enabled: bool) {
        self.update(|s| s.use_feedforward = enabled);
    }

    pub fn set_current_rpm(&self, rpm: f32) {
        self.current_rpm.store(rpm, Ordering::Relaxed);
    }

    /// Latest filtered rate measurement.
    pub fn rpm(&self) -> f32 {
        return self.current_rpm.load(Ordering::Relaxed);
    }

    pub fn set_commanded_mv(&self, mv: i32) {
        self.commanded_mv.store(mv, Ordering::Relaxed);
    }

    pub fn get_commanded_mv(&self) -> i32 {
        return self.commanded_mv.load(Ordering::Relaxed);
    }
}

impl Default for FlywheelHandler {
    fn default() -> Self {
        Self::new()
    }
}
