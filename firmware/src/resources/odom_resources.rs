/*
    Odometry Resources
    - Single writer: the odometry task
    - Readers copy the whole state under a critical section, never a torn pose
*/

// Resources
use crate::control::odometry::Pose;

// Library
use core::cell::Cell;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/* --------------------------- Odom State -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdomState {
    pub pose: Pose,
    pub forward_cm: f32,
    pub tick: u32,
}

/* --------------------------- Odom Handle -------------------------- */
pub struct OdomHandler {
    state: Mutex<CriticalSectionRawMutex, Cell<OdomState>>,
}

impl OdomHandler {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(OdomState {
                pose: Pose::origin(),
                forward_cm: 0.0,
                tick: 0,
            })),
        }
    }

    pub fn publish(&self, state: OdomState) {
        self.state.lock(|cell| cell.set(state));
    }

    pub fn snapshot(&self) -> OdomState {
        return self.state.lock(|cell| cell.get());
    }

    pub fn position(&self) -> Pose {
        self.snapshot().pose
    }

    pub fn forward_cm(&self) -> f32 {
        self.snapshot().forward_cm
    }

    pub fn tick(&self) -> u32 {
        self.snapshot().tick
    }
}

impl Default for OdomHandler {
    fn default() -> Self {
        Self::new()
    }
}
