/*
    Autonomous Script Runner
    - Runs a fixed list of steps synchronously on one task, holding the chassis
    - Cancellation is checked between steps, never mid-primitive
    - Timed-out steps are counted and the script carries on
*/

// Resources
use crate::resources::chassis_resources::Driver;
use crate::resources::chassis_resources::MotionCommand;
use crate::resources::chassis_resources::MotionOutcome;
use crate::resources::error::Error;
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;
use crate::resources::mechanism_resources::IntakeDirection;
use crate::resources::robot::Robot;
use crate::tasks::chassis::Drive;
use crate::tasks::indexer::SequenceOutcome;

// Library
use core::sync::atomic::AtomicBool;
use core::sync::atomic::Ordering;
use embassy_time::Duration;
use embassy_time::Timer;

/* --------------------------- Cancel Token -------------------------- */
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self { cancelled: AtomicBool::new(false) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        return self.cancelled.load(Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/* --------------------------- Steps -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Motion(MotionCommand),
    SetVoltagePercent(u8),
    FlywheelEnable,
    FlywheelDisable,
    FlywheelMove(f32),
    Index(Option<u64>),
    Repeat { count: u32, timeout_ms: Option<u64>, inter_pulse_ms: Option<u64> },
    Intake(IntakeDirection),
    Wait(u64),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScriptOutcome {
    Completed { timed_out: u32 },
    Cancelled { at_step: usize },
}

/* --------------------------- Code -------------------------- */
async fn run_step<M: Motor, S: Solenoid>(robot: &Robot<M, S>, drive: &mut Drive<'_, M>, step: Step) -> bool {
    match step {
        Step::Motion(command) => drive.execute(command).await == MotionOutcome::Settled,
        Step::SetVoltagePercent(percent) => {
            drive.set_voltage_percent(percent);
            true
        }
        Step::FlywheelEnable => {
            robot.flywheel.enable();
            true
        }
        Step::FlywheelDisable => {
            robot.flywheel.disable();
            true
        }
        Step::FlywheelMove(rpm) => {
            robot.flywheel.move_rpm(rpm);
            true
        }
        Step::Index(delay_ms) => {
            robot.indexer.index(delay_ms).await;
            true
        }
        Step::Repeat { count, timeout_ms, inter_pulse_ms } => {
            robot.indexer.repeat(count, timeout_ms, inter_pulse_ms).await == SequenceOutcome::Completed
        }
        Step::Intake(direction) => {
            robot.intake.run(direction).await;
            true
        }
        Step::Wait(ms) => {
            Timer::after(Duration::from_millis(ms)).await;
            true
        }
    }
}

pub async fn run_script<M: Motor, S: Solenoid>(
    robot: &Robot<M, S>,
    drive: &mut Drive<'_, M>,
    steps: &[Step],
    cancel: &CancelToken,
) -> ScriptOutcome {
    let mut timed_out = 0;

    for (index, step) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            drive.stop();
            log::warn!("autonomous cancelled before step {}", index);
            return ScriptOutcome::Cancelled { at_step: index };
        }

        log::debug!("autonomous step {}: {:?}", index, step);
        if !run_step(robot, drive, *step).await {
            timed_out += 1;
        }
    }

    log::info!("autonomous finished, {} step(s) timed out", timed_out);
    return ScriptOutcome::Completed { timed_out };
}

/// Takes the chassis as `Driver::Autonomous` for the whole script.
pub async fn run_autonomous_task<M: Motor, S: Solenoid>(
    robot: &Robot<M, S>,
    steps: &[Step],
    cancel: &CancelToken,
) -> Result<ScriptOutcome, Error> {
    let mut drive = robot.drive(Driver::Autonomous)?;
    let outcome = run_script(robot, &mut drive, steps, cancel).await;
    return Ok(outcome);
}
