/*
    Teleop Drive Task
    - Arcade drive, intake, flywheel and angle toggles, endgame, fire requests
    - Holds the chassis as Driver::Teleop; waits while autonomous owns it
*/

// Resources
use crate::resources::chassis_resources::Driver;
use crate::resources::config::CHASSIS_RETRY_MS;
use crate::resources::config::TELEOP_SAMPLING_MS;
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;
use crate::resources::mechanism_resources::FireRequest;
use crate::resources::mechanism_resources::IntakeDirection;
use crate::resources::robot::Robot;
use crate::tasks::chassis::Drive;

// Library
use embassy_time::Duration;
use embassy_time::Ticker;
use embassy_time::Timer;

/* --------------------------- Operator Frame -------------------------- */
/// One sample of operator intent. Toggles are already edge detected.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperatorFrame {
    pub power: f32,
    pub turn: f32,
    pub intake: IntakeDirection,
    pub toggle_flywheel: bool,
    pub toggle_angle: bool,
    pub endgame: bool,
    pub fire: Option<FireRequest>,
}

impl OperatorFrame {
    pub const fn idle() -> Self {
        Self {
            power: 0.0,
            turn: 0.0,
            intake: IntakeDirection::Stop,
            toggle_flywheel: false,
            toggle_angle: false,
            endgame: false,
            fire: None,
        }
    }
}

impl Default for OperatorFrame {
    fn default() -> Self {
        Self::idle()
    }
}

pub trait OperatorInput {
    fn read(&mut self) -> OperatorFrame;
}

/* --------------------------- Code -------------------------- */
pub async fn apply_frame<M: Motor, S: Solenoid>(robot: &Robot<M, S>, drive: &mut Drive<'_, M>, frame: OperatorFrame) {
    drive.move_joystick(frame.power, frame.turn);
    robot.intake.run(frame.intake).await;

    if frame.toggle_flywheel {
        robot.flywheel.toggle();
    }
    if frame.toggle_angle {
        robot.toggle_angle().await;
    }
    if frame.endgame {
        robot.endgame.fire().await;
    }
    if let Some(request) = frame.fire {
        robot.request_fire(request);
    }
}

pub async fn run_drive_task<M: Motor, S: Solenoid, I: OperatorInput>(robot: &Robot<M, S>, input: &mut I) {
    robot.flywheel.move_rpm(robot.config.flywheel.launch_rpm);
    robot.flywheel.enable();

    let mut drive = loop {
        match robot.drive(Driver::Teleop) {
            Ok(drive) => break drive,
            Err(e) => {
                log::debug!("teleop waiting: {}", e);
                Timer::after(Duration::from_millis(CHASSIS_RETRY_MS)).await;
            }
        }
    };

    log::info!("teleop started");
    let mut ticker = Ticker::every(Duration::from_millis(TELEOP_SAMPLING_MS));

    loop {
        let frame = input.read();
        apply_frame(robot, &mut drive, frame).await;
        ticker.next().await;
    }
}
