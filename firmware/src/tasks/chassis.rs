/*
    Chassis Motion Primitives
    - Every primitive runs on the caller's task as a fixed-period poll loop
    - Heading is CCW positive: a positive heading output drives left back, right forward
    - Closed-loop outputs are capped, then scaled by the chassis voltage percent
    - Exits: debounced settle, or the primitive's own deadline
*/

// Resources
use crate::resources::chassis_resources::Chassis;
use crate::resources::chassis_resources::ChassisState;
use crate::resources::chassis_resources::Driver;
use crate::resources::chassis_resources::MotionCommand;
use crate::resources::chassis_resources::MotionOutcome;
use crate::resources::config::MAX_VOLTAGE_MV;
use crate::resources::hardware::clamp_voltage;
use crate::resources::hardware::BrakeMode;
use crate::resources::hardware::Motor;
use crate::resources::odom_resources::OdomHandler;

// Control
use crate::control::angle::bearing_degrees;
use crate::control::angle::wrap_degrees;
use crate::control::odometry::Pose;

// Library
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::MutexGuard;
use embassy_time::Duration;
use embassy_time::Instant;
use embassy_time::Ticker;
use libm::sqrtf;

/* --------------------------- Code -------------------------- */
/// Exclusive handle on the chassis. Dropping it stops the motors and releases
/// ownership.
pub struct Drive<'a, M: Motor> {
    state: MutexGuard<'a, CriticalSectionRawMutex, ChassisState<M>>,
    chassis: &'a Chassis<M>,
    odom: &'a OdomHandler,
    driver: Driver,
}

impl<'a, M: Motor> Drive<'a, M> {
    pub(crate) fn new(
        state: MutexGuard<'a, CriticalSectionRawMutex, ChassisState<M>>,
        chassis: &'a Chassis<M>,
        odom: &'a OdomHandler,
        driver: Driver,
    ) -> Self {
        Self { state, chassis, odom, driver }
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn position(&self) -> Pose {
        self.odom.position()
    }

    pub fn set_voltage_percent(&self, percent: u8) {
        self.chassis.set_voltage_percent(percent);
    }

    pub fn set_brake_mode(&mut self, mode: BrakeMode) {
        self.state.left.set_brake_mode(mode);
        self.state.right.set_brake_mode(mode);
    }

    fn write_voltage(&mut self, left_mv: i32, right_mv: i32) {
        self.state.left.set_voltage(left_mv);
        self.state.right.set_voltage(right_mv);
        self.chassis.set_commanded_mv(left_mv, right_mv);
    }

    /// Closed-loop output: capped at `limit_mv`, then scaled by the voltage percent.
    fn apply_closed_loop(&mut self, left_mv: f32, right_mv: f32, limit_mv: i32) {
        let scale = self.chassis.get_voltage_percent() as f32 / 100.0;
        let left = clamp_voltage(left_mv, limit_mv) as f32 * scale;
        let right = clamp_voltage(right_mv, limit_mv) as f32 * scale;
        self.write_voltage(left as i32, right as i32);
    }

    pub fn stop(&mut self) {
        self.write_voltage(0, 0);
    }

    /// Open-loop arcade mixing, `power` and `turn` in [-1, 1] of full scale.
    pub fn move_joystick(&mut self, power: f32, turn: f32) {
        let limit = self.chassis.config.max_voltage_mv;
        let full_scale = MAX_VOLTAGE_MV as f32;
        let power = power.clamp(-1.0, 1.0) * full_scale;
        let turn = turn.clamp(-1.0, 1.0) * full_scale;

        self.write_voltage(clamp_voltage(power + turn, limit), clamp_voltage(power - turn, limit));
    }

    pub async fn turn_to_angle(&mut self, target_deg: f32) -> MotionOutcome {
        let config = self.chassis.config;
        let period = Duration::from_millis(config.heading_pid.period_ms);
        let deadline = Instant::now() + Duration::from_millis(config.turn_timeout_ms);

        self.state.heading_pid.reset(target_deg);
        let mut ticker = Ticker::every(period);
        let mut last = Instant::now();

        loop {
            let now = Instant::now();
            if now >= deadline {
                self.stop();
                log::warn!("turn to {} deg timed out, heading {}", target_deg, self.odom.position().heading);
                return MotionOutcome::TimedOut;
            }

            let dt_ms = (now - last).as_micros() as f32 / 1000.0;
            last = now;

            // shorter rotation regardless of how many turns the heading has accumulated
            let error = wrap_degrees(target_deg - self.odom.position().heading);
            let output = self.state.heading_pid.compute(error, dt_ms);

            if self.state.heading_pid.at_target() {
                self.stop();
                log::info!("turn to {} deg settled", target_deg);
                return MotionOutcome::Settled;
            }

            self.apply_closed_loop(-output, output, config.max_voltage_mv);
            ticker.next().await;
        }
    }

    pub async fn drive_dist(&mut self, delta_cm: f32, max_mv: Option<i32>) -> MotionOutcome {
        self.drive_loop(delta_cm, None, max_mv).await
    }

    pub async fn drive_dist_timeout(&mut self, delta_cm: f32, timeout_ms: u64, max_mv: Option<i32>) -> MotionOutcome {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        self.drive_loop(delta_cm, Some(deadline), max_mv).await
    }

    async fn drive_loop(&mut self, delta_cm: f32, deadline: Option<Instant>, max_mv: Option<i32>) -> MotionOutcome {
        let config = self.chassis.config;
        let limit = max_mv.unwrap_or(config.max_voltage_mv).clamp(0, config.max_voltage_mv);
        let target = self.odom.forward_cm() + delta_cm;

        self.state.distance_pid.reset(target);
        let mut ticker = Ticker::every(Duration::from_millis(config.distance_pid.period_ms));
        let mut last = Instant::now();

        loop {
            let now = Instant::now();
            if let Some(deadline) = deadline {
                if now >= deadline {
                    self.stop();
                    log::warn!("drive {} cm timed out, error {} cm", delta_cm, self.state.distance_pid.error());
                    return MotionOutcome::TimedOut;
                }
            }

            let dt_ms = (now - last).as_micros() as f32 / 1000.0;
            last = now;

            let output = self.state.distance_pid.step(self.odom.forward_cm(), dt_ms);

            if self.state.distance_pid.at_target() {
                self.stop();
                log::info!("drive {} cm settled", delta_cm);
                return MotionOutcome::Settled;
            }

            self.apply_closed_loop(output, output, limit);
            ticker.next().await;
        }
    }

    /// Turn to face the point (or face away from it when `reverse`), then drive straight.
    pub async fn drive_to_point(&mut self, x: f32, y: f32, reverse: bool) -> MotionOutcome {
        let tolerance = self.chassis.config.distance_pid.tolerance;
        let pose = self.odom.position();
        let (dx, dy) = (x - pose.x, y - pose.y);

        if sqrtf(dx * dx + dy * dy) <= tolerance {
            return MotionOutcome::Settled;
        }

        let mut heading = bearing_degrees(dx, dy);
        if reverse {
            heading += 180.0;
        }
        let turned = self.turn_to_angle(heading).await;

        let pose = self.odom.position();
        let (dx, dy) = (x - pose.x, y - pose.y);
        let distance = sqrtf(dx * dx + dy * dy);
        let distance = if reverse { -distance } else { distance };
        let drove = self.drive_dist(distance, None).await;

        return turned.and(drove);
    }

    pub async fn execute(&mut self, command: MotionCommand) -> MotionOutcome {
        match command {
            MotionCommand::TurnToAngle(deg) => self.turn_to_angle(deg).await,
            MotionCommand::DriveToPoint { x, y, reverse } => self.drive_to_point(x, y, reverse).await,
            MotionCommand::DriveDistance { delta_cm, max_mv } => self.drive_dist(delta_cm, max_mv).await,
            MotionCommand::DriveDistanceTimeout { delta_cm, timeout_ms, max_mv } => {
                self.drive_dist_timeout(delta_cm, timeout_ms, max_mv).await
            }
        }
    }
}

impl<'a, M: Motor> Drop for Drive<'a, M> {
    fn drop(&mut self) {
        self.stop();
        self.chassis.release(self.driver);
    }
}
