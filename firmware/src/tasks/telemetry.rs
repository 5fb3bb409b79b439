/*
    Telemetry Task
    - Read only: snapshots pose, flywheel and actuator commands
    - Formats one log line every TELEMETRY_REPORT_EVERY periods
*/

// Resources
use crate::resources::chassis_resources::Driver;
use crate::resources::config::TELEMETRY_REPORT_EVERY;
use crate::resources::config::TELEMETRY_SAMPLING_MS;
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;
use crate::resources::robot::Robot;

// Control
use crate::control::odometry::Pose;

// Library
use core::fmt::Write;
use embassy_time::Duration;
use embassy_time::Instant;
use embassy_time::Ticker;

pub const TELEMETRY_LINE_SIZE: usize = 256;

/* --------------------------- Snapshot -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub uptime_ms: u64,
    pub pose: Pose,
    pub odom_tick: u32,
    pub owner: Driver,
    pub chassis_mv: (i32, i32),
    pub voltage_percent: u8,
    pub flywheel_enabled: bool,
    pub flywheel_rpm: f32,
    pub flywheel_target_rpm: f32,
    pub flywheel_mv: i32,
    pub intake_mv: i32,
    pub indexer_pulses: u32,
    pub angled: bool,
}

impl Telemetry {
    pub fn capture<M: Motor, S: Solenoid>(robot: &Robot<M, S>, uptime_ms: u64) -> Self {
        let odom = robot.odometry.snapshot();
        let flywheel = robot.flywheel.state();

        Self {
            uptime_ms,
            pose: odom.pose,
            odom_tick: odom.tick,
            owner: robot.chassis.owner(),
            chassis_mv: robot.chassis.get_commanded_mv(),
            voltage_percent: robot.chassis.get_voltage_percent(),
            flywheel_enabled: flywheel.enabled,
            flywheel_rpm: robot.flywheel.rpm(),
            flywheel_target_rpm: flywheel.target_rpm,
            flywheel_mv: robot.flywheel.get_commanded_mv(),
            intake_mv: robot.intake.get_commanded_mv(),
            indexer_pulses: robot.indexer.pulse_count(),
            angled: robot.angle_changer.is_extended(),
        }
    }

    pub fn write_to_buffer<const N: usize>(&self, buffer: &mut heapless::String<N>) -> core::fmt::Result {
        write!(
            buffer,
            "t={} x={:.1} y={:.1} h={:.1} drv={:?} mv={}/{} pct={} fw={}:{:.0}/{:.0}rpm:{}mv in={} idx={} ang={}",
            self.uptime_ms,
            self.pose.x,
            self.pose.y,
            self.pose.heading,
            self.owner,
            self.chassis_mv.0,
            self.chassis_mv.1,
            self.voltage_percent,
            if self.flywheel_enabled { "on" } else { "off" },
            self.flywheel_rpm,
            self.flywheel_target_rpm,
            self.flywheel_mv,
            self.intake_mv,
            self.indexer_pulses,
            self.angled,
        )
    }
}

/* --------------------------- Code -------------------------- */
pub async fn run_telemetry_task<M: Motor, S: Solenoid>(robot: &Robot<M, S>) {
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_SAMPLING_MS));
    let mut buffer = heapless::String::<TELEMETRY_LINE_SIZE>::new();
    let start = Instant::now();
    let mut count: u32 = 0;

    loop {
        ticker.next().await;
        count = count.wrapping_add(1);
        if count % TELEMETRY_REPORT_EVERY != 0 {
            continue;
        }

        let telemetry = Telemetry::capture(robot, start.elapsed().as_millis());
        buffer.clear();
        match telemetry.write_to_buffer(&mut buffer) {
            Ok(()) => log::info!("{}", buffer),
            Err(_) => log::warn!("telemetry line truncated: {}", buffer),
        }
    }
}
