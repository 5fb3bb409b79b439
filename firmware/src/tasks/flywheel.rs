/*
    Flywheel Velocity Task
    - Rate = encoder delta per tick, averaged over a window of ticks
    - Output is one-directional: clamped to [0, MAX_VOLTAGE_MV]
*/

// Resources
use crate::resources::config::FlywheelConfig;
use crate::resources::config::MAX_VOLTAGE_MV;
use crate::resources::error::ConfigError;
use crate::resources::flywheel_resources::FlywheelHandler;
use crate::resources::flywheel_resources::MechanismState;
use crate::resources::hardware::Motor;
use crate::resources::hardware::RotationSensor;

// Control
use crate::control::moving_average::MovingAverage;
use crate::control::pid_control::PIDcontrol;

// Library
use embassy_time::Duration;
use embassy_time::Instant;
use embassy_time::Ticker;

/* --------------------------- Code -------------------------- */
pub struct FlywheelController<M: Motor, E: RotationSensor, const N: usize> {
    motor: M,
    encoder: E,
    pid: PIDcontrol,
    filter: MovingAverage<N>,
    config: FlywheelConfig,
    ticks_to_rpm: f32,
    last_ticks: i32,
    applied: Option<MechanismState>,
}

impl<M: Motor, E: RotationSensor, const N: usize> FlywheelController<M, E, N> {
    pub fn new(mut motor: M, mut encoder: E, config: FlywheelConfig) -> Result<Self, ConfigError> {
        config.pid.validate("flywheel")?;
        if config.ticks_per_rev == 0 {
            return Err(ConfigError::ZeroTicksPerRevolution("flywheel"));
        }

        motor.set_voltage(0);
        let last_ticks = encoder.position_ticks();

        Ok(Self {
            motor,
            encoder,
            pid: PIDcontrol::new(config.pid),
            filter: MovingAverage::new(),
            config,
            // ticks per period -> revolutions per minute
            ticks_to_rpm: 60_000.0 / (config.ticks_per_rev as f32 * config.pid.period_ms as f32),
            last_ticks,
            applied: None,
        })
    }

    fn measure(&mut self) -> f32 {
        let ticks = self.encoder.position_ticks();
        let delta = ticks.wrapping_sub(self.last_ticks);
        self.last_ticks = ticks;

        return self.filter.update(delta) * self.ticks_to_rpm;
    }

    /// One control period: measure, pick up state changes, drive the motor.
    pub fn update(&mut self, flywheel: &FlywheelHandler, dt_ms: f32) -> i32 {
        let rpm = self.measure();
        flywheel.set_current_rpm(rpm);

        let state = flywheel.state();
        let changed = match self.applied {
            Some(applied) => applied.setpoint_revision != state.setpoint_revision || applied.enabled != state.enabled,
            None => true,
        };
        if changed {
            self.pid.reset(state.target_rpm);
            log::info!("flywheel {} at {} rpm", if state.enabled { "enabled" } else { "disabled" }, state.target_rpm);
        }
        self.pid.set_feedforward_enabled(state.use_feedforward);
        self.applied = Some(state);

        let mv = if state.enabled {
            let output = self.pid.step(rpm, dt_ms);
            output.clamp(0.0, MAX_VOLTAGE_MV as f32) as i32
        } else {
            0
        };

        self.motor.set_voltage(mv);
        flywheel.set_commanded_mv(mv);

        return mv;
    }

    pub fn at_speed(&self) -> bool {
        self.pid.at_target()
    }

    pub fn config(&self) -> &FlywheelConfig {
        &self.config
    }

    pub async fn run_flywheel_task(&mut self, flywheel: &FlywheelHandler) {
        let mut ticker = Ticker::every(Duration::from_millis(self.config.pid.period_ms));
        let mut last = Instant::now();

        loop {
            ticker.next().await;
            let now = Instant::now();
            let dt_ms = (now - last).as_micros() as f32 / 1000.0;
            last = now;

            self.update(flywheel, dt_ms);
        }
    }
}
