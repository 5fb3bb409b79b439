/*
    PID Controller
    - error = setpoint - measurement
    - dt is in milliseconds, the derivative term is skipped when dt == 0
    - integral only accumulates while tolerance < |error| <= integral_band
    - output is unclamped, the caller limits it to the actuator range
*/

// Resources
use crate::resources::error::ConfigError;

// Library
use libm::fabsf;

/* --------------------------- Feedforward -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feedforward {
    None,
    /// Constant push in the direction of the error (static friction).
    Static(f32),
    /// Slope from setpoint to steady-state output (e.g. mV per rpm).
    Linear(f32),
}

/* --------------------------- PID Config -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PIDConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub feedforward: Feedforward,
    pub integral_band: f32,
    pub i_limit: f32,
    pub tolerance: f32,
    pub settle_samples: u32,
    pub period_ms: u64,
}

impl PIDConfig {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            feedforward: Feedforward::None,
            integral_band: f32::INFINITY,
            i_limit: f32::INFINITY,
            tolerance: 0.0,
            settle_samples: 1,
            period_ms: 10,
        }
    }

    pub const fn with_feedforward(self, feedforward: Feedforward) -> Self {
        Self { feedforward, ..self }
    }

    pub const fn with_integral_band(self, integral_band: f32, i_limit: f32) -> Self {
        Self { integral_band, i_limit, ..self }
    }

    pub const fn with_tolerance(self, tolerance: f32, settle_samples: u32) -> Self {
        Self { tolerance, settle_samples, ..self }
    }

    pub const fn with_period(self, period_ms: u64) -> Self {
        Self { period_ms, ..self }
    }

    pub fn validate(&self, axis: &'static str) -> Result<(), ConfigError> {
        let ff_gain = match self.feedforward {
            Feedforward::None => 0.0,
            Feedforward::Static(k) | Feedforward::Linear(k) => k,
        };

        if self.kp < 0.0 || self.ki < 0.0 || self.kd < 0.0 || ff_gain < 0.0 {
            return Err(ConfigError::NegativeGain(axis));
        }
        if self.integral_band < 0.0 || self.i_limit < 0.0 || self.tolerance < 0.0 {
            return Err(ConfigError::NegativeBound(axis));
        }
        if self.settle_samples == 0 {
            return Err(ConfigError::ZeroSettleSamples(axis));
        }
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod(axis));
        }
        Ok(())
    }
}

/* --------------------------- Code -------------------------- */
pub struct PIDcontrol {
    config: PIDConfig,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    error: f32,
    settled_count: u32,
    feedforward_enabled: bool,
}

impl PIDcontrol {
    pub const fn new(config: PIDConfig) -> Self {
        Self {
            config,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            error: 0.0,
            settled_count: 0,
            feedforward_enabled: true,
        }
    }

    pub fn update_pid_param(&mut self, config: PIDConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &PIDConfig {
        &self.config
    }

    /// Starts a new move: clears the integral, previous error and settle count.
    pub fn reset(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.error = 0.0;
        self.settled_count = 0;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn error(&self) -> f32 {
        self.error
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn set_feedforward_enabled(&mut self, enabled: bool) {
        self.feedforward_enabled = enabled;
    }

    pub fn step(&mut self, measurement: f32, dt_ms: f32) -> f32 {
        let error = self.setpoint - measurement;
        return self.compute(error, dt_ms);
    }

    /// Same as [`step`](Self::step) for axes whose error is not a plain
    /// difference (e.g. a heading error wrapped to the shorter rotation).
    pub fn compute(&mut self, error: f32, dt_ms: f32) -> f32 {
        let magnitude = fabsf(error);

        if magnitude > self.config.tolerance && magnitude <= self.config.integral_band {
            self.integral = (self.integral + error * dt_ms).clamp(-self.config.i_limit, self.config.i_limit);
        }

        let derivative = if dt_ms > 0.0 { (error - self.prev_error) / dt_ms } else { 0.0 };
        self.prev_error = error;
        self.error = error;

        if magnitude <= self.config.tolerance {
            self.settled_count = self.settled_count.saturating_add(1);
        } else {
            self.settled_count = 0;
        }

        let feedforward = if self.feedforward_enabled {
            match self.config.feedforward {
                Feedforward::None => 0.0,
                Feedforward::Static(k) => k * signum(error),
                Feedforward::Linear(k) => k * self.setpoint,
            }
        } else {
            0.0
        };

        return self.config.kp * error + self.config.ki * self.integral + self.config.kd * derivative + feedforward;
    }

    /// True once |error| has stayed within tolerance for `settle_samples` steps in a row.
    pub fn at_target(&self) -> bool {
        self.settled_count >= self.config.settle_samples
    }
}

fn signum(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_proportional_only() {
        let mut pid = PIDcontrol::new(PIDConfig::new(2.0, 0.0, 0.0));
        pid.reset(10.0);
        assert_relative_eq!(pid.step(4.0, 10.0), 12.0);
        assert_relative_eq!(pid.error(), 6.0);
    }

    #[test]
    fn test_derivative_skipped_when_dt_is_zero() {
        let mut pid = PIDcontrol::new(PIDConfig::new(0.0, 0.0, 5.0));
        pid.reset(10.0);
        assert_relative_eq!(pid.step(0.0, 0.0), 0.0);
        // error 10 -> 8 over 2 ms
        assert_relative_eq!(pid.step(2.0, 2.0), 5.0 * -1.0);
    }

    #[test]
    fn test_integral_band_suppresses_windup() {
        let config = PIDConfig::new(0.0, 1.0, 0.0).with_integral_band(5.0, 1000.0);
        let mut pid = PIDcontrol::new(config);
        pid.reset(100.0);

        for _ in 0..10 {
            pid.step(0.0, 10.0);
        }
        assert_relative_eq!(pid.integral(), 0.0);

        pid.step(97.0, 10.0);
        assert_relative_eq!(pid.integral(), 30.0);
    }

    #[test]
    fn test_integral_clamped_to_limit() {
        let config = PIDConfig::new(0.0, 1.0, 0.0).with_integral_band(10.0, 50.0);
        let mut pid = PIDcontrol::new(config);
        pid.reset(5.0);

        for _ in 0..100 {
            pid.step(0.0, 10.0);
        }
        assert_relative_eq!(pid.integral(), 50.0);
    }

    #[test]
    fn test_settled_integral_does_not_grow() {
        let config = PIDConfig::new(1.0, 0.5, 0.0)
            .with_integral_band(20.0, 1.0e6)
            .with_tolerance(1.0, 3);
        let mut pid = PIDcontrol::new(config);
        pid.reset(10.0);

        pid.step(0.0, 10.0);
        pid.step(5.0, 10.0);
        for _ in 0..3 {
            pid.step(9.5, 10.0);
        }
        assert!(pid.at_target());

        let settled_integral = pid.integral();
        let settled_output = pid.step(9.5, 10.0);
        for _ in 0..500 {
            assert_relative_eq!(pid.step(9.5, 10.0), settled_output);
        }
        assert_relative_eq!(pid.integral(), settled_integral);
    }

    #[test]
    fn test_at_target_is_debounced() {
        let config = PIDConfig::new(1.0, 0.0, 0.0).with_tolerance(0.5, 3);
        let mut pid = PIDcontrol::new(config);
        pid.reset(0.0);

        pid.step(0.1, 10.0);
        pid.step(0.2, 10.0);
        assert!(!pid.at_target());

        // noise spike resets the count
        pid.step(3.0, 10.0);
        pid.step(0.1, 10.0);
        pid.step(0.1, 10.0);
        assert!(!pid.at_target());

        pid.step(0.1, 10.0);
        assert!(pid.at_target());
    }

    #[test]
    fn test_reset_clears_state() {
        let config = PIDConfig::new(1.0, 1.0, 1.0).with_tolerance(1.0, 1);
        let mut pid = PIDcontrol::new(config);
        pid.reset(5.0);
        pid.step(0.0, 10.0);
        pid.step(4.5, 10.0);
        assert!(pid.at_target());

        pid.reset(50.0);
        assert!(!pid.at_target());
        assert_relative_eq!(pid.integral(), 0.0);
        assert_relative_eq!(pid.setpoint(), 50.0);
        // no derivative kick from the old move: prev_error is zero
        assert_relative_eq!(pid.step(50.0, 10.0), 0.0);
    }

    #[test]
    fn test_static_feedforward_follows_error_sign() {
        let config = PIDConfig::new(0.0, 0.0, 0.0).with_feedforward(Feedforward::Static(300.0));
        let mut pid = PIDcontrol::new(config);
        pid.reset(10.0);
        assert_relative_eq!(pid.step(0.0, 10.0), 300.0);
        assert_relative_eq!(pid.step(20.0, 10.0), -300.0);
        assert_relative_eq!(pid.step(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_linear_feedforward_can_be_disabled() {
        let config = PIDConfig::new(0.0, 0.0, 0.0).with_feedforward(Feedforward::Linear(3.0));
        let mut pid = PIDcontrol::new(config);
        pid.reset(2000.0);
        assert_relative_eq!(pid.step(0.0, 10.0), 6000.0);

        pid.set_feedforward_enabled(false);
        assert_relative_eq!(pid.step(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        assert_eq!(
            PIDConfig::new(-1.0, 0.0, 0.0).validate("heading"),
            Err(ConfigError::NegativeGain("heading"))
        );
        assert_eq!(
            PIDConfig::new(1.0, 0.0, 0.0).with_tolerance(1.0, 0).validate("distance"),
            Err(ConfigError::ZeroSettleSamples("distance"))
        );
        assert_eq!(
            PIDConfig::new(1.0, 0.0, 0.0).with_period(0).validate("flywheel"),
            Err(ConfigError::ZeroPeriod("flywheel"))
        );
        assert!(PIDConfig::new(1.0, 0.0, 0.0).validate("heading").is_ok());
    }
}
