/*
    Odometry Task
    - Sole writer of the published pose
    - Reads cumulative sensor positions and converts them to per-tick deltas
*/

// Resources
use crate::resources::config::ODOM_SAMPLING_MS;
use crate::resources::error::ConfigError;
use crate::resources::hardware::Gyro;
use crate::resources::hardware::RotationSensor;
use crate::resources::odom_resources::OdomHandler;
use crate::resources::odom_resources::OdomState;

// Control
use crate::control::odometry::OdomConfig;
use crate::control::odometry::Odometry;
use crate::control::odometry::Pose;
use crate::control::odometry::TrackingDelta;

// Library
use embassy_time::Duration;
use embassy_time::Ticker;

/* --------------------------- Code -------------------------- */
pub struct OdometryTracker<E: RotationSensor, G: Gyro> {
    forward: E,
    lateral: E,
    gyro: G,
    odometry: Odometry,
    last_forward: i32,
    last_lateral: i32,
    last_heading: f32,
    tick: u32,
}

impl<E: RotationSensor, G: Gyro> OdometryTracker<E, G> {
    pub fn new(mut forward: E, mut lateral: E, mut gyro: G, config: OdomConfig, initial: Pose) -> Result<Self, ConfigError> {
        let odometry = Odometry::new(config, initial)?;

        // baseline so the first tick only sees motion since construction
        let last_forward = forward.position_ticks();
        let last_lateral = lateral.position_ticks();
        let last_heading = gyro.rotation_deg();

        Ok(Self {
            forward,
            lateral,
            gyro,
            odometry,
            last_forward,
            last_lateral,
            last_heading,
            tick: 0,
        })
    }

    /// Integrates one tick of sensor motion and returns the state to publish.
    pub fn sample(&mut self) -> OdomState {
        let forward = self.forward.position_ticks();
        let lateral = self.lateral.position_ticks();
        let heading = self.gyro.rotation_deg();

        let delta = TrackingDelta {
            forward_ticks: forward.wrapping_sub(self.last_forward),
            lateral_ticks: lateral.wrapping_sub(self.last_lateral),
            heading_deg: heading - self.last_heading,
        };
        self.last_forward = forward;
        self.last_lateral = lateral;
        self.last_heading = heading;

        let pose = self.odometry.update(delta);
        self.tick = self.tick.wrapping_add(1);

        OdomState {
            pose,
            forward_cm: self.odometry.forward_cm(),
            tick: self.tick,
        }
    }

    pub fn state(&self) -> OdomState {
        OdomState {
            pose: self.odometry.pose(),
            forward_cm: self.odometry.forward_cm(),
            tick: self.tick,
        }
    }

    pub async fn run_odometry_task(&mut self, odom: &OdomHandler) {
        let mut ticker = Ticker::every(Duration::from_millis(ODOM_SAMPLING_MS));
        odom.publish(self.state());

        loop {
            ticker.next().await;
            let state = self.sample();
            odom.publish(state);
            log::trace!("odom tick {} pose {:?}", state.tick, state.pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f32::consts::PI;

    struct Counter(i32);

    impl RotationSensor for Counter {
        fn position_ticks(&mut self) -> i32 {
            self.0
        }
    }

    struct FixedGyro(f32);

    impl Gyro for FixedGyro {
        fn rotation_deg(&mut self) -> f32 {
            self.0
        }
    }

    const CONFIG: OdomConfig = OdomConfig {
        wheel_diameter_cm: 10.0 / PI,
        ticks_per_rev: 1000,
        forward_offset_cm: 0.0,
        lateral_offset_cm: 0.0,
    };

    #[test]
    fn test_first_sample_uses_construction_baseline() {
        let mut tracker =
            OdometryTracker::new(Counter(5_000), Counter(-200), FixedGyro(720.0), CONFIG, Pose::origin()).unwrap();
        let state = tracker.sample();
        assert_eq!(state.tick, 1);
        assert_eq!(state.pose, Pose::origin());
    }

    #[test]
    fn test_sample_integrates_deltas() {
        let mut tracker = OdometryTracker::new(Counter(0), Counter(0), FixedGyro(0.0), CONFIG, Pose::origin()).unwrap();
        tracker.forward.0 = 2_500;
        let state = tracker.sample();
        assert_relative_eq!(state.pose.x, 25.0, epsilon = 1e-3);
        assert_relative_eq!(state.forward_cm, 25.0, epsilon = 1e-3);

        tracker.gyro.0 = 90.0;
        let state = tracker.sample();
        assert_relative_eq!(state.pose.heading, 90.0);
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn test_encoder_rollover_is_a_small_delta() {
        let mut tracker =
            OdometryTracker::new(Counter(i32::MAX - 10), Counter(0), FixedGyro(0.0), CONFIG, Pose::origin()).unwrap();
        tracker.forward.0 = (i32::MAX - 10).wrapping_add(100);
        let state = tracker.sample();
        assert_relative_eq!(state.pose.x, 1.0, epsilon = 1e-4);
    }
}
