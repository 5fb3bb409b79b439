/*
    Tracking Wheel Odometry
    - Forward and lateral tracking wheels, heading delta from the gyro
    - Local displacement is rotated by the heading at the start of the tick
    - Heading is kept unwrapped so multi-turn targets stay meaningful
*/

// Resources
use crate::control::angle::deg_to_rad;
use crate::resources::error::ConfigError;

// Library
use core::f32::consts::PI;
use libm::cosf;
use libm::sinf;

/* --------------------------- Pose -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Pose {
    pub const fn new(x: f32, y: f32, heading: f32) -> Self {
        Self { x, y, heading }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/* --------------------------- Config -------------------------- */
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OdomConfig {
    pub wheel_diameter_cm: f32,
    pub ticks_per_rev: u32,
    /// Distance the forward wheel rolls per radian of in-place CCW rotation.
    pub forward_offset_cm: f32,
    /// Distance the lateral wheel rolls per radian of in-place CCW rotation.
    pub lateral_offset_cm: f32,
}

impl OdomConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_rev == 0 {
            return Err(ConfigError::ZeroTicksPerRevolution("odometry"));
        }
        if !(self.wheel_diameter_cm > 0.0) {
            return Err(ConfigError::NonPositiveWheelDiameter);
        }
        Ok(())
    }

    pub fn cm_per_tick(&self) -> f32 {
        PI * self.wheel_diameter_cm / self.ticks_per_rev as f32
    }
}

/// Raw change seen by the sensors over one tick.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackingDelta {
    pub forward_ticks: i32,
    pub lateral_ticks: i32,
    pub heading_deg: f32,
}

/* --------------------------- Code -------------------------- */
pub struct Odometry {
    config: OdomConfig,
    cm_per_tick: f32,
    pose: Pose,
    forward_cm: f32,
}

impl Odometry {
    pub fn new(config: OdomConfig, initial: Pose) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            cm_per_tick: config.cm_per_tick(),
            pose: initial,
            forward_cm: 0.0,
        })
    }

    pub fn update(&mut self, delta: TrackingDelta) -> Pose {
        let dtheta = deg_to_rad(delta.heading_deg);

        let forward = delta.forward_ticks as f32 * self.cm_per_tick - self.config.forward_offset_cm * dtheta;
        let lateral = delta.lateral_ticks as f32 * self.cm_per_tick - self.config.lateral_offset_cm * dtheta;

        let heading = deg_to_rad(self.pose.heading);
        let (sin, cos) = (sinf(heading), cosf(heading));

        self.pose.x += forward * cos - lateral * sin;
        self.pose.y += forward * sin + lateral * cos;
        self.pose.heading += delta.heading_deg;
        self.forward_cm += forward;

        return self.pose;
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Cumulative distance travelled along the robot's forward axis.
    pub fn forward_cm(&self) -> f32 {
        self.forward_cm
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn config(&self) -> &OdomConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CONFIG: OdomConfig = OdomConfig {
        wheel_diameter_cm: 10.0 / PI,
        ticks_per_rev: 1000,
        forward_offset_cm: 0.0,
        lateral_offset_cm: 0.0,
    };

    // 10 cm circumference over 1000 ticks
    fn ticks(cm: f32) -> i32 {
        (cm * 100.0) as i32
    }

    #[test]
    fn test_forward_only_drive() {
        let mut odom = Odometry::new(CONFIG, Pose::origin()).unwrap();
        for _ in 0..100 {
            odom.update(TrackingDelta { forward_ticks: ticks(1.5), lateral_ticks: 0, heading_deg: 0.0 });
        }
        let pose = odom.pose();
        assert_relative_eq!(pose.x, 150.0, epsilon = 1e-2);
        assert_relative_eq!(pose.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(pose.heading, 0.0);
        assert_relative_eq!(odom.forward_cm(), 150.0, epsilon = 1e-2);
    }

    #[test]
    fn test_displacement_rotated_by_start_heading() {
        let mut odom = Odometry::new(CONFIG, Pose::new(0.0, 0.0, 90.0)).unwrap();
        odom.update(TrackingDelta { forward_ticks: ticks(10.0), lateral_ticks: 0, heading_deg: 0.0 });
        assert_relative_eq!(odom.pose().x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(odom.pose().y, 10.0, epsilon = 1e-4);

        // lateral is positive to the robot's left
        odom.update(TrackingDelta { forward_ticks: 0, lateral_ticks: ticks(5.0), heading_deg: 0.0 });
        assert_relative_eq!(odom.pose().x, -5.0, epsilon = 1e-4);
        assert_relative_eq!(odom.pose().y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_heading_is_unwrapped() {
        let mut odom = Odometry::new(CONFIG, Pose::origin()).unwrap();
        for _ in 0..80 {
            odom.update(TrackingDelta { forward_ticks: 0, lateral_ticks: 0, heading_deg: 5.0 });
        }
        assert_relative_eq!(odom.pose().heading, 400.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wheel_offsets_cancel_in_place_rotation() {
        let config = OdomConfig {
            ticks_per_rev: 100_000,
            forward_offset_cm: 3.0,
            lateral_offset_cm: -12.0,
            ..CONFIG
        };
        let mut odom = Odometry::new(config, Pose::origin()).unwrap();

        // one degree per tick, each wheel rolls offset * dtheta
        let dtheta = deg_to_rad(1.0);
        let per_tick = config.cm_per_tick();
        let delta = TrackingDelta {
            forward_ticks: libm::roundf(3.0 * dtheta / per_tick) as i32,
            lateral_ticks: libm::roundf(-12.0 * dtheta / per_tick) as i32,
            heading_deg: 1.0,
        };
        for _ in 0..90 {
            odom.update(delta);
        }
        assert_relative_eq!(odom.pose().x, 0.0, epsilon = 0.05);
        assert_relative_eq!(odom.pose().y, 0.0, epsilon = 0.05);
        assert_relative_eq!(odom.pose().heading, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rejects_zero_ticks_per_rev() {
        let config = OdomConfig { ticks_per_rev: 0, ..CONFIG };
        assert_eq!(
            Odometry::new(config, Pose::origin()).err(),
            Some(ConfigError::ZeroTicksPerRevolution("odometry"))
        );
    }
}
