/*
* Hardware Interfaces
*  - Implemented by board bring-up (or the simulator)
*  - Voltages are signed millivolts, the device clamps to +-12000 mV
*/

// Resources
use crate::resources::config::MAX_VOLTAGE_MV;

/* --------------------------- Actuators -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrakeMode {
    Coast,
    Brake,
    Hold,
}

pub trait Motor {
    fn set_voltage(&mut self, mv: i32);
    fn set_brake_mode(&mut self, mode: BrakeMode);
}

pub trait Solenoid {
    fn set_extended(&mut self, extended: bool);
}

/* --------------------------- Sensors -------------------------- */
/// Cumulative signed encoder ticks.
pub trait RotationSensor {
    fn position_ticks(&mut self) -> i32;
}

/// Cumulative, unwrapped rotation in degrees, counter-clockwise positive.
pub trait Gyro {
    fn rotation_deg(&mut self) -> f32;
}

/* --------------------------- Motor Group -------------------------- */
pub struct MotorGroup<M: Motor, const N: usize> {
    motors: [M; N],
}

impl<M: Motor, const N: usize> MotorGroup<M, N> {
    pub const fn new(motors: [M; N]) -> Self {
        Self { motors }
    }
}

impl<M: Motor, const N: usize> Motor for MotorGroup<M, N> {
    fn set_voltage(&mut self, mv: i32) {
        for motor in self.motors.iter_mut() {
            motor.set_voltage(mv);
        }
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        for motor in self.motors.iter_mut() {
            motor.set_brake_mode(mode);
        }
    }
}

pub fn clamp_voltage(mv: f32, limit_mv: i32) -> i32 {
    let limit = limit_mv.clamp(0, MAX_VOLTAGE_MV) as f32;
    return mv.clamp(-limit, limit) as i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        mv: i32,
        mode: Option<BrakeMode>,
    }

    impl Motor for Recorder {
        fn set_voltage(&mut self, mv: i32) {
            self.mv = mv;
        }

        fn set_brake_mode(&mut self, mode: BrakeMode) {
            self.mode = Some(mode);
        }
    }

    #[test]
    fn test_group_fans_out_commands() {
        let mut group = MotorGroup::new([
            Recorder { mv: 0, mode: None },
            Recorder { mv: 0, mode: None },
            Recorder { mv: 0, mode: None },
        ]);
        group.set_voltage(-4200);
        group.set_brake_mode(BrakeMode::Hold);
        for motor in group.motors.iter() {
            assert_eq!(motor.mv, -4200);
            assert_eq!(motor.mode, Some(BrakeMode::Hold));
        }
    }

    #[test]
    fn test_clamp_voltage() {
        assert_eq!(clamp_voltage(20_000.0, 12_000), 12_000);
        assert_eq!(clamp_voltage(-20_000.0, 8_000), -8_000);
        assert_eq!(clamp_voltage(-350.7, 12_000), -350);
        assert_eq!(clamp_voltage(5_000.0, 50_000), 5_000);
    }
}
