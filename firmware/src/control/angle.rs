/*
    Angle Helpers (degrees)
*/

// Library
use core::f32::consts::PI;
use libm::atan2f;
use libm::fmodf;

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * (PI / 180.0)
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / PI)
}

/// Wraps an angle into [-180, 180).
pub fn wrap_degrees(deg: f32) -> f32 {
    let mut wrapped = fmodf(deg + 180.0, 360.0);
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    wrapped - 180.0
}

/// Field bearing from the origin to (dx, dy), counter-clockwise from +x.
pub fn bearing_degrees(dx: f32, dy: f32) -> f32 {
    rad_to_deg(atan2f(dy, dx))
}
