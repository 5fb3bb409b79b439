/*
    Control Algorithms
*/

pub mod angle;
pub mod moving_average;
pub mod odometry;
pub mod pid_control;

pub use angle::*;
pub use moving_average::*;
pub use odometry::*;
pub use pid_control::*;
