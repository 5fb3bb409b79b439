/* 
* Resources Hub
*/

pub mod chassis_resources;
pub mod config;
pub mod error;
pub mod flywheel_resources;
pub mod hardware;
pub mod mechanism_resources;
pub mod odom_resources;
pub mod robot;

pub use chassis_resources::*;
pub use config::*;
pub use error::*;
pub use flywheel_resources::*;
pub use hardware::*;
pub use mechanism_resources::*;
pub use odom_resources::*;
pub use robot::*;
