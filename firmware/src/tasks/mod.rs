/* 
* Tasks Hub
*/

pub mod autonomous;
pub mod chassis;
pub mod drive;
pub mod fire;
pub mod flywheel;
pub mod indexer;
pub mod odometry;
pub mod telemetry;
