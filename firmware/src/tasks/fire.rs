/*
    Fire Task
    - Owns indexer triggering, requests arrive from teleop or scripts
    - Requests queued while a burst runs are served in order
*/

// Resources
use crate::resources::hardware::Motor;
use crate::resources::hardware::Solenoid;
use crate::resources::mechanism_resources::FireRequest;
use crate::resources::robot::Robot;
use crate::tasks::indexer::SequenceOutcome;

/* --------------------------- Code -------------------------- */
pub async fn run_fire_task<M: Motor, S: Solenoid>(robot: &Robot<M, S>) {
    loop {
        let request = robot.fire_requests.receive().await;
        log::debug!("fire request {:?} at {} rpm", request, robot.flywheel.rpm());

        match request {
            FireRequest::Single => robot.indexer.index(None).await,
            FireRequest::Burst => match robot.indexer.repeat(robot.config.indexer.burst_count, None, None).await {
                SequenceOutcome::Completed => log::debug!("burst of {} done", robot.config.indexer.burst_count),
                SequenceOutcome::TimedOut { completed } => {
                    log::warn!("burst aborted after {} of {} pulses", completed, robot.config.indexer.burst_count)
                }
            },
        }
    }
}
