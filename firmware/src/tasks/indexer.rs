/*
    Indexer Sequencer
    - Purely time driven, no plunger feedback
    - A pulse that overruns its bound aborts the rest of the sequence
*/

// Resources
use crate::resources::hardware::Solenoid;
use crate::resources::mechanism_resources::Indexer;

// Library
use core::sync::atomic::Ordering;
use embassy_time::with_timeout;
use embassy_time::Duration;
use embassy_time::Timer;

/* --------------------------- Outcome -------------------------- */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceOutcome {
    Completed,
    TimedOut { completed: u32 },
}

/* --------------------------- Code -------------------------- */
impl<S: Solenoid> Indexer<S> {
    async fn write(&self, extended: bool) {
        self.solenoid.lock().await.set_extended(extended);
        self.extended.store(extended, Ordering::Relaxed);
    }

    pub async fn extend(&self) {
        self.write(true).await;
    }

    pub async fn retract(&self) {
        self.write(false).await;
    }

    /// One extend / hold / retract cycle. `None` holds for the configured pulse.
    pub async fn index(&self, delay_ms: Option<u64>) {
        let hold = delay_ms.unwrap_or(self.config.pulse_ms);

        self.extend().await;
        Timer::after(Duration::from_millis(hold)).await;
        self.retract().await;

        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn repeat(&self, count: u32, timeout_ms: Option<u64>, inter_pulse_ms: Option<u64>) -> SequenceOutcome {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(self.config.pulse_timeout_ms));
        let pause = Duration::from_millis(inter_pulse_ms.unwrap_or(self.config.inter_pulse_ms));

        for completed in 0..count {
            if with_timeout(timeout, self.index(None)).await.is_err() {
                // a cancelled pulse may have been left extended
                self.retract().await;
                log::warn!("indexer pulse {} overran {} ms, aborting", completed + 1, timeout.as_millis());
                return SequenceOutcome::TimedOut { completed };
            }

            if completed + 1 < count {
                Timer::after(pause).await;
            }
        }

        log::info!("indexer fired {} pulses", count);
        return SequenceOutcome::Completed;
    }
}
