use std::thread;
use std::time::Duration;

use crossbeam_utils::Backoff;

/// Sleep used once spinning and yielding have both been exhausted.
const PARKED_SLEEP: Duration = Duration::from_micros(50);

/// Escalating back-off for busy waits: spin, then yield, then sleep.
///
/// Waits in the pipeline are expected to be short, so they never block on a
/// condition variable; a long wait degrades to short sleeps instead.
#[derive(Debug, Default)]
pub struct SpinWait {
    backoff: Backoff,
}

impl SpinWait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spin_once(&mut self) {
        if self.backoff.is_completed() {
            thread::sleep(PARKED_SLEEP);
        } else {
            self.backoff.snooze();
        }
    }

    pub fn reset(&mut self) {
        self.backoff.reset();
    }
}
