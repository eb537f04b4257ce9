// insight-core/src/ports/clock.rs
//
// Time is a port so TTL behaviour can be tested without sleeping.

use chrono::NaiveDate;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Monotonic instant, used for cache expiry.
    fn now(&self) -> Instant;

    /// Calendar day, used to resolve preset periods such as "30d".
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<(Instant, NaiveDate)>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: Mutex::new((Instant::now(), today)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.state.lock() {
            guard.0 += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        // A poisoned lock only happens if a test panicked mid-advance
        match self.state.lock() {
            Ok(guard) => guard.0,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }

    fn today(&self) -> NaiveDate {
        match self.state.lock() {
            Ok(guard) => guard.1,
            Err(poisoned) => poisoned.into_inner().1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() -> anyhow::Result<()> {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).ok_or(anyhow::anyhow!("bad date"))?;
        let clock = ManualClock::new(day);
        let t0 = clock.now();
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now() - t0, Duration::from_secs(90));
        assert_eq!(clock.today(), day);
        Ok(())
    }
}
