use std::thread;
use std::time::{Duration, Instant};

/// Time source for the acquisition loop and the transport's `wait_ms`.
///
/// `sleep_until` drives the fixed-rate period schedule; the default goes
/// through `sleep` so a simulated clock only has to implement the two
/// primitives.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Sleep until `deadline`; returns immediately if it already passed.
    fn sleep_until(&self, deadline: Instant) {
        let now = self.now();
        if deadline > now {
            self.sleep(deadline - now);
        }
    }

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

/// Wall-clock implementation backed by `std::time::Instant` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct State {
        offset: Duration,
        sleeps: Vec<Duration>,
    }

    /// Manually advanced clock. `sleep(d)` moves time forward by `d` and
    /// records the request so tests can assert on requested delays.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        state: Arc<Mutex<State>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                state: Arc::new(Mutex::new(State::default())),
            }
        }

        pub fn advance(&self, d: Duration) {
            if let Ok(mut st) = self.state.lock() {
                st.offset = st.offset.saturating_add(d);
            }
        }

        /// Every duration passed to `sleep`, in call order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state.lock().map(|st| st.sleeps.clone()).unwrap_or_default()
        }

        /// Total simulated time since construction.
        pub fn elapsed(&self) -> Duration {
            self.state.lock().map(|st| st.offset).unwrap_or_default()
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            if let Ok(mut st) = self.state.lock() {
                st.sleeps.push(d);
                st.offset = st.offset.saturating_add(d);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sleep_until_only_waits_for_the_remainder() {
            let clock = TestClock::new();
            let deadline = clock.now() + Duration::from_millis(100);
            clock.advance(Duration::from_millis(30));
            clock.sleep_until(deadline);
            assert_eq!(clock.sleeps(), vec![Duration::from_millis(70)]);

            // Already past: no sleep recorded.
            clock.sleep_until(deadline);
            assert_eq!(clock.sleeps().len(), 1);
            assert_eq!(clock.ms_since(clock.origin), 100);
        }
    }
}
