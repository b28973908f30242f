use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// A [`DelayNs`] that returns immediately and remembers every pause it was asked for.
///
/// Lets tests check the pacing of a sequence without actually sleeping.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use embedded_hal::delay::DelayNs;
/// use picolights_testing::RecordingDelay;
///
/// let mut delay = RecordingDelay::new();
/// delay.delay_ms(100);
/// delay.delay_ms(50);
/// assert_eq!(&[Duration::from_millis(100), Duration::from_millis(50)], delay.pauses());
/// assert_eq!(Duration::from_millis(150), delay.total());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDelay {
    pauses: Vec<Duration>,
}

impl RecordingDelay {
    /// Creates a delay with no recorded pauses.
    pub fn new() -> Self {
        Default::default()
    }

    /// Every pause requested, in order.
    pub fn pauses(&self) -> &[Duration] {
        &self.pauses
    }

    /// Sum of every pause requested.
    pub fn total(&self) -> Duration {
        self.pauses.iter().sum()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pauses.push(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.pauses.push(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.pauses.push(Duration::from_millis(u64::from(ms)));
    }
}
