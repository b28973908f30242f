use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// A [`DelayNs`] that blocks the current thread, for hosts with an operating system.
///
/// # Examples
///
/// ```
/// use embedded_hal::delay::DelayNs;
/// use picolights_i2c::StdDelay;
///
/// let mut delay = StdDelay;
/// delay.delay_ms(1);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
