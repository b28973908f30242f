//! The fixed demonstration sequence used to show off a freshly installed module.
//!
//! The sequence sweeps a single fully-lit light up through every ID and back down, turns
//! everything off, then ramps every light through increasing duty cycles. Pacing goes through
//! an [`embedded_hal::delay::DelayNs`] so tests can run it instantly.
//!
//! # Examples
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use picolights::demo::{self, DemoOptions};
//! use picolights::{Address, LightController};
//! use picolights_testing::{RecordingDelay, VirtualLightBus, VirtualLightModule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
//! let lights = LightController::new(bus.clone(), Address(0x41));
//!
//! let mut delay = RecordingDelay::new();
//! let summary = demo::run(&lights, &mut delay, DemoOptions { fail_fast: true })?;
//! assert_eq!(demo::steps().count(), summary.steps);
//! assert_eq!(0, summary.failures);
//! #
//! # Ok(()) }
//! ```

use std::iter;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::core::{DutyCycle, LightId};
use crate::errors::LightError;
use crate::LightController;

/// Pause after each step of the up and down sweeps.
pub const SWEEP_PAUSE_MS: u32 = 100;

/// Pause after each step of the ramp.
pub const RAMP_PAUSE_MS: u32 = 50;

/// One `set_light` call in the sequence and the pause that follows it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DemoStep {
    /// Whether every other light is turned off first.
    pub reset: bool,

    /// The light to set.
    pub id: LightId,

    /// The duty cycle to set it to.
    pub duty: DutyCycle,

    /// Milliseconds to wait afterwards; zero for none.
    pub pause_ms: u32,
}

/// Options for [`run`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct DemoOptions {
    /// Stop at the first failed step instead of logging it and carrying on.
    pub fail_fast: bool,
}

/// What happened during a [`run`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct DemoSummary {
    /// Steps attempted.
    pub steps: usize,

    /// Steps that failed.
    pub failures: usize,
}

/// The duty cycles the ramp steps through: 5 to 95 in steps of 10, then 145, 195 and 245.
///
/// # Examples
///
/// ```
/// let duties = picolights::demo::ramp_duties().collect::<Vec<_>>();
/// assert_eq!(vec![5, 15, 25, 35, 45, 55, 65, 75, 85, 95, 145, 195, 245], duties);
/// ```
pub fn ramp_duties() -> impl Iterator<Item = u8> + Clone {
    iter::successors(Some(5u16), |&duty| {
        let next = duty + 10;
        Some(if next > 100 { next + 40 } else { next })
    })
    .map_while(|duty| u8::try_from(duty).ok())
}

/// Every step of the sequence in order.
pub fn steps() -> impl Iterator<Item = DemoStep> {
    let sweep = |id| DemoStep {
        reset: true,
        id,
        duty: DutyCycle::FULL,
        pause_ms: SWEEP_PAUSE_MS,
    };
    let up = LightId::all().map(sweep);
    let down = LightId::all().rev().map(sweep);

    let all_off = LightId::all().take(1).map(|id| DemoStep {
        reset: true,
        id,
        duty: DutyCycle::OFF,
        pause_ms: 0,
    });

    let ramp = ramp_duties().flat_map(|duty| {
        LightId::all().map(move |id| DemoStep {
            reset: false,
            id,
            duty: DutyCycle(duty),
            pause_ms: RAMP_PAUSE_MS,
        })
    });

    up.chain(down).chain(all_off).chain(ramp)
}

/// Plays the sequence on `controller`, pausing with `delay`.
///
/// Each step goes through [`LightController::set_light`]. Failed steps are logged and skipped
/// unless `options.fail_fast` is set.
///
/// # Errors
///
/// Returns the first step's [`LightError`] if `options.fail_fast` is set.
pub fn run<D>(controller: &LightController, delay: &mut D, options: DemoOptions) -> Result<DemoSummary, LightError>
where
    D: DelayNs + ?Sized,
{
    info!("Running light demo on {:02X}", controller.address());

    let mut summary = DemoSummary::default();
    for step in steps() {
        summary.steps += 1;
        if let Err(error) = controller.set_light(step.reset, i32::from(step.id.get()), i32::from(step.duty.0)) {
            if options.fail_fast {
                return Err(error);
            }
            warn!("Demo step {} to {} failed: {}", step.id, step.duty, error);
            summary.failures += 1;
        }

        if step.pause_ms > 0 {
            delay.delay_ms(step.pause_ms);
        }
    }

    info!("Light demo finished: {} steps, {} failed", summary.steps, summary.failures);
    Ok(summary)
}
