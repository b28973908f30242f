//! Tools for communicating with Pico light controller modules over I2C.
//!
//! For the basic task of driving lights, you likely want to use the high-level API
//! in the [`picolights`] crate instead.
//!
//! [`I2cLightBus`] adapts any [`embedded-hal`] I2C implementation to the `LightBus` trait,
//! and [`StdDelay`] provides the pacing used by timed sequences on hosts with `std`.
//!
//! # Examples
//!
//! ```
//! use embedded_hal::i2c::I2c;
//! use picolights_core::{BusError, LightBus};
//! use picolights_i2c::I2cLightBus;
//!
//! fn list_devices<I: I2c>(i2c: I) -> Result<(), BusError> {
//!     let mut bus = I2cLightBus::new(i2c);
//!     for address in bus.scan()? {
//!         println!("Found device at {:02X}", address);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`picolights`]: https://docs.rs/picolights
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
#![doc(html_root_url = "https://docs.rs/picolights-i2c/0.3.0")]
#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![warn(
    missing_docs,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

mod i2c_light_bus;
mod std_delay;

pub use self::i2c_light_bus::{I2cLightBus, DEFAULT_SCAN_RANGE};
pub use self::std_delay::StdDelay;
