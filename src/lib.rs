//! A driver for Pico light controller modules on a shared I2C bus.
//!
//! A module drives up to 16 lights, each with an 8-bit PWM duty cycle, and may group lights so
//! they can be set together. This crate discovers a module on the bus, checks that it speaks the
//! same protocol version, fetches its group assignments, and then sets lights and groups. A fixed
//! demonstration sequence is included for checking an installation by eye.
//!
//! # Examples
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use picolights::{Address, I2cLightBus, LightController, StdDelay};
//!
//! # fn connect<I: embedded_hal::i2c::I2c + 'static>(i2c: I) -> Result<(), Box<dyn std::error::Error>> {
//! #
//! // Set up the bus. Because the bus can be shared among
//! // multiple modules, it must be wrapped in an Rc<RefCell>.
//! let bus = Rc::new(RefCell::new(I2cLightBus::new(i2c)));
//!
//! // Create a controller for the module at its address and bring it up.
//! let mut lights = LightController::new(bus.clone(), Address(0x41));
//! lights.initialize()?;
//!
//! // Light 3 at full brightness, everything else off.
//! lights.set_light(true, 3, 255)?;
//!
//! // Group 0 at half brightness, leaving the others alone.
//! lights.set_group(false, 0, 128)?;
//!
//! // Show off.
//! let _ = lights.run_demo_sequence(&mut StdDelay)?;
//! #
//! # Ok(()) }
//! ```
//!
//! # Sub-crates
//!
//! In addition to the high-level API of [`LightController`], several lower-level components are provided
//! that can be combined for more specialized use-cases.
//!
//! - [`picolights-core`] \(re-exported as `core`\) contains the basic types describing the protocol, and is useful
//!   if you want to implement a custom [`LightBus`] or otherwise operate at the level of the raw protocol.
//! - [`picolights-i2c`] \(re-exported as `i2c`\) contains [`I2cLightBus`], which drives modules
//!   over any `embedded-hal` I2C implementation.
//! - [`picolights-testing`] contains tools not directly related to communicating with modules,
//!   but useful for testing and debugging.
//!
//! [`picolights-core`]: https://docs.rs/picolights-core
//! [`picolights-i2c`]: https://docs.rs/picolights-i2c
//! [`picolights-testing`]: https://docs.rs/picolights-testing
#![doc(html_root_url = "https://docs.rs/picolights/0.3.0")]
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

pub use picolights_core as core;
pub use picolights_i2c as i2c;

mod config;
mod controller;
pub mod demo;
mod errors;
pub mod hub;
pub mod web;

pub use self::config::{BusConfig, ConfigError, DebugConfig, HubConfig, LightsConfig};
pub use self::controller::{LightController, Readiness};
pub use self::errors::{GroupError, InitError, LightError, QueryError};
pub use self::hub::HubContext;

pub use crate::core::{
    Address, BusError, DutyCycle, GroupConfig, GroupId, LightBus, LightId, ModuleId, ProtocolError, StatusCode,
    PROTOCOL_VERSION,
};
pub use crate::i2c::{I2cLightBus, StdDelay};
