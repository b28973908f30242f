//! Core types for describing communication with Pico light controller modules.
//!
//! For the basic task of driving lights, you likely want to use the high-level API
//! in the [`picolights`] crate instead.
//!
//! However, `picolights_core` is useful for crates that want to interact with the module protocol
//! at a lower level than the `picolights` crate, or who want to provide their own [`LightBus`]
//! implementations for use by `picolights`.
//!
//! # Protocol
//!
//! Every command is an 8-byte frame whose first byte is a [`ControlByte`]. "Set" commands carry
//! a duty cycle in the second byte and are answered with a single status byte. Queries are
//! answered either with a single byte (module ID) or a 2-byte big-endian length followed by
//! exactly that many bytes of text or JSON.
//!
//! # Examples
//!
//! ```
//! use picolights_core::{Address, CommandFrame, LightBus, Query, response};
//! use picolights_testing::{VirtualLightBus, VirtualLightModule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! let mut bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))]);
//!
//! // Ask the module for its version string.
//! bus.write(Address(0x41), CommandFrame::query(Query::Version).as_bytes())?;
//! let length = response::decode_length(&bus.read(Address(0x41), 2)?)?;
//! let payload = response::verify_payload(length, bus.read(Address(0x41), length)?)?;
//! assert_eq!("0.2.0", response::decode_text(payload)?);
//! #
//! # Ok(()) }
//! ```
//!
//! [`picolights`]: https://docs.rs/picolights
#![doc(html_root_url = "https://docs.rs/picolights-core/0.3.0")]
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

mod command;
mod errors;
mod group_config;
mod light_bus;
pub mod response;

pub use self::command::{
    Address, Command, CommandFrame, ControlByte, DutyCycle, GroupId, LightId, Query, Target, FRAME_LEN, GROUP_FLAG,
    RESET_FLAG, SET_FAMILY,
};
pub use self::errors::{ProtocolError, ValidationError};
pub use self::group_config::GroupConfig;
pub use self::light_bus::{BusError, LightBus};
pub use self::response::{ModuleId, StatusCode};

/// Version of the module protocol this driver speaks.
///
/// A module reporting any other version must not be driven.
pub const PROTOCOL_VERSION: &str = "0.2.0";
