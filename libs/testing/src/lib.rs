//! Tools for testing and debugging Pico light controller communications.
//!
//! For the basic task of driving lights, you likely want to use the high-level API
//! in the [`picolights`] crate instead.
//!
//! This crate isn't directly related to controlling a real module, but provides some helpful diagnostic tools.
//! [`VirtualLightBus`] is a general-purpose mock implementation of one or more modules attached to the bus,
//! and [`RecordingDelay`] stands in for a real delay so timed sequences run instantly.
//!
//! # Examples
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use picolights_core::{GroupConfig, GroupId, LightId};
//! use picolights_testing::{Address, VirtualLightBus, VirtualLightModule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #
//! let mut groups = GroupConfig::new();
//! groups.insert(GroupId::try_new(0)?, vec![LightId::try_new(1)?, LightId::try_new(2)?]);
//!
//! // A module at the default address that defines one group.
//! let module = VirtualLightModule::new(Address(0x41)).with_groups(groups);
//! let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));
//! // Hand `bus` to a controller, then inspect `bus.borrow().module(0)`.
//! #
//! # Ok(()) }
//! ```
//!
//! [`picolights`]: https://docs.rs/picolights
#![doc(html_root_url = "https://docs.rs/picolights-testing/0.3.0")]
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

mod recording_delay;
mod virtual_light_bus;

pub use self::recording_delay::RecordingDelay;
pub use self::virtual_light_bus::{VirtualLightBus, VirtualLightModule};

pub use picolights_core::Address;
