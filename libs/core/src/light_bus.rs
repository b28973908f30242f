use std::error::Error as StdError;
use std::fmt::{self, Debug, Formatter};

use thiserror::Error;

use crate::Address;

/// A transaction on the bus failed.
///
/// Covers everything the physical bus can report; the driver never retries these.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BusError {
    /// No device acknowledged the address or data.
    #[error("No acknowledge from device at address 0x{:02X}", address.0)]
    NoAcknowledge {
        /// Address that was not acknowledged.
        address: Address,
    },

    /// The transaction did not complete in time.
    #[error("Bus transaction timed out")]
    Timeout,

    /// Another controller won arbitration.
    #[error("Bus arbitration lost")]
    ArbitrationLoss,

    /// Any other failure reported by the underlying bus.
    #[error("Bus failure")]
    Other {
        /// The underlying error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl BusError {
    /// Wraps an arbitrary bus implementation error.
    pub fn other<E: Into<Box<dyn StdError + Send + Sync>>>(source: E) -> Self {
        BusError::Other { source: source.into() }
    }
}

/// Abstraction over a two-wire bus with light modules attached.
///
/// Each method is one complete bus transaction. Implementations serialise access to the
/// physical bus; the driver issues at most one write followed by at most one read per
/// operation and assumes nothing else runs in between.
///
/// Typically `I2cLightBus` from [`picolights-i2c`] or `VirtualLightBus` from
/// [`picolights-testing`] are sufficient, and you do not need to implement this yourself.
///
/// # Examples
///
/// Implementing a custom bus:
///
/// ```
/// use picolights_core::{Address, BusError, LightBus};
///
/// struct EmptyBus;
///
/// impl LightBus for EmptyBus {
///     fn scan(&mut self) -> Result<Vec<Address>, BusError> {
///         Ok(vec![])
///     }
///
///     fn write(&mut self, address: Address, _: &[u8]) -> Result<(), BusError> {
///         Err(BusError::NoAcknowledge { address })
///     }
///
///     fn read(&mut self, address: Address, _: usize) -> Result<Vec<u8>, BusError> {
///         Err(BusError::NoAcknowledge { address })
///     }
/// }
/// ```
///
/// [`picolights-i2c`]: https://docs.rs/picolights-i2c
/// [`picolights-testing`]: https://docs.rs/picolights-testing
pub trait LightBus {
    /// Returns the addresses of every device that acknowledges on the bus.
    fn scan(&mut self) -> Result<Vec<Address>, BusError>;

    /// Writes `bytes` to the device at `address`.
    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), BusError>;

    /// Reads `len` bytes from the device at `address`.
    ///
    /// Implementations should return exactly `len` bytes; callers treat anything else as
    /// a protocol violation rather than truncated data.
    fn read(&mut self, address: Address, len: usize) -> Result<Vec<u8>, BusError>;
}

// Provide a Debug representation so types that contain trait objects can derive Debug.
impl Debug for dyn LightBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<LightBus trait>")
    }
}
