use std::ops::RangeInclusive;

use embedded_hal::i2c::{Error as I2cError, ErrorKind, I2c};
use log::{debug, trace};

use picolights_core::{Address, BusError, LightBus};

/// Addresses probed by [`scan`](LightBus::scan) unless configured otherwise.
///
/// Skips the ranges the I2C specification reserves.
pub const DEFAULT_SCAN_RANGE: RangeInclusive<u8> = 0x08..=0x77;

/// An implementation of `LightBus` that talks to light modules over any [`embedded-hal`] I2C bus.
///
/// Bus speed and timeout policy belong to the `I2c` implementation handed in; this adapter adds
/// no buffering, retries or protocol knowledge of its own.
///
/// Transactions are logged using the [`log`] crate for debugging purposes. Consuming binaries
/// typically use the [`env_logger`] crate and can be run with the `RUST_LOG=debug` environment variable
/// to watch the bus traffic go by.
///
/// # Examples
///
/// ```
/// use embedded_hal::i2c::I2c;
/// use picolights_i2c::I2cLightBus;
///
/// fn connect<I: I2c>(i2c: I) -> I2cLightBus<I> {
///     // Only probe the addresses light modules are configured for.
///     I2cLightBus::new(i2c).with_scan_range(0x40..=0x4F)
/// }
/// ```
///
/// [`embedded-hal`]: https://crates.io/crates/embedded-hal
/// [`log`]: https://crates.io/crates/log
/// [`env_logger`]: https://crates.io/crates/env_logger
#[derive(Debug)]
pub struct I2cLightBus<I> {
    i2c: I,
    scan_range: RangeInclusive<u8>,
}

impl<I: I2c> I2cLightBus<I> {
    /// Creates a new `I2cLightBus` over an already configured I2C peripheral.
    pub fn new(i2c: I) -> Self {
        I2cLightBus {
            i2c,
            scan_range: DEFAULT_SCAN_RANGE,
        }
    }

    /// Limits [`scan`](LightBus::scan) to the given addresses.
    pub fn with_scan_range(mut self, scan_range: RangeInclusive<u8>) -> Self {
        self.scan_range = scan_range;
        self
    }

    /// The addresses [`scan`](LightBus::scan) probes.
    pub fn scan_range(&self) -> &RangeInclusive<u8> {
        &self.scan_range
    }

    /// Returns a reference to the underlying I2C peripheral.
    pub fn i2c(&self) -> &I {
        &self.i2c
    }

    /// Gives back the underlying I2C peripheral.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> LightBus for I2cLightBus<I> {
    /// Probes each address in the scan range with an empty write and keeps those that acknowledge.
    fn scan(&mut self) -> Result<Vec<Address>, BusError> {
        let mut found = vec![];
        for raw in self.scan_range.clone() {
            let address = Address(raw);
            match self.i2c.write(raw, &[]) {
                Ok(()) => found.push(address),
                Err(e) => match bus_error(address, e) {
                    BusError::NoAcknowledge { .. } => trace!("Nothing at {:02X}", address),
                    other => return Err(other),
                },
            }
        }
        debug!("Bus scan: {:?}", found);
        Ok(found)
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), BusError> {
        debug!("[Addr {:02X}] <-- {:02X?}", address, bytes);
        self.i2c.write(address.0, bytes).map_err(|e| bus_error(address, e))
    }

    fn read(&mut self, address: Address, len: usize) -> Result<Vec<u8>, BusError> {
        let mut buffer = vec![0; len];
        self.i2c.read(address.0, &mut buffer).map_err(|e| bus_error(address, e))?;
        debug!("[Addr {:02X}] --> {:02X?}", address, buffer);
        Ok(buffer)
    }
}

/// Maps a HAL error onto the bus error taxonomy.
fn bus_error<E: I2cError>(address: Address, error: E) -> BusError {
    match error.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::NoAcknowledge { address },
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss,
        _ => BusError::other(format!("I2C error at 0x{:02X}: {:?}", address.0, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockError(ErrorKind);

    impl I2cError for MockError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    /// Acknowledges a fixed set of addresses, records writes and answers reads with a counter.
    #[derive(Debug, Default)]
    struct MockI2c {
        present: Vec<u8>,
        written: Vec<(u8, Vec<u8>)>,
        failure: Option<ErrorKind>,
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c<SevenBitAddress> for MockI2c {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), MockError> {
            if let Some(kind) = self.failure {
                return Err(MockError(kind));
            }
            if !self.present.contains(&address) {
                return Err(MockError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => self.written.push((address, bytes.to_vec())),
                    Operation::Read(buffer) => {
                        for (i, byte) in buffer.iter_mut().enumerate() {
                            *byte = i as u8;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn mock(present: &[u8]) -> MockI2c {
        MockI2c {
            present: present.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn scan_finds_acknowledging_devices() {
        let mut bus = I2cLightBus::new(mock(&[0x20, 0x41]));
        assert_eq!(vec![Address(0x20), Address(0x41)], bus.scan().unwrap());
    }

    #[test]
    fn scan_honours_range() {
        let mut bus = I2cLightBus::new(mock(&[0x20, 0x41])).with_scan_range(0x40..=0x4F);
        assert_eq!(vec![Address(0x41)], bus.scan().unwrap());
    }

    #[test]
    fn scan_surfaces_real_failures() {
        let mut i2c = mock(&[0x41]);
        i2c.failure = Some(ErrorKind::ArbitrationLoss);
        let mut bus = I2cLightBus::new(i2c);
        assert!(matches!(bus.scan(), Err(BusError::ArbitrationLoss)));
    }

    #[test]
    fn write_and_read_pass_through() {
        let mut bus = I2cLightBus::new(mock(&[0x41]));
        bus.write(Address(0x41), &[0x81, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(vec![0, 1, 2], bus.read(Address(0x41), 3).unwrap());

        let i2c = bus.release();
        assert_eq!(vec![(0x41, vec![0x81, 0, 0, 0, 0, 0, 0, 0])], i2c.written);
    }

    #[test]
    fn missing_device_not_acknowledged() {
        let mut bus = I2cLightBus::new(mock(&[]));
        let error = bus.write(Address(0x41), &[0x81]).unwrap_err();
        assert!(matches!(error, BusError::NoAcknowledge { address: Address(0x41) }));
    }

    #[test]
    fn other_errors_wrapped() {
        let mut i2c = mock(&[0x41]);
        i2c.failure = Some(ErrorKind::Overrun);
        let mut bus = I2cLightBus::new(i2c);
        let error = bus.read(Address(0x41), 1).unwrap_err();
        assert!(matches!(error, BusError::Other { .. }));
        assert!(format!("{}", std::error::Error::source(&error).unwrap()).contains("Overrun"));
    }
}
