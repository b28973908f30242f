use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::config::{BusConfig, LightsConfig};
use crate::core::LightBus;
use crate::i2c::I2cLightBus;
use crate::LightController;

/// Wraps an I2C bus for the hub, scanning only the configured address range.
///
/// `i2c` must already be clocked at `config.frequency_hz`; HAL implementations take the
/// frequency when they are constructed.
///
/// # Examples
///
/// ```
/// use picolights::{hub, BusConfig};
///
/// fn connect<I: embedded_hal::i2c::I2c>(i2c: I) {
///     let config = BusConfig { scan_start: 0x40, scan_end: 0x4F, ..Default::default() };
///     let bus = hub::i2c_bus(&config, i2c);
///     assert_eq!(&(0x40..=0x4F), bus.scan_range());
/// }
/// ```
pub fn i2c_bus<I: I2c>(config: &BusConfig, i2c: I) -> I2cLightBus<I> {
    let range = config.scan_range();
    info!(
        "I2C bus at {} Hz, scanning {:02X} to {:02X}",
        config.frequency_hz,
        range.start(),
        range.end()
    );
    I2cLightBus::new(i2c).with_scan_range(range)
}

/// Brings up the lights module described by `config`, the way the hub does at startup.
///
/// Logs every device found on the bus, then runs [`LightController::initialize`]. Returns `None`
/// if the module is disabled in the configuration or fails to come up, in which case the hub
/// carries on without lights.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use picolights::{hub, Address, LightsConfig, Readiness};
/// use picolights_testing::{VirtualLightBus, VirtualLightModule};
///
/// let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
///
/// let lights = hub::bring_up(&LightsConfig::default(), bus.clone()).unwrap();
/// assert_eq!(Readiness::Ready, lights.readiness());
///
/// let config = LightsConfig { enabled: true, address: 0x50 };
/// assert!(hub::bring_up(&config, bus.clone()).is_none());
/// ```
pub fn bring_up(config: &LightsConfig, bus: Rc<RefCell<dyn LightBus>>) -> Option<LightController> {
    if !config.enabled {
        info!("Lights module disabled in configuration");
        return None;
    }

    let scanned = bus.borrow_mut().scan();
    match scanned {
        Ok(addresses) if addresses.is_empty() => info!("No bus devices found"),
        Ok(addresses) => {
            for address in addresses {
                info!("Bus device found at {:02X}", address);
            }
        }
        Err(error) => warn!("Bus scan failed: {}", error),
    }

    let mut lights = LightController::new(bus, config.address());
    match lights.initialize() {
        Ok(()) => {
            info!("Lights module at {:02X} ready", lights.address());
            Some(lights)
        }
        Err(error) => {
            warn!("Disabling lights module: {}", error);
            None
        }
    }
}

/// Everything a request handler may touch: the lights, if they came up, and the demo pacing.
pub struct HubContext<'a> {
    /// The lights module, or `None` if it is disabled.
    pub lights: Option<LightController>,

    /// Pacing for the demo sequence.
    pub delay: &'a mut dyn DelayNs,
}

impl<'a> HubContext<'a> {
    /// Creates a new context.
    pub fn new(lights: Option<LightController>, delay: &'a mut dyn DelayNs) -> Self {
        HubContext { lights, delay }
    }
}

impl Debug for HubContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubContext")
            .field("lights", &self.lights)
            .finish_non_exhaustive()
    }
}
