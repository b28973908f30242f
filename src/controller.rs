use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::core::response::{self, LENGTH_PREFIX_LEN};
use crate::core::{
    Address, CommandFrame, DutyCycle, GroupConfig, GroupId, LightBus, LightId, ModuleId, ProtocolError, Query,
    StatusCode, Target, PROTOCOL_VERSION,
};
use crate::demo::{self, DemoOptions, DemoSummary};
use crate::errors::{GroupError, InitError, LightError, QueryError};

/// How far a [`LightController`] has got in bringing its module into service.
///
/// Steps only move forward on their own. Calling [`check_bus`](LightController::check_bus) again
/// starts discovery over, except once the module has been disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// Nothing is known about the module yet.
    Uninitialized,

    /// A Pico lights module answered at the address.
    BusChecked,

    /// The module speaks the same protocol version as this driver.
    VersionVerified,

    /// Group assignments have been fetched and cached.
    Ready,

    /// The module speaks a different protocol version and must not be driven.
    Disabled,
}

/// A single Pico lights module on an associated bus.
///
/// Bringing a module into service means checking that it is on the bus, that its protocol
/// version matches, and fetching its group assignments. [`initialize`](Self::initialize) does
/// all three in order. Afterwards lights and groups can be set; both validate their arguments
/// before anything goes out on the bus.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use picolights::{Address, LightController, Readiness};
/// use picolights_testing::{VirtualLightBus, VirtualLightModule};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// // The bus can be shared among several modules, so it is wrapped in an Rc<RefCell>.
/// let bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))]);
/// let bus = Rc::new(RefCell::new(bus));
///
/// let mut lights = LightController::new(bus.clone(), Address(0x41));
/// lights.initialize()?;
/// assert_eq!(Readiness::Ready, lights.readiness());
///
/// lights.set_light(true, 3, 200)?;
/// #
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct LightController {
    address: Address,
    bus: Rc<RefCell<dyn LightBus>>,
    groups: GroupConfig,
    readiness: Readiness,
}

impl LightController {
    /// Creates a controller for the module at `address` on the provided [`LightBus`].
    ///
    /// Nothing is sent until discovery starts.
    pub fn new(bus: Rc<RefCell<dyn LightBus>>, address: Address) -> Self {
        LightController {
            address,
            bus,
            groups: GroupConfig::new(),
            readiness: Readiness::Uninitialized,
        }
    }

    /// Returns the module's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns how far discovery has got.
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Returns the cached group assignments, empty until [`get_groups`](Self::get_groups) succeeds.
    pub fn groups(&self) -> &GroupConfig {
        &self.groups
    }

    /// Returns the protocol version this driver speaks.
    pub fn local_version(&self) -> &'static str {
        PROTOCOL_VERSION
    }

    /// Checks whether a Pico lights module is present at the address.
    ///
    /// Scans the bus and, if something answers at the address, asks it for its module ID.
    /// Every failure, including bus errors, is logged and reported as `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::cell::RefCell;
    /// # use std::rc::Rc;
    /// # use picolights::{Address, LightController, Readiness};
    /// # use picolights_testing::{VirtualLightBus, VirtualLightModule};
    /// #
    /// let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    ///
    /// let mut missing = LightController::new(bus.clone(), Address(0x42));
    /// assert!(!missing.check_bus());
    ///
    /// let mut present = LightController::new(bus.clone(), Address(0x41));
    /// assert!(present.check_bus());
    /// assert_eq!(Readiness::BusChecked, present.readiness());
    /// ```
    pub fn check_bus(&mut self) -> bool {
        let found = self.probe();
        if self.readiness != Readiness::Disabled {
            self.readiness = if found {
                Readiness::BusChecked
            } else {
                Readiness::Uninitialized
            };
        }
        found
    }

    /// Asks the module for its module ID.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`QueryError::Bus`] if the underlying bus failed a transaction.
    /// * [`QueryError::Protocol`] if the module did not answer with exactly one byte.
    pub fn get_module_id(&self) -> Result<ModuleId, QueryError> {
        let mut bus = self.bus.borrow_mut();
        bus.write(self.address, CommandFrame::query(Query::ModuleId).as_bytes())?;
        let response = bus.read(self.address, 1)?;
        match response[..] {
            [id] => Ok(ModuleId(id)),
            _ => Err(ProtocolError::LengthMismatch {
                expected: 1,
                actual: response.len(),
            }
            .into()),
        }
    }

    /// Asks the module which protocol version it speaks.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`QueryError::Bus`] if the underlying bus failed a transaction.
    /// * [`QueryError::Protocol`] if the length prefix or payload was malformed or the text is not UTF-8.
    pub fn get_version(&self) -> Result<String, QueryError> {
        let payload = self.query_payload(Query::Version)?;
        Ok(response::decode_text(payload)?)
    }

    /// Fetches the module's group assignments and replaces the cached copy.
    ///
    /// The cache is only replaced once the whole response has been read and parsed, so a
    /// failed fetch leaves the previous assignments in place.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`QueryError::Bus`] if the underlying bus failed a transaction.
    /// * [`QueryError::Protocol`] if the payload was malformed or is not a valid group configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::cell::RefCell;
    /// # use std::rc::Rc;
    /// # use picolights::{Address, GroupConfig, GroupId, LightController};
    /// # use picolights_testing::{VirtualLightBus, VirtualLightModule};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let module = VirtualLightModule::new(Address(0x41)).with_groups(GroupConfig::from_json(br#"{"0":[1,2]}"#)?);
    /// let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));
    ///
    /// let mut lights = LightController::new(bus.clone(), Address(0x41));
    /// let groups = lights.get_groups()?;
    /// assert!(groups.contains(GroupId::try_new(0)?));
    /// assert!(!groups.contains(GroupId::try_new(1)?));
    /// #
    /// # Ok(()) }
    /// ```
    pub fn get_groups(&mut self) -> Result<&GroupConfig, QueryError> {
        let payload = self.query_payload(Query::Groups)?;
        self.groups = GroupConfig::from_json(&payload)?;
        info!("Lights module {:02X} defines {} groups", self.address, self.groups.len());

        if self.readiness == Readiness::VersionVerified {
            self.readiness = Readiness::Ready;
        }
        Ok(&self.groups)
    }

    /// Checks that the module speaks this driver's protocol version.
    ///
    /// A mismatch disables the module for good.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`InitError::VersionMismatch`] if the versions differ.
    /// * [`InitError::Query`] if the version could not be read.
    pub fn verify_version(&mut self) -> Result<(), InitError> {
        let remote = self.get_version()?;
        info!("Lights module {:02X} version: {}", self.address, remote);

        if remote != PROTOCOL_VERSION {
            warn!(
                "Lights module {:02X} version {} does not match driver version {}; disabling",
                self.address, remote, PROTOCOL_VERSION
            );
            self.readiness = Readiness::Disabled;
            return Err(InitError::VersionMismatch {
                local: PROTOCOL_VERSION.to_owned(),
                remote,
            });
        }

        if self.readiness == Readiness::BusChecked {
            self.readiness = Readiness::VersionVerified;
        }
        Ok(())
    }

    /// Runs discovery: checks the bus, verifies the version, and fetches the groups.
    ///
    /// On any error the module should be treated as disabled.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`InitError::Disabled`] if an earlier version check already disabled the module.
    /// * [`InitError::NotFound`] if no Pico lights module answered at the address.
    /// * [`InitError::VersionMismatch`] if the module speaks a different protocol version.
    /// * [`InitError::Query`] if the version or groups could not be read.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        if self.readiness == Readiness::Disabled {
            return Err(InitError::Disabled);
        }

        if !self.check_bus() {
            return Err(InitError::NotFound { address: self.address });
        }
        info!("Lights module found at {:02X}", self.address);

        self.verify_version()?;
        let _ = self.get_groups()?;
        Ok(())
    }

    /// Sets a single light's duty cycle, optionally turning every other light off first.
    ///
    /// `id` and `duty` are checked before anything is sent; out-of-range values never reach the bus.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`LightError::IdOutOfRange`] if `id` is not in 0–15.
    /// * [`LightError::DutyOutOfRange`] if `duty` is not in 0–255.
    /// * [`LightError::DeviceRejected`] if the module answered with a failure status.
    /// * [`LightError::Bus`] or [`LightError::Protocol`] if the transaction itself failed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::cell::RefCell;
    /// # use std::rc::Rc;
    /// # use picolights::{Address, DutyCycle, LightController, LightError, LightId};
    /// # use picolights_testing::{VirtualLightBus, VirtualLightModule};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// #
    /// let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    /// let lights = LightController::new(bus.clone(), Address(0x41));
    ///
    /// lights.set_light(false, 4, 128)?;
    /// assert_eq!(DutyCycle(128), bus.borrow().module(0).duty(LightId::try_new(4)?));
    ///
    /// let error = lights.set_light(false, 16, 128).unwrap_err();
    /// assert!(matches!(error, LightError::IdOutOfRange { value: 16 }));
    /// assert_eq!(Some(-10), error.code());
    /// #
    /// # Ok(()) }
    /// ```
    pub fn set_light(&self, reset: bool, id: i32, duty: i32) -> Result<(), LightError> {
        let light = LightId::try_new(id).map_err(|_| LightError::IdOutOfRange { value: id })?;
        let level = DutyCycle::try_new(duty).map_err(|_| LightError::DutyOutOfRange { value: duty })?;

        debug!("Setting light {} to {} (reset: {})", light, level.0, reset);
        self.send_set(Target::Light(light), reset, level)?
            .map_err(LightError::DeviceRejected)
    }

    /// Sets every light in a group to a duty cycle, optionally turning every other light off first.
    ///
    /// The group must be in the cached assignments from [`get_groups`](Self::get_groups).
    /// All checks happen before anything is sent.
    ///
    /// # Errors
    ///
    /// The arguments are checked in order: group ID range, then cache membership, then duty
    /// range. The first failure is reported, so an uncached group with a bad duty gives
    /// [`GroupError::NotInLocalConfig`].
    ///
    /// Returns:
    /// * [`GroupError::IdOutOfRange`] if `id` is not in 0–15.
    /// * [`GroupError::NotInLocalConfig`] if the group is not in the cached assignments.
    /// * [`GroupError::DutyOutOfRange`] if `duty` is not in 0–255.
    /// * [`GroupError::DeviceRejected`] if the module answered with a failure status, e.g.
    ///   [`StatusCode::GroupConfigOutOfSync`] when the cached assignments are stale.
    /// * [`GroupError::Bus`] or [`GroupError::Protocol`] if the transaction itself failed.
    pub fn set_group(&self, reset: bool, id: i32, duty: i32) -> Result<(), GroupError> {
        let group = GroupId::try_new(id).map_err(|_| GroupError::IdOutOfRange { value: id })?;
        if !self.groups.contains(group) {
            return Err(GroupError::NotInLocalConfig { id: group });
        }
        let level = DutyCycle::try_new(duty).map_err(|_| GroupError::DutyOutOfRange { value: duty })?;

        debug!("Setting group {} to {} (reset: {})", group, level.0, reset);
        self.send_set(Target::Group(group), reset, level)?
            .map_err(GroupError::DeviceRejected)
    }

    /// Plays the fixed demonstration sequence, logging and skipping any failed step.
    ///
    /// See [`demo`](crate::demo) for the steps and for a variant that stops at the first failure.
    ///
    /// # Errors
    ///
    /// None with the default options; failed steps are counted in the returned [`DemoSummary`].
    pub fn run_demo_sequence<D: DelayNs + ?Sized>(&self, delay: &mut D) -> Result<DemoSummary, LightError> {
        demo::run(self, delay, DemoOptions::default())
    }

    fn probe(&self) -> bool {
        let scanned = self.bus.borrow_mut().scan();
        match scanned {
            Ok(addresses) if addresses.contains(&self.address) => {}
            Ok(addresses) => {
                info!("No device at {:02X}; bus has {:02X?}", self.address, addresses);
                return false;
            }
            Err(error) => {
                warn!("Bus scan failed: {}", error);
                return false;
            }
        }

        let identified = self.get_module_id().and_then(|id| {
            if id == ModuleId::PICO_LIGHTS {
                Ok(())
            } else {
                Err(ProtocolError::UnexpectedModuleId {
                    expected: ModuleId::PICO_LIGHTS.0,
                    actual: id.0,
                }
                .into())
            }
        });
        match identified {
            Ok(()) => true,
            Err(error) => {
                warn!("Device at {:02X} is not a lights module: {}", self.address, error);
                false
            }
        }
    }

    /// Sends a set command and reads back its one-byte status.
    fn send_set(&self, target: Target, reset: bool, duty: DutyCycle) -> Result<Result<(), StatusCode>, QueryError> {
        let frame = CommandFrame::set(target, reset, duty);
        let mut bus = self.bus.borrow_mut();
        bus.write(self.address, frame.as_bytes())?;
        let status = response::decode_status(&bus.read(self.address, 1)?)?;
        if let Err(status) = status {
            warn!("Lights module {:02X} rejected {}: {}", self.address, frame, status);
        }
        Ok(status)
    }

    /// Sends a query and reads back its length-prefixed payload.
    fn query_payload(&self, query: Query) -> Result<Vec<u8>, QueryError> {
        let mut bus = self.bus.borrow_mut();
        bus.write(self.address, CommandFrame::query(query).as_bytes())?;
        let length = response::decode_length(&bus.read(self.address, LENGTH_PREFIX_LEN)?)?;
        let payload = bus.read(self.address, length)?;
        Ok(response::verify_payload(length, payload)?)
    }
}
