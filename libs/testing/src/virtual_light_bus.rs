use std::collections::VecDeque;

use log::{debug, info, warn};

use picolights_core::{
    response, Address, BusError, Command, CommandFrame, DutyCycle, GroupConfig, LightBus, LightId, ModuleId, Query,
    StatusCode, Target, PROTOCOL_VERSION,
};

/// Mock implementation of a bus containing one or more light modules.
///
/// The bus is populated with one or more [`VirtualLightModule`]s which actually implement the
/// module side of the protocol. Writes and reads are routed to the module with the matching
/// address; addressing an absent module fails with [`BusError::NoAcknowledge`], just like a real bus.
///
/// Every transaction is counted and every write is recorded, so tests can verify exactly what
/// a driver put on the wire (or that it put nothing there at all).
///
/// Transactions are logged using the [`log`] crate for debugging purposes. Consuming binaries
/// typically use the [`env_logger`] crate and can be run with the `RUST_LOG=debug` environment variable
/// to watch the bus traffic go by.
///
/// # Examples
///
/// ```
/// use picolights_core::{Address, LightBus};
/// use picolights_testing::{VirtualLightBus, VirtualLightModule};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// #
/// let mut bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))]);
/// assert_eq!(vec![Address(0x41)], bus.scan()?);
/// assert!(bus.write(Address(0x42), &[0x81]).is_err());
/// #
/// # Ok(()) }
/// ```
///
/// [`log`]: https://crates.io/crates/log
/// [`env_logger`]: https://crates.io/crates/env_logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualLightBus {
    modules: Vec<VirtualLightModule>,
    writes: Vec<(Address, Vec<u8>)>,
    transactions: usize,
}

impl VirtualLightBus {
    /// Creates a new `VirtualLightBus` with the specified virtual modules.
    pub fn new<I>(modules: I) -> Self
    where
        I: IntoIterator<Item = VirtualLightModule>,
    {
        VirtualLightBus {
            modules: modules.into_iter().collect(),
            writes: vec![],
            transactions: 0,
        }
    }

    /// Returns a reference to the [`VirtualLightModule`] at a specific index matching the original order passed to `new`.
    ///
    /// Useful when writing tests in order to verify properties of an individual module.
    ///
    /// # Examples
    ///
    /// ```
    /// # use picolights_core::Address;
    /// # use picolights_testing::{VirtualLightBus, VirtualLightModule};
    /// let modules = vec![VirtualLightModule::new(Address(0x41)), VirtualLightModule::new(Address(0x50))];
    /// let bus = VirtualLightBus::new(modules);
    /// assert_eq!(Address(0x50), bus.module(1).address());
    /// ```
    pub fn module(&self, index: usize) -> &VirtualLightModule {
        &self.modules[index]
    }

    /// Mutable access to a module, e.g. to change what it reports mid-test.
    pub fn module_mut(&mut self, index: usize) -> &mut VirtualLightModule {
        &mut self.modules[index]
    }

    /// Total number of scan, write and read transactions attempted so far.
    pub fn transaction_count(&self) -> usize {
        self.transactions
    }

    /// Every write attempted so far, in order, including ones nobody acknowledged.
    pub fn writes(&self) -> &[(Address, Vec<u8>)] {
        &self.writes
    }

    /// Forgets recorded writes and transaction counts.
    pub fn clear_history(&mut self) {
        self.writes.clear();
        self.transactions = 0;
    }

    fn find(&mut self, address: Address) -> Result<&mut VirtualLightModule, BusError> {
        self.modules
            .iter_mut()
            .find(|module| module.address == address)
            .ok_or(BusError::NoAcknowledge { address })
    }
}

impl LightBus for VirtualLightBus {
    fn scan(&mut self) -> Result<Vec<Address>, BusError> {
        self.transactions += 1;
        let found = self.modules.iter().map(VirtualLightModule::address).collect::<Vec<_>>();
        debug!("Bus scan: {:?}", found);
        Ok(found)
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), BusError> {
        self.transactions += 1;
        self.writes.push((address, bytes.to_vec()));
        debug!("[Addr {:02X}] <-- {:02X?}", address, bytes);
        self.find(address)?.process_write(bytes);
        Ok(())
    }

    fn read(&mut self, address: Address, len: usize) -> Result<Vec<u8>, BusError> {
        self.transactions += 1;
        let data = self.find(address)?.process_read(len);
        debug!("[Addr {:02X}] --> {:02X?}", address, data);
        Ok(data)
    }
}

/// Mock implementation of a single light module on a [`VirtualLightBus`].
///
/// Keeps the duty cycle of each of its 16 lights, answers queries from its configured
/// identity, version and groups, and buffers the response to the last command until it is read.
///
/// # Examples
///
/// ```
/// # use picolights_core::{Address, CommandFrame, DutyCycle, LightId, Target};
/// # use picolights_testing::VirtualLightModule;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut module = VirtualLightModule::new(Address(0x41));
/// let id = LightId::try_new(2)?;
/// module.process_write(CommandFrame::set(Target::Light(id), false, DutyCycle(80)).as_bytes());
/// assert_eq!(vec![0], module.process_read(1));
/// assert_eq!(DutyCycle(80), module.duty(id));
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualLightModule {
    address: Address,
    module_id: ModuleId,
    version: String,
    groups: GroupConfig,
    duties: [DutyCycle; 16],
    rejection: Option<StatusCode>,
    pending: VecDeque<u8>,
    payload_shortfall: usize,
    commands: Vec<Command>,
}

impl VirtualLightModule {
    /// Creates a module at `address` that reports the expected identity and protocol version
    /// and defines no groups.
    pub fn new(address: Address) -> Self {
        VirtualLightModule {
            address,
            module_id: ModuleId::PICO_LIGHTS,
            version: PROTOCOL_VERSION.to_owned(),
            groups: GroupConfig::new(),
            duties: [DutyCycle::OFF; 16],
            rejection: None,
            pending: VecDeque::new(),
            payload_shortfall: 0,
            commands: vec![],
        }
    }

    /// Reports `module_id` instead of the Pico lights ID.
    pub fn with_module_id(mut self, module_id: ModuleId) -> Self {
        self.module_id = module_id;
        self
    }

    /// Reports `version` instead of the driver's protocol version.
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = version.into();
        self
    }

    /// Defines the module's groups.
    pub fn with_groups(mut self, groups: GroupConfig) -> Self {
        self.groups = groups;
        self
    }

    /// Answers every "set" command with `status` instead of applying it.
    pub fn rejecting(mut self, status: StatusCode) -> Self {
        self.rejection = Some(status);
        self
    }

    /// Withholds the last `bytes` of every length-prefixed payload, as a flaky link would.
    pub fn short_by(mut self, bytes: usize) -> Self {
        self.payload_shortfall = bytes;
        self
    }

    /// Replaces the module's groups, e.g. to make the driver's copy stale.
    pub fn set_groups(&mut self, groups: GroupConfig) {
        self.groups = groups;
    }

    /// Returns the module's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the current duty cycle of a light.
    pub fn duty(&self, id: LightId) -> DutyCycle {
        self.duties[usize::from(id.get())]
    }

    /// Returns the current duty cycle of every light, indexed by ID.
    pub fn duties(&self) -> &[DutyCycle; 16] {
        &self.duties
    }

    /// Returns every command received, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Handles a write addressed to this module, preparing the response.
    pub fn process_write(&mut self, bytes: &[u8]) {
        self.pending.clear();
        let command = match CommandFrame::from_bytes(bytes) {
            Some(frame) => Command::from(frame),
            None => {
                warn!("Vmodule {:02X} ignoring {}-byte write", self.address, bytes.len());
                self.respond_status(Some(StatusCode::UnrecognizedCommand));
                return;
            }
        };
        self.commands.push(command);

        match command {
            Command::Set { target, reset, duty } => self.set(target, reset, duty),
            Command::Query(Query::ModuleId) => self.pending.push_back(self.module_id.0),
            Command::Query(Query::Version) => {
                let payload = self.version.clone().into_bytes();
                self.respond_payload(&payload);
            }
            Command::Query(Query::Groups) => {
                let payload = self.groups.to_json().into_bytes();
                self.respond_payload(&payload);
            }
            Command::Unknown(_) => self.respond_status(Some(StatusCode::UnrecognizedCommand)),
        }
    }

    /// Hands out up to `len` bytes of the pending response.
    ///
    /// Returns fewer bytes than requested if the response has run out.
    pub fn process_read(&mut self, len: usize) -> Vec<u8> {
        let available = len.min(self.pending.len());
        self.pending.drain(..available).collect()
    }

    /// Handles `Set` commands.
    fn set(&mut self, target: Target, reset: bool, duty: DutyCycle) {
        if let Some(status) = self.rejection {
            self.respond_status(Some(status));
            return;
        }

        let lights = match target {
            Target::Light(id) => vec![id],
            Target::Group(group) => match self.groups.lights(group) {
                Some(lights) => lights.iter().copied().collect(),
                None => {
                    warn!("Vmodule {:02X} has no group {}", self.address, group);
                    self.respond_status(Some(StatusCode::GroupConfigOutOfSync));
                    return;
                }
            },
        };

        if reset {
            self.duties = [DutyCycle::OFF; 16];
        }
        for id in lights {
            self.duties[usize::from(id.get())] = duty;
        }
        info!("Vmodule {:02X} duties {:?}", self.address, self.duties.map(|duty| duty.0));
        self.respond_status(None);
    }

    fn respond_status(&mut self, status: Option<StatusCode>) {
        self.pending.push_back(status.map_or(0, StatusCode::to_wire));
    }

    fn respond_payload(&mut self, payload: &[u8]) {
        match response::encode_length_prefixed(payload) {
            Ok(mut wire) => {
                let keep = wire.len() - self.payload_shortfall.min(payload.len());
                wire.truncate(keep);
                self.pending.extend(wire);
            }
            Err(e) => warn!("Vmodule {:02X} cannot send payload: {}", self.address, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picolights_core::GroupId;
    use test_case::test_case;

    fn light(id: i32) -> LightId {
        LightId::try_new(id).unwrap()
    }

    fn group(id: i32) -> GroupId {
        GroupId::try_new(id).unwrap()
    }

    fn module_with_groups() -> VirtualLightModule {
        let mut groups = GroupConfig::new();
        groups.insert(group(0), vec![light(1), light(2)]);
        groups.insert(group(1), vec![light(3)]);
        VirtualLightModule::new(Address(0x41)).with_groups(groups)
    }

    #[test]
    fn normal_behavior() {
        let mut module = module_with_groups();
        assert!(module.duties().iter().all(|&duty| duty == DutyCycle::OFF));

        // Identity and version
        module.process_write(CommandFrame::query(Query::ModuleId).as_bytes());
        assert_eq!(vec![0b10], module.process_read(1));

        module.process_write(CommandFrame::query(Query::Version).as_bytes());
        assert_eq!(vec![0, 5], module.process_read(2));
        assert_eq!(b"0.2.0".to_vec(), module.process_read(5));

        // Groups
        module.process_write(CommandFrame::query(Query::Groups).as_bytes());
        let length = response::decode_length(&module.process_read(2)).unwrap();
        let payload = module.process_read(length);
        assert_eq!(br#"{"0":[1,2],"1":[3]}"#.to_vec(), payload);

        // Individual light
        module.process_write(CommandFrame::set(Target::Light(light(5)), false, DutyCycle(100)).as_bytes());
        assert_eq!(vec![0], module.process_read(1));
        assert_eq!(DutyCycle(100), module.duty(light(5)));

        // Group with reset clears light 5
        module.process_write(CommandFrame::set(Target::Group(group(0)), true, DutyCycle(200)).as_bytes());
        assert_eq!(vec![0], module.process_read(1));
        assert_eq!(DutyCycle::OFF, module.duty(light(5)));
        assert_eq!(DutyCycle(200), module.duty(light(1)));
        assert_eq!(DutyCycle(200), module.duty(light(2)));

        assert_eq!(5, module.commands().len());
    }

    #[test]
    fn unknown_group_out_of_sync() {
        let mut module = module_with_groups();
        module.process_write(CommandFrame::set(Target::Group(group(9)), false, DutyCycle(1)).as_bytes());
        assert_eq!(vec![2], module.process_read(1));
    }

    #[test_case(&[0x00] ; "unknown opcode")]
    #[test_case(&[] ; "empty write")]
    #[test_case(&[0x81; 9] ; "too long")]
    fn unrecognised_commands(bytes: &[u8]) {
        let mut module = VirtualLightModule::new(Address(0x41));
        module.process_write(bytes);
        assert_eq!(vec![1], module.process_read(1));
    }

    #[test]
    fn rejection() {
        let mut module = VirtualLightModule::new(Address(0x41)).rejecting(StatusCode::DutyOutOfRange);
        module.process_write(CommandFrame::set(Target::Light(light(0)), false, DutyCycle(9)).as_bytes());
        assert_eq!(vec![20], module.process_read(1));
        assert_eq!(DutyCycle::OFF, module.duty(light(0)));
    }

    #[test]
    fn short_payload() {
        let mut module = VirtualLightModule::new(Address(0x41)).short_by(1);
        module.process_write(CommandFrame::query(Query::Version).as_bytes());
        assert_eq!(vec![0, 5], module.process_read(2));
        assert_eq!(b"0.2.".to_vec(), module.process_read(5));
    }

    #[test]
    fn new_write_discards_unread_response() {
        let mut module = VirtualLightModule::new(Address(0x41));
        module.process_write(CommandFrame::query(Query::Version).as_bytes());
        module.process_write(CommandFrame::query(Query::ModuleId).as_bytes());
        assert_eq!(vec![0b10], module.process_read(7));
    }

    #[test]
    fn bus_routes_by_address() {
        let mut bus = VirtualLightBus::new(vec![
            VirtualLightModule::new(Address(0x41)),
            VirtualLightModule::new(Address(0x42)).with_module_id(ModuleId(7)),
        ]);
        bus.write(Address(0x42), CommandFrame::query(Query::ModuleId).as_bytes()).unwrap();
        assert_eq!(vec![7], bus.read(Address(0x42), 1).unwrap());

        let error = bus.read(Address(0x10), 1).unwrap_err();
        assert!(matches!(error, BusError::NoAcknowledge { address: Address(0x10) }));

        assert_eq!(3, bus.transaction_count());
        assert_eq!(1, bus.writes().len());
        bus.clear_history();
        assert_eq!(0, bus.transaction_count());
    }
}
