use std::fmt::{self, Display, Formatter};

use derive_more::{Display, LowerHex, UpperHex};

use crate::ValidationError;

/// Number of bytes in every command sent to a module, regardless of payload.
pub const FRAME_LEN: usize = 8;

/// High bits shared by every "set light/group" control byte.
pub const SET_FAMILY: u8 = 0b1100_0000;

/// Control byte flag selecting a group rather than an individual light.
pub const GROUP_FLAG: u8 = 0b0010_0000;

/// Control byte flag asking the module to turn every other light off first.
pub const RESET_FLAG: u8 = 0b0001_0000;

const FAMILY_MASK: u8 = 0b1100_0000;
const QUERY_FAMILY: u8 = 0b1000_0000;
const ID_MASK: u8 = 0b0000_1111;

/// The 7-bit address of a light module on the bus.
///
/// # Examples
///
/// ```
/// use picolights_core::Address;
///
/// let address = Address::default();
/// assert_eq!(Address(0x41), address);
/// assert_eq!("41", format!("{:X}", address));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, LowerHex, UpperHex)]
pub struct Address(pub u8);

impl Address {
    /// Highest address representable on a 7-bit bus.
    pub const MAX: u8 = 0x7F;
}

impl Default for Address {
    fn default() -> Self {
        Address(0x41)
    }
}

macro_rules! bounded_id {
    ($(#[$meta:meta])* $name:ident, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
        pub struct $name(u8);

        impl $name {
            /// Largest valid ID.
            pub const MAX: u8 = 15;

            /// Creates a new ID, checking that it fits in four bits.
            ///
            /// # Errors
            ///
            /// Returns the matching [`ValidationError`] if `value` is outside 0–15.
            pub fn try_new(value: i32) -> Result<Self, ValidationError> {
                match u8::try_from(value) {
                    Ok(id) if id <= Self::MAX => Ok($name(id)),
                    _ => Err(ValidationError::$variant { value }),
                }
            }

            /// Returns the raw ID.
            pub fn get(self) -> u8 {
                self.0
            }

            /// Iterates over every valid ID in ascending order.
            pub fn all() -> impl DoubleEndedIterator<Item = $name> {
                (0..=Self::MAX).map($name)
            }
        }
    };
}

bounded_id!(
    /// ID of a single light on a module, in the range 0–15.
    ///
    /// # Examples
    ///
    /// ```
    /// use picolights_core::LightId;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let id = LightId::try_new(7)?;
    /// assert_eq!(7, id.get());
    /// assert!(LightId::try_new(16).is_err());
    /// # Ok(()) }
    /// ```
    LightId,
    LightIdOutOfRange
);

bounded_id!(
    /// ID of a group of lights defined by a module, in the range 0–15.
    GroupId,
    GroupIdOutOfRange
);

/// PWM duty cycle for a light: 0 is off, 255 is fully on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct DutyCycle(pub u8);

impl DutyCycle {
    /// Light switched off.
    pub const OFF: DutyCycle = DutyCycle(0);

    /// Light fully on.
    pub const FULL: DutyCycle = DutyCycle(255);

    /// Creates a duty cycle from an externally supplied integer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DutyOutOfRange`] if `value` is outside 0–255.
    pub fn try_new(value: i32) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .map(DutyCycle)
            .map_err(|_| ValidationError::DutyOutOfRange { value })
    }
}

/// What a "set" command applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A single light.
    Light(LightId),
    /// Every light in a module-defined group.
    Group(GroupId),
}

impl Target {
    fn id_bits(self) -> u8 {
        match self {
            Target::Light(id) => id.get(),
            Target::Group(id) => id.get(),
        }
    }
}

/// The query opcodes understood by a light module.
///
/// Each query is answered with a response the caller must read back immediately.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Single status byte identifying the kind of module.
    ModuleId,
    /// Length-prefixed ASCII version string.
    Version,
    /// Length-prefixed JSON group assignments.
    Groups,
}

impl Query {
    /// Returns the control byte for this query.
    pub fn opcode(self) -> u8 {
        match self {
            Query::ModuleId => 0b1000_0001,
            Query::Version => 0b1000_0010,
            Query::Groups => 0b1000_0011,
        }
    }

    /// Looks up the query for a control byte, if it is one.
    pub fn from_opcode(opcode: u8) -> Option<Query> {
        match opcode {
            0b1000_0001 => Some(Query::ModuleId),
            0b1000_0010 => Some(Query::Version),
            0b1000_0011 => Some(Query::Groups),
            _ => None,
        }
    }
}

/// The first byte of a [`CommandFrame`].
///
/// Bit layout for the "set" family:
///
/// ```text
/// ┌───┬───┬───┬───┬───┬───┬───┬───┐
/// │ 1 │ 1 │ G │ R │ I │ I │ I │ I │
/// └───┴───┴───┴───┴───┴───┴───┴───┘
///           │   │   └─── target id
///           │   └─────── reset others first
///           └─────────── group (1) or light (0)
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, LowerHex, UpperHex)]
pub struct ControlByte(pub u8);

impl ControlByte {
    /// Builds the control byte for a "set" command.
    ///
    /// # Examples
    ///
    /// ```
    /// use picolights_core::{ControlByte, LightId, Target};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let byte = ControlByte::set(Target::Light(LightId::try_new(5)?), true);
    /// assert_eq!(ControlByte(0b1101_0101), byte);
    /// # Ok(()) }
    /// ```
    pub fn set(target: Target, reset: bool) -> Self {
        let mut byte = SET_FAMILY | target.id_bits();
        if let Target::Group(_) = target {
            byte |= GROUP_FLAG;
        }
        if reset {
            byte |= RESET_FLAG;
        }
        ControlByte(byte)
    }

    /// Whether the byte belongs to the "set light/group" family.
    pub fn is_set(self) -> bool {
        self.0 & FAMILY_MASK == SET_FAMILY
    }

    /// Whether the byte belongs to the query family.
    pub fn is_query(self) -> bool {
        self.0 & FAMILY_MASK == QUERY_FAMILY
    }

    /// Whether the group flag is set.
    pub fn is_group(self) -> bool {
        self.0 & GROUP_FLAG != 0
    }

    /// Whether the reset flag is set.
    pub fn is_reset(self) -> bool {
        self.0 & RESET_FLAG != 0
    }

    /// The low four bits, i.e. the light or group ID.
    pub fn target_id(self) -> u8 {
        self.0 & ID_MASK
    }
}

/// High-level meaning of a [`CommandFrame`].
///
/// Freely convertible to and from a frame, with `Unknown` preserving control bytes
/// that match neither family so they can still be logged or rejected by a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Set a light or group to a duty cycle, optionally turning every other light off.
    Set {
        /// Light or group being driven.
        target: Target,
        /// Reset all other lights to 0 first.
        reset: bool,
        /// New duty cycle.
        duty: DutyCycle,
    },
    /// Ask the module for some information.
    Query(Query),
    /// Control byte not understood.
    Unknown(ControlByte),
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Command::Set { target, reset, duty } => {
                match target {
                    Target::Light(id) => write!(f, "Set light {}", id)?,
                    Target::Group(id) => write!(f, "Set group {}", id)?,
                }
                write!(f, " to {}", duty)?;
                if reset {
                    write!(f, " (reset others)")?;
                }
                Ok(())
            }
            Command::Query(query) => write!(f, "Query {:?}", query),
            Command::Unknown(byte) => write!(f, "Unknown {:02X}", byte.0),
        }
    }
}

/// The fixed 8-byte frame written to a module for every command.
///
/// Byte 0 is the [`ControlByte`], byte 1 carries the duty cycle for "set" commands,
/// and the rest is zero padding.
///
/// # Examples
///
/// ```
/// use picolights_core::{CommandFrame, DutyCycle, LightId, Target};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let frame = CommandFrame::set(Target::Light(LightId::try_new(3)?), false, DutyCycle(200));
/// assert_eq!(&[0xC3, 200, 0, 0, 0, 0, 0, 0], frame.as_bytes());
/// # Ok(()) }
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandFrame([u8; FRAME_LEN]);

impl CommandFrame {
    /// Builds a "set light/group" frame.
    pub fn set(target: Target, reset: bool, duty: DutyCycle) -> Self {
        let mut bytes = [0; FRAME_LEN];
        bytes[0] = ControlByte::set(target, reset).0;
        bytes[1] = duty.0;
        CommandFrame(bytes)
    }

    /// Builds a query frame, padded like every other frame.
    pub fn query(query: Query) -> Self {
        let mut bytes = [0; FRAME_LEN];
        bytes[0] = query.opcode();
        CommandFrame(bytes)
    }

    /// Pads whatever was received into a frame.
    ///
    /// Returns `None` if `bytes` is empty or longer than [`FRAME_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > FRAME_LEN {
            return None;
        }
        let mut frame = [0; FRAME_LEN];
        frame[..bytes.len()].copy_from_slice(bytes);
        Some(CommandFrame(frame))
    }

    /// The wire representation.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The frame's control byte.
    pub fn control(&self) -> ControlByte {
        ControlByte(self.0[0])
    }

    /// The duty cycle payload byte.
    pub fn duty(&self) -> DutyCycle {
        DutyCycle(self.0[1])
    }
}

impl From<Command> for CommandFrame {
    fn from(command: Command) -> Self {
        match command {
            Command::Set { target, reset, duty } => CommandFrame::set(target, reset, duty),
            Command::Query(query) => CommandFrame::query(query),
            Command::Unknown(byte) => {
                let mut bytes = [0; FRAME_LEN];
                bytes[0] = byte.0;
                CommandFrame(bytes)
            }
        }
    }
}

impl From<CommandFrame> for Command {
    fn from(frame: CommandFrame) -> Self {
        let control = frame.control();
        if control.is_set() {
            // Four bits always fit, so the bounded constructors cannot fail here.
            let id = control.target_id();
            let target = if control.is_group() {
                Target::Group(GroupId(id))
            } else {
                Target::Light(LightId(id))
            };
            Command::Set {
                target,
                reset: control.is_reset(),
                duty: frame.duty(),
            }
        } else {
            match Query::from_opcode(control.0) {
                Some(query) => Command::Query(query),
                None => Command::Unknown(control),
            }
        }
    }
}

impl Display for CommandFrame {
    /// Formats the frame as hex bytes, for watching bus traffic.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn every_light_and_duty_encodes() {
        for id in LightId::all() {
            for duty in 0..=255u8 {
                for &reset in &[false, true] {
                    let frame = CommandFrame::set(Target::Light(id), reset, DutyCycle(duty));
                    let bytes = frame.as_bytes();
                    assert_eq!(FRAME_LEN, bytes.len());
                    assert_eq!(id.get(), bytes[0] & 0x0F);
                    assert_eq!(reset, bytes[0] & 0b0001_0000 != 0);
                    assert_eq!(0, bytes[0] & GROUP_FLAG);
                    assert_eq!(duty, bytes[1]);
                    assert!(bytes[2..].iter().all(|&b| b == 0));
                }
            }
        }
    }

    #[test_case(0, false, 0b1110_0000 ; "group zero")]
    #[test_case(15, false, 0b1110_1111 ; "group fifteen")]
    #[test_case(4, true, 0b1111_0100 ; "group with reset")]
    fn group_control_byte(id: i32, reset: bool, expected: u8) {
        let target = Target::Group(GroupId::try_new(id).unwrap());
        assert_eq!(ControlByte(expected), ControlByte::set(target, reset));
    }

    #[test_case(Query::ModuleId, 0x81)]
    #[test_case(Query::Version, 0x82)]
    #[test_case(Query::Groups, 0x83)]
    fn query_frames(query: Query, opcode: u8) {
        let frame = CommandFrame::query(query);
        assert_eq!(&[opcode, 0, 0, 0, 0, 0, 0, 0], frame.as_bytes());
        assert_eq!(Some(query), Query::from_opcode(opcode));
        assert_eq!(Command::Query(query), Command::from(frame));
    }

    #[test_case(-1 ; "negative")]
    #[test_case(16 ; "just over")]
    #[test_case(1000 ; "way over")]
    fn light_id_out_of_range(value: i32) {
        let error = LightId::try_new(value).unwrap_err();
        assert!(matches!(error, ValidationError::LightIdOutOfRange { value: v } if v == value));
    }

    #[test_case(-1)]
    #[test_case(256)]
    fn duty_out_of_range(value: i32) {
        let error = DutyCycle::try_new(value).unwrap_err();
        assert!(matches!(error, ValidationError::DutyOutOfRange { value: v } if v == value));
    }

    #[test]
    fn command_decodes_set() {
        let frame = CommandFrame::from_bytes(&[0b1111_0011, 42]).unwrap();
        let command = Command::from(frame);
        assert_eq!(
            Command::Set {
                target: Target::Group(GroupId(3)),
                reset: true,
                duty: DutyCycle(42),
            },
            command
        );
        assert_eq!(frame, CommandFrame::from(command));
    }

    #[test]
    fn unknown_control_byte_preserved() {
        let frame = CommandFrame::from_bytes(&[0x05]).unwrap();
        assert_eq!(Command::Unknown(ControlByte(0x05)), Command::from(frame));
        let frame = CommandFrame::from_bytes(&[0x84]).unwrap();
        assert_eq!(Command::Unknown(ControlByte(0x84)), Command::from(frame));
    }

    #[test]
    fn from_bytes_rejects_bad_lengths() {
        assert_eq!(None, CommandFrame::from_bytes(&[]));
        assert_eq!(None, CommandFrame::from_bytes(&[0; 9]));
    }

    #[test]
    fn display() {
        let frame = CommandFrame::set(Target::Light(LightId(1)), false, DutyCycle(0xCB));
        assert_eq!("C1 CB 00 00 00 00 00 00", format!("{}", frame));
        assert_eq!("Set light 1 to 203", format!("{}", Command::from(frame)));
    }
}
