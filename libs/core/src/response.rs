use std::fmt::{self, Display, Formatter};

use derive_more::{Display, LowerHex, UpperHex};

use crate::ProtocolError;

/// Number of bytes in the length prefix of a variable-length response.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Identifies the kind of module answering on the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, LowerHex, UpperHex)]
pub struct ModuleId(pub u8);

impl ModuleId {
    /// The ID every Pico light module reports.
    pub const PICO_LIGHTS: ModuleId = ModuleId(0b0000_0010);
}

/// Failure codes a module (or the driver on its behalf) reports.
///
/// The numbering is the legacy one: the module sends the magnitude as an unsigned
/// byte and the logical code is its negation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// `-1`: the command was not recognised.
    UnrecognizedCommand,
    /// `-2`: the module's group configuration differs from the one the driver holds.
    GroupConfigOutOfSync,
    /// `-10`: light or group ID out of range.
    IdOutOfRange,
    /// `-20`: duty cycle out of range.
    DutyOutOfRange,
    /// `-30`: group ID is not in the local group configuration.
    GroupNotInLocalConfig,
    /// Any other nonzero code.
    Other(i16),
}

impl StatusCode {
    /// Decodes a status byte. Wire value 0 means success and yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use picolights_core::StatusCode;
    ///
    /// assert_eq!(None, StatusCode::from_wire(0));
    /// assert_eq!(Some(StatusCode::UnrecognizedCommand), StatusCode::from_wire(1));
    /// assert_eq!(Some(StatusCode::Other(-99)), StatusCode::from_wire(99));
    /// ```
    pub fn from_wire(byte: u8) -> Option<StatusCode> {
        match wire_to_code(byte) {
            0 => None,
            code => Some(StatusCode::from_code(code)),
        }
    }

    /// Maps a legacy negative code to a `StatusCode`.
    pub fn from_code(code: i16) -> StatusCode {
        match code {
            -1 => StatusCode::UnrecognizedCommand,
            -2 => StatusCode::GroupConfigOutOfSync,
            -10 => StatusCode::IdOutOfRange,
            -20 => StatusCode::DutyOutOfRange,
            -30 => StatusCode::GroupNotInLocalConfig,
            other => StatusCode::Other(other),
        }
    }

    /// The legacy negative code.
    pub fn code(self) -> i16 {
        match self {
            StatusCode::UnrecognizedCommand => -1,
            StatusCode::GroupConfigOutOfSync => -2,
            StatusCode::IdOutOfRange => -10,
            StatusCode::DutyOutOfRange => -20,
            StatusCode::GroupNotInLocalConfig => -30,
            StatusCode::Other(code) => code,
        }
    }

    /// The status byte a module sends to report this code.
    ///
    /// Codes that do not fit a byte after negation saturate to 255.
    pub fn to_wire(self) -> u8 {
        u8::try_from(-i32::from(self.code())).unwrap_or(u8::MAX)
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let description = match self {
            StatusCode::UnrecognizedCommand => "command not recognised",
            StatusCode::GroupConfigOutOfSync => "group config out of sync",
            StatusCode::IdOutOfRange => "ID out of range",
            StatusCode::DutyOutOfRange => "duty cycle out of range",
            StatusCode::GroupNotInLocalConfig => "group not in local config",
            StatusCode::Other(_) => "unknown status",
        };
        write!(f, "{} ({})", description, self.code())
    }
}

/// Converts a status byte to its logical code by inverting the sign.
pub fn wire_to_code(byte: u8) -> i16 {
    -i16::from(byte)
}

/// Decodes a single-byte status response into `Ok(())` or the failure code.
///
/// # Errors
///
/// Returns [`ProtocolError::LengthMismatch`] unless exactly one byte was received.
pub fn decode_status(response: &[u8]) -> Result<Result<(), StatusCode>, ProtocolError> {
    match *response {
        [byte] => Ok(StatusCode::from_wire(byte).map_or(Ok(()), Err)),
        _ => Err(ProtocolError::LengthMismatch {
            expected: 1,
            actual: response.len(),
        }),
    }
}

/// Decodes the 2-byte big-endian length prefix of a variable-length response.
///
/// # Errors
///
/// Returns:
/// * [`ProtocolError::LengthMismatch`] if the prefix is not exactly two bytes.
/// * [`ProtocolError::EmptyPayload`] if the declared length is zero.
///
/// # Examples
///
/// ```
/// use picolights_core::response;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// assert_eq!(0x0102, response::decode_length(&[0x01, 0x02])?);
/// assert!(response::decode_length(&[0, 0]).is_err());
/// # Ok(()) }
/// ```
pub fn decode_length(prefix: &[u8]) -> Result<usize, ProtocolError> {
    match *prefix {
        [hi, lo] => match usize::from(u16::from_be_bytes([hi, lo])) {
            0 => Err(ProtocolError::EmptyPayload),
            length => Ok(length),
        },
        _ => Err(ProtocolError::LengthMismatch {
            expected: LENGTH_PREFIX_LEN,
            actual: prefix.len(),
        }),
    }
}

/// Checks that the payload read after a length prefix is exactly as long as declared.
///
/// A short payload is never accepted as a truncated value.
///
/// # Errors
///
/// Returns [`ProtocolError::LengthMismatch`] if `payload.len() != declared`.
pub fn verify_payload(declared: usize, payload: Vec<u8>) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() == declared {
        Ok(payload)
    } else {
        Err(ProtocolError::LengthMismatch {
            expected: declared,
            actual: payload.len(),
        })
    }
}

/// Decodes a version (or other text) payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidText`] if the payload is not valid text.
pub fn decode_text(payload: Vec<u8>) -> Result<String, ProtocolError> {
    Ok(String::from_utf8(payload)?)
}

/// Produces the wire form of a variable-length response, as a module sends it.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLong`] if the payload needs more than two length bytes.
///
/// # Examples
///
/// ```
/// use picolights_core::response;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let wire = response::encode_length_prefixed(b"0.2.0")?;
/// assert_eq!(b"\x00\x050.2.0", wire.as_slice());
/// # Ok(()) }
/// ```
pub fn encode_length_prefixed(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let length = u16::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLong {
        max: usize::from(u16::MAX),
        actual: payload.len(),
    })?;
    let mut wire = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    wire.extend_from_slice(&length.to_be_bytes());
    wire.extend_from_slice(payload);
    Ok(wire)
}
