use thiserror::Error;

/// A value supplied by the caller is outside its declared range.
///
/// Always detected before anything is written to the bus.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValidationError {
    /// Light ID was not in 0–15.
    #[error("Light ID must be between 0 and 15, got {}", value)]
    LightIdOutOfRange {
        /// The rejected value.
        value: i32,
    },

    /// Group ID was not in 0–15.
    #[error("Group ID must be between 0 and 15, got {}", value)]
    GroupIdOutOfRange {
        /// The rejected value.
        value: i32,
    },

    /// Duty cycle was not in 0–255.
    #[error("Duty cycle must be between 0 and 255, got {}", value)]
    DutyOutOfRange {
        /// The rejected value.
        value: i32,
    },
}

/// A module answered, but not in a way the protocol allows.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A length-prefixed response declared a length of zero.
    #[error("Module declared an empty payload")]
    EmptyPayload,

    /// Fewer (or more) bytes arrived than the response declared.
    #[error("Response length mismatch: Expected {} bytes, got {}", expected, actual)]
    LengthMismatch {
        /// Number of bytes declared or requested.
        expected: usize,

        /// Number of bytes actually delivered.
        actual: usize,
    },

    /// A payload too long for the 2-byte length prefix.
    #[error("Payload of {} bytes exceeds the maximum of {}", actual, max)]
    PayloadTooLong {
        /// Largest encodable payload.
        max: usize,

        /// Length of the payload that was provided.
        actual: usize,
    },

    /// A text payload was not valid ASCII/UTF-8.
    #[error("Module sent a text payload that is not valid text")]
    InvalidText {
        /// The underlying decoding error.
        #[from]
        source: std::string::FromUtf8Error,
    },

    /// The group configuration was not valid JSON of the expected shape.
    #[error("Module sent malformed group configuration JSON")]
    InvalidGroupConfig {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A group configuration key was not a group ID.
    #[error("Group configuration key {:?} is not a group ID between 0 and 15", key)]
    InvalidGroupKey {
        /// The offending key.
        key: String,
    },

    /// A group listed a member that is not a light ID.
    #[error("Group {} lists {} which is not a light ID between 0 and 15", group, value)]
    InvalidGroupMember {
        /// Group containing the bad entry.
        group: u8,

        /// The offending member.
        value: i64,
    },

    /// The device at the address is not a light module.
    #[error("Unexpected module ID: Expected 0x{:02X}, got 0x{:02X}", expected, actual)]
    UnexpectedModuleId {
        /// The ID light modules report.
        expected: u8,

        /// The ID that was reported.
        actual: u8,
    },
}
