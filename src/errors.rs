use thiserror::Error;

use crate::core::{Address, BusError, GroupId, ProtocolError, StatusCode};

/// A query to a module failed on the bus or came back malformed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The bus failed to complete a transaction.
    #[error("Bus failed during query")]
    Bus {
        /// The underlying bus error.
        #[from]
        source: BusError,
    },

    /// The module's response violated the protocol.
    #[error("Module response violated the protocol")]
    Protocol {
        /// The underlying protocol error.
        #[from]
        source: ProtocolError,
    },
}

/// Errors from [`LightController::set_light`](crate::LightController::set_light).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LightError {
    /// Light ID was not in 0–15. Nothing was sent.
    #[error("Light ID {} is out of range", value)]
    IdOutOfRange {
        /// The rejected ID.
        value: i32,
    },

    /// Duty cycle was not in 0–255. Nothing was sent.
    #[error("Duty cycle {} is out of range", value)]
    DutyOutOfRange {
        /// The rejected duty cycle.
        value: i32,
    },

    /// The module answered with a failure status.
    #[error("Module rejected the command: {0}")]
    DeviceRejected(StatusCode),

    /// The bus failed to complete a transaction.
    #[error("Bus failed while setting light")]
    Bus {
        /// The underlying bus error.
        #[source]
        source: BusError,
    },

    /// The module's status response was malformed.
    #[error("Module status violated the protocol")]
    Protocol {
        /// The underlying protocol error.
        #[source]
        source: ProtocolError,
    },
}

impl LightError {
    /// The legacy negative status code for this error, if it has one.
    ///
    /// Transport and protocol failures have no legacy code.
    pub fn code(&self) -> Option<i16> {
        match self {
            LightError::IdOutOfRange { .. } => Some(StatusCode::IdOutOfRange.code()),
            LightError::DutyOutOfRange { .. } => Some(StatusCode::DutyOutOfRange.code()),
            LightError::DeviceRejected(status) => Some(status.code()),
            LightError::Bus { .. } | LightError::Protocol { .. } => None,
        }
    }
}

impl From<QueryError> for LightError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Bus { source } => LightError::Bus { source },
            QueryError::Protocol { source } => LightError::Protocol { source },
        }
    }
}

/// Errors from [`LightController::set_group`](crate::LightController::set_group).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GroupError {
    /// Group ID was not in 0–15. Nothing was sent.
    #[error("Group ID {} is out of range", value)]
    IdOutOfRange {
        /// The rejected ID.
        value: i32,
    },

    /// Duty cycle was not in 0–255. Nothing was sent.
    #[error("Duty cycle {} is out of range", value)]
    DutyOutOfRange {
        /// The rejected duty cycle.
        value: i32,
    },

    /// The group is not in the cached group configuration. Nothing was sent.
    #[error("Group {} is not in the local group configuration", id)]
    NotInLocalConfig {
        /// The unknown group.
        id: GroupId,
    },

    /// The module answered with a failure status.
    #[error("Module rejected the command: {0}")]
    DeviceRejected(StatusCode),

    /// The bus failed to complete a transaction.
    #[error("Bus failed while setting group")]
    Bus {
        /// The underlying bus error.
        #[source]
        source: BusError,
    },

    /// The module's status response was malformed.
    #[error("Module status violated the protocol")]
    Protocol {
        /// The underlying protocol error.
        #[source]
        source: ProtocolError,
    },
}

impl GroupError {
    /// The legacy negative status code for this error, if it has one.
    ///
    /// Transport and protocol failures have no legacy code.
    pub fn code(&self) -> Option<i16> {
        match self {
            GroupError::IdOutOfRange { .. } => Some(StatusCode::IdOutOfRange.code()),
            GroupError::DutyOutOfRange { .. } => Some(StatusCode::DutyOutOfRange.code()),
            GroupError::NotInLocalConfig { .. } => Some(StatusCode::GroupNotInLocalConfig.code()),
            GroupError::DeviceRejected(status) => Some(status.code()),
            GroupError::Bus { .. } | GroupError::Protocol { .. } => None,
        }
    }
}

impl From<QueryError> for GroupError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Bus { source } => GroupError::Bus { source },
            QueryError::Protocol { source } => GroupError::Protocol { source },
        }
    }
}

/// Bringing a module into service failed.
///
/// Every variant means the caller should disable the module; `VersionMismatch` and `Disabled`
/// are terminal and must not be retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitError {
    /// No light module answered at the address.
    #[error("No light module found at address 0x{:02X}", address.0)]
    NotFound {
        /// The address that was probed.
        address: Address,
    },

    /// The module speaks a different protocol version.
    #[error("Module version {} does not match driver version {}", remote, local)]
    VersionMismatch {
        /// Version this driver speaks.
        local: String,

        /// Version the module reported.
        remote: String,
    },

    /// The module was already disabled by an earlier version mismatch.
    #[error("Module is disabled")]
    Disabled,

    /// A query failed while bringing the module up.
    #[error("Query failed while initialising module")]
    Query {
        /// The underlying query error.
        #[from]
        source: QueryError,
    },
}
