//! # Bus Error Types
//!
//! The hot path (push, consume, acquire, release) cannot fail. These errors
//! only come out of startup work: loading configuration and decoding
//! script-authored events into payloads.

use thiserror::Error;

/// Errors raised while configuring the bus or decoding authored events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A script referenced an event name nobody registered.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A script assigned a field the payload record does not have.
    #[error("event {event} has no field named {field}")]
    UnknownField {
        /// Payload record type name.
        event: String,
        /// The offending field name.
        field: String,
    },

    /// A field was assigned a value of the wrong kind or out of range.
    #[error("field {field}: expected {expected}, found {found}")]
    FieldType {
        /// The field being assigned.
        field: String,
        /// What the record expects (e.g. `u32`).
        expected: &'static str,
        /// What the script provided.
        found: String,
    },

    /// Fields were given for an event that carries no payload.
    #[error("event {0} is a signal and carries no payload")]
    NoPayload(String),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for fallible bus operations.
pub type BusResult<T> = Result<T, BusError>;
