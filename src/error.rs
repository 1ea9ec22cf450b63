use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

/// Status code the host returns when it cannot service a call right now
/// (`RPC_E_SERVERCALL_RETRYLATER`).
pub const HOST_BUSY: u32 = 0x8001_010A;

/// How a host status code should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The host is momentarily unavailable; the same call may succeed later.
    Transient,
    /// Anything else. Retrying will not help.
    Permanent,
}

/// Map an opaque host status code onto an [`ErrorClass`].
///
/// This is the only place that knows how the host encodes "busy".
pub fn classify(code: u32) -> ErrorClass {
    match code {
        HOST_BUSY => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// A failure reported by the host, carrying its opaque status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("host error 0x{code:08X}: {message}")]
pub struct HostError {
    pub code: u32,
    pub message: String,
}

impl HostError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        HostError {
            code,
            message: message.into(),
        }
    }

    pub fn busy() -> Self {
        HostError::new(HOST_BUSY, "the host is busy")
    }

    pub fn class(&self) -> ErrorClass {
        classify(self.code)
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum NotewalkError {
    #[error("Custom error: {0}")]
    Custom(String),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Content failed schema validation: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for NotewalkError {
    fn from(src: toml::de::Error) -> NotewalkError {
        NotewalkError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for NotewalkError {
    fn from(src: toml::ser::Error) -> NotewalkError {
        NotewalkError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for NotewalkError {
    fn from(src: JsonError) -> NotewalkError {
        NotewalkError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for NotewalkError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => NotewalkError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => NotewalkError::PermissionDenied,
            _ => NotewalkError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_the_only_transient_code() {
        assert_eq!(classify(HOST_BUSY), ErrorClass::Transient);
        assert_eq!(classify(0x8004_2014), ErrorClass::Permanent);
        assert_eq!(classify(0), ErrorClass::Permanent);
        assert!(HostError::busy().is_transient());
    }

    #[test]
    fn host_error_display_shows_hex_code() {
        let err = HostError::new(0x8004_2014, "object does not exist");
        assert_eq!(
            err.to_string(),
            "host error 0x80042014: object does not exist"
        );
    }

    #[test]
    fn parse_failures_map_to_serialization() {
        let toml_err: NotewalkError = toml::from_str::<toml::Value>("[broken").unwrap_err().into();
        assert!(matches!(toml_err, NotewalkError::Serialization(_)));
        let json_err: NotewalkError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(json_err, NotewalkError::Serialization(_)));
    }

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: NotewalkError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, NotewalkError::NotFound(_)));
    }
}
