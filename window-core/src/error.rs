use thiserror::Error;

/// Failures from the weather / region backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The backend answered 404 with `LOCATION_NOT_FOUND`.
    #[error("LOCATION_NOT_FOUND")]
    LocationNotFound,

    /// Transport failure, unexpected status or malformed body.
    #[error("WEATHER_API_FAILED: {0}")]
    ServiceUnavailable(String),
}

/// Failures from the window actuator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("ESP32 command failed with status {0}")]
    CommandFailed(u16),

    #[error("ESP32 status failed with status {0}")]
    StatusFailed(u16),

    #[error("ESP32 unreachable: {0}")]
    Unreachable(String),

    #[error("ESP32 sent an invalid response: {0}")]
    InvalidResponse(String),
}
