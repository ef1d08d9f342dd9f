//! Error types reported by sensor capabilities

use thiserror::Error;

/// Failure codes a heading watch can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassErrorCode {
    Internal,
    NotSupported,
}

impl CompassErrorCode {
    pub fn code(self) -> u16 {
        match self {
            CompassErrorCode::Internal => 0,
            CompassErrorCode::NotSupported => 20,
        }
    }
}

/// Failure codes a position watch can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl PositionErrorCode {
    pub fn code(self) -> u16 {
        match self {
            PositionErrorCode::PermissionDenied => 1,
            PositionErrorCode::PositionUnavailable => 2,
            PositionErrorCode::Timeout => 3,
        }
    }
}

/// Errors raised when starting a watch or delivered in place of a reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("compass error {}", .0.code())]
    Compass(CompassErrorCode),

    #[error("position error {}: {message}", .code.code())]
    Position {
        code: PositionErrorCode,
        message: String,
    },

    #[error("invalid watch options: {0}")]
    InvalidOptions(&'static str),

    #[error("{0} is not available on this host")]
    NotSupported(&'static str),

    #[error("device information unavailable: {0}")]
    DeviceUnavailable(String),
}

impl SensorError {
    pub fn position(code: PositionErrorCode, message: impl Into<String>) -> Self {
        SensorError::Position {
            code,
            message: message.into(),
        }
    }
}
