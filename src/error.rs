//! Error types for ht3-driver.

use thiserror::Error;

/// Main error type for all driver operations.
#[derive(Debug, Error)]
pub enum Ht3Error {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A socket operation did not finish in time.
    #[error("Timed out while {0}")]
    Timeout(&'static str),

    /// Gateway registration failed (bad client identifier, etc.).
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// No gateway connection is currently established.
    #[error("Not connected")]
    NotConnected,

    /// Gateway closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Another write sequence is still in progress.
    #[error("Write sequence already in progress")]
    WriteInProgress,

    /// Setpoint cannot be expressed in bus units.
    #[error("Setpoint {0} is outside the bus range 0..=127.5")]
    InvalidSetpoint(f64),

    /// Unknown heating-circuit mode code.
    #[error("Invalid heating circuit mode code: {0}")]
    InvalidMode(u8),

    /// The connection task is no longer running.
    #[error("Driver stopped")]
    DriverStopped,
}

/// Result type alias using Ht3Error.
pub type Result<T> = std::result::Result<T, Ht3Error>;
