//! Error types for the bletool library
//!
//! Every controller operation returns a `Result<_, HciError>`. Nothing in the
//! library terminates the process; the caller decides what is fatal.

use thiserror::Error;

/// Errors that can occur while driving the HCI transport
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Could not open device: {0}")]
    DeviceOpenFailure(std::io::Error),

    #[error("HCI filter setup failed: {0}")]
    FilterInstallFailure(std::io::Error),

    #[error("Could not get or set socket options: {0}")]
    ScanFilterFailure(std::io::Error),

    #[error("Send failed: {0}")]
    CommandSendFailure(std::io::Error),

    #[error("Set scan parameters failed: {0}")]
    ScanParameterFailure(Box<HciError>),

    #[error("Set scan enable failed: {0}")]
    ScanEnableFailure(Box<HciError>),

    #[error("Could not restore socket filter: {0}")]
    FilterRestoreFailure(std::io::Error),

    #[error("Failed to receive HCI event: {0}")]
    ReceiveError(std::io::Error),

    #[error("Could not write advertising report: {0}")]
    ReportOutputFailure(std::io::Error),

    #[error("Timed out waiting for command complete (opcode {opcode:#06x})")]
    Timeout { opcode: u16 },

    #[error("Controller rejected opcode {opcode:#06x} with status {status:#04x}")]
    CommandStatus { opcode: u16, status: u8 },

    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Advertising data too long: {0} hex characters, at most {1} allowed")]
    PayloadTooLong(usize, usize),

    #[error("Invalid parameter length: {0}")]
    InvalidParamLength(usize),

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,
}

impl HciError {
    /// Whether the error must abort the running command sequence.
    ///
    /// Only a filter failure during scan setup is recoverable: the scan
    /// controller closes the handle and reports `ScanFilterFailure`, and the
    /// caller may fall back to a detached scan stop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HciError::ScanFilterFailure(_))
    }
}
