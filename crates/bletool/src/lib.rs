//! bletool - Bluetooth LE advertising and passive scanning over raw HCI
//!
//! This library drives a single local controller through its HCI command and
//! event channel on Linux. It can broadcast a fixed-format advertisement for a
//! short, fixed time, or passively scan and hand back the raw advertising
//! reports it receives.

pub mod cancel;
pub mod command;
pub mod controller;
pub mod error;
pub mod hci;
pub mod reader;

// Re-export common types for convenience
pub use cancel::{interrupt_token, CancelToken};
pub use command::{decode_hex, encode_hex, send_command, send_hex};
pub use controller::{
    AdvertiseParams, Advertiser, AdvertisingData, ScanParams, ScanSession, ScanState, Scanner,
};
pub use error::HciError;
pub use hci::{Device, HciCommand, HciDevice, HciFilter, HciSocket, Opcode, Transport};
pub use reader::{AdvertisingReport, AdvertisingReports};

