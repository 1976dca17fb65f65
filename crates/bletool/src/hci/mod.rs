//! Bluetooth HCI (Host Controller Interface) implementation
//!
//! This module provides functionality for interacting with HCI interfaces.

pub mod constants;
pub mod filter;
pub mod packet;
pub mod socket;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use filter::{HciFilter, PacketTypes};
pub use packet::{HciCommand, HciEvent, Opcode};
pub use socket::{HciDevice, HciSocket};
pub use transport::{send_request, Device, Transport};
