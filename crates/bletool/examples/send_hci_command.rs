//! Example: Sending raw HCI commands
//!
//! Sends an advertising enable and disable given as hex payloads, each over
//! its own short session.

use bletool::{send_hex, HciDevice, Opcode};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device = HciDevice::new("hci0");

    println!("Enabling advertising on {}...", device.name());
    send_hex(&device, Opcode::LE_SET_ADVERTISING_ENABLE, "01")?;

    std::thread::sleep(Duration::from_secs(2));

    println!("Disabling advertising...");
    send_hex(&device, Opcode::LE_SET_ADVERTISING_ENABLE, "00")?;

    Ok(())
}
