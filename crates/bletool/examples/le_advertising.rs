//! Example: LE Advertising
//!
//! Broadcasts an Eddystone-style frame carrying a short payload for one second.

use bletool::{AdvertiseParams, Advertiser, AdvertisingData, HciDevice};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device = HciDevice::new("hci0");
    let data = AdvertisingData::from_hex_tail("0102030405")?;
    println!("Advertising {}", data.to_hex());

    Advertiser::new(&device, AdvertiseParams::default()).advertise(&data)?;
    Ok(())
}
