//! Example: LE Scanning
//!
//! Passively scans and prints advertising reports until interrupted with
//! Ctrl-C. The scan is disabled on the way out, even after an error.

use bletool::{interrupt_token, HciDevice, ScanParams, Scanner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cancel = interrupt_token()?;
    let device = HciDevice::new("hci0");
    let scanner = Scanner::new(&device, ScanParams::default());

    let session = scanner.start()?;
    println!("Scanning on {}...", device.name());

    let delivered = session.run(&cancel, |report| {
        println!("{report}");
        Ok(())
    })?;

    println!("Stopped scanning after {delivered} reports");
    Ok(())
}
