//! Advertise and scan controllers built on the HCI transport

pub mod advertise;
pub mod scan;


pub use advertise::{AdvertiseParams, Advertiser, AdvertisingData, ADVERTISE_DWELL};
pub use scan::{ScanParams, ScanSession, ScanState, Scanner};
