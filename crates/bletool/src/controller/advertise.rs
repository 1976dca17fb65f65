//! Advertising: parameters, payload, enable, dwell, disable
//!
//! Every step is a separate [`send_command`] session, so a full run opens and
//! closes the device four times.

use crate::command::{decode_hex, send_command};
use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::{Device, HciCommand};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// How long advertising stays enabled
pub const ADVERTISE_DWELL: Duration = Duration::from_secs(1);

/// Advertising interval bounds, in controller interval units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertiseParams {
    pub min_interval: u16,
    pub max_interval: u16,
}

impl Default for AdvertiseParams {
    fn default() -> Self {
        Self {
            min_interval: 32,
            max_interval: 64,
        }
    }
}

/// The 32-byte advertising payload: fixed header, caller data, zero fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingData {
    bytes: [u8; ADV_DATA_LEN],
}

impl AdvertisingData {
    /// Hex characters left for caller data after the header
    pub const MAX_TAIL_HEX_LEN: usize = ADV_DATA_LEN * 2 - ADV_DATA_HEADER.len();

    /// Builds the payload from the caller's hex tail.
    ///
    /// The tail is appended to the header and the result is right-padded with
    /// `'0'` to 64 hex characters, so an odd-length tail is completed by a
    /// zero nibble. Tails longer than [`Self::MAX_TAIL_HEX_LEN`] are rejected.
    pub fn from_hex_tail(tail: &str) -> Result<Self, HciError> {
        if tail.len() > Self::MAX_TAIL_HEX_LEN {
            return Err(HciError::PayloadTooLong(
                tail.len(),
                Self::MAX_TAIL_HEX_LEN,
            ));
        }

        let hex = format!("{ADV_DATA_HEADER}{tail:0<width$}", width = Self::MAX_TAIL_HEX_LEN);
        let decoded = decode_hex(&hex)?;

        if decoded.len() != ADV_DATA_LEN {
            return Err(HciError::InvalidParamLength(decoded.len()));
        }
        let mut bytes = [0u8; ADV_DATA_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; ADV_DATA_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.bytes)
    }
}

/// Drives the advertising command sequence against one device
pub struct Advertiser<'a, D: Device> {
    device: &'a D,
    params: AdvertiseParams,
    dwell: Duration,
}

impl<'a, D: Device> Advertiser<'a, D> {
    pub fn new(device: &'a D, params: AdvertiseParams) -> Self {
        if params.min_interval > params.max_interval {
            warn!(
                min = params.min_interval,
                max = params.max_interval,
                "minimum advertising interval exceeds maximum"
            );
        }
        Self {
            device,
            params,
            dwell: ADVERTISE_DWELL,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    /// Sends the interval parameters
    pub fn configure(&self) -> Result<(), HciError> {
        send_command(
            self.device,
            &HciCommand::LeSetAdvertisingParameters {
                min_interval: self.params.min_interval,
                max_interval: self.params.max_interval,
            },
        )
    }

    /// Sends the advertising payload
    pub fn set_data(&self, data: &AdvertisingData) -> Result<(), HciError> {
        send_command(
            self.device,
            &HciCommand::LeSetAdvertisingData {
                data: *data.as_bytes(),
            },
        )
    }

    /// Turns advertising on or off
    pub fn set_enabled(&self, enable: bool) -> Result<(), HciError> {
        send_command(self.device, &HciCommand::LeSetAdvertisingEnable { enable })
    }

    /// Configures, loads `data`, advertises for the dwell time, then stops
    pub fn advertise(&self, data: &AdvertisingData) -> Result<(), HciError> {
        self.configure()?;
        self.set_data(data)?;
        self.set_enabled(true)?;

        info!(payload = %data.to_hex(), dwell = ?self.dwell, "advertising");
        thread::sleep(self.dwell);

        self.set_enabled(false)?;
        info!("advertising stopped");
        Ok(())
    }
}
