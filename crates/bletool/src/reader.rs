//! Advertising report reader
//!
//! Turns the frames arriving on a scanning transport into fixed 32-byte
//! advertising report windows, one frame per report.

use crate::cancel::CancelToken;
use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::transport::{is_transient, Transport};
use std::fmt;
use tracing::{debug, trace};

/// Bytes copied out of every report
pub const REPORT_LEN: usize = 32;

// Packet type, event header, sub-event code, report count, then the report's
// event type, address type, address and data length.
const REPORT_DATA_OFFSET: usize = 1 + HCI_EVENT_HDR_SIZE + 1 + 1 + 9;

/// Raw window over the data region of one advertising report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingReport {
    data: [u8; REPORT_LEN],
}

impl AdvertisingReport {
    /// Slices the report window out of a frame as read from the transport.
    ///
    /// The frame is not checked for being an LE advertising report; bytes past
    /// its end read as zero.
    pub fn from_frame(frame: &[u8]) -> Self {
        let mut data = [0u8; REPORT_LEN];
        if frame.len() > REPORT_DATA_OFFSET {
            let available = &frame[REPORT_DATA_OFFSET..];
            let n = available.len().min(REPORT_LEN);
            data[..n].copy_from_slice(&available[..n]);
        }
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.data
    }
}

/// Hex digits, two spaces, then the printable ASCII rendering
impl fmt::Display for AdvertisingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  ", hex::encode_upper(self.data))?;
        for &b in &self.data {
            let c = if (0x20..=0x7e).contains(&b) { b as char } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

fn is_advertising_report(frame: &[u8]) -> bool {
    frame.len() > 3
        && frame[0] == HCI_EVENT_PKT
        && frame[1] == EVT_LE_META_EVENT
        && frame[3] == EVT_LE_ADVERTISING_REPORT
}

/// Lazy, unbounded sequence of reports read from a transport.
///
/// Every item consumes exactly one frame. Iteration ends once the cancel
/// token is set; the reader checks it before each read and whenever a read is
/// interrupted. Other interrupted or would-block reads are retried.
pub struct AdvertisingReports<'a, T: Transport> {
    transport: &'a mut T,
    cancel: &'a CancelToken,
    buf: [u8; HCI_MAX_EVENT_SIZE],
    done: bool,
}

impl<'a, T: Transport> AdvertisingReports<'a, T> {
    pub fn new(transport: &'a mut T, cancel: &'a CancelToken) -> Self {
        Self {
            transport,
            cancel,
            buf: [0u8; HCI_MAX_EVENT_SIZE],
            done: false,
        }
    }

    /// Reads one frame, `Ok(None)` once cancelled
    pub fn read_report(&mut self) -> Result<Option<AdvertisingReport>, HciError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            match self.transport.read(&mut self.buf) {
                Ok(len) => {
                    let frame = &self.buf[..len];
                    if !is_advertising_report(frame) {
                        debug!(len, "unexpected frame while scanning, copying as-is");
                    }
                    trace!(frame = %hex::encode_upper(frame), "received frame");
                    return Ok(Some(AdvertisingReport::from_frame(frame)));
                }
                Err(e) if is_transient(&e) => {
                    if self.cancel.is_cancelled() {
                        debug!("read interrupted by cancellation");
                        return Ok(None);
                    }
                }
                Err(e) => return Err(HciError::ReceiveError(e)),
            }
        }
    }
}

impl<T: Transport> Iterator for AdvertisingReports<'_, T> {
    type Item = Result<AdvertisingReport, HciError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_report() {
            Ok(Some(report)) => Some(Ok(report)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
