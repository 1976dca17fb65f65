//! Passive LE scanning
//!
//! Unlike advertising, a scan keeps a single transport open from setup to
//! shutdown, because the reports have to be read from the same socket that
//! enabled the scan. The socket's previous filter is saved on setup and put
//! back on [`ScanSession::stop`].

use crate::cancel::CancelToken;
use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::{send_request, Device, HciCommand, HciFilter, Transport};
use crate::reader::{AdvertisingReport, AdvertisingReports};
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Scan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    ScanSetup,
    Scanning,
    Stopping,
}

/// Parameters of the LE Set Scan Parameters command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub scan_type: u8,
    pub interval: u16,
    pub window: u16,
    pub own_address_type: u8,
    pub filter_policy: u8,
    pub filter_duplicates: bool,
    pub timeout: Duration,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            scan_type: LE_SCAN_PASSIVE,
            interval: LE_SCAN_INTERVAL,
            window: LE_SCAN_WINDOW,
            own_address_type: LE_PUBLIC_ADDRESS,
            filter_policy: LE_FILTER_POLICY_ACCEPT_ALL,
            filter_duplicates: false,
            timeout: Duration::from_millis(HCI_REQUEST_TIMEOUT_MS),
        }
    }
}

impl ScanParams {
    fn parameters_command(&self) -> HciCommand {
        HciCommand::LeSetScanParameters {
            scan_type: self.scan_type,
            scan_interval: self.interval,
            scan_window: self.window,
            own_address_type: self.own_address_type,
            filter_policy: self.filter_policy,
        }
    }

    fn enable_command(&self, enable: bool) -> HciCommand {
        HciCommand::LeSetScanEnable {
            enable,
            filter_duplicates: self.filter_duplicates,
        }
    }
}

/// Starts scan sessions on one device
pub struct Scanner<'a, D: Device> {
    device: &'a D,
    params: ScanParams,
}

impl<'a, D: Device> Scanner<'a, D> {
    pub fn new(device: &'a D, params: ScanParams) -> Self {
        Self { device, params }
    }

    /// Sets scan parameters, narrows the socket filter to LE meta events and
    /// enables scanning, all on one transport.
    ///
    /// A failure to read or replace the filter is returned as the recoverable
    /// [`HciError::ScanFilterFailure`]; every other error is fatal.
    pub fn start(&self) -> Result<ScanSession<D::Transport>, HciError> {
        let mut transport = self.device.open()?;
        info!(state = ?ScanState::ScanSetup, "setting up scan");

        if let Err(e) = send_request(
            &mut transport,
            &self.params.parameters_command(),
            self.params.timeout,
        ) {
            drop(transport);
            if let Err(cleanup) = self.stop_detached() {
                warn!(error = %cleanup, "could not disable scan after setup failure");
            }
            return Err(HciError::ScanParameterFailure(Box::new(e)));
        }

        let saved_filter = transport.filter().map_err(HciError::ScanFilterFailure)?;
        transport
            .set_filter(&HciFilter::le_meta_only())
            .map_err(HciError::ScanFilterFailure)?;
        debug!(?saved_filter, "installed LE meta event filter");

        send_request(
            &mut transport,
            &self.params.enable_command(true),
            self.params.timeout,
        )
        .map_err(|e| HciError::ScanEnableFailure(Box::new(e)))?;

        info!(state = ?ScanState::Scanning, "scan enabled");
        Ok(ScanSession {
            transport,
            saved_filter,
            params: self.params,
            state: ScanState::Scanning,
        })
    }

    /// Disables scanning over a freshly opened transport.
    ///
    /// Used when no session exists to stop, so there is no filter to restore.
    pub fn stop_detached(&self) -> Result<(), HciError> {
        let mut transport = self.device.open()?;
        send_request(
            &mut transport,
            &self.params.enable_command(false),
            self.params.timeout,
        )
        .map_err(|e| HciError::ScanEnableFailure(Box::new(e)))?;
        info!(state = ?ScanState::Idle, "scan disabled");
        Ok(())
    }
}

/// A running scan holding the transport and the filter to restore
pub struct ScanSession<T: Transport> {
    transport: T,
    saved_filter: HciFilter,
    params: ScanParams,
    state: ScanState,
}

impl<T: Transport> ScanSession<T> {
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Reports arriving on this session until `cancel` is set
    pub fn reports<'a>(&'a mut self, cancel: &'a CancelToken) -> AdvertisingReports<'a, T> {
        AdvertisingReports::new(&mut self.transport, cancel)
    }

    /// Hands every report to `sink` until `cancel` is set, then stops the
    /// scan. Returns the number of reports delivered.
    ///
    /// The scan is stopped on every path. A read or sink failure takes
    /// precedence over a failure while stopping, which is only logged.
    pub fn run<F>(mut self, cancel: &CancelToken, mut sink: F) -> Result<usize, HciError>
    where
        F: FnMut(&AdvertisingReport) -> io::Result<()>,
    {
        let mut delivered = 0;
        let mut outcome = Ok(());
        for report in self.reports(cancel) {
            let result =
                report.and_then(|r| sink(&r).map_err(HciError::ReportOutputFailure));
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
            delivered += 1;
        }

        let stopped = self.stop();
        match (outcome, stopped) {
            (Ok(()), stopped) => stopped.map(|()| delivered),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stop_err)) => {
                warn!(error = %stop_err, "could not stop scan after failure");
                Err(e)
            }
        }
    }

    /// Restores the saved filter, disables scanning and closes the transport.
    ///
    /// The disable is sent even when the filter cannot be restored; the
    /// restore error is returned unless the disable fails as well.
    pub fn stop(mut self) -> Result<(), HciError> {
        self.state = ScanState::Stopping;
        info!(state = ?self.state, "stopping scan");

        let restored = self.transport.set_filter(&self.saved_filter);
        match &restored {
            Ok(()) => debug!(filter = ?self.saved_filter, "restored socket filter"),
            Err(e) => warn!(error = %e, "could not restore socket filter"),
        }

        send_request(
            &mut self.transport,
            &self.params.enable_command(false),
            self.params.timeout,
        )
        .map_err(|e| HciError::ScanEnableFailure(Box::new(e)))?;
        info!(state = ?ScanState::Idle, "scan disabled");

        restored.map_err(HciError::FilterRestoreFailure)
    }
}
