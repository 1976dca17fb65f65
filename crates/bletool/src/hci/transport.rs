//! Transport abstraction over an exclusive HCI command/event channel
//!
//! The controllers never touch sockets directly. They open a [`Transport`]
//! through a [`Device`], and the handle is closed when the transport is
//! dropped, so every exit path releases it.

use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::filter::HciFilter;
use crate::hci::packet::{HciCommand, HciEvent};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// An open, exclusively owned channel to one controller
pub trait Transport {
    /// Blocking read of one frame into `buf`, packet type byte first
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes one complete HCI packet
    fn write(&mut self, packet: &[u8]) -> io::Result<()>;

    /// Reads the filter currently installed on the channel
    fn filter(&self) -> io::Result<HciFilter>;

    /// Replaces the filter installed on the channel
    fn set_filter(&mut self, filter: &HciFilter) -> io::Result<()>;

    /// Waits until a frame can be read, `Ok(false)` on timeout
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;

    /// Encodes and writes a command without waiting for any reply
    fn send_command(&mut self, command: &HciCommand) -> io::Result<()> {
        let packet = command.to_packet();
        debug!(opcode = %command.opcode(), params = %hex::encode_upper(&packet[4..]), "sending command");
        self.write(&packet)
    }
}

/// Something that can open a [`Transport`], such as a local adapter
pub trait Device {
    type Transport: Transport;

    fn open(&self) -> Result<Self::Transport, HciError>;
}

/// Sends `command` and waits for its Command Complete event.
///
/// The filter installed on the transport is swapped for one that only passes
/// command responses for this opcode and is put back before returning, on
/// success and on failure alike. Returns the return parameters, status first.
pub fn send_request<T: Transport>(
    transport: &mut T,
    command: &HciCommand,
    timeout: Duration,
) -> Result<Vec<u8>, HciError> {
    let saved = transport
        .filter()
        .map_err(HciError::FilterInstallFailure)?;
    transport
        .set_filter(&HciFilter::command_response(command.opcode()))
        .map_err(HciError::FilterInstallFailure)?;

    let result = exchange(transport, command, timeout);

    transport
        .set_filter(&saved)
        .map_err(HciError::FilterRestoreFailure)?;
    result
}

fn exchange<T: Transport>(
    transport: &mut T,
    command: &HciCommand,
    timeout: Duration,
) -> Result<Vec<u8>, HciError> {
    let opcode = command.opcode();
    transport
        .send_command(command)
        .map_err(HciError::CommandSendFailure)?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; HCI_MAX_EVENT_SIZE];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(HciError::Timeout {
                opcode: opcode.value(),
            });
        }

        match transport.wait_readable(remaining) {
            Ok(true) => {}
            Ok(false) => {
                return Err(HciError::Timeout {
                    opcode: opcode.value(),
                })
            }
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(HciError::ReceiveError(e)),
        }

        let len = match transport.read(&mut buf) {
            Ok(len) => len,
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(HciError::ReceiveError(e)),
        };

        if len < 1 + HCI_EVENT_HDR_SIZE || buf[0] != HCI_EVENT_PKT {
            continue;
        }
        let Some(event) = HciEvent::parse(&buf[1..len]) else {
            trace!(len, "dropping truncated event");
            continue;
        };

        if event.is_command_status(opcode) {
            match event.status() {
                Some(0) => continue,
                Some(status) => {
                    return Err(HciError::CommandStatus {
                        opcode: opcode.value(),
                        status,
                    })
                }
                None => return Err(HciError::InvalidPacketFormat),
            }
        }

        if event.is_command_complete(opcode) {
            let params = event.return_parameters();
            return match params.first() {
                Some(0) => Ok(params.to_vec()),
                Some(&status) => Err(HciError::CommandStatus {
                    opcode: opcode.value(),
                    status,
                }),
                None => Err(HciError::InvalidPacketFormat),
            };
        }
    }
}

/// Interrupted and would-block reads are retried by every read loop
pub(crate) fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}
